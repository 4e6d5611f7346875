//! 字段级变更检测
//!
//! 比较同一实体的新旧快照（JSON 对象），输出每个不同字段的一条记录。
//! 字段按名称字典序输出；嵌套对象与数组按结构比较，与键顺序无关；
//! 标量不做类型转换（`30` 与 `"30"` 视为不同），但数值按值比较（`1` 与 `1.0` 相同）。

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::models::audit::AuditChange;

/// Identity and timestamp bookkeeping fields never worth recording
pub const BOOKKEEPING_FIELDS: [&str; 5] =
    ["id", "createdAt", "updatedAt", "created_at", "updated_at"];

pub struct ChangeDetector;

impl ChangeDetector {
    /// 比较两个快照；任一快照缺失或不是对象时返回空列表
    pub fn diff(
        old: Option<&Value>,
        new: Option<&Value>,
        exclude_fields: &[&str],
    ) -> Vec<AuditChange> {
        match (old, new) {
            (Some(Value::Object(old)), Some(Value::Object(new))) => {
                Self::diff_objects(old, new, exclude_fields)
            }
            _ => Vec::new(),
        }
    }

    /// 序列化后比较两个实体；序列化失败时记录警告并返回空列表
    pub fn diff_entities<T: Serialize>(
        old: &T,
        new: &T,
        exclude_fields: &[&str],
    ) -> Vec<AuditChange> {
        match (serde_json::to_value(old), serde_json::to_value(new)) {
            (Ok(old), Ok(new)) => Self::diff(Some(&old), Some(&new), exclude_fields),
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Failed to serialize entity snapshot for change detection");
                Vec::new()
            }
        }
    }

    fn diff_objects(
        old: &Map<String, Value>,
        new: &Map<String, Value>,
        exclude_fields: &[&str],
    ) -> Vec<AuditChange> {
        let fields: BTreeSet<&String> = old.keys().chain(new.keys()).collect();

        fields
            .into_iter()
            .filter(|field| !exclude_fields.contains(&field.as_str()))
            .filter_map(|field| {
                let old_value = old.get(field);
                let new_value = new.get(field);
                let unchanged = match (old_value, new_value) {
                    (Some(a), Some(b)) => values_equal(a, b),
                    (None, None) => true,
                    _ => false,
                };
                if unchanged {
                    return None;
                }
                Some(AuditChange {
                    field: field.clone(),
                    old_value: old_value.cloned(),
                    new_value: new_value.cloned(),
                    field_label: field_label(field),
                })
            })
            .collect()
    }
}

/// Structural equality; numbers compare by value so `1` equals `1.0`
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if x.is_f64() || y.is_f64() {
                x.as_f64() == y.as_f64()
            } else {
                x == y
            }
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(a, b)| values_equal(a, b))
        }
        // 对象按键查找比较，与键顺序无关
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter().all(|(k, v)| y.get(k).is_some_and(|w| values_equal(v, w)))
        }
        _ => a == b,
    }
}

/// `contractValue` / `contract_value` → `Contract Value`
pub fn field_label(field: &str) -> String {
    let mut label = String::with_capacity(field.len() + 4);
    let mut prev: Option<char> = None;

    for c in field.chars() {
        match c {
            '_' | '-' => {
                if !label.is_empty() && !label.ends_with(' ') {
                    label.push(' ');
                }
            }
            c if c.is_uppercase()
                && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit()) =>
            {
                label.push(' ');
                label.push(c);
            }
            c => label.push(c),
        }
        prev = Some(c);
    }

    let label = label.trim_end();
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(changes: &[AuditChange]) -> Vec<&str> {
        changes.iter().map(|c| c.field.as_str()).collect()
    }

    #[test]
    fn test_identical_snapshots_have_no_changes() {
        let x = json!({"a": 1, "nested": {"k": [1, 2]}, "s": "text", "n": null});
        assert!(ChangeDetector::diff(Some(&x), Some(&x), &[]).is_empty());
    }

    #[test]
    fn test_changed_and_added_fields() {
        let old = json!({"a": 1, "b": 2});
        let new = json!({"a": 1, "b": 3, "c": 4});

        let changes = ChangeDetector::diff(Some(&old), Some(&new), &[]);
        assert_eq!(fields(&changes), vec!["b", "c"]);
        assert_eq!(changes[0].old_value, Some(json!(2)));
        assert_eq!(changes[0].new_value, Some(json!(3)));
        assert_eq!(changes[1].old_value, None);
        assert_eq!(changes[1].new_value, Some(json!(4)));
    }

    #[test]
    fn test_excluded_fields_are_skipped() {
        let old = json!({"a": 1, "b": 2});
        let new = json!({"a": 1, "b": 3, "c": 4});

        let changes = ChangeDetector::diff(Some(&old), Some(&new), &["b"]);
        assert_eq!(fields(&changes), vec!["c"]);
    }

    #[test]
    fn test_removed_field_is_reported() {
        let old = json!({"a": 1, "gone": "x"});
        let new = json!({"a": 1});

        let changes = ChangeDetector::diff(Some(&old), Some(&new), &[]);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old_value, Some(json!("x")));
        assert_eq!(changes[0].new_value, None);
    }

    #[test]
    fn test_null_differs_from_missing() {
        let old = json!({"a": null});
        let new = json!({});
        assert_eq!(ChangeDetector::diff(Some(&old), Some(&new), &[]).len(), 1);
    }

    #[test]
    fn test_no_type_coercion() {
        let old = json!({"days": 30});
        let new = json!({"days": "30"});
        assert_eq!(fields(&ChangeDetector::diff(Some(&old), Some(&new), &[])), vec!["days"]);
    }

    #[test]
    fn test_integer_and_float_with_same_value_are_equal() {
        let old = json!({"amount": 1, "rate": {"gst": 9}, "items": [2, 3]});
        let new = json!({"amount": 1.0, "rate": {"gst": 9.0}, "items": [2.0, 3]});
        assert!(ChangeDetector::diff(Some(&old), Some(&new), &[]).is_empty());

        let changed = json!({"amount": 1.5, "rate": {"gst": 9}, "items": [2, 3]});
        assert_eq!(fields(&ChangeDetector::diff(Some(&old), Some(&changed), &[])), vec!["amount"]);
    }

    #[test]
    fn test_nested_objects_ignore_key_order() {
        let old: Value =
            serde_json::from_str(r#"{"address": {"street": "1 Jalan", "postal": "123456"}}"#).unwrap();
        let new: Value =
            serde_json::from_str(r#"{"address": {"postal": "123456", "street": "1 Jalan"}}"#).unwrap();
        assert!(ChangeDetector::diff(Some(&old), Some(&new), &[]).is_empty());

        let moved = json!({"address": {"street": "2 Jalan", "postal": "123456"}});
        let changes = ChangeDetector::diff(Some(&old), Some(&moved), &[]);
        assert_eq!(fields(&changes), vec!["address"]);
        assert_eq!(changes[0].new_value, Some(moved["address"].clone()));
    }

    #[test]
    fn test_missing_snapshot_yields_nothing() {
        let x = json!({"a": 1});
        assert!(ChangeDetector::diff(None, Some(&x), &[]).is_empty());
        assert!(ChangeDetector::diff(Some(&x), None, &[]).is_empty());
        assert!(ChangeDetector::diff(Some(&json!(1)), Some(&json!(2)), &[]).is_empty());
    }

    #[test]
    fn test_diff_entities_serializes_structs() {
        #[derive(Serialize)]
        struct Client {
            id: &'static str,
            name: &'static str,
        }

        let changes = ChangeDetector::diff_entities(
            &Client { id: "c1", name: "Acme" },
            &Client { id: "c2", name: "Acme Pte Ltd" },
            &BOOKKEEPING_FIELDS,
        );
        assert_eq!(fields(&changes), vec!["name"]);
        assert_eq!(changes[0].field_label, "Name");
    }

    #[test]
    fn test_field_label() {
        assert_eq!(field_label("name"), "Name");
        assert_eq!(field_label("contractValue"), "Contract Value");
        assert_eq!(field_label("project_manager"), "Project manager");
        assert_eq!(field_label("userID"), "User ID");
        assert_eq!(field_label("address2Line"), "Address2 Line");
        assert_eq!(field_label(""), "");
    }
}
