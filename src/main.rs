//! 审计日志检查工具
//! 读取本地持久化的审计日志，输出汇总或导出

use ampere_access::{
    config::AppConfig,
    models::audit::AuditLogFilter,
    services::AuditLogStore,
    telemetry,
};

fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(String::as_str).unwrap_or("summary");

    match command {
        "--version" => {
            println!("ampere-audit {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        "--help" => {
            print_help();
            return Ok(());
        }
        "summary" | "export" => {}
        other => {
            eprintln!("未知参数: {}", other);
            print_help();
            std::process::exit(1);
        }
    }

    // 加载 .env 文件（开发环境）
    if let Ok(env) = std::env::var("AMPERE_ENV") {
        dotenv::from_filename(format!(".env.{}", env)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::dotenv().ok();
    }

    // 1. 加载配置
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // 2. 初始化日志
    telemetry::init_telemetry(&config.logging);

    // 3. 打开审计日志
    let store = AuditLogStore::from_config(&config.audit);

    match command {
        "export" => {
            let filter = args.get(2).map(|term| AuditLogFilter {
                search_term: Some(term.clone()),
                ..Default::default()
            });
            println!("{}", store.export(filter.as_ref())?);
        }
        _ => {
            let summary = store.summary();
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

/// 打印帮助信息
fn print_help() {
    println!("ampere-audit {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: ampere-audit [命令]");
    println!();
    println!("命令:");
    println!("  summary          输出审计日志汇总（默认）");
    println!("  export [关键字]  以 JSON 导出审计日志，可按关键字过滤");
    println!("  --version        打印版本信息并退出");
    println!("  --help           打印此帮助信息并退出");
    println!();
    println!("环境变量:");
    println!("  AMPERE_AUDIT__DATA_DIR      审计日志目录（默认 ./data）");
    println!("  AMPERE_AUDIT__STORAGE_KEY   审计日志文件名（默认 ampere_audit_logs）");
    println!("  AMPERE_LOGGING__LEVEL       日志级别（默认 info）");
}
