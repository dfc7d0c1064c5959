// ==========================================
// 物流枢纽流转系统 - 开发用命令行入口
// ==========================================
// 用法: hub-logistics [db_path] [init|report]
// - init:   建表并打印当前生效配置
// - report: 打印未关闭异常的分类汇总 (默认)
// ==========================================

use anyhow::{bail, Context, Result};
use serde_json::json;
use std::path::PathBuf;

use hub_logistics::config::load_pipeline_config;
use hub_logistics::db::{ensure_schema, open_sqlite_connection, read_schema_version};
use hub_logistics::logging;
use hub_logistics::repository::ExceptionRepository;

fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    let db_path = match args.get(1) {
        Some(path) => path.clone(),
        None => default_db_path()?,
    };
    let command = args.get(2).map(String::as_str).unwrap_or("report");

    tracing::info!("==================================================");
    tracing::info!("{} v{}", hub_logistics::APP_NAME, hub_logistics::VERSION);
    tracing::info!("数据库: {}", db_path);
    tracing::info!("==================================================");

    let conn = open_sqlite_connection(&db_path).with_context(|| format!("无法打开数据库: {}", db_path))?;
    ensure_schema(&conn).context("建表失败")?;

    match command {
        "init" => {
            let config = load_pipeline_config(&conn).map_err(|e| anyhow::anyhow!("配置加载失败: {}", e))?;
            let out = json!({
                "schema_version": read_schema_version(&conn)?,
                "config": config,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        "report" => {
            let repo = ExceptionRepository::new(&conn);
            let summary = repo.summary_by_category(true)?;
            let open_count: i64 = summary.iter().map(|s| s.count).sum();
            let total_impact: f64 = summary.iter().map(|s| s.total_financial_impact).sum();
            let out = json!({
                "open_exceptions": open_count,
                "total_financial_impact": total_impact,
                "by_category": summary,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        other => bail!("未知命令: {} (可用: init | report)", other),
    }

    Ok(())
}

/// 默认数据库路径
///
/// 优先读取 HUB_LOGISTICS_DB_PATH, 否则放在用户本地数据目录下
fn default_db_path() -> Result<String> {
    if let Ok(path) = std::env::var("HUB_LOGISTICS_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
    }

    let mut dir: PathBuf = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    dir.push("hub-logistics");
    std::fs::create_dir_all(&dir).with_context(|| format!("无法创建数据目录: {}", dir.display()))?;
    dir.push("hub_logistics.db");
    Ok(dir.to_string_lossy().into_owned())
}
