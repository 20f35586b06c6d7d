// ==========================================
// OEE 监控系统 - 命令行入口
// ==========================================
// 用法:
//   oee-monitor [db_path] summary <machine_id> [day|week|month]
//   oee-monitor [db_path] import <csv_path>
//   oee-monitor [db_path] prune
//   oee-monitor [db_path] alerts [machine_id]
// 输出: JSON (stdout), 日志走 stderr
// ==========================================

use std::error::Error;
use std::path::Path;

use oee_monitor::app::{get_default_db_path, AppState};
use oee_monitor::domain::actor::Actor;
use oee_monitor::domain::types::SummaryPeriod;
use oee_monitor::logging;

const COMMANDS: [&str; 4] = ["summary", "import", "prune", "alerts"];
const DEFAULT_ALERT_LIMIT: u32 = 50;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    logging::init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let db_path = match args.first() {
        Some(first) if !COMMANDS.contains(&first.as_str()) => args.remove(0),
        _ => get_default_db_path(),
    };
    if args.is_empty() {
        return Err(usage().into());
    }
    let command = args.remove(0);

    tracing::info!("{} v{} 使用数据库: {}", oee_monitor::APP_NAME, oee_monitor::VERSION, db_path);
    let state = AppState::new(db_path)?;
    let actor = Actor::system();

    let output = match command.as_str() {
        "summary" => {
            let machine_id = args.first().ok_or_else(usage)?;
            let period = match args.get(1) {
                Some(raw) => SummaryPeriod::parse(raw)
                    .ok_or_else(|| format!("未知汇总周期: {}", raw))?,
                None => SummaryPeriod::Day,
            };
            let summary = state
                .dashboard_api
                .get_period_summary(&actor, machine_id, period, None, None)?;
            serde_json::to_string_pretty(&summary)?
        }
        "import" => {
            let csv_path = args.first().ok_or_else(usage)?;
            let report = state
                .production_api
                .import_csv(&actor, Path::new(csv_path))
                .await?;
            serde_json::to_string_pretty(&report)?
        }
        "prune" => {
            let now = chrono::Utc::now().naive_utc();
            let report = state.dashboard_api.prune_history(&actor, now).await?;
            serde_json::to_string_pretty(&report)?
        }
        "alerts" => {
            let alerts = state.dashboard_api.list_recent_alerts(
                &actor,
                args.first().map(String::as_str),
                DEFAULT_ALERT_LIMIT,
            )?;
            serde_json::to_string_pretty(&alerts)?
        }
        other => return Err(format!("未知命令: {}\n{}", other, usage()).into()),
    };

    println!("{}", output);
    Ok(())
}

fn usage() -> String {
    [
        "用法:",
        "  oee-monitor [db_path] summary <machine_id> [day|week|month]",
        "  oee-monitor [db_path] import <csv_path>",
        "  oee-monitor [db_path] prune",
        "  oee-monitor [db_path] alerts [machine_id]",
    ]
    .join("\n")
}
