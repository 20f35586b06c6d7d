// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、测试数据构造
// 说明: 各仓储在构造时自动建表, 无需预置 schema
// ==========================================
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use oee_monitor::domain::production::{ProductionInterval, ProductionSubmission};
use rusqlite::Connection;
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是合法 UTF-8")?
        .to_string();
    Ok((temp_file, db_path))
}

/// 打开测试数据库连接
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(oee_monitor::db::open_sqlite_connection(db_path)?)
}

/// 构造时间
pub fn ts(y: i32, m: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, mi, 0)
        .unwrap()
}

/// 健康区间: 60 分钟满负荷, OEE = 100, 不触发任何告警
pub fn healthy_interval(machine_id: &str, start: NaiveDateTime) -> ProductionInterval {
    ProductionInterval {
        machine_id: machine_id.to_string(),
        start_time: start,
        end_time: Some(start + chrono::Duration::minutes(60)),
        good_production: 102.0,
        film_waste: 0.0,
        organic_waste: 0.0,
        planned_time: 60.0,
        downtime_minutes: 0.0,
        target_rate_per_minute: Some(2.0),
    }
}

/// 参考场景区间: 480/60/400/20/10 @ 65 件/分钟, OEE ≈ 1.40
pub fn reference_interval(machine_id: &str, start: NaiveDateTime) -> ProductionInterval {
    ProductionInterval {
        machine_id: machine_id.to_string(),
        start_time: start,
        end_time: Some(start + chrono::Duration::minutes(480)),
        good_production: 400.0,
        film_waste: 20.0,
        organic_waste: 10.0,
        planned_time: 480.0,
        downtime_minutes: 60.0,
        target_rate_per_minute: Some(65.0),
    }
}

pub fn submission(interval: ProductionInterval) -> ProductionSubmission {
    ProductionSubmission {
        interval,
        material_code: None,
    }
}

pub fn approx(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() <= eps
}
