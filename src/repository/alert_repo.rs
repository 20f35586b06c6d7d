// ==========================================
// OEE 监控系统 - 告警事件仓储
// ==========================================
// 表: alert_event
// 角色: AlertEventPublisher 的持久化实现 (界面读取 / 外部通知补发)
// ==========================================

use crate::db::{format_datetime, open_sqlite_connection, parse_datetime_column};
use crate::domain::alert::{AlertEvent, TriggeringMetrics};
use crate::domain::types::{AlertKind, AlertSeverity};
use crate::engine::events::AlertEventPublisher;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::sync::{Arc, Mutex};

pub struct AlertEventRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AlertEventRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_table()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS alert_event (
              event_id TEXT PRIMARY KEY,
              machine_id TEXT NOT NULL,
              kind TEXT NOT NULL,
              severity TEXT NOT NULL,
              message TEXT NOT NULL,
              triggering_metrics TEXT NOT NULL,
              timestamp TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_alert_event_machine_ts
              ON alert_event(machine_id, timestamp DESC);
            "#,
        )?;
        Ok(())
    }

    /// 批量写入告警（事务）
    pub fn batch_insert(&self, events: &[AlertEvent]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for event in events {
            let metrics_json = serde_json::to_string(&event.triggering_metrics)
                .map_err(|e| RepositoryError::Other(e.into()))?;
            tx.execute(
                r#"
                INSERT OR REPLACE INTO alert_event (
                    event_id, machine_id, kind, severity, message, triggering_metrics, timestamp
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    event.event_id,
                    event.machine_id,
                    event.kind.as_str(),
                    event.severity.as_str(),
                    event.message,
                    metrics_json,
                    format_datetime(&event.timestamp),
                ],
            )?;
            count += 1;
        }

        tx.commit()?;
        Ok(count)
    }

    /// 最近告警（机组可选）, 按时间倒序
    pub fn find_recent(
        &self,
        machine_id: Option<&str>,
        limit: u32,
    ) -> RepositoryResult<Vec<AlertEvent>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT event_id, machine_id, kind, severity, message, triggering_metrics, timestamp
            FROM alert_event
            WHERE (?1 IS NULL OR machine_id = ?1)
            ORDER BY timestamp DESC
            LIMIT ?2
            "#,
        )?;
        let events = stmt
            .query_map(params![machine_id, limit as i64], map_event)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }
}

impl AlertEventPublisher for AlertEventRepository {
    fn publish(&self, events: &[AlertEvent]) -> Result<usize, Box<dyn Error + Send + Sync>> {
        Ok(self.batch_insert(events)?)
    }
}

fn map_event(row: &Row) -> rusqlite::Result<AlertEvent> {
    let kind_raw: String = row.get(2)?;
    let severity_raw: String = row.get(3)?;
    let metrics_raw: String = row.get(5)?;
    let ts_raw: String = row.get(6)?;

    let kind = AlertKind::parse(&kind_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(2, Type::Text, format!("未知告警类型: {}", kind_raw).into())
    })?;
    let severity = AlertSeverity::parse(&severity_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(3, Type::Text, format!("未知告警级别: {}", severity_raw).into())
    })?;
    let triggering_metrics: TriggeringMetrics = serde_json::from_str(&metrics_raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;

    Ok(AlertEvent {
        event_id: row.get(0)?,
        machine_id: row.get(1)?,
        kind,
        severity,
        message: row.get(4)?,
        triggering_metrics,
        timestamp: parse_datetime_column(6, &ts_raw)?,
    })
}
