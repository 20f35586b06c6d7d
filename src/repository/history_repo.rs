// ==========================================
// OEE 监控系统 - OEE 历史快照仓储
// ==========================================
// 红线: 只追加, 不更新; 仅允许按保留期删除
// 表: oee_history
// ==========================================

use crate::db::{format_datetime, open_sqlite_connection, parse_datetime_column};
use crate::domain::history::HistoryEntry;
use crate::domain::production::OeeMetrics;
use crate::domain::types::ShiftName;
use crate::engine::repositories::HistoryStore;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    entry_id, machine_id, record_id, shift, timestamp,
    availability, performance, quality, oee,
    good_production, total_waste, downtime_minutes, planned_time,
    recorded_at
"#;

// ==========================================
// HistoryEntryRepository - 历史快照仓储
// ==========================================
pub struct HistoryEntryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl HistoryEntryRepository {
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
            CREATE TABLE IF NOT EXISTS oee_history (
              entry_id TEXT PRIMARY KEY,
              machine_id TEXT NOT NULL,
              record_id TEXT NOT NULL,
              shift TEXT,
              timestamp TEXT NOT NULL,
              availability REAL NOT NULL,
              performance REAL NOT NULL,
              quality REAL NOT NULL,
              oee REAL NOT NULL,
              good_production REAL NOT NULL,
              total_waste REAL NOT NULL,
              downtime_minutes REAL NOT NULL,
              planned_time REAL NOT NULL,
              recorded_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_oee_history_machine_ts
              ON oee_history(machine_id, timestamp);
            CREATE INDEX IF NOT EXISTS idx_oee_history_recorded_at
              ON oee_history(recorded_at);
            "#,
        )?;
        Ok(())
    }

    /// 追加历史快照
    pub fn insert(&self, entry: &HistoryEntry) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO oee_history (
                entry_id, machine_id, record_id, shift, timestamp,
                availability, performance, quality, oee,
                good_production, total_waste, downtime_minutes, planned_time,
                recorded_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                entry.entry_id,
                entry.machine_id,
                entry.record_id,
                entry.shift.map(|s| s.as_str()),
                format_datetime(&entry.timestamp),
                entry.metrics.availability,
                entry.metrics.performance,
                entry.metrics.quality,
                entry.metrics.oee,
                entry.good_production,
                entry.total_waste,
                entry.downtime_minutes,
                entry.planned_time,
                format_datetime(&entry.recorded_at),
            ],
        )?;
        Ok(entry.entry_id.clone())
    }

    /// 按机组 + 业务时间范围查询 [from, to), 按业务时间升序
    pub fn find_by_machine(
        &self,
        machine_id: &str,
        from: Option<NaiveDateTime>,
        to: Option<NaiveDateTime>,
    ) -> RepositoryResult<Vec<HistoryEntry>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {} FROM oee_history
            WHERE machine_id = ?1
              AND (?2 IS NULL OR timestamp >= ?2)
              AND (?3 IS NULL OR timestamp < ?3)
            ORDER BY timestamp ASC, recorded_at ASC
            "#,
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(
                params![
                    machine_id,
                    from.as_ref().map(format_datetime),
                    to.as_ref().map(format_datetime),
                ],
                map_entry,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// 机组最新快照（按业务时间）
    pub fn latest_for_machine(&self, machine_id: &str) -> RepositoryResult<Option<HistoryEntry>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM oee_history WHERE machine_id = ?1 ORDER BY timestamp DESC, recorded_at DESC LIMIT 1",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let result = stmt.query_row(params![machine_id], map_entry);

        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 删除业务时间早于 cutoff 的快照
    ///
    /// # 返回
    /// - Ok(删除条数)
    pub fn prune_before(&self, cutoff: NaiveDateTime) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let deleted = conn.execute(
            "DELETE FROM oee_history WHERE timestamp < ?1",
            params![format_datetime(&cutoff)],
        )?;
        Ok(deleted)
    }

    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n = conn.query_row("SELECT COUNT(*) FROM oee_history", [], |row| row.get(0))?;
        Ok(n)
    }
}

impl HistoryStore for HistoryEntryRepository {
    fn save_history_entry(&self, entry: &HistoryEntry) -> RepositoryResult<String> {
        self.insert(entry)
    }
}

fn map_entry(row: &Row) -> rusqlite::Result<HistoryEntry> {
    let shift_raw: Option<String> = row.get(3)?;
    let ts_raw: String = row.get(4)?;
    let recorded_raw: String = row.get(13)?;

    Ok(HistoryEntry {
        entry_id: row.get(0)?,
        machine_id: row.get(1)?,
        record_id: row.get(2)?,
        shift: shift_raw.as_deref().and_then(ShiftName::parse),
        timestamp: parse_datetime_column(4, &ts_raw)?,
        metrics: OeeMetrics {
            availability: row.get(5)?,
            performance: row.get(6)?,
            quality: row.get(7)?,
            oee: row.get(8)?,
        },
        good_production: row.get(9)?,
        total_waste: row.get(10)?,
        downtime_minutes: row.get(11)?,
        planned_time: row.get(12)?,
        recorded_at: parse_datetime_column(13, &recorded_raw)?,
    })
}
