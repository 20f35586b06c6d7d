// ==========================================
// OEE 监控系统 - 物料目标速率仓储
// ==========================================
// 表: material_rate (material_code → 件/分钟)
// 用途: 生产录入时填充 target_rate_per_minute
// ==========================================

use crate::db::open_sqlite_connection;
use crate::engine::repositories::MaterialRateLookup;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct MaterialRateRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MaterialRateRepository {
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
            CREATE TABLE IF NOT EXISTS material_rate (
              material_code TEXT PRIMARY KEY,
              target_rate_per_minute REAL NOT NULL,
              updated_by TEXT NOT NULL,
              updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;
        Ok(())
    }

    /// 新增或更新物料速率
    pub fn upsert_rate(
        &self,
        material_code: &str,
        target_rate_per_minute: f64,
        updated_by: &str,
    ) -> RepositoryResult<()> {
        if material_code.trim().is_empty() {
            return Err(RepositoryError::FieldValueError {
                field: "material_code".to_string(),
                message: "物料代码不能为空".to_string(),
            });
        }
        if !target_rate_per_minute.is_finite() || target_rate_per_minute <= 0.0 {
            return Err(RepositoryError::FieldValueError {
                field: "target_rate_per_minute".to_string(),
                message: format!("目标速率必须为正数: {}", target_rate_per_minute),
            });
        }

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO material_rate (material_code, target_rate_per_minute, updated_by, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(material_code) DO UPDATE SET
                target_rate_per_minute = excluded.target_rate_per_minute,
                updated_by = excluded.updated_by,
                updated_at = excluded.updated_at
            "#,
            params![material_code.trim(), target_rate_per_minute, updated_by],
        )?;
        Ok(())
    }
}

impl MaterialRateLookup for MaterialRateRepository {
    fn lookup_target_rate(&self, material_code: &str) -> RepositoryResult<Option<f64>> {
        let conn = self.get_conn()?;
        let rate = conn
            .query_row(
                "SELECT target_rate_per_minute FROM material_rate WHERE material_code = ?1",
                params![material_code.trim()],
                |row| row.get::<_, f64>(0),
            )
            .optional()?;
        Ok(rate)
    }
}
