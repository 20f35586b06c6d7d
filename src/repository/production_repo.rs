// ==========================================
// OEE 监控系统 - 生产记录仓储
// ==========================================
// 红线: Repository 不含业务逻辑, 指标由调用方计算后写入
// 表: production_record
// ==========================================

use crate::db::{format_datetime, open_sqlite_connection, parse_datetime_column};
use crate::domain::production::{OeeMetrics, ProductionInterval, ProductionRecord};
use crate::domain::types::ShiftName;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, params_from_iter, Connection, Row, ToSql};
use std::sync::{Arc, Mutex};

/// 生产记录查询条件
#[derive(Debug, Clone, Default)]
pub struct ProductionFilter {
    pub from: Option<NaiveDateTime>, // start_time >= from
    pub to: Option<NaiveDateTime>,   // start_time < to
    pub shift: Option<ShiftName>,
    pub limit: Option<u32>,
}

const SELECT_COLUMNS: &str = r#"
    record_id, machine_id, material_code,
    start_time, end_time,
    good_production, film_waste, organic_waste,
    planned_time, downtime_minutes, target_rate_per_minute,
    shift, availability, performance, quality, oee,
    created_by, created_at, updated_at
"#;

// ==========================================
// ProductionRecordRepository - 生产记录仓储
// ==========================================
pub struct ProductionRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductionRecordRepository {
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

    /// 确保表存在
    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS production_record (
              record_id TEXT PRIMARY KEY,
              machine_id TEXT NOT NULL,
              material_code TEXT,
              start_time TEXT NOT NULL,
              end_time TEXT,
              good_production REAL NOT NULL,
              film_waste REAL NOT NULL,
              organic_waste REAL NOT NULL,
              planned_time REAL NOT NULL,
              downtime_minutes REAL NOT NULL,
              target_rate_per_minute REAL,
              shift TEXT,
              availability REAL NOT NULL,
              performance REAL NOT NULL,
              quality REAL NOT NULL,
              oee REAL NOT NULL,
              created_by TEXT NOT NULL,
              created_at TEXT NOT NULL,
              updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_production_machine_start
              ON production_record(machine_id, start_time);
            "#,
        )?;
        Ok(())
    }

    /// 保存生产记录（新增）
    ///
    /// # 返回
    /// - Ok(record_id)
    pub fn save(&self, record: &ProductionRecord) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let i = &record.interval;
        conn.execute(
            r#"
            INSERT INTO production_record (
                record_id, machine_id, material_code,
                start_time, end_time,
                good_production, film_waste, organic_waste,
                planned_time, downtime_minutes, target_rate_per_minute,
                shift, availability, performance, quality, oee,
                created_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)
            "#,
            params![
                record.record_id,
                i.machine_id,
                record.material_code,
                format_datetime(&i.start_time),
                i.end_time.as_ref().map(format_datetime),
                i.good_production,
                i.film_waste,
                i.organic_waste,
                i.planned_time,
                i.downtime_minutes,
                i.target_rate_per_minute,
                record.shift.map(|s| s.as_str()),
                record.metrics.availability,
                record.metrics.performance,
                record.metrics.quality,
                record.metrics.oee,
                record.created_by,
                format_datetime(&record.created_at),
                format_datetime(&record.updated_at),
            ],
        )?;
        Ok(record.record_id.clone())
    }

    /// 更新生产记录（编辑后重算）
    pub fn update(&self, record: &ProductionRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let i = &record.interval;
        let affected = conn.execute(
            r#"
            UPDATE production_record SET
                machine_id = ?2,
                material_code = ?3,
                start_time = ?4,
                end_time = ?5,
                good_production = ?6,
                film_waste = ?7,
                organic_waste = ?8,
                planned_time = ?9,
                downtime_minutes = ?10,
                target_rate_per_minute = ?11,
                shift = ?12,
                availability = ?13,
                performance = ?14,
                quality = ?15,
                oee = ?16,
                updated_at = ?17
            WHERE record_id = ?1
            "#,
            params![
                record.record_id,
                i.machine_id,
                record.material_code,
                format_datetime(&i.start_time),
                i.end_time.as_ref().map(format_datetime),
                i.good_production,
                i.film_waste,
                i.organic_waste,
                i.planned_time,
                i.downtime_minutes,
                i.target_rate_per_minute,
                record.shift.map(|s| s.as_str()),
                record.metrics.availability,
                record.metrics.performance,
                record.metrics.quality,
                record.metrics.oee,
                format_datetime(&record.updated_at),
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "ProductionRecord".to_string(),
                id: record.record_id.clone(),
            });
        }
        Ok(())
    }

    /// 按主键查询
    pub fn find_by_id(&self, record_id: &str) -> RepositoryResult<Option<ProductionRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM production_record WHERE record_id = ?1",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let result = stmt.query_row(params![record_id], map_record);

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按机组 + 条件查询, 按开始时间升序
    pub fn find_by_machine(
        &self,
        machine_id: &str,
        filter: &ProductionFilter,
    ) -> RepositoryResult<Vec<ProductionRecord>> {
        let conn = self.get_conn()?;

        let mut sql = format!(
            "SELECT {} FROM production_record WHERE machine_id = ?",
            SELECT_COLUMNS
        );
        let mut args: Vec<Box<dyn ToSql>> = vec![Box::new(machine_id.to_string())];

        if let Some(from) = &filter.from {
            sql.push_str(" AND start_time >= ?");
            args.push(Box::new(format_datetime(from)));
        }
        if let Some(to) = &filter.to {
            sql.push_str(" AND start_time < ?");
            args.push(Box::new(format_datetime(to)));
        }
        if let Some(shift) = filter.shift {
            sql.push_str(" AND shift = ?");
            args.push(Box::new(shift.as_str().to_string()));
        }
        sql.push_str(" ORDER BY start_time ASC, created_at ASC");
        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            args.push(Box::new(limit as i64));
        }

        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params_from_iter(args.iter().map(|a| a.as_ref())), map_record)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// 全部机组标识
    pub fn list_machine_ids(&self) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT DISTINCT machine_id FROM production_record ORDER BY machine_id")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

fn map_record(row: &Row) -> rusqlite::Result<ProductionRecord> {
    let start_raw: String = row.get(3)?;
    let end_raw: Option<String> = row.get(4)?;
    let shift_raw: Option<String> = row.get(11)?;
    let created_raw: String = row.get(17)?;
    let updated_raw: String = row.get(18)?;

    Ok(ProductionRecord {
        record_id: row.get(0)?,
        interval: ProductionInterval {
            machine_id: row.get(1)?,
            start_time: parse_datetime_column(3, &start_raw)?,
            end_time: match end_raw {
                Some(raw) => Some(parse_datetime_column(4, &raw)?),
                None => None,
            },
            good_production: row.get(5)?,
            film_waste: row.get(6)?,
            organic_waste: row.get(7)?,
            planned_time: row.get(8)?,
            downtime_minutes: row.get(9)?,
            target_rate_per_minute: row.get(10)?,
        },
        material_code: row.get(2)?,
        shift: shift_raw.as_deref().and_then(ShiftName::parse),
        metrics: OeeMetrics {
            availability: row.get(12)?,
            performance: row.get(13)?,
            quality: row.get(14)?,
            oee: row.get(15)?,
        },
        created_by: row.get(16)?,
        created_at: parse_datetime_column(17, &created_raw)?,
        updated_at: parse_datetime_column(18, &updated_raw)?,
    })
}
