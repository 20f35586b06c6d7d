// ==========================================
// OEE 监控系统 - 生产数据 CSV 解析器
// ==========================================
// 列: machine_id, material_code, start_time, end_time,
//     good_production, film_waste, organic_waste,
//     planned_time, downtime_minutes, target_rate
// 可选列: material_code, end_time, target_rate
// 时间格式: "%Y-%m-%d %H:%M:%S" / "%Y-%m-%d %H:%M" / "%Y-%m-%dT%H:%M:%S" / RFC3339
// 落库精度为秒 (db::DATETIME_FORMAT), RFC3339 的小数秒入库时截断
// ==========================================
// 红线: 解析器只做格式转换, 业务校验交给 OeeCalculator
// ==========================================

use crate::domain::production::{ProductionInterval, ProductionSubmission};
use crate::importer::error::{ImportError, ImportResult};
use chrono::{DateTime, NaiveDateTime};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// 必需列（其余列缺失时按空值处理）
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "machine_id",
    "start_time",
    "good_production",
    "film_waste",
    "organic_waste",
    "planned_time",
    "downtime_minutes",
];

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// 单行解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRow {
    pub row: usize,
    pub result: ImportResult<ProductionSubmission>,
}

// ==========================================
// ProductionCsvParser
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ProductionCsvParser;

impl ProductionCsvParser {
    pub fn new() -> Self {
        Self
    }

    /// 解析 CSV 文件
    ///
    /// 文件级错误（不存在/格式/表头缺列）直接返回 Err,
    /// 行级错误记录在对应 CsvRow 中
    pub fn parse_file(&self, path: &Path) -> ImportResult<Vec<CsvRow>> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        if let Some(ext) = path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let file = File::open(path)?;
        self.parse_reader(file)
    }

    /// 从任意 Reader 解析
    pub fn parse_reader<R: Read>(&self, reader: R) -> ImportResult<Vec<CsvRow>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();

        for column in REQUIRED_COLUMNS.iter() {
            if !headers.iter().any(|h| h == column) {
                return Err(ImportError::MissingColumn(column.to_string()));
            }
        }

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let row = idx + 2;
            let record = match result {
                Ok(r) => r,
                Err(e) => {
                    rows.push(CsvRow {
                        row,
                        result: Err(ImportError::CsvParseError(e.to_string())),
                    });
                    continue;
                }
            };

            let mut row_map: HashMap<&str, &str> = HashMap::new();
            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row_map.insert(header.as_str(), value);
                }
            }

            // 跳过完全空白的行
            if row_map.values().all(|v| v.is_empty()) {
                continue;
            }

            rows.push(CsvRow {
                row,
                result: map_row(row, &row_map),
            });
        }

        Ok(rows)
    }
}

fn map_row(row: usize, map: &HashMap<&str, &str>) -> ImportResult<ProductionSubmission> {
    let field = |name: &str| map.get(name).copied().filter(|v| !v.is_empty());

    let machine_id = field("machine_id")
        .ok_or_else(|| ImportError::MissingField {
            row,
            field: "machine_id".to_string(),
        })?
        .to_string();

    let start_raw = field("start_time").ok_or_else(|| ImportError::MissingField {
        row,
        field: "start_time".to_string(),
    })?;
    let start_time = parse_timestamp(start_raw).ok_or_else(|| ImportError::DateFormatError {
        row,
        field: "start_time".to_string(),
        value: start_raw.to_string(),
    })?;

    let end_time = match field("end_time") {
        Some(raw) => Some(parse_timestamp(raw).ok_or_else(|| ImportError::DateFormatError {
            row,
            field: "end_time".to_string(),
            value: raw.to_string(),
        })?),
        None => None,
    };

    let number = |name: &str| -> ImportResult<f64> {
        let raw = field(name).ok_or_else(|| ImportError::MissingField {
            row,
            field: name.to_string(),
        })?;
        raw.parse::<f64>().map_err(|e| ImportError::TypeConversionError {
            row,
            field: name.to_string(),
            message: format!("{} ({})", e, raw),
        })
    };

    let target_rate_per_minute = match field("target_rate") {
        Some(raw) => Some(raw.parse::<f64>().map_err(|e| ImportError::TypeConversionError {
            row,
            field: "target_rate".to_string(),
            message: format!("{} ({})", e, raw),
        })?),
        None => None,
    };

    Ok(ProductionSubmission {
        interval: ProductionInterval {
            machine_id,
            start_time,
            end_time,
            good_production: number("good_production")?,
            film_waste: number("film_waste")?,
            organic_waste: number("organic_waste")?,
            planned_time: number("planned_time")?,
            downtime_minutes: number("downtime_minutes")?,
            target_rate_per_minute,
        },
        material_code: field("material_code").map(|s| s.to_string()),
    })
}

/// 解析时间戳（带时区的 RFC3339 转为 UTC 本地无时区时间）
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_utc()))
}
