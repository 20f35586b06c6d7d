// ==========================================
// OEE 监控系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口, 屏蔽数据库细节
// 约束: 所有查询使用参数化
// ==========================================

pub mod alert_repo;
pub mod error;
pub mod history_repo;
pub mod material_rate_repo;
pub mod production_repo;

// 重导出核心仓储
pub use alert_repo::AlertEventRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use history_repo::HistoryEntryRepository;
pub use material_rate_repo::MaterialRateRepository;
pub use production_repo::{ProductionFilter, ProductionRecordRepository};
