// ==========================================
// OEE 监控系统 - 应用层
// ==========================================
// 职责: 装配各层实例, 供命令行/外部宿主调用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
