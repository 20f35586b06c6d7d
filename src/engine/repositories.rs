// ==========================================
// OEE 监控系统 - 引擎层外部协作接口
// ==========================================
// 职责: 定义引擎所消费的存储/查询能力, 不绑定具体数据库
// 实现者: repository 层 (SQLite)
// ==========================================

use crate::domain::history::HistoryEntry;
use crate::repository::error::RepositoryResult;

// ==========================================
// Trait: HistoryStore
// ==========================================
// 用途: OEE 历史快照追加写入
pub trait HistoryStore: Send + Sync {
    /// 保存历史快照
    ///
    /// # 返回
    /// - Ok(entry_id)
    fn save_history_entry(&self, entry: &HistoryEntry) -> RepositoryResult<String>;
}

// ==========================================
// Trait: MaterialRateLookup
// ==========================================
// 用途: 物料代码 → 目标速率 (件/分钟)
pub trait MaterialRateLookup: Send + Sync {
    /// 查询目标速率
    ///
    /// # 返回
    /// - Ok(Some(rate)): 找到
    /// - Ok(None): 未配置
    fn lookup_target_rate(&self, material_code: &str) -> RepositoryResult<Option<f64>>;
}
