// ==========================================
// OEE 监控系统 - 历史快照写入器
// ==========================================
// 职责: 尽力写入 OEE 历史快照
// 红线: 写入失败/超时只记录告警, 不影响生产记录主写入
// 机制: spawn_blocking + 超时; 超时后后台写入继续执行
// ==========================================

use crate::domain::history::HistoryEntry;
use crate::engine::repositories::HistoryStore;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// 默认写入超时（毫秒）
pub const DEFAULT_HISTORY_WRITE_TIMEOUT_MS: u64 = 2_000;

/// 历史快照写入错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HistoryWriteError {
    #[error("历史快照写入失败: {0}")]
    Store(String),

    #[error("历史快照写入超时: {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("历史快照写入任务异常: {0}")]
    TaskFailed(String),
}

/// 写入结果
#[derive(Debug, Clone)]
pub enum HistoryRecordOutcome {
    Recorded(HistoryEntry),
    Failed {
        entry: HistoryEntry,
        error: HistoryWriteError,
    },
}

impl HistoryRecordOutcome {
    pub fn entry(&self) -> &HistoryEntry {
        match self {
            HistoryRecordOutcome::Recorded(entry) => entry,
            HistoryRecordOutcome::Failed { entry, .. } => entry,
        }
    }

    pub fn is_recorded(&self) -> bool {
        matches!(self, HistoryRecordOutcome::Recorded(_))
    }

    /// 失败时的告警文本
    pub fn warning(&self) -> Option<String> {
        match self {
            HistoryRecordOutcome::Recorded(_) => None,
            HistoryRecordOutcome::Failed { error, .. } => Some(error.to_string()),
        }
    }
}

// ==========================================
// HistoryRecorder - 历史快照写入器
// ==========================================
#[derive(Clone)]
pub struct HistoryRecorder {
    store: Arc<dyn HistoryStore>,
    timeout: Duration,
}

impl HistoryRecorder {
    pub fn new(store: Arc<dyn HistoryStore>, timeout_ms: u64) -> Self {
        Self {
            store,
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    /// 写入历史快照
    ///
    /// # 返回
    /// 永不返回 Err: 失败信息放在 `HistoryRecordOutcome::Failed` 中
    pub async fn record(&self, entry: HistoryEntry) -> HistoryRecordOutcome {
        let store = Arc::clone(&self.store);
        let to_save = entry.clone();
        let task = tokio::task::spawn_blocking(move || store.save_history_entry(&to_save));

        let error = match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(Ok(entry_id))) => {
                tracing::debug!(
                    "历史快照已写入: entry_id={}, machine_id={}",
                    entry_id,
                    entry.machine_id
                );
                return HistoryRecordOutcome::Recorded(entry);
            }
            Ok(Ok(Err(e))) => HistoryWriteError::Store(e.to_string()),
            Ok(Err(join_err)) => HistoryWriteError::TaskFailed(join_err.to_string()),
            Err(_elapsed) => HistoryWriteError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            },
        };

        tracing::warn!(
            "机组 {} 历史快照写入失败(不影响生产记录): {}",
            entry.machine_id,
            error
        );
        HistoryRecordOutcome::Failed { entry, error }
    }
}
