// ==========================================
// OEE 监控系统 - 告警事件发布
// ==========================================
// 职责: 定义告警发布 trait，实现依赖倒置
// 说明: Engine 层定义 trait，仓储层/通知层实现
// 红线: 核心不感知投递渠道（消息中继、界面、持久化）
// ==========================================

use crate::domain::alert::AlertEvent;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// 告警发布 Trait
// ==========================================

/// 告警事件发布者 Trait
///
/// # 实现说明
/// - `AlertEventRepository` 持久化到 alert_event 表
/// - 外部通知服务可实现此 trait 接收同一批事件
pub trait AlertEventPublisher: Send + Sync {
    /// 发布一批告警事件
    ///
    /// # 返回
    /// - `Ok(count)`: 已接收的事件数
    /// - `Err`: 发布失败（调用方记录日志, 不阻断主流程）
    fn publish(&self, events: &[AlertEvent]) -> Result<usize, Box<dyn Error + Send + Sync>>;
}

/// 空操作发布者
#[derive(Debug, Clone, Default)]
pub struct NoOpAlertPublisher;

impl AlertEventPublisher for NoOpAlertPublisher {
    fn publish(&self, events: &[AlertEvent]) -> Result<usize, Box<dyn Error + Send + Sync>> {
        tracing::debug!("NoOpAlertPublisher: 跳过 {} 条告警", events.len());
        Ok(0)
    }
}

/// 内存收集发布者
///
/// 用于界面轮询与测试断言
#[derive(Debug, Default)]
pub struct CollectingAlertPublisher {
    events: Mutex<Vec<AlertEvent>>,
}

impl CollectingAlertPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取出并清空已收集的事件
    pub fn drain(&self) -> Vec<AlertEvent> {
        self.events
            .lock()
            .map(|mut guard| std::mem::take(&mut *guard))
            .unwrap_or_default()
    }
}

impl AlertEventPublisher for CollectingAlertPublisher {
    fn publish(&self, events: &[AlertEvent]) -> Result<usize, Box<dyn Error + Send + Sync>> {
        let mut guard = self
            .events
            .lock()
            .map_err(|e| format!("锁获取失败: {}", e))?;
        guard.extend_from_slice(events);
        Ok(events.len())
    }
}

/// 扇出发布者: 依次投递给多个下游
///
/// 单个下游失败不影响其余下游, 全部失败时返回最后一个错误
pub struct FanoutAlertPublisher {
    sinks: Vec<Arc<dyn AlertEventPublisher>>,
}

impl FanoutAlertPublisher {
    pub fn new(sinks: Vec<Arc<dyn AlertEventPublisher>>) -> Self {
        Self { sinks }
    }
}

impl AlertEventPublisher for FanoutAlertPublisher {
    fn publish(&self, events: &[AlertEvent]) -> Result<usize, Box<dyn Error + Send + Sync>> {
        let mut delivered = 0;
        let mut last_err = None;

        for sink in &self.sinks {
            match sink.publish(events) {
                Ok(n) => delivered = delivered.max(n),
                Err(e) => {
                    tracing::warn!("告警下游投递失败: {}", e);
                    last_err = Some(e);
                }
            }
        }

        match last_err {
            Some(e) if delivered == 0 && !events.is_empty() => Err(e),
            _ => Ok(delivered),
        }
    }
}
