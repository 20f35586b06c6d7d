// ==========================================
// OEE 监控系统 - 操作人与权限
// ==========================================
// 认证/授权由外部提供: 核心只消费不透明的操作人标识
// 以及权限校验能力
// ==========================================

use serde::{Deserialize, Serialize};

/// 当前操作人
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub actor_id: String,
}

impl Actor {
    pub fn new(actor_id: impl Into<String>) -> Self {
        Self {
            actor_id: actor_id.into(),
        }
    }

    /// 系统内部操作（批量导入、清理任务）
    pub fn system() -> Self {
        Self::new("system")
    }
}

/// 受控操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    SubmitProduction,
    EditProduction,
    ViewDashboard,
    ManageSettings,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::SubmitProduction => "SUBMIT_PRODUCTION",
            Permission::EditProduction => "EDIT_PRODUCTION",
            Permission::ViewDashboard => "VIEW_DASHBOARD",
            Permission::ManageSettings => "MANAGE_SETTINGS",
        }
    }
}

// ==========================================
// Trait: PermissionChecker
// ==========================================
// 实现者: 外部认证模块
pub trait PermissionChecker: Send + Sync {
    fn is_allowed(&self, actor: &Actor, permission: Permission) -> bool;
}

/// 放行全部操作（单机部署/测试）
#[derive(Debug, Clone, Default)]
pub struct AllowAllPermissions;

impl PermissionChecker for AllowAllPermissions {
    fn is_allowed(&self, _actor: &Actor, _permission: Permission) -> bool {
        true
    }
}
