// ==========================================
// 建材物料管理系统 - 权限与输入清洗
// ==========================================
// 红线: 每个对外操作先鉴权，再做任何读写
// 职责: Authorizer / Sanitizer 两个注入点及默认实现
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ==========================================
// Action - 受控操作
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    MaterialRead,
    MaterialCreate,
    MaterialUpdateStock,
    MaterialUpdatePrice,
    MaterialUpdateMinStock,
    MaterialDeactivate,
    AllocationRead,
    AllocationAssign,
    AllocationRelease,
    PersonnelAssign,
    OrderRead,
    OrderGenerate,
    OrderReceive,
    ProjectQuery,
    LogRead,
}

impl Action {
    /// 权限字符串（resource:verb）
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::MaterialRead => "materials:read",
            Action::MaterialCreate => "materials:create",
            Action::MaterialUpdateStock => "materials:update_stock",
            Action::MaterialUpdatePrice => "materials:update_price",
            Action::MaterialUpdateMinStock => "materials:update_min_stock",
            Action::MaterialDeactivate => "materials:deactivate",
            Action::AllocationRead => "allocations:read",
            Action::AllocationAssign => "allocations:assign",
            Action::AllocationRelease => "allocations:release",
            Action::PersonnelAssign => "personnel:assign",
            Action::OrderRead => "orders:read",
            Action::OrderGenerate => "orders:generate",
            Action::OrderReceive => "orders:receive",
            Action::ProjectQuery => "projects:query",
            Action::LogRead => "logs:read",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Authorizer - 鉴权
// ==========================================
pub trait Authorizer: Send + Sync {
    fn authorize(&self, user: &str, action: Action) -> bool;
}

/// 鉴权失败转为 Forbidden
pub fn ensure_authorized(authorizer: &dyn Authorizer, user: &str, action: Action) -> ApiResult<()> {
    if authorizer.authorize(user, action) {
        Ok(())
    } else {
        tracing::warn!(user = %user, action = %action, "鉴权失败");
        Err(ApiError::Forbidden {
            user: user.to_string(),
            action: action.as_str().to_string(),
        })
    }
}

/// 全部放行（开发/单机模式）
#[derive(Debug, Default, Clone)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn authorize(&self, _user: &str, _action: Action) -> bool {
        true
    }
}

/// 用户 → 权限表
///
/// 权限项为 `Action::as_str()` 或 `*`（全部操作）
#[derive(Debug, Default, Clone)]
pub struct PermissionTable {
    grants: HashMap<String, HashSet<String>>,
}

impl PermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 授予单个操作
    pub fn grant(mut self, user: &str, action: Action) -> Self {
        self.grants
            .entry(user.to_string())
            .or_default()
            .insert(action.as_str().to_string());
        self
    }

    /// 授予全部操作
    pub fn grant_all(mut self, user: &str) -> Self {
        self.grants
            .entry(user.to_string())
            .or_default()
            .insert("*".to_string());
        self
    }
}

impl Authorizer for PermissionTable {
    fn authorize(&self, user: &str, action: Action) -> bool {
        self.grants
            .get(user)
            .map(|perms| perms.contains("*") || perms.contains(action.as_str()))
            .unwrap_or(false)
    }
}

// ==========================================
// Sanitizer - 自由文本清洗
// ==========================================
pub trait Sanitizer: Send + Sync {
    fn sanitize(&self, value: &str) -> String;
}

/// 默认清洗：去首尾空白、去控制字符、合并连续空白、截断长度
#[derive(Debug, Clone)]
pub struct TextSanitizer {
    max_len: usize,
}

impl TextSanitizer {
    pub fn new(max_len: usize) -> Self {
        Self { max_len }
    }
}

impl Default for TextSanitizer {
    fn default() -> Self {
        Self::new(crate::config::config_manager::DEFAULT_SANITIZE_MAX_LEN)
    }
}

impl Sanitizer for TextSanitizer {
    fn sanitize(&self, value: &str) -> String {
        let cleaned: String = value
            .chars()
            .map(|c| if c.is_whitespace() { ' ' } else { c })
            .filter(|c| !c.is_control())
            .collect();
        let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.chars().take(self.max_len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_table() {
        let table = PermissionTable::new()
            .grant("clerk", Action::MaterialRead)
            .grant_all("admin");

        assert!(table.authorize("clerk", Action::MaterialRead));
        assert!(!table.authorize("clerk", Action::OrderReceive));
        assert!(table.authorize("admin", Action::OrderReceive));
        assert!(!table.authorize("nobody", Action::MaterialRead));
    }

    #[test]
    fn test_ensure_authorized() {
        let err = ensure_authorized(&PermissionTable::new(), "eve", Action::OrderGenerate).unwrap_err();
        match err {
            ApiError::Forbidden { user, action } => {
                assert_eq!(user, "eve");
                assert_eq!(action, "orders:generate");
            }
            _ => panic!("Expected Forbidden"),
        }
        assert!(ensure_authorized(&AllowAll, "eve", Action::OrderGenerate).is_ok());
    }

    #[test]
    fn test_text_sanitizer() {
        let s = TextSanitizer::new(10);
        assert_eq!(s.sanitize("  vidrio \t templado\n "), "vidrio tem");
        assert_eq!(s.sanitize("a\u{0007}b"), "ab");
        assert_eq!(s.sanitize("   "), "");
        assert_eq!(TextSanitizer::default().sanitize(" x  y "), "x y");
    }
}
