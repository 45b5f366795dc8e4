// ==========================================
// 建材物料管理系统 - 库存流水/审计日志领域模型
// ==========================================
// 红线: 只追加，不提供修改/删除路径
// 用途: 库存追溯，业务审计
// ==========================================

use crate::domain::types::{MovementKind, MovementReason};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// MovementEntry - 库存流水
// ==========================================
// 每个影响库存的操作写一条（分配/释放/收货/人工修正）
// 对齐: stock_movement 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementEntry {
    pub id: Option<i64>,              // 写入前为 None
    pub material_id: i64,
    pub kind: MovementKind,
    pub quantity: i64,
    pub reason: MovementReason,
    pub project_id: Option<i64>,      // 关联工程
    pub order_id: Option<i64>,        // 关联补货单
    pub user: String,
    pub timestamp: NaiveDateTime,
}

impl MovementEntry {
    /// 创建新的库存流水
    pub fn new(
        material_id: i64,
        kind: MovementKind,
        quantity: i64,
        reason: MovementReason,
        user: &str,
    ) -> Self {
        Self {
            id: None,
            material_id,
            kind,
            quantity,
            reason,
            project_id: None,
            order_id: None,
            user: user.to_string(),
            timestamp: chrono::Local::now().naive_local(),
        }
    }

    pub fn with_project(mut self, project_id: i64) -> Self {
        self.project_id = Some(project_id);
        self
    }

    pub fn with_order(mut self, order_id: i64) -> Self {
        self.order_id = Some(order_id);
        self
    }

    /// 带方向的数量（入库为正，出库为负）
    pub fn signed_quantity(&self) -> i64 {
        match self.kind {
            MovementKind::Ingress => self.quantity,
            MovementKind::Egress => -self.quantity,
        }
    }
}

// ==========================================
// AuditModule - 审计模块名
// ==========================================
pub mod audit_module {
    pub const MATERIALS: &str = "materials";
    pub const ALLOCATIONS: &str = "allocations";
    pub const PERSONNEL: &str = "personnel";
    pub const ORDERS: &str = "orders";
}

// ==========================================
// AuditEntry - 业务审计日志
// ==========================================
// 对齐: audit_log 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub audit_id: String,              // UUID
    pub user: String,
    pub module: String,
    pub action: String,                // 业务事件描述，如 "created allocation #42"
    pub timestamp: NaiveDateTime,
    pub payload_json: Option<JsonValue>,
}

impl AuditEntry {
    /// 创建新的审计日志
    ///
    /// # 参数
    /// - `user`: 操作人
    /// - `module`: 所属模块（见 `audit_module`）
    /// - `action`: 业务事件描述
    pub fn new(user: &str, module: &str, action: impl Into<String>) -> Self {
        Self {
            audit_id: uuid::Uuid::new_v4().to_string(),
            user: user.to_string(),
            module: module.to_string(),
            action: action.into(),
            timestamp: chrono::Local::now().naive_local(),
            payload_json: None,
        }
    }

    /// 设置操作负载 (转换为JSON)
    pub fn with_payload<T: Serialize>(mut self, payload: &T) -> Self {
        self.payload_json = serde_json::to_value(payload).ok();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_quantity() {
        let egress = MovementEntry::new(1, MovementKind::Egress, 15, MovementReason::Allocation, "ana");
        let ingress = MovementEntry::new(1, MovementKind::Ingress, 10, MovementReason::OrderReceipt, "ana");
        assert_eq!(egress.signed_quantity(), -15);
        assert_eq!(ingress.signed_quantity(), 10);
    }

    #[test]
    fn test_audit_entry_payload() {
        let entry = AuditEntry::new("ana", audit_module::ORDERS, "received order #3")
            .with_payload(&serde_json::json!({ "order_id": 3 }));
        assert_eq!(entry.module, "orders");
        assert_eq!(entry.payload_json.unwrap()["order_id"], 3);
        assert_eq!(entry.audit_id.len(), 36);
    }
}
