// ==========================================
// 建材物料管理系统 - 补货单领域模型 (pedido)
// ==========================================
// 红线: 状态为 RECEIVED 的补货单不可变
// ==========================================

use crate::domain::types::{MaterialKind, OrderStatus};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// ReplenishmentOrder - 补货单
// ==========================================
// 对齐: replenishment_order 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplenishmentOrder {
    pub id: i64,
    pub project_id: i64,
    pub status: OrderStatus,
    pub estimated_total: Decimal,
    pub issued_at: NaiveDateTime,
    pub issued_by: String,
    pub received_at: Option<NaiveDateTime>,
    pub received_by: Option<String>,
}

impl ReplenishmentOrder {
    pub fn is_received(&self) -> bool {
        self.status == OrderStatus::Received
    }
}

// ==========================================
// OrderLine - 补货单明细
// ==========================================
// 对齐: order_line 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    pub order_id: i64,
    pub material_id: i64,
    pub material_kind: MaterialKind,
    pub required_quantity: i64, // 缺口数量
    pub unit_price: Decimal,    // 下单时单价快照
}

impl OrderLine {
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.required_quantity) * self.unit_price
    }
}

// ==========================================
// OrderWithLines - 补货单 + 明细
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderWithLines {
    pub order: ReplenishmentOrder,
    pub lines: Vec<OrderLine>,
}
