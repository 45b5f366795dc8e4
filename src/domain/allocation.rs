// ==========================================
// 建材物料管理系统 - 物料占用领域模型
// ==========================================
// 红线: 同一 (工程, 物料) 的 ACTIVE 占用数量
//       = 已从可用库存扣出且尚未释放的数量
// ==========================================

use crate::domain::types::{AllocationState, MaterialKind};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// Allocation - 工程物料占用 (material assigned to obra)
// ==========================================
// 状态机: None → Active → Released (终态)
// 释放后再次分配会新建一行，不复活旧行
// 对齐: allocation 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    pub id: i64,
    pub project_id: i64,
    pub material_id: i64,
    pub material_kind: MaterialKind,
    pub quantity: i64,                     // 当前占用数量（ACTIVE 时 > 0）
    pub state: AllocationState,
    pub assigned_at: NaiveDateTime,
    pub released_at: Option<NaiveDateTime>,
}

impl Allocation {
    pub fn is_active(&self) -> bool {
        self.state == AllocationState::Active
    }
}

// ==========================================
// AllocatedMaterial - 占用 + 物料价格/库存（需求聚合用）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocatedMaterial {
    pub material_id: i64,
    pub material_kind: MaterialKind,
    pub allocated_quantity: i64,
    pub unit_price: Decimal,
    pub free_stock: i64,
}

// ==========================================
// ResourceSummary - 工程资源汇总
// ==========================================
// 只读聚合，字段缺失时取默认值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSummary {
    pub project_id: i64,
    pub material_count: usize,        // 占用中的物料种类数
    pub material_cost: Decimal,       // Σ 数量 × 单价
    pub personnel_count: usize,       // 派驻人数
    pub estimated_total_cost: Decimal, // 物料成本 + 人员成本
}

impl ResourceSummary {
    pub fn empty(project_id: i64) -> Self {
        Self {
            project_id,
            material_count: 0,
            material_cost: Decimal::ZERO,
            personnel_count: 0,
            estimated_total_cost: Decimal::ZERO,
        }
    }
}
