// ==========================================
// 建材物料管理系统 - 物料领域模型
// ==========================================
// 红线: free_stock 任何时刻不得为负
// 红线: 物料不物理删除，只停用
// ==========================================

use crate::domain::types::{MaterialKind, MaterialStatus};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// Material - 物料主数据 + 库存
// ==========================================
// 用途: 目录层写入，占用台账/补货单变更库存
// 对齐: material 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    // ===== 主键 =====
    pub id: i64,

    // ===== 基础信息 =====
    pub code: String,                 // 物料编码（唯一）
    pub kind: MaterialKind,           // 物料类别
    pub description: String,          // 描述
    pub supplier: Option<String>,     // 供应商
    pub unit: Option<String>,         // 计量单位
    pub thickness_mm: Option<f64>,    // 厚度（仅玻璃）

    // ===== 价格与库存 =====
    pub unit_price: Decimal,          // 单价
    pub free_stock: i64,              // 可用库存（未被工程占用）
    pub min_stock: i64,               // 最低库存阈值

    // ===== 状态 =====
    pub status: MaterialStatus,

    // ===== 审计字段 =====
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Material {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// 是否低于最低库存
    pub fn is_below_min_stock(&self) -> bool {
        self.free_stock < self.min_stock
    }
}

// ==========================================
// NewMaterial - 新建物料入参
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMaterial {
    pub code: String,
    pub kind: MaterialKind,
    pub description: String,
    pub supplier: Option<String>,
    pub unit: Option<String>,
    pub thickness_mm: Option<f64>,
    pub unit_price: Decimal,
    pub initial_stock: i64,
    pub min_stock: i64,
}

// ==========================================
// KindRules - 按类别的必填规则
// ==========================================
// 用查表代替按类别分别建模
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindRules {
    pub kind: MaterialKind,
    pub requires_thickness: bool, // 厚度必须为正
    pub requires_supplier: bool,  // 供应商必填
    pub requires_unit: bool,      // 计量单位必填
}

pub const KIND_RULES: [KindRules; 3] = [
    KindRules {
        kind: MaterialKind::Glass,
        requires_thickness: true,
        requires_supplier: false,
        requires_unit: true,
    },
    KindRules {
        kind: MaterialKind::Hardware,
        requires_thickness: false,
        requires_supplier: true,
        requires_unit: false,
    },
    KindRules {
        kind: MaterialKind::GenericInventory,
        requires_thickness: false,
        requires_supplier: false,
        requires_unit: true,
    },
];

impl KindRules {
    /// 查找类别对应规则
    pub fn for_kind(kind: MaterialKind) -> &'static KindRules {
        KIND_RULES
            .iter()
            .find(|r| r.kind == kind)
            .unwrap_or(&KIND_RULES[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_rules_lookup() {
        assert!(KindRules::for_kind(MaterialKind::Glass).requires_thickness);
        assert!(KindRules::for_kind(MaterialKind::Hardware).requires_supplier);
        assert!(!KindRules::for_kind(MaterialKind::Hardware).requires_thickness);
        assert!(KindRules::for_kind(MaterialKind::GenericInventory).requires_unit);
    }
}
