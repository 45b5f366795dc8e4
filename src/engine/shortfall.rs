// ==========================================
// 建材物料管理系统 - 补货缺口计算引擎
// ==========================================
// 规则: shortfall = max(0, 占用数量 - 可用库存)
// 输出: 仅缺口 > 0 的物料，按 material_id 升序
// ==========================================

use crate::domain::allocation::AllocatedMaterial;
use crate::domain::types::MaterialKind;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 单个物料的缺口
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortfallLine {
    pub material_id: i64,
    pub material_kind: MaterialKind,
    pub required_quantity: i64, // 工程占用数量
    pub free_stock: i64,
    pub shortfall: i64,
    pub unit_price: Decimal,
}

impl ShortfallLine {
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.shortfall) * self.unit_price
    }
}

pub struct ShortfallEngine;

impl ShortfallEngine {
    /// 计算缺口（剔除无缺口物料）
    pub fn compute(allocated: &[AllocatedMaterial]) -> Vec<ShortfallLine> {
        let mut lines: Vec<ShortfallLine> = allocated
            .iter()
            .filter_map(|a| {
                let shortfall = (a.allocated_quantity - a.free_stock).max(0);
                (shortfall > 0).then(|| ShortfallLine {
                    material_id: a.material_id,
                    material_kind: a.material_kind,
                    required_quantity: a.allocated_quantity,
                    free_stock: a.free_stock,
                    shortfall,
                    unit_price: a.unit_price,
                })
            })
            .collect();
        lines.sort_by_key(|l| l.material_id);
        lines
    }

    /// 估算总额 Σ 缺口 × 单价
    pub fn estimated_total(lines: &[ShortfallLine]) -> Decimal {
        lines.iter().map(ShortfallLine::line_total).sum()
    }
}
