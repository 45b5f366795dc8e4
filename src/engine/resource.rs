// ==========================================
// 建材物料管理系统 - 工程资源汇总引擎
// ==========================================
// 物料成本 = Σ 占用数量 × 单价
// 人员成本 = Σ 日成本 × 计划天数（派驻起始 → 预计完工，含首尾）
// ==========================================

use crate::domain::allocation::{AllocatedMaterial, ResourceSummary};
use crate::domain::project::{AssignedPersonnel, Project};
use crate::engine::schedule::planned_days;
use rust_decimal::Decimal;
use std::collections::HashSet;

pub struct ResourceEngine;

impl ResourceEngine {
    pub fn summarize(
        project: &Project,
        materials: &[AllocatedMaterial],
        personnel: &[AssignedPersonnel],
    ) -> ResourceSummary {
        let material_count = materials
            .iter()
            .filter(|m| m.allocated_quantity > 0)
            .map(|m| m.material_id)
            .collect::<HashSet<_>>()
            .len();

        let material_cost: Decimal = materials
            .iter()
            .map(|m| Decimal::from(m.allocated_quantity) * m.unit_price)
            .sum();

        let end = project.estimated_end_date.as_deref();
        let personnel_cost: Decimal = personnel
            .iter()
            .map(|p| {
                let start = p.start_date.or(project.start_date);
                p.daily_cost * Decimal::from(planned_days(start, end))
            })
            .sum();

        ResourceSummary {
            project_id: project.id,
            material_count,
            material_cost,
            personnel_count: personnel.len(),
            estimated_total_cost: material_cost + personnel_cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{MaterialKind, ProjectStatus};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn project(end: Option<&str>) -> Project {
        Project {
            id: 5,
            name: "P".to_string(),
            status: ProjectStatus::InProgress,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1),
            estimated_end_date: end.map(|s| s.to_string()),
            budget: Decimal::ZERO,
        }
    }

    fn person(start: Option<NaiveDate>, cost: Decimal) -> AssignedPersonnel {
        AssignedPersonnel {
            person_id: 1,
            role: "glazier".to_string(),
            start_date: start,
            daily_cost: cost,
        }
    }

    #[test]
    fn test_summary_costs() {
        let materials = vec![
            AllocatedMaterial {
                material_id: 1,
                material_kind: MaterialKind::Glass,
                allocated_quantity: 4,
                unit_price: dec!(12.50),
                free_stock: 0,
            },
            AllocatedMaterial {
                material_id: 2,
                material_kind: MaterialKind::Hardware,
                allocated_quantity: 10,
                unit_price: dec!(1),
                free_stock: 3,
            },
        ];
        let personnel = vec![person(NaiveDate::from_ymd_opt(2026, 1, 6), dec!(100))];

        let summary = ResourceEngine::summarize(&project(Some("2026-01-10")), &materials, &personnel);
        assert_eq!(summary.material_count, 2);
        assert_eq!(summary.material_cost, dec!(60.00));
        assert_eq!(summary.personnel_count, 1);
        // 2026-01-06 ~ 2026-01-10 共 5 天
        assert_eq!(summary.estimated_total_cost, dec!(560.00));
    }

    #[test]
    fn test_missing_end_date_counts_one_day() {
        let personnel = vec![person(None, dec!(80)), person(None, dec!(20))];
        let summary = ResourceEngine::summarize(&project(Some("n/a")), &[], &personnel);
        assert_eq!(summary.material_cost, Decimal::ZERO);
        assert_eq!(summary.estimated_total_cost, dec!(100));
    }

    #[test]
    fn test_empty_project() {
        let summary = ResourceEngine::summarize(&project(None), &[], &[]);
        assert_eq!(summary, ResourceSummary::empty(5));
    }
}
