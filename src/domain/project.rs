// ==========================================
// 建材物料管理系统 - 工程/人员领域模型
// ==========================================
// 工程 (obra) 由外部工程模块维护，本系统只读取 id/状态/日期
// ==========================================

use crate::domain::types::ProjectStatus;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// Project - 工程
// ==========================================
// 对齐: project 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    /// 预计完工日期（保留原始文本，无法解析时按缺失处理）
    pub estimated_end_date: Option<String>,
    pub budget: Decimal,
}

// ==========================================
// NewProject - 新建工程入参（工程模块/初始化数据使用）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub status: ProjectStatus,
    pub start_date: Option<NaiveDate>,
    pub estimated_end_date: Option<String>,
    pub budget: Decimal,
}

// ==========================================
// Personnel - 人员
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Personnel {
    pub id: i64,
    pub name: String,
    pub daily_cost: Decimal, // 日成本
    pub active: bool,
}

// ==========================================
// PersonnelAssignment - 人员派驻工程
// ==========================================
// 无库存影响，只记录关联
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonnelAssignment {
    pub id: i64,
    pub project_id: i64,
    pub person_id: i64,
    pub role: String,
    pub start_date: NaiveDate,
    pub assigned_at: NaiveDateTime,
}

// ==========================================
// AssignedPersonnel - 人员派驻 + 日成本（汇总用）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignedPersonnel {
    pub person_id: i64,
    pub role: String,
    pub start_date: Option<NaiveDate>,
    pub daily_cost: Decimal,
}
