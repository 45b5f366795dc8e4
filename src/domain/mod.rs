// ==========================================
// 建材物料管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、类别规则
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod allocation;
pub mod ledger_log;
pub mod material;
pub mod order;
pub mod project;
pub mod types;

// 重导出核心类型
pub use allocation::{AllocatedMaterial, Allocation, ResourceSummary};
pub use ledger_log::{audit_module, AuditEntry, MovementEntry};
pub use material::{KindRules, Material, NewMaterial, KIND_RULES};
pub use order::{OrderLine, OrderWithLines, ReplenishmentOrder};
pub use project::{AssignedPersonnel, NewProject, Personnel, PersonnelAssignment, Project};
pub use types::{
    AllocationState, MaterialKind, MaterialStatus, MovementKind, MovementReason, OrderStatus,
    ProjectStatus,
};
