// ==========================================
// 建材物料管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约定: `*_tx(conn, ..)` 为事务内关联函数，由调用方的写事务提供连接
// ==========================================

pub mod allocation_repo;
pub mod audit_repo;
pub mod error;
pub mod material_repo;
pub mod movement_repo;
pub mod order_repo;
pub mod project_repo;

// 重导出核心仓储
pub use allocation_repo::AllocationRepository;
pub use audit_repo::AuditRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use material_repo::MaterialRepository;
pub use movement_repo::MovementRepository;
pub use order_repo::OrderRepository;
pub use project_repo::{PersonnelRepository, ProjectRepository};
