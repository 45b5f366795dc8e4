// ==========================================
// 建材物料管理系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 物料占用与补货台账（玻璃/五金/通用库存）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表/写事务）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AllocationState, MaterialKind, MaterialStatus, MovementKind, MovementReason, OrderStatus,
    ProjectStatus,
};

// 领域实体
pub use domain::{
    Allocation, AuditEntry, Material, MovementEntry, NewMaterial, OrderLine, OrderWithLines,
    Project, ReplenishmentOrder, ResourceSummary,
};

// API
pub use api::{AllocationApi, ApiError, ApiResult, LedgerLogApi, MaterialApi, OrderApi, QueryApi};

// 基础设施
pub use db::Database;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "建材物料管理系统";

// 数据库版本
pub const DB_VERSION: &str = "v1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(db::CURRENT_SCHEMA_VERSION, 1);
    }
}
