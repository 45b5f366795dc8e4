// ==========================================
// 建材物料管理系统 - API 层
// ==========================================
// 职责: 对外业务操作，鉴权 → 校验 → 事务 → 审计
// ==========================================

pub mod allocation_api;
pub mod error;
pub mod guard;
pub mod ledger_log_api;
pub mod material_api;
pub mod order_api;
pub mod query_api;
pub mod validator;

// 重导出
pub use allocation_api::AllocationApi;
pub use error::{ApiError, ApiResult};
pub use guard::{Action, AllowAll, Authorizer, PermissionTable, Sanitizer, TextSanitizer};
pub use ledger_log_api::LedgerLogApi;
pub use material_api::MaterialApi;
pub use order_api::OrderApi;
pub use query_api::QueryApi;
