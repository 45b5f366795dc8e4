// ==========================================
// 建材物料管理系统 - 应用层
// ==========================================
// 职责: 组装各层实例，供桌面端/命令行入口使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
