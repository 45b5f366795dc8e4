// ==========================================
// 建材物料管理系统 - 审计日志数据仓储
// ==========================================
// 红线: 只追加；每个写操作与其业务变更在同一事务内写入
// ==========================================

mod core;
mod queries;


pub use core::AuditRepository;
