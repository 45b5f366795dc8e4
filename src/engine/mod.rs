// ==========================================
// 建材物料管理系统 - 引擎层
// ==========================================
// 职责: 实现业务规则（检索评分/工期/缺口/资源汇总）
// 红线: Engine 不拼 SQL, 只接收已加载的数据
// ==========================================

pub mod resource;
pub mod schedule;
pub mod search;
pub mod shortfall;

// 重导出核心引擎
pub use resource::ResourceEngine;
pub use schedule::{
    clamp_percentage, days_overdue, days_remaining, parse_end_date, planned_days, ProgressSource,
    ScheduleProgress,
};
pub use search::{MaterialSearchEngine, SearchHit};
pub use shortfall::{ShortfallEngine, ShortfallLine};
