// ==========================================
// 建材物料管理系统 - 工期计算
// ==========================================
// 职责: 剩余天数/逾期天数/计划天数/进度
// 约定: 纯函数显式接收 today，调用方决定“今天”
// ==========================================

use crate::domain::project::Project;
use chrono::{DateTime, NaiveDate};

/// 预计完工日期可接受的格式（按顺序尝试）
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];

/// 解析预计完工日期
///
/// 支持 `2026-05-31`、`31/05/2026`、RFC 3339 时间戳；其他返回 None
pub fn parse_end_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(date);
        }
    }
    DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive())
}

/// 距预计完工还剩多少天（已过期或日期无效为 0）
pub fn days_remaining(estimated_end: Option<&str>, today: NaiveDate) -> i64 {
    match estimated_end.and_then(parse_end_date) {
        Some(end) => (end - today).num_days().max(0),
        None => 0,
    }
}

/// 超过预计完工多少天（未到期或日期无效为 0）
pub fn days_overdue(estimated_end: Option<&str>, today: NaiveDate) -> i64 {
    match estimated_end.and_then(parse_end_date) {
        Some(end) => (today - end).num_days().max(0),
        None => 0,
    }
}

/// 计划天数（含首尾）
///
/// 起始或完工日期缺失/无效，或完工早于起始时为 1
pub fn planned_days(start: Option<NaiveDate>, estimated_end: Option<&str>) -> i64 {
    match (start, estimated_end.and_then(parse_end_date)) {
        (Some(start), Some(end)) if end >= start => (end - start).num_days() + 1,
        _ => 1,
    }
}

/// 百分比钳制到 [0, 100]，NaN 记为 0
pub fn clamp_percentage(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

// ==========================================
// ProgressSource - 工程进度来源
// ==========================================
// 外部协作方（工程模块/现场报工）实现该 trait
pub trait ProgressSource: Send + Sync {
    /// 返回工程完成百分比
    fn progress(&self, project: &Project) -> anyhow::Result<f64>;
}

// ==========================================
// ScheduleProgress - 按工期流逝估算进度
// ==========================================
pub struct ScheduleProgress {
    today: Option<NaiveDate>,
}

impl ScheduleProgress {
    /// 以本地当天计算
    pub fn new() -> Self {
        Self { today: None }
    }

    /// 固定“今天”（测试/回放用）
    pub fn at(today: NaiveDate) -> Self {
        Self { today: Some(today) }
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

impl Default for ScheduleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSource for ScheduleProgress {
    fn progress(&self, project: &Project) -> anyhow::Result<f64> {
        let start = project
            .start_date
            .ok_or_else(|| anyhow::anyhow!("project {} has no start date", project.id))?;
        let end = project
            .estimated_end_date
            .as_deref()
            .and_then(parse_end_date)
            .ok_or_else(|| anyhow::anyhow!("project {} has no valid estimated end date", project.id))?;

        let today = self.today();
        let total = (end - start).num_days();
        if total <= 0 {
            return Ok(if today >= end { 100.0 } else { 0.0 });
        }
        let elapsed = (today - start).num_days();
        Ok(clamp_percentage(elapsed as f64 * 100.0 / total as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ProjectStatus;
    use rust_decimal::Decimal;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn project(start: Option<NaiveDate>, end: Option<&str>) -> Project {
        Project {
            id: 1,
            name: "P".to_string(),
            status: ProjectStatus::InProgress,
            start_date: start,
            estimated_end_date: end.map(|s| s.to_string()),
            budget: Decimal::ZERO,
        }
    }

    #[test]
    fn test_parse_end_date_formats() {
        assert_eq!(parse_end_date("2026-05-31"), Some(d(2026, 5, 31)));
        assert_eq!(parse_end_date("31/05/2026"), Some(d(2026, 5, 31)));
        assert_eq!(parse_end_date("2026-05-31T18:00:00Z"), Some(d(2026, 5, 31)));
        assert_eq!(parse_end_date("soon"), None);
        assert_eq!(parse_end_date(""), None);
    }

    #[test]
    fn test_days_remaining_and_overdue() {
        let today = d(2026, 3, 1);
        assert_eq!(days_remaining(Some("2026-03-11"), today), 10);
        assert_eq!(days_overdue(Some("2026-03-11"), today), 0);
        assert_eq!(days_remaining(Some("2026-02-27"), today), 0);
        assert_eq!(days_overdue(Some("2026-02-27"), today), 2);
        assert_eq!(days_remaining(None, today), 0);
        assert_eq!(days_overdue(Some("??"), today), 0);
    }

    #[test]
    fn test_planned_days() {
        assert_eq!(planned_days(Some(d(2026, 1, 1)), Some("2026-01-10")), 10);
        assert_eq!(planned_days(Some(d(2026, 1, 1)), Some("2026-01-01")), 1);
        assert_eq!(planned_days(Some(d(2026, 1, 10)), Some("2026-01-01")), 1);
        assert_eq!(planned_days(None, Some("2026-01-10")), 1);
        assert_eq!(planned_days(Some(d(2026, 1, 1)), Some("bad")), 1);
    }

    #[test]
    fn test_schedule_progress() {
        let p = project(Some(d(2026, 1, 1)), Some("2026-01-11"));
        assert_eq!(ScheduleProgress::at(d(2026, 1, 6)).progress(&p).unwrap(), 50.0);
        assert_eq!(ScheduleProgress::at(d(2025, 12, 1)).progress(&p).unwrap(), 0.0);
        assert_eq!(ScheduleProgress::at(d(2026, 6, 1)).progress(&p).unwrap(), 100.0);

        let missing = project(None, Some("2026-01-11"));
        assert!(ScheduleProgress::at(d(2026, 1, 6)).progress(&missing).is_err());
    }

    #[test]
    fn test_clamp_percentage() {
        assert_eq!(clamp_percentage(f64::NAN), 0.0);
        assert_eq!(clamp_percentage(130.0), 100.0);
        assert_eq!(clamp_percentage(-3.0), 0.0);
    }
}
