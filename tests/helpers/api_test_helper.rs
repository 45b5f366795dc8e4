// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 基于临时数据库组装完整 AppState
// ==========================================

#[path = "../test_helpers.rs"]
mod test_helpers;

use std::sync::Arc;

use rusqlite::params;
use rust_decimal::Decimal;
use tempfile::NamedTempFile;

use obra_ledger::api::{AllowAll, Authorizer};
use obra_ledger::app::AppState;
use obra_ledger::domain::{Material, NewMaterial, NewProject};
use obra_ledger::engine::{ProgressSource, ScheduleProgress};

// ==========================================
// 测试环境
// ==========================================

/// 台账测试环境
///
/// 包含完整 AppState 与临时数据库文件
pub struct LedgerTestEnv {
    pub state: AppState,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

impl LedgerTestEnv {
    /// 默认协作方（AllowAll + 按工期估算进度）
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_collaborators(Arc::new(AllowAll), Arc::new(ScheduleProgress::new()))
    }

    pub fn with_authorizer(
        authorizer: Arc<dyn Authorizer>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_collaborators(authorizer, Arc::new(ScheduleProgress::new()))
    }

    pub fn with_progress_source(
        progress_source: Arc<dyn ProgressSource>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_collaborators(Arc::new(AllowAll), progress_source)
    }

    pub fn with_collaborators(
        authorizer: Arc<dyn Authorizer>,
        progress_source: Arc<dyn ProgressSource>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let (temp_file, db) = test_helpers::create_test_db()?;
        let state = AppState::with_collaborators(db, authorizer, progress_source)?;
        Ok(Self {
            state,
            _temp_file: temp_file,
        })
    }

    // ==========================================
    // 数据准备
    // ==========================================

    pub fn create_material(&self, data: NewMaterial) -> Material {
        self.state
            .material_api
            .create_material(data, "admin")
            .expect("新建物料失败")
    }

    pub fn create_project(&self, data: NewProject) -> i64 {
        self.state.project_repo.insert(&data).expect("新建工程失败")
    }

    pub fn create_person(&self, name: &str, daily_cost: Decimal) -> i64 {
        self.state
            .personnel_repo
            .insert_person(name, daily_cost)
            .expect("新建人员失败")
    }

    // ==========================================
    // 直接读库（断言用）
    // ==========================================

    pub fn free_stock(&self, material_id: i64) -> i64 {
        let conn = self.state.db.lock().expect("锁数据库失败");
        conn.query_row(
            "SELECT free_stock FROM material WHERE id = ?1",
            params![material_id],
            |row| row.get(0),
        )
        .expect("查询库存失败")
    }

    pub fn count_rows(&self, table: &str) -> i64 {
        let conn = self.state.db.lock().expect("锁数据库失败");
        conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .expect("统计行数失败")
    }

    /// Σ 入库 - Σ 出库
    pub fn movement_net(&self, material_id: i64) -> i64 {
        let conn = self.state.db.lock().expect("锁数据库失败");
        conn.query_row(
            r#"SELECT COALESCE(SUM(CASE kind WHEN 'INGRESS' THEN quantity ELSE -quantity END), 0)
               FROM stock_movement WHERE material_id = ?1"#,
            params![material_id],
            |row| row.get(0),
        )
        .expect("汇总流水失败")
    }
}
