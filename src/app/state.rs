// ==========================================
// 建材物料管理系统 - 应用状态
// ==========================================
// 职责: 组装共享数据库句柄、仓储、API 实例
// 约定: 不使用全局单例，所有协作方通过构造参数注入
// ==========================================

use std::sync::Arc;

use crate::api::{
    AllocationApi, AllowAll, Authorizer, LedgerLogApi, MaterialApi, OrderApi, QueryApi,
    Sanitizer, TextSanitizer,
};
use crate::config::ConfigManager;
use crate::db::Database;
use crate::engine::{ProgressSource, ScheduleProgress};
use crate::repository::{
    AllocationRepository, AuditRepository, MaterialRepository, MovementRepository,
    OrderRepository, PersonnelRepository, ProjectRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库句柄
    pub db: Database,

    /// 配置管理器
    pub config: Arc<ConfigManager>,

    /// 物料目录API
    pub material_api: Arc<MaterialApi>,

    /// 占用台账API
    pub allocation_api: Arc<AllocationApi>,

    /// 补货单API
    pub order_api: Arc<OrderApi>,

    /// 查询聚合API
    pub query_api: Arc<QueryApi>,

    /// 流水/审计查询API
    pub ledger_log_api: Arc<LedgerLogApi>,

    /// 工程仓储（工程模块/初始化数据使用）
    pub project_repo: Arc<ProjectRepository>,

    /// 人员仓储（工程模块/初始化数据使用）
    pub personnel_repo: Arc<PersonnelRepository>,
}

impl AppState {
    /// 打开数据库并以默认协作方组装（AllowAll + 按工期估算进度）
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let db = Database::open(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        Self::with_collaborators(db, Arc::new(AllowAll), Arc::new(ScheduleProgress::new()))
    }

    /// 以指定的鉴权与进度来源组装
    pub fn with_collaborators(
        db: Database,
        authorizer: Arc<dyn Authorizer>,
        progress_source: Arc<dyn ProgressSource>,
    ) -> Result<Self, String> {
        // ==========================================
        // 初始化Repository层
        // ==========================================
        let material_repo = Arc::new(MaterialRepository::new(db.clone()));
        let allocation_repo = Arc::new(AllocationRepository::new(db.clone()));
        let project_repo = Arc::new(ProjectRepository::new(db.clone()));
        let personnel_repo = Arc::new(PersonnelRepository::new(db.clone()));
        let order_repo = Arc::new(OrderRepository::new(db.clone()));
        let movement_repo = Arc::new(MovementRepository::new(db.clone()));
        let audit_repo = Arc::new(AuditRepository::new(db.clone()));

        // ==========================================
        // 配置与输入清洗
        // ==========================================
        let config = Arc::new(ConfigManager::new(db.clone()));
        let max_len = config
            .get_sanitize_max_len()
            .map_err(|e| format!("读取配置失败: {}", e))?;
        let sanitizer: Arc<dyn Sanitizer> = Arc::new(TextSanitizer::new(max_len));

        // ==========================================
        // 创建API实例
        // ==========================================
        let material_api = Arc::new(MaterialApi::new(
            db.clone(),
            material_repo.clone(),
            authorizer.clone(),
            sanitizer.clone(),
        ));

        let allocation_api = Arc::new(AllocationApi::new(
            db.clone(),
            material_repo.clone(),
            allocation_repo,
            project_repo.clone(),
            personnel_repo.clone(),
            config.clone(),
            authorizer.clone(),
            sanitizer.clone(),
        ));

        let order_api = Arc::new(OrderApi::new(db.clone(), order_repo, authorizer.clone()));

        let query_api = Arc::new(QueryApi::new(
            material_repo,
            project_repo.clone(),
            progress_source,
            config.clone(),
            authorizer.clone(),
            sanitizer,
        ));

        let ledger_log_api = Arc::new(LedgerLogApi::new(
            movement_repo,
            audit_repo,
            config.clone(),
            authorizer,
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db,
            config,
            material_api,
            allocation_api,
            order_api,
            query_api,
            ledger_log_api,
            project_repo,
            personnel_repo,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 OBRA_LEDGER_DB_PATH → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("OBRA_LEDGER_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./obra_ledger.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        let dir = data_dir.join("obra-ledger-dev");

        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("obra-ledger");

        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("obra_ledger.db");
        }
    }

    path.to_string_lossy().to_string()
}
