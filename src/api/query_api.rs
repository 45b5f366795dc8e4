// ==========================================
// 建材物料管理系统 - 查询聚合 API
// ==========================================
// 职责: 物料检索、工程进度、剩余/逾期天数
// 约定: 只读；外部进度来源失败时降级为 0
// ==========================================

use std::sync::Arc;

use tracing::warn;

use crate::api::error::{ApiError, ApiResult};
use crate::api::guard::{ensure_authorized, Action, Authorizer, Sanitizer};
use crate::config::ConfigManager;
use crate::domain::project::Project;
use crate::engine::schedule::{clamp_percentage, days_overdue, days_remaining, ProgressSource};
use crate::engine::search::{MaterialSearchEngine, SearchHit};
use crate::repository::{MaterialRepository, ProjectRepository};

pub struct QueryApi {
    material_repo: Arc<MaterialRepository>,
    project_repo: Arc<ProjectRepository>,
    progress_source: Arc<dyn ProgressSource>,
    config: Arc<ConfigManager>,
    authorizer: Arc<dyn Authorizer>,
    sanitizer: Arc<dyn Sanitizer>,
}

impl QueryApi {
    pub fn new(
        material_repo: Arc<MaterialRepository>,
        project_repo: Arc<ProjectRepository>,
        progress_source: Arc<dyn ProgressSource>,
        config: Arc<ConfigManager>,
        authorizer: Arc<dyn Authorizer>,
        sanitizer: Arc<dyn Sanitizer>,
    ) -> Self {
        Self {
            material_repo,
            project_repo,
            progress_source,
            config,
            authorizer,
            sanitizer,
        }
    }

    /// 物料检索（按得分降序，同分保持存储顺序）
    pub fn search_materials(&self, term: &str, user: &str) -> ApiResult<Vec<SearchHit>> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::MaterialRead)?;

        let term = self.sanitizer.sanitize(term);
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let limit = self.config.get_search_result_limit()?;
        let candidates = self.material_repo.list_active()?;
        Ok(MaterialSearchEngine::rank(candidates, &term, limit))
    }

    /// 工程进度百分比 [0, 100]
    pub fn project_progress(&self, project_id: i64, user: &str) -> ApiResult<f64> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::ProjectQuery)?;
        let project = self.load_project(project_id)?;

        match self.progress_source.progress(&project) {
            Ok(pct) => Ok(clamp_percentage(pct)),
            Err(e) => {
                warn!(project_id, error = %e, "工程进度获取失败，按0处理");
                Ok(0.0)
            }
        }
    }

    /// 距预计完工剩余天数（按本地当天）
    pub fn days_remaining(&self, project_id: i64, user: &str) -> ApiResult<i64> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::ProjectQuery)?;
        let project = self.load_project(project_id)?;
        Ok(days_remaining(
            project.estimated_end_date.as_deref(),
            chrono::Local::now().date_naive(),
        ))
    }

    /// 超过预计完工天数（按本地当天）
    pub fn days_overdue(&self, project_id: i64, user: &str) -> ApiResult<i64> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::ProjectQuery)?;
        let project = self.load_project(project_id)?;
        Ok(days_overdue(
            project.estimated_end_date.as_deref(),
            chrono::Local::now().date_naive(),
        ))
    }

    fn load_project(&self, project_id: i64) -> ApiResult<Project> {
        self.project_repo
            .find_by_id(project_id)?
            .ok_or_else(|| ApiError::not_found("Project", project_id))
    }
}
