// ==========================================
// 建材物料管理系统 - 库存流水/审计日志查询 API
// ==========================================
// 红线: 只读；不提供修改/删除入口
// 分页: limit 缺省取配置 log_page_size，上限 500；offset 为跳过的条数
// ==========================================

use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::guard::{ensure_authorized, Action, Authorizer};
use crate::config::config_manager::MAX_LOG_PAGE_SIZE;
use crate::config::ConfigManager;
use crate::domain::ledger_log::{AuditEntry, MovementEntry};
use crate::repository::{AuditRepository, MovementRepository};

pub struct LedgerLogApi {
    movement_repo: Arc<MovementRepository>,
    audit_repo: Arc<AuditRepository>,
    config: Arc<ConfigManager>,
    authorizer: Arc<dyn Authorizer>,
}

impl LedgerLogApi {
    pub fn new(
        movement_repo: Arc<MovementRepository>,
        audit_repo: Arc<AuditRepository>,
        config: Arc<ConfigManager>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Self {
        Self {
            movement_repo,
            audit_repo,
            config,
            authorizer,
        }
    }

    // ==========================================
    // 库存流水
    // ==========================================

    pub fn list_movements_by_material(
        &self,
        material_id: i64,
        limit: Option<usize>,
        offset: usize,
        user: &str,
    ) -> ApiResult<Vec<MovementEntry>> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::LogRead)?;
        let limit = self.page_size(limit)?;
        Ok(self.movement_repo.list_by_material(material_id, limit, offset)?)
    }

    pub fn list_movements_by_user(
        &self,
        target_user: &str,
        limit: Option<usize>,
        offset: usize,
        user: &str,
    ) -> ApiResult<Vec<MovementEntry>> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::LogRead)?;
        let limit = self.page_size(limit)?;
        Ok(self.movement_repo.list_by_user(target_user, limit, offset)?)
    }

    pub fn list_movements_by_project(
        &self,
        project_id: i64,
        limit: Option<usize>,
        offset: usize,
        user: &str,
    ) -> ApiResult<Vec<MovementEntry>> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::LogRead)?;
        let limit = self.page_size(limit)?;
        Ok(self.movement_repo.list_by_project(project_id, limit, offset)?)
    }

    // ==========================================
    // 审计日志
    // ==========================================

    pub fn list_audit_by_user(
        &self,
        target_user: &str,
        limit: Option<usize>,
        offset: usize,
        user: &str,
    ) -> ApiResult<Vec<AuditEntry>> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::LogRead)?;
        let limit = self.page_size(limit)?;
        Ok(self.audit_repo.find_by_user(target_user, limit, offset)?)
    }

    pub fn list_audit_by_module(
        &self,
        module: &str,
        limit: Option<usize>,
        offset: usize,
        user: &str,
    ) -> ApiResult<Vec<AuditEntry>> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::LogRead)?;
        let limit = self.page_size(limit)?;
        Ok(self.audit_repo.find_by_module(module, limit, offset)?)
    }

    pub fn list_recent_audit(
        &self,
        limit: Option<usize>,
        offset: usize,
        user: &str,
    ) -> ApiResult<Vec<AuditEntry>> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::LogRead)?;
        let limit = self.page_size(limit)?;
        Ok(self.audit_repo.find_recent_paged(limit, offset)?)
    }

    fn page_size(&self, requested: Option<usize>) -> ApiResult<usize> {
        let size = match requested {
            Some(n) => n,
            None => self.config.get_log_page_size()?,
        };
        Ok(size.clamp(1, MAX_LOG_PAGE_SIZE))
    }
}
