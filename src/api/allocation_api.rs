// ==========================================
// 建材物料管理系统 - 物料占用台账 API
// ==========================================
// 职责: 占用/释放物料、派驻人员、资源汇总
// 状态机: 无 → ACTIVE → RELEASED（终态），释放后再占用新建一条
// 红线: free_stock 不为负（条件扣减）；扣减/占用/流水/审计同一事务
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::guard::{ensure_authorized, Action, Authorizer, Sanitizer};
use crate::api::validator;
use crate::config::ConfigManager;
use crate::db::Database;
use crate::domain::allocation::{Allocation, ResourceSummary};
use crate::domain::ledger_log::{audit_module, AuditEntry, MovementEntry};
use crate::domain::project::PersonnelAssignment;
use crate::domain::types::{MaterialKind, MovementKind, MovementReason};
use crate::engine::ResourceEngine;
use crate::repository::{
    AllocationRepository, AuditRepository, MaterialRepository, MovementRepository,
    PersonnelRepository, ProjectRepository,
};

// ==========================================
// AllocationApi - 占用台账 API
// ==========================================
pub struct AllocationApi {
    db: Database,
    material_repo: Arc<MaterialRepository>,
    allocation_repo: Arc<AllocationRepository>,
    project_repo: Arc<ProjectRepository>,
    personnel_repo: Arc<PersonnelRepository>,
    config: Arc<ConfigManager>,
    authorizer: Arc<dyn Authorizer>,
    sanitizer: Arc<dyn Sanitizer>,
}

impl AllocationApi {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: Database,
        material_repo: Arc<MaterialRepository>,
        allocation_repo: Arc<AllocationRepository>,
        project_repo: Arc<ProjectRepository>,
        personnel_repo: Arc<PersonnelRepository>,
        config: Arc<ConfigManager>,
        authorizer: Arc<dyn Authorizer>,
        sanitizer: Arc<dyn Sanitizer>,
    ) -> Self {
        Self {
            db,
            material_repo,
            allocation_repo,
            project_repo,
            personnel_repo,
            config,
            authorizer,
            sanitizer,
        }
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 可用库存是否满足数量（只读，变更操作会在事务内重新校验）
    pub fn validate_availability(&self, material_id: i64, quantity: i64, user: &str) -> ApiResult<bool> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::AllocationRead)?;
        validator::validate_positive_quantity(quantity)?;
        let free_stock = self
            .material_repo
            .find_free_stock(material_id)?
            .ok_or_else(|| ApiError::not_found("Material", material_id))?;
        Ok(free_stock >= quantity)
    }

    /// 工程的占用中记录
    pub fn list_project_allocations(&self, project_id: i64, user: &str) -> ApiResult<Vec<Allocation>> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::AllocationRead)?;
        self.project_repo
            .find_by_id(project_id)?
            .ok_or_else(|| ApiError::not_found("Project", project_id))?;
        Ok(self.allocation_repo.list_active_by_project(project_id)?)
    }

    /// 工程资源汇总（只读）
    pub fn resource_summary(&self, project_id: i64, user: &str) -> ApiResult<ResourceSummary> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::AllocationRead)?;
        let project = self
            .project_repo
            .find_by_id(project_id)?
            .ok_or_else(|| ApiError::not_found("Project", project_id))?;

        let materials = self.allocation_repo.list_allocated_materials(project_id)?;
        let personnel = self.personnel_repo.list_assigned_personnel(project_id)?;
        let summary = ResourceEngine::summarize(&project, &materials, &personnel);

        debug!(
            project_id,
            material_count = summary.material_count,
            personnel_count = summary.personnel_count,
            "资源汇总完成"
        );
        Ok(summary)
    }

    // ==========================================
    // 占用/释放
    // ==========================================

    /// 为工程占用物料
    ///
    /// # 返回
    /// - Ok(Allocation): 占用中记录（新建或追加后）
    /// - Err(InsufficientStock): 条件扣减未命中，无任何写入
    /// - Err(NotFound): 工程/物料不存在
    /// - Err(Conflict): 物料已停用或工程已结束
    /// - Err(ValidationError): 数量非正、类别不一致或累计占用超出上限
    #[instrument(skip(self))]
    pub fn assign_material(
        &self,
        project_id: i64,
        material_id: i64,
        quantity: i64,
        kind: MaterialKind,
        user: &str,
    ) -> ApiResult<Allocation> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::AllocationAssign)?;
        validator::validate_positive_quantity(quantity)?;

        let (allocation, remaining, min_stock) = self.db.write_transaction::<_, ApiError, _>(|tx| {
            let project = ProjectRepository::find_by_id_tx(tx, project_id)?
                .ok_or_else(|| ApiError::not_found("Project", project_id))?;
            if project.status.is_closed() {
                return Err(ApiError::Conflict(format!(
                    "工程已结束，不能占用物料: project_id={}, status={}",
                    project_id, project.status
                )));
            }

            let material = MaterialRepository::find_by_id_tx(tx, material_id)?
                .ok_or_else(|| ApiError::not_found("Material", material_id))?;
            if !material.is_active() {
                return Err(ApiError::Conflict(format!(
                    "物料已停用: material_id={}",
                    material_id
                )));
            }
            if material.kind != kind {
                return Err(ApiError::ValidationError(format!(
                    "物料类别不一致: material_id={}, expected={}, given={}",
                    material_id, material.kind, kind
                )));
            }

            if !MaterialRepository::take_stock_tx(tx, material_id, quantity)? {
                return Err(ApiError::InsufficientStock {
                    material_id,
                    requested: quantity,
                    available: material.free_stock,
                });
            }

            let (allocation_id, action) =
                match AllocationRepository::find_active_tx(tx, project_id, material_id)? {
                    Some(existing) => {
                        if !AllocationRepository::increase_tx(tx, existing.id, quantity)? {
                            return Err(ApiError::ValidationError(format!(
                                "占用数量超出上限: allocation_id={}, material_id={}, allocated={}, add={}",
                                existing.id, material_id, existing.quantity, quantity
                            )));
                        }
                        (existing.id, format!("increased allocation #{}", existing.id))
                    }
                    None => {
                        let id = AllocationRepository::insert_active_tx(
                            tx,
                            project_id,
                            material_id,
                            material.kind,
                            quantity,
                        )?;
                        (id, format!("created allocation #{}", id))
                    }
                };

            MovementRepository::record_tx(
                tx,
                &MovementEntry::new(
                    material_id,
                    MovementKind::Egress,
                    quantity,
                    MovementReason::Allocation,
                    user,
                )
                .with_project(project_id),
            )?;

            AuditRepository::insert_tx(
                tx,
                &AuditEntry::new(user, audit_module::ALLOCATIONS, action).with_payload(&json!({
                    "allocation_id": allocation_id,
                    "project_id": project_id,
                    "material_id": material_id,
                    "quantity": quantity,
                })),
            )?;

            let allocation = AllocationRepository::find_by_id_tx(tx, allocation_id)?
                .ok_or_else(|| ApiError::not_found("Allocation", allocation_id))?;
            Ok((allocation, material.free_stock - quantity, material.min_stock))
        })?;

        info!(
            allocation_id = allocation.id,
            project_id,
            material_id,
            quantity,
            "物料已占用"
        );
        if remaining < min_stock && self.config.is_low_stock_alert_enabled()? {
            warn!(material_id, free_stock = remaining, min_stock, "物料低于最低库存");
        }
        Ok(allocation)
    }

    /// 释放工程占用的物料
    ///
    /// # 返回
    /// - Ok(Allocation): 释放后的记录（数量归零时为 RELEASED）
    /// - Err(NotAllocated): 无占用中记录，或释放数量超出占用数量
    /// - Err(ValidationError): 归还后库存超出上限（整体回滚）
    #[instrument(skip(self))]
    pub fn release_material(
        &self,
        project_id: i64,
        material_id: i64,
        quantity: i64,
        user: &str,
    ) -> ApiResult<Allocation> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::AllocationRelease)?;
        validator::validate_positive_quantity(quantity)?;

        let allocation = self.db.write_transaction::<_, ApiError, _>(|tx| {
            let not_allocated = |allocated: i64| ApiError::NotAllocated {
                project_id,
                material_id,
                requested: quantity,
                allocated,
            };

            let existing = AllocationRepository::find_active_tx(tx, project_id, material_id)?
                .ok_or_else(|| not_allocated(0))?;
            if existing.quantity < quantity {
                return Err(not_allocated(existing.quantity));
            }

            if !AllocationRepository::decrease_tx(tx, existing.id, quantity)? {
                return Err(not_allocated(existing.quantity));
            }
            if !MaterialRepository::add_stock_tx(tx, material_id, quantity)? {
                return Err(ApiError::not_found("Material", material_id));
            }

            MovementRepository::record_tx(
                tx,
                &MovementEntry::new(
                    material_id,
                    MovementKind::Ingress,
                    quantity,
                    MovementReason::Release,
                    user,
                )
                .with_project(project_id),
            )?;

            AuditRepository::insert_tx(
                tx,
                &AuditEntry::new(
                    user,
                    audit_module::ALLOCATIONS,
                    format!("released {} from allocation #{}", quantity, existing.id),
                )
                .with_payload(&json!({
                    "allocation_id": existing.id,
                    "project_id": project_id,
                    "material_id": material_id,
                    "quantity": quantity,
                })),
            )?;

            AllocationRepository::find_by_id_tx(tx, existing.id)?
                .ok_or_else(|| ApiError::not_found("Allocation", existing.id))
        })?;

        info!(
            allocation_id = allocation.id,
            state = %allocation.state,
            quantity,
            "物料已释放"
        );
        Ok(allocation)
    }

    // ==========================================
    // 人员派驻
    // ==========================================

    /// 派驻人员到工程（无库存影响）
    #[instrument(skip(self))]
    pub fn assign_personnel(
        &self,
        project_id: i64,
        person_id: i64,
        role: &str,
        start_date: NaiveDate,
        user: &str,
    ) -> ApiResult<PersonnelAssignment> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::PersonnelAssign)?;
        let role = self.sanitizer.sanitize(role);
        validator::require_text("岗位", &role)?;

        self.db.write_transaction(|tx| {
            ProjectRepository::find_by_id_tx(tx, project_id)?
                .ok_or_else(|| ApiError::not_found("Project", project_id))?;
            PersonnelRepository::find_person_tx(tx, person_id)?
                .ok_or_else(|| ApiError::not_found("Personnel", person_id))?;

            if PersonnelRepository::assignment_exists_tx(tx, project_id, person_id)? {
                return Err(ApiError::Conflict(format!(
                    "人员已派驻到该工程: project_id={}, person_id={}",
                    project_id, person_id
                )));
            }

            let id = PersonnelRepository::insert_assignment_tx(tx, project_id, person_id, &role, start_date)?;
            AuditRepository::insert_tx(
                tx,
                &AuditEntry::new(
                    user,
                    audit_module::PERSONNEL,
                    format!("assigned person #{} to project #{} as {}", person_id, project_id, role),
                ),
            )?;

            Ok(PersonnelAssignment {
                id,
                project_id,
                person_id,
                role: role.clone(),
                start_date,
                assigned_at: chrono::Local::now().naive_local(),
            })
        })
    }
}
