// ==========================================
// 建材物料管理系统 - 物料目录 API
// ==========================================
// 职责: 物料查询、新建、库存/单价/阈值修正、停用
// 红线: 先鉴权再读写；每个写操作与审计日志同一事务
// ==========================================

use std::sync::Arc;

use serde_json::json;
use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::api::guard::{ensure_authorized, Action, Authorizer, Sanitizer};
use crate::api::validator;
use crate::db::Database;
use crate::domain::ledger_log::{audit_module, AuditEntry, MovementEntry};
use crate::domain::material::{Material, NewMaterial};
use crate::domain::types::{MaterialStatus, MovementKind, MovementReason};
use crate::repository::{
    AllocationRepository, AuditRepository, MaterialRepository, MovementRepository, RepositoryError,
};
use rusqlite::Connection;

// ==========================================
// MaterialApi - 物料目录 API
// ==========================================
pub struct MaterialApi {
    db: Database,
    material_repo: Arc<MaterialRepository>,
    authorizer: Arc<dyn Authorizer>,
    sanitizer: Arc<dyn Sanitizer>,
}

impl MaterialApi {
    pub fn new(
        db: Database,
        material_repo: Arc<MaterialRepository>,
        authorizer: Arc<dyn Authorizer>,
        sanitizer: Arc<dyn Sanitizer>,
    ) -> Self {
        Self {
            db,
            material_repo,
            authorizer,
            sanitizer,
        }
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 按 id 查询物料
    pub fn get_material(&self, material_id: i64, user: &str) -> ApiResult<Material> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::MaterialRead)?;
        self.material_repo
            .find_by_id(material_id)?
            .ok_or_else(|| ApiError::not_found("Material", material_id))
    }

    /// 分页查询物料
    pub fn list_materials(
        &self,
        include_inactive: bool,
        limit: i64,
        offset: i64,
        user: &str,
    ) -> ApiResult<Vec<Material>> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::MaterialRead)?;
        if limit <= 0 || offset < 0 {
            return Err(ApiError::ValidationError(format!(
                "分页参数无效: limit={}, offset={}",
                limit, offset
            )));
        }
        Ok(self.material_repo.list(include_inactive, limit, offset)?)
    }

    /// 查询低于最低库存的物料
    pub fn list_low_stock(&self, user: &str) -> ApiResult<Vec<Material>> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::MaterialRead)?;
        Ok(self.material_repo.list_below_min_stock()?)
    }

    // ==========================================
    // 写入接口
    // ==========================================

    /// 新建物料
    ///
    /// # 返回
    /// - Ok(Material): 新建后的物料
    /// - Err(ValidationError): 字段不合规（按类别规则表）
    /// - Err(Conflict): 编码重复
    #[instrument(skip(self, data), fields(code = %data.code, kind = %data.kind))]
    pub fn create_material(&self, data: NewMaterial, user: &str) -> ApiResult<Material> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::MaterialCreate)?;

        let data = self.sanitize_new_material(data);
        validator::validate_new_material(&data)?;

        let material = self.db.write_transaction::<_, ApiError, _>(|tx| {
            let id = MaterialRepository::insert_tx(tx, &data).map_err(|e| match e {
                RepositoryError::UniqueConstraintViolation(_) => {
                    ApiError::Conflict(format!("物料编码已存在: {}", data.code))
                }
                other => other.into(),
            })?;

            if data.initial_stock > 0 {
                MovementRepository::record_tx(
                    tx,
                    &MovementEntry::new(
                        id,
                        MovementKind::Ingress,
                        data.initial_stock,
                        MovementReason::Adjustment,
                        user,
                    ),
                )?;
            }

            AuditRepository::insert_tx(
                tx,
                &AuditEntry::new(
                    user,
                    audit_module::MATERIALS,
                    format!("created material #{} ({})", id, data.code),
                )
                .with_payload(&json!({
                    "material_id": id,
                    "code": data.code,
                    "kind": data.kind,
                    "unit_price": data.unit_price,
                    "initial_stock": data.initial_stock,
                })),
            )?;

            Self::load_tx(tx, id)
        })?;

        info!(material_id = material.id, "物料已新建");
        Ok(material)
    }

    /// 人工修正可用库存
    ///
    /// 差值非零时写一条 Adjustment 流水（方向按差值符号）
    #[instrument(skip(self))]
    pub fn update_stock(&self, material_id: i64, new_free_stock: i64, user: &str) -> ApiResult<Material> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::MaterialUpdateStock)?;
        validator::validate_non_negative("可用库存", new_free_stock)?;

        self.db.write_transaction(|tx| {
            let current = Self::load_tx(tx, material_id)?;
            let delta = new_free_stock - current.free_stock;

            if delta != 0 {
                MaterialRepository::set_stock_tx(tx, material_id, new_free_stock)?;
                let kind = if delta > 0 {
                    MovementKind::Ingress
                } else {
                    MovementKind::Egress
                };
                MovementRepository::record_tx(
                    tx,
                    &MovementEntry::new(material_id, kind, delta.abs(), MovementReason::Adjustment, user),
                )?;
            }

            AuditRepository::insert_tx(
                tx,
                &AuditEntry::new(
                    user,
                    audit_module::MATERIALS,
                    format!(
                        "adjusted stock of material #{} from {} to {}",
                        material_id, current.free_stock, new_free_stock
                    ),
                )
                .with_payload(&json!({
                    "material_id": material_id,
                    "old_free_stock": current.free_stock,
                    "new_free_stock": new_free_stock,
                })),
            )?;

            Self::load_tx(tx, material_id)
        })
    }

    /// 更新单价（必须 > 0）
    #[instrument(skip(self))]
    pub fn update_price(
        &self,
        material_id: i64,
        new_price: rust_decimal::Decimal,
        user: &str,
    ) -> ApiResult<Material> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::MaterialUpdatePrice)?;
        validator::validate_price(new_price)?;

        self.db.write_transaction(|tx| {
            let current = Self::load_tx(tx, material_id)?;
            MaterialRepository::update_price_tx(tx, material_id, new_price)?;
            AuditRepository::insert_tx(
                tx,
                &AuditEntry::new(
                    user,
                    audit_module::MATERIALS,
                    format!(
                        "changed price of material #{} from {} to {}",
                        material_id, current.unit_price, new_price
                    ),
                ),
            )?;
            Self::load_tx(tx, material_id)
        })
    }

    /// 更新最低库存阈值（≥ 0）
    pub fn update_min_stock(&self, material_id: i64, min_stock: i64, user: &str) -> ApiResult<Material> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::MaterialUpdateMinStock)?;
        validator::validate_non_negative("最低库存", min_stock)?;

        self.db.write_transaction(|tx| {
            Self::load_tx(tx, material_id)?;
            MaterialRepository::update_min_stock_tx(tx, material_id, min_stock)?;
            AuditRepository::insert_tx(
                tx,
                &AuditEntry::new(
                    user,
                    audit_module::MATERIALS,
                    format!("set min stock of material #{} to {}", material_id, min_stock),
                ),
            )?;
            Self::load_tx(tx, material_id)
        })
    }

    /// 停用物料（软删除）
    ///
    /// # 规则
    /// - 仍有占用中的记录 → Conflict
    /// - 已停用 → 直接返回（不重复记审计）
    #[instrument(skip(self))]
    pub fn deactivate(&self, material_id: i64, user: &str) -> ApiResult<Material> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::MaterialDeactivate)?;

        self.db.write_transaction(|tx| {
            let current = Self::load_tx(tx, material_id)?;
            if !current.is_active() {
                return Ok(current);
            }

            let active = AllocationRepository::count_active_for_material_tx(tx, material_id)?;
            if active > 0 {
                return Err(ApiError::Conflict(format!(
                    "物料仍被占用，不能停用: material_id={}, active_allocations={}",
                    material_id, active
                )));
            }

            MaterialRepository::set_status_tx(tx, material_id, MaterialStatus::Deactivated)?;
            AuditRepository::insert_tx(
                tx,
                &AuditEntry::new(
                    user,
                    audit_module::MATERIALS,
                    format!("deactivated material #{}", material_id),
                ),
            )?;
            info!(material_id, "物料已停用");
            Self::load_tx(tx, material_id)
        })
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    fn load_tx(conn: &Connection, material_id: i64) -> ApiResult<Material> {
        MaterialRepository::find_by_id_tx(conn, material_id)?
            .ok_or_else(|| ApiError::not_found("Material", material_id))
    }

    fn sanitize_new_material(&self, data: NewMaterial) -> NewMaterial {
        let clean_opt = |v: Option<String>| {
            v.map(|s| self.sanitizer.sanitize(&s))
                .filter(|s| !s.is_empty())
        };
        NewMaterial {
            code: self.sanitizer.sanitize(&data.code),
            description: self.sanitizer.sanitize(&data.description),
            supplier: clean_opt(data.supplier),
            unit: clean_opt(data.unit),
            ..data
        }
    }
}
