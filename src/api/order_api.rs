// ==========================================
// 建材物料管理系统 - 补货单 API (pedido)
// ==========================================
// 职责: 按工程缺口生成补货单、收货入库、查询
// 红线: 收货全有或全无；同一补货单只入库一次
// ==========================================

use std::sync::Arc;

use serde_json::json;
use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::api::guard::{ensure_authorized, Action, Authorizer};
use crate::db::Database;
use crate::domain::ledger_log::{audit_module, AuditEntry, MovementEntry};
use crate::domain::order::{OrderLine, OrderWithLines, ReplenishmentOrder};
use crate::domain::types::{MovementKind, MovementReason, OrderStatus};
use crate::engine::ShortfallEngine;
use crate::repository::{
    AllocationRepository, AuditRepository, MaterialRepository, MovementRepository,
    OrderRepository, ProjectRepository,
};

// ==========================================
// OrderApi - 补货单 API
// ==========================================
pub struct OrderApi {
    db: Database,
    order_repo: Arc<OrderRepository>,
    authorizer: Arc<dyn Authorizer>,
}

impl OrderApi {
    pub fn new(db: Database, order_repo: Arc<OrderRepository>, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            db,
            order_repo,
            authorizer,
        }
    }

    /// 按工程缺口生成补货单
    ///
    /// # 规则
    /// - 需求 = 工程占用中数量；缺口 = max(0, 需求 - 可用库存)
    /// - 每个正缺口一行；预计总额 = Σ 缺口 × 当前单价
    /// - 不扣除已有 PENDING 补货单：缺口收货前重复生成会得到重复的补货单，
    ///   全部收货后库存按各单累加
    ///
    /// # 返回
    /// - Ok(OrderWithLines): PENDING 补货单
    /// - Err(NoShortfall): 无缺口，不生成任何记录
    /// - Err(NotFound): 工程不存在
    #[instrument(skip(self))]
    pub fn generate_order(&self, project_id: i64, user: &str) -> ApiResult<OrderWithLines> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::OrderGenerate)?;

        let result = self.db.write_transaction::<_, ApiError, _>(|tx| {
            ProjectRepository::find_by_id_tx(tx, project_id)?
                .ok_or_else(|| ApiError::not_found("Project", project_id))?;

            let allocated = AllocationRepository::list_allocated_materials_tx(tx, project_id)?;
            let shortfalls = ShortfallEngine::compute(&allocated);
            if shortfalls.is_empty() {
                return Err(ApiError::NoShortfall { project_id });
            }

            let estimated_total = ShortfallEngine::estimated_total(&shortfalls);
            let order_id = OrderRepository::insert_order_tx(tx, project_id, estimated_total, user)?;

            let mut lines = Vec::with_capacity(shortfalls.len());
            for s in &shortfalls {
                let line = OrderLine {
                    order_id,
                    material_id: s.material_id,
                    material_kind: s.material_kind,
                    required_quantity: s.shortfall,
                    unit_price: s.unit_price,
                };
                OrderRepository::insert_line_tx(tx, &line)?;
                lines.push(line);
            }

            AuditRepository::insert_tx(
                tx,
                &AuditEntry::new(
                    user,
                    audit_module::ORDERS,
                    format!("generated order #{} for project #{}", order_id, project_id),
                )
                .with_payload(&json!({
                    "order_id": order_id,
                    "project_id": project_id,
                    "estimated_total": estimated_total,
                    "lines": &shortfalls,
                })),
            )?;

            let order = OrderRepository::find_by_id_tx(tx, order_id)?
                .ok_or_else(|| ApiError::not_found("Order", order_id))?;
            Ok(OrderWithLines { order, lines })
        })?;

        info!(
            order_id = result.order.id,
            project_id,
            line_count = result.lines.len(),
            estimated_total = %result.order.estimated_total,
            "补货单已生成"
        );
        Ok(result)
    }

    /// 收货入库
    ///
    /// # 返回
    /// - Ok(OrderWithLines): RECEIVED 补货单
    /// - Err(AlreadyReceived): 已收货，未做任何修改
    /// - Err(NotFound): 补货单或明细物料不存在（整单回滚）
    /// - Err(ValidationError): 入库后库存超出上限（整单回滚）
    #[instrument(skip(self))]
    pub fn receive_order(&self, order_id: i64, user: &str) -> ApiResult<OrderWithLines> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::OrderReceive)?;

        let result = self.db.write_transaction::<_, ApiError, _>(|tx| {
            let order = OrderRepository::find_by_id_tx(tx, order_id)?
                .ok_or_else(|| ApiError::not_found("Order", order_id))?;
            if order.is_received() {
                return Err(ApiError::AlreadyReceived { order_id });
            }

            let lines = OrderRepository::lines_tx(tx, order_id)?;
            for line in &lines {
                if !MaterialRepository::add_stock_tx(tx, line.material_id, line.required_quantity)? {
                    return Err(ApiError::not_found("Material", line.material_id));
                }
                MovementRepository::record_tx(
                    tx,
                    &MovementEntry::new(
                        line.material_id,
                        MovementKind::Ingress,
                        line.required_quantity,
                        MovementReason::OrderReceipt,
                        user,
                    )
                    .with_project(order.project_id)
                    .with_order(order_id),
                )?;
            }

            if !OrderRepository::mark_received_tx(tx, order_id, user)? {
                return Err(ApiError::AlreadyReceived { order_id });
            }

            let received_units = lines
                .iter()
                .fold(0i64, |acc, l| acc.saturating_add(l.required_quantity));
            AuditRepository::insert_tx(
                tx,
                &AuditEntry::new(
                    user,
                    audit_module::ORDERS,
                    format!(
                        "received order #{} ({} lines, {} units)",
                        order_id,
                        lines.len(),
                        received_units
                    ),
                )
                .with_payload(&json!({
                    "order_id": order_id,
                    "project_id": order.project_id,
                    "lines": &lines,
                })),
            )?;

            let order = OrderRepository::find_by_id_tx(tx, order_id)?
                .ok_or_else(|| ApiError::not_found("Order", order_id))?;
            Ok(OrderWithLines { order, lines })
        })?;

        info!(order_id, line_count = result.lines.len(), "补货单已收货");
        Ok(result)
    }

    /// 查询补货单（含明细）
    pub fn get_order(&self, order_id: i64, user: &str) -> ApiResult<OrderWithLines> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::OrderRead)?;
        self.order_repo
            .find_with_lines(order_id)?
            .ok_or_else(|| ApiError::not_found("Order", order_id))
    }

    /// 按工程/状态列出补货单
    pub fn list_orders(
        &self,
        project_id: Option<i64>,
        status: Option<OrderStatus>,
        user: &str,
    ) -> ApiResult<Vec<ReplenishmentOrder>> {
        ensure_authorized(self.authorizer.as_ref(), user, Action::OrderRead)?;
        Ok(self.order_repo.list(project_id, status)?)
    }
}
