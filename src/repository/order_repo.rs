// ==========================================
// 建材物料管理系统 - 补货单数据仓储
// ==========================================
// 红线: RECEIVED 只能由 PENDING 转入一次（条件更新保证）
// ==========================================

use crate::db::{format_ts, parse_decimal_or_zero, parse_ts, Database};
use crate::domain::order::{OrderLine, OrderWithLines, ReplenishmentOrder};
use crate::domain::types::{MaterialKind, OrderStatus};
use crate::repository::error::RepositoryResult;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use rust_decimal::Decimal;

const ORDER_COLUMNS: &str = r#"
    id, project_id, status, estimated_total, issued_at, issued_by, received_at, received_by
"#;

// ==========================================
// OrderRepository - 补货单仓储
// ==========================================
pub struct OrderRepository {
    db: Database,
}

impl OrderRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    // ==========================================
    // 写入操作（事务内）
    // ==========================================

    /// 写入补货单头（状态 PENDING），返回 id
    pub fn insert_order_tx(
        conn: &Connection,
        project_id: i64,
        estimated_total: Decimal,
        issued_by: &str,
    ) -> RepositoryResult<i64> {
        conn.execute(
            r#"INSERT INTO replenishment_order (project_id, status, estimated_total, issued_at, issued_by)
               VALUES (?1, 'PENDING', ?2, ?3, ?4)"#,
            params![
                project_id,
                estimated_total.to_string(),
                format_ts(&chrono::Local::now().naive_local()),
                issued_by,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 写入补货单明细
    pub fn insert_line_tx(conn: &Connection, line: &OrderLine) -> RepositoryResult<()> {
        conn.execute(
            r#"INSERT INTO order_line (order_id, material_id, material_kind, required_quantity, unit_price)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
            params![
                line.order_id,
                line.material_id,
                line.material_kind.to_db_str(),
                line.required_quantity,
                line.unit_price.to_string(),
            ],
        )?;
        Ok(())
    }

    /// PENDING -> RECEIVED
    ///
    /// # 返回
    /// - Ok(true): 状态已切换
    /// - Ok(false): 补货单不存在或已收货
    pub fn mark_received_tx(conn: &Connection, id: i64, received_by: &str) -> RepositoryResult<bool> {
        let rows = conn.execute(
            r#"UPDATE replenishment_order
               SET status = 'RECEIVED', received_at = ?1, received_by = ?2
               WHERE id = ?3 AND status = 'PENDING'"#,
            params![
                format_ts(&chrono::Local::now().naive_local()),
                received_by,
                id
            ],
        )?;
        Ok(rows == 1)
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 id 查询补货单头（事务内）
    pub fn find_by_id_tx(conn: &Connection, id: i64) -> RepositoryResult<Option<ReplenishmentOrder>> {
        let sql = format!("SELECT {} FROM replenishment_order WHERE id = ?1", ORDER_COLUMNS);
        let order = conn
            .query_row(&sql, params![id], |row| Self::map_row(row))
            .optional()?;
        Ok(order)
    }

    /// 查询补货单明细（事务内），按 material_id 升序
    pub fn lines_tx(conn: &Connection, order_id: i64) -> RepositoryResult<Vec<OrderLine>> {
        let mut stmt = conn.prepare(
            r#"SELECT order_id, material_id, material_kind, required_quantity, unit_price
               FROM order_line
               WHERE order_id = ?1
               ORDER BY material_id ASC"#,
        )?;
        let lines = stmt
            .query_map(params![order_id], |row| {
                let kind_raw: String = row.get(2)?;
                Ok(OrderLine {
                    order_id: row.get(0)?,
                    material_id: row.get(1)?,
                    material_kind: MaterialKind::from_str(&kind_raw)
                        .unwrap_or(MaterialKind::GenericInventory),
                    required_quantity: row.get(3)?,
                    unit_price: parse_decimal_or_zero(&row.get::<_, String>(4)?),
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(lines)
    }

    /// 查询补货单（含明细）
    pub fn find_with_lines(&self, id: i64) -> RepositoryResult<Option<OrderWithLines>> {
        let conn = self.db.lock()?;
        match Self::find_by_id_tx(&conn, id)? {
            Some(order) => {
                let lines = Self::lines_tx(&conn, id)?;
                Ok(Some(OrderWithLines { order, lines }))
            }
            None => Ok(None),
        }
    }

    /// 按条件列出补货单头，按 id 降序
    pub fn list(
        &self,
        project_id: Option<i64>,
        status: Option<OrderStatus>,
    ) -> RepositoryResult<Vec<ReplenishmentOrder>> {
        let conn = self.db.lock()?;
        let sql = format!(
            r#"SELECT {} FROM replenishment_order
               WHERE (?1 IS NULL OR project_id = ?1)
                 AND (?2 IS NULL OR status = ?2)
               ORDER BY id DESC"#,
            ORDER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let orders = stmt
            .query_map(
                params![project_id, status.map(|s| s.to_db_str())],
                |row| Self::map_row(row),
            )?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(orders)
    }

    fn map_row(row: &Row) -> SqliteResult<ReplenishmentOrder> {
        let status_raw: String = row.get(2)?;
        let issued_raw: String = row.get(4)?;
        Ok(ReplenishmentOrder {
            id: row.get(0)?,
            project_id: row.get(1)?,
            status: OrderStatus::from_str(&status_raw).unwrap_or(OrderStatus::Pending),
            estimated_total: parse_decimal_or_zero(&row.get::<_, String>(3)?),
            issued_at: parse_ts(&issued_raw).unwrap_or_else(|| chrono::Local::now().naive_local()),
            issued_by: row.get(5)?,
            received_at: row
                .get::<_, Option<String>>(6)?
                .and_then(|s| parse_ts(&s)),
            received_by: row.get(7)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Database, OrderRepository) {
        let db = Database::open_in_memory().unwrap();
        db.lock()
            .unwrap()
            .execute("INSERT INTO project (id, name) VALUES (7, 'P7')", [])
            .unwrap();
        let repo = OrderRepository::new(db.clone());
        (db, repo)
    }

    #[test]
    fn test_insert_with_lines_and_receive_once() {
        let (db, repo) = setup();
        let order_id = {
            let conn = db.lock().unwrap();
            let order_id =
                OrderRepository::insert_order_tx(&conn, 7, Decimal::new(250, 0), "ana").unwrap();
            for (material_id, qty) in [(3, 10), (1, 5)] {
                OrderRepository::insert_line_tx(
                    &conn,
                    &OrderLine {
                        order_id,
                        material_id,
                        material_kind: MaterialKind::Hardware,
                        required_quantity: qty,
                        unit_price: Decimal::new(1675, 2),
                    },
                )
                .unwrap();
            }
            assert!(OrderRepository::mark_received_tx(&conn, order_id, "beto").unwrap());
            assert!(!OrderRepository::mark_received_tx(&conn, order_id, "beto").unwrap());
            order_id
        };

        let found = repo.find_with_lines(order_id).unwrap().unwrap();
        assert!(found.order.is_received());
        assert_eq!(found.order.received_by.as_deref(), Some("beto"));
        assert_eq!(found.lines.len(), 2);
        assert_eq!(found.lines[0].material_id, 1);
        assert_eq!(found.lines[1].line_total(), Decimal::new(16750, 2));
    }

    #[test]
    fn test_list_filters() {
        let (db, repo) = setup();
        {
            let conn = db.lock().unwrap();
            let first = OrderRepository::insert_order_tx(&conn, 7, Decimal::ONE, "ana").unwrap();
            OrderRepository::insert_order_tx(&conn, 7, Decimal::ONE, "ana").unwrap();
            OrderRepository::mark_received_tx(&conn, first, "ana").unwrap();
        }

        assert_eq!(repo.list(Some(7), None).unwrap().len(), 2);
        assert_eq!(repo.list(None, Some(OrderStatus::Pending)).unwrap().len(), 1);
        assert_eq!(repo.list(Some(99), None).unwrap().len(), 0);
        assert!(repo.find_with_lines(404).unwrap().is_none());
    }
}
