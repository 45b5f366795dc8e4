// ==========================================
// 建材物料管理系统 - 库存流水数据仓储
// ==========================================
// 红线: 只追加（表上触发器禁止 UPDATE/DELETE）
// ==========================================

use crate::db::{format_ts, page_bounds, parse_ts, Database};
use crate::domain::ledger_log::MovementEntry;
use crate::domain::types::{MovementKind, MovementReason};
use crate::repository::error::RepositoryResult;
use rusqlite::{params, Connection, Result as SqliteResult, Row};

const MOVEMENT_COLUMNS: &str = r#"
    id, material_id, kind, quantity, reason, project_id, order_id, user, timestamp
"#;

// ==========================================
// MovementRepository - 库存流水仓储
// ==========================================
pub struct MovementRepository {
    db: Database,
}

impl MovementRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 追加一条库存流水（事务内），返回 id
    pub fn record_tx(conn: &Connection, entry: &MovementEntry) -> RepositoryResult<i64> {
        conn.execute(
            r#"INSERT INTO stock_movement
               (material_id, kind, quantity, reason, project_id, order_id, user, timestamp)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
            params![
                entry.material_id,
                entry.kind.to_db_str(),
                entry.quantity,
                entry.reason.to_db_str(),
                entry.project_id,
                entry.order_id,
                entry.user,
                format_ts(&entry.timestamp),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按物料分页查询，最新在前
    pub fn list_by_material(
        &self,
        material_id: i64,
        limit: usize,
        offset: usize,
    ) -> RepositoryResult<Vec<MovementEntry>> {
        self.query_where("material_id = ?1", rusqlite::types::Value::Integer(material_id), limit, offset)
    }

    /// 按操作人分页查询，最新在前
    pub fn list_by_user(
        &self,
        user: &str,
        limit: usize,
        offset: usize,
    ) -> RepositoryResult<Vec<MovementEntry>> {
        self.query_where("user = ?1", rusqlite::types::Value::Text(user.to_string()), limit, offset)
    }

    /// 按工程分页查询，最新在前
    pub fn list_by_project(
        &self,
        project_id: i64,
        limit: usize,
        offset: usize,
    ) -> RepositoryResult<Vec<MovementEntry>> {
        self.query_where("project_id = ?1", rusqlite::types::Value::Integer(project_id), limit, offset)
    }

    /// 物料流水条数
    pub fn count_by_material(&self, material_id: i64) -> RepositoryResult<i64> {
        let conn = self.db.lock()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM stock_movement WHERE material_id = ?1",
            params![material_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn query_where(
        &self,
        predicate: &str,
        value: rusqlite::types::Value,
        limit: usize,
        offset: usize,
    ) -> RepositoryResult<Vec<MovementEntry>> {
        let (limit, offset) = page_bounds(limit, offset)?;
        let conn = self.db.lock()?;
        let sql = format!(
            "SELECT {} FROM stock_movement WHERE {} ORDER BY id DESC LIMIT ?2 OFFSET ?3",
            MOVEMENT_COLUMNS, predicate
        );
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params![value, limit, offset], |row| Self::map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(entries)
    }

    fn map_row(row: &Row) -> SqliteResult<MovementEntry> {
        let kind_raw: String = row.get(2)?;
        let reason_raw: String = row.get(4)?;
        let ts_raw: String = row.get(8)?;
        Ok(MovementEntry {
            id: Some(row.get(0)?),
            material_id: row.get(1)?,
            kind: MovementKind::from_str(&kind_raw).unwrap_or(MovementKind::Egress),
            quantity: row.get(3)?,
            reason: MovementReason::from_str(&reason_raw).unwrap_or(MovementReason::Adjustment),
            project_id: row.get(5)?,
            order_id: row.get(6)?,
            user: row.get(7)?,
            timestamp: parse_ts(&ts_raw).unwrap_or_else(|| chrono::Local::now().naive_local()),
        })
    }
}
