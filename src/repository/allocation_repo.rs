// ==========================================
// 建材物料管理系统 - 物料占用数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 同一 (工程, 物料) 至多一条 ACTIVE 记录（部分唯一索引保证）
// ==========================================

use crate::db::{format_ts, parse_decimal_or_zero, parse_ts, Database};
use crate::domain::allocation::{AllocatedMaterial, Allocation};
use crate::domain::types::{AllocationState, MaterialKind};
use crate::repository::error::RepositoryResult;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};

const ALLOCATION_COLUMNS: &str = r#"
    id, project_id, material_id, material_kind, quantity, state, assigned_at, released_at
"#;

// ==========================================
// AllocationRepository - 占用仓储
// ==========================================
pub struct AllocationRepository {
    db: Database,
}

impl AllocationRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 id 查询占用记录
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Allocation>> {
        let conn = self.db.lock()?;
        Self::find_by_id_tx(&conn, id)
    }

    /// 按 id 查询占用记录（事务内）
    pub fn find_by_id_tx(conn: &Connection, id: i64) -> RepositoryResult<Option<Allocation>> {
        let sql = format!("SELECT {} FROM allocation WHERE id = ?1", ALLOCATION_COLUMNS);
        let allocation = conn
            .query_row(&sql, params![id], |row| Self::map_row(row))
            .optional()?;
        Ok(allocation)
    }

    /// 查询 (工程, 物料) 的占用中记录（事务内）
    pub fn find_active_tx(
        conn: &Connection,
        project_id: i64,
        material_id: i64,
    ) -> RepositoryResult<Option<Allocation>> {
        let sql = format!(
            r#"SELECT {} FROM allocation
               WHERE project_id = ?1 AND material_id = ?2 AND state = 'ACTIVE'"#,
            ALLOCATION_COLUMNS
        );
        let allocation = conn
            .query_row(&sql, params![project_id, material_id], |row| Self::map_row(row))
            .optional()?;
        Ok(allocation)
    }

    /// 查询 (工程, 物料) 的占用中记录
    pub fn find_active(
        &self,
        project_id: i64,
        material_id: i64,
    ) -> RepositoryResult<Option<Allocation>> {
        let conn = self.db.lock()?;
        Self::find_active_tx(&conn, project_id, material_id)
    }

    /// 查询 (工程, 物料) 的全部历史记录（含已释放）
    pub fn list_history(&self, project_id: i64, material_id: i64) -> RepositoryResult<Vec<Allocation>> {
        let conn = self.db.lock()?;
        let sql = format!(
            r#"SELECT {} FROM allocation
               WHERE project_id = ?1 AND material_id = ?2
               ORDER BY id ASC"#,
            ALLOCATION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![project_id, material_id], |row| Self::map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 查询工程的占用中记录
    pub fn list_active_by_project(&self, project_id: i64) -> RepositoryResult<Vec<Allocation>> {
        let conn = self.db.lock()?;
        let sql = format!(
            r#"SELECT {} FROM allocation
               WHERE project_id = ?1 AND state = 'ACTIVE'
               ORDER BY material_id ASC"#,
            ALLOCATION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![project_id], |row| Self::map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 统计物料的占用中记录数（事务内）
    pub fn count_active_for_material_tx(conn: &Connection, material_id: i64) -> RepositoryResult<i64> {
        let count = conn.query_row(
            "SELECT COUNT(*) FROM allocation WHERE material_id = ?1 AND state = 'ACTIVE' AND quantity > 0",
            params![material_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 工程占用物料 + 当前单价/库存（事务内）
    ///
    /// 按 material_id 升序，供补货缺口计算与资源汇总使用
    pub fn list_allocated_materials_tx(
        conn: &Connection,
        project_id: i64,
    ) -> RepositoryResult<Vec<AllocatedMaterial>> {
        let mut stmt = conn.prepare(
            r#"SELECT a.material_id, a.material_kind, a.quantity, m.unit_price, m.free_stock
               FROM allocation a
               JOIN material m ON m.id = a.material_id
               WHERE a.project_id = ?1 AND a.state = 'ACTIVE' AND a.quantity > 0
               ORDER BY a.material_id ASC"#,
        )?;
        let rows = stmt
            .query_map(params![project_id], |row| {
                let kind_raw: String = row.get(1)?;
                Ok(AllocatedMaterial {
                    material_id: row.get(0)?,
                    material_kind: MaterialKind::from_str(&kind_raw)
                        .unwrap_or(MaterialKind::GenericInventory),
                    allocated_quantity: row.get(2)?,
                    unit_price: parse_decimal_or_zero(&row.get::<_, String>(3)?),
                    free_stock: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 工程占用物料 + 当前单价/库存
    pub fn list_allocated_materials(&self, project_id: i64) -> RepositoryResult<Vec<AllocatedMaterial>> {
        let conn = self.db.lock()?;
        Self::list_allocated_materials_tx(&conn, project_id)
    }

    // ==========================================
    // 写入操作（事务内）
    // ==========================================

    /// 新建占用中记录，返回 id
    pub fn insert_active_tx(
        conn: &Connection,
        project_id: i64,
        material_id: i64,
        material_kind: MaterialKind,
        quantity: i64,
    ) -> RepositoryResult<i64> {
        conn.execute(
            r#"INSERT INTO allocation (project_id, material_id, material_kind, quantity, state, assigned_at)
               VALUES (?1, ?2, ?3, ?4, 'ACTIVE', ?5)"#,
            params![
                project_id,
                material_id,
                material_kind.to_db_str(),
                quantity,
                format_ts(&chrono::Local::now().naive_local()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 追加占用数量
    ///
    /// # 返回
    /// - Ok(false): 记录不是 ACTIVE，或追加后超出 i64 范围，未做修改
    pub fn increase_tx(conn: &Connection, id: i64, quantity: i64) -> RepositoryResult<bool> {
        let rows = conn.execute(
            r#"UPDATE allocation SET quantity = quantity + ?1
               WHERE id = ?2 AND state = 'ACTIVE' AND quantity <= ?3 - ?1"#,
            params![quantity, id, i64::MAX],
        )?;
        Ok(rows == 1)
    }

    /// 减少占用数量，减到 0 时转为 RELEASED
    ///
    /// # 返回
    /// - Ok(true): 更新成功
    /// - Ok(false): 记录不是 ACTIVE 或数量不足，未做修改
    pub fn decrease_tx(conn: &Connection, id: i64, quantity: i64) -> RepositoryResult<bool> {
        let rows = conn.execute(
            r#"UPDATE allocation
               SET quantity = quantity - ?1,
                   state = CASE WHEN quantity - ?1 = 0 THEN 'RELEASED' ELSE state END,
                   released_at = CASE WHEN quantity - ?1 = 0 THEN ?2 ELSE released_at END
               WHERE id = ?3 AND state = 'ACTIVE' AND quantity >= ?1"#,
            params![quantity, format_ts(&chrono::Local::now().naive_local()), id],
        )?;
        Ok(rows == 1)
    }

    /// 映射数据库行到 Allocation
    fn map_row(row: &Row) -> SqliteResult<Allocation> {
        let kind_raw: String = row.get(3)?;
        let state_raw: String = row.get(5)?;
        let assigned_raw: String = row.get(6)?;
        Ok(Allocation {
            id: row.get(0)?,
            project_id: row.get(1)?,
            material_id: row.get(2)?,
            material_kind: MaterialKind::from_str(&kind_raw).unwrap_or(MaterialKind::GenericInventory),
            quantity: row.get(4)?,
            state: AllocationState::from_str(&state_raw).unwrap_or(AllocationState::Released),
            assigned_at: parse_ts(&assigned_raw)
                .unwrap_or_else(|| chrono::Local::now().naive_local()),
            released_at: row
                .get::<_, Option<String>>(7)?
                .and_then(|s| parse_ts(&s)),
        })
    }
}
