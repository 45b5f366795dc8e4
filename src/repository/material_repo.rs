// ==========================================
// 建材物料管理系统 - 物料数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// 约定: `*_tx` 方法接收调用方事务中的连接，用于跨表原子操作
// ==========================================

use crate::db::{format_ts, parse_decimal_or_zero, parse_ts, Database};
use crate::domain::material::{Material, NewMaterial};
use crate::domain::types::{MaterialKind, MaterialStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use rust_decimal::Decimal;

const MATERIAL_COLUMNS: &str = r#"
    id, code, kind, description, supplier, unit, thickness_mm,
    unit_price, free_stock, min_stock, status, created_at, updated_at
"#;

// ==========================================
// MaterialRepository - 物料仓储
// ==========================================
/// 物料仓储
/// 职责: 管理 material 表的读写，库存扣减为条件更新
pub struct MaterialRepository {
    db: Database,
}

impl MaterialRepository {
    /// 创建新的 MaterialRepository 实例
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 id 查询物料
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Material>> {
        let conn = self.db.lock()?;
        Self::find_by_id_tx(&conn, id)
    }

    /// 按 id 查询物料（事务内）
    pub fn find_by_id_tx(conn: &Connection, id: i64) -> RepositoryResult<Option<Material>> {
        let sql = format!("SELECT {} FROM material WHERE id = ?1", MATERIAL_COLUMNS);
        let material = conn
            .query_row(&sql, params![id], |row| Self::map_row(row))
            .optional()?;
        Ok(material)
    }

    /// 按编码查询物料
    pub fn find_by_code(&self, code: &str) -> RepositoryResult<Option<Material>> {
        let conn = self.db.lock()?;
        let sql = format!("SELECT {} FROM material WHERE code = ?1", MATERIAL_COLUMNS);
        let material = conn
            .query_row(&sql, params![code], |row| Self::map_row(row))
            .optional()?;
        Ok(material)
    }

    /// 查询可用库存（物料不存在时返回 None）
    pub fn find_free_stock(&self, id: i64) -> RepositoryResult<Option<i64>> {
        let conn = self.db.lock()?;
        Self::find_free_stock_tx(&conn, id)
    }

    /// 查询可用库存（事务内）
    pub fn find_free_stock_tx(conn: &Connection, id: i64) -> RepositoryResult<Option<i64>> {
        let stock = conn
            .query_row(
                "SELECT free_stock FROM material WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(stock)
    }

    /// 分页查询物料（按 id 升序，即存储顺序）
    pub fn list(
        &self,
        include_inactive: bool,
        limit: i64,
        offset: i64,
    ) -> RepositoryResult<Vec<Material>> {
        let conn = self.db.lock()?;
        let sql = format!(
            r#"SELECT {} FROM material
               WHERE (?1 = 1 OR status = 'ACTIVE')
               ORDER BY id ASC
               LIMIT ?2 OFFSET ?3"#,
            MATERIAL_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let materials = stmt
            .query_map(params![include_inactive as i32, limit, offset], |row| {
                Self::map_row(row)
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(materials)
    }

    /// 查询全部启用物料（按存储顺序，检索候选集）
    pub fn list_active(&self) -> RepositoryResult<Vec<Material>> {
        let conn = self.db.lock()?;
        let sql = format!(
            "SELECT {} FROM material WHERE status = 'ACTIVE' ORDER BY id ASC",
            MATERIAL_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let materials = stmt
            .query_map([], |row| Self::map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(materials)
    }

    /// 查询低于最低库存的启用物料
    pub fn list_below_min_stock(&self) -> RepositoryResult<Vec<Material>> {
        let conn = self.db.lock()?;
        let sql = format!(
            r#"SELECT {} FROM material
               WHERE status = 'ACTIVE' AND free_stock < min_stock
               ORDER BY (min_stock - free_stock) DESC, id ASC"#,
            MATERIAL_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let materials = stmt
            .query_map([], |row| Self::map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(materials)
    }

    // ==========================================
    // 写入操作（事务内）
    // ==========================================

    /// 插入物料，返回新 id
    pub fn insert_tx(conn: &Connection, material: &NewMaterial) -> RepositoryResult<i64> {
        let now = format_ts(&chrono::Local::now().naive_local());
        conn.execute(
            r#"
            INSERT INTO material (
                code, kind, description, supplier, unit, thickness_mm,
                unit_price, free_stock, min_stock, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'ACTIVE', ?10, ?10)
            "#,
            params![
                material.code,
                material.kind.to_db_str(),
                material.description,
                material.supplier,
                material.unit,
                material.thickness_mm,
                material.unit_price.to_string(),
                material.initial_stock,
                material.min_stock,
                now,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 条件扣减库存
    ///
    /// # 返回
    /// - Ok(true): 扣减成功
    /// - Ok(false): 库存不足（或物料不存在），未做任何修改
    ///
    /// # 说明
    /// 检查与扣减在同一条 UPDATE 中完成，不存在先查后改的竞态
    pub fn take_stock_tx(conn: &Connection, id: i64, quantity: i64) -> RepositoryResult<bool> {
        let rows = conn.execute(
            r#"UPDATE material
               SET free_stock = free_stock - ?1, updated_at = ?2
               WHERE id = ?3 AND free_stock >= ?1"#,
            params![quantity, format_ts(&chrono::Local::now().naive_local()), id],
        )?;
        Ok(rows == 1)
    }

    /// 增加库存
    ///
    /// # 返回
    /// - Ok(true): 增加成功
    /// - Ok(false): 物料不存在
    /// - Err(ValidationError): 增加后超出 i64 范围，未做修改
    ///
    /// # 说明
    /// SQLite 整数溢出会转为 REAL，之后该行无法按 INTEGER 读取，
    /// 因此上限检查放在 UPDATE 的 WHERE 中
    pub fn add_stock_tx(conn: &Connection, id: i64, quantity: i64) -> RepositoryResult<bool> {
        let rows = conn.execute(
            r#"UPDATE material
               SET free_stock = free_stock + ?1, updated_at = ?2
               WHERE id = ?3 AND free_stock <= ?4 - ?1"#,
            params![
                quantity,
                format_ts(&chrono::Local::now().naive_local()),
                id,
                i64::MAX
            ],
        )?;
        if rows == 1 {
            return Ok(true);
        }
        match Self::find_free_stock_tx(conn, id)? {
            None => Ok(false),
            Some(free_stock) => Err(RepositoryError::ValidationError(format!(
                "库存超出上限: material_id={}, free_stock={}, add={}",
                id, free_stock, quantity
            ))),
        }
    }

    /// 直接设置库存（人工修正）
    pub fn set_stock_tx(conn: &Connection, id: i64, free_stock: i64) -> RepositoryResult<bool> {
        let rows = conn.execute(
            "UPDATE material SET free_stock = ?1, updated_at = ?2 WHERE id = ?3",
            params![free_stock, format_ts(&chrono::Local::now().naive_local()), id],
        )?;
        Ok(rows == 1)
    }

    /// 更新单价
    pub fn update_price_tx(conn: &Connection, id: i64, price: Decimal) -> RepositoryResult<bool> {
        let rows = conn.execute(
            "UPDATE material SET unit_price = ?1, updated_at = ?2 WHERE id = ?3",
            params![price.to_string(), format_ts(&chrono::Local::now().naive_local()), id],
        )?;
        Ok(rows == 1)
    }

    /// 更新最低库存阈值
    pub fn update_min_stock_tx(conn: &Connection, id: i64, min_stock: i64) -> RepositoryResult<bool> {
        let rows = conn.execute(
            "UPDATE material SET min_stock = ?1, updated_at = ?2 WHERE id = ?3",
            params![min_stock, format_ts(&chrono::Local::now().naive_local()), id],
        )?;
        Ok(rows == 1)
    }

    /// 更新启用状态
    pub fn set_status_tx(
        conn: &Connection,
        id: i64,
        status: MaterialStatus,
    ) -> RepositoryResult<bool> {
        let rows = conn.execute(
            "UPDATE material SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![
                status.to_db_str(),
                format_ts(&chrono::Local::now().naive_local()),
                id
            ],
        )?;
        Ok(rows == 1)
    }

    /// 映射数据库行到 Material
    fn map_row(row: &Row) -> SqliteResult<Material> {
        let kind_raw: String = row.get(2)?;
        let status_raw: String = row.get(10)?;
        let created_raw: String = row.get(11)?;
        let updated_raw: String = row.get(12)?;
        let now = chrono::Local::now().naive_local();

        Ok(Material {
            id: row.get(0)?,
            code: row.get(1)?,
            kind: MaterialKind::from_str(&kind_raw).unwrap_or(MaterialKind::GenericInventory),
            description: row.get(3)?,
            supplier: row.get(4)?,
            unit: row.get(5)?,
            thickness_mm: row.get(6)?,
            unit_price: parse_decimal_or_zero(&row.get::<_, String>(7)?),
            free_stock: row.get(8)?,
            min_stock: row.get(9)?,
            status: MaterialStatus::from_str(&status_raw).unwrap_or(MaterialStatus::Active),
            created_at: parse_ts(&created_raw).unwrap_or(now),
            updated_at: parse_ts(&updated_raw).unwrap_or(now),
        })
    }
}
