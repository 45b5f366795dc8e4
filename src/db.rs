// ==========================================
// 建材物料管理系统 - SQLite 连接与事务
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键/busy_timeout）
// - 统一写事务入口：IMMEDIATE 事务，出错自动回滚
// - 建表语句集中维护（幂等）
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 时间戳存储格式
pub const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 日期存储格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置，超时后整个事务回滚
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 建表（幂等）
///
/// 说明：
/// - stock_movement / audit_log 通过触发器禁止 UPDATE/DELETE（只追加）
/// - allocation 上对 ACTIVE 行建部分唯一索引：同一 (工程, 物料) 至多一条占用中记录
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS material (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            kind TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            supplier TEXT,
            unit TEXT,
            thickness_mm REAL,
            unit_price TEXT NOT NULL,
            free_stock INTEGER NOT NULL DEFAULT 0 CHECK (free_stock >= 0),
            min_stock INTEGER NOT NULL DEFAULT 0 CHECK (min_stock >= 0),
            status TEXT NOT NULL DEFAULT 'ACTIVE',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS project (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'PLANNING',
            start_date TEXT,
            estimated_end_date TEXT,
            budget TEXT NOT NULL DEFAULT '0'
        );

        CREATE TABLE IF NOT EXISTS personnel (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            daily_cost TEXT NOT NULL DEFAULT '0',
            active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS personnel_assignment (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id INTEGER NOT NULL REFERENCES project(id),
            person_id INTEGER NOT NULL REFERENCES personnel(id),
            role TEXT NOT NULL,
            start_date TEXT NOT NULL,
            assigned_at TEXT NOT NULL,
            UNIQUE (project_id, person_id)
        );

        CREATE TABLE IF NOT EXISTS allocation (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id INTEGER NOT NULL REFERENCES project(id),
            material_id INTEGER NOT NULL REFERENCES material(id),
            material_kind TEXT NOT NULL,
            quantity INTEGER NOT NULL CHECK (quantity >= 0),
            state TEXT NOT NULL DEFAULT 'ACTIVE',
            assigned_at TEXT NOT NULL,
            released_at TEXT
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_allocation_active_pair
            ON allocation (project_id, material_id) WHERE state = 'ACTIVE';

        CREATE TABLE IF NOT EXISTS replenishment_order (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            project_id INTEGER NOT NULL REFERENCES project(id),
            status TEXT NOT NULL DEFAULT 'PENDING',
            estimated_total TEXT NOT NULL,
            issued_at TEXT NOT NULL,
            issued_by TEXT NOT NULL,
            received_at TEXT,
            received_by TEXT
        );

        CREATE TABLE IF NOT EXISTS order_line (
            order_id INTEGER NOT NULL REFERENCES replenishment_order(id),
            material_id INTEGER NOT NULL,
            material_kind TEXT NOT NULL,
            required_quantity INTEGER NOT NULL CHECK (required_quantity > 0),
            unit_price TEXT NOT NULL,
            PRIMARY KEY (order_id, material_id)
        );

        CREATE TABLE IF NOT EXISTS stock_movement (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            material_id INTEGER NOT NULL,
            kind TEXT NOT NULL,
            quantity INTEGER NOT NULL CHECK (quantity > 0),
            reason TEXT NOT NULL,
            project_id INTEGER,
            order_id INTEGER,
            user TEXT NOT NULL,
            timestamp TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_stock_movement_material ON stock_movement (material_id);
        CREATE INDEX IF NOT EXISTS idx_stock_movement_user ON stock_movement (user);

        CREATE TABLE IF NOT EXISTS audit_log (
            audit_id TEXT PRIMARY KEY,
            user TEXT NOT NULL,
            module TEXT NOT NULL,
            action TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            payload_json TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_audit_log_user ON audit_log (user);
        CREATE INDEX IF NOT EXISTS idx_audit_log_module ON audit_log (module);

        CREATE TRIGGER IF NOT EXISTS trg_stock_movement_no_update
            BEFORE UPDATE ON stock_movement
            BEGIN SELECT RAISE(ABORT, 'stock_movement is append-only'); END;
        CREATE TRIGGER IF NOT EXISTS trg_stock_movement_no_delete
            BEFORE DELETE ON stock_movement
            BEGIN SELECT RAISE(ABORT, 'stock_movement is append-only'); END;
        CREATE TRIGGER IF NOT EXISTS trg_audit_log_no_update
            BEFORE UPDATE ON audit_log
            BEGIN SELECT RAISE(ABORT, 'audit_log is append-only'); END;
        CREATE TRIGGER IF NOT EXISTS trg_audit_log_no_delete
            BEFORE DELETE ON audit_log
            BEGIN SELECT RAISE(ABORT, 'audit_log is append-only'); END;
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

// ==========================================
// Database - 共享连接句柄
// ==========================================
// 所有仓储/服务通过构造参数注入同一个 Database，不使用全局单例
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// 打开数据库文件并确保表结构存在
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_schema(&conn)?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    /// 内存库（测试用）
    pub fn open_in_memory() -> RepositoryResult<Self> {
        let conn = Connection::open_in_memory()?;
        configure_sqlite_connection(&conn)?;
        ensure_schema(&conn)?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    /// 从已有连接创建
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 底层共享连接
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }

    /// 获取数据库连接
    pub fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 在单个写事务中执行闭包
    ///
    /// # 说明
    /// - 使用 IMMEDIATE 事务：开始即持有写锁，同一物料的变更串行化
    /// - 闭包返回 Err 时事务随 drop 回滚，不会留下部分库存变更
    pub fn write_transaction<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let value = f(&tx)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(value)
    }
}

// ==========================================
// 存储格式辅助函数
// ==========================================

pub fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

pub fn parse_ts(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TS_FORMAT).ok()
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok()
}

/// 分页参数转为 SQL 的 LIMIT/OFFSET（超出 i64 范围视为非法输入）
pub fn page_bounds(limit: usize, offset: usize) -> RepositoryResult<(i64, i64)> {
    let to_sql = |name: &str, value: usize| {
        i64::try_from(value).map_err(|_| {
            RepositoryError::ValidationError(format!("分页参数超出范围: {}={}", name, value))
        })
    };
    Ok((to_sql("limit", limit)?, to_sql("offset", offset)?))
}

/// 解析 TEXT 存储的金额，格式错误时记为 0
pub fn parse_decimal_or_zero(s: &str) -> Decimal {
    match Decimal::from_str(s.trim()) {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!(value = %s, error = %e, "金额字段格式错误，按0处理");
            Decimal::ZERO
        }
    }
}
