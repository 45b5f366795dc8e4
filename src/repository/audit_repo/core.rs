use crate::db::{format_ts, Database};
use crate::domain::ledger_log::AuditEntry;
use crate::repository::error::RepositoryResult;
use rusqlite::{params, Connection};

// ==========================================
// AuditRepository - 审计日志仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
pub struct AuditRepository {
    pub(super) db: Database,
}

impl AuditRepository {
    /// 创建新的审计日志仓储
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入审计日志（事务内）
    ///
    /// # 参数
    /// - `conn`: 当前事务连接
    /// - `entry`: 审计日志实体
    ///
    /// # 返回
    /// - `Ok(audit_id)`: 成功插入
    /// - `Err(...)`: 数据库错误（调用方事务随之回滚）
    pub fn insert_tx(conn: &Connection, entry: &AuditEntry) -> RepositoryResult<String> {
        conn.execute(
            r#"
            INSERT INTO audit_log (audit_id, user, module, action, timestamp, payload_json)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                entry.audit_id,
                entry.user,
                entry.module,
                entry.action,
                format_ts(&entry.timestamp),
                entry.payload_json.as_ref().map(|v| v.to_string()),
            ],
        )?;

        Ok(entry.audit_id.clone())
    }

    /// 插入审计日志（独立写入）
    pub fn insert(&self, entry: &AuditEntry) -> RepositoryResult<String> {
        let conn = self.db.lock()?;
        Self::insert_tx(&conn, entry)
    }
}
