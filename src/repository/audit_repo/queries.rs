use super::core::AuditRepository;
use crate::db::{page_bounds, parse_ts};
use crate::domain::ledger_log::AuditEntry;
use crate::repository::error::RepositoryResult;
use rusqlite::{params, OptionalExtension, Result as SqliteResult, Row};

const AUDIT_COLUMNS: &str = "audit_id, user, module, action, timestamp, payload_json";

impl AuditRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 audit_id 查询单条日志
    pub fn find_by_id(&self, audit_id: &str) -> RepositoryResult<Option<AuditEntry>> {
        let conn = self.db.lock()?;
        let sql = format!("SELECT {} FROM audit_log WHERE audit_id = ?1", AUDIT_COLUMNS);
        let entry = conn
            .query_row(&sql, params![audit_id], |row| Self::map_row(row))
            .optional()?;
        Ok(entry)
    }

    /// 查询指定操作人的日志（分页）
    pub fn find_by_user(
        &self,
        user: &str,
        limit: usize,
        offset: usize,
    ) -> RepositoryResult<Vec<AuditEntry>> {
        let (limit, offset) = page_bounds(limit, offset)?;
        let conn = self.db.lock()?;
        let sql = format!(
            r#"SELECT {} FROM audit_log
               WHERE user = ?1
               ORDER BY timestamp DESC, rowid DESC
               LIMIT ?2 OFFSET ?3"#,
            AUDIT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params![user, limit, offset], |row| Self::map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(entries)
    }

    /// 查询指定模块的日志（分页）
    pub fn find_by_module(
        &self,
        module: &str,
        limit: usize,
        offset: usize,
    ) -> RepositoryResult<Vec<AuditEntry>> {
        let (limit, offset) = page_bounds(limit, offset)?;
        let conn = self.db.lock()?;
        let sql = format!(
            r#"SELECT {} FROM audit_log
               WHERE module = ?1
               ORDER BY timestamp DESC, rowid DESC
               LIMIT ?2 OFFSET ?3"#,
            AUDIT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params![module, limit, offset], |row| Self::map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(entries)
    }

    /// 查询最近的日志（分页）
    pub fn find_recent_paged(&self, limit: usize, offset: usize) -> RepositoryResult<Vec<AuditEntry>> {
        let (limit, offset) = page_bounds(limit, offset)?;
        let conn = self.db.lock()?;
        let sql = format!(
            r#"SELECT {} FROM audit_log
               ORDER BY timestamp DESC, rowid DESC
               LIMIT ?1 OFFSET ?2"#,
            AUDIT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params![limit, offset], |row| Self::map_row(row))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(entries)
    }

    /// 统计指定模块的日志条数
    pub fn count_by_module(&self, module: &str) -> RepositoryResult<i64> {
        let conn = self.db.lock()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM audit_log WHERE module = ?1",
            params![module],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    fn map_row(row: &Row) -> SqliteResult<AuditEntry> {
        let ts_raw: String = row.get(4)?;
        let timestamp = parse_ts(&ts_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                format!("invalid timestamp: {}", ts_raw).into(),
            )
        })?;
        let payload_json = row
            .get::<_, Option<String>>(5)?
            .and_then(|s| serde_json::from_str(&s).ok());

        Ok(AuditEntry {
            audit_id: row.get(0)?,
            user: row.get(1)?,
            module: row.get(2)?,
            action: row.get(3)?,
            timestamp,
            payload_json,
        })
    }
}
