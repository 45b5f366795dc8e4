// ==========================================
// 建材物料管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 约定: 配置缺失或格式错误时使用默认值（记 warn）
// ==========================================

use crate::db::Database;
use crate::repository::error::RepositoryResult;
use rusqlite::{params, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;

/// 检索结果默认上限
pub const DEFAULT_SEARCH_RESULT_LIMIT: usize = 50;
/// 日志分页默认条数
pub const DEFAULT_LOG_PAGE_SIZE: usize = 100;
/// 日志分页上限
pub const MAX_LOG_PAGE_SIZE: usize = 500;
/// 自由文本最大长度（字符）
pub const DEFAULT_SANITIZE_MAX_LEN: usize = 255;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Clone)]
pub struct ConfigManager {
    db: Database,
}

impl ConfigManager {
    /// 从共享数据库句柄创建
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.db.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global 配置（UPSERT）
    pub fn set_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.db.lock()?;
        conn.execute(
            r#"INSERT INTO config_kv (scope_id, key, value, updated_at)
               VALUES ('global', ?1, ?2, datetime('now'))
               ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')"#,
            params![key, value],
        )?;
        tracing::info!(config_key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.db.lock()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(json!(config_map).to_string())
    }

    /// 读取并解析，缺失或格式错误返回默认值
    fn get_parsed_or_default<T: FromStr>(&self, key: &str, default: T) -> RepositoryResult<T> {
        match self.get_global_config_value(key)? {
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    tracing::warn!(config_key = key, raw_value = %raw, "配置格式错误，使用默认值");
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }

    // ===== 检索 =====

    /// 检索结果上限（至少 1）
    pub fn get_search_result_limit(&self) -> RepositoryResult<usize> {
        let v = self.get_parsed_or_default(config_keys::SEARCH_RESULT_LIMIT, DEFAULT_SEARCH_RESULT_LIMIT)?;
        Ok(v.max(1))
    }

    // ===== 日志 =====

    /// 日志分页条数（1..=500）
    pub fn get_log_page_size(&self) -> RepositoryResult<usize> {
        let v = self.get_parsed_or_default(config_keys::LOG_PAGE_SIZE, DEFAULT_LOG_PAGE_SIZE)?;
        Ok(v.clamp(1, MAX_LOG_PAGE_SIZE))
    }

    // ===== 输入清洗 =====

    pub fn get_sanitize_max_len(&self) -> RepositoryResult<usize> {
        let v = self.get_parsed_or_default(config_keys::SANITIZE_MAX_LEN, DEFAULT_SANITIZE_MAX_LEN)?;
        Ok(v.max(1))
    }

    // ===== 低库存提醒 =====

    pub fn is_low_stock_alert_enabled(&self) -> RepositoryResult<bool> {
        self.get_parsed_or_default(config_keys::LOW_STOCK_ALERT_ENABLED, true)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const SEARCH_RESULT_LIMIT: &str = "search_result_limit";
    pub const LOG_PAGE_SIZE: &str = "log_page_size";
    pub const SANITIZE_MAX_LEN: &str = "sanitize_max_len";
    pub const LOW_STOCK_ALERT_ENABLED: &str = "low_stock_alert_enabled";
}
