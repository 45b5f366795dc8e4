// ==========================================
// 建材物料管理系统 - 工程/人员数据仓储
// ==========================================
// 说明: 工程主数据归属外部工程模块，这里只提供占用台账所需的读取
//       以及初始化/测试用的最小写入
// ==========================================

use crate::db::{format_date, format_ts, parse_date, parse_decimal_or_zero, parse_ts, Database};
use crate::domain::project::{
    AssignedPersonnel, NewProject, Personnel, PersonnelAssignment, Project,
};
use crate::domain::types::ProjectStatus;
use crate::repository::error::RepositoryResult;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use rust_decimal::Decimal;

// ==========================================
// ProjectRepository - 工程仓储
// ==========================================
pub struct ProjectRepository {
    db: Database,
}

impl ProjectRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 新建工程，返回 id
    pub fn insert(&self, project: &NewProject) -> RepositoryResult<i64> {
        let conn = self.db.lock()?;
        conn.execute(
            r#"INSERT INTO project (name, status, start_date, estimated_end_date, budget)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
            params![
                project.name,
                project.status.to_db_str(),
                project.start_date.as_ref().map(format_date),
                project.estimated_end_date,
                project.budget.to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 更新工程状态
    pub fn update_status(&self, id: i64, status: ProjectStatus) -> RepositoryResult<bool> {
        let conn = self.db.lock()?;
        let rows = conn.execute(
            "UPDATE project SET status = ?1 WHERE id = ?2",
            params![status.to_db_str(), id],
        )?;
        Ok(rows == 1)
    }

    /// 按 id 查询工程
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Project>> {
        let conn = self.db.lock()?;
        Self::find_by_id_tx(&conn, id)
    }

    /// 按 id 查询工程（事务内）
    pub fn find_by_id_tx(conn: &Connection, id: i64) -> RepositoryResult<Option<Project>> {
        let project = conn
            .query_row(
                r#"SELECT id, name, status, start_date, estimated_end_date, budget
                   FROM project WHERE id = ?1"#,
                params![id],
                |row| Self::map_row(row),
            )
            .optional()?;
        Ok(project)
    }

    fn map_row(row: &Row) -> SqliteResult<Project> {
        let status_raw: String = row.get(2)?;
        Ok(Project {
            id: row.get(0)?,
            name: row.get(1)?,
            status: ProjectStatus::from_str(&status_raw),
            start_date: row
                .get::<_, Option<String>>(3)?
                .and_then(|s| parse_date(&s)),
            estimated_end_date: row.get(4)?,
            budget: parse_decimal_or_zero(&row.get::<_, String>(5)?),
        })
    }
}

// ==========================================
// PersonnelRepository - 人员与派驻仓储
// ==========================================
pub struct PersonnelRepository {
    db: Database,
}

impl PersonnelRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// 新建人员，返回 id
    pub fn insert_person(&self, name: &str, daily_cost: Decimal) -> RepositoryResult<i64> {
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO personnel (name, daily_cost, active) VALUES (?1, ?2, 1)",
            params![name, daily_cost.to_string()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按 id 查询人员（事务内）
    pub fn find_person_tx(conn: &Connection, id: i64) -> RepositoryResult<Option<Personnel>> {
        let person = conn
            .query_row(
                "SELECT id, name, daily_cost, active FROM personnel WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Personnel {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        daily_cost: parse_decimal_or_zero(&row.get::<_, String>(2)?),
                        active: row.get::<_, i32>(3)? != 0,
                    })
                },
            )
            .optional()?;
        Ok(person)
    }

    /// 是否已派驻到该工程（事务内）
    pub fn assignment_exists_tx(
        conn: &Connection,
        project_id: i64,
        person_id: i64,
    ) -> RepositoryResult<bool> {
        let exists = conn
            .query_row(
                "SELECT 1 FROM personnel_assignment WHERE project_id = ?1 AND person_id = ?2",
                params![project_id, person_id],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(exists)
    }

    /// 写入派驻关系（事务内），返回 id
    pub fn insert_assignment_tx(
        conn: &Connection,
        project_id: i64,
        person_id: i64,
        role: &str,
        start_date: NaiveDate,
    ) -> RepositoryResult<i64> {
        conn.execute(
            r#"INSERT INTO personnel_assignment (project_id, person_id, role, start_date, assigned_at)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
            params![
                project_id,
                person_id,
                role,
                format_date(&start_date),
                format_ts(&chrono::Local::now().naive_local()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 查询工程的派驻关系
    pub fn list_assignments(&self, project_id: i64) -> RepositoryResult<Vec<PersonnelAssignment>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(
            r#"SELECT id, project_id, person_id, role, start_date, assigned_at
               FROM personnel_assignment
               WHERE project_id = ?1
               ORDER BY id ASC"#,
        )?;
        let now = chrono::Local::now().naive_local();
        let assignments = stmt
            .query_map(params![project_id], |row| {
                let start_raw: String = row.get(4)?;
                let assigned_raw: String = row.get(5)?;
                Ok(PersonnelAssignment {
                    id: row.get(0)?,
                    project_id: row.get(1)?,
                    person_id: row.get(2)?,
                    role: row.get(3)?,
                    start_date: parse_date(&start_raw).unwrap_or_else(|| now.date()),
                    assigned_at: parse_ts(&assigned_raw).unwrap_or(now),
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(assignments)
    }

    /// 查询工程派驻人员及日成本（资源汇总用）
    pub fn list_assigned_personnel(&self, project_id: i64) -> RepositoryResult<Vec<AssignedPersonnel>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(
            r#"SELECT pa.person_id, pa.role, pa.start_date, p.daily_cost
               FROM personnel_assignment pa
               JOIN personnel p ON p.id = pa.person_id
               WHERE pa.project_id = ?1
               ORDER BY pa.id ASC"#,
        )?;
        let rows = stmt
            .query_map(params![project_id], |row| {
                Ok(AssignedPersonnel {
                    person_id: row.get(0)?,
                    role: row.get(1)?,
                    start_date: row
                        .get::<_, Option<String>>(2)?
                        .and_then(|s| parse_date(&s)),
                    daily_cost: parse_decimal_or_zero(&row.get::<_, String>(3)?),
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}
