use super::core::ActionLogRepository;
use crate::domain::action_log::ActionLog;
use crate::repository::error::RepositoryResult;
use chrono::NaiveDateTime;
use rusqlite::{params, Result as SqliteResult, Row};

const SELECT_COLUMNS: &str = r#"
    SELECT action_id, production_id, action_type, action_ts, actor,
           payload_json, detail
    FROM action_log
"#;

impl ActionLogRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 action_id 查询单个日志
    pub fn find_by_id(&self, action_id: &str) -> RepositoryResult<Option<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!("{} WHERE action_id = ?", SELECT_COLUMNS))?;

        match stmt.query_row(params![action_id], map_row) {
            Ok(log) => Ok(Some(log)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询指定生产订单的所有操作日志（按时间先后）
    pub fn find_by_production_id(&self, production_id: i64) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE production_id = ? ORDER BY action_ts ASC, rowid ASC",
            SELECT_COLUMNS
        ))?;

        let logs = stmt
            .query_map(params![production_id], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }

    /// 查询指定操作类型的日志
    pub fn find_by_action_type(&self, action_type: &str, limit: i32) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE action_type = ? ORDER BY action_ts DESC LIMIT ?",
            SELECT_COLUMNS
        ))?;

        let logs = stmt
            .query_map(params![action_type, limit], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }
}

/// 映射数据库行到 ActionLog
fn map_row(row: &Row) -> SqliteResult<ActionLog> {
    let action_ts_str: String = row.get(3)?;
    let action_ts = NaiveDateTime::parse_from_str(&action_ts_str, "%Y-%m-%d %H:%M:%S%.f")
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let payload_json: Option<String> = row.get(5)?;

    Ok(ActionLog {
        action_id: row.get(0)?,
        production_id: row.get(1)?,
        action_type: row.get(2)?,
        action_ts,
        actor: row.get(4)?,
        payload_json: payload_json.and_then(|s| serde_json::from_str(&s).ok()),
        detail: row.get(6)?,
    })
}
