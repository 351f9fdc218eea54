use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("invalid params: {}", summarize(.0))]
    Validation(Vec<FieldError>),
    #[error("{0}")]
    Unauthorized(String),
    #[error("select a workspace first")]
    NoWorkspace,
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),
    #[error("{0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

fn summarize(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl AppError {
    pub fn not_found(what: &str) -> Self {
        AppError::NotFound(format!("{} not found", what))
    }

    pub fn bad_param(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation(vec![FieldError {
            field: field.to_string(),
            message: message.into(),
        }])
    }

    /// Stable wire code reported in the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Validation(_) => "bad_params",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::NoWorkspace => "no_workspace",
            AppError::Db(e) if is_unique_violation(e) => "conflict",
            AppError::Db(_) => "db_query_failed",
            AppError::Internal(_) => "internal",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::Validation(fields) => Some(json!({ "fields": fields })),
            _ => None,
        }
    }
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(f, _)
            if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_field() {
        let e = AppError::Validation(vec![
            FieldError {
                field: "name".into(),
                message: "required".into(),
            },
            FieldError {
                field: "talentReward".into(),
                message: "must be >= 0".into(),
            },
        ]);
        assert_eq!(e.code(), "bad_params");
        assert_eq!(
            e.to_string(),
            "invalid params: name: required; talentReward: must be >= 0"
        );
        let details = e.details().expect("details");
        assert_eq!(details["fields"].as_array().map(|a| a.len()), Some(2));
    }

    #[test]
    fn unique_violation_maps_to_conflict() {
        let conn = rusqlite::Connection::open_in_memory().expect("open");
        conn.execute("CREATE TABLE t(k TEXT PRIMARY KEY)", [])
            .expect("create");
        conn.execute("INSERT INTO t(k) VALUES('a')", []).expect("insert");
        let e: AppError = conn
            .execute("INSERT INTO t(k) VALUES('a')", [])
            .expect_err("duplicate")
            .into();
        assert_eq!(e.code(), "conflict");
    }
}
