use entity::leave_requests;
use platform_api::ApiError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

pub type HrResult<T> = Result<T, HrError>;

#[derive(Debug, Error)]
pub enum HrError {
    #[error("permission denied")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("leave request is already {from}, cannot move to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
    #[error("already checked in today")]
    AlreadyCheckedIn,
    #[error("already checked out today")]
    AlreadyCheckedOut,
    #[error("no check-in recorded today")]
    NotCheckedIn,
    #[error("password hashing failed: {0}")]
    Password(String),
    #[error(transparent)]
    Db(DbErr),
}

impl HrError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn transition(from: leave_requests::Status, to: leave_requests::Status) -> Self {
        Self::InvalidTransition {
            from: from.as_str(),
            to: to.as_str(),
        }
    }

    /// Map a write failure, turning unique violations into `Conflict`.
    pub(crate) fn on_write(err: DbErr, conflict: &str) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::Conflict(conflict.to_string()),
            _ => Self::Db(err),
        }
    }
}

impl From<DbErr> for HrError {
    fn from(value: DbErr) -> Self {
        Self::Db(value)
    }
}

impl From<HrError> for ApiError {
    fn from(value: HrError) -> Self {
        match value {
            HrError::Forbidden => ApiError::Forbidden,
            HrError::NotFound(what) => ApiError::NotFound(what.to_string()),
            HrError::Validation(msg) => ApiError::InvalidInput(msg),
            err @ (HrError::InvalidTransition { .. }
            | HrError::AlreadyCheckedIn
            | HrError::AlreadyCheckedOut
            | HrError::NotCheckedIn) => ApiError::InvalidInput(err.to_string()),
            HrError::Conflict(msg) => ApiError::Conflict(msg),
            err @ (HrError::Password(_) | HrError::Db(_)) => ApiError::internal(err.into()),
        }
    }
}
