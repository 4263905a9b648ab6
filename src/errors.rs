use uuid::Uuid;

pub type AppResult<T> = Result<T, AppError>;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("reference not found: {0}")]
    NotFoundReference(String),
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("visibility of menu {0} is locked")]
    VisibilityLocked(Uuid),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("database error")]
    Database(#[from] sqlx::Error),
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated(message.into())
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFoundReference(message.into())
    }

    pub fn invalid_pattern(message: impl Into<String>) -> Self {
        Self::InvalidPattern(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Short machine-readable kind, used in CLI output and audit payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Unauthenticated(_) => "unauthenticated",
            AppError::PermissionDenied(_) => "permission_denied",
            AppError::NotFoundReference(_) => "not_found_reference",
            AppError::InvalidPattern(_) => "invalid_pattern",
            AppError::Conflict(_) => "conflict",
            AppError::VisibilityLocked(_) => "visibility_locked",
            AppError::Validation(_) => "validation",
            AppError::Configuration(_) => "configuration",
            AppError::Database(_) => "database",
            AppError::Migration(_) => "migration",
            AppError::Internal(_) => "internal",
        }
    }

    /// Maps driver errors raised by constraints to their domain meaning.
    ///
    /// Unique and foreign key violations become `Conflict`; the lock
    /// trigger's abort message becomes `VisibilityLocked`.
    pub fn from_write(err: sqlx::Error, menu_id: Option<Uuid>) -> Self {
        if let sqlx::Error::Database(db) = &err {
            let message = db.message();
            if message.contains("hidden_override_locked") {
                if let Some(id) = menu_id {
                    return AppError::VisibilityLocked(id);
                }
            }
            if db.is_unique_violation() || db.is_foreign_key_violation() {
                return AppError::conflict(message.to_string());
            }
        }
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(AppError::conflict("x").kind(), "conflict");
        assert_eq!(AppError::VisibilityLocked(Uuid::nil()).kind(), "visibility_locked");
        assert_eq!(AppError::not_found("role").to_string(), "reference not found: role");
    }
}
