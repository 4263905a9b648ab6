use crate::authz::{NotFoundPolicy, ADMIN_PRIORITY_THRESHOLD};
use crate::errors::AppError;

#[derive(Debug, Clone)]
pub struct GuardConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Minimum effective priority for administrative overlay writes.
    pub admin_priority: u32,
    pub not_found: NotFoundPolicy,
}

impl GuardConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| AppError::configuration("DATABASE_URL not set"))?;

        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .map(|val| val.parse::<u32>())
            .unwrap_or(Ok(10))
            .map_err(|_| AppError::configuration("DB_MAX_CONNECTIONS must be a valid integer"))?;

        let admin_priority = std::env::var("ADMIN_PRIORITY_THRESHOLD")
            .map(|val| val.parse::<u32>())
            .unwrap_or(Ok(ADMIN_PRIORITY_THRESHOLD))
            .map_err(|_| AppError::configuration("ADMIN_PRIORITY_THRESHOLD must be a non-negative integer"))?;

        let not_found = match std::env::var("GUARD_NOT_FOUND_MODE") {
            Ok(value) => NotFoundPolicy::parse(&value).ok_or_else(|| {
                AppError::configuration(format!(
                    "GUARD_NOT_FOUND_MODE must be `strict` or `ancestor`, got `{value}`"
                ))
            })?,
            Err(_) => NotFoundPolicy::Strict,
        };

        Ok(Self {
            database_url,
            max_connections,
            admin_priority,
            not_found,
        })
    }
}
