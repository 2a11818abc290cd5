//! Error taxonomy shared by the data-access, throttle and resolver layers.
//!
//! Data-access and throttle failures bubble up unchanged to the resolvers,
//! which convert them into GraphQL errors carrying a machine-readable
//! `code` extension.

use async_graphql::ErrorExtensions;

/// Result alias used throughout the data-access and throttle layers
pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// No live row matched (zero rows returned or affected)
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// Constraint violation or connection failure in the store
    #[error("persistence failure: {0}")]
    Persistence(#[from] sqlx::Error),

    /// Malformed resolver input
    #[error("invalid input: {0}")]
    Validation(String),

    /// Throttle denied the request
    #[error("rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimitExceeded { retry_after_secs: u64 },

    /// Throttle backend could not be consulted
    #[error("throttle unavailable: {0}")]
    ThrottleUnavailable(String),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Stable code exposed to GraphQL clients
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::NotFound { .. } => "NOT_FOUND",
            ServiceError::Persistence(_) => "PERSISTENCE_ERROR",
            ServiceError::Validation(_) => "VALIDATION_ERROR",
            ServiceError::RateLimitExceeded { .. } => "RATE_LIMITED",
            ServiceError::ThrottleUnavailable(_) => "THROTTLE_UNAVAILABLE",
        }
    }
}

impl From<redis::RedisError> for ServiceError {
    fn from(e: redis::RedisError) -> Self {
        ServiceError::ThrottleUnavailable(e.to_string())
    }
}

impl ErrorExtensions for ServiceError {
    fn extend(&self) -> async_graphql::Error {
        if let ServiceError::Persistence(e) = self {
            tracing::error!(error = %e, "Persistence failure");
        }

        async_graphql::Error::new(self.to_string()).extend_with(|_, ext| {
            ext.set("code", self.code());
            if let ServiceError::RateLimitExceeded { retry_after_secs } = self {
                ext.set("retryAfter", *retry_after_secs);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = ServiceError::NotFound {
            entity: "Author",
            id: 7,
        };
        assert_eq!(err.to_string(), "Author with id 7 not found");
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_rate_limit_extension() {
        let err = ServiceError::RateLimitExceeded {
            retry_after_secs: 12,
        }
        .extend();

        let ext = err.extensions.expect("extensions set");
        assert_eq!(
            ext.get("code"),
            Some(&async_graphql::Value::from("RATE_LIMITED"))
        );
        assert_eq!(ext.get("retryAfter"), Some(&async_graphql::Value::from(12u64)));
    }
}
