use std::fmt;

use diesel::result::DatabaseErrorKind;
use thiserror::Error;

use crate::access::{Role, RoleSet};

/// Stable, machine-checkable classification of a [`ServiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authentication,
    Authorization,
    NotFound,
    Conflict,
    InvalidTransition,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::Authentication => "authentication_error",
            ErrorKind::Authorization => "authorization_error",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::Internal => "internal_error",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::Authentication => 401,
            ErrorKind::Authorization => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict | ErrorKind::InvalidTransition => 409,
            ErrorKind::Internal => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Access denied: requires one of [{required}], actor role is {actual}")]
    Forbidden { required: RoleSet, actual: Role },
    /// Denied for a reason other than role, such as acting on someone else's record.
    #[error("Access denied: {0}")]
    Denied(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("Unexpected internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict(message.into())
    }

    pub fn denied(message: impl Into<String>) -> Self {
        ServiceError::Denied(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ServiceError::Internal(message.into())
    }

    pub fn invalid_transition(from: impl fmt::Display, to: impl fmt::Display) -> Self {
        ServiceError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::Unauthenticated => ErrorKind::Authentication,
            ServiceError::Forbidden { .. } | ServiceError::Denied(_) => ErrorKind::Authorization,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::Conflict(_) => ErrorKind::Conflict,
            ServiceError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            ServiceError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Invalid transitions are a specialization of conflicts.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Conflict | ErrorKind::InvalidTransition
        )
    }

    /// Message safe to hand back to a caller. Internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<diesel::result::Error> for ServiceError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => ServiceError::not_found("Record not found"),
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                tracing::warn!(constraint = ?info.constraint_name(), "unique violation");
                ServiceError::conflict(format!(
                    "Duplicate value for {}, try again",
                    info.constraint_name().unwrap_or("a unique field")
                ))
            }
            diesel::result::Error::DatabaseError(_, info)
                if info
                    .constraint_name()
                    .is_some_and(|name| name.ends_with("_no_overlap")) =>
            {
                ServiceError::conflict("Resource is not available for the selected dates")
            }
            other => {
                tracing::error!(error = %other, "database error");
                ServiceError::internal(other.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ServiceError::validation("x").kind().status_code(), 400);
        assert_eq!(ServiceError::Unauthenticated.kind().status_code(), 401);
        assert_eq!(
            ServiceError::Forbidden {
                required: RoleSet::ADMIN_ONLY,
                actual: Role::Waiter,
            }
            .kind()
            .status_code(),
            403
        );
        assert_eq!(ServiceError::not_found("x").kind().status_code(), 404);
        assert_eq!(ServiceError::conflict("x").kind().status_code(), 409);
        assert_eq!(
            ServiceError::invalid_transition("pending", "ready")
                .kind()
                .status_code(),
            409
        );
        assert_eq!(ServiceError::internal("x").kind().status_code(), 500);
    }

    #[test]
    fn test_invalid_transition_is_conflict() {
        let err = ServiceError::invalid_transition("pending", "ready");
        assert!(err.is_conflict());
        assert_eq!(
            err.to_string(),
            "Invalid status transition from pending to ready"
        );
    }

    #[test]
    fn test_internal_message_is_not_leaked() {
        let err = ServiceError::internal("relation \"orders\" does not exist");
        assert_eq!(err.public_message(), "Internal server error");
    }

    #[test]
    fn test_diesel_not_found_maps_to_not_found() {
        let err: ServiceError = diesel::result::Error::NotFound.into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    struct ConstraintViolation(&'static str);

    impl diesel::result::DatabaseErrorInformation for ConstraintViolation {
        fn message(&self) -> &str {
            "constraint violated"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            Some("bookings")
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            Some(self.0)
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    #[test]
    fn test_overlap_constraint_maps_to_conflict() {
        let err: ServiceError = diesel::result::Error::DatabaseError(
            DatabaseErrorKind::Unknown,
            Box::new(ConstraintViolation("bookings_no_overlap")),
        )
        .into();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(
            err.public_message(),
            "Resource is not available for the selected dates"
        );

        let err: ServiceError = diesel::result::Error::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new(ConstraintViolation("bookings_booking_code_key")),
        )
        .into();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err: ServiceError = diesel::result::Error::DatabaseError(
            DatabaseErrorKind::CheckViolation,
            Box::new(ConstraintViolation("bookings_range_check")),
        )
        .into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_forbidden_message_lists_roles() {
        let err = ServiceError::Forbidden {
            required: RoleSet::STAFF_OR_ADMIN,
            actual: Role::Waiter,
        };
        assert_eq!(
            err.to_string(),
            "Access denied: requires one of [staff, admin], actor role is waiter"
        );
    }
}
