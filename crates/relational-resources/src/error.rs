//! Error taxonomy shared by every aggregate of the platform.

use actor_framework::FrameworkError;
use serde::Serialize;
use thiserror::Error;

/// One rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Errors returned by every domain operation.
///
/// Nothing here is transient: callers surface the error as-is, mapped through
/// [`DomainError::status_code`] at the boundary.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DomainError {
    /// No acting user where one is required.
    #[error("Authentication required")]
    Unauthorized,

    /// The actor lacks the permission for this target or state.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The entity does not exist, or exists but is not visible to the actor.
    #[error("{0} not found")]
    NotFound(String),

    /// A status guard failed.
    #[error("Cannot {action} {entity} in status {from}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        action: &'static str,
    },

    #[error("Validation failed: {}", format_fields(.0))]
    ValidationFailed(Vec<FieldError>),

    /// Uniqueness violation (duplicate favorite, participant, ...).
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("activity is full (max {max} participants)")]
    ActivityFull { max: u32 },

    /// An error occurred while communicating with the actor system.
    #[error("Actor communication error: {0}")]
    ActorCommunication(String),
}

fn format_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl DomainError {
    pub fn forbidden(reason: impl Into<String>) -> Self {
        DomainError::Forbidden(reason.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        DomainError::NotFound(what.into())
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        DomainError::Conflict(reason.into())
    }

    /// Shorthand for a single-field validation failure.
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        DomainError::ValidationFailed(vec![FieldError::new(field, message)])
    }

    /// The HTTP status a boundary layer would answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            DomainError::Unauthorized => 401,
            DomainError::Forbidden(_) => 403,
            DomainError::NotFound(_) => 404,
            DomainError::InvalidTransition { .. } => 422,
            DomainError::ValidationFailed(_) => 422,
            DomainError::Conflict(_) => 409,
            DomainError::ActivityFull { .. } => 422,
            DomainError::ActorCommunication(_) => 500,
        }
    }
}

impl From<String> for DomainError {
    fn from(msg: String) -> Self {
        DomainError::ActorCommunication(msg)
    }
}

impl From<FrameworkError> for DomainError {
    fn from(e: FrameworkError) -> Self {
        match e.into_entity_error::<DomainError>() {
            Ok(domain) => domain,
            Err(FrameworkError::NotFound(id)) => DomainError::NotFound(id),
            Err(other) => DomainError::ActorCommunication(other.to_string()),
        }
    }
}

/// Collects field errors and turns them into one `ValidationFailed`.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &'static str, message: impl Into<String>) {
        if !ok {
            self.errors.push(FieldError::new(field, message));
        }
    }

    /// Checks the trimmed length of a text in characters.
    pub fn length(&mut self, field: &'static str, value: &str, min: usize, max: usize) {
        let len = value.trim().chars().count();
        if len < min {
            let message = if min <= 1 {
                "is required".to_string()
            } else {
                format!("must be at least {} characters", min)
            };
            self.errors.push(FieldError::new(field, message));
        } else if len > max {
            self.errors
                .push(FieldError::new(field, format!("must be at most {} characters", max)));
        }
    }

    pub fn finish(self) -> Result<(), DomainError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(DomainError::ValidationFailed(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(DomainError::Unauthorized.status_code(), 401);
        assert_eq!(DomainError::forbidden("x").status_code(), 403);
        assert_eq!(DomainError::not_found("resource_1").status_code(), 404);
        assert_eq!(DomainError::conflict("dup").status_code(), 409);
        assert_eq!(DomainError::invalid("title", "is required").status_code(), 422);
        assert_eq!(DomainError::ActivityFull { max: 2 }.status_code(), 422);
    }

    #[test]
    fn test_activity_full_message() {
        let msg = DomainError::ActivityFull { max: 2 }.to_string();
        assert!(msg.starts_with("activity is full"));
    }

    #[test]
    fn test_framework_error_recovers_domain_error() {
        let boxed = FrameworkError::EntityError(Box::new(DomainError::forbidden("nope")));
        assert_eq!(DomainError::from(boxed), DomainError::forbidden("nope"));

        let missing = FrameworkError::NotFound("activity_9".into());
        assert_eq!(
            DomainError::from(missing),
            DomainError::not_found("activity_9")
        );

        assert!(matches!(
            DomainError::from(FrameworkError::ActorClosed),
            DomainError::ActorCommunication(_)
        ));
    }

    #[test]
    fn test_validator_collects_every_field() {
        let mut v = Validator::new();
        v.length("title", "  ", 1, 255);
        v.length("content", "hi", 3, 1000);
        v.check(true, "duration", "unused");
        match v.finish() {
            Err(DomainError::ValidationFailed(fields)) => {
                let names: Vec<_> = fields.iter().map(|f| f.field).collect();
                assert_eq!(names, vec!["title", "content"]);
                assert_eq!(fields[0].message, "is required");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
