//! # Framework Errors
//!
//! Errors produced by the actor plumbing itself, plus the boxed entity error that carries an
//! aggregate's own error type back to the caller.

/// Errors that can occur within the actor framework itself.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Entity error: {0}")]
    EntityError(Box<dyn std::error::Error + Send + Sync>),
}

impl FrameworkError {
    /// Recovers the entity's own error type from an `EntityError`.
    ///
    /// Returns `Err(self)` unchanged when this is a framework-level failure or when the boxed
    /// error is of another type.
    pub fn into_entity_error<E>(self) -> Result<E, Self>
    where
        E: std::error::Error + 'static,
    {
        match self {
            FrameworkError::EntityError(inner) => match inner.downcast::<E>() {
                Ok(typed) => Ok(*typed),
                Err(other) => Err(FrameworkError::EntityError(other)),
            },
            other => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("quota exceeded: {0}")]
    struct QuotaError(u32);

    #[test]
    fn test_into_entity_error_recovers_typed_error() {
        let err = FrameworkError::EntityError(Box::new(QuotaError(3)));
        assert_eq!(err.into_entity_error::<QuotaError>().unwrap(), QuotaError(3));
    }

    #[test]
    fn test_into_entity_error_keeps_framework_failures() {
        let err = FrameworkError::NotFound("thing_1".to_string());
        match err.into_entity_error::<QuotaError>() {
            Err(FrameworkError::NotFound(id)) => assert_eq!(id, "thing_1"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_into_entity_error_keeps_foreign_entity_errors() {
        let err = FrameworkError::EntityError(Box::new(std::io::Error::other("disk")));
        let back = err.into_entity_error::<QuotaError>().unwrap_err();
        assert!(back.to_string().contains("disk"));
    }
}
