use crate::types::EntityId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: EntityId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The spare seed source is missing or unreadable.
    #[error("Data source unavailable: {0}")]
    DataSourceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a [`CoreError::NotFound`].
    pub fn not_found(entity: &'static str, id: EntityId) -> Self {
        Self::NotFound { entity, id }
    }
}
