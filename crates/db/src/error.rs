/// Errors raised by the repository layer.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// A filter, sort, or lookup named a field the entity does not expose.
    #[error("Unknown field '{field}' for {entity}")]
    UnknownField { entity: &'static str, field: String },
}

pub type RepoResult<T> = Result<T, RepoError>;
