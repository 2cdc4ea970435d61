//! Errors raised while resolving dependent menu options.

use thiserror::Error;

/// Failure of a dependent option lookup.
///
/// Incomplete selection chains are not errors; they resolve to an empty
/// option list. These variants cover the genuinely broken cases.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The chain names a module that was never registered.
    #[error("unknown module: {0}")]
    UnknownModule(String),

    /// A `model` descriptor names an entity class with no registered projection.
    #[error("no projection registered for entity '{0}'")]
    UnknownEntity(String),

    /// A projection was asked for a column outside its whitelist.
    #[error("entity '{entity}' does not expose column '{column}'")]
    UnknownField { entity: String, column: String },

    /// The backing store failed.
    #[error("option query failed")]
    Query(#[from] anyhow::Error),
}
