use thiserror::Error;

#[derive(Error, Debug)]
pub enum TourlensError {
    /// The table matches no known report shape. Processing of that table
    /// stops; other tables continue.
    #[error("unrecognized report schema: {0}")]
    SchemaUnrecognized(String),

    /// The ticket feed could not be fetched at all.
    #[error("ticket feed unavailable: {0}")]
    Feed(String),

    /// The exchange-rate refresh failed. Callers fall back to the static
    /// table and record a degradation note.
    #[error("rate refresh failed: {0}")]
    Rates(String),

    #[error("malformed input: {0}")]
    Parse(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
