/// Health of the work-in-progress mirror
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PersistenceStatus {
    #[default]
    Healthy,
    /// The most recent write failed; the in-memory tally is still authoritative
    Failed { message: String },
}

impl PersistenceStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, PersistenceStatus::Healthy)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PersistenceError {
    #[error("Failed to save work in progress: {0}")]
    WriteFailed(String),
    #[error("Work-in-progress writer is no longer running")]
    WriterStopped,
}
