use abm_core::AbmError;
use abm_snapshot::SnapshotError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Abm(#[from] AbmError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

pub type SimResult<T> = Result<T, SimError>;
