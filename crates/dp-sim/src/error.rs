use dp_core::DpError;
use dp_field::FieldError;
use dp_partition::PartitionError;
use dp_remote::RemoteError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(#[from] DpError),

    #[error(transparent)]
    Partition(#[from] PartitionError),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

pub type SimResult<T> = Result<T, SimError>;
