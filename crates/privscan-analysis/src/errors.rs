use privscan_core::{CoreError, RegionId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrivateError {
    #[error("{region}: def-use summary is missing")]
    MissingDefUse { region: RegionId },
    #[error("{region}: reach definitions at {node} are missing")]
    MissingReach { region: RegionId, node: String },
    #[error("{region}: live memory is missing")]
    MissingLive { region: RegionId },
    #[error("{region}: no estimate memory for {location}")]
    MissingEstimate { region: RegionId, location: String },
    #[error("{region}: unknown access {inst} is not in the alias tree")]
    MissingUnknown { region: RegionId, inst: String },
    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, PrivateError>;
