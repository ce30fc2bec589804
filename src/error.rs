use std::error::Error;
use std::fmt::{Display, Formatter};
use crate::mrc::UpgradeError;

#[derive(Debug, Clone, PartialEq)]
pub enum MeshError {
    InvalidState,
    InvalidParameter(String),
    AlreadyAttached(u32),
}

impl Display for MeshError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MeshError::InvalidState => f.write_str("invalid state"),
            MeshError::InvalidParameter(message) => write!(f, "invalid parameter: {}", message),
            MeshError::AlreadyAttached(id) => write!(f, "element {} has a parent already", id),
        }
    }
}

impl Error for MeshError {

}

impl From<UpgradeError> for MeshError {
    fn from(_value: UpgradeError) -> Self {
        MeshError::InvalidState
    }
}

pub type MeshResult<T> = Result<T, MeshError>;
