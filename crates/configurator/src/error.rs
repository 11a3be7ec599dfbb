use thiserror::Error;

use crate::ConfigurationStatus;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfiguratorError {
    /// The requested status is not one of the recognized literals.
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// The operation is not allowed in the configuration's current state.
    #[error("cannot {action} a configuration in status '{status}'")]
    InvalidState {
        action: &'static str,
        status: ConfigurationStatus,
    },
}
