use magesync_core::ConnectorError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WizardError {
    #[error("cannot {action} while in state {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    /// The caller picked something the current step did not offer.
    #[error("{0} is not one of the offered choices")]
    InvalidChoice(String),

    #[error(transparent)]
    Connector(#[from] ConnectorError),
}

impl WizardError {
    pub(crate) fn transition(action: &'static str, state: &'static str) -> Self {
        Self::InvalidTransition { action, state }
    }
}

pub type WizardResult<T> = Result<T, WizardError>;
