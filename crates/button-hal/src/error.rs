//! Error types for the button module.

use core::fmt;

/// Errors returned by button module operations.
///
/// Collaborator failures (GPIO or timer service) are logged at the failure
/// site and surfaced as the matching `...Failed` variant; the variants carry
/// no payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonError {
    /// [`initialize`](crate::ButtonModule::initialize) has not completed
    /// successfully yet.
    ModuleNotInitialized,
    /// The declared descriptor table failed validation; the module refuses
    /// to come up with a partially valid table.
    InvalidConfiguration,
    /// The identifier is outside the declared button set.
    ButtonDoesNotExist,
    /// The button is already registered and has not been de-registered.
    ButtonAlreadyInitialized,
    /// The button has not been registered.
    ButtonNotInitialized,
    /// A collaborator call failed while bringing the module or a button up.
    InitializationFailed,
    /// A collaborator call failed while tearing a button down.
    DeinitializationFailed,
}

impl fmt::Display for ButtonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ButtonError::ModuleNotInitialized => write!(f, "button module was not initialized"),
            ButtonError::InvalidConfiguration => write!(f, "button configuration table is invalid"),
            ButtonError::ButtonDoesNotExist => write!(f, "button does not exist"),
            ButtonError::ButtonAlreadyInitialized => write!(f, "button was already initialized"),
            ButtonError::ButtonNotInitialized => write!(f, "button was not initialized"),
            ButtonError::InitializationFailed => write!(f, "button initialization failed"),
            ButtonError::DeinitializationFailed => write!(f, "button de-initialization failed"),
        }
    }
}

impl std::error::Error for ButtonError {}
