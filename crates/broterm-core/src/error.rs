use std::path::PathBuf;

use thiserror::Error;

use crate::nav::ScreenId;

/// Errors raised by the core.
///
/// `DuplicateScreen`, `UnknownScreen` and `ModalWithoutScreen` are
/// misconfiguration: callers must propagate them out of the UI loop instead
/// of recovering.
#[derive(Debug, Error)]
pub enum Error {
    #[error("screen `{0}` is already registered")]
    DuplicateScreen(ScreenId),

    #[error("screen `{0}` is not registered")]
    UnknownScreen(ScreenId),

    #[error("modal screen `{0}` needs a current screen beneath it")]
    ModalWithoutScreen(ScreenId),

    #[error("failed to load config from {path}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to initialize logging: {0}")]
    Logging(String),
}

impl Error {
    /// True for registry errors that must halt the process.
    pub fn is_misconfiguration(&self) -> bool {
        matches!(
            self,
            Error::DuplicateScreen(_) | Error::UnknownScreen(_) | Error::ModalWithoutScreen(_)
        )
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
