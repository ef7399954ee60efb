use std::fmt;

use thiserror::Error;

use crate::rules::LoadError;
use crate::server::ServerError;

/// Startup-blocking failures. Everything recoverable is logged and absorbed
/// where it happens; only these reach `main`.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Rules(#[from] LoadError),
    #[error(transparent)]
    Server(#[from] ServerError),
}

/// Returning `Result` from `main` prints the error with `Debug`, which is
/// unreadable for wrapped errors. This forwards `Debug` to `Display`.
pub struct DebugFromDisplay<T: fmt::Display>(pub T);

impl<T: fmt::Display> fmt::Debug for DebugFromDisplay<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl<T: fmt::Display> From<T> for DebugFromDisplay<T> {
    fn from(inner: T) -> Self {
        Self(inner)
    }
}
