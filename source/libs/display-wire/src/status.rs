// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Protocol status codes shared by both ends of the channel.
//!
//! A reply frame carries one `i32` status. Zero is success; each error
//! variant has a fixed negative code that travels verbatim, so the proxy
//! surfaces exactly the status the backend produced.

use thiserror::Error;

/// Wire status for success.
pub const STATUS_SUCCESS: i32 = 0;

/// Result alias used by backends and stub handlers.
pub type DispResult<T> = Result<T, DispError>;

/// Display protocol error, one fixed wire code per variant.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DispError {
    /// Catch-all failure.
    #[error("operation failed")]
    Failure,
    /// The operation exists in the registry but is not implemented here.
    #[error("operation not supported")]
    NotSupported,
    /// An argument failed validation before or after decode.
    #[error("invalid parameter")]
    Param,
    /// A required remote object (callback channel) is not registered.
    #[error("callback object not registered")]
    InvalidObject,
    /// The named device does not exist or the backend is gone.
    #[error("no such device")]
    NoDevice,
    /// A status code outside the named set, carried verbatim.
    #[error("status code {0}")]
    Other(i32),
}

impl DispError {
    /// The `i32` this error puts on the wire.
    pub fn code(self) -> i32 {
        match self {
            DispError::Failure => -1,
            DispError::NotSupported => -2,
            DispError::Param => -3,
            DispError::InvalidObject => -4,
            DispError::NoDevice => -5,
            DispError::Other(code) => code,
        }
    }

    /// Maps a reply status back to an error; `None` for success.
    /// Non-zero codes outside the named set come back as [`DispError::Other`]
    /// so nothing is lost in transit.
    pub fn from_status(status: i32) -> Option<DispError> {
        match status {
            0 => None,
            -1 => Some(DispError::Failure),
            -2 => Some(DispError::NotSupported),
            -3 => Some(DispError::Param),
            -4 => Some(DispError::InvalidObject),
            -5 => Some(DispError::NoDevice),
            other => Some(DispError::Other(other)),
        }
    }
}
