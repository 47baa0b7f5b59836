// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Client-side error taxonomy.
//!
//! Local failures (validation, encode) are distinguishable from transport
//! failures, which are distinguishable from statuses the remote produced,
//! which are distinguishable from replies that failed to decode.

use display_ipc::CallError;
use display_wire::{DispError, WireError};
use thiserror::Error;

/// Result alias for proxy operations.
pub type Result<T> = core::result::Result<T, ProxyError>;

/// Anything a proxy method can fail with.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProxyError {
    /// An argument failed local validation; the transport was not touched.
    #[error("invalid argument")]
    Param,
    /// The operation is not carried over this channel.
    #[error("operation not supported")]
    NotSupported,
    /// Building the request failed.
    #[error("request encode failed: {0}")]
    Encode(#[source] WireError),
    /// The channel itself failed.
    #[error("transport failed: {0}")]
    Transport(#[source] CallError),
    /// The remote executed the operation and answered with an error status.
    #[error("remote failed: {0}")]
    Remote(#[source] DispError),
    /// The reply arrived but did not decode in the agreed order.
    #[error("reply decode failed: {0}")]
    Decode(#[source] WireError),
}

impl From<CallError> for ProxyError {
    fn from(err: CallError) -> Self {
        match err {
            // The remote ran and produced a status; surface it as such.
            CallError::Failure(status) => {
                ProxyError::Remote(DispError::from_status(status).unwrap_or(DispError::Failure))
            }
            other => ProxyError::Transport(other),
        }
    }
}
