// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Request/reply transport abstractions for the display channel
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests in `host`
//!
//! PUBLIC API:
//!   - Caller trait: synchronous command invocation, client side
//!   - Responder trait: request intake and reply delivery, server side
//!   - Wait enum: wait behavior for receive operations
//!   - CallError: transport error types
//!   - host::loopback_channel(): in-process pair for host testing
//!
//! The command id travels out-of-band next to the payload: the receiving
//! stub gets `(command, bytes)` and never has to parse the id out of the
//! frame. Replies carry an `i32` status out-of-band the same way; a
//! non-zero status surfaces to the caller as `CallError::Failure`.

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

pub mod host;

use core::fmt;
use core::time::Duration;

/// Result type returned by transport operations.
pub type Result<T> = core::result::Result<T, CallError>;

/// Behaviour of a blocking receive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Wait {
    /// Block until the operation completes.
    Blocking,
    /// Return immediately if no frame is pending.
    NonBlocking,
    /// Block until a frame arrives or the timeout expires.
    Timeout(Duration),
}

impl Wait {
    /// Returns `true` when the caller requested a non-blocking attempt.
    pub const fn is_non_blocking(self) -> bool {
        matches!(self, Self::NonBlocking)
    }

    /// Converts a [`Wait::Timeout`] variant into its [`Duration`].
    pub const fn timeout(self) -> Option<Duration> {
        match self {
            Self::Timeout(duration) => Some(duration),
            Self::Blocking | Self::NonBlocking => None,
        }
    }
}

/// Errors produced by the transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallError {
    /// Operation could not progress without blocking.
    WouldBlock,
    /// The caller exceeded the requested timeout.
    Timeout,
    /// The opposite endpoint disconnected.
    Disconnected,
    /// The remote end answered with a non-zero status and no payload.
    Failure(i32),
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WouldBlock => write!(f, "operation would block"),
            Self::Timeout => write!(f, "operation timed out"),
            Self::Disconnected => write!(f, "peer disconnected"),
            Self::Failure(status) => write!(f, "remote answered with status {status}"),
        }
    }
}

impl std::error::Error for CallError {}

/// Client side of the display channel: one synchronous call per command.
pub trait Caller: Send + Sync {
    /// Sends `request` under `cmd` and blocks for the reply payload.
    /// A non-zero remote status comes back as [`CallError::Failure`].
    fn call(&self, cmd: u32, request: &[u8]) -> Result<Vec<u8>>;
}

/// Server side of the display channel: receive a command frame, answer it.
pub trait Responder: Send + Sync {
    /// Receives the next `(command, request bytes)` pair.
    fn recv(&self, wait: Wait) -> Result<(u32, Vec<u8>)>;

    /// Delivers the reply for the request last received.
    fn reply(&self, status: i32, payload: &[u8]) -> Result<()>;
}
