// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Client proxy for the display composer channel
//! OWNERS: @runtime
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: Unit tests against a mock caller; loopback integration
//!   tests live with the service crate
//!
//! PUBLIC API:
//!   - DisplayConnection: one method per display/layer operation
//!   - DisplayEventListener: capability interface for inbound events
//!   - CallbackStub: pumps the reverse-direction channel
//!   - ProxyError: client-side error taxonomy
//!
//! INVARIANTS:
//!   - Local validation failures never touch the transport
//!   - Request field order matches the stub handler's read order exactly
//!   - Replies are decoded in the stub's write order; a short or malformed
//!     reply is a decode error, never a panic

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

mod callback;
mod error;
mod proxy;

pub use callback::{CallbackStub, DisplayEventListener};
pub use error::{ProxyError, Result};
pub use proxy::DisplayConnection;
