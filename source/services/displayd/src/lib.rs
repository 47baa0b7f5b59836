// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: displayd – display composer service stub over the device backend
//!
//! OWNERS: @runtime
//!
//! STATUS: Functional
//!
//! API_STABILITY: Unstable
//!
//! TEST_COVERAGE:
//!   - Unit tests: `src/stub.rs` (dispatch safety, header/count validation,
//!     callback arming), `src/callback.rs` (notification wire shape)
//!   - E2E tests: `tests/end_to_end.rs` (loopback client↔service scenarios)
//!
//! PUBLIC API:
//!   - `ServerStub`: 2-D command dispatch into a `DeviceBackend`
//!   - `DeviceBackend`: per-operation device interface
//!   - `EventSink` / `CallbackRemote`: reverse-direction event delivery

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

pub mod backend;
pub mod callback;
pub mod stub;

pub use backend::{DeviceBackend, UnimplementedBackend};
pub use callback::{CallbackRemote, EventSink};
pub use stub::ServerStub;
