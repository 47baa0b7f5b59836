// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Display composer wire format (transactions, typed codec, command registry)
//!
//! OWNERS: @runtime
//!
//! STATUS: Functional
//!
//! API_STABILITY: Unstable
//!
//! PUBLIC API:
//!   - `Transaction`: ordered byte container for one request or reply
//!   - `DeviceCmd` / `LayerCmd` / `CmdId`: bit-partitioned command registry
//!   - `WirePod`: fixed-size record encoding for display data types
//!   - `BufferHandle`: descriptor-bearing graphics buffer field
//!   - `DispError`: protocol status codes shared by proxy and stub
//!
//! INVARIANTS:
//!   - Reads never panic on malformed input; every failure is a `WireError`
//!   - A length prefix must equal the expected type size exactly
//!   - Field order is a bilateral contract agreed out of band; there are no
//!     type tags on the wire, only the protocol-version header to detect skew
//!   - Wire-supplied element counts are bounded by `ARRAY_COUNT_MAX` before
//!     any allocation

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

pub mod buffer;
pub mod cmd;
pub mod codec;
pub mod status;
pub mod txn;
pub mod types;

pub use buffer::{BufferHandle, LayerBuffer};
pub use cmd::{CmdId, DeviceCmd, FuncType, LayerCmd};
pub use codec::WirePod;
pub use status::{DispError, DispResult, STATUS_SUCCESS};
pub use txn::{Transaction, WireError, INTERFACE_TOKEN, PROTOCOL_VERSION};
pub use types::{
    BlendMode, CompositionType, DisplayCapability, DisplayInfo, DisplayModeInfo, InterfaceType,
    LayerAlpha, LayerInfo, LayerType, PixelFormat, PowerStatus, Rect, TransformMode,
};

/// Upper bound on any wire-supplied element count.
///
/// Both sides reject counts above this before allocating reply or argument
/// buffers, so a hostile peer cannot force oversized allocations.
pub const ARRAY_COUNT_MAX: u32 = 256;

/// Largest valid display device id; operations naming a device above this
/// fail fast client-side with a parameter error.
pub const MAX_DEVICE_ID: u32 = 4;
