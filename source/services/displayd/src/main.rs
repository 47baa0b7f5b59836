// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0
#![forbid(unsafe_code)]

//! CONTEXT: displayd daemon entrypoint wiring a transport to the stub
//!
//! OWNERS: @runtime
//!
//! STATUS: Experimental
//!
//! API_STABILITY: Unstable
//!
//! TEST_COVERAGE: Host tests in `source/services/displayd/tests/`

use displayd::{ServerStub, UnimplementedBackend};

fn main() {
    env_logger::init();
    // The platform composer transport is wired by system integration; this
    // build serves an idle loopback so the daemon parks instead of spinning.
    let stub = ServerStub::new(Box::new(UnimplementedBackend));
    let (_caller, responder) = display_ipc::host::loopback_channel();
    log::info!("displayd: serving");
    if let Err(err) = stub.serve(&responder) {
        eprintln!("displayd: {err}");
    }
}
