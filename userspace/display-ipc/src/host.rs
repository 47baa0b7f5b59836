// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: In-process display channel for host-based testing
//!
//! OWNERS: @runtime
//!
//! PUBLIC API:
//!   - loopback_channel(): Create caller/responder pair backed by in-memory channels
//!   - struct LoopbackCaller: Caller implementation for in-process testing
//!   - struct LoopbackResponder: Responder implementation for in-process testing
//!
//! SECURITY INVARIANTS:
//!   - No unsafe code in loopback operations
//!   - Channel-based communication prevents data races
//!   - A caller holds its response receiver locked across send+receive, so
//!     concurrent calls cannot steal each other's replies
//!
//! ERROR CONDITIONS:
//!   - CallError::Disconnected: Channel disconnected
//!   - CallError::WouldBlock: No frame pending in non-blocking mode
//!   - CallError::Timeout: Receive timed out
//!   - CallError::Failure: Remote answered with non-zero status

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};

use parking_lot::Mutex;

use crate::{CallError, Caller, Responder, Result, Wait};

/// Creates a loopback caller/responder pair backed by in-memory channels.
pub fn loopback_channel() -> (LoopbackCaller, LoopbackResponder) {
    let (req_tx, req_rx) = mpsc::channel::<(u32, Vec<u8>)>();
    let (rsp_tx, rsp_rx) = mpsc::channel::<(i32, Vec<u8>)>();
    (
        LoopbackCaller {
            request_tx: req_tx,
            response_rx: Mutex::new(rsp_rx),
        },
        LoopbackResponder {
            request_rx: Mutex::new(req_rx),
            response_tx: rsp_tx,
        },
    )
}

/// Caller implementation backed by in-memory channels.
pub struct LoopbackCaller {
    request_tx: Sender<(u32, Vec<u8>)>,
    response_rx: Mutex<Receiver<(i32, Vec<u8>)>>,
}

impl Caller for LoopbackCaller {
    fn call(&self, cmd: u32, request: &[u8]) -> Result<Vec<u8>> {
        // Lock spans send and receive: a second caller waits here instead of
        // pairing with our reply.
        let receiver = self.response_rx.lock();
        self.request_tx
            .send((cmd, request.to_vec()))
            .map_err(|_| CallError::Disconnected)?;
        let (status, payload) = receiver.recv().map_err(|_| CallError::Disconnected)?;
        if status != 0 {
            return Err(CallError::Failure(status));
        }
        Ok(payload)
    }
}

/// Responder implementation backed by in-memory channels.
pub struct LoopbackResponder {
    request_rx: Mutex<Receiver<(u32, Vec<u8>)>>,
    response_tx: Sender<(i32, Vec<u8>)>,
}

impl Responder for LoopbackResponder {
    fn recv(&self, wait: Wait) -> Result<(u32, Vec<u8>)> {
        let receiver = self.request_rx.lock();
        match wait {
            Wait::Blocking => receiver.recv().map_err(|_| CallError::Disconnected),
            Wait::NonBlocking => receiver.try_recv().map_err(|err| match err {
                TryRecvError::Empty => CallError::WouldBlock,
                TryRecvError::Disconnected => CallError::Disconnected,
            }),
            Wait::Timeout(timeout) => {
                if timeout.is_zero() {
                    return receiver.try_recv().map_err(|err| match err {
                        TryRecvError::Empty => CallError::WouldBlock,
                        TryRecvError::Disconnected => CallError::Disconnected,
                    });
                }
                receiver.recv_timeout(timeout).map_err(|err| match err {
                    RecvTimeoutError::Timeout => CallError::Timeout,
                    RecvTimeoutError::Disconnected => CallError::Disconnected,
                })
            }
        }
    }

    fn reply(&self, status: i32, payload: &[u8]) -> Result<()> {
        self.response_tx
            .send((status, payload.to_vec()))
            .map_err(|_| CallError::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn loopback_roundtrip() {
        let (caller, responder) = loopback_channel();
        let server = thread::spawn(move || {
            let (cmd, request) = responder.recv(Wait::Blocking).unwrap();
            assert_eq!(cmd, 0x0001_0004);
            assert_eq!(request, b"ping");
            responder.reply(0, b"pong").unwrap();
        });
        let reply = caller.call(0x0001_0004, b"ping").unwrap();
        assert_eq!(reply, b"pong");
        server.join().unwrap();
    }

    #[test]
    fn non_zero_status_surfaces_as_failure() {
        let (caller, responder) = loopback_channel();
        let server = thread::spawn(move || {
            let _ = responder.recv(Wait::Blocking).unwrap();
            responder.reply(-3, &[]).unwrap();
        });
        assert_eq!(caller.call(1, &[]), Err(CallError::Failure(-3)));
        server.join().unwrap();
    }

    #[test]
    fn timeout_and_non_blocking_receive() {
        let (_caller, responder) = loopback_channel();
        assert_eq!(
            responder.recv(Wait::NonBlocking),
            Err(CallError::WouldBlock)
        );
        assert_eq!(
            responder.recv(Wait::Timeout(Duration::from_millis(5))),
            Err(CallError::Timeout)
        );
        assert_eq!(
            responder.recv(Wait::Timeout(Duration::ZERO)),
            Err(CallError::WouldBlock)
        );
    }

    #[test]
    fn dropped_responder_disconnects_caller() {
        let (caller, responder) = loopback_channel();
        drop(responder);
        assert_eq!(caller.call(1, &[]), Err(CallError::Disconnected));
    }
}
