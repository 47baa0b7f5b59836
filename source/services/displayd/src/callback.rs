// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Reverse-direction event channel.
//!
//! The stub holds one [`CallbackRemote`] wrapping a server→client caller.
//! Backends push events through the [`EventSink`] interface; each event
//! becomes one notification transaction carrying the registration command
//! id. A failed send is logged and dropped — events are edge signals, the
//! next one supersedes the lost one.

use std::sync::Arc;

use display_ipc::Caller;
use display_wire::{DeviceCmd, Transaction, INTERFACE_TOKEN};

/// Where backend events go. The stub's callback remote is the production
/// implementation; tests plug in recorders.
pub trait EventSink: Send + Sync {
    /// A display connected (`true`) or disconnected (`false`).
    fn hotplug(&self, dev_id: u32, connected: bool);

    /// A vertical blank happened at `ns`.
    fn vblank(&self, sequence: u32, ns: u64);

    /// Ask the client to redraw `dev_id`.
    fn refresh(&self, dev_id: u32);
}

/// Sends notifications over the client's callback channel.
pub struct CallbackRemote {
    transport: Arc<dyn Caller>,
}

impl CallbackRemote {
    pub(crate) fn new(transport: Arc<dyn Caller>) -> Self {
        CallbackRemote { transport }
    }

    fn notify(&self, cmd: DeviceCmd, txn: Transaction) {
        if let Err(err) = self.transport.call(cmd.raw(), txn.as_bytes()) {
            log::warn!("dropping {cmd:?} notification: {err}");
        }
    }
}

impl EventSink for CallbackRemote {
    fn hotplug(&self, dev_id: u32, connected: bool) {
        let mut txn = Transaction::begin_request(INTERFACE_TOKEN);
        txn.write_u32(dev_id);
        txn.write_bool(connected);
        self.notify(DeviceCmd::RegHotPlugCallback, txn);
    }

    fn vblank(&self, sequence: u32, ns: u64) {
        let mut txn = Transaction::begin_request(INTERFACE_TOKEN);
        txn.write_u32(sequence);
        txn.write_u64(ns);
        self.notify(DeviceCmd::RegDisplayVBlankCallback, txn);
    }

    fn refresh(&self, dev_id: u32) {
        let mut txn = Transaction::begin_request(INTERFACE_TOKEN);
        txn.write_u32(dev_id);
        self.notify(DeviceCmd::RegDisplayRefreshCallback, txn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use display_ipc::host::loopback_channel;
    use display_ipc::{Responder, Wait};
    use std::thread;

    #[test]
    fn hotplug_notification_carries_header_and_payload() {
        let (caller, responder) = loopback_channel();
        let remote = CallbackRemote::new(Arc::new(caller));

        let server = thread::spawn(move || {
            let (cmd, frame) = responder.recv(Wait::Blocking).unwrap();
            responder.reply(0, &[]).unwrap();
            (cmd, frame)
        });
        remote.hotplug(2, true);

        let (cmd, frame) = server.join().unwrap();
        assert_eq!(cmd, DeviceCmd::RegHotPlugCallback.raw());
        let mut txn = Transaction::from_bytes(frame);
        txn.check_header().unwrap();
        assert_eq!(txn.read_u32().unwrap(), 2);
        assert!(txn.read_bool().unwrap());
    }

    #[test]
    fn failed_send_is_dropped_silently() {
        let (caller, responder) = loopback_channel();
        drop(responder);
        let remote = CallbackRemote::new(Arc::new(caller));
        // Must not panic or block.
        remote.refresh(0);
        remote.vblank(1, 16_666_667);
    }
}
