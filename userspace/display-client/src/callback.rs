// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Inbound event channel: listener interface, registration table, and the
//! stub that pumps notifications off the reverse-direction transport.
//!
//! Notifications reuse the registration command ids; that id reuse is part
//! of the wire contract. A notification that fails to decode is logged and
//! dropped — events are edge signals, there is nothing to retry.

use std::sync::Arc;

use parking_lot::Mutex;

use display_ipc::{CallError, Responder, Wait};
use display_wire::{DeviceCmd, DispError, Transaction, STATUS_SUCCESS};

/// Receiver interface for display events. Implementations must tolerate
/// being called from the callback pump thread.
pub trait DisplayEventListener: Send + Sync {
    /// A display connected (`true`) or disconnected (`false`).
    fn on_hotplug(&self, dev_id: u32, connected: bool);

    /// A vertical blank happened; `ns` is the timestamp of the blank.
    fn on_vblank(&self, sequence: u32, ns: u64);

    /// The device asks the client to redraw.
    fn on_refresh(&self, dev_id: u32);
}

/// Listener slots shared between the connection (which registers) and the
/// callback stub (which dispatches). Registration is last-writer-wins.
#[derive(Default)]
pub(crate) struct ListenerTable {
    hotplug: Mutex<Option<Arc<dyn DisplayEventListener>>>,
    vblank: Mutex<Option<Arc<dyn DisplayEventListener>>>,
    refresh: Mutex<Option<Arc<dyn DisplayEventListener>>>,
}

impl ListenerTable {
    pub(crate) fn set_hotplug(&self, l: Arc<dyn DisplayEventListener>) {
        *self.hotplug.lock() = Some(l);
    }

    pub(crate) fn set_vblank(&self, l: Arc<dyn DisplayEventListener>) {
        *self.vblank.lock() = Some(l);
    }

    pub(crate) fn set_refresh(&self, l: Arc<dyn DisplayEventListener>) {
        *self.refresh.lock() = Some(l);
    }

    fn hotplug(&self) -> Option<Arc<dyn DisplayEventListener>> {
        self.hotplug.lock().clone()
    }

    fn vblank(&self) -> Option<Arc<dyn DisplayEventListener>> {
        self.vblank.lock().clone()
    }

    fn refresh(&self) -> Option<Arc<dyn DisplayEventListener>> {
        self.refresh.lock().clone()
    }
}

/// Pumps inbound notifications and routes them to registered listeners.
///
/// Obtained from [`crate::DisplayConnection::callback_stub`]; typically
/// driven on its own thread via [`CallbackStub::run`].
pub struct CallbackStub {
    listeners: Arc<ListenerTable>,
    transport: Box<dyn Responder>,
}

impl CallbackStub {
    pub(crate) fn new(listeners: Arc<ListenerTable>, transport: Box<dyn Responder>) -> Self {
        CallbackStub {
            listeners,
            transport,
        }
    }

    /// Waits for one notification and dispatches it. Returns `Ok(true)`
    /// after dispatching, `Ok(false)` when `wait` expired without a frame.
    pub fn poll(&self, wait: Wait) -> Result<bool, CallError> {
        let (cmd, frame) = match self.transport.recv(wait) {
            Ok(pair) => pair,
            Err(CallError::WouldBlock) | Err(CallError::Timeout) => return Ok(false),
            Err(err) => return Err(err),
        };
        let status = self.dispatch(cmd, frame);
        self.transport.reply(status, &[])?;
        Ok(true)
    }

    /// Pumps notifications until the channel disconnects.
    pub fn run(&self) {
        loop {
            match self.poll(Wait::Blocking) {
                Ok(_) => {}
                Err(CallError::Disconnected) => return,
                Err(err) => {
                    log::warn!("callback channel error: {err}");
                    return;
                }
            }
        }
    }

    fn dispatch(&self, cmd: u32, frame: Vec<u8>) -> i32 {
        match self.decode_and_invoke(cmd, frame) {
            Ok(()) => STATUS_SUCCESS,
            Err(status) => {
                log::warn!("dropping notification {cmd:#x}: status {}", status.code());
                status.code()
            }
        }
    }

    fn decode_and_invoke(&self, cmd: u32, frame: Vec<u8>) -> Result<(), DispError> {
        let mut txn = Transaction::from_bytes(frame);
        txn.check_header().map_err(|_| DispError::Param)?;
        match cmd {
            c if c == DeviceCmd::RegHotPlugCallback.raw() => {
                let dev_id = txn.read_u32().map_err(|_| DispError::Failure)?;
                let connected = txn.read_bool().map_err(|_| DispError::Failure)?;
                if let Some(l) = self.listeners.hotplug() {
                    l.on_hotplug(dev_id, connected);
                }
                Ok(())
            }
            c if c == DeviceCmd::RegDisplayVBlankCallback.raw() => {
                let sequence = txn.read_u32().map_err(|_| DispError::Failure)?;
                let ns = txn.read_u64().map_err(|_| DispError::Failure)?;
                if let Some(l) = self.listeners.vblank() {
                    l.on_vblank(sequence, ns);
                }
                Ok(())
            }
            c if c == DeviceCmd::RegDisplayRefreshCallback.raw() => {
                let dev_id = txn.read_u32().map_err(|_| DispError::Failure)?;
                if let Some(l) = self.listeners.refresh() {
                    l.on_refresh(dev_id);
                }
                Ok(())
            }
            _ => Err(DispError::NotSupported),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use display_ipc::host::loopback_channel;
    use display_ipc::Caller;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;

    #[derive(Default)]
    struct CountingListener {
        hotplugs: AtomicU32,
        vblanks: AtomicU32,
    }

    impl DisplayEventListener for CountingListener {
        fn on_hotplug(&self, _dev_id: u32, _connected: bool) {
            self.hotplugs.fetch_add(1, Ordering::SeqCst);
        }

        fn on_vblank(&self, _sequence: u32, _ns: u64) {
            self.vblanks.fetch_add(1, Ordering::SeqCst);
        }

        fn on_refresh(&self, _dev_id: u32) {}
    }

    #[test]
    fn hotplug_notification_reaches_listener() {
        let listener = Arc::new(CountingListener::default());
        let table = Arc::new(ListenerTable::default());
        table.set_hotplug(listener.clone());

        let (caller, responder) = loopback_channel();
        let stub = CallbackStub::new(table, Box::new(responder));
        let pump = thread::spawn(move || stub.poll(Wait::Blocking));

        let mut txn = Transaction::begin_request(display_wire::INTERFACE_TOKEN);
        txn.write_u32(0);
        txn.write_bool(true);
        caller
            .call(DeviceCmd::RegHotPlugCallback.raw(), txn.as_bytes())
            .unwrap();

        assert!(pump.join().unwrap().unwrap());
        assert_eq!(listener.hotplugs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn malformed_notification_is_dropped_with_status() {
        let table = Arc::new(ListenerTable::default());
        let (caller, responder) = loopback_channel();
        let stub = CallbackStub::new(table, Box::new(responder));
        let pump = thread::spawn(move || stub.poll(Wait::Blocking));

        // No header at all.
        let got = caller.call(DeviceCmd::RegHotPlugCallback.raw(), b"junk");
        assert_eq!(got, Err(CallError::Failure(DispError::Param.code())));
        assert!(pump.join().unwrap().unwrap());
    }

    #[test]
    fn unknown_notification_id_is_rejected() {
        let table = Arc::new(ListenerTable::default());
        let (caller, responder) = loopback_channel();
        let stub = CallbackStub::new(table, Box::new(responder));
        let pump = thread::spawn(move || stub.poll(Wait::Blocking));

        let txn = Transaction::begin_request(display_wire::INTERFACE_TOKEN);
        let got = caller.call(DeviceCmd::Commit.raw(), txn.as_bytes());
        assert_eq!(
            got,
            Err(CallError::Failure(DispError::NotSupported.code()))
        );
        assert!(pump.join().unwrap().unwrap());
    }
}
