// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Loopback end-to-end tests: client proxy ↔ server stub
//! OWNERS: @runtime
//!
//! TEST_SCOPE:
//!   - Request/reply round trips carry real values both ways
//!   - Backend statuses travel to the client unflattened
//!   - Server-side bounds hold even against a hand-rolled client
//!   - Callback channel: arming, InvalidObject, event delivery

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use display_client::{DisplayConnection, DisplayEventListener, ProxyError};
use display_ipc::host::loopback_channel;
use display_ipc::{Caller, Wait};
use display_wire::{
    DeviceCmd, DispError, DispResult, DisplayCapability, DisplayModeInfo, InterfaceType,
    Transaction, INTERFACE_TOKEN,
};
use displayd::{DeviceBackend, EventSink, ServerStub};

#[derive(Default)]
struct Inner {
    mode_calls: AtomicU32,
    backlight: Mutex<HashMap<u32, u32>>,
    layers: Mutex<HashMap<u32, bool>>,
    next_layer: AtomicU32,
    hotplug_sink: Mutex<Option<Arc<dyn EventSink>>>,
    vblank_sink: Mutex<Option<Arc<dyn EventSink>>>,
    refresh_sink: Mutex<Option<Arc<dyn EventSink>>>,
}

/// In-memory composer standing in for hardware.
#[derive(Clone, Default)]
struct FakeComposer(Arc<Inner>);

impl FakeComposer {
    fn fire_hotplug(&self, dev_id: u32, connected: bool) {
        if let Some(sink) = self.0.hotplug_sink.lock().clone() {
            sink.hotplug(dev_id, connected);
        }
    }

    fn fire_vblank(&self, sequence: u32, ns: u64) {
        if let Some(sink) = self.0.vblank_sink.lock().clone() {
            sink.vblank(sequence, ns);
        }
    }

    fn fire_refresh(&self, dev_id: u32) {
        if let Some(sink) = self.0.refresh_sink.lock().clone() {
            sink.refresh(dev_id);
        }
    }
}

impl DeviceBackend for FakeComposer {
    fn reg_hotplug(&self, sink: Arc<dyn EventSink>) -> DispResult<()> {
        *self.0.hotplug_sink.lock() = Some(sink);
        Ok(())
    }

    fn reg_vblank(&self, _dev_id: u32, sink: Arc<dyn EventSink>) -> DispResult<()> {
        *self.0.vblank_sink.lock() = Some(sink);
        Ok(())
    }

    fn reg_refresh(&self, _dev_id: u32, sink: Arc<dyn EventSink>) -> DispResult<()> {
        *self.0.refresh_sink.lock() = Some(sink);
        Ok(())
    }

    fn get_display_capability(&self, dev_id: u32) -> DispResult<DisplayCapability> {
        if dev_id != 0 {
            return Err(DispError::NoDevice);
        }
        Ok(DisplayCapability {
            name: "fake-panel".into(),
            interface_type: InterfaceType::Mipi,
            phy_width: 1080,
            phy_height: 2400,
            supported_layers: 4,
            virtual_disp_count: 0,
            support_write_back: false,
            property_count: 0,
        })
    }

    fn get_display_supported_modes(
        &self,
        _dev_id: u32,
        _max: u32,
    ) -> DispResult<Vec<DisplayModeInfo>> {
        self.0.mode_calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![DisplayModeInfo {
            width: 1080,
            height: 2400,
            refresh_rate: 120,
            id: 0,
        }])
    }

    fn get_display_backlight(&self, dev_id: u32) -> DispResult<u32> {
        self.0
            .backlight
            .lock()
            .get(&dev_id)
            .copied()
            .ok_or(DispError::NoDevice)
    }

    fn set_display_backlight(&self, dev_id: u32, level: u32) -> DispResult<()> {
        self.0.backlight.lock().insert(dev_id, level);
        Ok(())
    }

    fn create_layer(&self, _dev_id: u32, _info: display_wire::LayerInfo) -> DispResult<u32> {
        let id = self.0.next_layer.fetch_add(1, Ordering::SeqCst);
        self.0.layers.lock().insert(id, true);
        Ok(id)
    }

    fn close_layer(&self, _dev_id: u32, layer_id: u32) -> DispResult<()> {
        self.0
            .layers
            .lock()
            .remove(&layer_id)
            .map(|_| ())
            .ok_or(DispError::Param)
    }

    fn set_layer_visible(&self, _dev_id: u32, layer_id: u32, visible: bool) -> DispResult<()> {
        match self.0.layers.lock().get_mut(&layer_id) {
            Some(v) => {
                *v = visible;
                Ok(())
            }
            None => Err(DispError::Param),
        }
    }

    fn get_layer_visible_state(&self, _dev_id: u32, layer_id: u32) -> DispResult<bool> {
        self.0
            .layers
            .lock()
            .get(&layer_id)
            .copied()
            .ok_or(DispError::Param)
    }

    fn commit(&self, dev_id: u32) -> DispResult<i32> {
        if dev_id != 0 {
            return Err(DispError::NoDevice);
        }
        Ok(-1)
    }
}

/// Spins a served stub up; tears it down when the returned connection drops.
fn serve(backend: FakeComposer) -> (DisplayConnection, Arc<ServerStub>, thread::JoinHandle<()>) {
    let stub = Arc::new(ServerStub::new(Box::new(backend)));
    let (caller, responder) = loopback_channel();
    let serving = stub.clone();
    let server = thread::spawn(move || {
        serving.serve(&responder).unwrap();
    });
    (
        DisplayConnection::connect(Box::new(caller)),
        stub,
        server,
    )
}

#[derive(Default)]
struct RecordingListener {
    hotplugs: Mutex<Vec<(u32, bool)>>,
    vblanks: Mutex<Vec<(u32, u64)>>,
    refreshes: Mutex<Vec<u32>>,
}

impl DisplayEventListener for RecordingListener {
    fn on_hotplug(&self, dev_id: u32, connected: bool) {
        self.hotplugs.lock().push((dev_id, connected));
    }

    fn on_vblank(&self, sequence: u32, ns: u64) {
        self.vblanks.lock().push((sequence, ns));
    }

    fn on_refresh(&self, dev_id: u32) {
        self.refreshes.lock().push(dev_id);
    }
}

#[test]
fn capability_round_trip() {
    let backend = FakeComposer::default();
    let (conn, _stub, server) = serve(backend.clone());

    let cap = conn.get_display_capability(0).unwrap();
    assert_eq!(cap.name, "fake-panel");
    assert_eq!(cap.interface_type, InterfaceType::Mipi);
    assert_eq!(cap.phy_width, 1080);
    assert_eq!(cap.supported_layers, 4);

    drop(conn);
    server.join().unwrap();
}

#[test]
fn backend_status_travels_unflattened() {
    let backend = FakeComposer::default();
    let (conn, _stub, server) = serve(backend);

    assert_eq!(
        conn.get_display_capability(1),
        Err(ProxyError::Remote(DispError::NoDevice))
    );
    assert_eq!(
        conn.commit(2),
        Err(ProxyError::Remote(DispError::NoDevice))
    );
    // An operation the backend does not implement at all.
    assert_eq!(
        conn.get_display_mode(0),
        Err(ProxyError::Remote(DispError::NotSupported))
    );

    drop(conn);
    server.join().unwrap();
}

#[test]
fn backlight_state_round_trips() {
    let backend = FakeComposer::default();
    let (conn, _stub, server) = serve(backend);

    conn.set_display_backlight(0, 180).unwrap();
    assert_eq!(conn.get_display_backlight(0).unwrap(), 180);
    assert_eq!(
        conn.get_display_backlight(1),
        Err(ProxyError::Remote(DispError::NoDevice))
    );

    drop(conn);
    server.join().unwrap();
}

#[test]
fn layer_lifecycle_round_trips() {
    let backend = FakeComposer::default();
    let (conn, _stub, server) = serve(backend);

    let info = display_wire::LayerInfo {
        width: 256,
        height: 256,
        layer_type: display_wire::LayerType::Graphic,
        bpp: 32,
        pixel_format: display_wire::PixelFormat::Rgba8888,
    };
    let layer = conn.create_layer(0, &info).unwrap();
    assert!(conn.get_layer_visible_state(0, layer).unwrap());
    conn.set_layer_visible(0, layer, false).unwrap();
    assert!(!conn.get_layer_visible_state(0, layer).unwrap());
    conn.close_layer(0, layer).unwrap();
    assert_eq!(
        conn.close_layer(0, layer),
        Err(ProxyError::Remote(DispError::Param))
    );

    drop(conn);
    server.join().unwrap();
}

#[test]
fn oversized_mode_capacity_rejected_before_backend() {
    let backend = FakeComposer::default();
    let stub = Arc::new(ServerStub::new(Box::new(backend.clone())));
    let (caller, responder) = loopback_channel();
    let serving = stub.clone();
    let server = thread::spawn(move || serving.serve(&responder).unwrap());

    // Hand-rolled request claiming capacity for 300 modes; the well-behaved
    // proxy would have refused to send this.
    let mut req = Transaction::begin_request(INTERFACE_TOKEN);
    req.write_u32(0);
    req.write_i32(300);
    let got = caller.call(DeviceCmd::GetDisplaySupportedModes.raw(), req.as_bytes());
    assert_eq!(
        got,
        Err(display_ipc::CallError::Failure(DispError::Param.code()))
    );
    assert_eq!(backend.0.mode_calls.load(Ordering::SeqCst), 0);

    drop(caller);
    server.join().unwrap();
}

#[test]
fn unarmed_callback_registration_is_invalid_object() {
    let backend = FakeComposer::default();
    let (conn, _stub, server) = serve(backend);

    // No callback channel was attached server-side, so arming fails.
    let listener = Arc::new(RecordingListener::default());
    assert_eq!(
        conn.register_hotplug_listener(listener),
        Err(ProxyError::Remote(DispError::InvalidObject))
    );

    drop(conn);
    server.join().unwrap();
}

#[test]
fn events_flow_through_the_callback_channel() {
    let backend = FakeComposer::default();
    let (conn, stub, server) = serve(backend.clone());

    // Reverse-direction channel: server calls, client responds.
    let (cb_caller, cb_responder) = loopback_channel();
    stub.attach_callback_channel(Box::new(cb_caller));
    let listener = Arc::new(RecordingListener::default());
    let cb_stub = conn.callback_stub(Box::new(cb_responder));

    conn.register_hotplug_listener(listener.clone()).unwrap();
    conn.register_vblank_listener(0, listener.clone()).unwrap();
    conn.register_refresh_listener(0, listener.clone()).unwrap();

    let pump = thread::spawn(move || {
        for _ in 0..3 {
            assert!(cb_stub.poll(Wait::Blocking).unwrap());
        }
    });
    backend.fire_hotplug(0, true);
    backend.fire_vblank(7, 16_666_667);
    backend.fire_refresh(0);
    pump.join().unwrap();

    assert_eq!(listener.hotplugs.lock().as_slice(), &[(0, true)]);
    assert_eq!(listener.vblanks.lock().as_slice(), &[(7, 16_666_667)]);
    assert_eq!(listener.refreshes.lock().as_slice(), &[0]);

    drop(conn);
    server.join().unwrap();
}

#[test]
fn write_back_operations_answer_not_supported() {
    let backend = FakeComposer::default();
    let (conn, _stub, server) = serve(backend);

    assert_eq!(
        conn.create_write_back(640, 480),
        Err(ProxyError::Remote(DispError::NotSupported))
    );
    assert_eq!(
        conn.destroy_write_back(0),
        Err(ProxyError::Remote(DispError::NotSupported))
    );

    drop(conn);
    server.join().unwrap();
}
