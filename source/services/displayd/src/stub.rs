// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Server stub: command lookup and per-operation handlers.
//!
//! An incoming id splits into `(cmd >> 16) & 0xF` and `cmd & 0xFF`, which
//! index a fixed 3×50 table of handler pointers. Empty slots answer
//! `NotSupported`; a handler decodes the request in the proxy's write
//! order, calls the backend, and encodes the reply. The backend's real
//! status always travels back — handlers never flatten failures into
//! success.

use std::sync::Arc;

use parking_lot::Mutex;

use display_ipc::{CallError, Caller, Responder, Wait};
use display_wire::cmd::{FUNC_NUM_MAX, FUNC_TYPE_MAX};
use display_wire::{
    BlendMode, CompositionType, DispError, DispResult, PowerStatus, Rect, Transaction,
    TransformMode, WireError, ARRAY_COUNT_MAX, STATUS_SUCCESS,
};

use crate::backend::DeviceBackend;
use crate::callback::CallbackRemote;

type Handler = fn(&ServerStub, &mut Transaction, &mut Transaction) -> DispResult<()>;

/// Dispatches remote requests into a [`DeviceBackend`].
pub struct ServerStub {
    backend: Box<dyn DeviceBackend>,
    callback: Mutex<CallbackState>,
}

#[derive(Default)]
struct CallbackState {
    /// Channel the service wiring attached; not yet trusted for delivery.
    attached: Option<Arc<dyn Caller>>,
    /// Channel promoted by `SetProxyRemoteCallback`; events flow here.
    active: Option<Arc<CallbackRemote>>,
}

impl ServerStub {
    /// Wraps a backend.
    pub fn new(backend: Box<dyn DeviceBackend>) -> Self {
        ServerStub {
            backend,
            callback: Mutex::new(CallbackState::default()),
        }
    }

    /// Attaches the server→client channel. The channel stays dormant until
    /// the client sends `SetProxyRemoteCallback`.
    pub fn attach_callback_channel(&self, transport: Box<dyn Caller>) {
        self.callback.lock().attached = Some(Arc::from(transport));
    }

    /// Entry point for one request: returns `(status, reply bytes)`.
    pub fn on_remote_request(&self, cmd: u32, request: &[u8]) -> (i32, Vec<u8>) {
        if !self.backend.is_valid() {
            return (DispError::NoDevice.code(), Vec::new());
        }
        let ty = ((cmd >> 16) & 0xF) as usize;
        let num = (cmd & 0xFF) as usize;
        let slot = if ty < FUNC_TYPE_MAX && num < FUNC_NUM_MAX {
            DISPATCH[ty][num]
        } else {
            None
        };
        let Some(handler) = slot else {
            log::warn!("unhandled command {cmd:#x}");
            return (DispError::NotSupported.code(), Vec::new());
        };
        let mut data = Transaction::from_bytes(request.to_vec());
        let mut reply = Transaction::new();
        match handler(self, &mut data, &mut reply) {
            Ok(()) => (STATUS_SUCCESS, reply.into_bytes()),
            Err(err) => {
                log::debug!("command {cmd:#x} failed: {err}");
                (err.code(), Vec::new())
            }
        }
    }

    /// Drains `transport` until it disconnects.
    pub fn serve(&self, transport: &dyn Responder) -> display_ipc::Result<()> {
        loop {
            match transport.recv(Wait::Blocking) {
                Ok((cmd, request)) => {
                    let (status, reply) = self.on_remote_request(cmd, &request);
                    transport.reply(status, &reply)?;
                }
                Err(CallError::Disconnected) => return Ok(()),
                Err(err) => return Err(err),
            }
        }
    }

    fn backend(&self) -> &dyn DeviceBackend {
        self.backend.as_ref()
    }

    /// The promoted callback remote, or `InvalidObject` when the client has
    /// not armed the channel.
    fn event_sink(&self) -> DispResult<Arc<CallbackRemote>> {
        self.callback
            .lock()
            .active
            .clone()
            .ok_or(DispError::InvalidObject)
    }

    fn promote_callback(&self) -> DispResult<()> {
        let mut state = self.callback.lock();
        let Some(attached) = state.attached.clone() else {
            return Err(DispError::InvalidObject);
        };
        state.active = Some(Arc::new(CallbackRemote::new(attached)));
        Ok(())
    }
}

const fn invalid_row() -> [Option<Handler>; FUNC_NUM_MAX] {
    [None; FUNC_NUM_MAX]
}

const fn device_row() -> [Option<Handler>; FUNC_NUM_MAX] {
    let mut row: [Option<Handler>; FUNC_NUM_MAX] = [None; FUNC_NUM_MAX];
    row[0x03] = Some(handlers::reg_hot_plug_callback);
    row[0x04] = Some(handlers::get_display_capability);
    row[0x05] = Some(handlers::get_display_supported_modes);
    row[0x06] = Some(handlers::get_display_mode);
    row[0x07] = Some(handlers::set_display_mode);
    row[0x08] = Some(handlers::get_display_power_status);
    row[0x09] = Some(handlers::set_display_power_status);
    row[0x0A] = Some(handlers::get_display_backlight);
    row[0x0B] = Some(handlers::set_display_backlight);
    row[0x0C] = Some(handlers::get_display_property);
    row[0x0D] = Some(handlers::set_display_property);
    row[0x0E] = Some(handlers::prepare_display_layers);
    row[0x10] = Some(handlers::get_display_comp_change);
    row[0x12] = Some(handlers::set_display_client_crop);
    row[0x13] = Some(handlers::set_display_client_dest_rect);
    row[0x14] = Some(handlers::set_display_client_buffer);
    row[0x15] = Some(handlers::set_display_client_damage);
    row[0x16] = Some(handlers::set_display_vsync_enabled);
    row[0x19] = Some(handlers::reg_display_vblank_callback);
    row[0x1B] = Some(handlers::get_display_release_fence);
    row[0x1C] = Some(handlers::commit);
    row[0x1D] = Some(handlers::not_supported);
    row[0x1E] = Some(handlers::create_virtual_display);
    row[0x1F] = Some(handlers::destroy_virtual_display);
    row[0x20] = Some(handlers::set_virtual_display_buffer);
    row[0x21] = Some(handlers::reg_display_refresh_callback);
    row[0x22] = Some(handlers::not_supported);
    row[0x23] = Some(handlers::not_supported);
    row[0x24] = Some(handlers::not_supported);
    row[0x25] = Some(handlers::set_proxy_remote_callback);
    row
}

const fn layer_row() -> [Option<Handler>; FUNC_NUM_MAX] {
    let mut row: [Option<Handler>; FUNC_NUM_MAX] = [None; FUNC_NUM_MAX];
    row[0x03] = Some(handlers::create_layer);
    row[0x05] = Some(handlers::set_layer_visible);
    row[0x06] = Some(handlers::get_layer_visible_state);
    row[0x09] = Some(handlers::set_layer_crop);
    row[0x0A] = Some(handlers::set_layer_zorder);
    row[0x0B] = Some(handlers::get_layer_zorder);
    row[0x0C] = Some(handlers::set_layer_pre_multi);
    row[0x0D] = Some(handlers::get_layer_pre_multi);
    row[0x0E] = Some(handlers::set_layer_alpha);
    row[0x0F] = Some(handlers::get_layer_alpha);
    row[0x10] = Some(handlers::set_layer_color_key);
    row[0x11] = Some(handlers::get_layer_color_key);
    row[0x12] = Some(handlers::set_layer_palette);
    row[0x13] = Some(handlers::get_layer_palette);
    row[0x15] = Some(handlers::set_layer_compression);
    row[0x16] = Some(handlers::get_layer_compression);
    row[0x18] = Some(handlers::flush);
    row[0x19] = Some(handlers::set_layer_visible_region);
    row[0x1A] = Some(handlers::set_layer_dirty_region);
    row[0x1B] = Some(handlers::get_layer_buffer);
    row[0x1C] = Some(handlers::set_layer_buffer);
    row[0x1D] = Some(handlers::not_supported);
    row[0x1E] = Some(handlers::set_layer_composition_type);
    row[0x20] = Some(handlers::init_display);
    row[0x21] = Some(handlers::deinit_display);
    row[0x22] = Some(handlers::get_display_info);
    row[0x23] = Some(handlers::close_layer);
    row[0x24] = Some(handlers::set_layer_size);
    row[0x25] = Some(handlers::get_layer_size);
    row[0x26] = Some(handlers::set_transform_mode);
    row[0x27] = Some(handlers::wait_for_vblank);
    row[0x28] = Some(handlers::snap_shot);
    row[0x29] = Some(handlers::set_layer_blend_type);
    row
}

static DISPATCH: [[Option<Handler>; FUNC_NUM_MAX]; FUNC_TYPE_MAX] =
    [invalid_row(), device_row(), layer_row()];

fn check_header(data: &mut Transaction) -> DispResult<()> {
    data.check_header().map_err(|err| {
        log::warn!("request header rejected: {err}");
        DispError::Param
    })
}

fn decode<T>(result: Result<T, WireError>) -> DispResult<T> {
    result.map_err(|err| {
        log::warn!("request decode failed: {err}");
        DispError::Param
    })
}

fn check_count(count: u32) -> DispResult<()> {
    if count == 0 || count > ARRAY_COUNT_MAX {
        return Err(DispError::Param);
    }
    Ok(())
}

mod handlers {
    use super::*;

    pub(super) fn not_supported(
        _stub: &ServerStub,
        _data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    // --- callbacks --------------------------------------------------------

    pub(super) fn set_proxy_remote_callback(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        stub.promote_callback()
    }

    pub(super) fn reg_hot_plug_callback(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let sink = stub.event_sink()?;
        stub.backend().reg_hotplug(sink)
    }

    pub(super) fn reg_display_vblank_callback(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let sink = stub.event_sink()?;
        let dev_id = decode(data.read_u32())?;
        stub.backend().reg_vblank(dev_id, sink)
    }

    pub(super) fn reg_display_refresh_callback(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let sink = stub.event_sink()?;
        let dev_id = decode(data.read_u32())?;
        stub.backend().reg_refresh(dev_id, sink)
    }

    // --- device scope -----------------------------------------------------

    pub(super) fn get_display_capability(
        stub: &ServerStub,
        data: &mut Transaction,
        reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let cap = stub.backend().get_display_capability(dev_id)?;
        reply.write_pod(&cap);
        Ok(())
    }

    pub(super) fn get_display_supported_modes(
        stub: &ServerStub,
        data: &mut Transaction,
        reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let max = decode(data.read_i32())?;
        if max <= 0 {
            return Err(DispError::Param);
        }
        check_count(max as u32)?;
        let modes = stub.backend().get_display_supported_modes(dev_id, max as u32)?;
        if modes.len() > max as usize {
            return Err(DispError::Failure);
        }
        reply.write_u32(modes.len() as u32);
        if !modes.is_empty() {
            reply.write_pod_slice(&modes).map_err(|_| DispError::Failure)?;
        }
        Ok(())
    }

    pub(super) fn get_display_mode(
        stub: &ServerStub,
        data: &mut Transaction,
        reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let mode_id = stub.backend().get_display_mode(dev_id)?;
        reply.write_u32(mode_id);
        Ok(())
    }

    pub(super) fn set_display_mode(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let mode_id = decode(data.read_u32())?;
        stub.backend().set_display_mode(dev_id, mode_id)
    }

    pub(super) fn get_display_power_status(
        stub: &ServerStub,
        data: &mut Transaction,
        reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let status = stub.backend().get_display_power_status(dev_id)?;
        reply.write_u32(status.to_wire());
        Ok(())
    }

    pub(super) fn set_display_power_status(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let status = decode(data.read_u32().and_then(PowerStatus::from_wire))?;
        stub.backend().set_display_power_status(dev_id, status)
    }

    pub(super) fn get_display_backlight(
        stub: &ServerStub,
        data: &mut Transaction,
        reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let level = stub.backend().get_display_backlight(dev_id)?;
        reply.write_u32(level);
        Ok(())
    }

    pub(super) fn set_display_backlight(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let level = decode(data.read_u32())?;
        stub.backend().set_display_backlight(dev_id, level)
    }

    pub(super) fn get_display_property(
        stub: &ServerStub,
        data: &mut Transaction,
        reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let prop_id = decode(data.read_u32())?;
        let value = stub.backend().get_display_property(dev_id, prop_id)?;
        reply.write_u64(value);
        Ok(())
    }

    pub(super) fn set_display_property(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let prop_id = decode(data.read_u32())?;
        let value = decode(data.read_u64())?;
        stub.backend().set_display_property(dev_id, prop_id, value)
    }

    pub(super) fn prepare_display_layers(
        stub: &ServerStub,
        data: &mut Transaction,
        reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let need_flush = stub.backend().prepare_display_layers(dev_id)?;
        reply.write_bool(need_flush);
        Ok(())
    }

    pub(super) fn get_display_comp_change(
        stub: &ServerStub,
        data: &mut Transaction,
        reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let (layers, types) = stub.backend().get_display_comp_change(dev_id)?;
        if layers.len() != types.len() || layers.len() > ARRAY_COUNT_MAX as usize {
            return Err(DispError::Failure);
        }
        reply.write_u32(layers.len() as u32);
        if !layers.is_empty() {
            reply.write_u32_slice(&layers).map_err(|_| DispError::Failure)?;
            let raw: Vec<u32> = types.iter().map(|t| t.to_wire()).collect();
            reply.write_u32_slice(&raw).map_err(|_| DispError::Failure)?;
        }
        Ok(())
    }

    pub(super) fn set_display_client_crop(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let rect = decode(data.read_pod::<Rect>())?;
        stub.backend().set_display_client_crop(dev_id, rect)
    }

    pub(super) fn set_display_client_dest_rect(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let rect = decode(data.read_pod::<Rect>())?;
        stub.backend().set_display_client_dest_rect(dev_id, rect)
    }

    pub(super) fn set_display_client_buffer(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let buffer = decode(data.read_buffer_handle())?;
        let fence = decode(data.read_fd())?;
        stub.backend().set_display_client_buffer(dev_id, buffer, fence)
    }

    pub(super) fn set_display_client_damage(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let count = decode(data.read_u32())?;
        check_count(count)?;
        let rects = decode(data.read_pod_vec::<Rect>(count))?;
        stub.backend().set_display_client_damage(dev_id, rects)
    }

    pub(super) fn set_display_vsync_enabled(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let enabled = decode(data.read_bool())?;
        stub.backend().set_display_vsync_enabled(dev_id, enabled)
    }

    pub(super) fn get_display_release_fence(
        stub: &ServerStub,
        data: &mut Transaction,
        reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let (layers, fences) = stub.backend().get_display_release_fence(dev_id)?;
        if layers.len() != fences.len() || layers.len() > ARRAY_COUNT_MAX as usize {
            return Err(DispError::Failure);
        }
        reply.write_u32(layers.len() as u32);
        if !layers.is_empty() {
            reply.write_u32_slice(&layers).map_err(|_| DispError::Failure)?;
            reply.write_fd_array(&fences);
        }
        Ok(())
    }

    pub(super) fn commit(
        stub: &ServerStub,
        data: &mut Transaction,
        reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let fence = stub.backend().commit(dev_id)?;
        reply.write_fd(fence);
        Ok(())
    }

    pub(super) fn create_virtual_display(
        stub: &ServerStub,
        data: &mut Transaction,
        reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let width = decode(data.read_u32())?;
        let height = decode(data.read_u32())?;
        let (format, dev_id) = stub.backend().create_virtual_display(width, height)?;
        reply.write_i32(format);
        reply.write_u32(dev_id);
        Ok(())
    }

    pub(super) fn destroy_virtual_display(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        stub.backend().destroy_virtual_display(dev_id)
    }

    pub(super) fn set_virtual_display_buffer(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let buffer = decode(data.read_buffer_handle())?;
        let fence = decode(data.read_fd())?;
        stub.backend().set_virtual_display_buffer(dev_id, buffer, fence)
    }

    // --- layer scope ------------------------------------------------------

    pub(super) fn create_layer(
        stub: &ServerStub,
        data: &mut Transaction,
        reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let info = decode(data.read_pod())?;
        let layer_id = stub.backend().create_layer(dev_id, info)?;
        reply.write_u32(layer_id);
        Ok(())
    }

    pub(super) fn close_layer(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        stub.backend().close_layer(dev_id, layer_id)
    }

    pub(super) fn set_layer_visible(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let visible = decode(data.read_bool())?;
        stub.backend().set_layer_visible(dev_id, layer_id, visible)
    }

    pub(super) fn get_layer_visible_state(
        stub: &ServerStub,
        data: &mut Transaction,
        reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let visible = stub.backend().get_layer_visible_state(dev_id, layer_id)?;
        reply.write_bool(visible);
        Ok(())
    }

    pub(super) fn set_layer_crop(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let rect = decode(data.read_pod::<Rect>())?;
        stub.backend().set_layer_crop(dev_id, layer_id, rect)
    }

    pub(super) fn set_layer_zorder(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let zorder = decode(data.read_u32())?;
        stub.backend().set_layer_zorder(dev_id, layer_id, zorder)
    }

    pub(super) fn get_layer_zorder(
        stub: &ServerStub,
        data: &mut Transaction,
        reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let zorder = stub.backend().get_layer_zorder(dev_id, layer_id)?;
        reply.write_u32(zorder);
        Ok(())
    }

    pub(super) fn set_layer_pre_multi(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let pre_mul = decode(data.read_bool())?;
        stub.backend().set_layer_pre_multi(dev_id, layer_id, pre_mul)
    }

    pub(super) fn get_layer_pre_multi(
        stub: &ServerStub,
        data: &mut Transaction,
        reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let pre_mul = stub.backend().get_layer_pre_multi(dev_id, layer_id)?;
        reply.write_bool(pre_mul);
        Ok(())
    }

    pub(super) fn set_layer_alpha(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let alpha = decode(data.read_pod())?;
        stub.backend().set_layer_alpha(dev_id, layer_id, alpha)
    }

    pub(super) fn get_layer_alpha(
        stub: &ServerStub,
        data: &mut Transaction,
        reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let alpha = stub.backend().get_layer_alpha(dev_id, layer_id)?;
        reply.write_pod(&alpha);
        Ok(())
    }

    pub(super) fn set_layer_color_key(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let enable = decode(data.read_bool())?;
        let key = decode(data.read_u32())?;
        stub.backend().set_layer_color_key(dev_id, layer_id, enable, key)
    }

    pub(super) fn get_layer_color_key(
        stub: &ServerStub,
        data: &mut Transaction,
        reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let (enable, key) = stub.backend().get_layer_color_key(dev_id, layer_id)?;
        reply.write_bool(enable);
        reply.write_u32(key);
        Ok(())
    }

    pub(super) fn set_layer_palette(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let count = decode(data.read_u32())?;
        check_count(count)?;
        let palette = decode(data.read_u32_vec(count))?;
        stub.backend().set_layer_palette(dev_id, layer_id, palette)
    }

    pub(super) fn get_layer_palette(
        stub: &ServerStub,
        data: &mut Transaction,
        reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let max = decode(data.read_u32())?;
        check_count(max)?;
        let palette = stub.backend().get_layer_palette(dev_id, layer_id, max)?;
        if palette.len() > max as usize {
            return Err(DispError::Failure);
        }
        reply.write_u32(palette.len() as u32);
        if !palette.is_empty() {
            reply.write_u32_slice(&palette).map_err(|_| DispError::Failure)?;
        }
        Ok(())
    }

    pub(super) fn set_layer_compression(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let level = decode(data.read_i32())?;
        stub.backend().set_layer_compression(dev_id, layer_id, level)
    }

    pub(super) fn get_layer_compression(
        stub: &ServerStub,
        data: &mut Transaction,
        reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let level = stub.backend().get_layer_compression(dev_id, layer_id)?;
        reply.write_i32(level);
        Ok(())
    }

    pub(super) fn flush(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let buffer = decode(data.read_layer_buffer())?;
        stub.backend().flush(dev_id, layer_id, buffer)
    }

    pub(super) fn set_layer_visible_region(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let count = decode(data.read_u32())?;
        check_count(count)?;
        let rects = decode(data.read_pod_vec::<Rect>(count))?;
        stub.backend().set_layer_visible_region(dev_id, layer_id, rects)
    }

    pub(super) fn set_layer_dirty_region(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let rect = decode(data.read_pod::<Rect>())?;
        stub.backend().set_layer_dirty_region(dev_id, layer_id, rect)
    }

    pub(super) fn get_layer_buffer(
        stub: &ServerStub,
        data: &mut Transaction,
        reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let buffer = stub.backend().get_layer_buffer(dev_id, layer_id)?;
        reply.write_layer_buffer(&buffer).map_err(|_| DispError::Failure)?;
        Ok(())
    }

    pub(super) fn set_layer_buffer(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let buffer = decode(data.read_layer_buffer())?;
        stub.backend().set_layer_buffer(dev_id, layer_id, buffer)
    }

    pub(super) fn set_layer_composition_type(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let kind = decode(data.read_u32().and_then(CompositionType::from_wire))?;
        stub.backend().set_layer_composition_type(dev_id, layer_id, kind)
    }

    pub(super) fn init_display(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        stub.backend().init_display(dev_id)
    }

    pub(super) fn deinit_display(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        stub.backend().deinit_display(dev_id)
    }

    pub(super) fn get_display_info(
        stub: &ServerStub,
        data: &mut Transaction,
        reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let info = stub.backend().get_display_info(dev_id)?;
        reply.write_pod(&info);
        Ok(())
    }

    pub(super) fn set_layer_size(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let rect = decode(data.read_pod::<Rect>())?;
        stub.backend().set_layer_size(dev_id, layer_id, rect)
    }

    pub(super) fn get_layer_size(
        stub: &ServerStub,
        data: &mut Transaction,
        reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let rect = stub.backend().get_layer_size(dev_id, layer_id)?;
        reply.write_pod(&rect);
        Ok(())
    }

    pub(super) fn set_transform_mode(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let mode = decode(data.read_u32().and_then(TransformMode::from_wire))?;
        stub.backend().set_transform_mode(dev_id, layer_id, mode)
    }

    pub(super) fn wait_for_vblank(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let timeout_ms = decode(data.read_i32())?;
        stub.backend().wait_for_vblank(dev_id, layer_id, timeout_ms)
    }

    pub(super) fn snap_shot(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let buffer = decode(data.read_buffer_handle())?;
        stub.backend().snap_shot(dev_id, buffer)
    }

    pub(super) fn set_layer_blend_type(
        stub: &ServerStub,
        data: &mut Transaction,
        _reply: &mut Transaction,
    ) -> DispResult<()> {
        check_header(data)?;
        let dev_id = decode(data.read_u32())?;
        let layer_id = decode(data.read_u32())?;
        let blend = decode(data.read_u32().and_then(BlendMode::from_wire))?;
        stub.backend().set_layer_blend_type(dev_id, layer_id, blend)
    }
}
