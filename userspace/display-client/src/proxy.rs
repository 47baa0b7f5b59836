// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! The display connection: one method per device/layer operation.
//!
//! Every method follows the same shape: validate arguments locally, build
//! the request in the agreed field order, invoke, decode the reply in the
//! stub's write order. A local validation failure returns before the
//! transport is touched.

use std::sync::Arc;

use parking_lot::Mutex;

use display_ipc::{Caller, Responder};
use display_wire::{
    BlendMode, BufferHandle, CompositionType, DeviceCmd, DisplayCapability, DisplayInfo,
    DisplayModeInfo, LayerAlpha, LayerBuffer, LayerCmd, LayerInfo, PowerStatus, Rect,
    TransformMode, Transaction, WireError, ARRAY_COUNT_MAX, INTERFACE_TOKEN, MAX_DEVICE_ID,
};

use crate::callback::{CallbackStub, DisplayEventListener, ListenerTable};
use crate::error::{ProxyError, Result};

/// A live connection to the display service.
///
/// Created per client via [`DisplayConnection::connect`]; there is no
/// process-global instance. Dropping (or calling [`DisplayConnection::close`])
/// tears the channel down.
pub struct DisplayConnection {
    caller: Box<dyn Caller>,
    listeners: Arc<ListenerTable>,
    callback_bound: Mutex<bool>,
}

impl DisplayConnection {
    /// Wraps a transport into a connection.
    pub fn connect(caller: Box<dyn Caller>) -> Self {
        DisplayConnection {
            caller,
            listeners: Arc::new(ListenerTable::default()),
            callback_bound: Mutex::new(false),
        }
    }

    /// Tears the connection down. Consuming `self` makes "use after close"
    /// unrepresentable.
    pub fn close(self) {}

    /// Builds the stub for the reverse-direction channel. The stub shares
    /// this connection's listener table, so listeners registered before or
    /// after the stub exists both receive events.
    pub fn callback_stub(&self, transport: Box<dyn Responder>) -> CallbackStub {
        CallbackStub::new(self.listeners.clone(), transport)
    }

    fn check_dev(&self, dev_id: u32) -> Result<()> {
        if dev_id > MAX_DEVICE_ID {
            return Err(ProxyError::Param);
        }
        Ok(())
    }

    fn check_count(&self, count: usize) -> Result<()> {
        if count == 0 || count > ARRAY_COUNT_MAX as usize {
            return Err(ProxyError::Param);
        }
        Ok(())
    }

    fn begin() -> Transaction {
        Transaction::begin_request(INTERFACE_TOKEN)
    }

    fn invoke(&self, cmd: u32, req: &Transaction) -> Result<Transaction> {
        let payload = self.caller.call(cmd, req.as_bytes())?;
        Ok(Transaction::from_bytes(payload))
    }

    /// Sends `SetProxyRemoteCallback` once per connection, promoting the
    /// channel the service wiring attached into the active callback remote.
    fn ensure_callback_channel(&self) -> Result<()> {
        let mut bound = self.callback_bound.lock();
        if *bound {
            return Ok(());
        }
        let req = Self::begin();
        self.invoke(DeviceCmd::SetProxyRemoteCallback.raw(), &req)?;
        *bound = true;
        Ok(())
    }

    // --- device scope -----------------------------------------------------

    /// Registers the hot-plug listener and arms the callback channel.
    pub fn register_hotplug_listener(
        &self,
        listener: Arc<dyn DisplayEventListener>,
    ) -> Result<()> {
        self.listeners.set_hotplug(listener);
        self.ensure_callback_channel()?;
        let req = Self::begin();
        self.invoke(DeviceCmd::RegHotPlugCallback.raw(), &req)?;
        Ok(())
    }

    /// Registers the vblank listener for one display. The callback channel
    /// must already be armed by a hot-plug registration.
    pub fn register_vblank_listener(
        &self,
        dev_id: u32,
        listener: Arc<dyn DisplayEventListener>,
    ) -> Result<()> {
        self.check_dev(dev_id)?;
        self.listeners.set_vblank(listener);
        let mut req = Self::begin();
        req.write_u32(dev_id);
        self.invoke(DeviceCmd::RegDisplayVBlankCallback.raw(), &req)?;
        Ok(())
    }

    /// Registers the refresh listener for one display.
    pub fn register_refresh_listener(
        &self,
        dev_id: u32,
        listener: Arc<dyn DisplayEventListener>,
    ) -> Result<()> {
        self.check_dev(dev_id)?;
        self.listeners.set_refresh(listener);
        let mut req = Self::begin();
        req.write_u32(dev_id);
        self.invoke(DeviceCmd::RegDisplayRefreshCallback.raw(), &req)?;
        Ok(())
    }

    /// Static capability description of one display.
    pub fn get_display_capability(&self, dev_id: u32) -> Result<DisplayCapability> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        let mut reply = self.invoke(DeviceCmd::GetDisplayCapability.raw(), &req)?;
        reply.read_pod::<DisplayCapability>().map_err(ProxyError::Decode)
    }

    /// Timings the display can drive; `max` declares the caller's capacity.
    pub fn get_display_supported_modes(
        &self,
        dev_id: u32,
        max: u32,
    ) -> Result<Vec<DisplayModeInfo>> {
        self.check_dev(dev_id)?;
        self.check_count(max as usize)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_i32(max as i32);
        let mut reply = self.invoke(DeviceCmd::GetDisplaySupportedModes.raw(), &req)?;
        let count = reply.read_u32().map_err(ProxyError::Decode)?;
        if count == 0 {
            return Ok(Vec::new());
        }
        if count > max {
            return Err(ProxyError::Param);
        }
        reply
            .read_pod_vec::<DisplayModeInfo>(count)
            .map_err(ProxyError::Decode)
    }

    /// Id of the active mode.
    pub fn get_display_mode(&self, dev_id: u32) -> Result<u32> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        let mut reply = self.invoke(DeviceCmd::GetDisplayMode.raw(), &req)?;
        reply.read_u32().map_err(ProxyError::Decode)
    }

    /// Switches the display to `mode_id`.
    pub fn set_display_mode(&self, dev_id: u32, mode_id: u32) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(mode_id);
        self.invoke(DeviceCmd::SetDisplayMode.raw(), &req)?;
        Ok(())
    }

    /// Current power state.
    pub fn get_display_power_status(&self, dev_id: u32) -> Result<PowerStatus> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        let mut reply = self.invoke(DeviceCmd::GetDisplayPowerStatus.raw(), &req)?;
        let raw = reply.read_u32().map_err(ProxyError::Decode)?;
        PowerStatus::from_wire(raw).map_err(ProxyError::Decode)
    }

    /// Requests a power state transition.
    pub fn set_display_power_status(&self, dev_id: u32, status: PowerStatus) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(status.to_wire());
        self.invoke(DeviceCmd::SetDisplayPowerStatus.raw(), &req)?;
        Ok(())
    }

    /// Current backlight level.
    pub fn get_display_backlight(&self, dev_id: u32) -> Result<u32> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        let mut reply = self.invoke(DeviceCmd::GetDisplayBacklight.raw(), &req)?;
        reply.read_u32().map_err(ProxyError::Decode)
    }

    /// Sets the backlight level.
    pub fn set_display_backlight(&self, dev_id: u32, level: u32) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(level);
        self.invoke(DeviceCmd::SetDisplayBacklight.raw(), &req)?;
        Ok(())
    }

    /// Reads one vendor property.
    pub fn get_display_property(&self, dev_id: u32, prop_id: u32) -> Result<u64> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(prop_id);
        let mut reply = self.invoke(DeviceCmd::GetDisplayProperty.raw(), &req)?;
        reply.read_u64().map_err(ProxyError::Decode)
    }

    /// Writes one vendor property.
    pub fn set_display_property(&self, dev_id: u32, prop_id: u32, value: u64) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(prop_id);
        req.write_u64(value);
        self.invoke(DeviceCmd::SetDisplayProperty.raw(), &req)?;
        Ok(())
    }

    /// Asks the device to plan composition for the pending frame; `true`
    /// means the client must compose into the client buffer.
    pub fn prepare_display_layers(&self, dev_id: u32) -> Result<bool> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        let mut reply = self.invoke(DeviceCmd::PrepareDisplayLayers.raw(), &req)?;
        reply.read_bool().map_err(ProxyError::Decode)
    }

    /// Layers whose composition type changed during
    /// [`Self::prepare_display_layers`], with their new types.
    pub fn get_display_comp_change(
        &self,
        dev_id: u32,
    ) -> Result<(Vec<u32>, Vec<CompositionType>)> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        let mut reply = self.invoke(DeviceCmd::GetDisplayCompChange.raw(), &req)?;
        let count = reply.read_u32().map_err(ProxyError::Decode)?;
        if count == 0 {
            return Ok((Vec::new(), Vec::new()));
        }
        let layers = reply.read_u32_vec(count).map_err(ProxyError::Decode)?;
        let raw_types = reply.read_u32_vec(count).map_err(ProxyError::Decode)?;
        let types = raw_types
            .into_iter()
            .map(CompositionType::from_wire)
            .collect::<core::result::Result<Vec<_>, WireError>>()
            .map_err(ProxyError::Decode)?;
        Ok((layers, types))
    }

    /// Crop applied to the client buffer.
    pub fn set_display_client_crop(&self, dev_id: u32, rect: &Rect) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_pod(rect);
        self.invoke(DeviceCmd::SetDisplayClientCrop.raw(), &req)?;
        Ok(())
    }

    /// Destination rectangle of the client buffer on the display.
    pub fn set_display_client_dest_rect(&self, dev_id: u32, rect: &Rect) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_pod(rect);
        self.invoke(DeviceCmd::SetDisplayClientDestRect.raw(), &req)?;
        Ok(())
    }

    /// Hands the client composition buffer to the device, with its acquire
    /// fence (`-1` for none).
    pub fn set_display_client_buffer(
        &self,
        dev_id: u32,
        buffer: &BufferHandle,
        fence: i32,
    ) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_buffer_handle(buffer).map_err(ProxyError::Encode)?;
        req.write_fd(fence);
        self.invoke(DeviceCmd::SetDisplayClientBuffer.raw(), &req)?;
        Ok(())
    }

    /// Damage region of the client buffer. An empty region is a parameter
    /// error before any encoding.
    pub fn set_display_client_damage(&self, dev_id: u32, rects: &[Rect]) -> Result<()> {
        self.check_dev(dev_id)?;
        self.check_count(rects.len())?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(rects.len() as u32);
        req.write_pod_slice(rects).map_err(ProxyError::Encode)?;
        self.invoke(DeviceCmd::SetDisplayClientDamage.raw(), &req)?;
        Ok(())
    }

    /// Enables or disables vsync event delivery.
    pub fn set_display_vsync_enabled(&self, dev_id: u32, enabled: bool) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_bool(enabled);
        self.invoke(DeviceCmd::SetDisplayVsyncEnabled.raw(), &req)?;
        Ok(())
    }

    /// Per-layer release fences of the last committed frame; `max` declares
    /// the caller's capacity.
    pub fn get_display_release_fence(
        &self,
        dev_id: u32,
        max: u32,
    ) -> Result<(Vec<u32>, Vec<i32>)> {
        self.check_dev(dev_id)?;
        self.check_count(max as usize)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        let mut reply = self.invoke(DeviceCmd::GetDisplayReleaseFence.raw(), &req)?;
        let count = reply.read_u32().map_err(ProxyError::Decode)?;
        if count == 0 {
            return Ok((Vec::new(), Vec::new()));
        }
        if count > max {
            return Err(ProxyError::Param);
        }
        let layers = reply.read_u32_vec(count).map_err(ProxyError::Decode)?;
        let fences = reply.read_fd_array(count).map_err(ProxyError::Decode)?;
        Ok((layers, fences))
    }

    /// Commits the prepared frame; returns the frame's release fence
    /// (`-1` for none).
    pub fn commit(&self, dev_id: u32) -> Result<i32> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        let mut reply = self.invoke(DeviceCmd::Commit.raw(), &req)?;
        reply.read_fd().map_err(ProxyError::Decode)
    }

    /// Vendor pass-through; not carried over this channel.
    pub fn invoke_display_cmd(&self, _dev_id: u32) -> Result<()> {
        Err(ProxyError::NotSupported)
    }

    /// Creates a virtual display; returns `(pixel format, device id)`.
    pub fn create_virtual_display(&self, width: u32, height: u32) -> Result<(i32, u32)> {
        let mut req = Self::begin();
        req.write_u32(width);
        req.write_u32(height);
        let mut reply = self.invoke(DeviceCmd::CreateVirtualDisplay.raw(), &req)?;
        let format = reply.read_i32().map_err(ProxyError::Decode)?;
        let dev_id = reply.read_u32().map_err(ProxyError::Decode)?;
        Ok((format, dev_id))
    }

    /// Destroys a virtual display.
    pub fn destroy_virtual_display(&self, dev_id: u32) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        self.invoke(DeviceCmd::DestroyVirtualDisplay.raw(), &req)?;
        Ok(())
    }

    /// Sets the output buffer of a virtual display with its release fence.
    pub fn set_virtual_display_buffer(
        &self,
        dev_id: u32,
        buffer: &BufferHandle,
        release_fence: i32,
    ) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_buffer_handle(buffer).map_err(ProxyError::Encode)?;
        req.write_fd(release_fence);
        self.invoke(DeviceCmd::SetVirtualDisplayBuffer.raw(), &req)?;
        Ok(())
    }

    /// Write-back frame retrieval; not carried over this channel.
    pub fn get_write_back_frame(&self, _dev_id: u32) -> Result<()> {
        Err(ProxyError::NotSupported)
    }

    /// Creates a write-back channel; marshalled in full, though current
    /// devices answer with a not-supported status.
    pub fn create_write_back(&self, width: u32, height: u32) -> Result<(u32, i32)> {
        let mut req = Self::begin();
        req.write_u32(width);
        req.write_u32(height);
        let mut reply = self.invoke(DeviceCmd::CreateWriteBack.raw(), &req)?;
        let dev_id = reply.read_u32().map_err(ProxyError::Decode)?;
        let format = reply.read_i32().map_err(ProxyError::Decode)?;
        Ok((dev_id, format))
    }

    /// Destroys a write-back channel.
    pub fn destroy_write_back(&self, dev_id: u32) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        self.invoke(DeviceCmd::DestroyWriteBack.raw(), &req)?;
        Ok(())
    }

    // --- layer scope ------------------------------------------------------

    /// Creates a layer; returns its id.
    pub fn create_layer(&self, dev_id: u32, info: &LayerInfo) -> Result<u32> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_pod(info);
        let mut reply = self.invoke(LayerCmd::CreateLayer.raw(), &req)?;
        reply.read_u32().map_err(ProxyError::Decode)
    }

    /// Closes a layer.
    pub fn close_layer(&self, dev_id: u32, layer_id: u32) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        self.invoke(LayerCmd::CloseLayer.raw(), &req)?;
        Ok(())
    }

    /// Shows or hides a layer.
    pub fn set_layer_visible(&self, dev_id: u32, layer_id: u32, visible: bool) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        req.write_bool(visible);
        self.invoke(LayerCmd::SetLayerVisible.raw(), &req)?;
        Ok(())
    }

    /// Current visibility.
    pub fn get_layer_visible_state(&self, dev_id: u32, layer_id: u32) -> Result<bool> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        let mut reply = self.invoke(LayerCmd::GetLayerVisibleState.raw(), &req)?;
        reply.read_bool().map_err(ProxyError::Decode)
    }

    /// Source crop of a layer.
    pub fn set_layer_crop(&self, dev_id: u32, layer_id: u32, rect: &Rect) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        req.write_pod(rect);
        self.invoke(LayerCmd::SetLayerCrop.raw(), &req)?;
        Ok(())
    }

    /// Stacking order of a layer.
    pub fn set_layer_zorder(&self, dev_id: u32, layer_id: u32, zorder: u32) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        req.write_u32(zorder);
        self.invoke(LayerCmd::SetLayerZorder.raw(), &req)?;
        Ok(())
    }

    /// Current stacking order.
    pub fn get_layer_zorder(&self, dev_id: u32, layer_id: u32) -> Result<u32> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        let mut reply = self.invoke(LayerCmd::GetLayerZorder.raw(), &req)?;
        reply.read_u32().map_err(ProxyError::Decode)
    }

    /// Premultiplied-alpha flag.
    pub fn set_layer_pre_multi(&self, dev_id: u32, layer_id: u32, pre_mul: bool) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        req.write_bool(pre_mul);
        self.invoke(LayerCmd::SetLayerPreMulti.raw(), &req)?;
        Ok(())
    }

    /// Current premultiplied-alpha flag.
    pub fn get_layer_pre_multi(&self, dev_id: u32, layer_id: u32) -> Result<bool> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        let mut reply = self.invoke(LayerCmd::GetLayerPreMulti.raw(), &req)?;
        reply.read_bool().map_err(ProxyError::Decode)
    }

    /// Alpha configuration.
    pub fn set_layer_alpha(&self, dev_id: u32, layer_id: u32, alpha: &LayerAlpha) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        req.write_pod(alpha);
        self.invoke(LayerCmd::SetLayerAlpha.raw(), &req)?;
        Ok(())
    }

    /// Current alpha configuration.
    pub fn get_layer_alpha(&self, dev_id: u32, layer_id: u32) -> Result<LayerAlpha> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        let mut reply = self.invoke(LayerCmd::GetLayerAlpha.raw(), &req)?;
        reply.read_pod::<LayerAlpha>().map_err(ProxyError::Decode)
    }

    /// Color key (chroma key) configuration.
    pub fn set_layer_color_key(
        &self,
        dev_id: u32,
        layer_id: u32,
        enable: bool,
        key: u32,
    ) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        req.write_bool(enable);
        req.write_u32(key);
        self.invoke(LayerCmd::SetLayerColorKey.raw(), &req)?;
        Ok(())
    }

    /// Current color key configuration.
    pub fn get_layer_color_key(&self, dev_id: u32, layer_id: u32) -> Result<(bool, u32)> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        let mut reply = self.invoke(LayerCmd::GetLayerColorKey.raw(), &req)?;
        let enable = reply.read_bool().map_err(ProxyError::Decode)?;
        let key = reply.read_u32().map_err(ProxyError::Decode)?;
        Ok((enable, key))
    }

    /// Uploads a palette. An empty palette is a parameter error before any
    /// encoding.
    pub fn set_layer_palette(&self, dev_id: u32, layer_id: u32, palette: &[u32]) -> Result<()> {
        self.check_dev(dev_id)?;
        self.check_count(palette.len())?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        req.write_u32(palette.len() as u32);
        req.write_u32_slice(palette).map_err(ProxyError::Encode)?;
        self.invoke(LayerCmd::SetLayerPalette.raw(), &req)?;
        Ok(())
    }

    /// Reads the palette back; `max` declares the caller's capacity.
    pub fn get_layer_palette(&self, dev_id: u32, layer_id: u32, max: u32) -> Result<Vec<u32>> {
        self.check_dev(dev_id)?;
        self.check_count(max as usize)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        req.write_u32(max);
        let mut reply = self.invoke(LayerCmd::GetLayerPalette.raw(), &req)?;
        let count = reply.read_u32().map_err(ProxyError::Decode)?;
        if count == 0 {
            return Ok(Vec::new());
        }
        if count > max {
            return Err(ProxyError::Param);
        }
        reply.read_u32_vec(count).map_err(ProxyError::Decode)
    }

    /// Compression level.
    pub fn set_layer_compression(&self, dev_id: u32, layer_id: u32, level: i32) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        req.write_i32(level);
        self.invoke(LayerCmd::SetLayerCompression.raw(), &req)?;
        Ok(())
    }

    /// Current compression level.
    pub fn get_layer_compression(&self, dev_id: u32, layer_id: u32) -> Result<i32> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        let mut reply = self.invoke(LayerCmd::GetLayerCompression.raw(), &req)?;
        reply.read_i32().map_err(ProxyError::Decode)
    }

    /// Flushes a buffer to a layer.
    pub fn flush(&self, dev_id: u32, layer_id: u32, buffer: &LayerBuffer) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        req.write_layer_buffer(buffer).map_err(ProxyError::Encode)?;
        self.invoke(LayerCmd::Flush.raw(), &req)?;
        Ok(())
    }

    /// Visible region of a layer. An empty region is a parameter error.
    pub fn set_layer_visible_region(
        &self,
        dev_id: u32,
        layer_id: u32,
        rects: &[Rect],
    ) -> Result<()> {
        self.check_dev(dev_id)?;
        self.check_count(rects.len())?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        req.write_u32(rects.len() as u32);
        req.write_pod_slice(rects).map_err(ProxyError::Encode)?;
        self.invoke(LayerCmd::SetLayerVisibleRegion.raw(), &req)?;
        Ok(())
    }

    /// Dirty rectangle of a layer for the pending frame.
    pub fn set_layer_dirty_region(&self, dev_id: u32, layer_id: u32, rect: &Rect) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        req.write_pod(rect);
        self.invoke(LayerCmd::SetLayerDirtyRegion.raw(), &req)?;
        Ok(())
    }

    /// Current front buffer of a layer.
    pub fn get_layer_buffer(&self, dev_id: u32, layer_id: u32) -> Result<LayerBuffer> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        let mut reply = self.invoke(LayerCmd::GetLayerBuffer.raw(), &req)?;
        reply.read_layer_buffer().map_err(ProxyError::Decode)
    }

    /// Hands a buffer to a layer for the next frame.
    pub fn set_layer_buffer(&self, dev_id: u32, layer_id: u32, buffer: &LayerBuffer) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        req.write_layer_buffer(buffer).map_err(ProxyError::Encode)?;
        self.invoke(LayerCmd::SetLayerBuffer.raw(), &req)?;
        Ok(())
    }

    /// Vendor pass-through; not carried over this channel.
    pub fn invoke_layer_cmd(&self, _dev_id: u32, _layer_id: u32) -> Result<()> {
        Err(ProxyError::NotSupported)
    }

    /// Who composes this layer next frame.
    pub fn set_layer_composition_type(
        &self,
        dev_id: u32,
        layer_id: u32,
        kind: CompositionType,
    ) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        req.write_u32(kind.to_wire());
        self.invoke(LayerCmd::SetLayerCompositionType.raw(), &req)?;
        Ok(())
    }

    /// Brings the layer machinery of one display up.
    pub fn init_display(&self, dev_id: u32) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        self.invoke(LayerCmd::InitDisplay.raw(), &req)?;
        Ok(())
    }

    /// Tears the layer machinery of one display down.
    pub fn deinit_display(&self, dev_id: u32) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        self.invoke(LayerCmd::DeinitDisplay.raw(), &req)?;
        Ok(())
    }

    /// Current geometry of one display.
    pub fn get_display_info(&self, dev_id: u32) -> Result<DisplayInfo> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        let mut reply = self.invoke(LayerCmd::GetDisplayInfo.raw(), &req)?;
        reply.read_pod::<DisplayInfo>().map_err(ProxyError::Decode)
    }

    /// Position and size of a layer.
    pub fn set_layer_size(&self, dev_id: u32, layer_id: u32, rect: &Rect) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        req.write_pod(rect);
        self.invoke(LayerCmd::SetLayerSize.raw(), &req)?;
        Ok(())
    }

    /// Current position and size of a layer.
    pub fn get_layer_size(&self, dev_id: u32, layer_id: u32) -> Result<Rect> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        let mut reply = self.invoke(LayerCmd::GetLayerSize.raw(), &req)?;
        reply.read_pod::<Rect>().map_err(ProxyError::Decode)
    }

    /// Rotation/mirror applied to a layer.
    pub fn set_transform_mode(
        &self,
        dev_id: u32,
        layer_id: u32,
        mode: TransformMode,
    ) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        req.write_u32(mode.to_wire());
        self.invoke(LayerCmd::SetTransformMode.raw(), &req)?;
        Ok(())
    }

    /// Blocks until the next vertical blank or `timeout_ms` elapses.
    pub fn wait_for_vblank(&self, dev_id: u32, layer_id: u32, timeout_ms: i32) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        req.write_i32(timeout_ms);
        self.invoke(LayerCmd::WaitForVBlank.raw(), &req)?;
        Ok(())
    }

    /// Captures the composed output into `buffer`.
    pub fn snap_shot(&self, dev_id: u32, buffer: &BufferHandle) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_buffer_handle(buffer).map_err(ProxyError::Encode)?;
        self.invoke(LayerCmd::SnapShot.raw(), &req)?;
        Ok(())
    }

    /// Blend equation of a layer.
    pub fn set_layer_blend_type(
        &self,
        dev_id: u32,
        layer_id: u32,
        blend: BlendMode,
    ) -> Result<()> {
        self.check_dev(dev_id)?;
        let mut req = Self::begin();
        req.write_u32(dev_id);
        req.write_u32(layer_id);
        req.write_u32(blend.to_wire());
        self.invoke(LayerCmd::SetLayerBlendType.raw(), &req)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use display_ipc::{CallError, Caller};
    use display_wire::DispError;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Counts calls and answers each with a canned (status, payload).
    struct MockCaller {
        calls: AtomicU32,
        status: i32,
        payload: Vec<u8>,
    }

    impl MockCaller {
        fn ok(payload: Vec<u8>) -> Self {
            MockCaller {
                calls: AtomicU32::new(0),
                status: 0,
                payload,
            }
        }

        fn failing(status: i32) -> Self {
            MockCaller {
                calls: AtomicU32::new(0),
                status,
                payload: Vec::new(),
            }
        }
    }

    impl Caller for MockCaller {
        fn call(&self, _cmd: u32, _request: &[u8]) -> display_ipc::Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.status != 0 {
                return Err(CallError::Failure(self.status));
            }
            Ok(self.payload.clone())
        }
    }

    fn connection(mock: MockCaller) -> (DisplayConnection, Arc<MockCaller>) {
        let mock = Arc::new(mock);
        struct Shared(Arc<MockCaller>);
        impl Caller for Shared {
            fn call(&self, cmd: u32, request: &[u8]) -> display_ipc::Result<Vec<u8>> {
                self.0.call(cmd, request)
            }
        }
        (
            DisplayConnection::connect(Box::new(Shared(mock.clone()))),
            mock,
        )
    }

    #[test]
    fn bad_device_id_never_touches_transport() {
        let (conn, mock) = connection(MockCaller::ok(Vec::new()));
        assert_eq!(
            conn.set_display_mode(MAX_DEVICE_ID + 1, 0),
            Err(ProxyError::Param)
        );
        assert_eq!(conn.commit(99), Err(ProxyError::Param));
        assert_eq!(
            conn.get_display_capability(MAX_DEVICE_ID + 1),
            Err(ProxyError::Param)
        );
        assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_damage_region_never_touches_transport() {
        let (conn, mock) = connection(MockCaller::ok(Vec::new()));
        assert_eq!(
            conn.set_display_client_damage(0, &[]),
            Err(ProxyError::Param)
        );
        assert_eq!(conn.set_layer_palette(0, 1, &[]), Err(ProxyError::Param));
        assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn pass_through_operations_never_touch_transport() {
        let (conn, mock) = connection(MockCaller::ok(Vec::new()));
        assert_eq!(conn.invoke_display_cmd(0), Err(ProxyError::NotSupported));
        assert_eq!(conn.invoke_layer_cmd(0, 1), Err(ProxyError::NotSupported));
        assert_eq!(conn.get_write_back_frame(0), Err(ProxyError::NotSupported));
        assert_eq!(mock.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn remote_status_surfaces_as_remote_error() {
        let (conn, mock) = connection(MockCaller::failing(DispError::NoDevice.code()));
        assert_eq!(
            conn.set_display_backlight(1, 50),
            Err(ProxyError::Remote(DispError::NoDevice))
        );
        assert_eq!(mock.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn short_reply_is_a_decode_error() {
        let (conn, _) = connection(MockCaller::ok(vec![1, 2]));
        assert!(matches!(
            conn.get_display_mode(0),
            Err(ProxyError::Decode(_))
        ));
    }

    #[test]
    fn oversized_reply_count_is_a_param_error() {
        // Stub claims 8 modes; caller declared capacity 4.
        let mut reply = Transaction::new();
        reply.write_u32(8);
        let (conn, _) = connection(MockCaller::ok(reply.into_bytes()));
        assert_eq!(
            conn.get_display_supported_modes(0, 4),
            Err(ProxyError::Param)
        );
    }

    #[test]
    fn capability_reply_decodes() {
        let cap = DisplayCapability {
            name: "main".into(),
            interface_type: display_wire::types::InterfaceType::Lcd,
            phy_width: 1080,
            phy_height: 2400,
            supported_layers: 4,
            virtual_disp_count: 0,
            support_write_back: false,
            property_count: 0,
        };
        let mut reply = Transaction::new();
        reply.write_pod(&cap);
        let (conn, mock) = connection(MockCaller::ok(reply.into_bytes()));
        assert_eq!(conn.get_display_capability(0).unwrap(), cap);
        assert_eq!(mock.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn hotplug_registration_arms_channel_once() {
        struct NopListener;
        impl DisplayEventListener for NopListener {
            fn on_hotplug(&self, _: u32, _: bool) {}
            fn on_vblank(&self, _: u32, _: u64) {}
            fn on_refresh(&self, _: u32) {}
        }
        let (conn, mock) = connection(MockCaller::ok(Vec::new()));
        conn.register_hotplug_listener(Arc::new(NopListener)).unwrap();
        // SetProxyRemoteCallback + RegHotPlugCallback.
        assert_eq!(mock.calls.load(Ordering::SeqCst), 2);
        conn.register_hotplug_listener(Arc::new(NopListener)).unwrap();
        // Channel already armed; only the registration goes out.
        assert_eq!(mock.calls.load(Ordering::SeqCst), 3);
    }
}
