// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Device backend interface.
//!
//! One method per protocol operation. The stub decodes the request, calls
//! the backend, and encodes whatever comes back; the backend never sees
//! wire bytes. Every method defaults to `NotSupported` so a backend only
//! implements what its hardware offers.

use std::sync::Arc;

use display_wire::{
    BufferHandle, CompositionType, DispError, DispResult, DisplayCapability, DisplayInfo,
    DisplayModeInfo, LayerAlpha, LayerBuffer, LayerInfo, PowerStatus, Rect, TransformMode,
};

use crate::callback::EventSink;

/// Display/layer implementation behind the stub.
///
/// Methods take `&self`; implementations use interior mutability where they
/// carry state, since the stub may be shared across serving threads.
#[allow(unused_variables)]
pub trait DeviceBackend: Send + Sync {
    /// False once the underlying device is gone; the stub then refuses
    /// every request with `NoDevice`.
    fn is_valid(&self) -> bool {
        true
    }

    // --- callbacks --------------------------------------------------------

    /// Hot-plug events should flow into `sink` from now on.
    fn reg_hotplug(&self, sink: Arc<dyn EventSink>) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Vblank events of `dev_id` should flow into `sink`.
    fn reg_vblank(&self, dev_id: u32, sink: Arc<dyn EventSink>) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Refresh requests for `dev_id` should flow into `sink`.
    fn reg_refresh(&self, dev_id: u32, sink: Arc<dyn EventSink>) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    // --- device scope -----------------------------------------------------

    /// Static capability description.
    fn get_display_capability(&self, dev_id: u32) -> DispResult<DisplayCapability> {
        Err(DispError::NotSupported)
    }

    /// Up to `max` supported timings.
    fn get_display_supported_modes(&self, dev_id: u32, max: u32) -> DispResult<Vec<DisplayModeInfo>> {
        Err(DispError::NotSupported)
    }

    /// Active mode id.
    fn get_display_mode(&self, dev_id: u32) -> DispResult<u32> {
        Err(DispError::NotSupported)
    }

    /// Switch to `mode_id`.
    fn set_display_mode(&self, dev_id: u32, mode_id: u32) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Current power state.
    fn get_display_power_status(&self, dev_id: u32) -> DispResult<PowerStatus> {
        Err(DispError::NotSupported)
    }

    /// Power state transition.
    fn set_display_power_status(&self, dev_id: u32, status: PowerStatus) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Current backlight level.
    fn get_display_backlight(&self, dev_id: u32) -> DispResult<u32> {
        Err(DispError::NotSupported)
    }

    /// Set backlight level.
    fn set_display_backlight(&self, dev_id: u32, level: u32) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Read a vendor property.
    fn get_display_property(&self, dev_id: u32, prop_id: u32) -> DispResult<u64> {
        Err(DispError::NotSupported)
    }

    /// Write a vendor property.
    fn set_display_property(&self, dev_id: u32, prop_id: u32, value: u64) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Plan composition; `true` when the client must compose.
    fn prepare_display_layers(&self, dev_id: u32) -> DispResult<bool> {
        Err(DispError::NotSupported)
    }

    /// Layers whose composition type changed, with the new types.
    fn get_display_comp_change(
        &self,
        dev_id: u32,
    ) -> DispResult<(Vec<u32>, Vec<CompositionType>)> {
        Err(DispError::NotSupported)
    }

    /// Crop of the client buffer.
    fn set_display_client_crop(&self, dev_id: u32, rect: Rect) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Destination rect of the client buffer.
    fn set_display_client_dest_rect(&self, dev_id: u32, rect: Rect) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Client composition buffer with its acquire fence.
    fn set_display_client_buffer(
        &self,
        dev_id: u32,
        buffer: BufferHandle,
        fence: i32,
    ) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Damage region of the client buffer.
    fn set_display_client_damage(&self, dev_id: u32, rects: Vec<Rect>) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Enable or disable vsync delivery.
    fn set_display_vsync_enabled(&self, dev_id: u32, enabled: bool) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Per-layer release fences of the last committed frame.
    fn get_display_release_fence(&self, dev_id: u32) -> DispResult<(Vec<u32>, Vec<i32>)> {
        Err(DispError::NotSupported)
    }

    /// Commit the prepared frame; returns its release fence.
    fn commit(&self, dev_id: u32) -> DispResult<i32> {
        Err(DispError::NotSupported)
    }

    /// Create a virtual display; returns `(pixel format, device id)`.
    fn create_virtual_display(&self, width: u32, height: u32) -> DispResult<(i32, u32)> {
        Err(DispError::NotSupported)
    }

    /// Destroy a virtual display.
    fn destroy_virtual_display(&self, dev_id: u32) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Output buffer of a virtual display with its release fence.
    fn set_virtual_display_buffer(
        &self,
        dev_id: u32,
        buffer: BufferHandle,
        release_fence: i32,
    ) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    // --- layer scope ------------------------------------------------------

    /// Create a layer; returns its id.
    fn create_layer(&self, dev_id: u32, info: LayerInfo) -> DispResult<u32> {
        Err(DispError::NotSupported)
    }

    /// Close a layer.
    fn close_layer(&self, dev_id: u32, layer_id: u32) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Show or hide a layer.
    fn set_layer_visible(&self, dev_id: u32, layer_id: u32, visible: bool) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Current visibility.
    fn get_layer_visible_state(&self, dev_id: u32, layer_id: u32) -> DispResult<bool> {
        Err(DispError::NotSupported)
    }

    /// Source crop.
    fn set_layer_crop(&self, dev_id: u32, layer_id: u32, rect: Rect) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Stacking order.
    fn set_layer_zorder(&self, dev_id: u32, layer_id: u32, zorder: u32) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Current stacking order.
    fn get_layer_zorder(&self, dev_id: u32, layer_id: u32) -> DispResult<u32> {
        Err(DispError::NotSupported)
    }

    /// Premultiplied-alpha flag.
    fn set_layer_pre_multi(&self, dev_id: u32, layer_id: u32, pre_mul: bool) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Current premultiplied-alpha flag.
    fn get_layer_pre_multi(&self, dev_id: u32, layer_id: u32) -> DispResult<bool> {
        Err(DispError::NotSupported)
    }

    /// Alpha configuration.
    fn set_layer_alpha(&self, dev_id: u32, layer_id: u32, alpha: LayerAlpha) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Current alpha configuration.
    fn get_layer_alpha(&self, dev_id: u32, layer_id: u32) -> DispResult<LayerAlpha> {
        Err(DispError::NotSupported)
    }

    /// Color key configuration.
    fn set_layer_color_key(
        &self,
        dev_id: u32,
        layer_id: u32,
        enable: bool,
        key: u32,
    ) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Current color key configuration.
    fn get_layer_color_key(&self, dev_id: u32, layer_id: u32) -> DispResult<(bool, u32)> {
        Err(DispError::NotSupported)
    }

    /// Upload a palette.
    fn set_layer_palette(&self, dev_id: u32, layer_id: u32, palette: Vec<u32>) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Read back up to `max` palette entries.
    fn get_layer_palette(&self, dev_id: u32, layer_id: u32, max: u32) -> DispResult<Vec<u32>> {
        Err(DispError::NotSupported)
    }

    /// Compression level.
    fn set_layer_compression(&self, dev_id: u32, layer_id: u32, level: i32) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Current compression level.
    fn get_layer_compression(&self, dev_id: u32, layer_id: u32) -> DispResult<i32> {
        Err(DispError::NotSupported)
    }

    /// Flush a buffer to a layer.
    fn flush(&self, dev_id: u32, layer_id: u32, buffer: LayerBuffer) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Visible region.
    fn set_layer_visible_region(
        &self,
        dev_id: u32,
        layer_id: u32,
        rects: Vec<Rect>,
    ) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Dirty rectangle for the pending frame.
    fn set_layer_dirty_region(&self, dev_id: u32, layer_id: u32, rect: Rect) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Current front buffer.
    fn get_layer_buffer(&self, dev_id: u32, layer_id: u32) -> DispResult<LayerBuffer> {
        Err(DispError::NotSupported)
    }

    /// Hand a buffer to a layer.
    fn set_layer_buffer(&self, dev_id: u32, layer_id: u32, buffer: LayerBuffer) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Who composes this layer next frame.
    fn set_layer_composition_type(
        &self,
        dev_id: u32,
        layer_id: u32,
        kind: CompositionType,
    ) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Bring the layer machinery of a display up.
    fn init_display(&self, dev_id: u32) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Tear the layer machinery of a display down.
    fn deinit_display(&self, dev_id: u32) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Current geometry of a display.
    fn get_display_info(&self, dev_id: u32) -> DispResult<DisplayInfo> {
        Err(DispError::NotSupported)
    }

    /// Position and size of a layer.
    fn set_layer_size(&self, dev_id: u32, layer_id: u32, rect: Rect) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Current position and size of a layer.
    fn get_layer_size(&self, dev_id: u32, layer_id: u32) -> DispResult<Rect> {
        Err(DispError::NotSupported)
    }

    /// Rotation/mirror applied at composition.
    fn set_transform_mode(
        &self,
        dev_id: u32,
        layer_id: u32,
        mode: TransformMode,
    ) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Block until the next vertical blank or `timeout_ms` elapses.
    fn wait_for_vblank(&self, dev_id: u32, layer_id: u32, timeout_ms: i32) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Capture composed output into `buffer`.
    fn snap_shot(&self, dev_id: u32, buffer: BufferHandle) -> DispResult<()> {
        Err(DispError::NotSupported)
    }

    /// Blend equation of a layer.
    fn set_layer_blend_type(
        &self,
        dev_id: u32,
        layer_id: u32,
        blend: display_wire::BlendMode,
    ) -> DispResult<()> {
        Err(DispError::NotSupported)
    }
}

/// Backend that answers everything with `NotSupported`. Stands in where no
/// hardware integration is wired yet.
pub struct UnimplementedBackend;

impl DeviceBackend for UnimplementedBackend {}
