// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Display data types with fixed wire encodings.
//!
//! Records implement [`WirePod`] and travel length-prefixed; enums travel
//! as their explicit `u32` discriminant inside the record body or as a
//! prefixed scalar. An unknown discriminant is a decode error, never a
//! panic and never a silent default.

use crate::codec::WirePod;
use crate::txn::WireError;

macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident : $what:literal {
        $($variant:ident = $value:literal),+ $(,)?
    }) => {
        $(#[$meta])*
        #[allow(missing_docs)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u32)]
        pub enum $name { $($variant = $value),+ }

        impl $name {
            /// Wire discriminant.
            pub fn to_wire(self) -> u32 {
                self as u32
            }

            /// Decodes a wire discriminant; unknown values are an error.
            pub fn from_wire(v: u32) -> Result<Self, WireError> {
                match v {
                    $($value => Ok($name::$variant),)+
                    other => Err(WireError::BadEnum {
                        what: $what,
                        value: other as i64,
                    }),
                }
            }
        }
    };
}

wire_enum! {
    /// Display power state.
    PowerStatus: "PowerStatus" {
        On = 0,
        Standby = 1,
        Suspend = 2,
        Off = 3,
    }
}

wire_enum! {
    /// Physical interface driving a display.
    InterfaceType: "InterfaceType" {
        Hdmi = 0,
        Lcd = 1,
        Bt1120 = 2,
        Bt656 = 3,
        Ypbpr = 4,
        Rgb = 5,
        Cvbs = 6,
        Svideo = 7,
        Vga = 8,
        Mipi = 9,
        Panel = 10,
    }
}

wire_enum! {
    /// Layer usage class.
    LayerType: "LayerType" {
        Graphic = 0,
        Overlay = 1,
        SideBuffer = 2,
        Cursor = 3,
    }
}

wire_enum! {
    /// Pixel memory layout.
    PixelFormat: "PixelFormat" {
        Clut8 = 0,
        Clut1 = 1,
        Clut4 = 2,
        Rgb565 = 3,
        Rgba5658 = 4,
        Rgbx4444 = 5,
        Rgba4444 = 6,
        Rgb444 = 7,
        Rgbx5551 = 8,
        Rgba5551 = 9,
        Rgb555 = 10,
        Rgbx8888 = 11,
        Rgba8888 = 12,
        Rgb888 = 13,
        Bgr565 = 14,
        Bgrx4444 = 15,
        Bgra4444 = 16,
        Bgrx5551 = 17,
        Bgra5551 = 18,
        Bgrx8888 = 19,
        Bgra8888 = 20,
        Yuv422Interleaved = 21,
        Ycbcr422Sp = 22,
        Ycrcb422Sp = 23,
        Ycbcr420Sp = 24,
        Ycrcb420Sp = 25,
        Ycbcr422P = 26,
        Ycrcb422P = 27,
        Ycbcr420P = 28,
        Ycrcb420P = 29,
        Yuyv422Pkg = 30,
        Uyvy422Pkg = 31,
        Yvyu422Pkg = 32,
        Vyuy422Pkg = 33,
    }
}

wire_enum! {
    /// Who composes a layer for the next frame.
    CompositionType: "CompositionType" {
        Client = 0,
        Device = 1,
        Cursor = 2,
        Video = 3,
        DeviceClear = 4,
        ClientClear = 5,
        Tunnel = 6,
    }
}

wire_enum! {
    /// Rotation/mirror applied at composition.
    TransformMode: "TransformMode" {
        None = 0,
        Rotate90 = 1,
        Rotate180 = 2,
        Rotate270 = 3,
        MirrorH = 4,
        MirrorV = 5,
        MirrorHRotate90 = 6,
        MirrorVRotate90 = 7,
    }
}

wire_enum! {
    /// Alpha blend equation.
    BlendMode: "BlendMode" {
        None = 0,
        Clear = 1,
        Src = 2,
        SrcOver = 3,
        DstOver = 4,
        SrcIn = 5,
        DstIn = 6,
        SrcOut = 7,
        DstOut = 8,
        SrcAtop = 9,
        DstAtop = 10,
        Add = 11,
        Xor = 12,
        Dst = 13,
        Aks = 14,
        Akd = 15,
    }
}

/// Integer rectangle, origin top-left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub w: i32,
    /// Height.
    pub h: i32,
}

impl WirePod for Rect {
    const WIRE_SIZE: usize = 16;

    fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.x.to_le_bytes());
        out.extend_from_slice(&self.y.to_le_bytes());
        out.extend_from_slice(&self.w.to_le_bytes());
        out.extend_from_slice(&self.h.to_le_bytes());
    }

    fn decode_body(body: &[u8]) -> Result<Self, WireError> {
        let mut f = FieldReader::new(body);
        Ok(Rect {
            x: f.i32()?,
            y: f.i32()?,
            w: f.i32()?,
            h: f.i32()?,
        })
    }
}

/// Name field width inside [`DisplayCapability`]; NUL-padded on the wire.
pub const CAPABILITY_NAME_LEN: usize = 32;

/// Static description of one display device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayCapability {
    /// Human-readable panel name; truncated to fit the fixed wire field.
    pub name: String,
    /// Physical interface.
    pub interface_type: InterfaceType,
    /// Physical width in pixels.
    pub phy_width: u32,
    /// Physical height in pixels.
    pub phy_height: u32,
    /// Hardware composition layers available.
    pub supported_layers: u32,
    /// Virtual displays the device can back.
    pub virtual_disp_count: u32,
    /// Whether write-back capture is available.
    pub support_write_back: bool,
    /// Number of vendor properties exposed.
    pub property_count: u32,
}

impl WirePod for DisplayCapability {
    const WIRE_SIZE: usize = CAPABILITY_NAME_LEN + 7 * 4;

    fn encode_body(&self, out: &mut Vec<u8>) {
        let mut name = [0u8; CAPABILITY_NAME_LEN];
        let bytes = self.name.as_bytes();
        // Leave at least one trailing NUL so the name stays delimited.
        let n = bytes.len().min(CAPABILITY_NAME_LEN - 1);
        name[..n].copy_from_slice(&bytes[..n]);
        out.extend_from_slice(&name);
        out.extend_from_slice(&self.interface_type.to_wire().to_le_bytes());
        out.extend_from_slice(&self.phy_width.to_le_bytes());
        out.extend_from_slice(&self.phy_height.to_le_bytes());
        out.extend_from_slice(&self.supported_layers.to_le_bytes());
        out.extend_from_slice(&self.virtual_disp_count.to_le_bytes());
        out.extend_from_slice(&(self.support_write_back as u32).to_le_bytes());
        out.extend_from_slice(&self.property_count.to_le_bytes());
    }

    fn decode_body(body: &[u8]) -> Result<Self, WireError> {
        let raw_name = &body[..CAPABILITY_NAME_LEN];
        let end = raw_name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(CAPABILITY_NAME_LEN);
        let name = std::str::from_utf8(&raw_name[..end])
            .map_err(|_| WireError::BadDescriptor)?
            .to_owned();
        let mut f = FieldReader::new(&body[CAPABILITY_NAME_LEN..]);
        Ok(DisplayCapability {
            name,
            interface_type: InterfaceType::from_wire(f.u32()?)?,
            phy_width: f.u32()?,
            phy_height: f.u32()?,
            supported_layers: f.u32()?,
            virtual_disp_count: f.u32()?,
            support_write_back: match f.u32()? {
                0 => false,
                1 => true,
                other => {
                    return Err(WireError::BadEnum {
                        what: "bool",
                        value: other as i64,
                    })
                }
            },
            property_count: f.u32()?,
        })
    }
}

/// One display timing the device can drive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayModeInfo {
    /// Active width in pixels.
    pub width: i32,
    /// Active height in pixels.
    pub height: i32,
    /// Refresh rate in Hz.
    pub refresh_rate: u32,
    /// Mode id, unique per device.
    pub id: i32,
}

impl WirePod for DisplayModeInfo {
    const WIRE_SIZE: usize = 16;

    fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.refresh_rate.to_le_bytes());
        out.extend_from_slice(&self.id.to_le_bytes());
    }

    fn decode_body(body: &[u8]) -> Result<Self, WireError> {
        let mut f = FieldReader::new(body);
        Ok(DisplayModeInfo {
            width: f.i32()?,
            height: f.i32()?,
            refresh_rate: f.u32()?,
            id: f.i32()?,
        })
    }
}

/// Current geometry of a display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayInfo {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Rotation in degrees.
    pub rot_angle: i32,
}

impl WirePod for DisplayInfo {
    const WIRE_SIZE: usize = 12;

    fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.rot_angle.to_le_bytes());
    }

    fn decode_body(body: &[u8]) -> Result<Self, WireError> {
        let mut f = FieldReader::new(body);
        Ok(DisplayInfo {
            width: f.u32()?,
            height: f.u32()?,
            rot_angle: f.i32()?,
        })
    }
}

/// Parameters for creating one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerInfo {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Usage class.
    pub layer_type: LayerType,
    /// Bits per pixel.
    pub bpp: i32,
    /// Pixel layout.
    pub pixel_format: PixelFormat,
}

impl WirePod for LayerInfo {
    const WIRE_SIZE: usize = 20;

    fn encode_body(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        out.extend_from_slice(&self.layer_type.to_wire().to_le_bytes());
        out.extend_from_slice(&self.bpp.to_le_bytes());
        out.extend_from_slice(&self.pixel_format.to_wire().to_le_bytes());
    }

    fn decode_body(body: &[u8]) -> Result<Self, WireError> {
        let mut f = FieldReader::new(body);
        Ok(LayerInfo {
            width: f.i32()?,
            height: f.i32()?,
            layer_type: LayerType::from_wire(f.u32()?)?,
            bpp: f.i32()?,
            pixel_format: PixelFormat::from_wire(f.u32()?)?,
        })
    }
}

/// Per-layer alpha configuration. Alpha bytes travel as single bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerAlpha {
    /// Apply `g_alpha` to the whole layer.
    pub enable_global: bool,
    /// Honor per-pixel alpha.
    pub enable_pixel: bool,
    /// Alpha when a pixel's alpha is 0.
    pub alpha0: u8,
    /// Alpha when a pixel's alpha is 255.
    pub alpha1: u8,
    /// Global alpha value.
    pub g_alpha: u8,
}

impl WirePod for LayerAlpha {
    const WIRE_SIZE: usize = 5;

    fn encode_body(&self, out: &mut Vec<u8>) {
        out.push(self.enable_global as u8);
        out.push(self.enable_pixel as u8);
        out.push(self.alpha0);
        out.push(self.alpha1);
        out.push(self.g_alpha);
    }

    fn decode_body(body: &[u8]) -> Result<Self, WireError> {
        let strict_bool = |b: u8| match b {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(WireError::BadEnum {
                what: "bool",
                value: other as i64,
            }),
        };
        Ok(LayerAlpha {
            enable_global: strict_bool(body[0])?,
            enable_pixel: strict_bool(body[1])?,
            alpha0: body[2],
            alpha1: body[3],
            g_alpha: body[4],
        })
    }
}

/// Sequential little-endian field reader over an exact-size record body.
/// The codec has already validated the body length against `WIRE_SIZE`, so
/// exhaustion here still reports cleanly rather than slicing out of bounds.
pub(crate) struct FieldReader<'a> {
    body: &'a [u8],
}

impl<'a> FieldReader<'a> {
    pub(crate) fn new(body: &'a [u8]) -> Self {
        FieldReader { body }
    }

    fn chunk(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        if self.body.len() < n {
            return Err(WireError::Truncated {
                needed: n,
                remaining: self.body.len(),
            });
        }
        let (head, rest) = self.body.split_at(n);
        self.body = rest;
        Ok(head)
    }

    pub(crate) fn u32(&mut self) -> Result<u32, WireError> {
        Ok(u32::from_le_bytes(
            self.chunk(4)?.try_into().unwrap_or([0; 4]),
        ))
    }

    pub(crate) fn i32(&mut self) -> Result<i32, WireError> {
        Ok(i32::from_le_bytes(
            self.chunk(4)?.try_into().unwrap_or([0; 4]),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Transaction;

    #[test]
    fn rect_round_trips_through_transaction() {
        let rect = Rect {
            x: -4,
            y: 8,
            w: 1920,
            h: 1080,
        };
        let mut txn = Transaction::new();
        txn.write_pod(&rect);
        assert_eq!(txn.read_pod::<Rect>().unwrap(), rect);
    }

    #[test]
    fn capability_name_is_nul_delimited() {
        let cap = DisplayCapability {
            name: "edp-panel-0".into(),
            interface_type: InterfaceType::Mipi,
            phy_width: 2560,
            phy_height: 1600,
            supported_layers: 7,
            virtual_disp_count: 1,
            support_write_back: true,
            property_count: 3,
        };
        let mut txn = Transaction::new();
        txn.write_pod(&cap);
        assert_eq!(txn.len(), 4 + DisplayCapability::WIRE_SIZE);
        assert_eq!(txn.read_pod::<DisplayCapability>().unwrap(), cap);
    }

    #[test]
    fn capability_name_truncates_to_field_width() {
        let cap = DisplayCapability {
            name: "x".repeat(CAPABILITY_NAME_LEN + 10),
            interface_type: InterfaceType::Hdmi,
            phy_width: 0,
            phy_height: 0,
            supported_layers: 0,
            virtual_disp_count: 0,
            support_write_back: false,
            property_count: 0,
        };
        let mut txn = Transaction::new();
        txn.write_pod(&cap);
        let decoded = txn.read_pod::<DisplayCapability>().unwrap();
        assert_eq!(decoded.name.len(), CAPABILITY_NAME_LEN - 1);
    }

    #[test]
    fn unknown_discriminant_is_an_error() {
        assert!(matches!(
            PowerStatus::from_wire(99),
            Err(WireError::BadEnum { .. })
        ));
        assert!(matches!(
            CompositionType::from_wire(7),
            Err(WireError::BadEnum { .. })
        ));
    }

    #[test]
    fn layer_alpha_rejects_junk_bool_byte() {
        let mut txn = Transaction::new();
        txn.write_raw_u32(LayerAlpha::WIRE_SIZE as u32);
        txn.put(&[2, 0, 0, 0, 0]);
        assert!(matches!(
            txn.read_pod::<LayerAlpha>(),
            Err(WireError::BadEnum { .. })
        ));
    }

    #[test]
    fn mode_slice_round_trips() {
        let modes = vec![
            DisplayModeInfo {
                width: 1920,
                height: 1080,
                refresh_rate: 60,
                id: 0,
            },
            DisplayModeInfo {
                width: 1280,
                height: 720,
                refresh_rate: 90,
                id: 1,
            },
        ];
        let mut txn = Transaction::new();
        txn.write_pod_slice(&modes).unwrap();
        assert_eq!(txn.read_pod_vec::<DisplayModeInfo>(2).unwrap(), modes);
    }
}
