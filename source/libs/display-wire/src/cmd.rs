// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Command-id registry.
//!
//! A command id is one `u32` partitioned into bit fields:
//! bits 0..=7 hold the function number, bit 12 flags a batched command,
//! bit 13 flags the end of a batch, and bits 16..=19 hold the function
//! type (1 = device scope, 2 = layer scope). Both ends of the channel use
//! the enums below, so an id can never drift between proxy and stub.
//!
//! Gaps inside the ranges are reserved: they parse as in-range ids but have
//! no dispatch entry, so they terminate with a not-supported status rather
//! than a malformed-id error.

/// Function-type dimension of the dispatch table.
pub const FUNC_TYPE_MAX: usize = 3;
/// Function-number dimension of the dispatch table.
pub const FUNC_NUM_MAX: usize = 50;

/// Set on ids that belong to a batched submission.
pub const CMD_BATCH_FLAG: u32 = 1 << 12;
/// Set on the final id of a batched submission.
pub const CMD_BATCH_END_FLAG: u32 = 1 << 13;

const FUNC_TYPE_SHIFT: u32 = 16;
const FUNC_TYPE_MASK: u32 = 0xF;
const FUNC_NUM_MASK: u32 = 0xFF;

/// First id of the device-scope range.
pub const DEVICE_CMD_FIRST: u32 = 0x0001_0001;
/// Last id of the device-scope range.
pub const DEVICE_CMD_LAST: u32 = 0x0001_0025;
/// First id of the layer-scope range.
pub const LAYER_CMD_FIRST: u32 = 0x0002_0001;
/// Last id of the layer-scope range.
pub const LAYER_CMD_LAST: u32 = 0x0002_0029;

/// Function-type field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum FuncType {
    /// Outside both scopes.
    Invalid = 0,
    /// Display-device scope.
    Device = 1,
    /// Layer scope.
    Layer = 2,
}

/// Device-scope commands. Discriminants are the full wire ids.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum DeviceCmd {
    RegHotPlugCallback = 0x0001_0003,
    GetDisplayCapability = 0x0001_0004,
    GetDisplaySupportedModes = 0x0001_0005,
    GetDisplayMode = 0x0001_0006,
    SetDisplayMode = 0x0001_0007,
    GetDisplayPowerStatus = 0x0001_0008,
    SetDisplayPowerStatus = 0x0001_0009,
    GetDisplayBacklight = 0x0001_000A,
    SetDisplayBacklight = 0x0001_000B,
    GetDisplayProperty = 0x0001_000C,
    SetDisplayProperty = 0x0001_000D,
    PrepareDisplayLayers = 0x0001_000E,
    GetDisplayCompChange = 0x0001_0010,
    SetDisplayClientCrop = 0x0001_0012,
    SetDisplayClientDestRect = 0x0001_0013,
    SetDisplayClientBuffer = 0x0001_0014,
    SetDisplayClientDamage = 0x0001_0015,
    SetDisplayVsyncEnabled = 0x0001_0016,
    RegDisplayVBlankCallback = 0x0001_0019,
    GetDisplayReleaseFence = 0x0001_001B,
    Commit = 0x0001_001C,
    InvokeDisplayCmd = 0x0001_001D,
    CreateVirtualDisplay = 0x0001_001E,
    DestroyVirtualDisplay = 0x0001_001F,
    SetVirtualDisplayBuffer = 0x0001_0020,
    RegDisplayRefreshCallback = 0x0001_0021,
    GetWriteBackFrame = 0x0001_0022,
    CreateWriteBack = 0x0001_0023,
    DestroyWriteBack = 0x0001_0024,
    SetProxyRemoteCallback = 0x0001_0025,
}

/// Layer-scope commands. Discriminants are the full wire ids.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum LayerCmd {
    CreateLayer = 0x0002_0003,
    SetLayerVisible = 0x0002_0005,
    GetLayerVisibleState = 0x0002_0006,
    SetLayerCrop = 0x0002_0009,
    SetLayerZorder = 0x0002_000A,
    GetLayerZorder = 0x0002_000B,
    SetLayerPreMulti = 0x0002_000C,
    GetLayerPreMulti = 0x0002_000D,
    SetLayerAlpha = 0x0002_000E,
    GetLayerAlpha = 0x0002_000F,
    SetLayerColorKey = 0x0002_0010,
    GetLayerColorKey = 0x0002_0011,
    SetLayerPalette = 0x0002_0012,
    GetLayerPalette = 0x0002_0013,
    SetLayerCompression = 0x0002_0015,
    GetLayerCompression = 0x0002_0016,
    Flush = 0x0002_0018,
    SetLayerVisibleRegion = 0x0002_0019,
    SetLayerDirtyRegion = 0x0002_001A,
    GetLayerBuffer = 0x0002_001B,
    SetLayerBuffer = 0x0002_001C,
    InvokeLayerCmd = 0x0002_001D,
    SetLayerCompositionType = 0x0002_001E,
    InitDisplay = 0x0002_0020,
    DeinitDisplay = 0x0002_0021,
    GetDisplayInfo = 0x0002_0022,
    CloseLayer = 0x0002_0023,
    SetLayerSize = 0x0002_0024,
    GetLayerSize = 0x0002_0025,
    SetTransformMode = 0x0002_0026,
    WaitForVBlank = 0x0002_0027,
    SnapShot = 0x0002_0028,
    SetLayerBlendType = 0x0002_0029,
}

impl DeviceCmd {
    /// Full wire id.
    pub fn raw(self) -> u32 {
        self as u32
    }

    /// Function number (dispatch column).
    pub fn func_num(self) -> u8 {
        (self as u32 & FUNC_NUM_MASK) as u8
    }
}

impl LayerCmd {
    /// Full wire id.
    pub fn raw(self) -> u32 {
        self as u32
    }

    /// Function number (dispatch column).
    pub fn func_num(self) -> u8 {
        (self as u32 & FUNC_NUM_MASK) as u8
    }
}

/// A parsed command id: its scope and function number, batch flags stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmdId {
    /// Outside both ranges.
    Invalid,
    /// Device-scope function number.
    Device(u8),
    /// Layer-scope function number.
    Layer(u8),
}

impl CmdId {
    /// Classifies a raw id. Batch flags are stripped before the range check;
    /// reserved in-range numbers classify as valid (their dispatch slot is
    /// empty, which is the stub's concern).
    pub fn parse(raw: u32) -> CmdId {
        let base = raw & !(CMD_BATCH_FLAG | CMD_BATCH_END_FLAG);
        match (base >> FUNC_TYPE_SHIFT) & FUNC_TYPE_MASK {
            1 if (DEVICE_CMD_FIRST..=DEVICE_CMD_LAST).contains(&base) => {
                CmdId::Device((base & FUNC_NUM_MASK) as u8)
            }
            2 if (LAYER_CMD_FIRST..=LAYER_CMD_LAST).contains(&base) => {
                CmdId::Layer((base & FUNC_NUM_MASK) as u8)
            }
            _ => CmdId::Invalid,
        }
    }

    /// True when the raw id carries the batch flag.
    pub fn is_batch(raw: u32) -> bool {
        raw & CMD_BATCH_FLAG != 0
    }

    /// True when the raw id carries the batch-end flag.
    pub fn is_batch_end(raw: u32) -> bool {
        raw & CMD_BATCH_END_FLAG != 0
    }

    /// Scope of this id.
    pub fn func_type(self) -> FuncType {
        match self {
            CmdId::Invalid => FuncType::Invalid,
            CmdId::Device(_) => FuncType::Device,
            CmdId::Layer(_) => FuncType::Layer,
        }
    }

    /// Function number; zero for invalid ids.
    pub fn func_num(self) -> u8 {
        match self {
            CmdId::Invalid => 0,
            CmdId::Device(n) | CmdId::Layer(n) => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_edges_classify() {
        assert_eq!(CmdId::parse(DEVICE_CMD_FIRST), CmdId::Device(0x01));
        assert_eq!(CmdId::parse(DEVICE_CMD_LAST), CmdId::Device(0x25));
        assert_eq!(CmdId::parse(LAYER_CMD_FIRST), CmdId::Layer(0x01));
        assert_eq!(CmdId::parse(LAYER_CMD_LAST), CmdId::Layer(0x29));
        assert_eq!(CmdId::parse(DEVICE_CMD_FIRST - 1), CmdId::Invalid);
        assert_eq!(CmdId::parse(DEVICE_CMD_LAST + 1), CmdId::Invalid);
        assert_eq!(CmdId::parse(LAYER_CMD_LAST + 1), CmdId::Invalid);
        assert_eq!(CmdId::parse(0), CmdId::Invalid);
        assert_eq!(CmdId::parse(0x0003_0001), CmdId::Invalid);
    }

    #[test]
    fn batch_flags_strip_before_classification() {
        let raw = DeviceCmd::Commit.raw() | CMD_BATCH_FLAG;
        assert_eq!(CmdId::parse(raw), CmdId::Device(0x1C));
        assert!(CmdId::is_batch(raw));
        assert!(!CmdId::is_batch_end(raw));

        let raw = LayerCmd::Flush.raw() | CMD_BATCH_FLAG | CMD_BATCH_END_FLAG;
        assert_eq!(CmdId::parse(raw), CmdId::Layer(0x18));
        assert!(CmdId::is_batch_end(raw));
    }

    #[test]
    fn reserved_numbers_inside_range_are_valid() {
        // 0x0001_0002 has no registered operation but sits inside the range.
        assert_eq!(CmdId::parse(0x0001_0002), CmdId::Device(0x02));
        assert_eq!(CmdId::parse(0x0002_0004), CmdId::Layer(0x04));
    }

    #[test]
    fn func_num_fits_dispatch_bounds() {
        for cmd in [
            DeviceCmd::RegHotPlugCallback,
            DeviceCmd::SetProxyRemoteCallback,
        ] {
            assert!((cmd.func_num() as usize) < FUNC_NUM_MAX);
        }
        for cmd in [LayerCmd::CreateLayer, LayerCmd::SetLayerBlendType] {
            assert!((cmd.func_num() as usize) < FUNC_NUM_MAX);
        }
    }
}
