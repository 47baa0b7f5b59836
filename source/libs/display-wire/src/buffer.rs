// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Graphics buffer handle and layer buffer encoding.
//!
//! A buffer handle is not a blob: every field is serialized individually so
//! the receiving side reconstructs a complete handle or fails the decode.
//! Descriptor fields use the `[bool valid][fd]` form, so a handle without a
//! backing descriptor still travels.

use crate::txn::{Transaction, WireError};

/// Upper bound on a handle's reserve arrays; zero entries is the common
/// case and legal, unlike operation-level array fields.
pub const RESERVE_MAX: u32 = 8;

/// A fully field-serialized graphics buffer handle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferHandle {
    /// Backing descriptor; `-1` when the handle has none.
    pub fd: i32,
    /// Width in pixels.
    pub width: i32,
    /// Row stride in bytes.
    pub stride: i32,
    /// Height in pixels.
    pub height: i32,
    /// Allocation size in bytes.
    pub size: i32,
    /// Pixel format discriminant.
    pub format: i32,
    /// Usage bits.
    pub usage: u64,
    /// Physical address when pinned, zero otherwise.
    pub phys_addr: u64,
    /// Shared-memory key.
    pub key: i32,
    /// Extra descriptors.
    pub reserve_fds: Vec<i32>,
    /// Extra integers.
    pub reserve_ints: Vec<i32>,
}

/// A layer's front buffer for the next frame: acquire fence, pitch, and the
/// handle itself. The handle travels as a trailing record so it can carry
/// descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerBuffer {
    /// Acquire fence; `-1` for none.
    pub fence_id: i32,
    /// Row pitch in bytes.
    pub pitch: u32,
    /// Backing buffer.
    pub handle: BufferHandle,
}

impl Transaction {
    /// Writes every field of a buffer handle.
    pub fn write_buffer_handle(&mut self, h: &BufferHandle) -> Result<(), WireError> {
        if h.reserve_fds.len() as u32 > RESERVE_MAX || h.reserve_ints.len() as u32 > RESERVE_MAX {
            return Err(WireError::CountOutOfRange {
                count: h.reserve_fds.len().max(h.reserve_ints.len()) as u32,
                max: RESERVE_MAX,
            });
        }
        self.write_fd(h.fd);
        self.write_i32(h.width);
        self.write_i32(h.stride);
        self.write_i32(h.height);
        self.write_i32(h.size);
        self.write_i32(h.format);
        self.write_u64(h.usage);
        self.write_u64(h.phys_addr);
        self.write_i32(h.key);
        self.write_raw_u32(h.reserve_fds.len() as u32);
        for &fd in &h.reserve_fds {
            self.write_fd(fd);
        }
        self.write_raw_u32(h.reserve_ints.len() as u32);
        for &v in &h.reserve_ints {
            self.write_i32(v);
        }
        Ok(())
    }

    /// Reads a buffer handle; any malformed field fails the whole handle.
    pub fn read_buffer_handle(&mut self) -> Result<BufferHandle, WireError> {
        let fd = self.read_fd()?;
        let width = self.read_i32()?;
        let stride = self.read_i32()?;
        let height = self.read_i32()?;
        let size = self.read_i32()?;
        let format = self.read_i32()?;
        let usage = self.read_u64()?;
        let phys_addr = self.read_u64()?;
        let key = self.read_i32()?;
        let fd_count = self.read_raw_u32()?;
        if fd_count > RESERVE_MAX {
            return Err(WireError::CountOutOfRange {
                count: fd_count,
                max: RESERVE_MAX,
            });
        }
        let mut reserve_fds = Vec::with_capacity(fd_count as usize);
        for _ in 0..fd_count {
            reserve_fds.push(self.read_fd()?);
        }
        let int_count = self.read_raw_u32()?;
        if int_count > RESERVE_MAX {
            return Err(WireError::CountOutOfRange {
                count: int_count,
                max: RESERVE_MAX,
            });
        }
        let mut reserve_ints = Vec::with_capacity(int_count as usize);
        for _ in 0..int_count {
            reserve_ints.push(self.read_i32()?);
        }
        Ok(BufferHandle {
            fd,
            width,
            stride,
            height,
            size,
            format,
            usage,
            phys_addr,
            key,
            reserve_fds,
            reserve_ints,
        })
    }

    /// Writes a layer buffer: fence, pitch, then the handle record.
    pub fn write_layer_buffer(&mut self, b: &LayerBuffer) -> Result<(), WireError> {
        self.write_fd(b.fence_id);
        self.write_u32(b.pitch);
        self.write_buffer_handle(&b.handle)
    }

    /// Reads a layer buffer in the write order above.
    pub fn read_layer_buffer(&mut self) -> Result<LayerBuffer, WireError> {
        Ok(LayerBuffer {
            fence_id: self.read_fd()?,
            pitch: self.read_u32()?,
            handle: self.read_buffer_handle()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_handle() -> BufferHandle {
        BufferHandle {
            fd: 9,
            width: 1920,
            stride: 7680,
            height: 1080,
            size: 8_294_400,
            format: 12,
            usage: 0x0000_0003,
            phys_addr: 0xdead_0000,
            key: 41,
            reserve_fds: vec![11, -1],
            reserve_ints: vec![1, 2, 3],
        }
    }

    #[test]
    fn handle_round_trips() {
        let handle = sample_handle();
        let mut txn = Transaction::new();
        txn.write_buffer_handle(&handle).unwrap();
        assert_eq!(txn.read_buffer_handle().unwrap(), handle);
        assert_eq!(txn.remaining(), 0);
    }

    #[test]
    fn handle_without_descriptor_round_trips() {
        let handle = BufferHandle {
            fd: -1,
            ..Default::default()
        };
        let mut txn = Transaction::new();
        txn.write_buffer_handle(&handle).unwrap();
        assert_eq!(txn.read_buffer_handle().unwrap(), handle);
    }

    #[test]
    fn oversized_reserve_array_rejected() {
        let handle = BufferHandle {
            reserve_ints: vec![0; RESERVE_MAX as usize + 1],
            ..Default::default()
        };
        let mut txn = Transaction::new();
        assert!(matches!(
            txn.write_buffer_handle(&handle),
            Err(WireError::CountOutOfRange { .. })
        ));
    }

    #[test]
    fn truncated_handle_fails_cleanly() {
        let handle = sample_handle();
        let mut txn = Transaction::new();
        txn.write_buffer_handle(&handle).unwrap();
        let full = txn.into_bytes();
        let mut cut = Transaction::from_bytes(full[..full.len() / 2].to_vec());
        assert!(cut.read_buffer_handle().is_err());
    }

    #[test]
    fn layer_buffer_round_trips() {
        let buf = LayerBuffer {
            fence_id: -1,
            pitch: 7680,
            handle: sample_handle(),
        };
        let mut txn = Transaction::new();
        txn.write_layer_buffer(&buf).unwrap();
        assert_eq!(txn.read_layer_buffer().unwrap(), buf);
    }
}
