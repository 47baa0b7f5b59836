// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Typed field codec on top of [`Transaction`].
//!
//! Scalars travel as `[u32 length][little-endian value]`; the length must
//! equal the scalar's size exactly. Fixed-size records implement [`WirePod`]
//! and travel either as one prefixed record or as a prefixed run of records
//! (`length = WIRE_SIZE * count`, count carried separately by the caller).
//! File descriptors travel as `[bool valid][i32 fd if valid]`.

use crate::txn::{Transaction, WireError};
use crate::ARRAY_COUNT_MAX;

/// Fixed-size record with a stable field-by-field wire encoding.
///
/// `WIRE_SIZE` is the exact number of body bytes `encode_body` appends and
/// `decode_body` consumes; the length prefix around the body is the codec's
/// concern, not the implementor's.
pub trait WirePod: Sized {
    /// Exact encoded body size in bytes.
    const WIRE_SIZE: usize;

    /// Appends the record's fields, in declaration order, little-endian.
    fn encode_body(&self, out: &mut Vec<u8>);

    /// Decodes from exactly [`Self::WIRE_SIZE`] bytes.
    fn decode_body(body: &[u8]) -> Result<Self, WireError>;
}

fn le_u32(body: &[u8]) -> u32 {
    u32::from_le_bytes(body.try_into().unwrap_or([0; 4]))
}

impl Transaction {
    /// Writes a bare little-endian `u32` with no length prefix. Used for the
    /// header fields and array counts.
    pub fn write_raw_u32(&mut self, v: u32) {
        self.put(&v.to_le_bytes());
    }

    /// Reads a bare little-endian `u32` with no length prefix.
    pub fn read_raw_u32(&mut self) -> Result<u32, WireError> {
        Ok(le_u32(self.take(4)?))
    }

    fn write_prefixed(&mut self, body: &[u8]) {
        self.write_raw_u32(body.len() as u32);
        self.put(body);
    }

    fn read_prefixed(&mut self, expected: usize) -> Result<&[u8], WireError> {
        let got = self.read_raw_u32()? as usize;
        if got != expected {
            return Err(WireError::LengthMismatch { expected, got });
        }
        self.take(expected)
    }

    /// Writes a length-prefixed `u32`.
    pub fn write_u32(&mut self, v: u32) {
        self.write_prefixed(&v.to_le_bytes());
    }

    /// Reads a length-prefixed `u32`.
    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        Ok(le_u32(self.read_prefixed(4)?))
    }

    /// Writes a length-prefixed `i32`.
    pub fn write_i32(&mut self, v: i32) {
        self.write_prefixed(&v.to_le_bytes());
    }

    /// Reads a length-prefixed `i32`.
    pub fn read_i32(&mut self) -> Result<i32, WireError> {
        let body = self.read_prefixed(4)?;
        Ok(i32::from_le_bytes(body.try_into().unwrap_or([0; 4])))
    }

    /// Writes a length-prefixed `u64`.
    pub fn write_u64(&mut self, v: u64) {
        self.write_prefixed(&v.to_le_bytes());
    }

    /// Reads a length-prefixed `u64`.
    pub fn read_u64(&mut self) -> Result<u64, WireError> {
        let body = self.read_prefixed(8)?;
        Ok(u64::from_le_bytes(body.try_into().unwrap_or([0; 8])))
    }

    /// Writes a length-prefixed bool as one byte, `0` or `1`.
    pub fn write_bool(&mut self, v: bool) {
        self.write_prefixed(&[v as u8]);
    }

    /// Reads a length-prefixed bool; anything but `0` or `1` is rejected.
    pub fn read_bool(&mut self) -> Result<bool, WireError> {
        match self.read_prefixed(1)?[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(WireError::BadEnum {
                what: "bool",
                value: other as i64,
            }),
        }
    }

    /// Writes a file descriptor field: `[bool valid][fd if valid]`.
    ///
    /// A negative fd means "no descriptor" and encodes as `valid = false`;
    /// it is a legitimate value, not an error.
    pub fn write_fd(&mut self, fd: i32) {
        let valid = fd >= 0;
        self.write_bool(valid);
        if valid {
            self.write_i32(fd);
        }
    }

    /// Reads a file descriptor field; absent descriptors decode as `-1`.
    pub fn read_fd(&mut self) -> Result<i32, WireError> {
        if self.read_bool()? {
            let fd = self.read_i32()?;
            if fd < 0 {
                return Err(WireError::BadDescriptor);
            }
            Ok(fd)
        } else {
            Ok(-1)
        }
    }

    /// Writes `count` descriptor fields back to back.
    pub fn write_fd_array(&mut self, fds: &[i32]) {
        for &fd in fds {
            self.write_fd(fd);
        }
    }

    /// Reads `count` descriptor fields; the count must already have been
    /// validated by the caller against the operation's bound.
    pub fn read_fd_array(&mut self, count: u32) -> Result<Vec<i32>, WireError> {
        check_count(count)?;
        let mut fds = Vec::with_capacity(count as usize);
        for _ in 0..count {
            fds.push(self.read_fd()?);
        }
        Ok(fds)
    }

    /// Writes one fixed-size record as `[u32 WIRE_SIZE][body]`.
    pub fn write_pod<T: WirePod>(&mut self, v: &T) {
        self.write_raw_u32(T::WIRE_SIZE as u32);
        let mut body = Vec::with_capacity(T::WIRE_SIZE);
        v.encode_body(&mut body);
        self.put(&body);
    }

    /// Reads one fixed-size record.
    pub fn read_pod<T: WirePod>(&mut self) -> Result<T, WireError> {
        let body = self.read_prefixed(T::WIRE_SIZE)?;
        T::decode_body(body)
    }

    /// Writes a run of records as `[u32 WIRE_SIZE * count][bodies]`. The
    /// element count itself travels separately, written by the operation.
    /// Empty runs are a hard failure: zero-length array fields never go on
    /// the wire.
    pub fn write_pod_slice<T: WirePod>(&mut self, items: &[T]) -> Result<(), WireError> {
        check_count(items.len() as u32)?;
        self.write_raw_u32((T::WIRE_SIZE * items.len()) as u32);
        let mut body = Vec::with_capacity(T::WIRE_SIZE * items.len());
        for item in items {
            item.encode_body(&mut body);
        }
        self.put(&body);
        Ok(())
    }

    /// Reads a run of `count` records, validating the aggregate length
    /// prefix against `WIRE_SIZE * count`.
    pub fn read_pod_vec<T: WirePod>(&mut self, count: u32) -> Result<Vec<T>, WireError> {
        check_count(count)?;
        let expected = T::WIRE_SIZE * count as usize;
        let body = self.read_prefixed(expected)?;
        let mut items = Vec::with_capacity(count as usize);
        for chunk in body.chunks_exact(T::WIRE_SIZE) {
            items.push(T::decode_body(chunk)?);
        }
        Ok(items)
    }

    /// Writes a run of `u32` values as `[u32 4 * count][values]`.
    pub fn write_u32_slice(&mut self, items: &[u32]) -> Result<(), WireError> {
        check_count(items.len() as u32)?;
        self.write_raw_u32((4 * items.len()) as u32);
        for &v in items {
            self.put(&v.to_le_bytes());
        }
        Ok(())
    }

    /// Reads a run of `count` `u32` values.
    pub fn read_u32_vec(&mut self, count: u32) -> Result<Vec<u32>, WireError> {
        check_count(count)?;
        let body = self.read_prefixed(4 * count as usize)?;
        Ok(body.chunks_exact(4).map(le_u32).collect())
    }
}

fn check_count(count: u32) -> Result<(), WireError> {
    if count == 0 || count > ARRAY_COUNT_MAX {
        return Err(WireError::CountOutOfRange {
            count,
            max: ARRAY_COUNT_MAX,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_round_trips() {
        let mut txn = Transaction::new();
        txn.write_u32(0xdead_beef);
        txn.write_i32(-5);
        txn.write_u64(u64::MAX - 1);
        txn.write_bool(true);
        assert_eq!(txn.read_u32().unwrap(), 0xdead_beef);
        assert_eq!(txn.read_i32().unwrap(), -5);
        assert_eq!(txn.read_u64().unwrap(), u64::MAX - 1);
        assert!(txn.read_bool().unwrap());
        assert_eq!(txn.remaining(), 0);
    }

    #[test]
    fn length_prefix_must_match_exactly() {
        let mut txn = Transaction::new();
        txn.write_raw_u32(8); // claims 8 bytes for a u32
        txn.put(&[0u8; 8]);
        assert_eq!(
            txn.read_u32(),
            Err(WireError::LengthMismatch {
                expected: 4,
                got: 8
            })
        );
    }

    #[test]
    fn bool_rejects_junk_byte() {
        let mut txn = Transaction::new();
        txn.write_raw_u32(1);
        txn.put(&[7]);
        assert!(matches!(txn.read_bool(), Err(WireError::BadEnum { .. })));
    }

    #[test]
    fn absent_fd_round_trips_as_minus_one() {
        let mut txn = Transaction::new();
        txn.write_fd(-1);
        txn.write_fd(12);
        assert_eq!(txn.read_fd().unwrap(), -1);
        assert_eq!(txn.read_fd().unwrap(), 12);
    }

    #[test]
    fn zero_count_is_a_hard_failure() {
        let mut txn = Transaction::new();
        assert!(matches!(
            txn.write_u32_slice(&[]),
            Err(WireError::CountOutOfRange { count: 0, .. })
        ));
        assert!(matches!(
            txn.read_u32_vec(0),
            Err(WireError::CountOutOfRange { count: 0, .. })
        ));
    }

    #[test]
    fn count_above_bound_rejected_before_reading() {
        let mut txn = Transaction::new();
        assert!(matches!(
            txn.read_u32_vec(ARRAY_COUNT_MAX + 1),
            Err(WireError::CountOutOfRange { .. })
        ));
    }

    #[test]
    fn u32_slice_round_trips() {
        let mut txn = Transaction::new();
        txn.write_u32_slice(&[1, 2, 3]).unwrap();
        assert_eq!(txn.read_u32_vec(3).unwrap(), vec![1, 2, 3]);
    }
}
