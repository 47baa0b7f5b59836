// Copyright 2026 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Transaction container: an append-only byte buffer with a read cursor.
//!
//! One `Transaction` holds exactly one request or one reply. Writers append
//! fields in the order the operation defines; readers consume them in the
//! same order. Trailing unread bytes are legal (a reader may stop early),
//! reading past the end is not.

use thiserror::Error;

/// Version stamped at the head of every request, before the interface token.
/// Bumped whenever field order or field encoding changes incompatibly.
pub const PROTOCOL_VERSION: u32 = 1;

/// Interface token written by every proxy request and checked by every stub
/// handler before any argument is decoded.
pub const INTERFACE_TOKEN: &str = "display.device.composer";

/// Longest token length accepted when decoding a request header.
const TOKEN_LEN_MAX: u32 = 64;

/// Decode/encode failure. Reads on malformed input always land here; they
/// never panic.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    /// The transaction ended before the requested field.
    #[error("transaction exhausted: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Bytes the read required.
        needed: usize,
        /// Bytes left past the cursor.
        remaining: usize,
    },
    /// A length prefix disagreed with the size of the expected type.
    #[error("length prefix {got} does not match expected size {expected}")]
    LengthMismatch {
        /// Size the expected type occupies.
        expected: usize,
        /// Prefix found on the wire.
        got: usize,
    },
    /// A wire-supplied element count was zero or above the bound.
    #[error("element count {count} outside bound 1..={max}")]
    CountOutOfRange {
        /// Count found on the wire.
        count: u32,
        /// Inclusive upper bound.
        max: u32,
    },
    /// A scalar decoded to a value outside its enum's discriminants.
    #[error("invalid discriminant {value} for {what}")]
    BadEnum {
        /// Type name for diagnostics.
        what: &'static str,
        /// Offending value, widened.
        value: i64,
    },
    /// The request header carried an unsupported protocol version.
    #[error("protocol version {got} unsupported (expected {expected})")]
    BadVersion {
        /// Version this build speaks.
        expected: u32,
        /// Version found on the wire.
        got: u32,
    },
    /// The interface token did not match [`INTERFACE_TOKEN`].
    #[error("interface token mismatch")]
    BadToken,
    /// A descriptor or string field was structurally malformed.
    #[error("descriptor field malformed")]
    BadDescriptor,
}

/// Ordered byte container for one request or one reply.
#[derive(Debug, Default, Clone)]
pub struct Transaction {
    buf: Vec<u8>,
    pos: usize,
}

impl Transaction {
    /// Empty transaction, ready for writing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps received bytes for reading; the cursor starts at offset zero.
    pub fn from_bytes(buf: Vec<u8>) -> Self {
        Transaction { buf, pos: 0 }
    }

    /// Starts a request transaction: protocol version, then the interface
    /// token. Every proxy-side encode begins here.
    pub fn begin_request(token: &str) -> Self {
        let mut txn = Transaction::new();
        txn.put(&PROTOCOL_VERSION.to_le_bytes());
        txn.put(&(token.len() as u32).to_le_bytes());
        txn.put(token.as_bytes());
        txn
    }

    /// Consumes and validates the request header written by
    /// [`Transaction::begin_request`]. Stub handlers call this before
    /// decoding any argument.
    pub fn check_header(&mut self) -> Result<(), WireError> {
        let got = u32::from_le_bytes(self.take(4)?.try_into().unwrap_or([0; 4]));
        if got != PROTOCOL_VERSION {
            return Err(WireError::BadVersion {
                expected: PROTOCOL_VERSION,
                got,
            });
        }
        let len = u32::from_le_bytes(self.take(4)?.try_into().unwrap_or([0; 4]));
        if len == 0 || len > TOKEN_LEN_MAX {
            return Err(WireError::BadDescriptor);
        }
        let token = self.take(len as usize)?;
        if token != INTERFACE_TOKEN.as_bytes() {
            return Err(WireError::BadToken);
        }
        Ok(())
    }

    /// Written bytes, independent of the read cursor.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the transaction, yielding its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Total written length.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True when nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes left past the read cursor.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub(crate) fn put(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub(crate) fn take(&mut self, n: usize) -> Result<&[u8], WireError> {
        let remaining = self.buf.len() - self.pos;
        if n > remaining {
            return Err(WireError::Truncated {
                needed: n,
                remaining,
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trip() {
        let mut txn = Transaction::begin_request(INTERFACE_TOKEN);
        txn.check_header().unwrap();
        assert_eq!(txn.remaining(), 0);
    }

    #[test]
    fn wrong_token_rejected() {
        let mut txn = Transaction::begin_request("some.other.interface");
        assert_eq!(txn.check_header(), Err(WireError::BadToken));
    }

    #[test]
    fn wrong_version_rejected() {
        let mut raw = (PROTOCOL_VERSION + 1).to_le_bytes().to_vec();
        raw.extend_from_slice(&(INTERFACE_TOKEN.len() as u32).to_le_bytes());
        raw.extend_from_slice(INTERFACE_TOKEN.as_bytes());
        let mut txn = Transaction::from_bytes(raw);
        assert_eq!(
            txn.check_header(),
            Err(WireError::BadVersion {
                expected: PROTOCOL_VERSION,
                got: PROTOCOL_VERSION + 1
            })
        );
    }

    #[test]
    fn truncated_take_reports_sizes() {
        let mut txn = Transaction::from_bytes(vec![1, 2, 3]);
        assert_eq!(
            txn.take(8),
            Err(WireError::Truncated {
                needed: 8,
                remaining: 3
            })
        );
        // A failed take must not move the cursor.
        assert_eq!(txn.take(3).unwrap(), &[1, 2, 3]);
    }

    #[test]
    fn oversized_token_length_rejected() {
        let mut raw = PROTOCOL_VERSION.to_le_bytes().to_vec();
        raw.extend_from_slice(&(TOKEN_LEN_MAX + 1).to_le_bytes());
        raw.extend_from_slice(&[0u8; 80]);
        let mut txn = Transaction::from_bytes(raw);
        assert_eq!(txn.check_header(), Err(WireError::BadDescriptor));
    }
}
