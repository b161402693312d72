//! Attribute lists, framed by `netlink-packet-utils`.
//!
//! The kernel's TLV framing (header, 4-byte padding, flag bits) is handled by
//! [`DefaultNla`] and [`NlasIterator`]. This module only adapts them to the
//! owned [`Attribute`] values the request builder and the decoder work with.

use netlink_packet_utils::DecodeError;
use netlink_packet_utils::nla::{DefaultNla, NlasIterator};
use netlink_packet_utils::traits::Emitable;

/// Largest payload that fits behind a 4-byte header with a 16-bit length.
const MAX_PAYLOAD: usize = u16::MAX as usize - 4;

/// Errors that may occur while encoding or decoding an attribute list.
#[derive(Debug, thiserror::Error)]
pub enum AttrError {
    #[error("attribute type {kind} payload of {length} bytes does not fit a netlink attribute")]
    TooLarge { kind: u16, length: usize },

    #[error("malformed attribute list: {0}")]
    Malformed(#[from] DecodeError),
}

/// A single netlink attribute with its type tag and raw payload.
///
/// The nested and network-byte-order flag bits are stripped from `kind` on
/// decode, so callers can compare it directly against kernel type constants.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Attribute {
    pub kind: u16,
    pub data: Vec<u8>,
}

impl Attribute {
    pub fn new(kind: u16, data: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            data: data.into(),
        }
    }

    /// Creates an attribute carrying a `u32` in native byte order.
    pub fn u32(kind: u16, value: u32) -> Self {
        Self::new(kind, value.to_ne_bytes())
    }

    /// Creates an attribute whose payload is the encoded `attrs` list.
    ///
    /// # Errors
    ///
    /// Returns an [`AttrError`] if any of the inner attributes cannot be encoded.
    pub fn nested(kind: u16, attrs: &[Attribute]) -> Result<Self, AttrError> {
        Ok(Self::new(kind, marshal_attributes(attrs)?))
    }

    /// Interprets the payload as a native-endian `u32`.
    pub fn as_u32(&self) -> Option<u32> {
        self.data
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .map(u32::from_ne_bytes)
    }
}

/// Serializes `nlas` back to back, each padded to the attribute alignment.
pub(crate) fn emit_all<T: Emitable>(nlas: &[T]) -> Vec<u8> {
    let mut buf = vec![0; nlas.iter().map(Emitable::buffer_len).sum()];
    let mut offset = 0;
    for nla in nlas {
        let len = nla.buffer_len();
        nla.emit(&mut buf[offset..offset + len]);
        offset += len;
    }
    buf
}

/// Encodes an attribute list into its wire representation.
///
/// # Errors
///
/// Returns [`AttrError::TooLarge`] if an attribute payload does not fit into the
/// 16-bit length field.
pub fn marshal_attributes(attrs: &[Attribute]) -> Result<Vec<u8>, AttrError> {
    let nlas = attrs
        .iter()
        .map(|attr| {
            if attr.data.len() > MAX_PAYLOAD {
                return Err(AttrError::TooLarge {
                    kind: attr.kind,
                    length: attr.data.len(),
                });
            }
            Ok(DefaultNla::new(attr.kind, attr.data.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(emit_all(&nlas))
}

/// Decodes a buffer into an attribute list.
///
/// An empty buffer yields an empty list.
///
/// # Errors
///
/// Returns [`AttrError::Malformed`] if an attribute header is truncated or
/// declares a length outside the buffer.
pub fn unmarshal_attributes(data: &[u8]) -> Result<Vec<Attribute>, AttrError> {
    NlasIterator::new(data)
        .map(|nla| {
            let nla = nla?;
            Ok(Attribute::new(nla.kind(), nla.value()))
        })
        .collect()
}
