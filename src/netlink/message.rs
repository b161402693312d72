//! Generic netlink messages and their framing.
//!
//! [`GenlMessage`] is what the rest of the crate exchanges through a
//! [`Transport`](super::Transport): a command, a version and an encoded
//! attribute payload. Putting it on the wire (`nlmsghdr`, `genlmsghdr`,
//! alignment) is left to `netlink-packet-core` and `netlink-packet-generic`.

use netlink_packet_core::{NetlinkHeader, NetlinkMessage, NetlinkPayload};
use netlink_packet_generic::{GenlFamily, GenlHeader, GenlMessage as GenlFrame};
use netlink_packet_utils::DecodeError;
use netlink_packet_utils::traits::{Emitable, ParseableParametrized};

use super::error::Result;

pub use netlink_packet_core::{NLM_F_ACK, NLM_F_MULTIPART, NLM_F_REQUEST, NLMSG_DONE};

const NLMSG_HDRLEN: usize = 16;

/// The generic netlink header carried after `nlmsghdr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub command: u8,
    pub version: u8,
}

/// A generic netlink message: header plus encoded attribute payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenlMessage {
    pub header: Header,
    pub data: Vec<u8>,
}

/// A [`GenlMessage`] as a `netlink-packet-generic` payload.
///
/// Families are addressed by their resolved id, so the static family name is
/// never consulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Payload(pub(crate) GenlMessage);

impl GenlFamily for Payload {
    fn family_name() -> &'static str {
        ""
    }

    fn command(&self) -> u8 {
        self.0.header.command
    }

    fn version(&self) -> u8 {
        self.0.header.version
    }
}

impl Emitable for Payload {
    fn buffer_len(&self) -> usize {
        self.0.data.len()
    }

    fn emit(&self, buffer: &mut [u8]) {
        buffer[..self.0.data.len()].copy_from_slice(&self.0.data);
    }
}

impl ParseableParametrized<[u8], GenlHeader> for Payload {
    fn parse_with_param(buf: &[u8], header: GenlHeader) -> std::result::Result<Self, DecodeError> {
        Ok(Self(GenlMessage {
            header: Header {
                command: header.cmd,
                version: header.version,
            },
            data: buf.to_vec(),
        }))
    }
}

/// A complete netlink message carrying a generic netlink payload.
pub(crate) type Frame = NetlinkMessage<GenlFrame<Payload>>;

/// Serializes `msg` as a request to `family`.
pub(crate) fn encode_request(msg: &GenlMessage, family: u16, flags: u16, sequence: u32) -> Vec<u8> {
    let mut genl = GenlFrame::from_payload(Payload(msg.clone()));
    genl.set_resolved_family_id(family);

    let mut frame = NetlinkMessage::new(
        NetlinkHeader::default(),
        NetlinkPayload::InnerMessage(genl),
    );
    frame.header.flags = flags;
    frame.header.sequence_number = sequence;
    frame.finalize();

    let mut buf = vec![0; frame.buffer_len()];
    frame.serialize(&mut buf);
    buf
}

/// Parses every message packed into one received datagram.
///
/// # Errors
///
/// Returns [`Error::Frame`](super::Error::Frame) if a message header or
/// generic netlink header is malformed.
pub(crate) fn split_frames(datagram: &[u8]) -> Result<Vec<Frame>> {
    let mut frames = Vec::new();
    let mut offset = 0;
    while offset < datagram.len() {
        let frame = Frame::deserialize(&datagram[offset..])?;
        let length = (frame.header.length as usize).max(NLMSG_HDRLEN);
        offset += (length + 3) & !3;
        frames.push(frame);
    }
    Ok(frames)
}
