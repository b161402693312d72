use std::io;

use netlink_packet_core::NetlinkPayload;
use netlink_sys::protocols::NETLINK_GENERIC;
use netlink_sys::{Socket, SocketAddr};

use crate::config::Config;

use super::Transport;
use super::error::{Error, Result};
use super::message::{
    Frame, GenlMessage, NLM_F_ACK, NLM_F_MULTIPART, NLM_F_REQUEST, NLMSG_DONE, encode_request,
    split_frames,
};

/// A generic netlink connection to the kernel.
///
/// One request is in flight at a time; [`Transport::execute`] takes `&mut self`
/// so sharing a connection across threads needs external synchronization.
pub struct Conn {
    socket: Socket,
    port_id: u32,
    sequence: u32,
}

impl std::fmt::Debug for Conn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conn")
            .field("port_id", &self.port_id)
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}

/// Outcome of feeding one received message into the reply collector.
enum Step {
    Continue,
    Done,
}

fn socket_error(op: &'static str) -> impl FnOnce(io::Error) -> Error {
    move |source| Error::Socket { op, source }
}

impl Conn {
    /// Opens a `NETLINK_GENERIC` socket configured from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Socket`] if the socket cannot be created or configured.
    pub fn dial(config: &Config) -> Result<Self> {
        let mut socket = Socket::new(NETLINK_GENERIC).map_err(socket_error("socket"))?;
        let local = socket.bind_auto().map_err(socket_error("bind"))?;
        socket
            .set_rx_buf_sz(i32::try_from(config.recv_buffer_size).unwrap_or(i32::MAX))
            .map_err(socket_error("setsockopt"))?;
        socket
            .connect(&SocketAddr::new(0, 0))
            .map_err(socket_error("connect"))?;

        let port_id = local.port_number();
        log::debug!("Opened generic netlink socket with port id {port_id}");

        Ok(Self {
            socket,
            port_id,
            sequence: 0,
        })
    }

    fn next_sequence(&mut self) -> u32 {
        self.sequence = self.sequence.wrapping_add(1);
        self.sequence
    }
}

impl Transport for Conn {
    fn execute(&mut self, msg: &GenlMessage, family: u16, flags: u16) -> Result<Vec<GenlMessage>> {
        let sequence = self.next_sequence();
        let flags = flags | NLM_F_REQUEST;
        self.socket
            .send(&encode_request(msg, family, flags, sequence), 0)
            .map_err(socket_error("send"))?;
        log::trace!(
            "Sent generic netlink request: family={family}, command={}, seq={sequence}",
            msg.header.command
        );

        let mut replies = Vec::new();
        loop {
            let (datagram, _) = self
                .socket
                .recv_from_full()
                .map_err(socket_error("recv"))?;
            for frame in split_frames(&datagram)? {
                if let Step::Done = collect(frame, sequence, self.port_id, flags, &mut replies)? {
                    return Ok(replies);
                }
            }
        }
    }

    fn close(self) -> Result<()> {
        log::debug!("Closing generic netlink socket {}", self.port_id);
        Ok(())
    }
}

/// Converts the code of an `NLMSG_ERROR` reply into the errno it carries.
fn kernel_error(code: i32) -> Error {
    match code.checked_neg() {
        Some(errno) if errno > 0 => Error::Kernel(io::Error::from_raw_os_error(errno)),
        _ => Error::InvalidErrorCode { code },
    }
}

/// Applies one received message to the reply set of request `sequence`.
fn collect(
    frame: Frame,
    sequence: u32,
    port_id: u32,
    flags: u16,
    replies: &mut Vec<GenlMessage>,
) -> Result<Step> {
    let header = frame.header;
    if header.sequence_number != sequence {
        log::warn!(
            "Skipping netlink message with sequence {} while waiting for {sequence}",
            header.sequence_number
        );
        return Ok(Step::Continue);
    }
    if header.port_number != 0 && header.port_number != port_id {
        log::warn!(
            "Skipping netlink message for port id {} (ours is {port_id})",
            header.port_number
        );
        return Ok(Step::Continue);
    }
    let multipart = header.flags & NLM_F_MULTIPART != 0;

    match frame.payload {
        NetlinkPayload::InnerMessage(genl) => {
            replies.push(genl.payload.0);
            if multipart {
                Ok(Step::Continue)
            } else {
                Ok(Step::Done)
            }
        }
        NetlinkPayload::Error(err) => match err.code {
            Some(code) => Err(kernel_error(code.get())),
            None if flags & NLM_F_ACK != 0 || !multipart => Ok(Step::Done),
            None => Ok(Step::Continue),
        },
        _ if header.message_type == NLMSG_DONE => Ok(Step::Done),
        _ => Ok(Step::Continue),
    }
}
