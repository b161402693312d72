//! Generic netlink family resolution through the `nlctrl` controller.

use netlink_packet_generic::ctrl::nlas::GenlCtrlAttrs;
use netlink_packet_utils::nla::NlasIterator;
use netlink_packet_utils::parsers::{parse_string, parse_u16, parse_u32};

use super::attr::emit_all;
use super::error::{Error, Result};
use super::message::{GenlMessage, Header};

/// Fixed family id of the generic netlink controller.
pub const GENL_ID_CTRL: u16 = 0x10;

const CTRL_CMD_GETFAMILY: u8 = 3;
const CTRL_VERSION: u8 = 1;

const CTRL_ATTR_FAMILY_ID: u16 = 1;
const CTRL_ATTR_FAMILY_NAME: u16 = 2;
const CTRL_ATTR_VERSION: u16 = 3;

/// A resolved generic netlink family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Family {
    pub id: u16,
    pub version: u8,
    pub name: String,
}

/// Builds a `CTRL_CMD_GETFAMILY` request for `name`.
pub fn get_family_request(name: &str) -> GenlMessage {
    GenlMessage {
        header: Header {
            command: CTRL_CMD_GETFAMILY,
            version: CTRL_VERSION,
        },
        data: emit_all(&[GenlCtrlAttrs::FamilyName(name.to_owned())]),
    }
}

/// Extracts the family description from the controller's replies.
///
/// The first reply carrying a family id wins. A missing version attribute is
/// reported as version `0`; a missing name falls back to the requested one.
/// Attributes other than id, name and version (operations, multicast groups)
/// are not interpreted.
///
/// # Errors
///
/// Returns [`Error::Frame`] if a reply payload is malformed, or
/// [`Error::MissingFamilyId`] if no reply carries a family id.
pub fn parse_family_reply(replies: &[GenlMessage], name: &str) -> Result<Family> {
    for reply in replies {
        let mut id = None;
        let mut version = 0;
        let mut reported_name = None;

        for nla in NlasIterator::new(reply.data.as_slice()) {
            let nla = nla?;
            match nla.kind() {
                CTRL_ATTR_FAMILY_ID => id = Some(parse_u16(nla.value())?),
                CTRL_ATTR_FAMILY_NAME => reported_name = Some(parse_string(nla.value())?),
                CTRL_ATTR_VERSION => version = parse_u32(nla.value())? as u8,
                _ => {}
            }
        }

        if let Some(id) = id {
            return Ok(Family {
                id,
                version,
                name: reported_name.unwrap_or_else(|| name.to_owned()),
            });
        }
    }

    Err(Error::MissingFamilyId {
        name: name.to_owned(),
    })
}
