//! knxd client protocol framing.
//!
//! knxd (and its predecessor eibd) exposes the bus to local clients over a
//! stream socket. Every message in either direction is:
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ Length (2 bytes, big-endian, excl. self) │
//! ├──────────────────────────────────────────┤
//! │ Message Type (2 bytes, big-endian)       │
//! ├──────────────────────────────────────────┤
//! │ Body (variable)                          │
//! └──────────────────────────────────────────┘
//! ```
//!
//! Only the handful of requests the bridge needs are modelled here. The
//! socket side lives in [`crate::net::knxd`].

use crate::addressing::{GroupAddress, IndividualAddress};
use crate::error::{KnxError, Result};

/// Default TCP port of the knxd client interface
pub const KNXD_DEFAULT_PORT: u16 = 6720;

/// Size of the length prefix
pub const LENGTH_PREFIX_SIZE: usize = 2;

/// Size of the message type field
pub const TYPE_SIZE: usize = 2;

/// Body flag asking knxd for a send-only association
const WRITE_ONLY: u8 = 0xFF;

/// knxd message type codes used by the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum MessageType {
    /// `EIB_OPEN_T_GROUP` - associate the connection with one group
    OpenTGroup = 0x0022,
    /// `EIB_APDU_PACKET` - APDU on a transport-layer association
    ApduPacket = 0x0025,
    /// `EIB_OPEN_GROUPCON` - group socket able to reach any group
    OpenGroupCon = 0x0026,
    /// `EIB_GROUP_PACKET` - APDU addressed to a group on a group socket
    GroupPacket = 0x0027,
}

impl MessageType {
    /// Look up a known message type.
    pub const fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0022 => Some(Self::OpenTGroup),
            0x0025 => Some(Self::ApduPacket),
            0x0026 => Some(Self::OpenGroupCon),
            0x0027 => Some(Self::GroupPacket),
            _ => None,
        }
    }

    /// Numeric code.
    pub const fn to_u16(self) -> u16 {
        self as u16
    }
}

/// Build a complete length-prefixed request.
pub fn encode_request(kind: MessageType, body: &[u8]) -> Vec<u8> {
    let len = TYPE_SIZE + body.len();
    let mut out = Vec::with_capacity(LENGTH_PREFIX_SIZE + len);
    // Bodies are at most a few hundred bytes
    out.extend_from_slice(&(len as u16).to_be_bytes());
    out.extend_from_slice(&kind.to_u16().to_be_bytes());
    out.extend_from_slice(body);
    out
}

/// `EIB_OPEN_T_GROUP` for receiving telegrams sent to `address`.
pub fn open_t_group(address: GroupAddress) -> Vec<u8> {
    let [hi, lo] = address.to_be_bytes();
    encode_request(MessageType::OpenTGroup, &[hi, lo, 0x00])
}

/// Write-only `EIB_OPEN_GROUPCON`.
pub fn open_group_socket() -> Vec<u8> {
    encode_request(MessageType::OpenGroupCon, &[0x00, 0x00, WRITE_ONLY])
}

/// `EIB_GROUP_PACKET` to `destination` on an open group socket.
pub fn group_packet(destination: GroupAddress, apdu: &[u8]) -> Vec<u8> {
    let [hi, lo] = destination.to_be_bytes();
    let mut body = Vec::with_capacity(2 + apdu.len());
    body.extend_from_slice(&[hi, lo]);
    body.extend_from_slice(apdu);
    encode_request(MessageType::GroupPacket, &body)
}

/// Message received from knxd, with the length prefix already stripped.
#[derive(Debug, Clone, Copy)]
pub struct Message<'a> {
    /// Raw message type code
    pub code: u16,
    /// Everything after the type
    pub body: &'a [u8],
}

impl<'a> Message<'a> {
    /// Parse a message payload.
    ///
    /// # Errors
    ///
    /// Payloads too short to hold a message type.
    pub fn parse(payload: &'a [u8]) -> Result<Self> {
        match payload {
            [hi, lo, body @ ..] => Ok(Self {
                code: u16::from_be_bytes([*hi, *lo]),
                body,
            }),
            _ => Err(KnxError::unexpected_reply()),
        }
    }

    /// Known message type, if any.
    pub fn kind(&self) -> Option<MessageType> {
        MessageType::from_u16(self.code)
    }

    /// Check that this is the acknowledgement for `request`.
    ///
    /// knxd answers an open request by echoing its type, anything else means
    /// the association was refused.
    pub fn is_ack_for(&self, request: MessageType) -> bool {
        self.code == request.to_u16()
    }

    /// Split an `EIB_APDU_PACKET` into source address and APDU.
    ///
    /// # Errors
    ///
    /// Other message types, or bodies without a source address.
    pub fn as_apdu(&self) -> Result<(IndividualAddress, &'a [u8])> {
        match (self.kind(), self.body) {
            (Some(MessageType::ApduPacket), [hi, lo, apdu @ ..]) => {
                Ok((IndividualAddress::from_be_bytes([*hi, *lo]), apdu))
            }
            _ => Err(KnxError::unexpected_reply()),
        }
    }
}
