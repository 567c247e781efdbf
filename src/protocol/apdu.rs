//! Group APDU decoding and encoding.
//!
//! The bus daemon hands us the application-layer part of a group telegram,
//! starting at the TPCI byte:
//!
//! ```text
//! byte 0:  TPCI | APCI bits 9-8   (low two bits must be 0 for group values)
//! byte 1:  APCI bits 7-6 | 6-bit short value
//! byte 2+: long value (only one extra byte is understood)
//! ```
//!
//! APCI bits 7-6 select the service: `00` read, `01` response, `10` write,
//! `11` reserved.
//!
//! ## Example
//!
//! ```
//! use knx_bridge::protocol::apdu::{self, ApduEvent};
//!
//! assert_eq!(apdu::decode(&[0x00, 0x81]).unwrap(), Some(ApduEvent::BooleanWrite(true)));
//! assert_eq!(apdu::decode(&[0x00, 0x80, 0x7F]).unwrap(), Some(ApduEvent::IntegerWrite(0x7F)));
//! assert_eq!(apdu::encode_u8(0x7F).as_slice(), &[0x00, 0x80, 0x7F]);
//! ```

use crate::error::{KnxError, Result};

/// Bits of byte 0 that must be clear for a group value service
pub const CONTROL_MASK: u8 = 0x03;
/// APCI service bits of byte 1
pub const TYPE_MASK: u8 = 0xC0;
/// Short value bits of byte 1
pub const VALUE_MASK: u8 = 0x3F;

/// Longest frame the encoder produces.
pub const MAX_ENCODED_LEN: usize = 3;

/// Largest APDU accepted from the bus daemon.
pub const MAX_FRAME_LEN: usize = 255;

/// Outbound APDU buffer.
pub type ApduBuf = heapless::Vec<u8, MAX_ENCODED_LEN>;

/// Group value service carried by an APDU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApduType {
    /// `A_GroupValue_Read`
    Read,
    /// `A_GroupValue_Response`
    Response,
    /// `A_GroupValue_Write`
    Write,
}

impl ApduType {
    /// Decode the service from byte 1. `None` for the reserved `11` pattern.
    pub const fn from_byte(byte1: u8) -> Option<Self> {
        match byte1 & TYPE_MASK {
            0x00 => Some(Self::Read),
            0x40 => Some(Self::Response),
            0x80 => Some(Self::Write),
            _ => None,
        }
    }

    /// Service bits, positioned for byte 1.
    pub const fn bits(self) -> u8 {
        match self {
            Self::Read => 0x00,
            Self::Response => 0x40,
            Self::Write => 0x80,
        }
    }
}

/// State change carried by a write telegram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApduEvent {
    /// 1-bit value packed into byte 1
    BooleanWrite(bool),
    /// 8-bit unsigned value in byte 2
    IntegerWrite(u8),
}

/// Parsed view over a received APDU.
#[derive(Debug, Clone, Copy)]
pub struct Apdu<'a> {
    /// Service
    pub apdu_type: ApduType,
    /// Low 6 bits of byte 1
    pub short_value: u8,
    /// Bytes following the APCI, possibly empty
    pub data: &'a [u8],
}

impl<'a> Apdu<'a> {
    /// Parse a raw APDU.
    ///
    /// A present byte 0 with control bits set is reported as malformed even
    /// when the frame is too short to carry a service.
    ///
    /// # Errors
    ///
    /// Truncated, malformed or reserved-service frames.
    pub fn parse(frame: &'a [u8]) -> Result<Self> {
        match frame {
            [] => Err(KnxError::truncated_frame()),
            [first, ..] if first & CONTROL_MASK != 0 => Err(KnxError::malformed_frame()),
            [_] => Err(KnxError::truncated_frame()),
            [_, second, data @ ..] => {
                let apdu_type = ApduType::from_byte(*second).ok_or_else(KnxError::unknown_apdu)?;
                Ok(Self {
                    apdu_type,
                    short_value: second & VALUE_MASK,
                    data,
                })
            }
        }
    }

    /// Check if this is a group value write
    #[inline(always)]
    pub const fn is_write(&self) -> bool {
        matches!(self.apdu_type, ApduType::Write)
    }

    /// State change described by this APDU.
    ///
    /// Only writes produce events. Writes with more than one extra byte are
    /// accepted but carry nothing the bridge understands.
    pub fn event(&self) -> Option<ApduEvent> {
        if !self.is_write() {
            return None;
        }
        match self.data {
            [] => Some(ApduEvent::BooleanWrite(self.short_value != 0)),
            [value] => Some(ApduEvent::IntegerWrite(*value)),
            _ => None,
        }
    }
}

/// Decode a raw APDU straight into the state change it carries, if any.
///
/// # Errors
///
/// See [`Apdu::parse`].
#[inline]
pub fn decode(frame: &[u8]) -> Result<Option<ApduEvent>> {
    Ok(Apdu::parse(frame)?.event())
}

fn write_frame(second: u8, extra: Option<u8>) -> ApduBuf {
    let apci = ApduType::Write.bits() | second;
    match extra {
        Some(value) => ApduBuf::from_array([0x00, apci, value]),
        None => ApduBuf::from_array([0x00, apci]),
    }
}

/// Encode a 1-bit group write.
pub fn encode_bool(value: bool) -> ApduBuf {
    write_frame(u8::from(value), None)
}

/// Encode an 8-bit unsigned group write.
pub fn encode_u8(value: u8) -> ApduBuf {
    write_frame(0x00, Some(value))
}
