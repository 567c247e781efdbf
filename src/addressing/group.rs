//! KNX Group Address implementation.
//!
//! Group addresses name logical communication groups on the bus and are
//! written in 3-level notation `main/middle/sub`.
//!
//! Internally stored as 16 bits:
//! - Main: 5 bits (0-31)
//! - Middle: 3 bits (0-7)
//! - Sub: 8 bits (0-255)

use crate::error::{KnxError, Result};
use core::fmt;

/// KNX Group Address
///
/// # Examples
///
/// ```
/// use knx_bridge::GroupAddress;
///
/// let addr: GroupAddress = "1/2/3".parse().unwrap();
/// assert_eq!(u16::from(addr), 0x0A03);
/// assert_eq!(addr.to_string(), "1/2/3");
///
/// assert!("1/8/0".parse::<GroupAddress>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupAddress {
    raw: u16,
}

impl GroupAddress {
    /// Maximum main group value (5 bits)
    pub const MAX_MAIN: u8 = 31;
    /// Maximum middle group value (3 bits)
    pub const MAX_MIDDLE: u8 = 7;
    /// Maximum sub group value (8 bits)
    pub const MAX_SUB: u8 = 255;

    /// Create a Group Address from its three components.
    ///
    /// # Errors
    ///
    /// Returns an addressing error if `main` or `middle` exceed their bit width.
    pub fn new(main: u8, middle: u8, sub: u8) -> Result<Self> {
        if main > Self::MAX_MAIN || middle > Self::MAX_MIDDLE {
            return Err(KnxError::address_out_of_range());
        }
        Ok(Self {
            raw: (u16::from(main) << 11) | (u16::from(middle) << 8) | u16::from(sub),
        })
    }

    /// Get the raw u16 representation of the address.
    #[inline(always)]
    pub const fn raw(self) -> u16 {
        self.raw
    }

    /// Main group component (0-31).
    #[inline(always)]
    pub const fn main(self) -> u8 {
        ((self.raw >> 11) & 0x1F) as u8
    }

    /// Middle group component (0-7).
    #[inline(always)]
    pub const fn middle(self) -> u8 {
        ((self.raw >> 8) & 0x07) as u8
    }

    /// Sub group component (0-255).
    #[inline(always)]
    pub const fn sub(self) -> u8 {
        (self.raw & 0xFF) as u8
    }

    /// Big-endian wire representation, as used in knxd requests.
    #[inline]
    pub const fn to_be_bytes(self) -> [u8; 2] {
        self.raw.to_be_bytes()
    }
}

impl From<u16> for GroupAddress {
    #[inline(always)]
    fn from(raw: u16) -> Self {
        Self { raw }
    }
}

impl From<GroupAddress> for u16 {
    #[inline(always)]
    fn from(addr: GroupAddress) -> u16 {
        addr.raw
    }
}

impl fmt::Display for GroupAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.main(), self.middle(), self.sub())
    }
}

/// Parse one decimal component. Signs, whitespace, empty parts and leading
/// zeros are rejected so that only canonical `a/b/c` text is accepted.
pub(crate) fn parse_component(part: &str) -> Option<u8> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if part.len() > 1 && part.starts_with('0') {
        return None;
    }
    part.parse().ok()
}

/// Split `a/b/c` into exactly three components.
pub(crate) fn split_three(s: &str) -> Option<[u8; 3]> {
    let mut parts = s.split('/');
    let main = parse_component(parts.next()?)?;
    let middle = parse_component(parts.next()?)?;
    let sub = parse_component(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some([main, middle, sub])
}

impl core::str::FromStr for GroupAddress {
    type Err = KnxError;

    fn from_str(s: &str) -> Result<Self> {
        let [main, middle, sub] = split_three(s).ok_or_else(KnxError::invalid_group_address)?;
        Self::new(main, middle, sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_valid() {
        let addr = GroupAddress::new(1, 2, 3).unwrap();
        assert_eq!(addr.main(), 1);
        assert_eq!(addr.middle(), 2);
        assert_eq!(addr.sub(), 3);
    }

    #[test]
    fn test_new_out_of_range() {
        assert!(GroupAddress::new(32, 0, 0).is_err());
        assert!(GroupAddress::new(0, 8, 0).is_err());
    }

    #[test]
    fn test_raw_layout() {
        // 1/2/3 = 0b00001_010_00000011
        let addr = GroupAddress::from(0x0A03u16);
        assert_eq!(addr.to_string(), "1/2/3");
        assert_eq!(addr.to_be_bytes(), [0x0A, 0x03]);
        assert_eq!(u16::from(GroupAddress::new(31, 7, 255).unwrap()), 0xFFFF);
    }

    #[test]
    fn test_round_trip_text() {
        for text in ["0/0/0", "1/2/3", "31/7/255", "15/0/128", "0/7/9"] {
            let addr: GroupAddress = text.parse().unwrap();
            assert_eq!(addr.to_string(), text);
        }
    }

    #[test]
    fn test_round_trip_every_raw_value() {
        for raw in (0..=u16::MAX).step_by(97) {
            let addr = GroupAddress::from(raw);
            let parsed: GroupAddress = addr.to_string().parse().unwrap();
            assert_eq!(parsed, addr);
        }
    }

    #[test]
    fn test_from_str_invalid() {
        for text in [
            "", "1", "1/2", "1/2/3/4", "a/b/c", "1/2/x", "32/0/0", "0/8/0", "0/0/256", "1//3",
            "+1/2/3", " 1/2/3", "1/2/3/", "01/2/3", "0/0/0255", "00000000000031/7/255", "0/00/1",
        ] {
            let err = text.parse::<GroupAddress>().unwrap_err();
            assert!(err.is_address_format(), "{text:?} should be rejected");
        }
    }
}
