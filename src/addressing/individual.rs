//! KNX Individual Address.
//!
//! Individual addresses identify physical devices (`area.line.device`). The
//! bridge only ever sees them as the source of a received telegram, so this
//! type is read-only: it is built from the 16-bit wire value and printed.

use core::fmt;

/// Source address of a telegram (`area.line.device`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct IndividualAddress {
    raw: u16,
}

impl IndividualAddress {
    /// Area component (0-15).
    #[inline(always)]
    pub const fn area(self) -> u8 {
        ((self.raw >> 12) & 0x0F) as u8
    }

    /// Line component (0-15).
    #[inline(always)]
    pub const fn line(self) -> u8 {
        ((self.raw >> 8) & 0x0F) as u8
    }

    /// Device component (0-255).
    #[inline(always)]
    pub const fn device(self) -> u8 {
        (self.raw & 0xFF) as u8
    }

    /// Decode from two big-endian bytes.
    #[inline]
    pub const fn from_be_bytes(bytes: [u8; 2]) -> Self {
        Self {
            raw: u16::from_be_bytes(bytes),
        }
    }
}

impl From<u16> for IndividualAddress {
    #[inline(always)]
    fn from(raw: u16) -> Self {
        Self { raw }
    }
}

impl From<IndividualAddress> for u16 {
    #[inline(always)]
    fn from(addr: IndividualAddress) -> u16 {
        addr.raw
    }
}

impl fmt::Display for IndividualAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.area(), self.line(), self.device())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_components() {
        let addr = IndividualAddress::from(0x11FAu16);
        assert_eq!(addr.area(), 1);
        assert_eq!(addr.line(), 1);
        assert_eq!(addr.device(), 250);
        assert_eq!(addr.to_string(), "1.1.250");
    }

    #[test]
    fn test_from_be_bytes() {
        let addr = IndividualAddress::from_be_bytes([0xF3, 0x07]);
        assert_eq!(u16::from(addr), 0xF307);
        assert_eq!(addr.to_string(), "15.3.7");
    }
}
