//! Host-facing channel addresses.
//!
//! A channel names a device slot known to the home-automation host. It looks
//! like a group address (`a/b/c`) but lives in its own namespace and each
//! component spans the full 0-255 range.
//!
//! Configuration files write channels as `[a, b, c]`, host commands may use
//! either that form or the `"a/b/c"` string. Serialization always produces the
//! string form.

use crate::addressing::group::split_three;
use crate::error::{KnxError, Result};
use core::fmt;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Three-component host channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Channel {
    parts: [u8; 3],
}

impl Channel {
    /// Create a channel from its components.
    pub const fn new(a: u8, b: u8, c: u8) -> Self {
        Self { parts: [a, b, c] }
    }

    /// Components in order.
    pub const fn parts(&self) -> [u8; 3] {
        self.parts
    }
}

impl From<[u8; 3]> for Channel {
    fn from(parts: [u8; 3]) -> Self {
        Self { parts }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.parts;
        write!(f, "{a}/{b}/{c}")
    }
}

impl core::str::FromStr for Channel {
    type Err = KnxError;

    fn from_str(s: &str) -> Result<Self> {
        split_three(s)
            .map(Self::from)
            .ok_or_else(KnxError::invalid_channel)
    }
}

impl Serialize for Channel {
    fn serialize<S: Serializer>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Either accepted JSON shape, before the text form is validated.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ChannelRepr {
    Parts([u8; 3]),
    Text(String),
}

impl ChannelRepr {
    pub(crate) fn into_channel(self) -> Result<Channel> {
        match self {
            Self::Parts(parts) => Ok(Channel::from(parts)),
            Self::Text(text) => text.parse(),
        }
    }
}

impl<'de> Deserialize<'de> for Channel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> core::result::Result<Self, D::Error> {
        ChannelRepr::deserialize(deserializer)?
            .into_channel()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let channel: Channel = "1/2/3".parse().unwrap();
        assert_eq!(channel, Channel::new(1, 2, 3));
        assert_eq!(channel.to_string(), "1/2/3");

        // No bit-width limits unlike group addresses
        let wide: Channel = "200/100/255".parse().unwrap();
        assert_eq!(wide.parts(), [200, 100, 255]);
    }

    #[test]
    fn test_parse_invalid() {
        for text in ["", "1/2", "1/2/3/4", "1/x/3", "256/0/0"] {
            let err = text.parse::<Channel>().unwrap_err();
            assert!(matches!(err, KnxError::Addressing(ref e) if e.is_channel()));
        }
    }

    #[test]
    fn test_deserialize_both_forms() {
        let from_array: Channel = serde_json::from_str("[4, 5, 6]").unwrap();
        let from_text: Channel = serde_json::from_str("\"4/5/6\"").unwrap();
        assert_eq!(from_array, from_text);
        assert!(serde_json::from_str::<Channel>("\"4/5\"").is_err());
        assert!(serde_json::from_str::<Channel>("[1, 2]").is_err());
    }

    #[test]
    fn test_serialize_as_text() {
        let json = serde_json::to_string(&Channel::new(1, 2, 3)).unwrap();
        assert_eq!(json, "\"1/2/3\"");
    }
}
