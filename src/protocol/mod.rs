//! Wire formats.
//!
//! - [`apdu`]: group APDUs as they travel on the bus
//! - [`knxd`]: the local daemon protocol that carries them to us

pub mod apdu;
pub mod knxd;

pub use apdu::{Apdu, ApduEvent, ApduType};
