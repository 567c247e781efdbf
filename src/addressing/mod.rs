//! Addressing.
//!
//! Three address kinds meet in the bridge:
//! - Group addresses on the bus (Main/Middle/Sub)
//! - Individual addresses of the devices that sent a telegram (Area.Line.Device)
//! - Host channels naming configured device slots

pub mod channel;
pub mod group;
pub mod individual;

pub use channel::Channel;
pub use group::GroupAddress;
pub use individual::IndividualAddress;
