//! Bus transports.
//!
//! [`transport`] defines the connection traits; [`knxd`] implements them over
//! a knxd socket and [`mock_transport`] in memory. [`writer`] multiplexes host
//! writes onto one shared connection.

pub mod knxd;
pub mod mock_transport;
pub mod transport;
pub mod writer;

pub use knxd::KnxdConnector;
pub use mock_transport::MockBus;
pub use transport::{BusConnection, BusConnector};
pub use writer::BusWriter;
