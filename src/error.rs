//! Error types for the KNX bridge.
//!
//! Every fallible operation returns [`KnxError`]. Each category wraps a small
//! struct holding a private kind plus a backtrace, and callers inspect it
//! through `is_*` helpers rather than matching on kinds directly.
//!
//! Decode errors are produced for every bad telegram seen on the bus, so their
//! constructors skip backtrace capture.

use core::fmt;
use std::backtrace::Backtrace;

/// Result type alias for bridge operations.
pub type Result<T> = core::result::Result<T, KnxError>;

// =============================================================================
// Error Kind Enums (Internal)
// =============================================================================

/// Addressing error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AddressingErrorKind {
    InvalidGroupAddress,
    InvalidChannel,
    OutOfRange,
}

/// Frame decoding error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameErrorKind {
    Malformed,
    Truncated,
    UnknownApdu,
}

/// Transport error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransportErrorKind {
    ConnectFailed,
    OpenFailed,
    ReadFailed,
    WriteFailed,
    UnexpectedReply,
    InvalidState,
    Closed,
}

/// Configuration error variants (internal)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigurationErrorKind {
    Io,
    Syntax,
    MissingAttribute,
    UnsupportedEndpoint,
}

// =============================================================================
// Main Error Type
// =============================================================================

/// Bridge error types.
#[derive(Debug)]
pub enum KnxError {
    /// Malformed group address or channel notation
    Addressing(AddressingError),
    /// Telegram that could not be decoded
    Frame(FrameError),
    /// Connection, read or write failure on the bus transport
    Transport(TransportError),
    /// Unusable configuration
    Configuration(ConfigurationError),
}

// =============================================================================
// Structured Error Types
// =============================================================================

/// Addressing error with backtrace
#[derive(Debug)]
pub struct AddressingError {
    kind: AddressingErrorKind,
    backtrace: Backtrace,
}

impl AddressingError {
    pub(crate) fn new(kind: AddressingErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
        }
    }

    /// Check if a component exceeded its bit width
    pub fn is_out_of_range(&self) -> bool {
        matches!(self.kind, AddressingErrorKind::OutOfRange)
    }

    /// Check if this came from parsing a channel rather than a group address
    pub fn is_channel(&self) -> bool {
        matches!(self.kind, AddressingErrorKind::InvalidChannel)
    }

    /// Captured backtrace (empty unless `RUST_BACKTRACE` is set)
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

/// Frame decoding error
#[derive(Debug)]
pub struct FrameError {
    kind: FrameErrorKind,
    backtrace: Backtrace,
}

impl FrameError {
    /// Control bits in byte 0 were not zero
    pub fn is_malformed(&self) -> bool {
        matches!(self.kind, FrameErrorKind::Malformed)
    }

    /// Frame shorter than the two mandatory bytes
    pub fn is_truncated(&self) -> bool {
        matches!(self.kind, FrameErrorKind::Truncated)
    }

    /// Reserved APDU type bits (`11`)
    pub fn is_unknown_apdu(&self) -> bool {
        matches!(self.kind, FrameErrorKind::UnknownApdu)
    }

    /// Always disabled: frame errors are raised on the receive path
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

/// Transport error with backtrace
#[derive(Debug)]
pub struct TransportError {
    kind: TransportErrorKind,
    backtrace: Backtrace,
}

impl TransportError {
    pub(crate) fn new(kind: TransportErrorKind) -> Self {
        Self {
            kind,
            backtrace: Backtrace::capture(),
        }
    }

    /// Transport was shut down while the caller was waiting on it
    pub fn is_closed(&self) -> bool {
        matches!(self.kind, TransportErrorKind::Closed)
    }

    /// Could not reach the bus daemon
    pub fn is_connect_failed(&self) -> bool {
        matches!(self.kind, TransportErrorKind::ConnectFailed)
    }

    /// Daemon refused to open a group association
    pub fn is_open_failed(&self) -> bool {
        matches!(self.kind, TransportErrorKind::OpenFailed)
    }

    /// Captured backtrace (empty unless `RUST_BACKTRACE` is set)
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }
}

/// Configuration error carrying a description of what was wrong
#[derive(Debug)]
pub struct ConfigurationError {
    kind: ConfigurationErrorKind,
    detail: String,
}

impl ConfigurationError {
    pub(crate) fn new(kind: ConfigurationErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Check if a required device attribute was absent or not a string
    pub fn is_missing_attribute(&self) -> bool {
        matches!(self.kind, ConfigurationErrorKind::MissingAttribute)
    }

    /// Check if the connection URL scheme is not supported
    pub fn is_unsupported_endpoint(&self) -> bool {
        matches!(self.kind, ConfigurationErrorKind::UnsupportedEndpoint)
    }

    /// Human-readable detail
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

// =============================================================================
// Convenience Constructors for KnxError
// =============================================================================

impl KnxError {
    // Frame errors
    #[inline]
    pub(crate) const fn malformed_frame() -> Self {
        Self::Frame(FrameError { kind: FrameErrorKind::Malformed, backtrace: Backtrace::disabled() })
    }

    #[inline]
    pub(crate) const fn truncated_frame() -> Self {
        Self::Frame(FrameError { kind: FrameErrorKind::Truncated, backtrace: Backtrace::disabled() })
    }

    #[inline]
    pub(crate) const fn unknown_apdu() -> Self {
        Self::Frame(FrameError { kind: FrameErrorKind::UnknownApdu, backtrace: Backtrace::disabled() })
    }

    // Addressing errors
    pub(crate) fn invalid_group_address() -> Self {
        Self::Addressing(AddressingError::new(AddressingErrorKind::InvalidGroupAddress))
    }

    pub(crate) fn invalid_channel() -> Self {
        Self::Addressing(AddressingError::new(AddressingErrorKind::InvalidChannel))
    }

    pub(crate) fn address_out_of_range() -> Self {
        Self::Addressing(AddressingError::new(AddressingErrorKind::OutOfRange))
    }

    // Transport errors
    pub(crate) fn connect_failed() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::ConnectFailed))
    }

    pub(crate) fn open_failed() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::OpenFailed))
    }

    pub(crate) fn read_failed() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::ReadFailed))
    }

    pub(crate) fn write_failed() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::WriteFailed))
    }

    pub(crate) fn unexpected_reply() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::UnexpectedReply))
    }

    pub(crate) fn invalid_state() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::InvalidState))
    }

    pub(crate) fn transport_closed() -> Self {
        Self::Transport(TransportError::new(TransportErrorKind::Closed))
    }

    // Configuration errors
    pub(crate) fn config_io(detail: impl Into<String>) -> Self {
        Self::Configuration(ConfigurationError::new(ConfigurationErrorKind::Io, detail))
    }

    pub(crate) fn config_syntax(detail: impl Into<String>) -> Self {
        Self::Configuration(ConfigurationError::new(ConfigurationErrorKind::Syntax, detail))
    }

    pub(crate) fn missing_attribute(detail: impl Into<String>) -> Self {
        Self::Configuration(ConfigurationError::new(
            ConfigurationErrorKind::MissingAttribute,
            detail,
        ))
    }

    pub(crate) fn unsupported_endpoint(detail: impl Into<String>) -> Self {
        Self::Configuration(ConfigurationError::new(
            ConfigurationErrorKind::UnsupportedEndpoint,
            detail,
        ))
    }

    // Predicates spanning categories

    /// Malformed textual group address or channel.
    pub fn is_address_format(&self) -> bool {
        matches!(self, KnxError::Addressing(_))
    }

    /// Any telegram decode failure. These never end a listener.
    pub fn is_frame(&self) -> bool {
        matches!(self, KnxError::Frame(_))
    }

    /// Any transport failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, KnxError::Transport(_))
    }

    /// Transport shut down underneath the caller.
    pub fn is_closed(&self) -> bool {
        matches!(self, KnxError::Transport(e) if e.is_closed())
    }
}

// =============================================================================
// Display Implementation
// =============================================================================

impl fmt::Display for KnxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KnxError::Addressing(e) => write!(f, "Addressing error: {:?}", e.kind),
            KnxError::Frame(e) => write!(f, "Frame error: {:?}", e.kind),
            KnxError::Transport(e) => write!(f, "Transport error: {:?}", e.kind),
            KnxError::Configuration(e) => {
                write!(f, "Configuration error: {:?}: {}", e.kind, e.detail)
            }
        }
    }
}

impl std::error::Error for KnxError {}
