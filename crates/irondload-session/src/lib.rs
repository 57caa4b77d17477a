#![doc = "Blocking client driver for the Qualcomm/LG download-mode protocol"]
#![doc(html_logo_url = "https://cdnweb.devolutions.net/images/projects/devolutions/logos/devolutions-icon-shadow.svg")]

mod client;
mod framer;

use core::fmt;
use std::io;

use irondload_lz::LzError;
use irondload_pdu::nak::NakReason;
use irondload_pdu::PduError;

pub use client::DownloadClient;
pub use framer::Framer;

pub type SessionResult<T> = Result<T, SessionError>;

/// Error type for download-mode sessions.
///
/// Errors terminate the running operation; there are no retries at this
/// layer. After a [`SessionError::Decompression`] the client's decompressor
/// state is poisoned and must be reset before further EMMC reads.
#[derive(Debug)]
pub enum SessionError {
    /// The transport failed.
    Io(io::Error),
    /// The framer returned an empty frame, meaning the receive timeout
    /// elapsed without a response.
    Timeout,
    /// The response opcode neither matches the expectation nor is a NAK.
    UnexpectedResponse {
        /// Opcode the command expects back.
        expected: u8,
        /// Opcode actually received.
        got: u8,
    },
    /// The device rejected the command.
    Nak(NakReason),
    /// The compressed EMMC stream could not be decoded.
    Decompression(LzError),
    /// A response could not be parsed.
    Pdu(PduError),
    /// The session is not configured for the attempted operation.
    Config {
        /// Why the configuration is unusable.
        reason: &'static str,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(_) => write!(f, "transport error"),
            Self::Timeout => write!(f, "no response before the receive timeout"),
            Self::UnexpectedResponse { expected, got } => {
                write!(f, "unexpected response opcode: expected {expected:#04x}, got {got:#04x}")
            }
            Self::Nak(reason) => write!(f, "device rejected the command: {reason}"),
            Self::Decompression(_) => write!(f, "failed to decompress the EMMC stream"),
            Self::Pdu(_) => write!(f, "malformed response"),
            Self::Config { reason } => write!(f, "session not configured: {reason}"),
        }
    }
}

impl core::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Io(error) => Some(error),
            Self::Decompression(error) => Some(error),
            Self::Pdu(error) => Some(error),
            Self::Timeout | Self::UnexpectedResponse { .. } | Self::Nak(_) | Self::Config { .. } => None,
        }
    }
}

impl From<io::Error> for SessionError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<LzError> for SessionError {
    fn from(error: LzError) -> Self {
        Self::Decompression(error)
    }
}

impl From<PduError> for SessionError {
    fn from(error: PduError) -> Self {
        Self::Pdu(error)
    }
}
