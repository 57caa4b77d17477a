#![doc = "Wire structures for the Qualcomm/LG download-mode protocol"]
#![doc(html_logo_url = "https://cdnweb.devolutions.net/images/projects/devolutions/logos/devolutions-icon-shadow.svg")]

use core::fmt;

#[macro_use]
mod macros;

pub mod command;
pub mod cursor;
pub mod debug;
pub mod emmc;
pub mod nak;
pub mod opcode;

pub type PduResult<T> = Result<T, PduError>;

/// Error type for wire encoding and decoding.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PduError {
    /// The buffer is shorter than the structure being decoded.
    NotEnoughBytes {
        /// Name of the structure.
        name: &'static str,
        /// Number of bytes available.
        received: usize,
        /// Number of bytes required.
        expected: usize,
    },
    /// A field holds a value the wire format cannot carry.
    InvalidMessage {
        /// Name of the structure.
        name: &'static str,
        /// Name of the offending field.
        field: &'static str,
        /// Why the value is rejected.
        reason: &'static str,
    },
}

impl fmt::Display for PduError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotEnoughBytes {
                name,
                received,
                expected,
            } => write!(
                f,
                "not enough bytes for {name}: received {received} bytes, expected {expected} bytes"
            ),
            Self::InvalidMessage { name, field, reason } => {
                write!(f, "invalid `{field}` in {name}: {reason}")
            }
        }
    }
}

impl core::error::Error for PduError {}
