//! Single-byte command opcodes of the download-mode protocol.
//!
//! Every frame starts with one of these, on requests and responses alike.
//! Memory addresses in request bodies are big-endian; EMMC block numbers are
//! little-endian (see [`crate::emmc`]).

/// Write a block of data to a 24-bit memory address.
pub const WRITE: u8 = 0x01;
/// Positive acknowledgement.
pub const ACK: u8 = 0x02;
/// Negative acknowledgement, followed by a big-endian reason code.
pub const NAK: u8 = 0x03;
/// Begin execution at an address.
pub const GO: u8 = 0x05;
/// No operation.
pub const NOP: u8 = 0x06;
/// Request implementation info.
pub const PARAM_REQUEST: u8 = 0x07;
/// Implementation info response.
pub const PARAMS: u8 = 0x08;
/// Reset the device.
pub const RESET: u8 = 0x0A;
/// Unlock access to secured operations.
pub const UNLOCK: u8 = 0x0B;
/// Request software version info.
pub const VERSION_REQUEST: u8 = 0x0C;
/// Software version info response.
pub const VERSION_RESPONSE: u8 = 0x0D;
/// Turn device power off.
pub const POWER_OFF: u8 = 0x0E;
/// Write a block of data to a 32-bit memory address.
pub const WRITE_32: u8 = 0x0F;
/// Memory debug query.
pub const MEM_DEBUG_QUERY: u8 = 0x10;
/// Memory debug info response.
pub const MEM_DEBUG_INFO: u8 = 0x11;
/// Memory read request.
pub const MEM_READ_REQUEST: u8 = 0x12;
/// Memory read response.
pub const MEM_READ_RESPONSE: u8 = 0x13;
/// Storage geometry query; the response echoes the opcode.
pub const NAND_INIT: u8 = 0x30;
/// Switch into download mode; the response echoes the opcode.
pub const DLOAD_SWITCH: u8 = 0x3A;
/// Firmware staging command carrying a sub-command byte.
pub const FIRMWARE: u8 = 0x50;
/// Paged EMMC read (legacy dialects); shares its value with [`FIRMWARE`].
pub const EMMC_READ: u8 = 0x50;
/// Paged EMMC read (newer dialect).
pub const EMMC_READ_ALT: u8 = 0x99;
