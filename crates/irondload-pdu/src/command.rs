//! Request bodies and simple response payloads.
//!
//! Request builders return the command body only; the opcode byte is
//! prepended by the sender. Memory addresses are big-endian on the wire.

use crate::cursor::ReadCursor;
use crate::{PduError, PduResult};

/// Canonical code accepted by the UNLOCK command.
pub const UNLOCK_CODE: &[u8] = b"d|f|++-+";

/// Body of a WRITE request: `u24be(addr) ∥ u16be(len) ∥ data`.
pub fn write_request(addr: u32, data: &[u8]) -> PduResult<Vec<u8>> {
    if addr > 0x00FF_FFFF {
        return Err(PduError::InvalidMessage {
            name: "WRITE",
            field: "addr",
            reason: "does not fit in 24 bits",
        });
    }
    let len = data_len("WRITE", data)?;

    let mut body = Vec::with_capacity(5 + data.len());
    body.extend_from_slice(&addr.to_be_bytes()[1..]);
    body.extend_from_slice(&len.to_be_bytes());
    body.extend_from_slice(data);
    Ok(body)
}

/// Body of a WRITE32 request: `u32be(addr) ∥ u16be(len) ∥ data`.
pub fn write32_request(addr: u32, data: &[u8]) -> PduResult<Vec<u8>> {
    let len = data_len("WRITE32", data)?;

    let mut body = Vec::with_capacity(6 + data.len());
    body.extend_from_slice(&addr.to_be_bytes());
    body.extend_from_slice(&len.to_be_bytes());
    body.extend_from_slice(data);
    Ok(body)
}

/// Body of a GO request: `u32be(addr)`.
pub fn go_request(addr: u32) -> Vec<u8> {
    addr.to_be_bytes().to_vec()
}

/// Body of a MEM_READ_REQ request: `u32be(addr) ∥ u16be(len)`.
pub fn mem_read_request(addr: u32, len: u16) -> Vec<u8> {
    let mut body = Vec::with_capacity(6);
    body.extend_from_slice(&addr.to_be_bytes());
    body.extend_from_slice(&len.to_be_bytes());
    body
}

fn data_len(name: &'static str, data: &[u8]) -> PduResult<u16> {
    u16::try_from(data.len()).map_err(|_| PduError::InvalidMessage {
        name,
        field: "data",
        reason: "longer than a 16-bit length can carry",
    })
}

/// `u8(len) ∥ text[len]` payload shared by the PARAMS and VERRSP responses.
pub fn parse_text_response(name: &'static str, data: &[u8]) -> PduResult<String> {
    ensure_size!(name: name, in: data, size: 1);
    let mut src = ReadCursor::new(data);
    let len = usize::from(src.read_u8());
    ensure_size!(name: name, in: src, size: len);
    Ok(String::from_utf8_lossy(src.read_slice(len)).into_owned())
}

/// MEM_READ_RESP payload: `u32be(addr) ∥ u16be(len) ∥ data`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MemReadResponse<'a> {
    pub addr: u32,
    pub data: &'a [u8],
}

impl<'a> MemReadResponse<'a> {
    const NAME: &'static str = "MEM_READ_RESP";
    const FIXED_PART_SIZE: usize = 4 + 2;

    pub fn decode(data: &'a [u8]) -> PduResult<Self> {
        let mut src = ReadCursor::new(data);
        ensure_fixed_part_size!(in: src);

        let addr = src.read_u32_be();
        let len = usize::from(src.read_u16_be());
        ensure_size!(in: src, size: len);

        Ok(Self {
            addr,
            data: src.read_slice(len),
        })
    }
}
