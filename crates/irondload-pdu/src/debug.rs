//! Memory-debug region records carried by a MEM_DEBUG_INFO response.

use crate::cursor::ReadCursor;
use crate::{PduError, PduResult};

/// One memory region advertised by the device.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MemoryRegion {
    pub attributes: u16,
    pub base: u32,
    pub length: u32,
    pub description: String,
    pub file_name: String,
}

impl MemoryRegion {
    const NAME: &'static str = "MEM_DEBUG_INFO";
    const FIXED_PART_SIZE: usize = 1 + 2 + 4 + 4;
}

/// Decodes the MEM_DEBUG_INFO payload.
///
/// Records are concatenated; each leads with a one-byte continuation flag.
/// The record that carries a flag other than 1 is the last one.
pub fn parse_memory_regions(data: &[u8]) -> PduResult<Vec<MemoryRegion>> {
    let mut src = ReadCursor::new(data);
    let mut regions = Vec::new();

    while !src.is_empty() {
        ensure_size!(name: MemoryRegion::NAME, in: src, size: MemoryRegion::FIXED_PART_SIZE);
        let flag = src.read_u8();
        let attributes = src.read_u16_be();
        let base = src.read_u32_be();
        let length = src.read_u32_be();
        let description = read_cstr(&mut src, "description")?;
        let file_name = read_cstr(&mut src, "file_name")?;

        regions.push(MemoryRegion {
            attributes,
            base,
            length,
            description,
            file_name,
        });

        if flag != 1 {
            break;
        }
    }

    Ok(regions)
}

fn read_cstr(src: &mut ReadCursor<'_>, field: &'static str) -> PduResult<String> {
    let terminator = src
        .remaining()
        .iter()
        .position(|&byte| byte == 0)
        .ok_or(PduError::InvalidMessage {
            name: MemoryRegion::NAME,
            field,
            reason: "missing NUL terminator",
        })?;

    let text = String::from_utf8_lossy(src.read_slice(terminator)).into_owned();
    src.read_u8();
    Ok(text)
}
