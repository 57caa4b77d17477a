//! Paged EMMC read dialects.
//!
//! Devices speak one of three dialects of the same read protocol. They
//! differ in opcode, paging width, response framing and the layout of the
//! NAND_INIT geometry response. The dialect cannot be queried directly; it
//! is inferred from the device model and the init response length (see
//! [`Variant::select`]).

use core::time::Duration;

use crate::cursor::ReadCursor;
use crate::{opcode, PduResult};

/// One EMMC read dialect.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Variant {
    /// Legacy dialect: opcode 0x50, 15-byte read header.
    V0,
    /// Wide-header dialect: opcode 0x50, 23-byte read header.
    V1,
    /// Small-page dialect spoken by LGE430/LGE435 boards: opcode 0x99.
    V2,
}

/// Storage geometry reported by the NAND_INIT command.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InitInfo {
    pub max_block_count: u32,
    pub max_block_size: u32,
    pub max_page_size: u32,
    pub max_page_count: Option<u8>,
}

/// Split EMMC read response: compression flag plus raw payload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReadResponse<'a> {
    pub is_compressed: bool,
    pub payload: &'a [u8],
}

impl Variant {
    /// Picks the dialect for a device.
    ///
    /// LGE430/LGE435 boards always speak V2 regardless of the init
    /// response; otherwise an init response wider than 0x200 bytes
    /// identifies V1.
    pub fn select(model: &str, init_response_len: usize) -> Self {
        if model.contains("_LGE430_") || model.contains("_LGE435_") {
            Self::V2
        } else if init_response_len > 0x200 {
            Self::V1
        } else {
            Self::V0
        }
    }

    pub fn read_opcode(self) -> u8 {
        match self {
            Self::V0 | Self::V1 => opcode::EMMC_READ,
            Self::V2 => opcode::EMMC_READ_ALT,
        }
    }

    /// Number of blocks a single read request covers.
    pub fn blocks_per_read(self) -> u16 {
        match self {
            Self::V0 | Self::V1 => 0x200,
            Self::V2 => 6,
        }
    }

    /// Receive timeout to install while this dialect is active.
    pub fn connection_timeout(self) -> Duration {
        match self {
            Self::V0 | Self::V1 => Duration::from_millis(250),
            Self::V2 => Duration::from_millis(20),
        }
    }

    /// Builds the body of a read request for the blocks starting at
    /// `block_num`. Block numbers are little-endian, unlike the memory
    /// addresses elsewhere in the protocol.
    pub fn read_request(self, block_num: u32) -> Vec<u8> {
        let mut body = Vec::new();
        match self {
            Self::V0 => {
                body.push(0x00);
                body.extend_from_slice(&block_num.to_le_bytes());
            }
            Self::V1 => {
                body.extend_from_slice(&[0x00; 7]);
                body.extend_from_slice(&block_num.to_le_bytes());
                body.extend_from_slice(&u32::from(self.blocks_per_read()).to_le_bytes());
                body.extend_from_slice(&0_u32.to_le_bytes());
            }
            Self::V2 => {
                body.push(0x00);
                body.extend_from_slice(&block_num.to_le_bytes());
                body.extend_from_slice(&u32::from(self.blocks_per_read()).to_le_bytes());
            }
        }
        body
    }

    /// Splits a read response (opcode already stripped) into the
    /// compression flag and the data payload.
    pub fn parse_read_response(self, data: &[u8]) -> PduResult<ReadResponse<'_>> {
        let mut src = ReadCursor::new(data);
        match self {
            Self::V0 | Self::V2 => {
                ensure_size!(name: "EMMC_READ response", in: src, size: 15);
                let _err_code = src.read_u8();
                src.read_slice(8); // reserved
                let _declared_len = src.read_u32();
                src.read_u8();
                let is_compressed = src.read_u8() != 0;
                Ok(ReadResponse {
                    is_compressed,
                    payload: src.read_remaining(),
                })
            }
            Self::V1 => {
                ensure_size!(name: "EMMC_READ response", in: src, size: 23);
                let flag = src.read_u32();
                src.read_slice(11);
                let _declared_len = src.read_u32();
                src.read_slice(4);
                Ok(ReadResponse {
                    is_compressed: flag == 0x100,
                    payload: src.read_remaining(),
                })
            }
        }
    }

    /// Decodes the NAND_INIT geometry response (opcode already stripped).
    pub fn parse_init(self, data: &[u8]) -> PduResult<InitInfo> {
        let mut src = ReadCursor::new(data);
        match self {
            Self::V0 | Self::V2 => {
                ensure_size!(name: "NAND_INIT response", in: src, size: 17);
                src.read_slice(5); // err code + address
                let max_block_count = src.read_u32();
                let max_block_size = src.read_u32();
                let max_page_size = src.read_u32();
                let max_page_count = (!src.is_empty()).then(|| src.read_u8());
                Ok(InitInfo {
                    max_block_count,
                    max_block_size,
                    max_page_size,
                    max_page_count,
                })
            }
            Self::V1 => {
                ensure_size!(name: "NAND_INIT response", in: src, size: 19);
                src.read_slice(7);
                let max_block_count = src.read_u32();
                // This dialect reports the page size before the block size.
                let max_page_size = src.read_u32();
                let max_block_size = src.read_u32();
                Ok(InitInfo {
                    max_block_count,
                    max_block_size,
                    max_page_size,
                    max_page_count: None,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("VS840_LGE430_X", 0x100, Variant::V2)]
    #[case("VS840_LGE430_X", 0x300, Variant::V2)]
    #[case("VS930_LGE435_Y", 0x100, Variant::V2)]
    #[case("GENERIC_PHONE", 0x300, Variant::V1)]
    #[case("GENERIC_PHONE", 0x201, Variant::V1)]
    #[case("GENERIC_PHONE", 0x200, Variant::V0)]
    #[case("GENERIC_PHONE", 0x100, Variant::V0)]
    fn variant_selection(#[case] model: &str, #[case] init_len: usize, #[case] expected: Variant) {
        assert_eq!(Variant::select(model, init_len), expected);
    }

    #[test]
    fn v0_read_request_is_a_padded_little_endian_block_number() {
        assert_eq!(Variant::V0.read_request(0x0102_0304), [0x00, 0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn v1_read_request_carries_the_page_width() {
        let body = Variant::V1.read_request(2);
        let mut expected = vec![0x00; 7];
        expected.extend_from_slice(&[0x02, 0x00, 0x00, 0x00]);
        expected.extend_from_slice(&[0x00, 0x02, 0x00, 0x00]);
        expected.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        assert_eq!(body, expected);
    }

    #[test]
    fn v2_read_request_carries_its_block_count() {
        assert_eq!(
            Variant::V2.read_request(7),
            [0x00, 0x07, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn v0_response_splits_flag_and_payload() {
        let mut data = vec![0x00; 14];
        data.push(0x01); // compressed
        data.extend_from_slice(&[0xAA, 0xBB]);

        let response = Variant::V0.parse_read_response(&data).unwrap();
        assert!(response.is_compressed);
        assert_eq!(response.payload, [0xAA, 0xBB]);
    }

    #[test]
    fn v0_response_with_clear_flag_is_uncompressed() {
        let mut data = vec![0x00; 15];
        data.extend_from_slice(&[0xCC]);

        let response = Variant::V0.parse_read_response(&data).unwrap();
        assert!(!response.is_compressed);
        assert_eq!(response.payload, [0xCC]);
    }

    #[test]
    fn v1_response_flag_is_a_little_endian_word() {
        let mut data = vec![0x00, 0x01, 0x00, 0x00]; // 0x100
        data.extend_from_slice(&[0x00; 19]);
        data.extend_from_slice(&[0xDD]);

        let response = Variant::V1.parse_read_response(&data).unwrap();
        assert!(response.is_compressed);
        assert_eq!(response.payload, [0xDD]);

        let mut data = vec![0x01, 0x00, 0x00, 0x00];
        data.extend_from_slice(&[0x00; 19]);
        let response = Variant::V1.parse_read_response(&data).unwrap();
        assert!(!response.is_compressed);
    }

    #[test]
    fn truncated_read_response_is_rejected() {
        assert!(Variant::V0.parse_read_response(&[0x00; 14]).is_err());
        assert!(Variant::V1.parse_read_response(&[0x00; 22]).is_err());
    }

    #[test]
    fn v0_init_reads_geometry_after_the_header() {
        let mut data = vec![0x00; 5];
        data.extend_from_slice(&0x1000_u32.to_le_bytes());
        data.extend_from_slice(&0x200_u32.to_le_bytes());
        data.extend_from_slice(&0x800_u32.to_le_bytes());

        let info = Variant::V0.parse_init(&data).unwrap();
        assert_eq!(
            info,
            InitInfo {
                max_block_count: 0x1000,
                max_block_size: 0x200,
                max_page_size: 0x800,
                max_page_count: None,
            }
        );
    }

    #[test]
    fn v0_init_reads_the_optional_trailing_page_count() {
        let mut data = vec![0x00; 5];
        data.extend_from_slice(&[0x00; 12]);
        data.push(0x40);

        let info = Variant::V0.parse_init(&data).unwrap();
        assert_eq!(info.max_page_count, Some(0x40));
    }

    #[test]
    fn v1_init_swaps_page_and_block_sizes() {
        let mut data = vec![0x00; 7];
        data.extend_from_slice(&0x1000_u32.to_le_bytes());
        data.extend_from_slice(&0x800_u32.to_le_bytes());
        data.extend_from_slice(&0x200_u32.to_le_bytes());

        let info = Variant::V1.parse_init(&data).unwrap();
        assert_eq!(info.max_page_size, 0x800);
        assert_eq!(info.max_block_size, 0x200);
        assert_eq!(info.max_page_count, None);
    }

    #[test]
    fn truncated_init_response_is_rejected() {
        assert!(Variant::V0.parse_init(&[0x00; 16]).is_err());
        assert!(Variant::V1.parse_init(&[0x00; 18]).is_err());
    }
}
