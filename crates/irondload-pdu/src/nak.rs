use core::fmt;

/// Rejection reason carried by a NAK response.
///
/// The device follows the opcode with a big-endian `u16`. Known codes map to
/// the names below; unknown codes are carried through numerically rather
/// than rejected.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct NakReason(pub u16);

impl NakReason {
    pub const INVALID_FCS: Self = Self(1);
    pub const INVALID_DEST: Self = Self(2);
    pub const INVALID_LEN: Self = Self(3);
    pub const EARLY_END: Self = Self(4);
    pub const TOO_LARGE: Self = Self(5);
    pub const INVALID_CMD: Self = Self(6);
    pub const FAILED: Self = Self(7);
    pub const WRONG_IID: Self = Self(8);
    pub const BAD_VPP: Self = Self(9);
    pub const VERIFY_FAILED: Self = Self(10);
    pub const NO_SEC_CODE: Self = Self(11);
    pub const BAD_SEC_CODE: Self = Self(12);
    pub const OP_NOT_PERMITTED: Self = Self(14);
    pub const INVALID_ADDR: Self = Self(15);
    pub const ADDR_MISMATCH: Self = Self(16);
    pub const FAIL_NAND_PRG: Self = Self(17);

    pub fn name(self) -> Option<&'static str> {
        match self.0 {
            1 => Some("NAK_INVALID_FCS"),
            2 => Some("NAK_INVALID_DEST"),
            3 => Some("NAK_INVALID_LEN"),
            4 => Some("NAK_EARLY_END"),
            5 => Some("NAK_TOO_LARGE"),
            6 => Some("NAK_INVALID_CMD"),
            7 => Some("NAK_FAILED"),
            8 => Some("NAK_WRONG_IID"),
            9 => Some("NAK_BAD_VPP"),
            10 => Some("NAK_VERIFY_FAILED"),
            11 => Some("NAK_NO_SEC_CODE"),
            12 => Some("NAK_BAD_SEC_CODE"),
            14 => Some("NAK_OP_NOT_PERMITTED"),
            15 => Some("NAK_INVALID_ADDR"),
            16 => Some("NAK_ADDR_MISMATCH"),
            17 => Some("NAK_FAIL_NAND_PRG"),
            _ => None,
        }
    }
}

impl From<u16> for NakReason {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for NakReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "NAK reason {}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(1, "NAK_INVALID_FCS")]
    #[case(2, "NAK_INVALID_DEST")]
    #[case(3, "NAK_INVALID_LEN")]
    #[case(4, "NAK_EARLY_END")]
    #[case(5, "NAK_TOO_LARGE")]
    #[case(6, "NAK_INVALID_CMD")]
    #[case(7, "NAK_FAILED")]
    #[case(8, "NAK_WRONG_IID")]
    #[case(9, "NAK_BAD_VPP")]
    #[case(10, "NAK_VERIFY_FAILED")]
    #[case(11, "NAK_NO_SEC_CODE")]
    #[case(12, "NAK_BAD_SEC_CODE")]
    #[case(14, "NAK_OP_NOT_PERMITTED")]
    #[case(15, "NAK_INVALID_ADDR")]
    #[case(16, "NAK_ADDR_MISMATCH")]
    #[case(17, "NAK_FAIL_NAND_PRG")]
    fn known_reasons_decode_to_their_names(#[case] code: u16, #[case] name: &str) {
        assert_eq!(NakReason(code).to_string(), name);
    }

    #[rstest]
    #[case(0)]
    #[case(13)]
    #[case(0xFFFF)]
    fn unknown_reasons_surface_the_numeric_code(#[case] code: u16) {
        let reason = NakReason(code);
        assert_eq!(reason.name(), None);
        assert_eq!(reason.to_string(), format!("NAK reason {code}"));
    }
}
