//! Helper macros for wire decoding.

macro_rules! ensure_size {
    (name: $name:expr, in: $buf:ident, size: $expected:expr) => {{
        let received = $buf.len();
        let expected = $expected;
        if !(received >= expected) {
            return Err($crate::PduError::NotEnoughBytes {
                name: $name,
                received,
                expected,
            });
        }
    }};
    (in: $buf:ident, size: $expected:expr) => {{
        ensure_size!(name: Self::NAME, in: $buf, size: $expected)
    }};
}

macro_rules! ensure_fixed_part_size {
    (in: $buf:ident) => {{
        ensure_size!(name: Self::NAME, in: $buf, size: Self::FIXED_PART_SIZE)
    }};
}
