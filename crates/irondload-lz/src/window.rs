use crate::error::LzError;

/// Number of trailing output bytes that stay addressable for back-references.
pub const MAX_WINDOW_SIZE: usize = 0x1_0000;

/// Decompressed output arena.
///
/// Back-references address the tail of everything produced so far, so the
/// buffer grows until the decompressor drains the prefix that no longer has
/// to stay addressable (everything older than [`MAX_WINDOW_SIZE`]).
#[derive(Debug, Default)]
pub(crate) struct Window {
    buf: Vec<u8>,
}

impl Window {
    pub(crate) fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn push_slice(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Appends `copy_bytes` bytes read starting `offset` bytes behind the
    /// current tail.
    ///
    /// When the count exceeds the offset the tail region repeats, which is
    /// how the format expresses runs (offset 1 with count 5 repeats one byte
    /// five times). The source region is the tail as it was before this call.
    pub(crate) fn copy_from_tail(&mut self, offset: usize, copy_bytes: usize) -> Result<(), LzError> {
        if offset == 0 || offset > self.buf.len() {
            return Err(LzError::InvalidBackReference {
                offset,
                available: self.buf.len(),
            });
        }

        let start = self.buf.len() - offset;

        if copy_bytes <= offset {
            self.buf.extend_from_within(start..start + copy_bytes);
        } else {
            let tail = self.buf[start..].to_vec();
            for _ in 0..copy_bytes / offset {
                self.buf.extend_from_slice(&tail);
            }
            self.buf.extend_from_slice(&tail[..copy_bytes % offset]);
        }

        Ok(())
    }

    /// Hands back everything older than the retained window.
    pub(crate) fn drain_excess(&mut self) -> Vec<u8> {
        debug_assert!(self.buf.len() > MAX_WINDOW_SIZE);
        let split = self.buf.len() - MAX_WINDOW_SIZE;
        self.buf.drain(..split).collect()
    }

    pub(crate) fn take_all(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.buf)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn copy_without_history_is_rejected() {
        let mut window = Window::new();
        assert_eq!(
            window.copy_from_tail(1, 3),
            Err(LzError::InvalidBackReference {
                offset: 1,
                available: 0
            })
        );
    }

    #[test]
    fn copy_deeper_than_history_is_rejected() {
        let mut window = Window::new();
        window.push_slice(b"ab");
        assert_eq!(
            window.copy_from_tail(3, 3),
            Err(LzError::InvalidBackReference {
                offset: 3,
                available: 2
            })
        );
    }

    #[test]
    fn zero_offset_is_rejected() {
        let mut window = Window::new();
        window.push_slice(b"ab");
        assert!(window.copy_from_tail(0, 3).is_err());
    }

    #[test]
    fn overlapping_copy_repeats_the_tail() {
        let mut window = Window::new();
        window.push_slice(b"ab");
        window.copy_from_tail(2, 5).unwrap();
        assert_eq!(window.take_all(), b"abababa");
    }

    #[test]
    fn drain_excess_keeps_the_window_tail() {
        let mut window = Window::new();
        window.push_slice(&vec![0x11; MAX_WINDOW_SIZE]);
        window.push_slice(&[0x22; 100]);
        let head = window.drain_excess();
        assert_eq!(head, vec![0x11; 100]);
        assert_eq!(window.len(), MAX_WINDOW_SIZE);
    }

    proptest! {
        #[test]
        fn copy_matches_naive_back_reference_loop(
            seed in proptest::collection::vec(any::<u8>(), 1..128),
            offset in 1_usize..64,
            copy_bytes in 3_usize..512,
        ) {
            prop_assume!(offset <= seed.len());

            let mut window = Window::new();
            window.push_slice(&seed);
            window.copy_from_tail(offset, copy_bytes).unwrap();

            let mut naive = seed.clone();
            for _ in 0..copy_bytes {
                let byte = naive[naive.len() - offset];
                naive.push(byte);
            }

            prop_assert_eq!(window.take_all(), naive);
        }
    }
}
