use core::time::Duration;
use std::io;

/// Transport port carrying one framed packet in each direction.
///
/// The framing itself (HDLC-style escaping and checksums) lives behind this
/// trait; the driver only ever sees whole command and response payloads.
/// Commands are strictly one-in-flight: the driver sends, then receives,
/// before issuing the next command.
pub trait Framer {
    /// Transmits one framed packet. `empty_header` requests the bare
    /// no-prefix framing some bootloaders expect.
    fn send(&mut self, payload: &[u8], empty_header: bool) -> io::Result<()>;

    /// Receives one response frame. An empty frame means the receive
    /// timeout elapsed.
    fn recv(&mut self) -> io::Result<Vec<u8>>;

    /// Configures the receive timeout.
    fn set_timeout(&mut self, timeout: Duration);
}
