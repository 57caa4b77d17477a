use irondload_lz::Decompressor;
use irondload_pdu::command::{self, MemReadResponse};
use irondload_pdu::cursor::ReadCursor;
use irondload_pdu::debug::{parse_memory_regions, MemoryRegion};
use irondload_pdu::emmc::{InitInfo, Variant};
use irondload_pdu::nak::NakReason;
use irondload_pdu::{opcode, PduError};
use tracing::{debug, info, warn};

use crate::framer::Framer;
use crate::{SessionError, SessionResult};

/// Trailer appended to every EMMC read request. Opaque: sniffed from
/// devices, meaning unknown, but required for the command to be accepted.
const EMMC_READ_TRAILER: [u8; 4] = [0x06, 0x00, 0x00, 0x00];

/// Download-mode protocol driver.
///
/// Owns the decompressor for the EMMC read stream and the identified
/// dialect; borrows the framer for the lifetime of the session. All
/// operations are synchronous one-command round-trips.
pub struct DownloadClient<'a> {
    framer: &'a mut dyn Framer,
    decompressor: Decompressor,
    variant: Option<Variant>,
    model: Option<String>,
    init_info: Option<InitInfo>,
    has_more: bool,
}

impl<'a> DownloadClient<'a> {
    pub fn new(framer: &'a mut dyn Framer) -> Self {
        Self {
            framer,
            decompressor: Decompressor::new(),
            variant: None,
            model: None,
            init_info: None,
            has_more: false,
        }
    }

    /// The dialect identified by [`DownloadClient::identify_configuration`], if any.
    pub fn variant(&self) -> Option<Variant> {
        self.variant
    }

    /// The cached device model string, if fetched.
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Storage geometry stored by [`DownloadClient::initialize`], if any.
    pub fn init_info(&self) -> Option<InitInfo> {
        self.init_info
    }

    /// `true` while a previous [`DownloadClient::read_emmc`] left
    /// decompressed data to drain.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Fetches the device model, issues the storage init command and
    /// installs the dialect those two identify (which also sets the framer
    /// timeout and the active read opcode). Returns the raw init response.
    pub fn identify_configuration(&mut self) -> SessionResult<Vec<u8>> {
        let model = self.get_model()?;
        let init_response = self.send_command(opcode::NAND_INIT, opcode::NAND_INIT, &[])?;

        let variant = Variant::select(&model, init_response.len());
        info!(%model, ?variant, "identified download-mode dialect");

        self.framer.set_timeout(variant.connection_timeout());
        self.variant = Some(variant);
        self.model = Some(model);
        Ok(init_response)
    }

    /// Runs identification and stores the geometry the device reports.
    pub fn initialize(&mut self) -> SessionResult<InitInfo> {
        let init_response = self.identify_configuration()?;
        let info = self.active_variant()?.parse_init(&init_response)?;
        debug!(?info, "storage geometry");
        self.init_info = Some(info);
        Ok(info)
    }

    /// Reads a chunk of decompressed EMMC data for the block range starting
    /// at `block_num`.
    ///
    /// Streams larger than the decompressor's flush threshold come out in
    /// several chunks: while [`DownloadClient::has_more`] reports `true`,
    /// calling again drains the next chunk without touching the wire.
    pub fn read_emmc(&mut self, block_num: u32) -> SessionResult<Vec<u8>> {
        if self.decompressor.has_more() {
            let chunk = self.decompressor.feed(&[])?;
            self.has_more = self.decompressor.has_more();
            return Ok(chunk);
        }

        let variant = self.active_variant()?;
        let mut body = variant.read_request(block_num);
        body.extend_from_slice(&EMMC_READ_TRAILER);

        let raw = self.send_command(variant.read_opcode(), variant.read_opcode(), &body)?;
        let response = variant.parse_read_response(&raw)?;

        if response.is_compressed {
            debug!(block_num, payload_len = response.payload.len(), "compressed read");
            let chunk = self.decompressor.feed(response.payload)?;
            self.has_more = self.decompressor.has_more();
            Ok(chunk)
        } else {
            self.has_more = false;
            Ok(response.payload.to_vec())
        }
    }

    pub fn get_version(&mut self) -> SessionResult<String> {
        let response = self.send_command(opcode::VERSION_REQUEST, opcode::VERSION_RESPONSE, &[])?;
        Ok(command::parse_text_response("VERRSP", &response)?)
    }

    /// The version string with path separators flattened, as used for
    /// dialect selection.
    pub fn get_model(&mut self) -> SessionResult<String> {
        Ok(self.get_version()?.replace('/', "_"))
    }

    pub fn get_implementation(&mut self) -> SessionResult<String> {
        let response = self.send_command(opcode::PARAM_REQUEST, opcode::PARAMS, &[])?;
        Ok(command::parse_text_response("PARAMS", &response)?)
    }

    pub fn ping(&mut self) -> SessionResult<()> {
        self.send_command(opcode::NOP, opcode::ACK, &[])?;
        Ok(())
    }

    pub fn reset(&mut self) -> SessionResult<()> {
        self.send_command(opcode::RESET, opcode::ACK, &[])?;
        Ok(())
    }

    pub fn power_off(&mut self) -> SessionResult<()> {
        self.send_command(opcode::POWER_OFF, opcode::ACK, &[])?;
        Ok(())
    }

    pub fn read_ram(&mut self, addr: u32, len: u16) -> SessionResult<Vec<u8>> {
        let response = self.send_command(
            opcode::MEM_READ_REQUEST,
            opcode::MEM_READ_RESPONSE,
            &command::mem_read_request(addr, len),
        )?;
        let parsed = MemReadResponse::decode(&response)?;
        Ok(parsed.data.to_vec())
    }

    /// Writes through the 32-bit address form of the write command.
    pub fn write(&mut self, addr: u32, data: &[u8]) -> SessionResult<()> {
        let body = command::write32_request(addr, data)?;
        self.send_command(opcode::WRITE_32, opcode::ACK, &body)?;
        Ok(())
    }

    /// Writes through the legacy 24-bit address form.
    pub fn write24(&mut self, addr: u32, data: &[u8]) -> SessionResult<()> {
        let body = command::write_request(addr, data)?;
        self.send_command(opcode::WRITE, opcode::ACK, &body)?;
        Ok(())
    }

    pub fn go(&mut self, addr: u32) -> SessionResult<()> {
        self.send_command(opcode::GO, opcode::ACK, &command::go_request(addr))?;
        Ok(())
    }

    /// Unlocks secured operations; see [`command::UNLOCK_CODE`] for the
    /// canonical code.
    pub fn set_high_permissions(&mut self, code: &[u8]) -> SessionResult<()> {
        self.send_command(opcode::UNLOCK, opcode::ACK, code)?;
        Ok(())
    }

    pub fn debug_info(&mut self) -> SessionResult<Vec<MemoryRegion>> {
        let response = self.send_command(opcode::MEM_DEBUG_QUERY, opcode::MEM_DEBUG_INFO, &[])?;
        Ok(parse_memory_regions(&response)?)
    }

    /// Switches the device into download mode. Some bootloaders only
    /// accept the command without the framing prefix, so a failed attempt
    /// is retried headerless.
    pub fn dload_switch(&mut self) -> SessionResult<()> {
        match self.send_command(opcode::DLOAD_SWITCH, opcode::DLOAD_SWITCH, &[]) {
            Ok(_) => Ok(()),
            Err(error) => {
                warn!(%error, "framed download-mode switch failed, retrying without a header");
                self.send_command_inner(opcode::DLOAD_SWITCH, opcode::DLOAD_SWITCH, &[], true)?;
                Ok(())
            }
        }
    }

    /// One firmware staging round-trip. The response echoes the
    /// sub-command and carries a trailing status word the devices fill
    /// inconsistently; it is decoded and deliberately ignored.
    pub fn firmware_stage(&mut self, sub_command: u8, payload: &[u8]) -> SessionResult<()> {
        let mut body = vec![sub_command];
        body.extend_from_slice(payload);
        let response = self.send_command(opcode::FIRMWARE, opcode::FIRMWARE, &body)?;

        if response.len() < 5 {
            return Err(SessionError::Pdu(PduError::NotEnoughBytes {
                name: "FIRMWARE response",
                received: response.len(),
                expected: 5,
            }));
        }

        let mut src = ReadCursor::new(&response);
        let echoed = src.read_u8();
        if echoed != sub_command {
            return Err(SessionError::UnexpectedResponse {
                expected: sub_command,
                got: echoed,
            });
        }
        let _status = src.read_u32();
        Ok(())
    }

    fn active_variant(&self) -> SessionResult<Variant> {
        self.variant.ok_or(SessionError::Config {
            reason: "dialect not identified yet",
        })
    }

    /// Sends `opcode ∥ body` and routes the response: a NAK surfaces its
    /// decoded reason, the expected opcode yields the frame with the
    /// opcode byte stripped, anything else is a protocol error.
    fn send_command(&mut self, op: u8, expected: u8, body: &[u8]) -> SessionResult<Vec<u8>> {
        self.send_command_inner(op, expected, body, false)
    }

    fn send_command_inner(
        &mut self,
        op: u8,
        expected: u8,
        body: &[u8],
        empty_header: bool,
    ) -> SessionResult<Vec<u8>> {
        let mut frame = Vec::with_capacity(1 + body.len());
        frame.push(op);
        frame.extend_from_slice(body);
        self.framer.send(&frame, empty_header)?;

        let response = self.framer.recv()?;
        if response.is_empty() {
            return Err(SessionError::Timeout);
        }

        let mut src = ReadCursor::new(&response);
        let code = src.read_u8();

        if code == opcode::NAK {
            if src.len() < 2 {
                return Err(SessionError::Pdu(PduError::NotEnoughBytes {
                    name: "NAK",
                    received: response.len(),
                    expected: 3,
                }));
            }
            return Err(SessionError::Nak(NakReason::from(src.read_u16_be())));
        }
        if code != expected {
            return Err(SessionError::UnexpectedResponse { expected, got: code });
        }
        Ok(src.read_remaining().to_vec())
    }
}
