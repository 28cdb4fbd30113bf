//! SPI datagrams and the response pipeline.
//!
//! Every transfer exchanges 40 bits: the MCU sends an address byte (bit 7 set for writes) and a
//! big-endian 32-bit value, and the chip simultaneously shifts out its status byte and 32 data
//! bits. The chip answers one datagram late: the reply clocked out during datagram N carries the
//! data requested by datagram N-1 and the status latched at that time. [`SpiLink`] keeps track of
//! the request in flight so the reply can be matched to the request it belongs to.

use bitfield::bitfield;
use embedded_hal::spi::SpiDevice;

use generic::tmc_error::TmcError;

pub const DATAGRAM_LEN: usize = 5;

/// Set in the address byte of a write datagram.
pub const WRITE_FLAG: u8 = 0x80;

bitfield! {
    /// The status byte at the start of every reply.
    #[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
    pub struct SpiStatus(u8);
    impl Debug;
    u8;
    pub reset_flag, _: 0;
    pub driver_error, _: 1;
    pub sg2, _: 2;
    pub standstill, _: 3;
    pub velocity_reached, _: 4;
    pub position_reached, _: 5;
    pub status_stop_l, _: 6;
    pub status_stop_r, _: 7;
}

impl SpiStatus {
    pub fn from_raw(raw: u8) -> Self {
        SpiStatus(raw)
    }

    pub fn raw(&self) -> u8 {
        self.0
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SpiStatus {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "SpiStatus({=u8:#x})", self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    Read { address: u8 },
    Write { address: u8, value: u32 },
}

impl Request {
    pub fn address(&self) -> u8 {
        match *self {
            Request::Read { address } | Request::Write { address, .. } => address,
        }
    }

    pub fn encode(&self) -> [u8; DATAGRAM_LEN] {
        let (head, value) = match *self {
            Request::Read { address } => (address & !WRITE_FLAG, 0),
            Request::Write { address, value } => (address | WRITE_FLAG, value),
        };
        let mut datagram = [0u8; DATAGRAM_LEN];
        datagram[0] = head;
        datagram[1..].copy_from_slice(&value.to_be_bytes());
        datagram
    }
}

/// A decoded reply datagram.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Response {
    pub status: SpiStatus,
    pub data: u32,
    /// The earlier request this reply answers, if known.
    pub answers: Option<Request>,
}

impl Response {
    pub fn decode(datagram: &[u8; DATAGRAM_LEN], answers: Option<Request>) -> Self {
        let mut data = [0u8; 4];
        data.copy_from_slice(&datagram[1..]);
        Response {
            status: SpiStatus(datagram[0]),
            data: u32::from_be_bytes(data),
            answers,
        }
    }
}

/// Owns the SPI device and the one-deep response pipeline.
pub struct SpiLink<SPI> {
    spi: SPI,
    in_flight: Option<Request>,
    last_status: Option<SpiStatus>,
}

impl<SPI: SpiDevice> SpiLink<SPI> {
    pub fn new(spi: SPI) -> Self {
        SpiLink { spi, in_flight: None, last_status: None }
    }

    /// Sends one datagram and returns the reply, which belongs to the previous request.
    pub fn transfer(&mut self, request: Request) -> Result<Response, TmcError> {
        let mut buf = request.encode();
        if self.spi.transfer_in_place(&mut buf).is_err() {
            warn!("spi transfer to {:#x} failed", request.address());
            self.in_flight = None;
            return Err(TmcError::SpiTransferError);
        }
        let response = Response::decode(&buf, self.in_flight.replace(request));
        self.last_status = Some(response.status);
        Ok(response)
    }

    /// Writes `value` to `address` and returns the status byte of the reply.
    pub fn write(&mut self, address: u8, value: u32) -> Result<SpiStatus, TmcError> {
        let response = self.transfer(Request::Write { address, value })?;
        debug!("w {:#x} <- {:#x}, status {:#x}", address, value, response.status.raw());
        Ok(response.status)
    }

    /// Reads `address`. Takes two datagrams: the request, then a repeat whose reply carries the
    /// requested data.
    pub fn read(&mut self, address: u8) -> Result<u32, TmcError> {
        let request = Request::Read { address };
        self.transfer(request)?;
        let response = self.transfer(request)?;
        debug!("r {:#x} -> {:#x}, status {:#x}", address, response.data, response.status.raw());
        Ok(response.data)
    }

    /// Status byte of the most recent reply. Because of the pipeline it describes the chip as of
    /// the transaction before that one.
    pub fn last_status(&self) -> Option<SpiStatus> {
        self.last_status
    }

    pub fn release(self) -> SPI {
        self.spi
    }
}

// Sanity Checks
// --------------------------------------------------------

#[test]
fn test_write_datagram() {
    let req = Request::Write { address: 0x2D, value: 46_080_000 };
    assert_eq!(req.encode(), [0xAD, 0x02, 0xBF, 0x20, 0x00]);
    let req = Request::Write { address: 0x6C, value: 0x0001_00C3 };
    assert_eq!(req.encode(), [0xEC, 0x00, 0x01, 0x00, 0xC3]);
}

#[test]
fn test_read_datagram_clears_write_flag() {
    assert_eq!(Request::Read { address: 0x6F }.encode(), [0x6F, 0, 0, 0, 0]);
    assert_eq!(Request::Read { address: 0xEF }.encode(), [0x6F, 0, 0, 0, 0]);
}

#[test]
fn test_response_decode() {
    let r = Response::decode(&[0x29, 0xDE, 0xAD, 0xBE, 0xEF], None);
    assert_eq!(r.data, 0xDEAD_BEEF);
    assert!(r.status.reset_flag());
    assert!(!r.status.driver_error());
    assert!(r.status.standstill());
    assert!(r.status.position_reached());
    assert!(!r.status.status_stop_r());
    assert_eq!(r.status.raw(), 0x29);
}
