//! Mock SPI chip and enable pin shared by the integration tests.
//!
//! Both mocks are cheap handles onto shared state, so a test keeps a clone to inspect what the
//! driver did after handing the other one over.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use embedded_hal::digital;
use embedded_hal::spi::{self, ErrorKind, ErrorType, Operation, SpiDevice};

use tmcdrive::tmc5160::TmcDriver;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockSpiError;

impl spi::Error for MockSpiError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug, Default)]
struct ChipState {
    registers: HashMap<u8, u32>,
    sent: Vec<[u8; 5]>,
    statuses: VecDeque<u8>,
    /// Address of the previous datagram if it was a read.
    pending_read: Option<u8>,
    transfers: usize,
    fail_at: Option<usize>,
}

impl ChipState {
    fn exchange(&mut self, buf: &mut [u8]) -> Result<(), MockSpiError> {
        let index = self.transfers;
        self.transfers += 1;
        if self.fail_at == Some(index) {
            self.fail_at = None;
            return Err(MockSpiError);
        }
        let mut datagram = [0u8; 5];
        datagram.copy_from_slice(buf);
        self.sent.push(datagram);

        // The reply carries the data asked for by the previous datagram.
        let data = self
            .pending_read
            .map(|addr| self.registers.get(&addr).copied().unwrap_or(0))
            .unwrap_or(0);
        let status = self.statuses.pop_front().unwrap_or(0);

        let address = datagram[0] & 0x7F;
        if datagram[0] & 0x80 != 0 {
            let value = u32::from_be_bytes([datagram[1], datagram[2], datagram[3], datagram[4]]);
            self.registers.insert(address, value);
            self.pending_read = None;
        } else {
            self.pending_read = Some(address);
        }

        buf[0] = status;
        buf[1..].copy_from_slice(&data.to_be_bytes());
        Ok(())
    }
}

/// A pipelined chip: writes land in a register map, reads are answered by the next datagram.
#[derive(Clone, Default)]
pub struct MockSpi {
    state: Rc<RefCell<ChipState>>,
}

impl MockSpi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every datagram that went out. Failed transfers are not recorded.
    pub fn sent(&self) -> Vec<[u8; 5]> {
        self.state.borrow().sent.clone()
    }

    pub fn clear_sent(&self) {
        self.state.borrow_mut().sent.clear();
    }

    pub fn register(&self, address: u8) -> Option<u32> {
        self.state.borrow().registers.get(&address).copied()
    }

    pub fn set_register(&self, address: u8, value: u32) {
        self.state.borrow_mut().registers.insert(address, value);
    }

    /// Status bytes for the next replies, in order. Replies without a queued status carry 0.
    pub fn queue_statuses(&self, statuses: &[u8]) {
        self.state.borrow_mut().statuses.extend(statuses.iter().copied());
    }

    /// Makes the `n`-th transfer from now (0 = the next one) fail.
    pub fn fail_transfer(&self, n: usize) {
        let mut state = self.state.borrow_mut();
        state.fail_at = Some(state.transfers + n);
    }
}

impl ErrorType for MockSpi {
    type Error = MockSpiError;
}

impl SpiDevice for MockSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        for op in operations.iter_mut() {
            match op {
                Operation::TransferInPlace(buf) => state.exchange(buf)?,
                _ => return Err(MockSpiError),
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockPinError;

impl digital::Error for MockPinError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

#[derive(Debug, Default)]
struct PinState {
    high: bool,
    history: Vec<bool>,
    fail: bool,
}

#[derive(Clone, Default)]
pub struct MockPin {
    state: Rc<RefCell<PinState>>,
}

impl MockPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_high(&self) -> bool {
        self.state.borrow().high
    }

    /// Every level the pin was driven to, oldest first.
    pub fn history(&self) -> Vec<bool> {
        self.state.borrow().history.clone()
    }

    pub fn set_failing(&self, fail: bool) {
        self.state.borrow_mut().fail = fail;
    }

    fn drive(&mut self, high: bool) -> Result<(), MockPinError> {
        let mut state = self.state.borrow_mut();
        if state.fail {
            return Err(MockPinError);
        }
        state.high = high;
        state.history.push(high);
        Ok(())
    }
}

impl digital::ErrorType for MockPin {
    type Error = MockPinError;
}

impl digital::OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }
}

impl digital::StatefulOutputPin for MockPin {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.state.borrow().high)
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.state.borrow().high)
    }
}

/// Returns `(driver, spi, pin)`; `spi` and `pin` share state with the driver's copies.
pub fn create_mock_driver() -> (TmcDriver<MockSpi, MockPin>, MockSpi, MockPin) {
    init_logger();
    let spi = MockSpi::new();
    let pin = MockPin::new();
    let driver = TmcDriver::new(spi.clone(), pin.clone()).expect("Failed to create mock driver");
    (driver, spi, pin)
}

/// Splits a write datagram into `(address, value)`, panicking on reads.
pub fn decode_write(datagram: &[u8; 5]) -> (u8, u32) {
    assert!(datagram[0] & 0x80 != 0, "not a write datagram: {:02x?}", datagram);
    let value = u32::from_be_bytes([datagram[1], datagram[2], datagram[3], datagram[4]]);
    (datagram[0] & 0x7F, value)
}
