//! Recording fakes for driver tests.
//!
//! Every pin change, byte and delay goes into one shared event log, so
//! tests can check both what was sent and how it was framed.

extern crate std;

use core::cell::RefCell;
use core::convert::Infallible;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, ErrorKind, SpiBus};

use crate::bus::Gu800Bus;
use crate::commands::{Frame, Framing};
use crate::config::{BusTiming, Gu800Config};
use crate::driver::Gu800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Cs,
    Dc,
    Rst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Pin(Line, bool),
    Write(u8),
    Read(u8),
    Flush,
    DelayNs(u32),
}

#[derive(Default)]
struct Log {
    events: Vec<Event>,
    reads: VecDeque<u8>,
    /// Remaining SPI operations before the bus starts failing.
    fail_after: Option<usize>,
}

/// Shared handle onto the event log.
#[derive(Clone, Default)]
pub struct Recorder(Rc<RefCell<Log>>);

impl Recorder {
    fn push(&self, event: Event) {
        self.0.borrow_mut().events.push(event);
    }

    fn spi_op(&self) -> Result<(), FakeSpiError> {
        let mut log = self.0.borrow_mut();
        match &mut log.fail_after {
            Some(0) => Err(FakeSpiError),
            Some(n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn next_read(&self) -> u8 {
        self.0.borrow_mut().reads.pop_front().unwrap_or(0)
    }

    /// Every event recorded so far, in order.
    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().events.clone()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.0.borrow_mut().events.clear();
    }

    /// Let `n` more SPI writes succeed, then fail every one after.
    pub fn fail_after(&self, n: usize) {
        self.0.borrow_mut().fail_after = Some(n);
    }

    /// Bytes returned by subsequent SPI reads.
    pub fn queue_reads(&self, bytes: &[u8]) {
        self.0.borrow_mut().reads.extend(bytes.iter().copied());
    }

    pub fn reset_pin(&self) -> FakePin {
        FakePin {
            line: Line::Rst,
            rec: self.clone(),
        }
    }

    /// Written bytes, framed by the C/D level at the time they were sent.
    pub fn frames(&self) -> Vec<Frame> {
        let mut dc_high = false;
        let mut frames = Vec::new();
        for event in &self.0.borrow().events {
            match *event {
                Event::Pin(Line::Dc, level) => dc_high = level,
                Event::Write(byte) => frames.push(Frame {
                    byte,
                    kind: if dc_high {
                        Framing::Command
                    } else {
                        Framing::Data
                    },
                }),
                _ => {}
            }
        }
        frames
    }

    /// Bytes written while `/CS` was not asserted, or more than one byte
    /// written in the same `/CS` window.
    pub fn writes_outside_cs(&self) -> usize {
        let mut cs_low = false;
        let mut in_window = 0;
        let mut bad = 0;
        for event in &self.0.borrow().events {
            match *event {
                Event::Pin(Line::Cs, level) => {
                    cs_low = !level;
                    in_window = 0;
                }
                Event::Write(_) => {
                    in_window += 1;
                    if !cs_low || in_window > 1 {
                        bad += 1;
                    }
                }
                _ => {}
            }
        }
        bad
    }

    /// C/D level at each SPI read.
    pub fn read_levels(&self) -> Vec<bool> {
        let mut dc_high = false;
        let mut levels = Vec::new();
        for event in &self.0.borrow().events {
            match *event {
                Event::Pin(Line::Dc, level) => dc_high = level,
                Event::Read(_) => levels.push(dc_high),
                _ => {}
            }
        }
        levels
    }

    pub fn reset_levels(&self) -> Vec<bool> {
        self.0
            .borrow()
            .events
            .iter()
            .filter_map(|e| match *e {
                Event::Pin(Line::Rst, level) => Some(level),
                _ => None,
            })
            .collect()
    }

    pub fn delays_ns(&self) -> Vec<u32> {
        self.0
            .borrow()
            .events
            .iter()
            .filter_map(|e| match *e {
                Event::DelayNs(ns) => Some(ns),
                _ => None,
            })
            .collect()
    }
}

// ── SPI ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeSpiError;

impl spi::Error for FakeSpiError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

pub struct FakeSpi(Recorder);

impl spi::ErrorType for FakeSpi {
    type Error = FakeSpiError;
}

impl SpiBus<u8> for FakeSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        self.0.spi_op()?;
        for word in words.iter_mut() {
            *word = self.0.next_read();
            self.0.push(Event::Read(*word));
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        self.0.spi_op()?;
        for &word in words {
            self.0.push(Event::Write(word));
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        self.write(write)?;
        self.read(read)
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        self.write(words)?;
        self.read(words)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.0.push(Event::Flush);
        Ok(())
    }
}

// ── Pins ─────────────────────────────────────────────────────────────────

pub struct FakePin {
    line: Line,
    rec: Recorder,
}

impl digital::ErrorType for FakePin {
    type Error = Infallible;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.rec.push(Event::Pin(self.line, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.rec.push(Event::Pin(self.line, true));
        Ok(())
    }
}

// ── Delay ────────────────────────────────────────────────────────────────

pub struct FakeDelay(Recorder);

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.push(Event::DelayNs(ns));
    }

    fn delay_us(&mut self, us: u32) {
        self.delay_ns(us.saturating_mul(1_000));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay_ns(ms.saturating_mul(1_000_000));
    }
}

pub type RecordingBus = Gu800Bus<FakeSpi, FakePin, FakePin, FakeDelay>;

pub type RecordingDriver = Gu800<FakeSpi, FakePin, FakePin, FakeDelay>;

fn fakes(rec: &Recorder) -> (FakeSpi, FakePin, FakePin, FakeDelay) {
    (
        FakeSpi(rec.clone()),
        FakePin {
            line: Line::Cs,
            rec: rec.clone(),
        },
        FakePin {
            line: Line::Dc,
            rec: rec.clone(),
        },
        FakeDelay(rec.clone()),
    )
}

/// A bus wired to fakes that all log into the returned [`Recorder`].
pub fn recording_bus(timing: BusTiming) -> (RecordingBus, Recorder) {
    let rec = Recorder::default();
    let (spi, cs, dc, delay) = fakes(&rec);
    (Gu800Bus::new(spi, cs, dc, delay, timing), rec)
}

/// A driver wired to fakes that all log into the returned [`Recorder`].
pub fn recording_driver() -> (RecordingDriver, Recorder) {
    let rec = Recorder::default();
    let (spi, cs, dc, delay) = fakes(&rec);
    let driver = Gu800::new(spi, cs, dc, delay, Gu800Config::default());
    (driver, rec)
}
