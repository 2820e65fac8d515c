//! Byte-level bus transactions.
//!
//! The GU800 latches every byte on the rising edge of `/CS`, so each byte
//! is its own transaction: assert `/CS`, set C/D, wait, clock the byte,
//! wait, release `/CS`, wait. There is no burst mode. [`Gu800Bus::write_bytes`]
//! is only a loop over [`Gu800Bus::write_byte`].

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::commands::{Command, Frame, Framing};
use crate::config::BusTiming;
use crate::error::Gu800Error;

/// Error type produced by a [`Gu800Bus`] over the given peripherals.
pub type BusError<SPI, CS> = Gu800Error<
    <SPI as embedded_hal::spi::ErrorType>::Error,
    <CS as embedded_hal::digital::ErrorType>::Error,
>;

/// Owns the serial bus, the `/CS` and C/D lines, and the delay source.
///
/// The SPI bus must be configured by the caller for
/// [`SPI_MODE`](crate::commands::SPI_MODE) at no more than
/// [`MAX_SPI_FREQUENCY_HZ`](crate::commands::MAX_SPI_FREQUENCY_HZ). `/CS` is
/// driven here, not by the SPI peripheral, so pass a bare `SpiBus`.
pub struct Gu800Bus<SPI, CS, DC, D> {
    spi: SPI,
    cs: CS,
    dc: DC,
    delay: D,
    timing: BusTiming,
}

impl<SPI, CS, DC, D> Gu800Bus<SPI, CS, DC, D>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    DC: OutputPin<Error = CS::Error>,
    D: DelayNs,
{
    /// Take ownership of the bus peripherals.
    ///
    /// No bus traffic is generated and the pins are left as they are;
    /// [`idle`](Self::idle) drives them to their resting levels.
    pub fn new(spi: SPI, cs: CS, dc: DC, delay: D, timing: BusTiming) -> Self {
        Self {
            spi,
            cs,
            dc,
            delay,
            timing,
        }
    }

    /// Release `/CS` and pull C/D low.
    pub fn idle(&mut self) -> Result<(), BusError<SPI, CS>> {
        self.cs.set_high().map_err(Gu800Error::Pin)?;
        self.dc.set_low().map_err(Gu800Error::Pin)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Transactions
    // -----------------------------------------------------------------------

    /// Write a single byte in its own `/CS` window.
    ///
    /// # Errors
    /// * [`Gu800Error::Pin`] if `/CS` or C/D cannot be driven
    /// * [`Gu800Error::Spi`] on transfer failure
    ///
    /// On error `/CS` may be left asserted.
    pub fn write_byte(&mut self, byte: u8, framing: Framing) -> Result<(), BusError<SPI, CS>> {
        self.cs.set_low().map_err(Gu800Error::Pin)?;
        let level = match framing {
            Framing::Command => self.dc.set_high(),
            Framing::Data => self.dc.set_low(),
        };
        level.map_err(Gu800Error::Pin)?;
        self.delay.delay_ns(self.timing.settle_ns);

        self.spi.write(&[byte]).map_err(Gu800Error::Spi)?;
        // `/CS` must not rise before the last clock edge.
        self.spi.flush().map_err(Gu800Error::Spi)?;

        self.delay.delay_ns(self.timing.hold_ns);
        self.cs.set_high().map_err(Gu800Error::Pin)?;
        self.delay.delay_ns(self.timing.gap_ns);
        Ok(())
    }

    /// Write every byte of `buf` with the same framing, one transaction each.
    ///
    /// Stops at the first failure; earlier bytes have already been latched.
    pub fn write_bytes(&mut self, buf: &[u8], framing: Framing) -> Result<(), BusError<SPI, CS>> {
        for &byte in buf {
            self.write_byte(byte, framing)?;
        }
        Ok(())
    }

    /// Write pre-framed bytes in order.
    pub fn write_frames(&mut self, frames: &[Frame]) -> Result<(), BusError<SPI, CS>> {
        for frame in frames {
            self.write_byte(frame.byte, frame.kind)?;
        }
        Ok(())
    }

    /// Encode and send a command.
    pub fn send(&mut self, command: &Command) -> Result<(), BusError<SPI, CS>> {
        self.write_frames(&command.encode())
    }

    /// Read one byte. C/D is held high for reads.
    pub fn read_byte(&mut self) -> Result<u8, BusError<SPI, CS>> {
        self.cs.set_low().map_err(Gu800Error::Pin)?;
        self.dc.set_high().map_err(Gu800Error::Pin)?;
        self.delay.delay_ns(self.timing.settle_ns);

        let mut buf = [0u8];
        self.spi.read(&mut buf).map_err(Gu800Error::Spi)?;
        self.spi.flush().map_err(Gu800Error::Spi)?;

        self.delay.delay_ns(self.timing.hold_ns);
        self.cs.set_high().map_err(Gu800Error::Pin)?;
        self.delay.delay_ns(self.timing.gap_ns);
        Ok(buf[0])
    }

    // -----------------------------------------------------------------------
    // Board control
    // -----------------------------------------------------------------------

    /// Pulse `/RESET` low for at least `hold_ms`.
    pub fn reset<RST>(&mut self, rst: &mut RST, hold_ms: u32) -> Result<(), BusError<SPI, CS>>
    where
        RST: OutputPin<Error = CS::Error>,
    {
        rst.set_low().map_err(Gu800Error::Pin)?;
        self.delay.delay_ms(hold_ms);
        rst.set_high().map_err(Gu800Error::Pin)?;
        Ok(())
    }

    /// Block for `ms` milliseconds on the bus's delay source.
    pub fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    /// Give back the owned peripherals.
    pub fn release(self) -> (SPI, CS, DC, D) {
        (self.spi, self.cs, self.dc, self.delay)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::testing::{recording_bus, Event, Line};
    use embedded_hal_mock::eh1::delay::{
        CheckedDelay, NoopDelay, Transaction as DelayTransaction,
    };
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction as SpiTransaction};
    use std::vec::Vec;

    /// Distinct values so the order of the three waits is observable.
    const TIMING: BusTiming = BusTiming {
        settle_ns: 11,
        hold_ns: 22,
        gap_ns: 33,
    };

    fn framed_cs(bytes: usize) -> Vec<PinTransaction> {
        let mut t = Vec::new();
        for _ in 0..bytes {
            t.push(PinTransaction::set(PinState::Low));
            t.push(PinTransaction::set(PinState::High));
        }
        t
    }

    fn framed_delays(bytes: usize, timing: BusTiming) -> Vec<DelayTransaction> {
        let mut t = Vec::new();
        for _ in 0..bytes {
            t.push(DelayTransaction::delay_ns(timing.settle_ns));
            t.push(DelayTransaction::delay_ns(timing.hold_ns));
            t.push(DelayTransaction::delay_ns(timing.gap_ns));
        }
        t
    }

    // ── Transaction ordering ─────────────────────────────────────────

    #[test]
    fn write_byte_event_order() {
        let (mut bus, rec) = recording_bus(TIMING);
        bus.write_byte(0xAB, Framing::Command).unwrap();

        assert_eq!(
            rec.events(),
            [
                Event::Pin(Line::Cs, false),
                Event::Pin(Line::Dc, true),
                Event::DelayNs(11),
                Event::Write(0xAB),
                Event::Flush,
                Event::DelayNs(22),
                Event::Pin(Line::Cs, true),
                Event::DelayNs(33),
            ]
        );
    }

    #[test]
    fn write_byte_data_drives_cd_low() {
        let (mut bus, rec) = recording_bus(TIMING);
        bus.write_byte(0x3C, Framing::Data).unwrap();

        assert_eq!(rec.events()[1], Event::Pin(Line::Dc, false));
        assert_eq!(rec.events()[3], Event::Write(0x3C));
    }

    #[test]
    fn read_byte_event_order() {
        let (mut bus, rec) = recording_bus(TIMING);
        rec.queue_reads(&[0x5A]);
        assert_eq!(bus.read_byte().unwrap(), 0x5A);

        assert_eq!(
            rec.events(),
            [
                Event::Pin(Line::Cs, false),
                Event::Pin(Line::Dc, true),
                Event::DelayNs(11),
                Event::Read(0x5A),
                Event::Flush,
                Event::DelayNs(22),
                Event::Pin(Line::Cs, true),
                Event::DelayNs(33),
            ]
        );
    }

    // ── Against embedded-hal mocks ───────────────────────────────────

    #[test]
    fn write_byte_frames_single_command_byte() {
        let spi = SpiMock::new(&[SpiTransaction::write(0xAB), SpiTransaction::flush()]);
        let cs = PinMock::new(&framed_cs(1));
        let dc = PinMock::new(&[PinTransaction::set(PinState::High)]);
        let delay = CheckedDelay::new(&framed_delays(1, BusTiming::default()));

        let mut bus = Gu800Bus::new(spi, cs, dc, delay, BusTiming::default());
        bus.write_byte(0xAB, Framing::Command).unwrap();

        let (mut spi, mut cs, mut dc, mut delay) = bus.release();
        spi.done();
        cs.done();
        dc.done();
        delay.done();
    }

    #[test]
    fn write_bytes_reasserts_cs_per_byte() {
        let spi = SpiMock::new(&[
            SpiTransaction::write(0x01),
            SpiTransaction::flush(),
            SpiTransaction::write(0x02),
            SpiTransaction::flush(),
            SpiTransaction::write(0x03),
            SpiTransaction::flush(),
        ]);
        let cs = PinMock::new(&framed_cs(3));
        let dc = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::Low),
        ]);
        let delay = CheckedDelay::new(&framed_delays(3, TIMING));

        let mut bus = Gu800Bus::new(spi, cs, dc, delay, TIMING);
        bus.write_bytes(&[0x01, 0x02, 0x03], Framing::Data).unwrap();

        let (mut spi, mut cs, mut dc, mut delay) = bus.release();
        spi.done();
        cs.done();
        dc.done();
        delay.done();
    }

    #[test]
    fn send_uses_per_frame_framing() {
        let spi = SpiMock::new(&[
            SpiTransaction::write(0b0110_0010),
            SpiTransaction::flush(),
            SpiTransaction::write(0x02),
            SpiTransaction::flush(),
            SpiTransaction::write(0xFF),
            SpiTransaction::flush(),
        ]);
        let cs = PinMock::new(&framed_cs(3));
        let dc = PinMock::new(&[
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
        ]);

        let mut bus = Gu800Bus::new(spi, cs, dc, NoopDelay::new(), BusTiming::default());
        bus.send(&Command::SetArea { area: 2, mask: 0xFF }).unwrap();

        let (mut spi, mut cs, mut dc, _) = bus.release();
        spi.done();
        cs.done();
        dc.done();
    }

    #[test]
    fn read_byte_holds_cd_high() {
        let spi = SpiMock::new(&[SpiTransaction::read(0x5A), SpiTransaction::flush()]);
        let cs = PinMock::new(&framed_cs(1));
        let dc = PinMock::new(&[PinTransaction::set(PinState::High)]);
        let delay = CheckedDelay::new(&framed_delays(1, TIMING));

        let mut bus = Gu800Bus::new(spi, cs, dc, delay, TIMING);
        assert_eq!(bus.read_byte().unwrap(), 0x5A);

        let (mut spi, mut cs, mut dc, mut delay) = bus.release();
        spi.done();
        cs.done();
        dc.done();
        delay.done();
    }

    #[test]
    fn reset_pulses_low_then_high() {
        let spi: SpiMock<u8> = SpiMock::new(&[]);
        let cs = PinMock::new(&[]);
        let dc = PinMock::new(&[]);
        let mut rst = PinMock::new(&[
            PinTransaction::set(PinState::Low),
            PinTransaction::set(PinState::High),
        ]);
        let delay = CheckedDelay::new(&[DelayTransaction::delay_ms(2)]);

        let mut bus = Gu800Bus::new(spi, cs, dc, delay, BusTiming::default());
        bus.reset(&mut rst, 2).unwrap();
        rst.done();

        let (mut spi, mut cs, mut dc, mut delay) = bus.release();
        spi.done();
        cs.done();
        dc.done();
        delay.done();
    }
}
