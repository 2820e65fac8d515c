//! Error types for the GU800 driver.

use core::fmt;

/// Errors that can occur when talking to the display.
///
/// Only transport failures are errors. Out-of-range pixels and brightness
/// levels are clipped or clamped, so they never show up here.
///
/// A failure can leave a multi-byte command half-issued. The driver does not
/// retry; re-run [`Gu800::initialize`](crate::Gu800::initialize) to bring the
/// controller back to a known state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gu800Error<SpiE, PinE> {
    /// Underlying SPI bus error.
    Spi(SpiE),

    /// Chip-select, command/data or reset line could not be driven.
    Pin(PinE),
}

impl<SpiE: fmt::Debug, PinE: fmt::Debug> fmt::Display for Gu800Error<SpiE, PinE> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Gu800Error::Spi(e) => write!(f, "SPI error: {:?}", e),
            Gu800Error::Pin(e) => write!(f, "Pin error: {:?}", e),
        }
    }
}

#[cfg(feature = "defmt")]
impl<SpiE: defmt::Format, PinE: defmt::Format> defmt::Format for Gu800Error<SpiE, PinE> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Gu800Error::Spi(e) => defmt::write!(f, "SPI error: {}", e),
            Gu800Error::Pin(e) => defmt::write!(f, "Pin error: {}", e),
        }
    }
}
