//! Blocking driver for the Noritake GU800-series 128×64 graphic VFD.
//!
//! The GU800 controller holds two full-screen pages of display memory and
//! is driven over a write-mostly SPI link where every byte gets its own
//! `/CS` window. This crate keeps a packed-bit frame buffer in RAM, writes
//! it to whichever page is off screen, and flips pages on each refresh so
//! the visible image never tears.
//!
//! # Architecture
//!
//! - **[`commands`]**: pure encoder for every controller command.
//! - **[`bus`]**: per-byte `/CS` + C/D framing with the controller's
//!   timing windows, on top of any `embedded-hal` [`SpiBus`].
//! - **[`framebuffer`]**: packed-bit pixel store, also usable on its own as
//!   an `embedded-graphics` [`DrawTarget`].
//! - **[`page`]** / **[`brightness`]**: page-flip state and fade
//!   progression.
//! - **[`Gu800`]**: the driver tying it all together.
//!
//! Drawing primitives (lines, shapes, text) come from `embedded-graphics`;
//! [`Gu800`] implements [`DrawTarget`] by writing into its frame buffer.
//!
//! # Quick Start
//!
//! ```ignore
//! use gu800_vfd::{Gu800, Gu800Config, PixelOp};
//!
//! // `spi` must be in SPI_MODE at ≤ MAX_SPI_FREQUENCY_HZ, with /CS left to us.
//! let mut vfd = Gu800::new(spi, cs, dc, delay, Gu800Config::default());
//! vfd.initialize_with_reset(&mut reset)?;
//!
//! vfd.set_pixel(0, 0, PixelOp::Set);
//! vfd.refresh()?;
//!
//! vfd.power_off(true)?; // fade out
//! ```
//!
//! # Crate Features
//!
//! - **`defmt`**: structured logging via [`defmt`] and `defmt::Format`
//!   implementations on public types.
//!
//! [`SpiBus`]: embedded_hal::spi::SpiBus
//! [`DrawTarget`]: embedded_graphics::draw_target::DrawTarget

#![no_std]

pub mod brightness;
pub mod bus;
pub mod commands;
pub mod config;
pub mod driver;
pub mod error;
pub mod framebuffer;
pub mod page;

#[cfg(test)]
mod testing;

// ── Re-exports for convenience ───────────────────────────────────────────

pub use brightness::Brightness;
pub use bus::{BusError, Gu800Bus};
pub use commands::{Command, Framing, HEIGHT, MAX_SPI_FREQUENCY_HZ, SPI_MODE, WIDTH};
pub use config::{BusTiming, Gu800Config};
pub use driver::Gu800;
pub use error::Gu800Error;
pub use framebuffer::{Framebuffer, PixelOp};
pub use page::Page;
