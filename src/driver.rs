//! High-level GU800 driver.
//!
//! [`Gu800`] owns the bus, the frame buffer, the page state and the
//! brightness level. Drawing only touches the frame buffer; nothing reaches
//! the display until [`Gu800::refresh`] copies the buffer to the hidden page
//! and flips it on screen.

use core::convert::Infallible;

use embedded_graphics::{
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Size},
    pixelcolor::BinaryColor,
    primitives::Rectangle,
    Pixel,
};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;

use crate::brightness::Brightness;
use crate::bus::{BusError, Gu800Bus};
use crate::commands::{self, Command, Framing, AREA_COUNT, READ_X_MASK};
use crate::config::Gu800Config;
use crate::framebuffer::{Framebuffer, PixelOp};
use crate::page::{Page, PageState};

/// Driver for a GU800 128×64 graphic VFD.
///
/// # Lifecycle
///
/// 1. [`Gu800::new()`]: takes the peripherals, no bus traffic.
/// 2. [`Gu800::initialize()`] (or
///    [`initialize_with_reset()`](Self::initialize_with_reset)): clears the
///    controller and switches the display on showing page A.
/// 3. Draw with [`set_pixel()`](Self::set_pixel) or any `embedded-graphics`
///    primitive; the driver is a [`DrawTarget`].
/// 4. [`Gu800::refresh()`]: writes the buffer to the hidden page and flips.
///
/// # Example
///
/// ```no_run
/// use embedded_graphics::{pixelcolor::BinaryColor, prelude::*, primitives::*};
/// use gu800_vfd::{Gu800, Gu800Config, PixelOp};
///
/// # fn example<SPI, CS, DC, D>(spi: SPI, cs: CS, dc: DC, delay: D)
/// # where
/// #     SPI: embedded_hal::spi::SpiBus,
/// #     CS: embedded_hal::digital::OutputPin,
/// #     DC: embedded_hal::digital::OutputPin<Error = CS::Error>,
/// #     D: embedded_hal::delay::DelayNs,
/// # {
/// let mut vfd = Gu800::new(spi, cs, dc, delay, Gu800Config::default());
/// vfd.initialize().ok();
///
/// vfd.set_pixel(0, 0, PixelOp::Set);
/// Circle::new(Point::new(48, 16), 32)
///     .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
///     .draw(&mut vfd)
///     .ok();
/// vfd.refresh().ok();
/// # }
/// ```
pub struct Gu800<SPI, CS, DC, D> {
    bus: Gu800Bus<SPI, CS, DC, D>,
    framebuffer: Framebuffer,
    pages: PageState,
    brightness: Brightness,
    powered: bool,
    config: Gu800Config,
}

impl<SPI, CS, DC, D> Gu800<SPI, CS, DC, D>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    DC: OutputPin<Error = CS::Error>,
    D: DelayNs,
{
    /// Construct an uninitialised driver.
    ///
    /// No bus traffic is generated. Call [`initialize()`](Self::initialize)
    /// before refreshing.
    ///
    /// # Arguments
    /// * `spi`: SPI bus in mode 3, ≤ 5 MHz. `/CS` must not be managed by it.
    /// * `cs`: `/CS` line.
    /// * `dc`: command/data line.
    /// * `delay`: blocking delay used for bus timing and fades.
    /// * `config`: timing configuration.
    pub fn new(spi: SPI, cs: CS, dc: DC, delay: D, config: Gu800Config) -> Self {
        Self {
            bus: Gu800Bus::new(spi, cs, dc, delay, config.timing),
            framebuffer: Framebuffer::new(),
            pages: PageState::default(),
            brightness: Brightness::from(config.initial_brightness),
            powered: false,
            config,
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Pulse `/RESET`, then [`initialize()`](Self::initialize).
    ///
    /// The reset is only strictly needed after a cold power-on.
    pub fn initialize_with_reset<RST>(&mut self, rst: &mut RST) -> Result<(), BusError<SPI, CS>>
    where
        RST: OutputPin<Error = CS::Error>,
    {
        self.bus.idle()?;
        self.bus.reset(rst, self.config.reset_hold_ms)?;
        self.initialize()
    }

    /// Bring the controller to a known state.
    ///
    /// Clears both layers and the address counters, puts every display area
    /// in graphics mode, and switches the display on showing page A.
    /// The frame buffer is left untouched.
    ///
    /// Safe to call again after a transport failure.
    pub fn initialize(&mut self) -> Result<(), BusError<SPI, CS>> {
        self.bus.idle()?;
        self.clear_layers(true, true, true)?;

        for area in 0..AREA_COUNT {
            self.set_area(area, 0xFF)?;
        }

        self.pages = PageState::default();
        self.bus.send(&self.pages.visible_mode(true))?;
        self.powered = true;

        #[cfg(feature = "defmt")]
        defmt::info!("GU800 initialised");

        Ok(())
    }

    /// Give back the owned peripherals.
    pub fn release(self) -> (SPI, CS, DC, D) {
        self.bus.release()
    }

    // -----------------------------------------------------------------------
    // Frame buffer
    // -----------------------------------------------------------------------

    /// Apply `op` to one pixel of the frame buffer. Off-screen writes are
    /// ignored. No bus traffic.
    pub fn set_pixel(&mut self, x: i32, y: i32, op: PixelOp) {
        self.framebuffer.set_pixel(x, y, op);
    }

    /// Clear the frame buffer, and optionally push the blank frame.
    pub fn clear_framebuffer(&mut self, also_refresh: bool) -> Result<(), BusError<SPI, CS>> {
        self.framebuffer.clear();
        if also_refresh {
            self.refresh()?;
        }
        Ok(())
    }

    /// The frame buffer as it will be written by the next refresh.
    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Direct access to the frame buffer. No bus traffic.
    pub fn framebuffer_mut(&mut self) -> &mut Framebuffer {
        &mut self.framebuffer
    }

    // -----------------------------------------------------------------------
    // Page control
    // -----------------------------------------------------------------------

    /// Write the frame buffer to the hidden page, then show it.
    ///
    /// The page on screen is never written, so a refresh does not tear.
    /// If the transfer fails the pages are not flipped and the old image
    /// stays up.
    ///
    /// The display is always switched on. When it was off, the stored
    /// brightness is sent again after the mode command.
    pub fn refresh(&mut self) -> Result<(), BusError<SPI, CS>> {
        let target = self.pages.hidden();
        let base = target.base_row();

        self.bus.send(&Command::AddressMode {
            auto_x: true,
            auto_y: false,
        })?;

        for (band, row) in self.framebuffer.rows().enumerate() {
            self.bus.send(&Command::SetXAddress(0))?;
            self.bus.send(&Command::SetYAddress(base + band as u8))?;
            self.bus.write_bytes(row, Framing::Data)?;
        }

        let was_off = !self.powered;
        self.bus.send(&self.pages.mode_for(target, true))?;
        self.pages.flip();
        self.powered = true;

        // A faded power-off leaves the controller at Dim(0).
        if was_off {
            self.apply_brightness(self.brightness)?;
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("page {} now visible", target);

        Ok(())
    }

    /// Enable or disable inverse video. Pixel data is not rewritten.
    pub fn set_inversion(&mut self, inverted: bool) -> Result<(), BusError<SPI, CS>> {
        self.pages.inverted = inverted;
        self.bus.send(&self.pages.visible_mode(self.powered))
    }

    /// The page currently on screen.
    pub fn visible_page(&self) -> Page {
        self.pages.visible
    }

    /// Whether inverse video is enabled.
    pub fn is_inverted(&self) -> bool {
        self.pages.inverted
    }

    /// Whether the last mode command switched the display on.
    pub fn is_powered(&self) -> bool {
        self.powered
    }

    // -----------------------------------------------------------------------
    // Brightness and power
    // -----------------------------------------------------------------------

    /// Set brightness immediately. `level` is clamped to `0..=15`.
    pub fn set_brightness(&mut self, level: i32) -> Result<(), BusError<SPI, CS>> {
        self.apply_brightness(Brightness::clamped(level))
    }

    /// Current brightness level.
    pub fn brightness(&self) -> u8 {
        self.brightness.level()
    }

    /// Step brightness one level at a time toward `target` (clamped),
    /// waiting `step_delay_ms` after each step.
    ///
    /// Blocks until the target is reached.
    pub fn fade_to(&mut self, target: i32, step_delay_ms: u32) -> Result<(), BusError<SPI, CS>> {
        self.fade_to_level(Brightness::clamped(target), step_delay_ms)
    }

    /// Turn the display off. The image in display memory is kept.
    ///
    /// With `fade`, brightness ramps to 0 first. The stored level is then
    /// restored (without bus traffic) so a later [`power_on`](Self::power_on)
    /// comes back at the same brightness.
    pub fn power_off(&mut self, fade: bool) -> Result<(), BusError<SPI, CS>> {
        if fade {
            let held = self.brightness;
            self.fade_to_level(Brightness::MIN, self.config.fade_step_ms)?;
            self.brightness = held;
        }

        self.bus.send(&self.pages.visible_mode(false))?;
        self.powered = false;

        #[cfg(feature = "defmt")]
        defmt::info!("GU800 off (fade: {})", fade);

        Ok(())
    }

    /// Turn the display on, showing the visible page.
    ///
    /// With `fade`, the tube is dimmed to 0 before power returns and then
    /// ramped up to the stored level. Without it, the stored level is
    /// re-sent so an earlier faded power-off does not leave the tube dark.
    pub fn power_on(&mut self, fade: bool) -> Result<(), BusError<SPI, CS>> {
        let held = self.brightness;

        if fade {
            self.apply_brightness(Brightness::MIN)?;
        }

        self.bus.send(&self.pages.visible_mode(true))?;
        self.powered = true;

        if fade {
            self.fade_to_level(held, self.config.fade_step_ms)?;
        } else {
            self.apply_brightness(held)?;
        }

        #[cfg(feature = "defmt")]
        defmt::info!("GU800 on (fade: {})", fade);

        Ok(())
    }

    fn apply_brightness(&mut self, level: Brightness) -> Result<(), BusError<SPI, CS>> {
        self.bus.send(&Command::Dim(level.level()))?;
        self.brightness = level;
        Ok(())
    }

    fn fade_to_level(&mut self, target: Brightness, step_delay_ms: u32) -> Result<(), BusError<SPI, CS>> {
        #[cfg(feature = "defmt")]
        defmt::trace!("fade {} -> {}", self.brightness, target);

        for level in self.brightness.fade_to(target) {
            self.apply_brightness(level)?;
            self.bus.delay_ms(step_delay_ms);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Controller memory
    // -----------------------------------------------------------------------

    /// Hardware clear of the selected layers, then wait for it to finish.
    ///
    /// This wipes the controller's display memory, not the frame buffer.
    pub fn clear_layers(
        &mut self,
        layer0: bool,
        layer1: bool,
        reset_addresses: bool,
    ) -> Result<(), BusError<SPI, CS>> {
        self.bus.send(&Command::Clear {
            layer0,
            layer1,
            reset_addresses,
        })?;
        self.bus.delay_ms(self.config.clear_settle_ms);
        Ok(())
    }

    /// Program the mask of display area `area` (masked to 0–7).
    pub fn set_area(&mut self, area: u8, mask: u8) -> Result<(), BusError<SPI, CS>> {
        self.bus.send(&Command::SetArea { area, mask })
    }

    /// Hardware horizontal scroll.
    pub fn x_shift(&mut self, offset: u8) -> Result<(), BusError<SPI, CS>> {
        self.bus.send(&Command::XShift(offset))
    }

    /// Hardware vertical scroll by `amount` pixels (positive is down).
    ///
    /// Distances of 1, 2 and 8 take one command; anything else is sent as
    /// that many single-pixel shifts. Zero sends nothing.
    pub fn y_shift(&mut self, amount: i8) -> Result<(), BusError<SPI, CS>> {
        let shifts = commands::y_shift(amount);

        #[cfg(feature = "defmt")]
        if shifts.is_decomposed() {
            defmt::warn!("y shift {} sent as {} unit shifts", amount, shifts.len());
        }

        for command in shifts {
            self.bus.send(&command)?;
        }
        Ok(())
    }

    /// Read the controller's `(x, y)` address counters.
    pub fn read_addresses(&mut self) -> Result<(u8, u8), BusError<SPI, CS>> {
        self.bus.send(&Command::ReadAddresses)?;
        let x = self.bus.read_byte()? & READ_X_MASK;
        let y = self.bus.read_byte()?;
        Ok((x, y))
    }
}

// ── Pixel surface ────────────────────────────────────────────────────────

impl<SPI, CS, DC, D> OriginDimensions for Gu800<SPI, CS, DC, D> {
    fn size(&self) -> Size {
        self.framebuffer.size()
    }
}

impl<SPI, CS, DC, D> DrawTarget for Gu800<SPI, CS, DC, D> {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.framebuffer.draw_iter(pixels)
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        self.framebuffer.fill_solid(area, color)
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        DrawTarget::clear(&mut self.framebuffer, color)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
