//! Timing and sequencing configuration.
//!
//! The display geometry is fixed by the hardware and lives in
//! [`commands`](crate::commands). Everything that is a matter of timing
//! lives here, so boards with slow level shifters or long cables can stretch
//! the bus windows without touching driver code.

/// Per-byte bus timing windows, in nanoseconds.
///
/// Hardware minimums are 40 ns settle, 1.5 µs hold and 80 ns gap. The
/// defaults leave margin on every one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusTiming {
    /// Chip-select asserted to first clock edge. Default: 1 µs.
    pub settle_ns: u32,
    /// Last clock edge to chip-select released. Default: 2 µs.
    pub hold_ns: u32,
    /// Chip-select released to the next assertion. Default: 1 µs.
    pub gap_ns: u32,
}

impl Default for BusTiming {
    fn default() -> Self {
        Self {
            settle_ns: 1_000,
            hold_ns: 2_000,
            gap_ns: 1_000,
        }
    }
}

/// Driver configuration.
///
/// [`Gu800Config::default()`] matches the timings the module is
/// characterised with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Gu800Config {
    /// Bus framing windows.
    pub timing: BusTiming,
    /// How long `/RESET` is held low. Default: 2 ms.
    pub reset_hold_ms: u32,
    /// Wait after a hardware clear before the next command. Default: 1 ms.
    pub clear_settle_ms: u32,
    /// Delay between brightness steps in power fades. Default: 20 ms.
    pub fade_step_ms: u32,
    /// Brightness assumed at construction (0–15). Default: 15.
    pub initial_brightness: u8,
}

impl Default for Gu800Config {
    fn default() -> Self {
        Self {
            timing: BusTiming::default(),
            reset_hold_ms: 2,
            clear_settle_ms: 1,
            fade_step_ms: 20,
            initial_brightness: 15,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
