//! Brightness levels and fade progression.

use crate::commands::MAX_BRIGHTNESS;

/// A tube brightness level, always within `0..=15`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Brightness(u8);

impl Brightness {
    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(MAX_BRIGHTNESS);

    /// Clamp any integer into range. Out-of-range values are not an error.
    pub fn clamped(level: i32) -> Self {
        Self(level.clamp(0, MAX_BRIGHTNESS as i32) as u8)
    }

    pub const fn level(self) -> u8 {
        self.0
    }

    /// Levels visited when stepping from `self` to `target`, one per step.
    pub fn fade_to(self, target: Brightness) -> Fade {
        Fade {
            current: self.0,
            target: target.0,
        }
    }
}

impl Default for Brightness {
    fn default() -> Self {
        Self::MAX
    }
}

impl From<u8> for Brightness {
    fn from(level: u8) -> Self {
        Self(level.min(MAX_BRIGHTNESS))
    }
}

/// Single-step progression toward a target level.
///
/// Yields every level after the starting one, ending with the target.
/// Empty when already at the target.
#[derive(Debug, Clone)]
pub struct Fade {
    current: u8,
    target: u8,
}

impl Iterator for Fade {
    type Item = Brightness;

    fn next(&mut self) -> Option<Brightness> {
        if self.current == self.target {
            return None;
        }
        if self.current < self.target {
            self.current += 1;
        } else {
            self.current -= 1;
        }
        Some(Brightness(self.current))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.current.abs_diff(self.target) as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Fade {}

// ── Tests ────────────────────────────────────────────────────────────────
