//! Double-buffered page state.
//!
//! The controller's display memory holds two full-screen pages. One is
//! shown while the other is written; a refresh fills the hidden page and
//! then makes it the visible one.

use crate::commands::{CombineFunction, Command, HEIGHT_BYTES};

/// One of the two hardware pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Page {
    /// Layer 0, Y addresses `0..8`.
    #[default]
    A,
    /// Layer 1, Y addresses `8..16`.
    B,
}

impl Page {
    /// The other page.
    pub const fn other(self) -> Self {
        match self {
            Page::A => Page::B,
            Page::B => Page::A,
        }
    }

    /// First controller Y address of this page.
    pub const fn base_row(self) -> u8 {
        match self {
            Page::A => 0,
            Page::B => HEIGHT_BYTES as u8,
        }
    }

    /// Layer-enable flags `(layer0, layer1)` that show only this page.
    pub const fn layers(self) -> (bool, bool) {
        match self {
            Page::A => (true, false),
            Page::B => (false, true),
        }
    }
}

/// Which page is on screen, and how it is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PageState {
    pub visible: Page,
    pub inverted: bool,
}

impl PageState {
    /// The page the next full-buffer write goes to.
    pub const fn hidden(&self) -> Page {
        self.visible.other()
    }

    /// Swap visible and hidden pages.
    pub fn flip(&mut self) {
        self.visible = self.visible.other();
    }

    /// Mode command showing `page` with the current inversion.
    pub fn mode_for(&self, page: Page, power_on: bool) -> Command {
        let (layer0, layer1) = page.layers();
        Command::DisplayMode {
            layer0,
            layer1,
            inverse: self.inverted,
            power_on,
            combine: CombineFunction::Or,
        }
    }

    /// Mode command for the page currently on screen.
    pub fn visible_mode(&self, power_on: bool) -> Command {
        self.mode_for(self.visible, power_on)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────
