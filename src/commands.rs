//! GU800 command encoder.
//!
//! Every controller operation the driver issues is described by a
//! [`Command`] value and turned into framed bytes by [`Command::encode`].
//! The bit layouts below are fixed by the controller's command set:
//!
//! ```text
//! DisplayMode    0010 L1 L0 00   0 GS 0 GRV AND EXOR 00
//! Dim            0100 LLLL
//! Clear          0101 L1 L0 1 A
//! SetArea        0110 0010  0000 0aaa  mmmm mmmm (data)
//! SetXAddress    0110 0100  xxxx xxxx
//! SetYAddress    0110 0000  yyyy yyyy
//! XShift         0111 0000  oooo oooo
//! YShift         1011 D MM 0
//! AddressMode    1000 Y X 00
//! ReadAddresses  1101 0100
//! ```
//!
//! Encoding is pure: nothing here touches the bus.

use heapless::Vec;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Display width in pixels.
pub const WIDTH: usize = 128;

/// Display height in pixels.
pub const HEIGHT: usize = 64;

/// Number of 8-pixel row bands per page.
pub const HEIGHT_BYTES: usize = HEIGHT / 8;

/// Number of display areas addressable by [`Command::SetArea`].
pub const AREA_COUNT: u8 = 8;

/// Brightest [`Command::Dim`] level.
pub const MAX_BRIGHTNESS: u8 = 0x0F;

/// Valid bits of the X address returned by [`Command::ReadAddresses`].
/// The top bit is undefined.
pub const READ_X_MASK: u8 = 0x7F;

// ---------------------------------------------------------------------------
// Bus settings
// ---------------------------------------------------------------------------

/// SPI mode the controller samples in (CPOL = 1, CPHA = 1, MSB first).
pub const SPI_MODE: embedded_hal::spi::Mode = embedded_hal::spi::MODE_3;

/// Fastest serial clock the controller accepts.
pub const MAX_SPI_FREQUENCY_HZ: u32 = 5_000_000;

// ---------------------------------------------------------------------------
// Opcodes
// ---------------------------------------------------------------------------

const OP_DISPLAY_MODE: u8 = 0b0010_0000;
const OP_DIM: u8 = 0b0100_0000;
const OP_CLEAR: u8 = 0b0101_0010;
const OP_SET_AREA: u8 = 0b0110_0010;
const OP_SET_X_ADDRESS: u8 = 0b0110_0100;
const OP_SET_Y_ADDRESS: u8 = 0b0110_0000;
const OP_X_SHIFT: u8 = 0b0111_0000;
const OP_Y_SHIFT: u8 = 0b1011_0000;
const OP_ADDRESS_MODE: u8 = 0b1000_0000;
const OP_READ_ADDRESSES: u8 = 0b1101_0100;

// DisplayMode, first byte
const MODE_LAYER0: u8 = 1 << 2;
const MODE_LAYER1: u8 = 1 << 3;
// DisplayMode, second byte
const MODE_POWER_ON: u8 = 1 << 6;
const MODE_INVERSE: u8 = 1 << 4;
const MODE_AND: u8 = 1 << 3;
const MODE_XOR: u8 = 1 << 2;

const CLEAR_LAYER0: u8 = 1 << 2;
const CLEAR_LAYER1: u8 = 1 << 3;
const CLEAR_ADDRESSES: u8 = 1 << 0;

const ADDR_AUTO_X: u8 = 1 << 2;
const ADDR_AUTO_Y: u8 = 1 << 3;

const Y_SHIFT_DOWN: u8 = 1 << 3;

// ── Framing ──────────────────────────────────────────────────────────────

/// State of the command/data line while a byte is transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Framing {
    /// Opcode or command parameter (C/D line high).
    Command,
    /// Display or mask data (C/D line low).
    Data,
}

/// One byte as it goes out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    /// Value clocked out, MSB first.
    pub byte: u8,
    /// Level of the C/D line while it is sent.
    pub kind: Framing,
}

impl Frame {
    /// A byte sent with C/D high.
    pub const fn command(byte: u8) -> Self {
        Self {
            byte,
            kind: Framing::Command,
        }
    }

    /// A byte sent with C/D low.
    pub const fn data(byte: u8) -> Self {
        Self {
            byte,
            kind: Framing::Data,
        }
    }
}

/// Longest encoded command (`SetArea`) is three bytes.
pub type Encoded = Vec<Frame, 3>;

// ── Command parameters ───────────────────────────────────────────────────

/// How the two layers are combined when both are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CombineFunction {
    #[default]
    Or,
    Xor,
    And,
}

impl CombineFunction {
    const fn bits(self) -> u8 {
        match self {
            CombineFunction::Or => 0,
            CombineFunction::Xor => MODE_XOR,
            CombineFunction::And => MODE_AND,
        }
    }
}

/// Direction of a hardware Y shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShiftDirection {
    /// Negative amounts.
    Up,
    /// Positive amounts.
    Down,
}

/// Y shift distances with a single-command encoding.
///
/// `Eight` encodes to the same bits as `One`. The controller command table
/// the driver was written against gives it that code, and it is kept as-is
/// until it can be checked against hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShiftMagnitude {
    One,
    Two,
    Eight,
}

impl ShiftMagnitude {
    /// Class code placed in bits 2-1 of the Y shift opcode.
    const fn class(self) -> u8 {
        match self {
            ShiftMagnitude::One => 0b10,
            ShiftMagnitude::Two => 0b11,
            ShiftMagnitude::Eight => 0b10,
        }
    }

    /// Map a pixel distance to its single-command class, if it has one.
    pub const fn from_distance(distance: u8) -> Option<Self> {
        match distance {
            1 => Some(ShiftMagnitude::One),
            2 => Some(ShiftMagnitude::Two),
            8 => Some(ShiftMagnitude::Eight),
            _ => None,
        }
    }
}

// ── Command ──────────────────────────────────────────────────────────────

/// A single controller command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Select visible layers, inversion, power and layer combination.
    DisplayMode {
        layer0: bool,
        layer1: bool,
        inverse: bool,
        power_on: bool,
        combine: CombineFunction,
    },
    /// Set tube brightness. Levels above 15 are clamped.
    Dim(u8),
    /// Clear display memory of the selected layers.
    Clear {
        layer0: bool,
        layer1: bool,
        reset_addresses: bool,
    },
    /// Program the mask of one of the eight display areas.
    /// `0xFF` puts the area in graphics mode.
    SetArea { area: u8, mask: u8 },
    /// Set the X (column) address counter.
    SetXAddress(u8),
    /// Set the Y (row band) address counter. Page B starts at 8.
    SetYAddress(u8),
    /// Hardware horizontal scroll offset.
    XShift(u8),
    /// Hardware vertical scroll by one of the encodable distances.
    YShift {
        direction: ShiftDirection,
        magnitude: ShiftMagnitude,
    },
    /// Select which address counters auto-increment on data writes.
    AddressMode { auto_x: bool, auto_y: bool },
    /// Request the current X/Y address counters. The controller answers
    /// with two bytes, X first.
    ReadAddresses,
}

impl Command {
    /// Encode the command into its on-wire byte sequence.
    pub fn encode(&self) -> Encoded {
        let mut out = Encoded::new();
        // `Encoded` holds three frames and no command needs more, so the
        // pushes below cannot fail.
        match *self {
            Command::DisplayMode {
                layer0,
                layer1,
                inverse,
                power_on,
                combine,
            } => {
                let mut select = OP_DISPLAY_MODE;
                if layer0 {
                    select |= MODE_LAYER0;
                }
                if layer1 {
                    select |= MODE_LAYER1;
                }

                let mut control = combine.bits();
                if power_on {
                    control |= MODE_POWER_ON;
                }
                if inverse {
                    control |= MODE_INVERSE;
                }

                let _ = out.push(Frame::command(select));
                let _ = out.push(Frame::command(control));
            }
            Command::Dim(level) => {
                let _ = out.push(Frame::command(OP_DIM | level.min(MAX_BRIGHTNESS)));
            }
            Command::Clear {
                layer0,
                layer1,
                reset_addresses,
            } => {
                let mut cmd = OP_CLEAR;
                if layer0 {
                    cmd |= CLEAR_LAYER0;
                }
                if layer1 {
                    cmd |= CLEAR_LAYER1;
                }
                if reset_addresses {
                    cmd |= CLEAR_ADDRESSES;
                }
                let _ = out.push(Frame::command(cmd));
            }
            Command::SetArea { area, mask } => {
                let _ = out.push(Frame::command(OP_SET_AREA));
                let _ = out.push(Frame::command(area & (AREA_COUNT - 1)));
                let _ = out.push(Frame::data(mask));
            }
            Command::SetXAddress(addr) => {
                let _ = out.push(Frame::command(OP_SET_X_ADDRESS));
                let _ = out.push(Frame::command(addr));
            }
            Command::SetYAddress(addr) => {
                let _ = out.push(Frame::command(OP_SET_Y_ADDRESS));
                let _ = out.push(Frame::command(addr));
            }
            Command::XShift(offset) => {
                let _ = out.push(Frame::command(OP_X_SHIFT));
                let _ = out.push(Frame::command(offset));
            }
            Command::YShift {
                direction,
                magnitude,
            } => {
                let mut cmd = OP_Y_SHIFT | (magnitude.class() << 1);
                if direction == ShiftDirection::Down {
                    cmd |= Y_SHIFT_DOWN;
                }
                let _ = out.push(Frame::command(cmd));
            }
            Command::AddressMode { auto_x, auto_y } => {
                let mut cmd = OP_ADDRESS_MODE;
                if auto_x {
                    cmd |= ADDR_AUTO_X;
                }
                if auto_y {
                    cmd |= ADDR_AUTO_Y;
                }
                let _ = out.push(Frame::command(cmd));
            }
            Command::ReadAddresses => {
                let _ = out.push(Frame::command(OP_READ_ADDRESSES));
            }
        }
        out
    }
}

// ── Y shift decomposition ────────────────────────────────────────────────

/// Plan the commands for a signed Y shift.
///
/// - `0` produces nothing.
/// - `±1`, `±2` and `±8` produce a single command.
/// - Any other distance `n` produces `n` unit shifts in the same direction.
pub fn y_shift(amount: i8) -> YShiftSequence {
    let direction = if amount >= 0 {
        ShiftDirection::Down
    } else {
        ShiftDirection::Up
    };
    let distance = amount.unsigned_abs();

    let (magnitude, remaining) = match ShiftMagnitude::from_distance(distance) {
        Some(magnitude) => (magnitude, 1),
        None => (ShiftMagnitude::One, distance),
    };

    YShiftSequence {
        direction,
        magnitude,
        remaining,
    }
}

/// Iterator over the commands produced by [`y_shift`].
#[derive(Debug, Clone)]
pub struct YShiftSequence {
    direction: ShiftDirection,
    magnitude: ShiftMagnitude,
    remaining: u8,
}

impl YShiftSequence {
    /// `true` when the requested distance had no single-command encoding
    /// and is emitted as repeated unit shifts.
    pub fn is_decomposed(&self) -> bool {
        self.remaining > 1
    }
}

impl Iterator for YShiftSequence {
    type Item = Command;

    fn next(&mut self) -> Option<Command> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(Command::YShift {
            direction: self.direction,
            magnitude: self.magnitude,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for YShiftSequence {}

// ── Tests ────────────────────────────────────────────────────────────────
