//! Core emulation of the TMS9918A-family video display processor: VRAM,
//! the eight control registers, the two-port byte-wise I/O protocol, the
//! four display modes, and the sprite engine.
//!
//! This crate models the chip only: it has no notion of a host CPU, a bus,
//! or a window. A [`Device`] is driven entirely through its port methods
//! ([`Device::write_addr`], [`Device::write_data`], [`Device::read_data`],
//! [`Device::read_status`]) and rendered one scanline at a time through
//! [`Device::scanline`].

pub mod log;
pub mod vdp;

pub use vdp::{Device, Mode};
pub use vdp::{PIXELS_X, PIXELS_Y, VRAM_SIZE};
pub use vdp::{STATUS_5S, STATUS_COL, STATUS_INT};
pub use vdp::{LAST_SPRITE_VPOS, NUM_REGISTERS};
