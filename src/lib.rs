/*!
famicore: a library core for an 8-bit console emulator.

Components:
- `cartridge`: iNES (v1) loading, mirroring/mapper metadata, CHR RAM.
- `mapper`: the mapper strategy trait and the NROM implementation.
- `bus`: CPU address decoding across RAM, PPU registers, the IO window and
  PRG ROM, plus OAM DMA.
- `cpu`: table-dispatched 6502 interpreter with instruction-budget timing.
- `ppu`: register file, VRAM/OAM, scanline state machine and a per-tile-row
  software compositor producing a 256x240 `u32` frame.
- `controller`: joypad shift registers.
- `nes`: the coordinator tying the above into a scanline-stepped console.

The crate is deliberately host-free: no window, no audio, no input polling.
A host embeds `Nes`, feeds it button state, steps frames and presents the
frame buffer. Logging goes through the `log` facade; installing a logger is
the host's choice.
*/

pub mod bus;
pub mod cartridge;
pub mod controller;
pub mod cpu;
pub mod mapper;
pub mod nes;
pub mod ppu;

#[cfg(test)]
pub mod test_utils;

pub use bus::Bus;
pub use cartridge::{Cartridge, CartridgeError, Mirroring};
pub use controller::{Button, Controller};
pub use cpu::Cpu;
pub use mapper::{Mapper, Nrom};
pub use nes::{INSTRUCTIONS_PER_SCANLINE, Nes, SCANLINES_PER_FRAME};
pub use ppu::{FRAME_HEIGHT, FRAME_WIDTH, NES_PALETTE, Ppu};
