/*!
Console coordinator: owns the CPU and bus, drives the scanline loop and
carries the PPU's NMI request into the CPU.

Timing model: each scanline runs a fixed CPU instruction budget, then the
PPU advances one line. Background tile rows are composed every 8th visible
line and sprites once per frame at vblank entry, so a full frame is 262
scanline steps.
*/

use crate::bus::Bus;
use crate::cartridge::{Cartridge, CartridgeError};
use crate::controller::Button;
use crate::cpu::Cpu;
use std::path::Path;

/// CPU instructions executed per scanline step.
pub const INSTRUCTIONS_PER_SCANLINE: u32 = 48;

/// Scanline steps per frame (pre-render + 240 visible + post-render/vblank).
pub const SCANLINES_PER_FRAME: u32 = 262;

pub struct Nes {
    pub cpu: Cpu,
    pub bus: Bus,
    /// Per-scanline CPU budget; the hardware default approximates NTSC
    /// timing for the instruction-count model.
    pub instructions_per_scanline: u32,
}

impl Default for Nes {
    fn default() -> Self {
        Self::new()
    }
}

impl Nes {
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            bus: Bus::new(),
            instructions_per_scanline: INSTRUCTIONS_PER_SCANLINE,
        }
    }

    /// Insert a cartridge and run the power-on sequence.
    pub fn insert_cartridge(&mut self, cartridge: Cartridge) {
        self.bus.insert_cartridge(cartridge);
        self.reset();
    }

    /// Convenience: load an iNES file and power on.
    pub fn load_ines_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), CartridgeError> {
        let cartridge = Cartridge::from_ines_file(path)?;
        self.insert_cartridge(cartridge);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.bus.ppu.reset();
        self.cpu.reset(&mut self.bus);
    }

    /// Run one scanline step: the CPU budget, one PPU line, NMI delivery,
    /// and any rendering due on the new line. Returns true at vblank entry,
    /// when the frame buffer holds a completed picture.
    pub fn step_scanline(&mut self) -> bool {
        self.cpu.run(&mut self.bus, self.instructions_per_scanline);

        if self.bus.ppu.advance_scanline() {
            self.cpu.nmi(&mut self.bus);
        }

        let bus = &mut self.bus;
        let scanline = bus.ppu.scanline();

        if (0..=240).contains(&scanline) && scanline % 8 == 0 && bus.ppu.background_enabled() {
            let cart = bus.cartridge.as_ref();
            bus.ppu.render_bg_row((scanline >> 3) as usize, cart);
        }

        if scanline == crate::ppu::VBLANK_LINE {
            if bus.ppu.sprites_enabled() {
                let cart = bus.cartridge.as_ref();
                bus.ppu.render_sprites(cart);
            }
            return true;
        }
        false
    }

    /// Advance a full 262-scanline frame.
    pub fn run_frame(&mut self) {
        for _ in 0..SCANLINES_PER_FRAME {
            self.step_scanline();
        }
    }

    /// Replace a pad's live button state wholesale.
    pub fn set_buttons_mask(&mut self, pad: usize, mask: u8) {
        self.bus.controllers[pad & 1].set_state_mask(mask);
    }

    pub fn set_button(&mut self, pad: usize, button: Button, pressed: bool) {
        self.bus.controllers[pad & 1].set_button(button, pressed);
    }

    /// Last composed 256x240 frame, 0xAARRGGBB row-major.
    pub fn frame(&self) -> &[u32] {
        self.bus.ppu.frame()
    }
}
