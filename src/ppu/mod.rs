/*!
PPU core: CPU-visible register file, VRAM/OAM ownership, and the
scanline-driven timing state machine.

Scope:
- Implements the 8-register interface ($2000..$2007, mirrored by the Bus):
  * $2000 PPUCTRL / $2001 PPUMASK: raw bit-flag stores
  * $2002 PPUSTATUS: top 3 status bits over stale data-latch bits; reading
    clears vblank and resets the shared write toggle
  * $2003 OAMADDR / $2004 OAMDATA: byte-indexed OAM access
  * $2005 PPUSCROLL / $2006 PPUADDR: two-step writes through one shared
    toggle and buffer
  * $2007 PPUDATA: buffered VRAM reads (palette addresses bypass the
    buffer), auto-increment by 1 or 32
- Owns the two 1 KiB nametables, the 32-byte palette and 256 bytes of OAM.
  Pattern-table accesses delegate to the cartridge mapper.
- `advance_scanline` walks the -1..=260 counter once per call and returns
  whether an NMI is requested at vblank entry; the caller forwards that to
  the CPU (the PPU holds no CPU reference).

The compositor lives in `renderer.rs`.
*/

mod renderer;

pub use renderer::{FRAME_HEIGHT, FRAME_WIDTH, NES_PALETTE};

use crate::cartridge::{Cartridge, Mirroring};

// PPUCTRL bits.
pub const CTRL_NAMETABLE: u8 = 0x03;
pub const CTRL_INCREMENT_32: u8 = 1 << 2;
pub const CTRL_SPRITE_TABLE: u8 = 1 << 3;
pub const CTRL_BG_TABLE: u8 = 1 << 4;
pub const CTRL_SPRITE_SIZE: u8 = 1 << 5;
pub const CTRL_NMI_ENABLE: u8 = 1 << 7;

// PPUMASK bits.
pub const MASK_GRAYSCALE: u8 = 1 << 0;
pub const MASK_BG_EDGE: u8 = 1 << 1;
pub const MASK_SPRITE_EDGE: u8 = 1 << 2;
pub const MASK_SHOW_BG: u8 = 1 << 3;
pub const MASK_SHOW_SPRITES: u8 = 1 << 4;
pub const MASK_RENDERING: u8 = MASK_SHOW_BG | MASK_SHOW_SPRITES;

// PPUSTATUS bits.
pub const STATUS_SPRITE_OVERFLOW: u8 = 1 << 5;
pub const STATUS_SPRITE0_HIT: u8 = 1 << 6;
pub const STATUS_VBLANK: u8 = 1 << 7;

// OAM attribute bits.
pub const SPR_PALETTE: u8 = 0x03;
pub const SPR_FLIP_H: u8 = 1 << 6;
pub const SPR_FLIP_V: u8 = 1 << 7;

/// First scanline value; flags are cleared when a call starts here.
pub const PRE_RENDER_LINE: i16 = -1;
/// Scanline on which vblank begins and NMI may be requested.
pub const VBLANK_LINE: i16 = 241;
/// Last scanline before wrapping back to the pre-render line.
pub const LAST_LINE: i16 = 261;

pub struct Ppu {
    // CPU-visible registers.
    ctrl: u8,
    mask: u8,
    status: u8,
    oam_addr: u8,

    // Packed scroll register: x in the low byte, y in the high byte.
    scroll: u16,
    vram_addr: u16,

    // Shared two-step write plumbing for $2005/$2006 and the $2007 read
    // buffer. The toggle is reset by any $2002 read.
    write_buffer: u16,
    write_toggle: bool,
    data_buffer: u8,

    // Video memory owned by the PPU.
    nametables: [u8; 0x0800],
    palette: [u8; 32],
    oam: [u8; 256],

    scanline: i16,

    frame: Vec<u32>,
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl Ppu {
    pub fn new() -> Self {
        Self {
            ctrl: 0,
            mask: 0,
            status: 0,
            oam_addr: 0,
            scroll: 0,
            vram_addr: 0,
            write_buffer: 0,
            write_toggle: false,
            data_buffer: 0,
            nametables: [0; 0x0800],
            palette: [0; 32],
            oam: [0; 256],
            scanline: PRE_RENDER_LINE,
            frame: vec![0; FRAME_WIDTH * FRAME_HEIGHT],
        }
    }

    pub fn reset(&mut self) {
        let frame = std::mem::take(&mut self.frame);
        *self = Self::new();
        self.frame = frame;
        self.frame.fill(0);
    }

    // -----------------------------
    // Scanline state machine
    // -----------------------------

    /// Advance the scanline counter one step. Returns true when vblank entry
    /// requests an NMI (scanline 241 with the control bit enabled); the
    /// driving loop forwards the request into the CPU.
    pub fn advance_scanline(&mut self) -> bool {
        if self.scanline == PRE_RENDER_LINE {
            self.status &= !(STATUS_VBLANK | STATUS_SPRITE_OVERFLOW | STATUS_SPRITE0_HIT);
        }

        self.scanline += 1;

        if self.scanline <= 240 {
            // Naive sprite-0 heuristic: flag the line where sprite slot 0
            // starts whenever rendering is fully enabled.
            if (self.mask & MASK_RENDERING) == MASK_RENDERING
                && self.scanline == self.oam[0] as i16
            {
                self.status |= STATUS_SPRITE0_HIT;
            }
        } else if self.scanline == VBLANK_LINE {
            self.status |= STATUS_VBLANK;
            if self.ctrl & CTRL_NMI_ENABLE != 0 {
                return true;
            }
        } else if self.scanline == LAST_LINE {
            self.scanline = PRE_RENDER_LINE;
        }
        false
    }

    pub fn scanline(&self) -> i16 {
        self.scanline
    }

    pub fn vblank(&self) -> bool {
        self.status & STATUS_VBLANK != 0
    }

    pub fn background_enabled(&self) -> bool {
        self.mask & MASK_SHOW_BG != 0
    }

    pub fn sprites_enabled(&self) -> bool {
        self.mask & MASK_SHOW_SPRITES != 0
    }

    // -----------------------------
    // Register interface
    // -----------------------------

    /// CPU read of register `reg` (0..=7, pre-masked by the Bus).
    pub fn read_reg(&mut self, reg: u16, cart: Option<&Cartridge>) -> u8 {
        match reg {
            2 => {
                // Top status bits over stale low bits of the data latch.
                let value = (self.status & 0xE0) | (self.data_buffer & 0x1F);
                self.status &= !STATUS_VBLANK;
                self.write_toggle = false;
                value
            }
            4 => self.oam[self.oam_addr as usize],
            7 => {
                let addr = self.vram_addr & 0x3FFF;
                let stale = self.data_buffer;
                self.data_buffer = self.vram_read(addr, cart);
                // Palette reads bypass the one-byte delay.
                let value = if addr >= 0x3F00 {
                    self.data_buffer
                } else {
                    stale
                };
                self.vram_addr = self.vram_addr.wrapping_add(self.vram_increment());
                value
            }
            _ => 0,
        }
    }

    /// CPU write of register `reg` (0..=7, pre-masked by the Bus).
    pub fn write_reg(&mut self, reg: u16, value: u8, cart: Option<&Cartridge>) {
        match reg {
            0 => self.ctrl = value,
            1 => self.mask = value,
            2 => { /* PPUSTATUS is read-only */ }
            3 => self.oam_addr = value,
            4 => self.oam[self.oam_addr as usize] = value,
            5 => {
                // Two writes form the packed x/y scroll pair; the toggle is
                // shared with $2006.
                if !self.write_toggle {
                    self.write_buffer = value as u16;
                } else {
                    self.scroll = self.write_buffer | ((value as u16) << 8);
                }
                self.write_toggle = !self.write_toggle;
            }
            6 => {
                // High byte first, then low byte completes the address.
                if !self.write_toggle {
                    self.write_buffer = (value as u16) << 8;
                } else {
                    self.vram_addr = self.write_buffer | value as u16;
                }
                self.write_toggle = !self.write_toggle;
            }
            7 => {
                self.vram_write(self.vram_addr & 0x3FFF, value, cart);
                self.vram_addr = self.vram_addr.wrapping_add(self.vram_increment());
            }
            _ => { /* unreachable: Bus masks to 0..=7 */ }
        }
    }

    #[inline]
    fn vram_increment(&self) -> u16 {
        if self.ctrl & CTRL_INCREMENT_32 != 0 {
            32
        } else {
            1
        }
    }

    // -----------------------------
    // VRAM address resolution
    // -----------------------------

    /// Read a byte from PPU address space: pattern tables via the cartridge,
    /// nametables through the mirroring mode, palette with mirror aliasing.
    pub fn vram_read(&self, addr: u16, cart: Option<&Cartridge>) -> u8 {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => match cart {
                Some(cart) => cart.mapper.borrow().ppu_read(addr),
                None => 0,
            },
            0x2000..=0x3EFF => self.nametables[self.nametable_index(addr, cart)],
            _ => self.palette[Self::palette_slot(addr)],
        }
    }

    pub fn vram_write(&mut self, addr: u16, value: u8, cart: Option<&Cartridge>) {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => {
                if let Some(cart) = cart {
                    cart.mapper.borrow_mut().ppu_write(addr, value);
                }
            }
            0x2000..=0x3EFF => {
                let idx = self.nametable_index(addr, cart);
                self.nametables[idx] = value;
            }
            _ => self.palette[Self::palette_slot(addr)] = value,
        }
    }

    /// Resolve a logical nametable address to an index into the two
    /// physical 1 KiB tables. Vertical mirroring maps quadrants 0,2 to
    /// table 0 and 1,3 to table 1; horizontal maps 0,1 to table 0 and
    /// 2,3 to table 1.
    fn nametable_index(&self, addr: u16, cart: Option<&Cartridge>) -> usize {
        let mirroring = cart.map_or(Mirroring::Horizontal, Cartridge::mirroring);
        let a = (addr & 0x0FFF) as usize;
        let quadrant = a >> 10;
        let offset = a & 0x03FF;
        let table = match mirroring {
            Mirroring::Vertical => quadrant & 1,
            Mirroring::Horizontal => usize::from(quadrant >= 2),
        };
        table * 0x400 + offset
    }

    /// Palette addresses mask to 5 bits; the background-color mirror slots
    /// $10/$14/$18/$1C all alias slot $00.
    fn palette_slot(addr: u16) -> usize {
        match (addr & 0x1F) as usize {
            0x10 | 0x14 | 0x18 | 0x1C => 0x00,
            idx => idx,
        }
    }

    // -----------------------------
    // OAM access
    // -----------------------------

    /// Replace the whole OAM in address order 0..=255 (OAM DMA).
    pub fn load_oam(&mut self, data: &[u8; 256]) {
        self.oam.copy_from_slice(data);
    }

    pub fn peek_oam(&self, idx: usize) -> u8 {
        self.oam[idx & 0xFF]
    }

    pub fn poke_oam(&mut self, idx: usize, value: u8) {
        self.oam[idx & 0xFF] = value;
    }
}
