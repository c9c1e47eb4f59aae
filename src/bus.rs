/*!
CPU-visible memory bus: address decoding and routing.

Map:
- $0000-$1FFF: 2 KiB work RAM, mirrored every $0800.
- $2000-$3FFF: the 8 PPU registers, mirrored every 8 bytes.
- $4000-$4017: APU/IO window. Only $4014 (OAM DMA trigger) and $4016/$4017
  (joypad serial ports) are decoded; audio registers read 0 and ignore
  writes.
- $8000-$FFFF: PRG ROM through the cartridge mapper.

Reads from undecoded ranges return 0 with no side effect. Writes into
$4018-$7FFF hit nothing that exists on this board and are treated as a
programming error in debug builds.
*/

use crate::cartridge::Cartridge;
use crate::controller::Controller;
use crate::ppu::Ppu;

pub struct Bus {
    ram: [u8; 0x0800],
    pub ppu: Ppu,
    pub controllers: [Controller; 2],
    pub cartridge: Option<Cartridge>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    pub fn new() -> Self {
        Self {
            ram: [0; 0x0800],
            ppu: Ppu::new(),
            controllers: [Controller::new(), Controller::new()],
            cartridge: None,
        }
    }

    pub fn insert_cartridge(&mut self, cartridge: Cartridge) {
        self.cartridge = Some(cartridge);
    }

    pub fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x2000..=0x3FFF => {
                let cart = self.cartridge.as_ref();
                self.ppu.read_reg(addr & 0x0007, cart)
            }
            0x4000..=0x4017 => match addr & 0x1F {
                0x16 => self.controllers[0].read(),
                0x17 => self.controllers[1].read(),
                _ => 0,
            },
            0x8000..=0xFFFF => match &self.cartridge {
                Some(cart) => cart.mapper.borrow().cpu_read(addr),
                None => 0,
            },
            _ => 0,
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = value,
            0x2000..=0x3FFF => {
                let cart = self.cartridge.as_ref();
                self.ppu.write_reg(addr & 0x0007, value, cart);
            }
            0x4000..=0x4017 => match addr & 0x1F {
                0x14 => self.oam_dma(value),
                0x16 => self.controllers[0].reload(),
                0x17 => self.controllers[1].reload(),
                _ => { /* audio registers unimplemented */ }
            },
            0x8000..=0xFFFF => {
                // Mapper register space; NROM has none and ignores it.
                if let Some(cart) = &self.cartridge {
                    cart.mapper.borrow_mut().cpu_write(addr, value);
                }
            }
            _ => {
                debug_assert!(false, "write to unmapped address {addr:#06X}");
            }
        }
    }

    /// Little-endian word read, used for interrupt vectors.
    pub fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// OAM DMA: copy 256 bytes from `page << 8` into the PPU's OAM in
    /// address order, atomically from the CPU's point of view.
    fn oam_dma(&mut self, page: u8) {
        let base = (page as u16) << 8;
        let mut buf = [0u8; 256];
        for (i, b) in buf.iter_mut().enumerate() {
            *b = self.read(base + i as u16);
        }
        self.ppu.load_oam(&buf);
    }
}
