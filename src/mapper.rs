/*!
Mapper subsystem: strategy trait plus the NROM (mapper 0) implementation.

Purpose:
- Decouple cartridge address mapping from the `Cartridge` container so
  additional mappers can be added without touching the Bus.
- The Bus forwards CPU $8000..=$FFFF to `cpu_read`/`cpu_write`; the PPU
  forwards pattern-table accesses ($0000..=$1FFF) to `ppu_read`/`ppu_write`.

Only fixed mapping (NROM) is functionally supported. The trait exists so a
bank-switching mapper can slot in behind the same interface later.
*/

/// Common interface all cartridge mappers implement.
///
/// All methods take full, unmasked CPU or PPU addresses; implementations
/// decide the bank mapping.
pub trait Mapper {
    /// Mapper numeric identifier (0 for NROM).
    fn mapper_id(&self) -> u8;

    /// CPU-visible read in $8000..=$FFFF.
    fn cpu_read(&self, addr: u16) -> u8;

    /// CPU-visible write in $8000..=$FFFF (ignored by NROM).
    fn cpu_write(&mut self, addr: u16, value: u8);

    /// PPU-visible read in the pattern-table region $0000..=$1FFF.
    fn ppu_read(&self, addr: u16) -> u8;

    /// PPU-visible write in the pattern-table region (honored for CHR RAM).
    fn ppu_write(&mut self, addr: u16, value: u8);
}

/// NROM (mapper 0): fixed 16 KiB (mirrored) or 32 KiB PRG window at
/// $8000..=$FFFF and a single 8 KiB CHR bank (ROM, or RAM when the
/// cartridge declared zero CHR banks).
pub struct Nrom {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,
}

impl Nrom {
    pub fn new(prg_rom: Vec<u8>, chr: Vec<u8>, chr_is_ram: bool) -> Self {
        Self {
            prg_rom,
            chr,
            chr_is_ram,
        }
    }

    /// PRG address mask: one 16 KiB bank mirrors across the 32 KiB window,
    /// two banks map directly.
    #[inline]
    fn prg_mask(&self) -> usize {
        if self.prg_rom.len() > 16 * 1024 {
            0x7FFF
        } else {
            0x3FFF
        }
    }

    pub fn chr_is_ram(&self) -> bool {
        self.chr_is_ram
    }
}

impl Mapper for Nrom {
    #[inline]
    fn mapper_id(&self) -> u8 {
        0
    }

    fn cpu_read(&self, addr: u16) -> u8 {
        if self.prg_rom.is_empty() {
            return 0;
        }
        self.prg_rom[(addr as usize) & self.prg_mask()]
    }

    fn cpu_write(&mut self, _addr: u16, _value: u8) {
        // NROM has no bank registers; ROM-space writes are ignored.
    }

    fn ppu_read(&self, addr: u16) -> u8 {
        self.chr[(addr as usize) & 0x1FFF]
    }

    fn ppu_write(&mut self, addr: u16, value: u8) {
        if self.chr_is_ram {
            self.chr[(addr as usize) & 0x1FFF] = value;
        }
    }
}
