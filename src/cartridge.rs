/*!
Cartridge with iNES (v1) loader and mapper integration.

Features:
- Parse the iNES (v1) header from bytes or a file path.
- Extract PRG ROM and CHR (allocating 8 KiB of CHR RAM when the header
  declares zero CHR banks — some cartridges carry CHR RAM instead of ROM).
- Determine mirroring and mapper number, skip an optional 512-byte trainer.
- Construct a concrete `Mapper` the Bus and PPU delegate to.

Notes:
- NES 2.0 images are detected and rejected (`UnsupportedFileType`).
- Only mapper 0 (NROM) is functionally supported. Other mapper numbers are
  accepted and fall back to fixed NROM mapping with a warning; bank-switched
  titles will misbehave, but mapper-0-like ROMs still run.
*/

use std::cell::RefCell;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::mapper::{Mapper, Nrom};

const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;
const PRG_BANK_LEN: usize = 16 * 1024;
const CHR_BANK_LEN: usize = 8 * 1024;

/// Nametable arrangement declared by the cartridge header.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
}

/// Loader failures. All of these are input-contract violations; a
/// well-formed iNES v1 image never produces one.
#[derive(Debug, PartialEq, Eq)]
pub enum CartridgeError {
    /// Missing or malformed `NES\x1A` magic, or image shorter than a header.
    InvalidMagic,
    /// The image uses the NES 2.0 container format, which is not supported.
    UnsupportedFileType,
    /// The image is shorter than its declared PRG/CHR payload.
    Truncated,
    /// Underlying I/O failure when loading from a file path.
    Io(String),
}

impl fmt::Display for CartridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CartridgeError::InvalidMagic => write!(f, "invalid iNES header magic"),
            CartridgeError::UnsupportedFileType => {
                write!(f, "unsupported file type (NES 2.0 container)")
            }
            CartridgeError::Truncated => {
                write!(f, "image too small for declared PRG/CHR banks")
            }
            CartridgeError::Io(e) => write!(f, "failed to read cartridge image: {e}"),
        }
    }
}

impl std::error::Error for CartridgeError {}

pub struct Cartridge {
    // Mapper trait object; interior mutability lets read paths holding
    // a shared `&Cartridge` still delegate CHR RAM writes.
    pub mapper: RefCell<Box<dyn Mapper>>,

    mapper_number: u8,
    mirroring: Mirroring,
    prg_banks: u8,
    chr_banks: u8,
    chr_is_ram: bool,
}

impl fmt::Debug for Cartridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cartridge")
            .field("mapper_number", &self.mapper_number)
            .field("mirroring", &self.mirroring)
            .field("prg_banks", &self.prg_banks)
            .field("chr_banks", &self.chr_banks)
            .field("chr_is_ram", &self.chr_is_ram)
            .finish()
    }
}

impl Cartridge {
    /// Load a cartridge from raw iNES bytes and construct its mapper.
    pub fn from_ines_bytes(data: &[u8]) -> Result<Self, CartridgeError> {
        if data.len() < HEADER_LEN || &data[0..4] != b"NES\x1A" {
            return Err(CartridgeError::InvalidMagic);
        }

        let prg_banks = data[4];
        let chr_banks = data[5];
        let flags6 = data[6];
        let flags7 = data[7];

        // NES 2.0 if flags7 bits 2..3 == 0b10; an extended container this
        // loader does not understand.
        if (flags7 & 0x0C) == 0x08 {
            return Err(CartridgeError::UnsupportedFileType);
        }

        let mirroring = if flags6 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        // Mapper number: low nibble from flags6, high nibble from flags7.
        let mapper_number = (flags7 & 0xF0) | (flags6 >> 4);

        let mut offset = HEADER_LEN;
        if flags6 & 0x04 != 0 {
            // Trainer sits between header and PRG data; skip it.
            offset += TRAINER_LEN;
        }

        let prg_len = prg_banks as usize * PRG_BANK_LEN;
        if data.len() < offset + prg_len {
            return Err(CartridgeError::Truncated);
        }
        let prg_rom = data[offset..offset + prg_len].to_vec();
        offset += prg_len;

        // Zero CHR banks means the cartridge carries CHR RAM; allocate one
        // writable 8 KiB bank.
        let chr_is_ram = chr_banks == 0;
        let chr = if chr_is_ram {
            vec![0u8; CHR_BANK_LEN]
        } else {
            let chr_len = chr_banks as usize * CHR_BANK_LEN;
            if data.len() < offset + chr_len {
                return Err(CartridgeError::Truncated);
            }
            data[offset..offset + chr_len].to_vec()
        };

        log::debug!("cartridge mirroring: {mirroring:?}");
        log::debug!("cartridge mapper: {mapper_number}");

        if mapper_number != 0 {
            // Accepted but not banked: mapper-0-like titles coincidentally
            // still run, bank-switched ones will not.
            log::warn!("unsupported mapper {mapper_number}; falling back to fixed NROM mapping");
        }
        let mapper: Box<dyn Mapper> = Box::new(Nrom::new(prg_rom, chr, chr_is_ram));

        Ok(Self {
            mapper: RefCell::new(mapper),
            mapper_number,
            mirroring,
            prg_banks,
            chr_banks,
            chr_is_ram,
        })
    }

    /// Load a cartridge from an iNES file (.nes).
    pub fn from_ines_file<P: AsRef<Path>>(path: P) -> Result<Self, CartridgeError> {
        let bytes = fs::read(path).map_err(|e| CartridgeError::Io(e.to_string()))?;
        Self::from_ines_bytes(&bytes)
    }

    pub fn mapper_number(&self) -> u8 {
        self.mapper_number
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    pub fn prg_banks(&self) -> u8 {
        self.prg_banks
    }

    pub fn chr_banks(&self) -> u8 {
        self.chr_banks
    }

    pub fn chr_is_ram(&self) -> bool {
        self.chr_is_ram
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::build_ines;

    #[test]
    fn parse_nrom_32k_chr8k() {
        let flags6 = 0b0000_0001; // vertical mirroring
        let data = build_ines(2, 1, flags6, 0, None);
        let cart = Cartridge::from_ines_bytes(&data).expect("parse");

        assert_eq!(cart.mapper_number(), 0);
        assert_eq!(cart.mirroring(), Mirroring::Vertical);
        assert_eq!(cart.prg_banks(), 2);
        assert!(!cart.chr_is_ram());

        // 32 KiB PRG maps the whole window.
        assert_eq!(cart.mapper.borrow().cpu_read(0x8000), 0xAA);
        assert_eq!(cart.mapper.borrow().cpu_read(0xFFFF), 0xAA);
    }

    #[test]
    fn zero_chr_banks_allocates_chr_ram() {
        let data = build_ines(1, 0, 0, 0, None);
        let cart = Cartridge::from_ines_bytes(&data).expect("parse");

        assert_eq!(cart.mirroring(), Mirroring::Horizontal);
        assert!(cart.chr_is_ram());
        cart.mapper.borrow_mut().ppu_write(0x0042, 0x99);
        assert_eq!(cart.mapper.borrow().ppu_read(0x0042), 0x99);
    }

    #[test]
    fn trainer_region_is_skipped() {
        let mut trainer = [0u8; 512];
        for (i, b) in trainer.iter_mut().enumerate() {
            *b = (i & 0xFF) as u8;
        }
        let flags6 = 0b0000_0100; // trainer present
        let data = build_ines(1, 1, flags6, 0, Some(&trainer));
        let cart = Cartridge::from_ines_bytes(&data).expect("parse");
        // PRG data must start after the trainer, not inside it.
        assert_eq!(cart.mapper.borrow().cpu_read(0x8000), 0xAA);
    }

    #[test]
    fn invalid_magic_rejected() {
        let mut data = build_ines(1, 1, 0, 0, None);
        data[0] = b'X';
        assert_eq!(
            Cartridge::from_ines_bytes(&data).unwrap_err(),
            CartridgeError::InvalidMagic
        );
    }

    #[test]
    fn nes2_container_rejected() {
        let flags7 = 0b0000_1000;
        let data = build_ines(1, 1, 0, flags7, None);
        assert_eq!(
            Cartridge::from_ines_bytes(&data).unwrap_err(),
            CartridgeError::UnsupportedFileType
        );
    }

    #[test]
    fn truncated_image_rejected() {
        let mut data = build_ines(2, 1, 0, 0, None);
        data.truncate(16 + 1024);
        assert_eq!(
            Cartridge::from_ines_bytes(&data).unwrap_err(),
            CartridgeError::Truncated
        );
    }

    #[test]
    fn unknown_mapper_falls_back_to_nrom() {
        let flags6 = 0x40; // mapper low nibble = 4
        let data = build_ines(1, 1, flags6, 0, None);
        let cart = Cartridge::from_ines_bytes(&data).expect("parse");
        assert_eq!(cart.mapper_number(), 4);
        // Fixed mapping still answers reads.
        assert_eq!(cart.mapper.borrow().cpu_read(0xC000), 0xAA);
    }
}
