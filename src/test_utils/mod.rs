/*!
Shared builders for synthetic iNES images, compiled for tests only.

The builders produce well-formed iNES v1 byte vectors so loader, bus and
end-to-end tests don't each hand-roll headers. Filler payloads use
recognizable bytes (0xAA for PRG, 0xCC for CHR) so mapping tests can tell
regions apart.
*/

const HEADER_LEN: usize = 16;
const PRG_BANK_LEN: usize = 16 * 1024;
const CHR_BANK_LEN: usize = 8 * 1024;

/// Build an iNES v1 image with filler payloads.
pub fn build_ines(
    prg_16k: usize,
    chr_8k: usize,
    flags6: u8,
    flags7: u8,
    trainer: Option<&[u8; 512]>,
) -> Vec<u8> {
    let mut data = Vec::with_capacity(
        HEADER_LEN + trainer.map_or(0, |t| t.len()) + prg_16k * PRG_BANK_LEN + chr_8k * CHR_BANK_LEN,
    );
    data.extend_from_slice(b"NES\x1A");
    data.push(prg_16k as u8);
    data.push(chr_8k as u8);
    data.push(flags6);
    data.push(flags7);
    data.extend_from_slice(&[0; 8]);

    if let Some(t) = trainer {
        data.extend_from_slice(t);
    }
    data.extend(std::iter::repeat_n(0xAA, prg_16k * PRG_BANK_LEN));
    data.extend(std::iter::repeat_n(0xCC, chr_8k * CHR_BANK_LEN));
    data
}

/// Build an image around caller-provided PRG contents (padded with filler
/// CHR banks) and the given flags6.
pub fn build_ines_with_prg(prg: &[u8], chr_8k: usize, flags6: u8) -> Vec<u8> {
    assert!(prg.len() % PRG_BANK_LEN == 0, "PRG must be whole 16 KiB banks");
    let mut data = Vec::with_capacity(HEADER_LEN + prg.len() + chr_8k * CHR_BANK_LEN);
    data.extend_from_slice(b"NES\x1A");
    data.push((prg.len() / PRG_BANK_LEN) as u8);
    data.push(chr_8k as u8);
    data.push(flags6);
    data.push(0);
    data.extend_from_slice(&[0; 8]);
    data.extend_from_slice(prg);
    data.extend(std::iter::repeat_n(0xCC, chr_8k * CHR_BANK_LEN));
    data
}

/// `build_ines_with_prg` with default (horizontal mirroring, mapper 0)
/// flags.
pub fn build_nrom_with_prg(prg: &[u8], chr_8k: usize) -> Vec<u8> {
    build_ines_with_prg(prg, chr_8k, 0)
}

/// Write the NMI/reset/IRQ vectors into the top six bytes of a PRG bank
/// image.
pub fn set_vectors_in_prg(prg: &mut [u8], nmi: u16, reset: u16, irq: u16) {
    let top = prg.len() - 6;
    write_le_u16(&mut prg[top..top + 2], nmi);
    write_le_u16(&mut prg[top + 2..top + 4], reset);
    write_le_u16(&mut prg[top + 4..top + 6], irq);
}

fn write_le_u16(slot: &mut [u8], value: u16) {
    slot[0] = (value & 0xFF) as u8;
    slot[1] = (value >> 8) as u8;
}
