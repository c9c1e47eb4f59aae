/*!
Scanline compositor: background tile rows, sprites, and the master palette.

The driving loop calls `render_bg_row` once per visible 8-pixel tile row and
`render_sprites` once per frame at vblank entry, so the frame buffer is
composed from 30 background passes plus one sprite pass. Pixels are written
as 0xAARRGGBB into a 256x240 `u32` buffer.

Deliberate simplifications carried over from the timing model:
- no sprite priority (later OAM entries overdraw earlier ones and the
  background),
- no 8-sprites-per-line limit,
- background color 0 is opaque backdrop, sprite color 0 is transparent.
*/

use super::{
    CTRL_BG_TABLE, CTRL_NAMETABLE, CTRL_SPRITE_SIZE, CTRL_SPRITE_TABLE, MASK_BG_EDGE, Ppu,
    SPR_FLIP_H, SPR_FLIP_V, SPR_PALETTE,
};
use crate::cartridge::Cartridge;

pub const FRAME_WIDTH: usize = 256;
pub const FRAME_HEIGHT: usize = 240;

/// Master palette: the 64 hardware color entries as ARGB.
pub const NES_PALETTE: [u32; 64] = [
    0xFF626262, 0xFF001FB2, 0xFF2404C8, 0xFF5200B2, 0xFF730076, 0xFF800024, 0xFF730B00, 0xFF522800,
    0xFF244400, 0xFF005700, 0xFF005C00, 0xFF005324, 0xFF003C76, 0xFF000000, 0xFF000000, 0xFF000000,
    0xFFABABAB, 0xFF0D57FF, 0xFF4B30FF, 0xFF8A13FF, 0xFFBC08D6, 0xFFD21269, 0xFFC72E00, 0xFF9D5400,
    0xFF607B00, 0xFF209800, 0xFF00A300, 0xFF009942, 0xFF007DB4, 0xFF000000, 0xFF000000, 0xFF000000,
    0xFFFFFFFF, 0xFF53AEFF, 0xFF9085FF, 0xFFD365FF, 0xFFFF57FF, 0xFFFF5DCF, 0xFFFF7757, 0xFFFA9E00,
    0xFFBDC700, 0xFF7AE700, 0xFF43F611, 0xFF26EF7E, 0xFF2CD5F6, 0xFF4E4E4E, 0xFF000000, 0xFF000000,
    0xFFFFFFFF, 0xFFB6E1FF, 0xFFCED1FF, 0xFFE9C3FF, 0xFFFFBCFF, 0xFFFFBDF4, 0xFFFFC6C3, 0xFFFFD59A,
    0xFFE9E681, 0xFFCEF481, 0xFFB6FB9A, 0xFFA9FAC3, 0xFFA9F0F4, 0xFFB8B8B8, 0xFF000000, 0xFF000000,
];

impl Ppu {
    /// Completed 256x240 frame, 0xAARRGGBB per pixel, row-major.
    pub fn frame(&self) -> &[u32] {
        &self.frame
    }

    /// Compose one 8-pixel-tall background tile row (`row` in 0..30),
    /// honoring coarse+fine scroll. Horizontal overflow wraps into the next
    /// nametable; vertical overflow past tile row 30 crosses the two-table
    /// seam.
    pub fn render_bg_row(&mut self, row: usize, cart: Option<&Cartridge>) {
        let mut table_addr = 0x2000 + (self.ctrl & CTRL_NAMETABLE) as u16 * 0x400;
        let chr_table = ((self.ctrl & CTRL_BG_TABLE) >> 4) as u16;

        let scroll_x = (self.scroll & 0x00FF) as i32;
        let scroll_y = (self.scroll >> 8) as i32;
        let mut cx = scroll_x >> 3;
        let fx = scroll_x & 7;
        let fy = scroll_y & 7;

        // The edge bit widens the row by one tile so fine scroll has
        // something to reveal on the right.
        let columns = 32 + i32::from(self.mask & MASK_BG_EDGE != 0);

        let mut y = (scroll_y >> 3) + row as i32;
        if y >= 30 {
            table_addr += 0x800;
            y -= 30;
        }

        for x in 0..columns {
            if cx >= 32 {
                table_addr += 0x400;
                cx -= 32;
            }

            let tile = self.vram_read(table_addr + (y * 32 + cx) as u16, cart);
            // Attribute table: one byte per 4x4 tile block, 2 bits per 2x2
            // quadrant.
            let attr = self.vram_read(table_addr + 0x3C0 + (((y >> 2) << 3) + (cx >> 2)) as u16, cart);
            let shift = (cx & 2) as u32 | ((y & 2) << 1) as u32;
            let pal = ((attr >> shift) & 3) << 2;

            self.blit_tile(
                cart,
                tile as u16,
                chr_table,
                pal,
                false,
                false,
                false,
                x * 8 - fx,
                row as i32 * 8 - fy,
            );
            cx += 1;
        }
    }

    /// Compose all 64 OAM sprites over the frame. Entries with Y >= 0xEF are
    /// hidden; 8x16 sprites take their pattern table from tile bit 0 and
    /// stack two tiles vertically.
    pub fn render_sprites(&mut self, cart: Option<&Cartridge>) {
        let default_table = ((self.ctrl & CTRL_SPRITE_TABLE) >> 3) as u16;
        let tall = self.ctrl & CTRL_SPRITE_SIZE != 0;

        for i in 0..64 {
            let y = self.oam[i * 4];
            if y >= 0xEF {
                continue;
            }
            let tile = self.oam[i * 4 + 1];
            let attr = self.oam[i * 4 + 2];
            let x = self.oam[i * 4 + 3] as i32;
            let y = y as i32;

            let pal = ((attr & SPR_PALETTE) << 2) | 0x10;
            let flip_h = attr & SPR_FLIP_H != 0;
            let flip_v = attr & SPR_FLIP_V != 0;

            if tall {
                let table = (tile & 1) as u16;
                let id = (tile & !1) as u16;
                self.blit_tile(cart, id, table, pal, flip_h, flip_v, true, x, y);
                self.blit_tile(cart, id + 1, table, pal, flip_h, flip_v, true, x, y + 8);
            } else {
                self.blit_tile(cart, tile as u16, default_table, pal, flip_h, flip_v, true, x, y);
            }
        }
    }

    /// Decode one 8x8 2bpp tile from the given pattern table and write its
    /// pixels clipped to the frame. `pal` is the palette base slot (already
    /// shifted); color index 0 maps to the backdrop slot, or skips the pixel
    /// entirely when `transparent` is set.
    #[allow(clippy::too_many_arguments)]
    fn blit_tile(
        &mut self,
        cart: Option<&Cartridge>,
        tile: u16,
        table: u16,
        pal: u8,
        flip_h: bool,
        flip_v: bool,
        transparent: bool,
        x: i32,
        y: i32,
    ) {
        let base = table * 0x1000 + tile * 16;

        for iy in 0..8 {
            // Two bit planes 8 bytes apart; bit 7 is the leftmost pixel.
            let mut lo = self.vram_read(base + iy, cart);
            let mut hi = self.vram_read(base + iy + 8, cart);

            for ix in 0..8 {
                let ci = (lo >> 7) | ((hi >> 6) & 2);
                lo <<= 1;
                hi <<= 1;

                if transparent && ci == 0 {
                    continue;
                }
                let slot = if ci == 0 { 0 } else { pal | ci };
                let color = self.palette[Self::palette_slot(slot as u16)];

                let sx = x + if flip_h { 7 - ix } else { ix };
                let sy = y + i32::from(if flip_v { 7 - iy } else { iy });
                if (0..FRAME_WIDTH as i32).contains(&sx) && (0..FRAME_HEIGHT as i32).contains(&sy) {
                    self.frame[sy as usize * FRAME_WIDTH + sx as usize] =
                        NES_PALETTE[(color & 0x3F) as usize];
                }
            }
        }
    }
}
