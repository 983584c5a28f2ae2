//! The sprite engine: per-scanline scan, clip, magnify, plot, collision and
//! fifth-sprite accounting.

use crate::log::*;
use super::{Device, STATUS_5S, STATUS_COL};

/// Number of sprite slots in the sprite attribute table.
const NUM_SPRITE_SLOTS: u8 = 32;

/// Sentinel `vpos` value that terminates the sprite scan early.
pub const LAST_SPRITE_VPOS: u8 = 0xD0;

/// Maximum number of sprites the chip will draw on a single scanline before
/// setting the fifth-sprite flag.
const MAX_SPRITES_PER_LINE: u32 = 4;

impl Device {
    /// Overlays sprites onto `row`, which must already hold the background
    /// for scanline `y`. Updates `status` (5S, COL, and the sprite index in
    /// the low 5 bits) along the way. Called for every mode except Text.
    /// The whole-status clear at `y == 0` happens one level up, in
    /// `Device::scanline`, since it must happen for Text mode too.
    pub(crate) fn draw_sprites(&mut self, y: u8, row: &mut [u8; 256]) {
        let attr_base = self.registers.sprite_attr_table_base();
        let pattern_base = self.registers.sprite_pattern_table_base();
        let size = self.registers.sprite_size() as i32;
        let scale = self.registers.sprite_scale() as i32;

        let mut on_line_count: u32 = 0;
        let mut row_hits_cleared = false;

        for i in 0..NUM_SPRITE_SLOTS {
            let attr = attr_base.wrapping_add(i as u16 * 4);
            let vpos = self.vram_byte(attr);
            let hpos = self.vram_byte(attr.wrapping_add(1));
            let pattern_name = self.vram_byte(attr.wrapping_add(2));
            let color_attr = self.vram_byte(attr.wrapping_add(3));

            if vpos == LAST_SPRITE_VPOS {
                if self.status & STATUS_5S == 0 {
                    self.status |= i & 0x1F;
                }
                break;
            }

            let mut vpos = vpos as i32;
            if vpos > 0xE0 {
                vpos -= 256;
            }
            let sprite_top = vpos + 1;

            let mut pattern_row = y as i32 - sprite_top;
            if scale == 2 {
                pattern_row /= 2;
            }
            if pattern_row < 0 || pattern_row >= size {
                // Not on this line; doesn't count against the per-line limit.
                continue;
            }

            if !row_hits_cleared {
                self.sprite_row_hits = [false; 256];
                row_hits_cleared = true;
            }

            on_line_count += 1;
            if on_line_count > MAX_SPRITES_PER_LINE {
                if self.status & STATUS_5S == 0 {
                    warn!("[vdp] fifth sprite on scanline {}: slot {}", y, i);
                    self.status = (self.status & 0xE0) | STATUS_5S | (i & 0x1F);
                }
                break;
            }

            self.plot_sprite(y, row, pattern_row, hpos, pattern_name, color_attr, pattern_base, size, scale);
        }
    }

    /// Draws the horizontal run of one on-line sprite and records collisions.
    #[allow(clippy::too_many_arguments)]
    fn plot_sprite(
        &mut self,
        _y: u8,
        row: &mut [u8; 256],
        pattern_row: i32,
        hpos: u8,
        pattern_name: u8,
        color_attr: u8,
        pattern_base: u16,
        size: i32,
        scale: i32,
    ) {
        let color = color_attr & 0x0F;
        let early_clock = color_attr & 0x80 != 0;
        let start_x = hpos as i32 - if early_clock { 32 } else { 0 };

        // 16x16 sprites ignore the name's low two bits; the left half's two
        // 8-byte rows (top, bottom) are stored contiguously, then the right
        // half's two rows another 16 bytes later.
        let left_name = if size == 16 { pattern_name & 0xFC } else { pattern_name };
        let left_offset = pattern_base
            .wrapping_add((left_name as u16).wrapping_mul(8))
            .wrapping_add(pattern_row as u16);

        let mut pattern_byte = self.vram_byte(left_offset);
        let mut bit_index: i32 = 0;
        let mut sub_col: i32 = 0;
        let mut screen_col = start_x;

        for _ in 0..(size * scale) {
            if screen_col >= 256 {
                break;
            }

            if screen_col >= 0 {
                let local_bit = bit_index % 8;
                if pattern_byte & (0x80 >> local_bit) != 0 {
                    let col = screen_col as usize;
                    if self.sprite_row_hits[col] {
                        self.status |= STATUS_COL;
                    } else {
                        self.sprite_row_hits[col] = true;
                    }
                    if color != 0 {
                        row[col] = color;
                    }
                }
            }

            screen_col += 1;
            sub_col += 1;
            if sub_col == scale {
                sub_col = 0;
                bit_index += 1;
                if bit_index == 8 && size == 16 {
                    pattern_byte = self.vram_byte(left_offset.wrapping_add(16));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_device() -> Device {
        Device::new()
    }

    fn set_sprite(d: &mut Device, slot: u8, vpos: u8, hpos: u8, name: u8, color_attr: u8) {
        let base = d.registers.sprite_attr_table_base() + slot as u16 * 4;
        d.write_addr((base & 0xFF) as u8);
        d.write_addr((0x40 | (base >> 8)) as u8);
        d.write_data(vpos);
        d.write_data(hpos);
        d.write_data(name);
        d.write_data(color_attr);
    }

    fn set_pattern(d: &mut Device, pattern_base: u16, name: u8, rows: &[u8]) {
        let addr = pattern_base + name as u16 * 8;
        d.write_addr((addr & 0xFF) as u8);
        d.write_addr((0x40 | (addr >> 8)) as u8);
        for &b in rows {
            d.write_data(b);
        }
    }

    #[test]
    fn sentinel_reports_slot_index_in_status() {
        let mut d = make_device();
        set_sprite(&mut d, 0, LAST_SPRITE_VPOS, 0, 0, 0);
        let mut row = [0u8; 256];
        d.draw_sprites(0, &mut row);
        assert_eq!(d.read_status() & 0x1F, 0);
    }

    #[test]
    fn fifth_sprite_on_same_line_sets_5s_and_its_index() {
        let mut d = make_device();
        for slot in 0..5u8 {
            // vpos 0xFF wraps to -1, so sprite_top = 0 and it's on scanline 0.
            set_sprite(&mut d, slot, 0xFF, slot as u8 * 8, 0, 1);
        }
        set_pattern(&mut d, d.registers.sprite_pattern_table_base(), 0, &[0xFF; 8]);

        let mut row = [0u8; 256];
        d.draw_sprites(0, &mut row);
        let status = d.read_status();
        assert_ne!(status & STATUS_5S, 0);
        assert_eq!(status & 0x1F, 4);
    }

    #[test]
    fn overlapping_opaque_sprites_set_collision() {
        let mut d = make_device();
        set_pattern(&mut d, d.registers.sprite_pattern_table_base(), 0, &[0xFF; 8]);
        set_sprite(&mut d, 0, 0xFF, 10, 0, 1);
        set_sprite(&mut d, 1, 0xFF, 10, 0, 2);

        let mut row = [0u8; 256];
        d.draw_sprites(0, &mut row);
        assert_ne!(d.read_status() & STATUS_COL, 0);
    }

    #[test]
    fn transparent_sprite_still_triggers_collision() {
        let mut d = make_device();
        set_pattern(&mut d, d.registers.sprite_pattern_table_base(), 0, &[0xFF; 8]);
        set_sprite(&mut d, 0, 0xFF, 10, 0, 1);
        set_sprite(&mut d, 1, 0xFF, 10, 0, 0); // color 0: transparent, but still "hits"

        let mut row = [0u8; 256];
        d.draw_sprites(0, &mut row);
        assert_ne!(d.read_status() & STATUS_COL, 0);
    }

    #[test]
    fn early_clock_shifts_sprite_32_pixels_left() {
        let mut d = make_device();
        set_pattern(&mut d, d.registers.sprite_pattern_table_base(), 0, &[0xFF; 8]);
        set_sprite(&mut d, 0, 0xFF, 40, 0, 0x81); // early clock bit set, color 1

        let mut row = [0u8; 256];
        d.draw_sprites(0, &mut row);
        // Sprite would start at column 40, but early clock moves it to column 8.
        assert_eq!(row[8], 1);
        assert_eq!(row[0], 0);
    }
}
