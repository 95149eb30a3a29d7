//! Packed `0xRRGGBB` colors and the per-slot color tables built from them.

use bubblefield_platform::FIELD_SLOTS;
use glam::Vec3;

/// One normalized color per field slot.
pub type ColorTable = [Vec3; FIELD_SLOTS];

pub const NEUTRAL_GRAY: Vec3 = Vec3::splat(0.5);

pub fn unpack_rgb(packed: u32) -> Vec3 {
    Vec3::new(
        ((packed >> 16) & 0xFF) as f32 / 255.0,
        ((packed >> 8) & 0xFF) as f32 / 255.0,
        (packed & 0xFF) as f32 / 255.0,
    )
}

pub fn pack_rgb(color: Vec3) -> u32 {
    let c = (color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0).round();
    ((c.x as u32) << 16) | ((c.y as u32) << 8) | c.z as u32
}

/// Spreads `colors` cyclically over every slot. Zero entries become
/// `fallback_gray`; an empty or all-zero list is replaced by `default_palette`.
pub fn palette_table(colors: &[u32], fallback_gray: u32, default_palette: &[u32]) -> ColorTable {
    let source = if colors.iter().any(|&c| c != 0) {
        colors
    } else {
        default_palette
    };
    let mut table = [unpack_rgb(fallback_gray); FIELD_SLOTS];
    if source.is_empty() {
        return table;
    }
    for (slot, color) in table.iter_mut().enumerate() {
        let packed = source[slot % source.len()];
        *color = unpack_rgb(if packed == 0 { fallback_gray } else { packed });
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULTS: [u32; 4] = [0xFF0000, 0x00FF00, 0x0000FF, 0xFFFF00];

    #[test]
    fn unpack_splits_channels() {
        assert_eq!(
            unpack_rgb(0x112233),
            Vec3::new(17.0 / 255.0, 34.0 / 255.0, 51.0 / 255.0)
        );
        assert_eq!(pack_rgb(unpack_rgb(0xAABBCC)), 0xAABBCC);
    }

    #[test]
    fn two_colors_alternate_across_slots() {
        let table = palette_table(&[0x102030, 0x405060], 0x444444, &DEFAULTS);
        for (i, color) in table.iter().enumerate() {
            let expected = if i % 2 == 0 { 0x102030 } else { 0x405060 };
            assert_eq!(*color, unpack_rgb(expected), "slot {i}");
        }
    }

    #[test]
    fn zero_entries_become_fallback_gray() {
        let table = palette_table(&[0, 0xAABBCC], 0x444444, &DEFAULTS);
        assert_eq!(table[0], unpack_rgb(0x444444));
        assert_eq!(table[1], unpack_rgb(0xAABBCC));
        assert_eq!(table[2], unpack_rgb(0x444444));
    }

    #[test]
    fn empty_or_all_zero_input_uses_default_palette() {
        for input in [&[][..], &[0, 0, 0][..]] {
            let table = palette_table(input, 0x444444, &DEFAULTS);
            assert_eq!(table[0], unpack_rgb(0xFF0000));
            assert_eq!(table[3], unpack_rgb(0xFFFF00));
            assert_eq!(table[4], unpack_rgb(0xFF0000));
        }
    }

    #[test]
    fn high_byte_is_ignored() {
        assert_eq!(unpack_rgb(0xFF112233), unpack_rgb(0x112233));
    }
}
