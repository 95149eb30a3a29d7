//! Embedded WGSL for the metaball field pass.

pub const FIELD_VERTEX_WGSL: &str = include_str!("shaders/field.vert.wgsl");
pub const FIELD_FRAGMENT_WGSL: &str = include_str!("shaders/field.frag.wgsl");

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Two triangles covering clip space.
pub const FULL_SCREEN_QUAD: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [-1.0, 1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [1.0, 1.0],
];

#[cfg(test)]
mod tests {
    use super::*;
    use bubblefield_platform::FIELD_SLOTS;

    #[test]
    fn fragment_arrays_match_uniform_slots() {
        let array = format!("array<vec4<f32>, {FIELD_SLOTS}>");
        assert_eq!(FIELD_FRAGMENT_WGSL.matches(&array).count(), 2);
        assert!(FIELD_FRAGMENT_WGSL.contains(&format!("i < {FIELD_SLOTS}u")));
    }

    #[test]
    fn entry_points_exist() {
        assert!(FIELD_VERTEX_WGSL.contains(&format!("fn {VERTEX_ENTRY}(")));
        assert!(FIELD_FRAGMENT_WGSL.contains(&format!("fn {FRAGMENT_ENTRY}(")));
    }

    #[test]
    fn quad_covers_clip_space() {
        let (min, max) = FULL_SCREEN_QUAD.iter().fold(
            ([f32::MAX; 2], [f32::MIN; 2]),
            |(lo, hi), v| {
                (
                    [lo[0].min(v[0]), lo[1].min(v[1])],
                    [hi[0].max(v[0]), hi[1].max(v[1])],
                )
            },
        );
        assert_eq!(min, [-1.0, -1.0]);
        assert_eq!(max, [1.0, 1.0]);
    }
}
