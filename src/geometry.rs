//! Target-dimension math for derivative profiles.
//!
//! The aspect comparison decides which dimension "drives" the scale: when
//! the source is no wider (proportionally) than the bound, height drives;
//! otherwise width drives. Only the driving dimension is clamped, the
//! other follows the source aspect, and both are forced even afterwards
//! because several players reject odd frame sizes.

use vf_core::MaxSize;

/// Compute the encode dimensions for a source inside `max`.
///
/// Never scales up: a source already inside the bound keeps its own
/// dimensions (modulo the evenness fixup).
pub fn target_dimensions(source_w: u32, source_h: u32, max: &MaxSize) -> (u32, u32) {
    let source_aspect = f64::from(source_w) / f64::from(source_h);
    let mut target_w = source_w;
    let mut target_h = source_h;

    if source_aspect <= max.aspect() {
        if source_h > max.height {
            target_h = max.height;
            target_w = (f64::from(target_h) * source_aspect) as u32;
        }
    } else if source_w > max.width {
        target_w = max.width;
        target_h = (f64::from(target_w) / source_aspect) as u32;
    }

    // Some players do not like uneven frame sizes.
    target_w += target_w % 2;
    target_h += target_h % 2;

    (target_w, target_h)
}

/// True when encoding `max` from this source would require upscaling the
/// driving dimension, i.e. the profile is ineligible for the source.
pub fn is_larger_than_source(source_w: u32, source_h: u32, max: &MaxSize) -> bool {
    let source_aspect = f64::from(source_w) / f64::from(source_h);
    if source_aspect <= max.aspect() {
        max.height > source_h
    } else {
        max.width > source_w
    }
}
