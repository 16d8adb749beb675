//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use crate::types::Scaler;

/// Round `value` up to the next multiple of `multiple`.
///
/// A `multiple` of 0 or 1 returns `value` unchanged.
///
/// ```
/// # use cellpix::imaging::calculations::round_up;
/// assert_eq!(round_up(101, 2), 102);
/// assert_eq!(round_up(100, 2), 100);
/// assert_eq!(round_up(7, 4), 8);
/// ```
pub fn round_up(value: u32, multiple: u32) -> u32 {
    if multiple <= 1 {
        return value;
    }
    match value % multiple {
        0 => value,
        rem => value.saturating_add(multiple - rem),
    }
}

/// Compute the resize target for an image of `image` size fitted into
/// `max_box` with `scaler`.
///
/// Returns `None` when no resize is needed: the image already fits (and the
/// scaler does not force scaling), the scaler is [`Scaler::Crop`], or the
/// computed size is degenerate (zero on both axes).
///
/// # Arguments
/// * `image` - Current image dimensions (width, height)
/// * `max_box` - Target box (width, height) in pixels
/// * `scaler` - Fitting strategy
/// * `scale_factor` - Each axis of the result is rounded up to a multiple of this
pub fn resolve_size(
    image: (u32, u32),
    max_box: (u32, u32),
    scaler: Scaler,
    scale_factor: u32,
) -> Option<(u32, u32)> {
    let (img_w, img_h) = image;
    let (max_w, max_h) = max_box;

    if img_w == 0 || img_h == 0 {
        return None;
    }
    if img_w <= max_w && img_h <= max_h && !scaler.always_scales() {
        return None;
    }

    let width_scale = max_w as f64 / img_w as f64;
    let height_scale = max_h as f64 / img_h as f64;
    let min_scale = width_scale.min(height_scale);
    let max_scale = width_scale.max(height_scale);

    let (new_w, new_h) = match scaler {
        Scaler::Crop => return None,
        Scaler::Distort => (max_w, max_h),
        Scaler::FitContain | Scaler::Contain => (
            (img_w as f64 * min_scale) as u32,
            (img_h as f64 * min_scale) as u32,
        ),
        Scaler::ForcedCover | Scaler::Cover => (
            (img_w as f64 * max_scale) as u32,
            (img_h as f64 * max_scale) as u32,
        ),
    };

    if new_w == 0 && new_h == 0 {
        return None;
    }

    Some((
        round_up(new_w.max(1), scale_factor),
        round_up(new_h.max(1), scale_factor),
    ))
}

/// Step that odd dimensions are rounded up to so the result is even.
///
/// Uses the scale factor when it is even, otherwise twice the scale factor,
/// so the rounded value is both a multiple of the scale factor and even.
fn even_step(scale_factor: u32) -> u32 {
    let factor = scale_factor.max(1);
    if factor % 2 == 0 { factor } else { factor * 2 }
}

/// Round each odd axis up to the [`even_step`] for `scale_factor`.
pub fn round_up_even(size: (u32, u32), scale_factor: u32) -> (u32, u32) {
    let step = even_step(scale_factor);
    let fix = |v: u32| if v % 2 == 0 { v } else { round_up(v, step) };
    (fix(size.0), fix(size.1))
}

/// What the resize stage does with an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizePlan {
    /// Leave the buffer as is.
    Keep,
    /// Area-resample to the given size.
    Resize { width: u32, height: u32 },
    /// Extend the canvas to the given size without resampling.
    Pad { width: u32, height: u32 },
}

/// Decide the resize stage for an image of `current` size.
///
/// When `needs_even` is set, every non-`Keep` outcome has even dimensions:
/// a degenerate resize target on an odd-sized image becomes a [`SizePlan::Pad`],
/// and a real resize target is itself rounded to even.
pub fn plan_size(
    current: (u32, u32),
    max_box: (u32, u32),
    scaler: Scaler,
    scale_factor: u32,
    needs_even: bool,
) -> SizePlan {
    match resolve_size(current, max_box, scaler, scale_factor) {
        Some(target) => {
            let (width, height) = if needs_even {
                round_up_even(target, scale_factor)
            } else {
                target
            };
            SizePlan::Resize { width, height }
        }
        None if needs_even => {
            let (width, height) = round_up_even(current, scale_factor);
            if (width, height) == current {
                SizePlan::Keep
            } else {
                SizePlan::Pad { width, height }
            }
        }
        None => SizePlan::Keep,
    }
}
