use crate::overlay::model::ImageOverlay;

/// Visible state of the image overlay at one instant.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageReveal {
    /// Compositing opacity in `[0, 1]`.
    pub opacity: f32,
}

/// Opacity of the image overlay at time `t`.
///
/// `None` when outside `[start_time, end_time]` or when the image has not finished loading.
/// Inside the window the image fades in linearly over `fade_in_secs`, then holds at 1 until the
/// window ends. There is no fade-out. A non-positive fade duration means "fully opaque at once".
pub fn reveal_image(
    overlay: &ImageOverlay,
    t: f64,
    loaded: bool,
    fade_in_secs: f64,
) -> Option<ImageReveal> {
    if !loaded || !overlay.is_active_at(t) {
        return None;
    }
    let elapsed = t - overlay.start_time;
    let opacity = if fade_in_secs.is_finite() && fade_in_secs > 0.0 {
        (elapsed / fade_in_secs).clamp(0.0, 1.0)
    } else {
        1.0
    };
    Some(ImageReveal {
        opacity: opacity as f32,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/reveal/image.rs"]
mod tests;
