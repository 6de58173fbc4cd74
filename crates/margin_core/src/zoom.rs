//! DPI compensation for the rendering surface.
//!
//! The surface only accepts discrete zoom steps, so the scale derived from the
//! display DPI is quantized up to the next multiple of [`ZOOM_STEP`].

/// DPI of a display at 100% scaling.
pub const BASELINE_DPI: f64 = 96.0;

/// Granularity of the zoom levels accepted by the surface.
pub const ZOOM_STEP: u32 = 25;

/// Zoom percentage meaning "leave the surface alone".
pub const NO_ZOOM: u32 = 100;

/// Compute the zoom percentage for a display with the given horizontal DPI.
///
/// The scale is squared against the baseline and always rounded up, so a
/// 150% display (144 DPI) yields 225 and a 250% display (240 DPI) yields 600.
///
/// Non-finite or non-positive DPI values are treated as the baseline.
///
/// # Example
///
/// ```
/// use margin_core::zoom_percent;
///
/// assert_eq!(zoom_percent(96.0), 100);
/// assert_eq!(zoom_percent(144.0), 225);
/// assert_eq!(zoom_percent(240.0), 600);
/// ```
pub fn zoom_percent(dpi: f64) -> u32 {
    if !dpi.is_finite() || dpi <= 0.0 || dpi == BASELINE_DPI {
        return NO_ZOOM;
    }

    let scale = dpi * ((dpi - BASELINE_DPI) / BASELINE_DPI + 1.0);
    let step = f64::from(ZOOM_STEP);
    ((scale / step).ceil() * step) as u32
}
