use std::collections::BTreeMap;
use std::collections::BTreeSet;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generators
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    hue_spaced(n, 0.75, 0.55)
}

/// Softer variant of [`generate_palette`] for large filled areas
/// (donut slices).
pub fn pastel_palette(n: usize) -> Vec<Color32> {
    hue_spaced(n, 0.55, 0.75)
}

fn hue_spaced(n: usize, saturation: f32, lightness: f32) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, saturation, lightness);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: rating value → Color32
// ---------------------------------------------------------------------------

/// Maps the observed rating values to distinct colours, for the scatter views
/// that colour points by a rating column.
#[derive(Debug, Clone)]
pub struct RatingColors {
    mapping: BTreeMap<i64, Color32>,
    default_color: Color32,
}

impl RatingColors {
    /// Build a colour map from the distinct ratings present in the data.
    pub fn new(ratings: impl IntoIterator<Item = i64>) -> Self {
        let unique: BTreeSet<i64> = ratings.into_iter().collect();
        let palette = generate_palette(unique.len());
        let mapping: BTreeMap<i64, Color32> =
            unique.into_iter().zip(palette).collect();

        RatingColors {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a rating; grey for anything unmapped.
    pub fn color_for(&self, rating: i64) -> Color32 {
        self.mapping
            .get(&rating)
            .copied()
            .unwrap_or(self.default_color)
    }
}

// ---------------------------------------------------------------------------
// Diverging ramp for correlation cells
// ---------------------------------------------------------------------------

/// Blue → white → red ramp over `r` in [-1, 1], NaN shown as neutral grey.
pub fn correlation_color(r: f64) -> Color32 {
    if !r.is_finite() {
        return Color32::from_gray(120);
    }
    let r = r.clamp(-1.0, 1.0);
    let cold = (59.0, 76.0, 192.0);
    let warm = (180.0, 4.0, 38.0);
    let white = (245.0, 245.0, 245.0);

    let (from, to, t) = if r < 0.0 {
        (white, cold, -r)
    } else {
        (white, warm, r)
    };
    let lerp = |a: f64, b: f64| (a + (b - a) * t) as u8;
    Color32::from_rgb(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}
