use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
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
// Color mapping: city → Color32
// ---------------------------------------------------------------------------

/// Gives every city of the dataset a fixed colour, so a city keeps its
/// colour in both charts and across selections.
#[derive(Debug, Clone)]
pub struct CityColors {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl CityColors {
    pub fn new(cities: &[String]) -> Self {
        let mapping = cities
            .iter()
            .cloned()
            .zip(generate_palette(cities.len()))
            .collect();

        CityColors {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a city.
    pub fn color_for(&self, city: &str) -> Color32 {
        self.mapping
            .get(city)
            .copied()
            .unwrap_or(self.default_color)
    }

    /// Same colour with the given fill opacity, for overlaid bars.
    pub fn translucent(&self, city: &str, opacity: f32) -> Color32 {
        let c = self.color_for(city);
        let alpha = (opacity.clamp(0.0, 1.0) * 255.0) as u8;
        Color32::from_rgba_unmultiplied(c.r(), c.g(), c.b(), alpha)
    }
}
