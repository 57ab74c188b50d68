//! Colour mapping
//!
//! Maps a normalised scalar onto an RGBA colour by interpolating between
//! ordered colour stops. Maps are either built from explicit stops, taken
//! from a preset, or parsed from names such as `BlackToRedToWhite`.

use crate::recorder::error::ColourError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn transparent(self) -> Self {
        Self::new(self.r, self.g, self.b, 0)
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    fn lerp(self, other: Rgba, t: f64) -> Rgba {
        let channel = |a: u8, b: u8| -> u8 {
            (f64::from(a) + (f64::from(b) - f64::from(a)) * t)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Rgba::new(
            channel(self.r, other.r),
            channel(self.g, other.g),
            channel(self.b, other.b),
            channel(self.a, other.a),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColourStop {
    pub offset: f64,
    pub colour: Rgba,
}

impl ColourStop {
    pub const fn new(offset: f64, colour: Rgba) -> Self {
        Self { offset, colour }
    }
}

/// Named colours understood by [`ColourMap::parse`]
const NAMED_COLOURS: &[(&str, Rgba)] = &[
    ("black", Rgba::opaque(0, 0, 0)),
    ("white", Rgba::opaque(255, 255, 255)),
    ("grey", Rgba::opaque(128, 128, 128)),
    ("gray", Rgba::opaque(128, 128, 128)),
    ("red", Rgba::opaque(255, 0, 0)),
    ("maroon", Rgba::opaque(128, 0, 0)),
    ("orange", Rgba::opaque(255, 140, 0)),
    ("yellow", Rgba::opaque(255, 255, 0)),
    ("lime", Rgba::opaque(0, 255, 0)),
    ("green", Rgba::opaque(0, 128, 0)),
    ("cyan", Rgba::opaque(0, 255, 255)),
    ("teal", Rgba::opaque(0, 128, 128)),
    ("blue", Rgba::opaque(0, 0, 255)),
    ("navy", Rgba::opaque(0, 0, 128)),
    ("purple", Rgba::opaque(128, 0, 128)),
    ("magenta", Rgba::opaque(255, 0, 255)),
    ("pink", Rgba::opaque(255, 192, 203)),
    ("brown", Rgba::opaque(139, 69, 19)),
];

/// Preset colour maps, by name
pub const PRESETS: &[&str] = &["Ice", "Citrus", "Sunburst", "Demon", "Lime", "Heatmap", "Jet"];

fn preset_stops(name: &str) -> Option<Vec<ColourStop>> {
    let stops = match name.to_ascii_lowercase().as_str() {
        "ice" => vec![
            ColourStop::new(0.0, Rgba::opaque(0, 0, 0)),
            ColourStop::new(0.35, Rgba::opaque(0, 0, 128)),
            ColourStop::new(0.7, Rgba::opaque(0, 128, 255)),
            ColourStop::new(1.0, Rgba::opaque(255, 255, 255)),
        ],
        "citrus" => vec![
            ColourStop::new(0.0, Rgba::opaque(0, 0, 0)),
            ColourStop::new(0.4, Rgba::opaque(255, 140, 0)),
            ColourStop::new(0.75, Rgba::opaque(255, 255, 0)),
            ColourStop::new(1.0, Rgba::opaque(255, 255, 255)),
        ],
        "sunburst" => vec![
            ColourStop::new(0.0, Rgba::opaque(0, 0, 0)),
            ColourStop::new(0.25, Rgba::opaque(255, 0, 0)),
            ColourStop::new(0.5, Rgba::opaque(255, 140, 0)),
            ColourStop::new(0.75, Rgba::opaque(255, 255, 0)),
            ColourStop::new(1.0, Rgba::opaque(255, 255, 255)),
        ],
        "demon" => vec![
            ColourStop::new(0.0, Rgba::opaque(0, 0, 0)),
            ColourStop::new(0.5, Rgba::opaque(128, 0, 0)),
            ColourStop::new(0.85, Rgba::opaque(255, 0, 0)),
            ColourStop::new(1.0, Rgba::opaque(255, 255, 255)),
        ],
        "lime" => vec![
            ColourStop::new(0.0, Rgba::opaque(0, 0, 0)),
            ColourStop::new(0.5, Rgba::opaque(0, 128, 0)),
            ColourStop::new(0.85, Rgba::opaque(0, 255, 0)),
            ColourStop::new(1.0, Rgba::opaque(255, 255, 255)),
        ],
        "heatmap" => vec![
            ColourStop::new(0.0, Rgba::opaque(0, 0, 0).transparent()),
            ColourStop::new(0.25, Rgba::opaque(0, 0, 255)),
            ColourStop::new(0.45, Rgba::opaque(0, 255, 255)),
            ColourStop::new(0.6, Rgba::opaque(0, 255, 0)),
            ColourStop::new(0.75, Rgba::opaque(255, 255, 0)),
            ColourStop::new(1.0, Rgba::opaque(255, 0, 0)),
        ],
        "jet" => vec![
            ColourStop::new(0.0, Rgba::opaque(0, 0, 128)),
            ColourStop::new(0.25, Rgba::opaque(0, 0, 255)),
            ColourStop::new(0.5, Rgba::opaque(0, 255, 255)),
            ColourStop::new(0.75, Rgba::opaque(255, 255, 0)),
            ColourStop::new(1.0, Rgba::opaque(255, 0, 0)),
        ],
        _ => return None,
    };
    Some(stops)
}

fn named_colour(word: &str) -> Option<Rgba> {
    let word = word.to_ascii_lowercase();
    if let Some(rest) = word.strip_prefix("transparent") {
        if rest.is_empty() {
            return Some(Rgba::new(0, 0, 0, 0));
        }
        return named_colour(rest).map(Rgba::transparent);
    }
    NAMED_COLOURS
        .iter()
        .find(|(name, _)| *name == word)
        .map(|(_, colour)| *colour)
}

/// Split `BlackToRedToWhite` into `["Black", "Red", "White"]`.
///
/// Only a `To` that follows a lowercase letter and precedes an uppercase one
/// (or nothing) counts as a separator.
fn split_gradient_name(name: &str) -> Vec<&str> {
    let bytes = name.as_bytes();
    let mut words = Vec::new();
    let mut start = 0;
    let mut i = 1;
    while i + 1 < bytes.len() {
        let is_separator = bytes[i] == b'T'
            && bytes[i + 1] == b'o'
            && bytes[i - 1].is_ascii_lowercase()
            && bytes.get(i + 2).map_or(true, |c| c.is_ascii_uppercase());
        if is_separator {
            words.push(&name[start..i]);
            start = i + 2;
            i += 2;
        } else {
            i += 1;
        }
    }
    words.push(&name[start..]);
    words
}

/// Interpolating lookup table from a scalar in [0, 1] to a colour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ColourStop>", into = "Vec<ColourStop>")]
pub struct ColourMap {
    stops: Vec<ColourStop>,
}

impl TryFrom<Vec<ColourStop>> for ColourMap {
    type Error = ColourError;

    fn try_from(stops: Vec<ColourStop>) -> Result<Self, Self::Error> {
        ColourMap::new(stops)
    }
}

impl From<ColourMap> for Vec<ColourStop> {
    fn from(map: ColourMap) -> Self {
        map.stops
    }
}

impl ColourMap {
    /// Build a map, rejecting empty, out-of-range or decreasing stops
    pub fn new(stops: Vec<ColourStop>) -> Result<Self, ColourError> {
        if stops.is_empty() {
            return Err(ColourError::NoStops);
        }
        for (index, stop) in stops.iter().enumerate() {
            if !(0.0..=1.0).contains(&stop.offset) {
                return Err(ColourError::OffsetOutOfRange {
                    index,
                    offset: stop.offset,
                });
            }
            if index > 0 && stop.offset < stops[index - 1].offset {
                return Err(ColourError::NotMonotonic {
                    index,
                    offset: stop.offset,
                });
            }
        }
        Ok(Self { stops })
    }

    /// Colours spread evenly from 0 to 1
    pub fn evenly_spaced(colours: &[Rgba]) -> Result<Self, ColourError> {
        let last = colours.len().saturating_sub(1).max(1) as f64;
        Self::new(
            colours
                .iter()
                .enumerate()
                .map(|(i, colour)| ColourStop::new(i as f64 / last, *colour))
                .collect(),
        )
    }

    /// Look up a preset, or parse a `ColourToColour...` name
    pub fn parse(name: &str) -> Result<Self, ColourError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ColourError::InvalidName(name.to_string()));
        }
        if let Some(stops) = preset_stops(name) {
            return Self::new(stops);
        }

        let colours = split_gradient_name(name)
            .into_iter()
            .map(|word| {
                if word.is_empty() {
                    return Err(ColourError::InvalidName(name.to_string()));
                }
                named_colour(word).ok_or_else(|| ColourError::UnknownColour(word.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::evenly_spaced(&colours)
    }

    pub fn stops(&self) -> &[ColourStop] {
        &self.stops
    }

    /// Colour for `value`. Values outside the stop range take the nearest end
    /// colour; NaN maps to the first stop.
    pub fn map(&self, value: f64) -> Rgba {
        let first = &self.stops[0];
        let last = &self.stops[self.stops.len() - 1];
        if value.is_nan() || value <= first.offset {
            return first.colour;
        }
        if value >= last.offset {
            return last.colour;
        }

        // First stop strictly above `value`; its predecessor is at or below it
        let upper = self.stops.partition_point(|stop| stop.offset <= value);
        let low = &self.stops[upper - 1];
        let high = &self.stops[upper];
        let span = high.offset - low.offset;
        if span <= 0.0 {
            return high.colour;
        }
        low.colour.lerp(high.colour, (value - low.offset) / span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = Rgba::opaque(255, 0, 0);
    const BLUE: Rgba = Rgba::opaque(0, 0, 255);

    #[test]
    fn test_rejects_invalid_stops() {
        assert_eq!(ColourMap::new(vec![]), Err(ColourError::NoStops));
        assert!(matches!(
            ColourMap::new(vec![ColourStop::new(1.5, RED)]),
            Err(ColourError::OffsetOutOfRange { index: 0, .. })
        ));
        assert!(matches!(
            ColourMap::new(vec![ColourStop::new(0.6, RED), ColourStop::new(0.4, BLUE)]),
            Err(ColourError::NotMonotonic { index: 1, .. })
        ));
        assert!(ColourMap::new(vec![ColourStop::new(f64::NAN, RED)]).is_err());
    }

    #[test]
    fn test_endpoints_and_clamping() {
        let map = ColourMap::evenly_spaced(&[RED, BLUE]).unwrap();
        assert_eq!(map.map(0.0), RED);
        assert_eq!(map.map(1.0), BLUE);
        assert_eq!(map.map(-3.0), RED);
        assert_eq!(map.map(7.0), BLUE);
        assert_eq!(map.map(f64::NAN), RED);
    }

    #[test]
    fn test_inner_stops_clamp_outside_range() {
        let map = ColourMap::new(vec![ColourStop::new(0.2, RED), ColourStop::new(0.8, BLUE)]).unwrap();
        assert_eq!(map.map(0.0), RED);
        assert_eq!(map.map(0.1), RED);
        assert_eq!(map.map(0.9), BLUE);
        assert_eq!(map.map(0.5), Rgba::new(128, 0, 128, 255));
    }

    #[test]
    fn test_exact_stop_has_no_interpolation_error() {
        let green = Rgba::new(0, 255, 0, 77);
        let map = ColourMap::new(vec![
            ColourStop::new(0.0, RED),
            ColourStop::new(0.3, green),
            ColourStop::new(1.0, BLUE),
        ])
        .unwrap();
        assert_eq!(map.map(0.3), green);
    }

    #[test]
    fn test_alpha_is_interpolated() {
        let map = ColourMap::evenly_spaced(&[RED.transparent(), RED]).unwrap();
        assert_eq!(map.map(0.5).a, 128);
    }

    #[test]
    fn test_duplicate_offset_makes_hard_edge() {
        let map = ColourMap::new(vec![
            ColourStop::new(0.0, RED),
            ColourStop::new(0.5, RED),
            ColourStop::new(0.5, BLUE),
            ColourStop::new(1.0, BLUE),
        ])
        .unwrap();
        assert_eq!(map.map(0.49), RED);
        assert_eq!(map.map(0.5), BLUE);
    }

    #[test]
    fn test_parse_gradient_names() {
        let map = ColourMap::parse("BlackToRedToWhite").unwrap();
        assert_eq!(map.stops().len(), 3);
        assert_eq!(map.map(0.5), RED);

        let map = ColourMap::parse("TransparentBlackToWhite").unwrap();
        assert_eq!(map.map(0.0), Rgba::new(0, 0, 0, 0));
        assert_eq!(map.map(1.0), Rgba::opaque(255, 255, 255));

        assert_eq!(ColourMap::parse("Red").unwrap().map(0.7), RED);
        assert!(matches!(
            ColourMap::parse("BlackToPlaid"),
            Err(ColourError::UnknownColour(_))
        ));
        assert!(ColourMap::parse("BlackTo").is_err());
    }

    #[test]
    fn test_presets_parse() {
        for name in PRESETS {
            assert!(ColourMap::parse(name).is_ok(), "{}", name);
        }
        assert_eq!(ColourMap::parse("heatmap").unwrap().map(0.0).a, 0);
    }
}
