//! Color values as they appear in scene documents
//!
//! Producers disagree on how a color is written: the exporter packs RGB into
//! a 24-bit integer for materials, writes float triples for lights, and a
//! comma-joined string for fog. All three are accepted on read.

use serde::{Deserialize, Deserializer, Serialize};

/// A color in any of the accepted document encodings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Color {
    /// `0xRRGGBB` packed into an integer
    Packed(u32),
    /// Float triple, each channel in 0..=1
    Rgb([f32; 3]),
    /// Legacy `"r,g,b"` string with float channels
    Joined(String),
}

impl Color {
    pub const WHITE: Color = Color::Packed(0xFF_FF_FF);

    /// Pack float channels the way the exporter does: `trunc(c * 255)` per channel
    pub fn pack(rgb: [f32; 3]) -> u32 {
        let channel = |c: f32| (c * 255.0).clamp(0.0, 255.0) as u32;
        (channel(rgb[0]) << 16) | (channel(rgb[1]) << 8) | channel(rgb[2])
    }

    /// Packed representation of float channels
    pub fn packed_from_rgb(rgb: [f32; 3]) -> Self {
        Color::Packed(Self::pack(rgb))
    }

    /// Comma-joined representation of float channels
    pub fn joined_from_rgb(rgb: [f32; 3]) -> Self {
        Color::Joined(format!("{},{},{}", rgb[0], rgb[1], rgb[2]))
    }

    /// Float channels in 0..=1.
    ///
    /// Packed values only keep their low 24 bits. Unparsable joined channels read as 0.
    pub fn to_rgb(&self) -> [f32; 3] {
        match self {
            Color::Packed(p) => {
                let p = p & 0xFF_FF_FF;
                [
                    ((p >> 16) & 0xFF) as f32 / 255.0,
                    ((p >> 8) & 0xFF) as f32 / 255.0,
                    (p & 0xFF) as f32 / 255.0,
                ]
            }
            Color::Rgb(rgb) => *rgb,
            Color::Joined(text) => {
                let mut rgb = [0.0; 3];
                for (slot, part) in rgb.iter_mut().zip(text.split(',')) {
                    *slot = part.trim().parse().unwrap_or(0.0);
                }
                rgb
            }
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

/// Deserialize an optional color that may also be wrapped in a one-element
/// string array (`["0,0,0"]`), the form the exporter writes for `bgcolor`.
pub(crate) fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<Color>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Color(Color),
        Wrapped(Vec<String>),
    }

    Ok(match Option::<Lenient>::deserialize(deserializer)? {
        Some(Lenient::Color(c)) => Some(c),
        Some(Lenient::Wrapped(mut parts)) if parts.len() == 1 => parts.pop().map(Color::Joined),
        Some(Lenient::Wrapped(parts)) => Some(Color::Joined(parts.join(","))),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_red() {
        assert_eq!(Color::Packed(16711680).to_rgb(), [1.0, 0.0, 0.0]);
        assert_eq!(Color::pack([1.0, 0.0, 0.0]), 16711680);
    }

    #[test]
    fn test_pack_truncates() {
        // 0.5 * 255 = 127.5 -> 127
        assert_eq!(Color::pack([0.5, 0.5, 0.5]), 0x7F7F7F);
    }

    #[test]
    fn test_joined_parses() {
        assert_eq!(Color::Joined("0.5, 1,0".into()).to_rgb(), [0.5, 1.0, 0.0]);
        assert_eq!(Color::Joined("bogus".into()).to_rgb(), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_untagged_forms() {
        let packed: Color = serde_json::from_str("255").unwrap();
        assert_eq!(packed, Color::Packed(255));
        let rgb: Color = serde_json::from_str("[1, 0.5, 0]").unwrap();
        assert_eq!(rgb, Color::Rgb([1.0, 0.5, 0.0]));
        let joined: Color = serde_json::from_str("\"1,1,1\"").unwrap();
        assert_eq!(joined.to_rgb(), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_packed_ignores_high_bits() {
        // Some producers write float bit patterns; only the low 24 bits are color.
        let c = Color::Packed(1065353216);
        assert_eq!(c.to_rgb(), [128.0 / 255.0, 0.0, 0.0]);
    }
}
