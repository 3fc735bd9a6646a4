//! HSL color samples and the CSS `hsl(...)` wire form.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

/// Saturation every base tile is rendered with, in percent.
pub const BASE_SATURATION: u8 = 70;
/// Lightness every base tile is rendered with, in percent.
pub const BASE_LIGHTNESS: u8 = 50;

/// Lower bound for perturbed channels, in percent.
pub const CHANNEL_MIN: u8 = 10;
/// Upper bound for perturbed channels, in percent.
pub const CHANNEL_MAX: u8 = 90;

/// One tile color in HSL space. Hue is degrees in `[0, 360)`, saturation
/// and lightness are percentages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ColorSample {
    pub hue: u16,
    pub saturation: u8,
    pub lightness: u8,
}

impl ColorSample {
    pub fn new(hue: u16, saturation: u8, lightness: u8) -> Self {
        debug_assert!(hue < 360);
        debug_assert!(saturation <= 100);
        debug_assert!(lightness <= 100);
        Self { hue, saturation, lightness }
    }

    /// A fully styled base tile at the given hue.
    pub fn base(hue: u16) -> Self {
        Self::new(hue, BASE_SATURATION, BASE_LIGHTNESS)
    }

    pub fn with_saturation(self, saturation: u8) -> Self {
        Self { saturation, ..self }
    }

    pub fn with_lightness(self, lightness: u8) -> Self {
        Self { lightness, ..self }
    }
}

/// Clamp a perturbed channel back into the renderable band.
///
/// Perturbation arithmetic runs in f64; the clamp returns it to an integer
/// percent inside `[CHANNEL_MIN, CHANNEL_MAX]`.
pub fn clamp_channel(value: f64) -> u8 {
    value.clamp(f64::from(CHANNEL_MIN), f64::from(CHANNEL_MAX)) as u8
}

impl fmt::Display for ColorSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hsl({}, {}%, {}%)", self.hue, self.saturation, self.lightness)
    }
}

/// Why a CSS color string failed to parse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseColorError {
    /// Not shaped like `hsl(H, S%, L%)`.
    Malformed,
    /// A numeric field failed to parse or is out of range.
    OutOfRange { field: &'static str },
}

impl fmt::Display for ParseColorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "expected a color shaped like 'hsl(H, S%, L%)'"),
            Self::OutOfRange { field } => write!(f, "color {field} is out of range"),
        }
    }
}

impl std::error::Error for ParseColorError {}

impl FromStr for ColorSample {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix("hsl(")
            .and_then(|rest| rest.strip_suffix(')'))
            .ok_or(ParseColorError::Malformed)?;

        let mut fields = body.split(',').map(str::trim);
        let hue_text = fields.next().ok_or(ParseColorError::Malformed)?;
        let saturation_text = fields.next().ok_or(ParseColorError::Malformed)?;
        let lightness_text = fields.next().ok_or(ParseColorError::Malformed)?;
        if fields.next().is_some() {
            return Err(ParseColorError::Malformed);
        }

        let hue: u16 =
            hue_text.parse().map_err(|_| ParseColorError::OutOfRange { field: "hue" })?;
        if hue >= 360 {
            return Err(ParseColorError::OutOfRange { field: "hue" });
        }

        Ok(Self {
            hue,
            saturation: parse_percent(saturation_text, "saturation")?,
            lightness: parse_percent(lightness_text, "lightness")?,
        })
    }
}

fn parse_percent(text: &str, field: &'static str) -> Result<u8, ParseColorError> {
    let digits = text.strip_suffix('%').ok_or(ParseColorError::Malformed)?;
    let value: u8 = digits.parse().map_err(|_| ParseColorError::OutOfRange { field })?;
    if value > 100 {
        return Err(ParseColorError::OutOfRange { field });
    }
    Ok(value)
}

// The wire carries colors as CSS strings, not maps.
impl Serialize for ColorSample {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ColorSample {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_the_exact_css_shape() {
        assert_eq!(ColorSample::new(210, 70, 50).to_string(), "hsl(210, 70%, 50%)");
        assert_eq!(ColorSample::new(0, 1, 100).to_string(), "hsl(0, 1%, 100%)");
    }

    #[test]
    fn parses_what_it_renders() {
        let color = ColorSample::new(359, 70, 41);
        let parsed: ColorSample = color.to_string().parse().expect("round trip should parse");
        assert_eq!(parsed, color);
    }

    #[test]
    fn rejects_malformed_text() {
        let bad = [
            "",
            "hsl()",
            "hsl(210, 70%, 50%",
            "rgb(1, 2, 3)",
            "hsl(210, 70%, 50%, 1)",
            "hsl(210, 70, 50)",
            "hsl(210, 70%)",
        ];
        for text in bad {
            assert!(text.parse::<ColorSample>().is_err(), "{text:?} should not parse");
        }
    }

    #[test]
    fn rejects_out_of_range_fields() {
        assert_eq!(
            "hsl(360, 70%, 50%)".parse::<ColorSample>(),
            Err(ParseColorError::OutOfRange { field: "hue" })
        );
        assert_eq!(
            "hsl(10, 101%, 50%)".parse::<ColorSample>(),
            Err(ParseColorError::OutOfRange { field: "saturation" })
        );
        assert_eq!(
            "hsl(10, 1%, 101%)".parse::<ColorSample>(),
            Err(ParseColorError::OutOfRange { field: "lightness" })
        );
    }

    #[test]
    fn serde_uses_the_css_string_form() {
        let json = serde_json::to_string(&ColorSample::base(128)).expect("serialize");
        assert_eq!(json, "\"hsl(128, 70%, 50%)\"");
        let back: ColorSample = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, ColorSample::base(128));
    }

    #[test]
    fn clamps_perturbed_channels_into_the_renderable_band() {
        assert_eq!(clamp_channel(-12.0), 10);
        assert_eq!(clamp_channel(9.0), 10);
        assert_eq!(clamp_channel(10.0), 10);
        assert_eq!(clamp_channel(55.0), 55);
        assert_eq!(clamp_channel(90.0), 90);
        assert_eq!(clamp_channel(131.0), 90);
    }
}
