use crate::error::{VitricError, VitricResult};

/// A typed value carried by a primitive parameter. Values pass through the
/// redirection table unchanged; no unit conversion or clamping happens here.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParamValue {
    Double(f64),
    Boolean(bool),
    Color(Color),
    /// Enum-valued host parameters, e.g. an abyss policy.
    Choice(String),
    /// Opaque text, e.g. an embedded sub-pipeline source line.
    Text(String),
}

impl ParamValue {
    pub fn as_double(&self) -> Option<f64> {
        match *self {
            ParamValue::Double(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match *self {
            ParamValue::Color(c) => Some(c),
            _ => None,
        }
    }

    /// Short tag used in error and log messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ParamValue::Double(_) => "double",
            ParamValue::Boolean(_) => "boolean",
            ParamValue::Color(_) => "color",
            ParamValue::Choice(_) => "choice",
            ParamValue::Text(_) => "text",
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Double(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Boolean(v)
    }
}

impl From<Color> for ParamValue {
    fn from(v: Color) -> Self {
        ParamValue::Color(v)
    }
}

/// Straight (non-premultiplied) RGBA color, channels in 0..=1.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Color { r, g, b, a: 1.0 }
    }

    /// Parses "#rrggbb" or "#rrggbbaa".
    pub fn from_hex(s: &str) -> VitricResult<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
            return Err(VitricError::validation(format!(
                "color '{s}' must be #rrggbb or #rrggbbaa"
            )));
        }
        let byte = |i: usize| -> VitricResult<f64> {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map(|b| f64::from(b) / 255.0)
                .map_err(|_| VitricError::validation(format!("color '{s}' has non-hex digits")))
        };
        Ok(Color {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            a: if hex.len() == 8 { byte(6)? } else { 1.0 },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_hex_parses_rgb_and_rgba() {
        let grey = Color::from_hex("#6a6a6a").unwrap();
        assert!((grey.r - 106.0 / 255.0).abs() < 1e-12);
        assert_eq!(grey.r, grey.g);
        assert_eq!(grey.a, 1.0);

        let half = Color::from_hex("#00000080").unwrap();
        assert!((half.a - 128.0 / 255.0).abs() < 1e-12);
    }

    #[test]
    fn from_hex_rejects_bad_input() {
        assert!(Color::from_hex("#123").is_err());
        assert!(Color::from_hex("#zzzzzz").is_err());
    }

    #[test]
    fn json_roundtrip() {
        let v = ParamValue::Color(Color::BLACK);
        let s = serde_json::to_string(&v).unwrap();
        let de: ParamValue = serde_json::from_str(&s).unwrap();
        assert_eq!(de, v);
    }
}
