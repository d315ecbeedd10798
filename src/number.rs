use std::fmt::{self, Display};

/// A numeric value exchanged between the codec layer and a [`DynamicOps`]
/// implementation.
///
/// Formats keep whatever precision they natively have. Reading a `Number`
/// back out as a narrower type is range checked.
///
/// [`DynamicOps`]: crate::DynamicOps
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Number {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl Number {
    pub const fn is_integer(self) -> bool {
        !matches!(self, Self::Float(_) | Self::Double(_))
    }

    /// Returns the value as `i64` if it is an integer, or a float with no
    /// fractional part that fits.
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Self::Byte(v) => Some(v as i64),
            Self::Short(v) => Some(v as i64),
            Self::Int(v) => Some(v as i64),
            Self::Long(v) => Some(v),
            Self::Float(v) => float_to_i64(v as f64),
            Self::Double(v) => float_to_i64(v),
        }
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Self::Byte(v) => v as f64,
            Self::Short(v) => v as f64,
            Self::Int(v) => v as f64,
            Self::Long(v) => v as f64,
            Self::Float(v) => v as f64,
            Self::Double(v) => v,
        }
    }

    pub fn as_f32(self) -> f32 {
        match self {
            Self::Float(v) => v,
            other => other.as_f64() as f32,
        }
    }

    /// Parses a number from its textual form, preferring the narrowest
    /// integer representation.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Ok(v) = text.parse::<i64>() {
            return Some(Self::from(v));
        }
        text.parse::<f64>().ok().map(Self::Double)
    }
}

fn float_to_i64(v: f64) -> Option<i64> {
    if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}

impl From<i64> for Number {
    fn from(v: i64) -> Self {
        if let Ok(v) = i32::try_from(v) {
            Self::Int(v)
        } else {
            Self::Long(v)
        }
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Byte(v) => v.fmt(f),
            Self::Short(v) => v.fmt(f),
            Self::Int(v) => v.fmt(f),
            Self::Long(v) => v.fmt(f),
            Self::Float(v) => v.fmt(f),
            Self::Double(v) => v.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_i64_rejects_fractions() {
        assert_eq!(Number::Double(3.0).as_i64(), Some(3));
        assert_eq!(Number::Double(3.5).as_i64(), None);
        assert_eq!(Number::Byte(-4).as_i64(), Some(-4));
    }

    #[test]
    fn test_parse() {
        assert_eq!(Number::parse("12"), Some(Number::Int(12)));
        assert_eq!(Number::parse("5000000000"), Some(Number::Long(5_000_000_000)));
        assert_eq!(Number::parse("1.5"), Some(Number::Double(1.5)));
        assert_eq!(Number::parse("abc"), None);
    }
}
