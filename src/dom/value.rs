use std::fmt;

/// A rational number, always stored in lowest terms with a positive
/// denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawFraction")
)]
pub struct Fraction {
    num: i64,
    den: i64,
}

impl Fraction {
    /// Create a fraction.
    ///
    /// Returns None if the denominator is zero, or if the normalized fraction
    /// does not fit, as with `i64::MIN / -1`.
    pub fn new(num: i64, den: i64) -> Option<Self> {
        if den == 0 {
            return None;
        }
        let g = gcd(num.unsigned_abs(), den.unsigned_abs()) as i128;
        let sign: i128 = if den < 0 { -1 } else { 1 };
        Some(Self {
            num: i64::try_from(sign * num as i128 / g).ok()?,
            den: i64::try_from(sign * den as i128 / g).ok()?,
        })
    }

    pub fn numerator(&self) -> i64 {
        self.num
    }

    pub fn denominator(&self) -> i64 {
        self.den
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Unchecked fields, normalized through [`Fraction::new`] when read.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawFraction {
    num: i64,
    den: i64,
}

#[cfg(feature = "serde")]
impl TryFrom<RawFraction> for Fraction {
    type Error = String;

    fn try_from(raw: RawFraction) -> Result<Self, Self::Error> {
        Fraction::new(raw.num, raw.den)
            .ok_or_else(|| format!("invalid fraction {}/{}", raw.num, raw.den))
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

/// The value of a head or tail.
///
/// Element types decide how a value is read from tokens and written back to
/// text, so a head is not necessarily a string.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Text(String),
    Integer(i64),
    Float(f64),
    Fraction(Fraction),
    Boolean(bool),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_fraction(&self) -> Option<Fraction> {
        match self {
            Value::Fraction(f) => Some(*f),
            Value::Integer(i) => Fraction::new(*i, 1),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{}", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Fraction(fr) => write!(f, "{}", fr),
            Value::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Fraction> for Value {
    fn from(f: Fraction) -> Self {
        Value::Fraction(f)
    }
}

/// A value in a fixed head mapping, see [`ElementType::mapping`].
///
/// [`ElementType::mapping`]: super::ElementType::mapping
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mapped {
    Text(&'static str),
    Integer(i64),
    Boolean(bool),
}

impl From<Mapped> for Value {
    fn from(m: Mapped) -> Self {
        match m {
            Mapped::Text(s) => Value::Text(s.to_string()),
            Mapped::Integer(i) => Value::Integer(i),
            Mapped::Boolean(b) => Value::Boolean(b),
        }
    }
}

impl PartialEq<Value> for Mapped {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Mapped::Text(a), Value::Text(b)) => a == b,
            (Mapped::Integer(a), Value::Integer(b)) => a == b,
            (Mapped::Boolean(a), Value::Boolean(b)) => a == b,
            _ => false,
        }
    }
}
