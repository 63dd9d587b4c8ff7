//! Numeric input coercion and domain checks for Sat/SOP values.
//!
//! Setters accept a [`NumericInput`]: a number, a numeric string, or a
//! sequence of numbers/numeric strings. One coercion path turns any of these
//! into a scalar or a fixed `[f64; 3]` triplet:
//!
//! - a scalar broadcasts to all three triplet components
//! - a string may hold one value (broadcast) or three values separated by
//!   whitespace or commas, the way CDL documents and command lines write them
//! - non-numeric text is a type error, a component count other than 3 is a
//!   value error; neither is affected by the [`ValuePolicy`]
//!
//! Domain checks run after coercion and are where the policy applies.

use tracing::warn;

use crate::{CdlError, CdlResult, ValuePolicy};

/// An RGB triplet as stored on a [`SopNode`](crate::SopNode).
pub type Triplet = [f64; 3];

/// One element of a sequence input.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    /// Already numeric.
    Number(f64),
    /// Text to be parsed.
    Text(String),
}

/// Tagged input accepted by every numeric setter.
#[derive(Debug, Clone, PartialEq)]
pub enum NumericInput {
    /// A single number.
    Scalar(f64),
    /// A numeric string.
    Text(String),
    /// An ordered sequence, valid only for triplet fields.
    Sequence(Vec<Component>),
}

/// Lower bound applied after coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    /// `[0, +inf)`: slope, power and saturation.
    NonNegative,
    /// Any value: offset.
    Unbounded,
}

fn parse_number(field: &'static str, text: &str) -> CdlResult<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| !v.is_nan())
        .ok_or_else(|| CdlError::not_a_number(field, text))
}

fn reject_nan(field: &'static str, value: f64) -> CdlResult<f64> {
    if value.is_nan() {
        Err(CdlError::not_a_number(field, "NaN"))
    } else {
        Ok(value)
    }
}

impl Component {
    fn to_f64(&self, field: &'static str) -> CdlResult<f64> {
        match self {
            Component::Number(v) => reject_nan(field, *v),
            Component::Text(s) => parse_number(field, s),
        }
    }
}

impl NumericInput {
    /// Coerces to a single value.
    ///
    /// ```rust
    /// use cdl_core::NumericInput;
    ///
    /// assert_eq!(NumericInput::from("2.5").to_scalar("sat").unwrap(), 2.5);
    /// assert!(NumericInput::from([1.0, 2.0, 3.0]).to_scalar("sat").is_err());
    /// ```
    pub fn to_scalar(&self, field: &'static str) -> CdlResult<f64> {
        match self {
            NumericInput::Scalar(v) => reject_nan(field, *v),
            NumericInput::Text(s) => parse_number(field, s),
            NumericInput::Sequence(_) => Err(CdlError::WrongShape {
                field,
                expected: "a single number",
            }),
        }
    }

    /// Coerces to a three-component triplet, broadcasting scalars.
    ///
    /// ```rust
    /// use cdl_core::NumericInput;
    ///
    /// let t = NumericInput::from("1.1 1.2 1.3").to_triplet("slope").unwrap();
    /// assert_eq!(t, [1.1, 1.2, 1.3]);
    /// assert_eq!(NumericInput::from(2).to_triplet("slope").unwrap(), [2.0; 3]);
    /// ```
    pub fn to_triplet(&self, field: &'static str) -> CdlResult<Triplet> {
        match self {
            NumericInput::Scalar(v) => Ok([reject_nan(field, *v)?; 3]),
            NumericInput::Text(s) => {
                let tokens: Vec<&str> = s
                    .split(|c: char| c.is_whitespace() || c == ',')
                    .filter(|t| !t.is_empty())
                    .collect();
                match tokens.len() {
                    0 => Err(CdlError::not_a_number(field, s.as_str())),
                    1 => Ok([parse_number(field, tokens[0])?; 3]),
                    3 => Ok([
                        parse_number(field, tokens[0])?,
                        parse_number(field, tokens[1])?,
                        parse_number(field, tokens[2])?,
                    ]),
                    len => Err(CdlError::WrongLength { field, len }),
                }
            }
            NumericInput::Sequence(items) => {
                if items.len() != 3 {
                    return Err(CdlError::WrongLength {
                        field,
                        len: items.len(),
                    });
                }
                Ok([
                    items[0].to_f64(field)?,
                    items[1].to_f64(field)?,
                    items[2].to_f64(field)?,
                ])
            }
        }
    }
}

/// Applies `domain` to one value under `policy`.
///
/// Under [`ValuePolicy::Lenient`] a negative value in a non-negative domain
/// becomes `0.0` and a warning is logged.
pub fn enforce_domain(
    field: &'static str,
    value: f64,
    domain: Domain,
    policy: ValuePolicy,
) -> CdlResult<f64> {
    if domain == Domain::Unbounded || value >= 0.0 {
        return Ok(value);
    }
    match policy {
        ValuePolicy::Strict => Err(CdlError::OutOfDomain { field, value }),
        ValuePolicy::Lenient => {
            warn!(field, value, "negative value clamped to 0.0");
            Ok(0.0)
        }
    }
}

/// Coerces and validates a scalar field.
pub fn validate_scalar(
    field: &'static str,
    input: &NumericInput,
    domain: Domain,
    policy: ValuePolicy,
) -> CdlResult<f64> {
    let value = input.to_scalar(field)?;
    enforce_domain(field, value, domain, policy)
}

/// Coerces and validates a triplet field. Nothing is returned unless every
/// component passes, so a strict failure leaves the caller's value untouched.
pub fn validate_triplet(
    field: &'static str,
    input: &NumericInput,
    domain: Domain,
    policy: ValuePolicy,
) -> CdlResult<Triplet> {
    let [r, g, b] = input.to_triplet(field)?;
    Ok([
        enforce_domain(field, r, domain, policy)?,
        enforce_domain(field, g, domain, policy)?,
        enforce_domain(field, b, domain, policy)?,
    ])
}

// ============================================================================
// Conversions
// ============================================================================

impl From<f64> for Component {
    fn from(v: f64) -> Self {
        Component::Number(v)
    }
}

impl From<i32> for Component {
    fn from(v: i32) -> Self {
        Component::Number(f64::from(v))
    }
}

impl From<&str> for Component {
    fn from(s: &str) -> Self {
        Component::Text(s.to_string())
    }
}

impl From<String> for Component {
    fn from(s: String) -> Self {
        Component::Text(s)
    }
}

impl From<f64> for NumericInput {
    fn from(v: f64) -> Self {
        NumericInput::Scalar(v)
    }
}

impl From<f32> for NumericInput {
    fn from(v: f32) -> Self {
        NumericInput::Scalar(f64::from(v))
    }
}

impl From<i32> for NumericInput {
    fn from(v: i32) -> Self {
        NumericInput::Scalar(f64::from(v))
    }
}

impl From<&str> for NumericInput {
    fn from(s: &str) -> Self {
        NumericInput::Text(s.to_string())
    }
}

impl From<String> for NumericInput {
    fn from(s: String) -> Self {
        NumericInput::Text(s)
    }
}

impl From<[f64; 3]> for NumericInput {
    fn from(t: [f64; 3]) -> Self {
        NumericInput::Sequence(t.into_iter().map(Component::Number).collect())
    }
}

impl From<[f32; 3]> for NumericInput {
    fn from(t: [f32; 3]) -> Self {
        NumericInput::Sequence(t.into_iter().map(|v| Component::Number(f64::from(v))).collect())
    }
}

impl From<(f64, f64, f64)> for NumericInput {
    fn from((r, g, b): (f64, f64, f64)) -> Self {
        NumericInput::from([r, g, b])
    }
}

impl From<Vec<f64>> for NumericInput {
    fn from(v: Vec<f64>) -> Self {
        NumericInput::Sequence(v.into_iter().map(Component::Number).collect())
    }
}

impl From<&[f64]> for NumericInput {
    fn from(v: &[f64]) -> Self {
        NumericInput::Sequence(v.iter().copied().map(Component::Number).collect())
    }
}

impl From<Vec<Component>> for NumericInput {
    fn from(v: Vec<Component>) -> Self {
        NumericInput::Sequence(v)
    }
}
