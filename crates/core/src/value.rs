//! Conversion of raw initializers to typed [`CimValue`]s.
//!
//! Errors are plain messages; the validator attaches element and position.

use mofc_schema::{CimType, CimValue};

use crate::ast::RawValue;
use crate::lexer::NumberKind;

/// A `$alias` met while coercing a reference value. The value holds an
/// empty placeholder reference at this position until the alias resolves.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasRef {
    pub alias: String,
    /// Position inside an array value, `None` for a scalar.
    pub index: Option<usize>,
}

/// The declared shape a value is coerced against.
#[derive(Debug, Clone, Copy)]
pub struct Target<'t> {
    pub cim_type: &'t CimType,
    pub is_array: bool,
    pub array_size: Option<u32>,
}

/// Coerce `raw` to `target`. `NULL` yields `None`. Alias references are
/// accepted only when `aliases` is given and the type is a reference.
pub fn coerce(
    raw: &RawValue,
    target: Target<'_>,
    mut aliases: Option<&mut Vec<AliasRef>>,
) -> Result<Option<CimValue>, String> {
    match (raw, target.is_array) {
        (RawValue::Null, _) => Ok(None),
        (RawValue::Array(items), true) => {
            if let Some(max) = target.array_size {
                if items.len() > max as usize {
                    return Err(format!(
                        "array has {} elements but its size is fixed at {}",
                        items.len(),
                        max
                    ));
                }
            }
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let v = scalar(item, target.cim_type, Some(i), aliases.as_deref_mut())?;
                out.push(v);
            }
            Ok(Some(CimValue::Array(out)))
        }
        (RawValue::Array(_), false) => Err(format!(
            "array value given for scalar of type {}",
            target.cim_type
        )),
        (other, true) => Err(format!(
            "scalar value {} given for array of type {}",
            describe(other),
            target.cim_type
        )),
        (other, false) => scalar(other, target.cim_type, None, aliases).map(Some),
    }
}

fn describe(raw: &RawValue) -> String {
    match raw {
        RawValue::Null => "null".into(),
        RawValue::Bool(b) => b.to_string(),
        RawValue::Int { text, .. } | RawValue::Real(text) => text.clone(),
        RawValue::Char(c) => format!("'{}'", c.escape_default()),
        RawValue::Str(s) => format!("\"{}\"", s.escape_default()),
        RawValue::Alias(a) => format!("${}", a),
        RawValue::Array(_) => "array".into(),
    }
}

fn mismatch(raw: &RawValue, ty: &CimType) -> String {
    format!("value {} does not match type {}", describe(raw), ty)
}

fn scalar(
    raw: &RawValue,
    ty: &CimType,
    index: Option<usize>,
    aliases: Option<&mut Vec<AliasRef>>,
) -> Result<CimValue, String> {
    match (ty, raw) {
        (_, RawValue::Null) => Err("null is not allowed inside an array".into()),
        (_, RawValue::Array(_)) => Err("nested arrays are not allowed".into()),
        (CimType::Boolean, RawValue::Bool(b)) => Ok(CimValue::Boolean(*b)),
        (CimType::String, RawValue::Str(s)) => Ok(CimValue::String(s.clone())),
        (CimType::Char16, RawValue::Char(c)) => {
            if (*c as u32) > 0xFFFF {
                return Err(format!("char16 value '{}' is outside the BMP", c.escape_default()));
            }
            Ok(CimValue::Char16(*c))
        }
        (CimType::DateTime, RawValue::Str(s)) => {
            check_datetime(s)?;
            Ok(CimValue::DateTime(s.clone()))
        }
        (CimType::Reference(_), RawValue::Str(path)) => Ok(CimValue::Reference(path.clone())),
        (CimType::Reference(_), RawValue::Alias(alias)) => match aliases {
            Some(refs) => {
                refs.push(AliasRef {
                    alias: alias.clone(),
                    index,
                });
                Ok(CimValue::Reference(String::new()))
            }
            None => Err(format!(
                "alias ${} can only be used in instance property values",
                alias
            )),
        },
        (t, RawValue::Int { text, kind }) if t.integer_range().is_some() => {
            let n = parse_integer(text, *kind)?;
            let (min, max) = t.integer_range().unwrap_or((0, 0));
            if n < min || n > max {
                return Err(format!("value {} is out of range for {}", text, t));
            }
            if t.is_unsigned() {
                u64::try_from(n)
                    .map(CimValue::UInt)
                    .map_err(|_| format!("value {} is out of range for {}", text, t))
            } else {
                i64::try_from(n)
                    .map(CimValue::SInt)
                    .map_err(|_| format!("value {} is out of range for {}", text, t))
            }
        }
        (t, RawValue::Real(text)) if t.is_real() => {
            let r: f64 = text
                .parse()
                .map_err(|_| format!("invalid real literal '{}'", text))?;
            check_real(r, t, text)?;
            Ok(CimValue::Real(r))
        }
        (t, RawValue::Int { text, kind }) if t.is_real() => {
            let r = parse_integer(text, *kind)? as f64;
            check_real(r, t, text)?;
            Ok(CimValue::Real(r))
        }
        (t, other) => Err(mismatch(other, t)),
    }
}

fn check_real(r: f64, ty: &CimType, text: &str) -> Result<(), String> {
    if !r.is_finite() || (*ty == CimType::Real32 && r.abs() > f32::MAX as f64) {
        return Err(format!("value {} is out of range for {}", text, ty));
    }
    Ok(())
}

/// Integer value of a lexed literal, sign included.
pub fn parse_integer(text: &str, kind: NumberKind) -> Result<i128, String> {
    let (negative, body) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let (digits, radix) = match kind {
        NumberKind::Binary => (&body[..body.len().saturating_sub(1)], 2),
        NumberKind::Hex => (body.get(2..).unwrap_or(""), 16),
        NumberKind::Octal => (&body[1..], 8),
        NumberKind::Decimal => (body, 10),
        NumberKind::Real => return Err(format!("'{}' is not an integer", text)),
    };
    let magnitude = i128::from_str_radix(digits, radix)
        .map_err(|_| format!("integer literal '{}' is too large", text))?;
    Ok(if negative { -magnitude } else { magnitude })
}

/// `yyyymmddhhmmss.mmmmmmsutc` timestamps and `ddddddddhhmmss.mmmmmm:000`
/// intervals; fields may be masked with `*`.
fn check_datetime(s: &str) -> Result<(), String> {
    let bytes = s.as_bytes();
    let field_ok = |range: std::ops::Range<usize>| {
        bytes[range]
            .iter()
            .all(|b| b.is_ascii_digit() || *b == b'*')
    };
    let well_formed = bytes.len() == 25
        && field_ok(0..14)
        && bytes[14] == b'.'
        && field_ok(15..21)
        && matches!(bytes[21], b'+' | b'-' | b':')
        && field_ok(22..25);
    if well_formed {
        Ok(())
    } else {
        Err(format!("'{}' is not a valid datetime value", s))
    }
}
