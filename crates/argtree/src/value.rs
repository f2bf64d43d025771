//! Runtime value cells behind registered flags.
//!
//! Parsing follows Go's `strconv` rules so the same strings are accepted on
//! the command line, in environment variables and in files.

use std::any::Any;
use std::fmt;

/// A user-defined flag value.
///
/// `set` is called once per occurrence on the command line (and once for an
/// env/file source). `Display` provides the text used for alias copying and
/// help output.
pub trait GenericValue: Any + fmt::Display + fmt::Debug {
    fn set(&mut self, value: &str) -> Result<(), String>;

    fn clone_box(&self) -> Box<dyn GenericValue>;
}

impl Clone for Box<dyn GenericValue> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Append-only sequence with its initial value kept aside.
///
/// The initial value is what the registry resolved at build time (literal
/// default, or env/file contents). Once the collected values differ from it,
/// one occurrence of each initial element is dropped from the result.
#[derive(Debug, Clone, PartialEq)]
pub struct Accumulator<T> {
    values: Vec<T>,
    defaults: Vec<T>,
}

impl<T: Clone + PartialEq> Accumulator<T> {
    pub fn new(defaults: Vec<T>) -> Self {
        Self {
            values: defaults.clone(),
            defaults,
        }
    }

    pub fn push(&mut self, value: T) {
        self.values.push(value);
    }

    /// Raw collected values, defaults included.
    pub fn raw(&self) -> &[T] {
        &self.values
    }

    pub fn defaults(&self) -> &[T] {
        &self.defaults
    }

    /// Collected values with default suppression applied.
    pub fn resolved(&self) -> Vec<T> {
        let mut out = self.values.clone();
        if out == self.defaults {
            return out;
        }
        for default in &self.defaults {
            if let Some(pos) = out.iter().position(|v| v == default) {
                out.remove(pos);
            }
        }
        out
    }
}

/// The current value of one registered flag.
#[derive(Debug, Clone)]
pub enum FlagValue {
    Bool(bool),
    String(String),
    Int(isize),
    Int64(i64),
    Uint(usize),
    Uint64(u64),
    Float64(f64),
    Generic(Box<dyn GenericValue>),
    StringSlice(Accumulator<String>),
    IntSlice(Accumulator<isize>),
    Int64Slice(Accumulator<i64>),
}

impl FlagValue {
    /// Apply one command-line occurrence.
    pub fn set(&mut self, raw: &str) -> Result<(), String> {
        match self {
            Self::Bool(v) => *v = parse_bool(raw)?,
            Self::String(v) => *v = raw.to_string(),
            Self::Int(v) => *v = narrow(parse_i64(raw)?)?,
            Self::Int64(v) => *v = parse_i64(raw)?,
            Self::Uint(v) => *v = narrow(parse_u64(raw)?)?,
            Self::Uint64(v) => *v = parse_u64(raw)?,
            Self::Float64(v) => *v = parse_f64(raw)?,
            Self::Generic(v) => v.set(raw)?,
            Self::StringSlice(acc) => acc.push(raw.to_string()),
            Self::IntSlice(acc) => acc.push(narrow(parse_decimal(raw)?)?),
            Self::Int64Slice(acc) => acc.push(parse_decimal(raw)?),
        }
        Ok(())
    }

    /// Boolean flags never consume the following token.
    pub fn is_bool_flag(&self) -> bool {
        matches!(self, Self::Bool(_))
    }

    pub fn is_accumulator(&self) -> bool {
        matches!(
            self,
            Self::StringSlice(_) | Self::IntSlice(_) | Self::Int64Slice(_)
        )
    }

    /// Accumulators and generic values are one cell shared by every alias.
    pub(crate) fn is_shared(&self) -> bool {
        self.is_accumulator() || matches!(self, Self::Generic(_))
    }

    /// Text form, as used for alias copying and typed lookups.
    pub fn to_text(&self) -> String {
        match self {
            Self::Bool(v) => v.to_string(),
            Self::String(v) => v.clone(),
            Self::Int(v) => v.to_string(),
            Self::Int64(v) => v.to_string(),
            Self::Uint(v) => v.to_string(),
            Self::Uint64(v) => v.to_string(),
            Self::Float64(v) => v.to_string(),
            Self::Generic(v) => v.to_string(),
            Self::StringSlice(acc) => acc.raw().join(","),
            Self::IntSlice(acc) => join(acc.raw()),
            Self::Int64Slice(acc) => join(acc.raw()),
        }
    }
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

pub(crate) fn narrow<S, T: TryFrom<S>>(value: S) -> Result<T, String> {
    T::try_from(value).map_err(|_| "value out of range".to_string())
}

/// Accepts the spellings of Go's `strconv.ParseBool`.
pub fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
        _ => Err("invalid syntax".to_string()),
    }
}

/// Split a literal into its radix, honoring `0x`, `0o`, `0b` and a leading `0`.
fn split_radix(digits: &str) -> (u32, &str) {
    let lower = digits.get(..2).map(str::to_ascii_lowercase);
    match lower.as_deref() {
        Some("0x") => (16, &digits[2..]),
        Some("0o") => (8, &digits[2..]),
        Some("0b") => (2, &digits[2..]),
        _ if digits.len() > 1 && digits.starts_with('0') => (8, &digits[1..]),
        _ => (10, digits),
    }
}

/// Underscores may only separate digits, or follow a base prefix.
fn underscores_ok(digits: &str) -> bool {
    let lower = digits.to_ascii_lowercase();
    let (mut prev, body, hex) = match lower.get(..2) {
        Some("0x") => ('0', &lower[2..], true),
        Some("0o" | "0b") => ('0', &lower[2..], false),
        _ => ('^', lower.as_str(), false),
    };
    for c in body.chars() {
        prev = match c {
            '0'..='9' => '0',
            'a'..='f' if hex => '0',
            '_' if prev == '0' => '_',
            '_' => return false,
            _ if prev == '_' => return false,
            _ => '!',
        };
    }
    prev != '_'
}

fn parse_magnitude(digits: &str) -> Result<u64, String> {
    if !underscores_ok(digits) {
        return Err("invalid syntax".to_string());
    }
    let (radix, body) = split_radix(digits);
    let cleaned: String = body.chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() || cleaned.starts_with(['+', '-']) {
        return Err("invalid syntax".to_string());
    }
    u64::from_str_radix(&cleaned, radix).map_err(|e| e.to_string())
}

/// Signed integer with base prefix detection (`strconv.ParseInt(s, 0, 64)`).
pub fn parse_i64(raw: &str) -> Result<i64, String> {
    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let magnitude = parse_magnitude(digits)?;
    if negative {
        if magnitude == i64::MIN.unsigned_abs() {
            return Ok(i64::MIN);
        }
        i64::try_from(magnitude)
            .map(|v| -v)
            .map_err(|_| "value out of range".to_string())
    } else {
        i64::try_from(magnitude).map_err(|_| "value out of range".to_string())
    }
}

/// Unsigned integer with base prefix detection (`strconv.ParseUint(s, 0, 64)`).
pub fn parse_u64(raw: &str) -> Result<u64, String> {
    parse_magnitude(raw)
}

/// Base-10 only, as used for slice elements.
pub fn parse_decimal(raw: &str) -> Result<i64, String> {
    raw.parse::<i64>().map_err(|e| e.to_string())
}

pub fn parse_f64(raw: &str) -> Result<f64, String> {
    raw.parse::<f64>().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulator_keeps_defaults_until_input_arrives() {
        let acc = Accumulator::new(vec![1, 2]);
        assert_eq!(acc.resolved(), vec![1, 2]);

        let mut acc = Accumulator::new(vec![1, 2]);
        acc.push(3);
        assert_eq!(acc.raw(), &[1, 2, 3]);
        assert_eq!(acc.resolved(), vec![3]);
    }

    #[test]
    fn accumulator_removes_one_default_per_element() {
        // default [1], user passes 1: the literal removal leaves a single 1
        let mut acc = Accumulator::new(vec![1]);
        acc.push(1);
        assert_eq!(acc.resolved(), vec![1]);

        let mut acc = Accumulator::new(vec![1, 2]);
        acc.push(1);
        acc.push(2);
        assert_eq!(acc.resolved(), vec![1, 2]);
    }

    #[test]
    fn integers_detect_base_prefixes() {
        assert_eq!(parse_i64("42"), Ok(42));
        assert_eq!(parse_i64("-0x1f"), Ok(-31));
        assert_eq!(parse_i64("0o17"), Ok(15));
        assert_eq!(parse_i64("017"), Ok(15));
        assert_eq!(parse_i64("0b101"), Ok(5));
        assert_eq!(parse_i64("1_000"), Ok(1000));
        assert_eq!(parse_i64("0x_ff"), Ok(255));
        assert_eq!(parse_i64("0_17"), Ok(15));
        assert!(parse_i64("_1").is_err());
        assert!(parse_i64("1__0").is_err());
        assert!(parse_i64("1_").is_err());
        assert!(parse_i64("-_1").is_err());
        assert!(parse_u64("0x_").is_err());
        assert_eq!(parse_i64("-9223372036854775808"), Ok(i64::MIN));
        assert!(parse_i64("9223372036854775808").is_err());
        assert!(parse_i64("").is_err());
        assert!(parse_i64("--1").is_err());
        assert!(parse_u64("-1").is_err());
        assert_eq!(parse_u64("0"), Ok(0));
    }

    #[test]
    fn bools_follow_go_spellings() {
        assert_eq!(parse_bool("T"), Ok(true));
        assert_eq!(parse_bool("False"), Ok(false));
        assert!(parse_bool("yes").is_err());
    }

    #[test]
    fn set_appends_for_accumulators_and_replaces_scalars() {
        let mut v = FlagValue::IntSlice(Accumulator::new(Vec::new()));
        v.set("3").unwrap();
        v.set("4").unwrap();
        assert_eq!(v.to_text(), "3,4");
        assert!(v.set("0x5").is_err());

        let mut v = FlagValue::Uint(1);
        v.set("0x10").unwrap();
        assert_eq!(v.to_text(), "16");
        assert!(v.set("-2").is_err());
    }
}
