use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    B,
    Kb,
    Mb,
    Gb,
    Tb,
}

/// Smallest to largest. Parsing and rendering both walk this table.
const UNITS: [Unit; 5] = [Unit::B, Unit::Kb, Unit::Mb, Unit::Gb, Unit::Tb];

impl Unit {
    pub fn multiplier(self) -> u64 {
        match self {
            Unit::B => 1,
            Unit::Kb => 1 << 10,
            Unit::Mb => 1 << 20,
            Unit::Gb => 1 << 30,
            Unit::Tb => 1 << 40,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Unit::B => "B",
            Unit::Kb => "KB",
            Unit::Mb => "MB",
            Unit::Gb => "GB",
            Unit::Tb => "TB",
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        if suffix.is_empty() {
            return Some(Unit::B);
        }
        UNITS
            .iter()
            .copied()
            .find(|u| u.suffix().eq_ignore_ascii_case(suffix))
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid size '{input}': {reason} (use a format like '500MB' or '1.5GB')")]
pub struct InvalidThresholdFormat {
    pub input: String,
    pub reason: &'static str,
}

impl InvalidThresholdFormat {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// Parses strings such as `"10GB"`, `"1.5 mb"` or `"4096"` into a byte count.
///
/// Units are binary (1 KB = 1024 B). Fractional results are truncated.
pub fn parse_size(input: &str) -> Result<u64, InvalidThresholdFormat> {
    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(trimmed.len());
    let (number, suffix) = trimmed.split_at(split);

    if number.is_empty() {
        return Err(InvalidThresholdFormat::new(input, "missing numeric value"));
    }

    let unit = Unit::from_suffix(suffix.trim())
        .ok_or_else(|| InvalidThresholdFormat::new(input, "unknown size unit"))?;

    if number.bytes().all(|b| b.is_ascii_digit()) {
        return number
            .parse::<u64>()
            .ok()
            .and_then(|n| n.checked_mul(unit.multiplier()))
            .ok_or_else(|| InvalidThresholdFormat::new(input, "value is too large"));
    }

    let value: f64 = number
        .parse()
        .map_err(|_| InvalidThresholdFormat::new(input, "malformed numeric value"))?;
    let bytes = value * unit.multiplier() as f64;
    if !bytes.is_finite() || bytes >= u64::MAX as f64 {
        return Err(InvalidThresholdFormat::new(input, "value is too large"));
    }

    Ok(bytes as u64)
}

const MAX_DECIMALS: usize = 12;

/// Renders a byte count in the largest unit whose value is at least 1.
///
/// The output always parses back to `bytes` through [`parse_size`].
pub fn format_size(bytes: u64) -> String {
    let unit = UNITS
        .iter()
        .rev()
        .copied()
        .find(|u| bytes >= u.multiplier())
        .unwrap_or(Unit::B);

    if unit == Unit::B {
        return format!("{} {}", bytes, unit);
    }

    // Two decimals when that parses back to the same count, otherwise the
    // fewest decimals that do, otherwise the exact byte count.
    let value = bytes as f64 / unit.multiplier() as f64;
    (2..=MAX_DECIMALS)
        .map(|precision| format!("{:.*} {}", precision, value, unit))
        .find(|rendered| parse_size(rendered) == Ok(bytes))
        .unwrap_or_else(|| format!("{} {}", bytes, Unit::B))
}
