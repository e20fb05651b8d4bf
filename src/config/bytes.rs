//! Byte-quantity strings such as `10MB`, `512K` or `2G`

use anyhow::{Result, bail};
use lazy_static::lazy_static;
use regex::Regex;

pub const BYTE: u64 = 1;
pub const KILOBYTE: u64 = 1024 * BYTE;
pub const MEGABYTE: u64 = 1024 * KILOBYTE;
pub const GIGABYTE: u64 = 1024 * MEGABYTE;
pub const TERABYTE: u64 = 1024 * GIGABYTE;

lazy_static! {
    static ref BYTES_PATTERN: Regex = Regex::new(r"(?i)^(-?\d+)([KMGT]B?|B)$").unwrap();
}

const INVALID_QUANTITY: &str =
    "Byte quantity must be a positive integer with a unit of measurement like M, MB, G, or GB";

/// Parse a byte quantity with a base-1024 unit suffix
pub fn to_bytes(input: &str) -> Result<u64> {
    let Some(parts) = BYTES_PATTERN.captures(input.trim()) else {
        bail!("{}: '{}'", INVALID_QUANTITY, input);
    };

    let value: i64 = match parts[1].parse() {
        Ok(value) if value >= 1 => value,
        _ => bail!("{}: '{}'", INVALID_QUANTITY, input),
    };

    let multiplier = match parts[2].to_ascii_uppercase().as_bytes()[0] {
        b'T' => TERABYTE,
        b'G' => GIGABYTE,
        b'M' => MEGABYTE,
        b'K' => KILOBYTE,
        _ => BYTE,
    };

    match (value as u64).checked_mul(multiplier) {
        Some(bytes) => Ok(bytes),
        None => bail!("Byte quantity '{}' is too large", input),
    }
}
