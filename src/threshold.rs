//! 阈值解析：`NN%`（相对总容量）或带二进制单位的绝对字节数（`512M`、`10G`、`1.5TiB`）。
//!
//! 所有单位写法均按 1024 进制换算：`K`、`KB`、`KiB` 都等于 1024 字节。

use std::sync::LazyLock;

use regex::Regex;

use crate::errors::{Error, Result};

static SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\d+(?:\.\d+)?)\s*(?:([kmgtpe])(?:i?b)?|b)?\s*$")
        .expect("invalid size regex")
});

/// 将阈值描述解析为具体字节数。
pub fn parse(spec: &str, total: u64) -> Result<u64> {
    match spec.trim().strip_suffix('%') {
        Some(percent) => parse_percent(spec, percent, total),
        None => parse_size(spec),
    }
}

fn parse_percent(spec: &str, percent: &str, total: u64) -> Result<u64> {
    let value = percent
        .trim()
        .parse::<i64>()
        .map_err(|_| Error::InvalidThreshold(spec.to_string()))?;
    if !(0..=100).contains(&value) {
        return Err(Error::ThresholdOutOfRange(value));
    }
    // 使用 u128 避免大容量卷相乘溢出
    Ok((total as u128 * value as u128 / 100) as u64)
}

pub fn parse_size(spec: &str) -> Result<u64> {
    let invalid = || Error::InvalidThreshold(spec.to_string());
    let caps = SIZE_RE.captures(spec).ok_or_else(invalid)?;
    let exponent = match caps.get(2).map(|m| m.as_str().to_ascii_uppercase()) {
        None => 0,
        Some(unit) => match unit.as_str() {
            "K" => 1,
            "M" => 2,
            "G" => 3,
            "T" => 4,
            "P" => 5,
            "E" => 6,
            _ => return Err(invalid()),
        },
    };
    let multiplier = 1024u128.pow(exponent);

    let (int_part, frac_part) = match caps[1].split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (&caps[1], None),
    };
    let int_value = int_part.parse::<u128>().map_err(|_| invalid())?;
    let mut bytes = int_value.checked_mul(multiplier).ok_or_else(invalid)?;
    if let Some(frac_part) = frac_part {
        // 小数部分按位换算后向下取整
        let digits = frac_part.len().min(18) as u32;
        let frac_value = frac_part[..digits as usize]
            .parse::<u128>()
            .map_err(|_| invalid())?;
        bytes += frac_value * multiplier / 10u128.pow(digits);
    }

    u64::try_from(bytes).map_err(|_| invalid())
}
