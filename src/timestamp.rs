//! # TTML 时间表达式
//!
//! 只处理两种不依赖文档参数的语法：
//!
//! - clock-time: `HH:MM:SS` 或 `HH:MM:SS.fff`，小时可以超过两位；
//! - offset-time: `<数字><单位>`，单位为 `h`、`m`、`s`、`ms`。
//!
//! 带帧数的 `HH:MM:SS:FF` 以及 `f`、`t` 单位依赖帧率和 tick 率，由解析器处理。

use std::{fmt, str::FromStr};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::TimedTextError;

static OFFSET_TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?|\.\d+)(h|m|s|ms)$").expect("编译 OFFSET_TIME_REGEX 失败")
});

/// 一个以秒为单位的时间点。
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Timestamp {
    seconds: f64,
}

impl Timestamp {
    /// 解析一个时间表达式。
    ///
    /// # Errors
    ///
    /// 字符串既不是 clock-time 也不是 offset-time 时返回 `TimedTextError::InvalidTimestamp`。
    pub fn parse(text: &str) -> Result<Self, TimedTextError> {
        let invalid = || TimedTextError::InvalidTimestamp(text.to_string());

        if let Some(caps) = OFFSET_TIME_REGEX.captures(text) {
            let value: f64 = caps[1].parse().map_err(|_| invalid())?;
            let multiplier = match &caps[2] {
                "h" => 3600.0,
                "m" => 60.0,
                "s" => 1.0,
                "ms" => 0.001,
                _ => return Err(invalid()),
            };
            return Ok(Self::from_seconds(value * multiplier));
        }

        parse_clock_time(text).ok_or_else(invalid)
    }

    /// 用秒数构造时间点。
    #[must_use]
    pub const fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    /// 用毫秒数构造时间点。
    #[must_use]
    pub fn from_milliseconds(milliseconds: f64) -> Self {
        Self {
            seconds: milliseconds / 1000.0,
        }
    }

    #[must_use]
    pub const fn seconds(&self) -> f64 {
        self.seconds
    }

    /// 四舍五入到整数毫秒。
    #[must_use]
    pub fn milliseconds(&self) -> i64 {
        (self.seconds * 1000.0).round() as i64
    }

    /// 不取整的毫秒数，只消除微秒以下的浮点误差。
    #[must_use]
    pub fn precise_milliseconds(&self) -> f64 {
        snap_milliseconds(self.seconds * 1000.0)
    }
}

/// 把毫秒数对齐到最近的微秒，`5.76 * 1000.0` 得到 `5760.0`。
#[must_use]
pub fn snap_milliseconds(milliseconds: f64) -> f64 {
    (milliseconds * 1000.0).round() / 1000.0
}

impl FromStr for Timestamp {
    type Err = TimedTextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.seconds)
    }
}

/// 解析 `HH:MM:SS[.fff]`，冒号数量必须正好是两个。
fn parse_clock_time(text: &str) -> Option<Timestamp> {
    let mut parts = text.split(':');
    let hours_str = parts.next()?;
    let minutes_str = parts.next()?;
    let seconds_str = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let hours = parse_digits(hours_str, usize::MAX)?;
    let minutes = parse_digits(minutes_str, 2)?;

    let (whole_seconds_str, fraction_str) = match seconds_str.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (seconds_str, None),
    };
    let whole_seconds = parse_digits(whole_seconds_str, 2)?;
    let fraction = match fraction_str {
        Some(digits) => {
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            format!("0.{digits}").parse::<f64>().ok()?
        }
        None => 0.0,
    };

    Some(Timestamp::from_seconds(
        hours as f64 * 3600.0 + minutes as f64 * 60.0 + whole_seconds as f64 + fraction,
    ))
}

/// 解析一个非空、最多 `max_len` 位的纯数字字段。
pub(crate) fn parse_digits(digits: &str, max_len: usize) -> Option<u64> {
    if digits.is_empty() || digits.len() > max_len || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
