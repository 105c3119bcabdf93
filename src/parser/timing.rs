//! 依赖文档参数的时间表达式：带帧数的 clock-time 以及 `f`、`t` 单位的 offset-time。

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    TimedTextError, Timestamp,
    model::{AttributeName, AttributeValue, TimedTextAttributes, own_or_parameter_default},
};

static FRAMES_CLOCK_TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+):(\d{1,2}):(\d{1,2}):(\d+)(?:\.(\d+))?$")
        .expect("编译 FRAMES_CLOCK_TIME_REGEX 失败")
});

static FRAME_TICK_OFFSET_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?|\.\d+)(f|t)$").expect("编译 FRAME_TICK_OFFSET_REGEX 失败")
});

/// 从 `<tt>` 上的参数属性得到的计时参数。
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct TimeContext {
    frame_rate: f64,
    frame_rate_multiplier: f64,
    sub_frame_rate: f64,
    tick_rate: f64,
}

impl Default for TimeContext {
    fn default() -> Self {
        Self {
            frame_rate: 30.0,
            frame_rate_multiplier: 1.0,
            sub_frame_rate: 1.0,
            tick_rate: 1.0,
        }
    }
}

impl TimeContext {
    /// 读取根元素的参数，缺失的参数使用格式默认值。
    pub(super) fn from_root(attributes: &TimedTextAttributes) -> Self {
        let integer = |name| {
            own_or_parameter_default(attributes, name)
                .and_then(|value| value.as_integer())
                .map(|n| n as f64)
        };
        let defaults = Self::default();

        let frame_rate_multiplier =
            match own_or_parameter_default(attributes, AttributeName::FrameRateMultiplier) {
                Some(AttributeValue::Ratio {
                    numerator,
                    denominator,
                }) => f64::from(numerator) / f64::from(denominator),
                _ => defaults.frame_rate_multiplier,
            };

        Self {
            frame_rate: integer(AttributeName::FrameRate).unwrap_or(defaults.frame_rate),
            frame_rate_multiplier,
            sub_frame_rate: integer(AttributeName::SubFrameRate)
                .unwrap_or(defaults.sub_frame_rate),
            tick_rate: integer(AttributeName::TickRate).unwrap_or(defaults.tick_rate),
        }
    }

    fn effective_frame_rate(&self) -> f64 {
        self.frame_rate * self.frame_rate_multiplier
    }

    /// 帧数换算为毫秒，四舍五入到整数。
    fn frames_to_milliseconds(&self, frames: f64) -> f64 {
        (1000.0 * frames / self.effective_frame_rate()).round()
    }

    /// 解析 `begin` / `end` / `dur` 的值。
    ///
    /// 先尝试依赖参数的语法，再交给 [`Timestamp::parse`]。
    pub(super) fn parse_time_expression(&self, text: &str) -> Result<Timestamp, TimedTextError> {
        let trimmed = text.trim();
        let invalid = || TimedTextError::InvalidTimestamp(text.to_string());

        if let Some(caps) = FRAMES_CLOCK_TIME_REGEX.captures(trimmed) {
            let field = |i: usize| caps[i].parse::<f64>().map_err(|_| invalid());
            let (hours, minutes, seconds, frames) = (field(1)?, field(2)?, field(3)?, field(4)?);
            let sub_frames = match caps.get(5) {
                Some(m) => m.as_str().parse::<f64>().map_err(|_| invalid())?,
                None => 0.0,
            };

            let clock_ms = (hours * 3600.0 + minutes * 60.0 + seconds) * 1000.0;
            let frame_ms =
                self.frames_to_milliseconds(frames + sub_frames / self.sub_frame_rate);
            return Ok(Timestamp::from_milliseconds(clock_ms + frame_ms));
        }

        if let Some(caps) = FRAME_TICK_OFFSET_REGEX.captures(trimmed) {
            let count = caps[1].parse::<f64>().map_err(|_| invalid())?;
            let milliseconds = match &caps[2] {
                "f" => self.frames_to_milliseconds(count),
                _ => 1000.0 * count / self.tick_rate,
            };
            return Ok(Timestamp::from_milliseconds(milliseconds));
        }

        Timestamp::parse(trimmed).map_err(|_| invalid())
    }
}
