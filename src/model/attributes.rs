//! # 元素属性
//!
//! 每个元素的属性都保存在 [`TimedTextAttributes`] 中，键是 [`AttributeName`]，
//! 值是已经由属性转换器校验并转换过的 [`AttributeValue`]。

use std::{collections::BTreeMap, fmt, str::FromStr};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumIter, EnumString};

use super::element::{ElementId, ElementKind};
use crate::{TimedTextError, Timestamp};

static LENGTH_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([+-]?(?:\d*\.)?\d+)(px|em|c|%)$").expect("编译 LENGTH_REGEX 失败")
});

/// 属性所属的类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeCategory {
    /// 文档级参数（`ttp:*`），只出现在 `<tt>` 上。
    Parameter,
    /// `xml:id`、`xml:lang` 以及样式、区域引用。
    Core,
    /// `begin`、`end`、`dur`、`timeContainer`。
    Timing,
    /// 样式属性（`tts:*`）。
    Style,
}

/// 解析器认识的所有属性，按本地名匹配（命名空间前缀会被去掉）。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumString,
    AsRefStr,
    EnumIter,
    strum_macros::Display,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "camelCase")]
#[serde(rename_all = "camelCase")]
pub enum AttributeName {
    // --- 文档参数 ---
    CellResolution,
    ClockMode,
    DropMode,
    FrameRate,
    FrameRateMultiplier,
    MarkerMode,
    PixelAspectRatio,
    SubFrameRate,
    TickRate,
    TimeBase,
    // --- 核心属性 ---
    Id,
    Lang,
    Space,
    Style,
    Region,
    // --- 计时 ---
    Begin,
    End,
    Dur,
    TimeContainer,
    // --- 样式 ---
    BackgroundColor,
    Color,
    Direction,
    Display,
    DisplayAlign,
    Extent,
    FontFamily,
    FontSize,
    FontStyle,
    FontWeight,
    LineHeight,
    Opacity,
    Origin,
    Overflow,
    Padding,
    ShowBackground,
    TextAlign,
    TextDecoration,
    TextOutline,
    UnicodeBidi,
    Visibility,
    WrapOption,
    WritingMode,
    ZIndex,
}

const ROOT_ONLY: &[ElementKind] = &[ElementKind::Tt];
const ALL_ELEMENTS: &[ElementKind] = &[
    ElementKind::Tt,
    ElementKind::Head,
    ElementKind::Styling,
    ElementKind::Layout,
    ElementKind::Style,
    ElementKind::Region,
    ElementKind::Body,
    ElementKind::Div,
    ElementKind::P,
    ElementKind::Span,
    ElementKind::Br,
];
const STYLED_ELEMENTS: &[ElementKind] = &[
    ElementKind::Style,
    ElementKind::Region,
    ElementKind::Body,
    ElementKind::Div,
    ElementKind::P,
    ElementKind::Span,
];
const REGION_TARGETS: &[ElementKind] = &[
    ElementKind::Body,
    ElementKind::Div,
    ElementKind::P,
    ElementKind::Span,
];
const TIMED_ELEMENTS: &[ElementKind] = &[
    ElementKind::Region,
    ElementKind::Body,
    ElementKind::Div,
    ElementKind::P,
    ElementKind::Span,
    ElementKind::Br,
];
const REGION_STYLES: &[ElementKind] = &[ElementKind::Region];
const BLOCK_STYLES: &[ElementKind] = &[ElementKind::P];
const INLINE_STYLES: &[ElementKind] = &[ElementKind::Span];
const CONTENT_STYLES: &[ElementKind] = &[
    ElementKind::Body,
    ElementKind::Div,
    ElementKind::P,
    ElementKind::Region,
    ElementKind::Span,
];

impl AttributeName {
    /// 从属性的本地名解析，未知名称返回 `None`。
    #[must_use]
    pub fn from_local_name(name: &str) -> Option<Self> {
        Self::from_str(name).ok()
    }

    #[must_use]
    pub const fn category(self) -> AttributeCategory {
        match self {
            Self::CellResolution
            | Self::ClockMode
            | Self::DropMode
            | Self::FrameRate
            | Self::FrameRateMultiplier
            | Self::MarkerMode
            | Self::PixelAspectRatio
            | Self::SubFrameRate
            | Self::TickRate
            | Self::TimeBase => AttributeCategory::Parameter,
            Self::Id | Self::Lang | Self::Space | Self::Style | Self::Region => {
                AttributeCategory::Core
            }
            Self::Begin | Self::End | Self::Dur | Self::TimeContainer => AttributeCategory::Timing,
            _ => AttributeCategory::Style,
        }
    }

    /// 样式属性可以从引用的 `<style>` 元素中取值。
    #[must_use]
    pub fn is_style_settable(self) -> bool {
        self.category() == AttributeCategory::Style
    }

    /// 该属性在格式定义中是否会沿祖先链继承。
    ///
    /// 注意：[`crate::TimedText::attribute`] 目前并不会沿祖先链查找。
    #[must_use]
    pub const fn is_inheritable(self) -> bool {
        matches!(
            self,
            Self::Color
                | Self::Direction
                | Self::FontFamily
                | Self::FontSize
                | Self::FontStyle
                | Self::FontWeight
                | Self::LineHeight
                | Self::TextAlign
                | Self::TextDecoration
                | Self::TextOutline
                | Self::Visibility
                | Self::WrapOption
                | Self::Lang
                | Self::Space
        )
    }

    /// 可以出现该属性的元素种类，仅用于文档和校验，运行时不强制。
    #[must_use]
    pub const fn applies_to(self) -> &'static [ElementKind] {
        match self.category() {
            AttributeCategory::Parameter => ROOT_ONLY,
            AttributeCategory::Timing => TIMED_ELEMENTS,
            AttributeCategory::Core => match self {
                Self::Style => STYLED_ELEMENTS,
                Self::Region => REGION_TARGETS,
                _ => ALL_ELEMENTS,
            },
            AttributeCategory::Style => match self {
                Self::DisplayAlign
                | Self::Extent
                | Self::Opacity
                | Self::Origin
                | Self::Overflow
                | Self::Padding
                | Self::ShowBackground
                | Self::WritingMode
                | Self::ZIndex => REGION_STYLES,
                Self::TextAlign | Self::LineHeight => BLOCK_STYLES,
                Self::UnicodeBidi => INLINE_STYLES,
                _ => CONTENT_STYLES,
            },
        }
    }

    /// 格式规定的初始值（字面量），只在既没有本地值也没有样式链值时使用。
    #[must_use]
    pub const fn initial_value(self) -> Option<&'static str> {
        Some(match self {
            Self::CellResolution => "32 15",
            Self::ClockMode => "utc",
            Self::DropMode => "nonDrop",
            Self::FrameRate => "30",
            Self::FrameRateMultiplier => "1 1",
            Self::MarkerMode => "discontinuous",
            Self::PixelAspectRatio => "1 1",
            Self::SubFrameRate => "1",
            Self::TickRate => "1",
            Self::TimeBase => "media",
            Self::BackgroundColor => "transparent",
            Self::Color => "white",
            Self::Direction => "ltr",
            Self::Display => "auto",
            Self::DisplayAlign => "before",
            Self::Extent => "auto",
            Self::FontFamily => "default",
            Self::FontSize => "1c",
            Self::FontStyle => "normal",
            Self::FontWeight => "normal",
            Self::LineHeight => "normal",
            Self::Opacity => "1.0",
            Self::Origin => "auto",
            Self::Overflow => "hidden",
            Self::Padding => "0px",
            Self::ShowBackground => "always",
            Self::TextAlign => "start",
            Self::TextDecoration => "none",
            Self::TextOutline => "none",
            Self::UnicodeBidi => "normal",
            Self::Visibility => "visible",
            Self::WrapOption => "wrap",
            Self::WritingMode => "lrtb",
            Self::ZIndex => "auto",
            Self::Id
            | Self::Lang
            | Self::Space
            | Self::Style
            | Self::Region
            | Self::Begin
            | Self::End
            | Self::Dur
            | Self::TimeContainer => return None,
        })
    }
}

/// 长度单位。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthUnit {
    Pixel,
    Em,
    Cell,
    Percent,
}

impl LengthUnit {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pixel => "px",
            Self::Em => "em",
            Self::Cell => "c",
            Self::Percent => "%",
        }
    }
}

/// 一个带单位的长度，例如 `12px`、`1.5em`、`80%`。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Length {
    pub value: f64,
    pub unit: LengthUnit,
}

impl Length {
    #[must_use]
    pub const fn new(value: f64, unit: LengthUnit) -> Self {
        Self { value, unit }
    }

    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.value.is_sign_negative() && self.value != 0.0
    }
}

impl FromStr for Length {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = LENGTH_REGEX.captures(s).ok_or(())?;
        let value = caps[1].parse::<f64>().map_err(|_| ())?;
        let unit = match &caps[2] {
            "px" => LengthUnit::Pixel,
            "em" => LengthUnit::Em,
            "c" => LengthUnit::Cell,
            "%" => LengthUnit::Percent,
            _ => return Err(()),
        };
        Ok(Self { value, unit })
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.as_str())
    }
}

/// `tts:textOutline` 的结构化值。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOutline {
    pub color: Option<String>,
    pub thickness: Length,
    pub blur_radius: Option<Length>,
}

/// 经过校验和转换后的属性值。
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// 枚举值或原样透传的字符串（`xml:id`、`xml:lang` 等）。
    Keyword(String),
    /// 平台可用的颜色字符串，例如 `#FFEE88` 或 `rgba(255,238,136,0.50)`。
    Color(String),
    Integer(i64),
    Number(f64),
    Length(Length),
    CellResolution {
        columns: u32,
        rows: u32,
    },
    Ratio {
        numerator: u32,
        denominator: u32,
    },
    Size {
        width: Length,
        height: Length,
    },
    Position {
        left: Length,
        top: Length,
    },
    Lengths(Vec<Length>),
    FontFamily(Vec<String>),
    TextOutline(TextOutline),
    Time(Timestamp),
    /// 已解析的 `style` / `region` 引用，按属性中出现的顺序排列。
    References(Vec<ElementId>),
}

impl AttributeValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Keyword(s) | Self::Color(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Self::Time(t) => Some(*t),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_references(&self) -> Option<&[ElementId]> {
        match self {
            Self::References(ids) => Some(ids),
            _ => None,
        }
    }
}

/// 以毫秒表示的激活区间，`end_ms` 可能是正无穷。区间是左闭右开的。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingInterval {
    pub begin_ms: f64,
    pub end_ms: f64,
}

impl TimingInterval {
    #[must_use]
    pub fn contains(&self, ms: f64) -> bool {
        self.begin_ms <= ms && ms < self.end_ms
    }
}

/// 单个元素的属性表。每个属性在解析过程中只会被写入一次。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimedTextAttributes {
    values: BTreeMap<AttributeName, AttributeValue>,
}

impl TimedTextAttributes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入一个属性。
    ///
    /// # Errors
    ///
    /// 同一属性已经写入过时返回 `TimedTextError::AttributeAlreadySet`。
    pub fn set_attribute(
        &mut self,
        name: AttributeName,
        value: AttributeValue,
    ) -> Result<(), TimedTextError> {
        if self.values.contains_key(&name) {
            return Err(TimedTextError::AttributeAlreadySet(name));
        }
        self.values.insert(name, value);
        Ok(())
    }

    /// 只读取本元素上的值，不做任何回退。
    #[must_use]
    pub fn own(&self, name: AttributeName) -> Option<&AttributeValue> {
        self.values.get(&name)
    }

    #[must_use]
    pub fn contains(&self, name: AttributeName) -> bool {
        self.values.contains_key(&name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttributeName, &AttributeValue)> {
        self.values.iter().map(|(name, value)| (*name, value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 本元素引用的 `<style>` 元素。
    #[must_use]
    pub fn style_references(&self) -> &[ElementId] {
        self.own(AttributeName::Style)
            .and_then(AttributeValue::as_references)
            .unwrap_or_default()
    }

    /// 本元素引用的 `<region>` 元素。
    #[must_use]
    pub fn region_references(&self) -> &[ElementId] {
        self.own(AttributeName::Region)
            .and_then(AttributeValue::as_references)
            .unwrap_or_default()
    }

    /// 根据 `begin` / `end` / `dur` 计算激活区间。
    ///
    /// 没有 `begin` 也没有 `end` 时返回 `None`；有 `end` 时忽略 `dur`。
    #[must_use]
    pub fn timing_interval(&self) -> Option<TimingInterval> {
        let time_ms = |name| {
            self.own(name)
                .and_then(AttributeValue::as_timestamp)
                .map(|ts| ts.precise_milliseconds())
        };

        let begin = time_ms(AttributeName::Begin);
        let end = time_ms(AttributeName::End);
        if begin.is_none() && end.is_none() {
            return None;
        }

        let begin_ms = begin.unwrap_or(0.0);
        let end_ms = end.unwrap_or_else(|| {
            time_ms(AttributeName::Dur).map_or(f64::INFINITY, |dur| begin_ms + dur)
        });
        Some(TimingInterval { begin_ms, end_ms })
    }
}
