//! # 类 CSS 属性转换器

use once_cell::sync::Lazy;
use regex::Regex;

use super::{AttributeTransformer, BaseAttributeTransformer, DiagnosticSink};
use crate::{
    config::FontMap,
    model::{AttributeName, AttributeValue, Length, TextOutline},
};

static HEX_COLOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("编译 HEX_COLOR_REGEX 失败"));

static HEX_ALPHA_COLOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})$")
        .expect("编译 HEX_ALPHA_COLOR_REGEX 失败")
});

static RGB_COLOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^rgb\((\d{1,3}),(\d{1,3}),(\d{1,3})\)$").expect("编译 RGB_COLOR_REGEX 失败")
});

static RGBA_COLOR_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^rgba\((\d{1,3}),(\d{1,3}),(\d{1,3}),(\d{1,3})\)$")
        .expect("编译 RGBA_COLOR_REGEX 失败")
});

static NAMED_COLOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z]+$").expect("编译 NAMED_COLOR_REGEX 失败"));

static NUMBER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(\d*\.)?\d+$").expect("编译 NUMBER_REGEX 失败"));

static INTEGER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+$").expect("编译 INTEGER_REGEX 失败"));

const TRANSPARENT: &str = "rgba(0,0,0,0.0)";

/// 为每个已知属性产出类 CSS 值的转换器。
///
/// `style`、`region` 以及计时属性不在这里处理，由解析器负责。
#[derive(Debug, Clone, Default)]
pub struct CssAttributeTransformer {
    base: BaseAttributeTransformer,
    font_map: Option<FontMap>,
}

impl CssAttributeTransformer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: DiagnosticSink) -> Self {
        self.base = BaseAttributeTransformer::with_reporter(reporter);
        self
    }

    #[must_use]
    pub fn with_font_map(mut self, font_map: FontMap) -> Self {
        self.font_map = Some(font_map);
        self
    }

    #[must_use]
    pub const fn base(&self) -> &BaseAttributeTransformer {
        &self.base
    }

    fn enumerated(
        &self,
        name: AttributeName,
        value: &str,
        allowed_values: &[&str],
    ) -> Option<AttributeValue> {
        self.base
            .transform_enumerated_attribute(name, value, allowed_values)
            .map(AttributeValue::Keyword)
    }

    fn transform_color(&self, name: AttributeName, value: &str) -> Option<AttributeValue> {
        if value == "transparent" {
            return Some(AttributeValue::Color(TRANSPARENT.to_string()));
        }
        if HEX_COLOR_REGEX.is_match(value) || NAMED_COLOR_REGEX.is_match(value) {
            return Some(AttributeValue::Color(value.to_string()));
        }

        if let Some(caps) = HEX_ALPHA_COLOR_REGEX.captures(value) {
            let channel = |i: usize| u8::from_str_radix(&caps[i], 16).ok();
            if let (Some(r), Some(g), Some(b), Some(a)) = (channel(1), channel(2), channel(3), channel(4))
            {
                return Some(AttributeValue::Color(rgba(r, g, b, a)));
            }
        }

        if let Some(caps) = RGB_COLOR_REGEX.captures(value)
            && (1..=3).all(|i| caps[i].parse::<u8>().is_ok())
        {
            return Some(AttributeValue::Color(value.to_string()));
        }

        if let Some(caps) = RGBA_COLOR_REGEX.captures(value) {
            let channel = |i: usize| caps[i].parse::<u8>().ok();
            if let (Some(r), Some(g), Some(b), Some(a)) = (channel(1), channel(2), channel(3), channel(4))
            {
                return Some(AttributeValue::Color(rgba(r, g, b, a)));
            }
        }

        self.base.report_invalid(name, "a color", value);
        None
    }

    fn length(&self, name: AttributeName, value: &str, non_negative: bool) -> Option<Length> {
        match value.parse::<Length>() {
            Ok(length) if non_negative && length.is_negative() => {
                self.base
                    .report_invalid(name, "a non-negative length", value);
                None
            }
            Ok(length) => Some(length),
            Err(()) => {
                self.base.report_invalid(name, "a length", value);
                None
            }
        }
    }

    /// 解析以空白分隔的 `min..=max` 个长度。
    fn lengths(
        &self,
        name: AttributeName,
        value: &str,
        count: std::ops::RangeInclusive<usize>,
        non_negative: bool,
    ) -> Option<Vec<Length>> {
        let parts: Vec<&str> = value.split_whitespace().collect();
        if !count.contains(&parts.len()) {
            self.base.report_invalid(
                name,
                &format!("{} to {} lengths", count.start(), count.end()),
                value,
            );
            return None;
        }
        parts
            .into_iter()
            .map(|part| self.length(name, part, non_negative))
            .collect()
    }

    fn transform_extent(&self, name: AttributeName, value: &str) -> Option<AttributeValue> {
        if value == "auto" {
            return Some(AttributeValue::Keyword(value.to_string()));
        }
        let lengths = self.lengths(name, value, 2..=2, true)?;
        Some(AttributeValue::Size {
            width: lengths[0],
            height: lengths[1],
        })
    }

    fn transform_origin(&self, name: AttributeName, value: &str) -> Option<AttributeValue> {
        if value == "auto" {
            return Some(AttributeValue::Keyword(value.to_string()));
        }
        let lengths = self.lengths(name, value, 2..=2, false)?;
        Some(AttributeValue::Position {
            left: lengths[0],
            top: lengths[1],
        })
    }

    /// 一个值表示宽高相同，两个值依次为宽、高。
    fn transform_font_size(&self, name: AttributeName, value: &str) -> Option<AttributeValue> {
        let lengths = self.lengths(name, value, 1..=2, true)?;
        let width = lengths[0];
        let height = lengths.get(1).copied().unwrap_or(width);
        Some(AttributeValue::Size { width, height })
    }

    fn transform_line_height(&self, name: AttributeName, value: &str) -> Option<AttributeValue> {
        if value == "normal" {
            return Some(AttributeValue::Keyword(value.to_string()));
        }
        self.length(name, value, true).map(AttributeValue::Length)
    }

    fn transform_opacity(&self, name: AttributeName, value: &str) -> Option<AttributeValue> {
        if !NUMBER_REGEX.is_match(value) {
            self.base.report_invalid(name, "a number", value);
            return None;
        }
        value
            .parse::<f64>()
            .ok()
            .map(|opacity| AttributeValue::Number(opacity.clamp(0.0, 1.0)))
    }

    fn transform_z_index(&self, name: AttributeName, value: &str) -> Option<AttributeValue> {
        if value == "auto" {
            return Some(AttributeValue::Keyword(value.to_string()));
        }
        if INTEGER_REGEX.is_match(value)
            && let Ok(z_index) = value.parse::<i64>()
        {
            return Some(AttributeValue::Integer(z_index));
        }
        self.base.report_invalid(name, "auto or an integer", value);
        None
    }

    fn transform_text_decoration(
        &self,
        name: AttributeName,
        value: &str,
    ) -> Option<AttributeValue> {
        const ALLOWED: &[&str] = &[
            "none",
            "underline",
            "noUnderline",
            "lineThrough",
            "noLineThrough",
            "overline",
            "noOverline",
        ];
        let tokens: Vec<&str> = value.split_whitespace().collect();
        if tokens.is_empty() {
            self.base
                .report_invalid(name, &format!("one of [{}]", ALLOWED.join(", ")), value);
            return None;
        }
        for token in &tokens {
            self.base
                .transform_enumerated_attribute(name, token, ALLOWED)?;
        }
        Some(AttributeValue::Keyword(tokens.join(" ")))
    }

    /// `none` 或 `[<color>] <thickness> [<blur-radius>]`。
    fn transform_text_outline(&self, name: AttributeName, value: &str) -> Option<AttributeValue> {
        if value == "none" {
            return Some(AttributeValue::Keyword(value.to_string()));
        }

        let mut tokens: Vec<&str> = value.split_whitespace().collect();
        let color = match tokens.first() {
            Some(first) if first.parse::<Length>().is_err() => {
                let color = self.transform_color(name, first)?;
                tokens.remove(0);
                color.as_str().map(str::to_string)
            }
            _ => None,
        };

        let lengths = self.lengths(name, &tokens.join(" "), 1..=2, true)?;
        Some(AttributeValue::TextOutline(TextOutline {
            color,
            thickness: lengths[0],
            blur_radius: lengths.get(1).copied(),
        }))
    }

    /// 逗号分隔的字体列表。配置了字体映射时，逐个替换为映射的具体字体；
    /// 找不到映射时使用 `unknown` 条目，连 `unknown` 都没有时保留原名。
    fn transform_font_family(&self, name: AttributeName, value: &str) -> Option<AttributeValue> {
        let requested: Vec<&str> = value
            .split(',')
            .map(|family| family.trim().trim_matches(['"', '\'']).trim())
            .filter(|family| !family.is_empty())
            .collect();
        if requested.is_empty() {
            self.base.report_invalid(name, "a list of font families", value);
            return None;
        }

        let mut families: Vec<String> = Vec::new();
        for family in requested {
            let resolved = self.font_map.as_ref().and_then(|map| map.resolve(family));
            match resolved {
                Some(mapped) => families.extend(mapped.iter().cloned()),
                None => families.push(family.to_string()),
            }
        }

        let mut seen = Vec::with_capacity(families.len());
        families.retain(|family| {
            if seen.contains(family) {
                false
            } else {
                seen.push(family.clone());
                true
            }
        });
        Some(AttributeValue::FontFamily(families))
    }
}

impl AttributeTransformer for CssAttributeTransformer {
    fn transform(&self, name: AttributeName, value: &str) -> Option<AttributeValue> {
        use AttributeName as A;

        match name {
            A::CellResolution => self
                .base
                .transform_two_positive_integers(name, value)
                .map(|[columns, rows]| AttributeValue::CellResolution { columns, rows }),
            A::FrameRateMultiplier | A::PixelAspectRatio => self
                .base
                .transform_two_positive_integers(name, value)
                .map(|[numerator, denominator]| AttributeValue::Ratio {
                    numerator,
                    denominator,
                }),
            A::FrameRate | A::SubFrameRate | A::TickRate => self
                .base
                .transform_positive_integer(name, value)
                .map(|n| AttributeValue::Integer(i64::from(n))),
            A::ClockMode => self.enumerated(name, value, &["local", "gps", "utc"]),
            A::DropMode => self.enumerated(name, value, &["dropNTSC", "dropPAL", "nonDrop"]),
            A::MarkerMode => self.enumerated(name, value, &["continuous", "discontinuous"]),
            A::TimeBase => self.enumerated(name, value, &["media", "smpte", "clock"]),
            A::TimeContainer => self.enumerated(name, value, &["par", "seq"]),
            A::Id | A::Lang => Some(AttributeValue::Keyword(value.to_string())),
            A::Space => self.enumerated(name, value, &["default", "preserve"]),
            A::BackgroundColor | A::Color => self.transform_color(name, value),
            A::Direction => self.enumerated(name, value, &["ltr", "rtl"]),
            A::Display => self.enumerated(name, value, &["auto", "none"]),
            A::DisplayAlign => self.enumerated(name, value, &["before", "center", "after"]),
            A::Extent => self.transform_extent(name, value),
            A::FontFamily => self.transform_font_family(name, value),
            A::FontSize => self.transform_font_size(name, value),
            A::FontStyle => self.enumerated(name, value, &["normal", "italic", "oblique"]),
            A::FontWeight => self.enumerated(name, value, &["normal", "bold"]),
            A::LineHeight => self.transform_line_height(name, value),
            A::Opacity => self.transform_opacity(name, value),
            A::Origin => self.transform_origin(name, value),
            A::Overflow => self.enumerated(name, value, &["visible", "hidden"]),
            A::Padding => self
                .lengths(name, value, 1..=4, true)
                .map(AttributeValue::Lengths),
            A::ShowBackground => self.enumerated(name, value, &["always", "whenActive"]),
            A::TextAlign => {
                self.enumerated(name, value, &["left", "center", "right", "start", "end"])
            }
            A::TextDecoration => self.transform_text_decoration(name, value),
            A::TextOutline => self.transform_text_outline(name, value),
            A::UnicodeBidi => self.enumerated(name, value, &["normal", "embed", "bidiOverride"]),
            A::Visibility => self.enumerated(name, value, &["visible", "hidden"]),
            A::WrapOption => self.enumerated(name, value, &["wrap", "noWrap"]),
            A::WritingMode => self.enumerated(
                name,
                value,
                &["lrtb", "rltb", "tbrl", "tblr", "lr", "rl", "tb"],
            ),
            A::ZIndex => self.transform_z_index(name, value),
            A::Style | A::Region | A::Begin | A::End | A::Dur => None,
        }
    }
}

/// 8 位十六进制或 `rgba()` 的透明度通道（0-255）换算为两位小数的 0.00-1.00。
fn rgba(r: u8, g: u8, b: u8, a: u8) -> String {
    format!("rgba({r},{g},{b},{:.2})", f64::from(a) / 255.0)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::model::LengthUnit;
    use crate::transform::test_utils::collecting_sink;

    fn color(value: &str) -> Option<String> {
        CssAttributeTransformer::new()
            .transform(AttributeName::Color, value)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    fn px(value: f64) -> Length {
        Length::new(value, LengthUnit::Pixel)
    }

    #[test]
    fn test_colors() {
        assert_eq!(color("#FFEE88").as_deref(), Some("#FFEE88"));
        assert_eq!(color("#FFEE887F").as_deref(), Some("rgba(255,238,136,0.50)"));
        assert_eq!(color("#000000FF").as_deref(), Some("rgba(0,0,0,1.00)"));
        assert_eq!(
            color("rgba(235,201,153,128)").as_deref(),
            Some("rgba(235,201,153,0.50)")
        );
        assert_eq!(color("rgb(1,2,3)").as_deref(), Some("rgb(1,2,3)"));
        assert_eq!(color("transparent").as_deref(), Some("rgba(0,0,0,0.0)"));
        assert_eq!(color("notARealColor").as_deref(), Some("notARealColor"));
    }

    #[test]
    fn test_colors_reject_embedded_whitespace() {
        assert_eq!(color("rgb(1, 2, 3)"), None);
        assert_eq!(color("rgba(235,201,153, 128)"), None);
        assert_eq!(color("rgb( 1,2,3)"), None);
        assert_eq!(color("rgb(1,2,300)"), None);
        assert_eq!(color("#FFEE8"), None);
        assert_eq!(color("light blue"), None);
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let (sink, messages) = collecting_sink();
        let transformer = CssAttributeTransformer::new().with_reporter(sink);

        assert_eq!(transformer.transform(AttributeName::Color, "rgb(1, 2, 3)"), None);
        assert_eq!(transformer.transform(AttributeName::FontWeight, "heavy"), None);
        assert_eq!(transformer.transform(AttributeName::Extent, "-10px 20px"), None);

        assert_eq!(
            *messages.lock().unwrap(),
            vec![
                "color attribute should be a color but was: rgb(1, 2, 3)",
                "fontWeight attribute should be one of [normal, bold] but was: heavy",
                "extent attribute should be a non-negative length but was: -10px",
            ]
        );
    }

    #[test]
    fn test_parameters() {
        let t = CssAttributeTransformer::new();
        assert_eq!(
            t.transform(AttributeName::CellResolution, "80 24"),
            Some(AttributeValue::CellResolution {
                columns: 80,
                rows: 24
            })
        );
        assert_eq!(
            t.transform(AttributeName::FrameRateMultiplier, "1000 1001"),
            Some(AttributeValue::Ratio {
                numerator: 1000,
                denominator: 1001
            })
        );
        assert_eq!(
            t.transform(AttributeName::FrameRate, "25"),
            Some(AttributeValue::Integer(25))
        );
        assert_eq!(
            t.transform(AttributeName::TimeBase, "smpte"),
            Some(AttributeValue::Keyword("smpte".into()))
        );
        assert_eq!(t.transform(AttributeName::TimeBase, "SMPTE"), None);
    }

    #[test]
    fn test_sizes_and_positions() {
        let t = CssAttributeTransformer::new();
        assert_eq!(
            t.transform(AttributeName::Extent, "80% 20%"),
            Some(AttributeValue::Size {
                width: Length::new(80.0, LengthUnit::Percent),
                height: Length::new(20.0, LengthUnit::Percent),
            })
        );
        assert_eq!(
            t.transform(AttributeName::Origin, "-10px 20px"),
            Some(AttributeValue::Position {
                left: px(-10.0),
                top: px(20.0),
            })
        );
        assert_eq!(
            t.transform(AttributeName::FontSize, "18px"),
            Some(AttributeValue::Size {
                width: px(18.0),
                height: px(18.0),
            })
        );
        assert_eq!(
            t.transform(AttributeName::FontSize, "1c 2c"),
            Some(AttributeValue::Size {
                width: Length::new(1.0, LengthUnit::Cell),
                height: Length::new(2.0, LengthUnit::Cell),
            })
        );
        assert_eq!(t.transform(AttributeName::FontSize, "-1c"), None);
        assert_eq!(
            t.transform(AttributeName::Extent, "auto"),
            Some(AttributeValue::Keyword("auto".into()))
        );
        assert_eq!(t.transform(AttributeName::Extent, "10px"), None);
        assert_eq!(
            t.transform(AttributeName::Padding, "1px 2px 3px"),
            Some(AttributeValue::Lengths(vec![px(1.0), px(2.0), px(3.0)]))
        );
        assert_eq!(t.transform(AttributeName::Padding, "1px 2px 3px 4px 5px"), None);
        assert_eq!(
            t.transform(AttributeName::LineHeight, "125%"),
            Some(AttributeValue::Length(Length::new(125.0, LengthUnit::Percent)))
        );
    }

    #[test]
    fn test_misc_style_attributes() {
        let t = CssAttributeTransformer::new();
        assert_eq!(
            t.transform(AttributeName::Opacity, "0.5"),
            Some(AttributeValue::Number(0.5))
        );
        assert_eq!(
            t.transform(AttributeName::Opacity, "1.5"),
            Some(AttributeValue::Number(1.0))
        );
        assert_eq!(t.transform(AttributeName::Opacity, "half"), None);
        assert_eq!(
            t.transform(AttributeName::ZIndex, "-2"),
            Some(AttributeValue::Integer(-2))
        );
        assert_eq!(
            t.transform(AttributeName::TextDecoration, "underline lineThrough"),
            Some(AttributeValue::Keyword("underline lineThrough".into()))
        );
        assert_eq!(t.transform(AttributeName::TextDecoration, "blink"), None);
        assert_eq!(
            t.transform(AttributeName::TextOutline, "black 2px 1px"),
            Some(AttributeValue::TextOutline(TextOutline {
                color: Some("black".into()),
                thickness: px(2.0),
                blur_radius: Some(px(1.0)),
            }))
        );
        assert_eq!(
            t.transform(AttributeName::TextOutline, "1px"),
            Some(AttributeValue::TextOutline(TextOutline {
                color: None,
                thickness: px(1.0),
                blur_radius: None,
            }))
        );
    }

    #[test]
    fn test_attributes_without_a_case_are_not_applicable() {
        let t = CssAttributeTransformer::new();
        for name in [
            AttributeName::Style,
            AttributeName::Region,
            AttributeName::Begin,
            AttributeName::End,
            AttributeName::Dur,
        ] {
            assert_eq!(t.transform(name, "whatever"), None);
        }
    }

    #[test]
    fn test_font_family_mapping() {
        let plain = CssAttributeTransformer::new();
        assert_eq!(
            plain.transform(AttributeName::FontFamily, "proportionalSansSerif, 'Comic Sans'"),
            Some(AttributeValue::FontFamily(vec![
                "proportionalSansSerif".into(),
                "Comic Sans".into()
            ]))
        );

        let font_map = FontMap::from(HashMap::from([
            (
                "proportionalSansSerif".to_string(),
                vec!["Helvetica".to_string(), "Arial".to_string()],
            ),
            ("unknown".to_string(), vec!["Arial".to_string()]),
        ]));
        let mapped = CssAttributeTransformer::new().with_font_map(font_map);
        assert_eq!(
            mapped.transform(AttributeName::FontFamily, "proportionalSansSerif,Comic Sans"),
            Some(AttributeValue::FontFamily(vec![
                "Helvetica".into(),
                "Arial".into()
            ]))
        );

        let without_unknown = CssAttributeTransformer::new().with_font_map(FontMap::from(
            HashMap::from([("default".to_string(), vec!["Verdana".to_string()])]),
        ));
        assert_eq!(
            without_unknown.transform(AttributeName::FontFamily, "default, Papyrus"),
            Some(AttributeValue::FontFamily(vec![
                "Verdana".into(),
                "Papyrus".into()
            ]))
        );
    }
}
