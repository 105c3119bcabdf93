use tracing::warn;

use super::{AttributeTransformer, CssAttributeTransformer};
use crate::model::{AttributeName, AttributeValue, Length, LengthUnit};

/// 包装另一个转换器，把以像素表示的字号高度和行高限制在 `[min_px, max_px]` 内。
///
/// 其他单位和其他属性原样交给内层转换器。
#[derive(Debug, Clone)]
pub struct SizeClampedTransformer<T = CssAttributeTransformer> {
    inner: T,
    min_px: f64,
    max_px: f64,
}

impl<T: AttributeTransformer> SizeClampedTransformer<T> {
    /// `min_px` 大于 `max_px` 时两者会被交换。为 NaN 的边界视为不限制。
    #[must_use]
    pub fn new(inner: T, min_px: f64, max_px: f64) -> Self {
        let bound = |value: f64, unbounded: f64| {
            if value.is_nan() {
                warn!("[SizeClampedTransformer] 像素边界不是数字，忽略该边界");
                unbounded
            } else {
                value
            }
        };
        let min_px = bound(min_px, f64::NEG_INFINITY);
        let max_px = bound(max_px, f64::INFINITY);
        let (min_px, max_px) = if min_px <= max_px {
            (min_px, max_px)
        } else {
            (max_px, min_px)
        };
        Self {
            inner,
            min_px,
            max_px,
        }
    }

    #[must_use]
    pub const fn inner(&self) -> &T {
        &self.inner
    }

    fn clamp(&self, length: Length) -> Length {
        if length.unit == LengthUnit::Pixel {
            Length::new(length.value.clamp(self.min_px, self.max_px), length.unit)
        } else {
            length
        }
    }
}

impl<T: AttributeTransformer> AttributeTransformer for SizeClampedTransformer<T> {
    fn transform(&self, name: AttributeName, value: &str) -> Option<AttributeValue> {
        let transformed = self.inner.transform(name, value)?;
        Some(match (name, transformed) {
            (AttributeName::FontSize, AttributeValue::Size { width, height }) => {
                AttributeValue::Size {
                    width,
                    height: self.clamp(height),
                }
            }
            (AttributeName::LineHeight, AttributeValue::Length(length)) => {
                AttributeValue::Length(self.clamp(length))
            }
            (_, other) => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn px(value: f64) -> Length {
        Length::new(value, LengthUnit::Pixel)
    }

    #[test]
    fn test_pixel_sizes_are_clamped() {
        let t = SizeClampedTransformer::new(CssAttributeTransformer::new(), 10.0, 40.0);

        assert_eq!(
            t.transform(AttributeName::FontSize, "8px"),
            Some(AttributeValue::Size {
                width: px(8.0),
                height: px(10.0),
            })
        );
        assert_eq!(
            t.transform(AttributeName::FontSize, "20px 64px"),
            Some(AttributeValue::Size {
                width: px(20.0),
                height: px(40.0),
            })
        );
        assert_eq!(
            t.transform(AttributeName::LineHeight, "100px"),
            Some(AttributeValue::Length(px(40.0)))
        );
    }

    #[test]
    fn test_nan_bounds_are_ignored() {
        let t = SizeClampedTransformer::new(CssAttributeTransformer::new(), f64::NAN, 10.0);
        assert_eq!(
            t.transform(AttributeName::FontSize, "20px"),
            Some(AttributeValue::Size {
                width: px(20.0),
                height: px(10.0),
            })
        );
        assert_eq!(
            t.transform(AttributeName::LineHeight, "1px"),
            Some(AttributeValue::Length(px(1.0)))
        );

        let t = SizeClampedTransformer::new(CssAttributeTransformer::new(), 12.0, f64::NAN);
        assert_eq!(
            t.transform(AttributeName::LineHeight, "400px"),
            Some(AttributeValue::Length(px(400.0)))
        );
        assert_eq!(
            t.transform(AttributeName::LineHeight, "2px"),
            Some(AttributeValue::Length(px(12.0)))
        );

        let t = SizeClampedTransformer::new(CssAttributeTransformer::new(), f64::NAN, f64::NAN);
        assert_eq!(
            t.transform(AttributeName::LineHeight, "33px"),
            Some(AttributeValue::Length(px(33.0)))
        );
    }

    #[test]
    fn test_other_units_and_attributes_pass_through() {
        let t = SizeClampedTransformer::new(CssAttributeTransformer::new(), 40.0, 10.0);

        assert_eq!(
            t.transform(AttributeName::FontSize, "3c"),
            Some(AttributeValue::Size {
                width: Length::new(3.0, LengthUnit::Cell),
                height: Length::new(3.0, LengthUnit::Cell),
            })
        );
        assert_eq!(
            t.transform(AttributeName::LineHeight, "normal"),
            Some(AttributeValue::Keyword("normal".into()))
        );
        assert_eq!(
            t.transform(AttributeName::Extent, "100px 2px"),
            Some(AttributeValue::Size {
                width: px(100.0),
                height: px(2.0),
            })
        );
        assert_eq!(t.transform(AttributeName::FontSize, "big"), None);
    }
}
