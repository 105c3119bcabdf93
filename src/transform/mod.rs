//! # 属性转换器
//!
//! 把原始属性字符串校验并转换为 [`AttributeValue`]。无效值不会中断解析：
//! 转换器返回 `None`，并在配置了诊断回调时报告一条形如
//! `<name> attribute should be <expectation> but was: <value>` 的消息。
//!
//! - [`BaseAttributeTransformer`]：公共校验函数和诊断报告，本身不接受任何属性；
//! - [`CssAttributeTransformer`]：为每个已知属性产出类 CSS 的值；
//! - [`SizeClampedTransformer`]：包装另一个转换器，把像素字号和行高限制在一个区间内。

mod clamped;
mod css;
mod defaults;

use std::{fmt, sync::Arc};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::model::{AttributeName, AttributeValue};

pub use clamped::SizeClampedTransformer;
pub use css::CssAttributeTransformer;
pub use defaults::AttributeDefaultsFactory;

static POSITIVE_INTEGER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+$").expect("编译 POSITIVE_INTEGER_REGEX 失败"));

static TWO_INTEGERS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\d+)\s+(\d+)\s*$").expect("编译 TWO_INTEGERS_REGEX 失败")
});

/// 诊断回调，接收一条人类可读的消息。
pub type DiagnosticSink = Arc<dyn Fn(&str) + Send + Sync>;

/// 属性转换策略。
pub trait AttributeTransformer {
    /// 转换一个属性值。返回 `None` 表示拒绝该值，或该属性不适用于此转换器。
    fn transform(&self, name: AttributeName, value: &str) -> Option<AttributeValue>;
}

impl<T: AttributeTransformer + ?Sized> AttributeTransformer for &T {
    fn transform(&self, name: AttributeName, value: &str) -> Option<AttributeValue> {
        (**self).transform(name, value)
    }
}

impl<T: AttributeTransformer + ?Sized> AttributeTransformer for Box<T> {
    fn transform(&self, name: AttributeName, value: &str) -> Option<AttributeValue> {
        (**self).transform(name, value)
    }
}

/// 所有转换器共用的校验函数和诊断报告。
#[derive(Clone, Default)]
pub struct BaseAttributeTransformer {
    reporter: Option<DiagnosticSink>,
}

impl fmt::Debug for BaseAttributeTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseAttributeTransformer")
            .field("has_reporter", &self.reporter.is_some())
            .finish()
    }
}

impl BaseAttributeTransformer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_reporter(reporter: DiagnosticSink) -> Self {
        Self {
            reporter: Some(reporter),
        }
    }

    /// 把消息转发给诊断回调，没有配置回调时什么也不做。
    pub fn report(&self, message: &str) {
        debug!("[AttributeTransformer] {message}");
        if let Some(reporter) = &self.reporter {
            reporter(message);
        }
    }

    pub(crate) fn report_invalid(&self, name: AttributeName, expectation: &str, value: &str) {
        self.report(&format!(
            "{name} attribute should be {expectation} but was: {value}"
        ));
    }

    /// 值必须与允许列表中的某一项完全相同。允许列表为空时总是拒绝。
    pub fn transform_enumerated_attribute(
        &self,
        name: AttributeName,
        value: &str,
        allowed_values: &[&str],
    ) -> Option<String> {
        if allowed_values.contains(&value) {
            return Some(value.to_string());
        }
        self.report_invalid(
            name,
            &format!("one of [{}]", allowed_values.join(", ")),
            value,
        );
        None
    }

    /// 值必须是大于零的十进制整数。
    pub fn transform_positive_integer(&self, name: AttributeName, value: &str) -> Option<u32> {
        if !POSITIVE_INTEGER_REGEX.is_match(value) {
            self.report_invalid(name, "an integer", value);
            return None;
        }
        match value.parse::<u32>() {
            Ok(number) if number > 0 => Some(number),
            _ => {
                self.report_invalid(name, "a positive integer", value);
                None
            }
        }
    }

    /// 值必须是以空白分隔的两个大于零的整数。
    pub fn transform_two_positive_integers(
        &self,
        name: AttributeName,
        value: &str,
    ) -> Option<[u32; 2]> {
        let Some(caps) = TWO_INTEGERS_REGEX.captures(value) else {
            self.report_invalid(name, "two numbers", value);
            return None;
        };
        match (caps[1].parse::<u32>(), caps[2].parse::<u32>()) {
            (Ok(first), Ok(second)) if first > 0 && second > 0 => Some([first, second]),
            _ => {
                self.report_invalid(name, "two positive numbers", value);
                None
            }
        }
    }
}

impl AttributeTransformer for BaseAttributeTransformer {
    fn transform(&self, _name: AttributeName, _value: &str) -> Option<AttributeValue> {
        None
    }
}
