use strum::IntoEnumIterator;
use tracing::trace;

use super::AttributeTransformer;
use crate::model::{AttributeName, TimedTextAttributes};

/// 生成格式规定的初始属性集合，所有值都经过给定的转换器。
///
/// 调用方可以先用 [`set_default`](Self::set_default) 覆盖个别属性，
/// 其余属性在第一次调用 [`attributes`](Self::attributes) 时按
/// [`AttributeName::initial_value`] 填充。
pub struct AttributeDefaultsFactory<'a> {
    transformer: &'a dyn AttributeTransformer,
    attributes: TimedTextAttributes,
}

impl<'a> AttributeDefaultsFactory<'a> {
    #[must_use]
    pub fn new(transformer: &'a dyn AttributeTransformer) -> Self {
        Self {
            transformer,
            attributes: TimedTextAttributes::new(),
        }
    }

    /// 覆盖一个默认值。属性已经设置过，或转换器拒绝该值时不生效并返回 `false`。
    pub fn set_default(&mut self, name: AttributeName, value: &str) -> bool {
        if self.attributes.contains(name) {
            return false;
        }
        match self.transformer.transform(name, value) {
            Some(transformed) => self.attributes.set_attribute(name, transformed).is_ok(),
            None => {
                trace!("[AttributeDefaults] 丢弃无效的默认值 {name}={value}");
                false
            }
        }
    }

    /// 补齐尚未设置的默认值，然后返回一份独立的拷贝。
    pub fn attributes(&mut self) -> TimedTextAttributes {
        for name in AttributeName::iter() {
            if self.attributes.contains(name) {
                continue;
            }
            let Some(initial) = name.initial_value() else {
                continue;
            };
            if let Some(value) = self.transformer.transform(name, initial) {
                // 上面已经检查过 contains，这里不会失败
                let _ = self.attributes.set_attribute(name, value);
            }
        }
        self.attributes.clone()
    }
}
