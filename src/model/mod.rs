//! # 文档模型
//!
//! 元素树、属性表以及文档根。

mod attributes;
mod document;
mod element;
mod element_set;

pub use attributes::{
    AttributeCategory, AttributeName, AttributeValue, Length, LengthUnit, TextOutline,
    TimedTextAttributes, TimingInterval,
};
pub use document::TimedText;
pub(crate) use document::own_or_parameter_default;
pub use element::{ElementContent, ElementId, ElementKind, TimedTextElement};
pub use element_set::ElementSet;
