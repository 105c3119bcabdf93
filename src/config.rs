//! # 解析选项
//!
//! 宿主环境提供的配置：字体映射与像素字号限制。诊断回调不可序列化，
//! 通过 [`crate::Parser::with_diagnostic_sink`] 单独注入。

use std::collections::HashMap;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::TimedTextError;

/// 字体映射中的兜底条目名。
pub const UNKNOWN_FONT_FAMILY: &str = "unknown";

/// 逻辑字体名 → 具体字体列表。
///
/// 可以包含一个名为 `unknown` 的条目，用于所有未列出的字体。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FontMap(HashMap<String, Vec<String>>);

impl FontMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, family: impl Into<String>, fonts: Vec<String>) {
        self.0.insert(family.into(), fonts);
    }

    /// 查找逻辑字体对应的具体字体，找不到时退回 `unknown` 条目。
    #[must_use]
    pub fn resolve(&self, family: &str) -> Option<&[String]> {
        self.0
            .get(family)
            .or_else(|| self.0.get(UNKNOWN_FONT_FAMILY))
            .map(Vec::as_slice)
    }
}

impl From<HashMap<String, Vec<String>>> for FontMap {
    fn from(map: HashMap<String, Vec<String>>) -> Self {
        Self(map)
    }
}

/// 像素字号和行高的上下限。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeClamp {
    pub min_px: f64,
    pub max_px: f64,
}

/// TTML 解析选项
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Builder)]
#[builder(setter(into), default)]
#[serde(default)]
pub struct TimedTextOptions {
    /// `tts:fontFamily` 使用的字体映射。为 `None` 时保留文档中的字体名。
    pub font_map: Option<FontMap>,
    /// 设置后，以像素表示的字号高度和行高会被限制在该区间内。
    pub size_clamp: Option<SizeClamp>,
}

impl TimedTextOptions {
    /// 从 JSON 配置加载。
    ///
    /// # Errors
    ///
    /// JSON 格式不正确时返回 `TimedTextError::InvalidOptions`。
    pub fn from_json(json: &str) -> Result<Self, TimedTextError> {
        Ok(serde_json::from_str(json)?)
    }
}
