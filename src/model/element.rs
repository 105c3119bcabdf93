//! # 元素树节点
//!
//! 所有节点都存放在 [`crate::TimedText`] 持有的一个扁平数组里，
//! 节点之间通过 [`ElementId`] 互相引用。父节点引用只是一个下标，不拥有父节点。

use std::fmt;

use strum_macros::{AsRefStr, EnumString};

use super::attributes::TimedTextAttributes;

/// 元素在文档数组中的下标。文档顺序（先序遍历）与下标顺序一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) u32);

impl ElementId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 节点种类。除 `Text` 以外都与 TTML 的标签本地名一一对应。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum ElementKind {
    Tt,
    Head,
    Styling,
    Layout,
    Style,
    Region,
    Body,
    Div,
    P,
    Span,
    Br,
    #[strum(disabled)]
    Text,
}

impl ElementKind {
    /// 根据标签本地名查找节点种类，未知标签返回 `None`。
    #[must_use]
    pub fn from_tag(local_name: &str) -> Option<Self> {
        local_name.parse().ok()
    }

    #[must_use]
    pub const fn tag_name(self) -> &'static str {
        match self {
            Self::Tt => "tt",
            Self::Head => "head",
            Self::Styling => "styling",
            Self::Layout => "layout",
            Self::Style => "style",
            Self::Region => "region",
            Self::Body => "body",
            Self::Div => "div",
            Self::P => "p",
            Self::Span => "span",
            Self::Br => "br",
            Self::Text => "#text",
        }
    }

    /// 正文中可以带有计时和内容的元素。
    #[must_use]
    pub const fn is_content(self) -> bool {
        matches!(
            self,
            Self::Body | Self::Div | Self::P | Self::Span | Self::Br | Self::Text
        )
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_name())
    }
}

/// 节点承载的内容：文本叶子只有字符串，其余节点有属性和子节点。
#[derive(Debug, Clone, PartialEq)]
pub enum ElementContent {
    Node {
        attributes: TimedTextAttributes,
        children: Vec<ElementId>,
    },
    Text(String),
}

/// 元素树中的一个节点。
#[derive(Debug, Clone, PartialEq)]
pub struct TimedTextElement {
    id: ElementId,
    kind: ElementKind,
    parent: Option<ElementId>,
    content: ElementContent,
}

impl TimedTextElement {
    pub(crate) const fn new(
        id: ElementId,
        kind: ElementKind,
        parent: Option<ElementId>,
        attributes: TimedTextAttributes,
    ) -> Self {
        Self {
            id,
            kind,
            parent,
            content: ElementContent::Node {
                attributes,
                children: Vec::new(),
            },
        }
    }

    pub(crate) const fn new_text(id: ElementId, parent: ElementId, text: String) -> Self {
        Self {
            id,
            kind: ElementKind::Text,
            parent: Some(parent),
            content: ElementContent::Text(text),
        }
    }

    #[must_use]
    pub const fn id(&self) -> ElementId {
        self.id
    }

    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        self.kind
    }

    /// 父节点。只有根节点 `<tt>` 没有父节点。
    #[must_use]
    pub const fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    #[must_use]
    pub const fn content(&self) -> &ElementContent {
        &self.content
    }

    /// 按文档顺序排列的子节点。
    #[must_use]
    pub fn children(&self) -> &[ElementId] {
        match &self.content {
            ElementContent::Node { children, .. } => children,
            ElementContent::Text(_) => &[],
        }
    }

    /// 文本叶子的属性为 `None`。
    #[must_use]
    pub const fn attributes(&self) -> Option<&TimedTextAttributes> {
        match &self.content {
            ElementContent::Node { attributes, .. } => Some(attributes),
            ElementContent::Text(_) => None,
        }
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            ElementContent::Text(text) => Some(text),
            ElementContent::Node { .. } => None,
        }
    }

    pub(crate) fn push_child(&mut self, child: ElementId) {
        if let ElementContent::Node { children, .. } = &mut self.content {
            children.push(child);
        }
    }

    pub(crate) fn attributes_mut(&mut self) -> Option<&mut TimedTextAttributes> {
        match &mut self.content {
            ElementContent::Node { attributes, .. } => Some(attributes),
            ElementContent::Text(_) => None,
        }
    }
}
