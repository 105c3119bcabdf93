//! # 文档根
//!
//! [`TimedText`] 拥有整棵元素树（一个按文档顺序排列的扁平数组）、
//! `xml:id` 索引、默认属性集和激活元素时间轴。

use std::collections::HashMap;

use tracing::{debug, warn};

use super::{
    attributes::{AttributeName, AttributeValue, TimedTextAttributes, TimingInterval},
    element::{ElementId, ElementKind, TimedTextElement},
};
use crate::timeline::Timeline;

/// 解析完成的 TTML 文档。
///
/// 文档构建完成后不可修改，唯一的例外是 [`TimedText::destroy`]。
#[derive(Debug, Clone, Default)]
pub struct TimedText {
    elements: Vec<TimedTextElement>,
    head: Option<ElementId>,
    body: Option<ElementId>,
    ids: HashMap<String, ElementId>,
    initial_attributes: TimedTextAttributes,
    timeline: Timeline,
}

impl TimedText {
    pub(crate) fn from_parts(
        elements: Vec<TimedTextElement>,
        ids: HashMap<String, ElementId>,
        initial_attributes: TimedTextAttributes,
    ) -> Self {
        let find_child = |kind| {
            elements
                .first()
                .and_then(|root| {
                    root.children()
                        .iter()
                        .find(|id| elements[id.index()].kind() == kind)
                })
                .copied()
        };
        let head = find_child(ElementKind::Head);
        let body = find_child(ElementKind::Body);

        Self {
            head,
            body,
            elements,
            ids,
            initial_attributes,
            timeline: Timeline::default(),
        }
    }

    /// 根元素 `<tt>`。文档被销毁后返回 `None`。
    #[must_use]
    pub fn root(&self) -> Option<&TimedTextElement> {
        self.elements.first()
    }

    /// `<head>` 元素。源文档中没有 `<head>` 时为 `None`。
    #[must_use]
    pub const fn head(&self) -> Option<ElementId> {
        self.head
    }

    /// `<body>` 元素。源文档中没有 `<body>` 时为 `None`。
    #[must_use]
    pub const fn body(&self) -> Option<ElementId> {
        self.body
    }

    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&TimedTextElement> {
        self.elements.get(id.index())
    }

    #[must_use]
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.element(id).and_then(TimedTextElement::parent)
    }

    #[must_use]
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.element(id)
            .map(TimedTextElement::children)
            .unwrap_or_default()
    }

    /// 按文档顺序遍历所有元素。
    pub fn elements(&self) -> impl Iterator<Item = &TimedTextElement> {
        self.elements.iter()
    }

    pub fn elements_of_kind(&self, kind: ElementKind) -> impl Iterator<Item = &TimedTextElement> {
        self.elements.iter().filter(move |e| e.kind() == kind)
    }

    /// 按 `xml:id` 查找元素。
    #[must_use]
    pub fn element_by_xml_id(&self, xml_id: &str) -> Option<ElementId> {
        self.ids.get(xml_id).copied()
    }

    /// 以 `id` 为根的子树，先序遍历，包含 `id` 本身。
    #[must_use]
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut result = Vec::new();
        if self.element(id).is_none() {
            return result;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            result.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        result
    }

    /// 拼接子树中的文本，`<br>` 转为换行。
    #[must_use]
    pub fn text_content(&self, id: ElementId) -> String {
        let mut text = String::new();
        for descendant in self.descendants(id) {
            let Some(element) = self.element(descendant) else {
                continue;
            };
            match element.kind() {
                ElementKind::Text => text.push_str(element.text().unwrap_or_default()),
                ElementKind::Br => text.push('\n'),
                _ => {}
            }
        }
        text
    }

    /// 格式规定的默认属性集，已经过属性转换器转换。
    #[must_use]
    pub const fn initial_attributes(&self) -> &TimedTextAttributes {
        &self.initial_attributes
    }

    /// 读取元素的属性值。
    ///
    /// 查找顺序：
    /// 1. 元素自身的值；
    /// 2. 对样式属性，按顺序查找 `style` 引用的 `<style>` 元素（递归），第一个命中的值胜出；
    /// 3. 文档参数类属性的格式默认值；
    /// 4. 否则为 `None`。
    ///
    /// 不会沿祖先链查找可继承属性。
    #[must_use]
    pub fn attribute(&self, id: ElementId, name: AttributeName) -> Option<AttributeValue> {
        let mut path = Vec::new();
        self.resolve_attribute(id, name, &mut path)
    }

    /// `path` 只记录当前这条引用链，同一个样式被兄弟分支重复引用不算循环。
    fn resolve_attribute(
        &self,
        id: ElementId,
        name: AttributeName,
        path: &mut Vec<ElementId>,
    ) -> Option<AttributeValue> {
        if path.contains(&id) {
            warn!("[TimedText] 样式引用存在循环，在元素 {id} 处停止查找 {name}");
            return None;
        }

        let attributes = self.element(id)?.attributes()?;
        if let Some(value) = attributes.own(name) {
            return Some(value.clone());
        }

        if name.is_style_settable() {
            path.push(id);
            let referenced = attributes
                .style_references()
                .iter()
                .find_map(|&style_id| self.resolve_attribute(style_id, name, path));
            path.pop();
            if referenced.is_some() {
                return referenced;
            }
        }

        parameter_default(attributes, name)
    }

    #[must_use]
    pub fn timing_interval(&self, id: ElementId) -> Option<TimingInterval> {
        self.element(id)?.attributes()?.timing_interval()
    }

    /// 构建激活元素时间轴。
    ///
    /// 解析器会在所有引用解析完成之后调用一次；重复调用会用当前的树重新构建。
    pub fn build_timeline(&mut self) {
        let intervals: Vec<(ElementId, TimingInterval)> = self
            .body
            .map(|body| self.descendants(body))
            .unwrap_or_default()
            .into_iter()
            .filter_map(|id| self.timing_interval(id).map(|interval| (id, interval)))
            .collect();
        self.timeline = Timeline::build(&intervals);
    }

    #[must_use]
    pub const fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// 查询某一时刻（秒）激活的元素，按文档顺序返回。永远不会返回 `None`，最多是空列表。
    #[must_use]
    pub fn active_elements(&self, time_seconds: f64) -> Vec<ElementId> {
        self.timeline.active_elements(time_seconds)
    }

    /// 释放整棵树和时间轴。之后的所有查询都返回空结果。
    pub fn destroy(&mut self) {
        debug!("[TimedText] 销毁文档，释放 {} 个元素", self.elements.len());
        self.elements = Vec::new();
        self.ids = HashMap::new();
        self.head = None;
        self.body = None;
        self.initial_attributes = TimedTextAttributes::default();
        self.timeline.clear();
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.elements.is_empty()
    }
}

/// 文档参数类属性的格式默认值。`tickRate` 在设置了 `frameRate` 时取
/// `frameRate × subFrameRate`。
pub(crate) fn parameter_default(
    attributes: &TimedTextAttributes,
    name: AttributeName,
) -> Option<AttributeValue> {
    let keyword = |s: &str| Some(AttributeValue::Keyword(s.to_string()));
    match name {
        AttributeName::CellResolution => Some(AttributeValue::CellResolution {
            columns: 32,
            rows: 15,
        }),
        AttributeName::ClockMode => keyword("utc"),
        AttributeName::DropMode => keyword("nonDrop"),
        AttributeName::FrameRate => Some(AttributeValue::Integer(30)),
        AttributeName::FrameRateMultiplier | AttributeName::PixelAspectRatio => {
            Some(AttributeValue::Ratio {
                numerator: 1,
                denominator: 1,
            })
        }
        AttributeName::MarkerMode => keyword("discontinuous"),
        AttributeName::SubFrameRate => Some(AttributeValue::Integer(1)),
        AttributeName::TickRate => {
            let frame_rate = attributes
                .own(AttributeName::FrameRate)
                .and_then(AttributeValue::as_integer);
            let tick_rate = frame_rate.map_or(1, |frame_rate| {
                let sub_frame_rate = attributes
                    .own(AttributeName::SubFrameRate)
                    .and_then(AttributeValue::as_integer)
                    .unwrap_or(1);
                frame_rate * sub_frame_rate
            });
            Some(AttributeValue::Integer(tick_rate))
        }
        AttributeName::TimeBase => keyword("media"),
        AttributeName::TimeContainer => keyword("par"),
        _ => None,
    }
}

/// 自身的值优先，否则取参数默认值。
pub(crate) fn own_or_parameter_default(
    attributes: &TimedTextAttributes,
    name: AttributeName,
) -> Option<AttributeValue> {
    attributes
        .own(name)
        .cloned()
        .or_else(|| parameter_default(attributes, name))
}
