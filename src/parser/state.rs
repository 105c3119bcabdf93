//! # 文档构建状态
//!
//! 深度优先遍历源文档时积累的元素数组、`xml:id` 索引和尚未解析的 id 引用。

use std::collections::HashMap;

use tracing::{trace, warn};

use super::timing::TimeContext;
use crate::{
    TimedTextError,
    model::{
        AttributeName, AttributeValue, ElementId, ElementKind, TimedTextAttributes,
        TimedTextElement,
    },
    source::{XmlElement, local_name},
    transform::AttributeTransformer,
};

/// 一个元素上尚未解析的 `style` 或 `region` 引用。
#[derive(Debug)]
struct PendingReferences {
    element: ElementId,
    attribute: AttributeName,
    idrefs: Vec<String>,
}

pub(super) struct DocumentBuilder<'a> {
    transformer: &'a dyn AttributeTransformer,
    pub(super) time_context: TimeContext,
    pub(super) elements: Vec<TimedTextElement>,
    pub(super) ids: HashMap<String, ElementId>,
    pending: Vec<PendingReferences>,
}

impl<'a> DocumentBuilder<'a> {
    pub(super) fn new(transformer: &'a dyn AttributeTransformer) -> Self {
        Self {
            transformer,
            time_context: TimeContext::default(),
            elements: Vec::new(),
            ids: HashMap::new(),
            pending: Vec::new(),
        }
    }

    fn next_id(&self) -> ElementId {
        ElementId(u32::try_from(self.elements.len()).unwrap_or(u32::MAX))
    }

    /// 创建一个元素节点并挂到父节点下。
    pub(super) fn push_element(
        &mut self,
        kind: ElementKind,
        parent: Option<ElementId>,
        source: &XmlElement,
    ) -> Result<ElementId, TimedTextError> {
        let id = self.next_id();
        let attributes = self.parse_attributes(id, kind, source)?;
        self.elements
            .push(TimedTextElement::new(id, kind, parent, attributes));
        self.attach(parent, id);
        Ok(id)
    }

    pub(super) fn push_text(&mut self, parent: ElementId, text: &str) {
        let id = self.next_id();
        self.elements
            .push(TimedTextElement::new_text(id, parent, text.to_string()));
        self.attach(Some(parent), id);
    }

    fn attach(&mut self, parent: Option<ElementId>, child: ElementId) {
        if let Some(parent) = parent.and_then(|p| self.elements.get_mut(p.index())) {
            parent.push_child(child);
        }
    }

    /// 转换元素自身的属性。未知属性直接丢弃；无效值由转换器报告后丢弃；
    /// 时间表达式无效时返回错误。
    fn parse_attributes(
        &mut self,
        id: ElementId,
        kind: ElementKind,
        source: &XmlElement,
    ) -> Result<TimedTextAttributes, TimedTextError> {
        let mut attributes = TimedTextAttributes::new();

        for (qualified_name, raw_value) in &source.attributes {
            if qualified_name == "xmlns" || qualified_name.starts_with("xmlns:") {
                continue;
            }
            let Some(name) = AttributeName::from_local_name(local_name(qualified_name)) else {
                trace!("[TtmlParser] 忽略 <{kind}> 上的未知属性 {qualified_name}");
                continue;
            };

            let value = match name {
                AttributeName::Style | AttributeName::Region => {
                    if name.applies_to().contains(&kind) {
                        self.defer_references(id, name, raw_value);
                    } else {
                        trace!("[TtmlParser] <{kind}> 上的 {name} 引用不会被解析");
                    }
                    continue;
                }
                AttributeName::Begin | AttributeName::End | AttributeName::Dur => Some(
                    AttributeValue::Time(self.time_context.parse_time_expression(raw_value)?),
                ),
                _ => self.transformer.transform(name, raw_value),
            };

            let Some(value) = value else {
                continue;
            };
            if name == AttributeName::Id {
                self.register_id(raw_value, id);
            }
            if attributes.set_attribute(name, value).is_err() {
                warn!("[TtmlParser] <{kind}> 上的属性 {name} 重复出现，保留第一个值");
            }
        }

        Ok(attributes)
    }

    fn register_id(&mut self, xml_id: &str, id: ElementId) {
        if self.ids.contains_key(xml_id) {
            warn!("[TtmlParser] 重复的 xml:id '{xml_id}'，保留第一个元素");
            return;
        }
        self.ids.insert(xml_id.to_string(), id);
    }

    fn defer_references(&mut self, element: ElementId, attribute: AttributeName, raw: &str) {
        let idrefs: Vec<String> = raw.split_whitespace().map(str::to_string).collect();
        if idrefs.is_empty() {
            return;
        }
        self.pending.push(PendingReferences {
            element,
            attribute,
            idrefs,
        });
    }

    /// 所有元素都构建完成之后，把 id 引用解析为元素。
    ///
    /// `style` 只能引用 `<style>`，`region` 只能引用 `<region>`；
    /// 找不到的 id 和种类不符的引用会被丢弃。
    pub(super) fn resolve_references(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let mut resolved_count = 0;

        for PendingReferences {
            element,
            attribute,
            idrefs,
        } in pending
        {
            let target_kind = match attribute {
                AttributeName::Region => ElementKind::Region,
                _ => ElementKind::Style,
            };

            let targets: Vec<ElementId> = idrefs
                .iter()
                .filter_map(|idref| {
                    let target = self.ids.get(idref).copied().filter(|target| {
                        self.elements
                            .get(target.index())
                            .is_some_and(|e| e.kind() == target_kind)
                    });
                    if target.is_none() {
                        warn!(
                            "[TtmlParser] 元素 {element} 的 {attribute} 引用了不存在的 <{target_kind}> '{idref}'"
                        );
                    }
                    target
                })
                .collect();

            if targets.is_empty() {
                continue;
            }
            resolved_count += targets.len();

            let Some(attributes) = self
                .elements
                .get_mut(element.index())
                .and_then(TimedTextElement::attributes_mut)
            else {
                continue;
            };
            if attributes
                .set_attribute(attribute, AttributeValue::References(targets))
                .is_err()
            {
                warn!("[TtmlParser] 元素 {element} 的 {attribute} 引用重复出现，保留第一个");
            }
        }

        resolved_count
    }
}
