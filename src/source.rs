//! # XML 源文档
//!
//! 解析器并不直接处理 XML 文本，而是消费一棵已经分好词的通用节点树 [`XmlNode`]。
//! [`read_xml`] 用 `quick-xml` 从字符串构建这棵树；宿主也可以用其他方式自行构建。

use std::borrow::Cow;

use quick_xml::{Reader, events::Event};
use tracing::{trace, warn};

use crate::TimedTextError;

/// 通用 XML 节点。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    /// 整个文档，子节点按出现顺序排列。
    Document(Vec<XmlNode>),
    Element(XmlElement),
    Text(String),
    Comment(String),
}

impl XmlNode {
    /// 节点种类名，出现在错误消息中。
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Document(_) => "document",
            Self::Element(_) => "element",
            Self::Text(_) => "text",
            Self::Comment(_) => "comment",
        }
    }

    #[must_use]
    pub const fn as_element(&self) -> Option<&XmlElement> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }
}

/// 一个 XML 元素：限定名、属性（按出现顺序）和子节点。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// 去掉命名空间前缀后的名字。
    #[must_use]
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    fn push_text(&mut self, text: &str) {
        push_text(&mut self.children, text);
    }
}

/// `tts:color` → `color`，没有前缀时原样返回。
#[must_use]
pub fn local_name(qualified_name: &str) -> &str {
    qualified_name
        .rsplit_once(':')
        .map_or(qualified_name, |(_, local)| local)
}

/// 相邻的文本片段（被实体引用或 CDATA 切开的）合并为一个文本节点。
fn push_text(children: &mut Vec<XmlNode>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(XmlNode::Text(previous)) = children.last_mut() {
        previous.push_str(text);
    } else {
        children.push(XmlNode::Text(text.to_string()));
    }
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(num_str) = name.strip_prefix('#') {
        let (radix, code_point_str) = num_str
            .strip_prefix('x')
            .map_or((10, num_str), |stripped| (16, stripped));
        return u32::from_str_radix(code_point_str, radix)
            .ok()
            .and_then(char::from_u32);
    }
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => None,
    }
}

/// 从字符串构建 [`XmlNode::Document`]。
///
/// 文本和 CDATA 都成为文本节点，实体引用被解码进周围的文本，属性值会被反转义。
/// XML 声明、处理指令和 DOCTYPE 会被丢弃，文档级别的文本也会被丢弃。
///
/// # Errors
///
/// XML 格式不正确、属性语法错误或编码错误时返回对应的错误。
pub fn read_xml(content: &str) -> Result<XmlNode, TimedTextError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);
    reader.config_mut().expand_empty_elements = true;

    let mut document: Vec<XmlNode> = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf)?;
        match event {
            Event::Start(e) => {
                let decoder = reader.decoder();
                let mut element = XmlElement::new(decoder.decode(e.name().as_ref())?);
                for attr in e.attributes() {
                    let attr = attr?;
                    let key = decoder.decode(attr.key.as_ref())?.into_owned();
                    let value = attr.decode_and_unescape_value(decoder)?.into_owned();
                    element.attributes.push((key, value));
                }
                stack.push(element);
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut document, XmlNode::Element(element));
                }
            }
            Event::Text(e) => {
                if let Some(parent) = stack.last_mut() {
                    parent.push_text(&e.xml_content()?);
                }
            }
            Event::CData(e) => {
                if let Some(parent) = stack.last_mut() {
                    parent.push_text(&e.decode()?);
                }
            }
            Event::GeneralRef(e) => {
                let entity_name = String::from_utf8_lossy(e.as_ref());
                let decoded: Cow<'_, str> = decode_entity(&entity_name).map_or_else(
                    || {
                        warn!("[XmlSource] 无法解析的 XML 实体 '&{entity_name};'，按原样保留");
                        Cow::Owned(format!("&{entity_name};"))
                    },
                    |c| Cow::Owned(c.to_string()),
                );
                if let Some(parent) = stack.last_mut() {
                    parent.push_text(&decoded);
                }
            }
            Event::Comment(e) => {
                let comment = XmlNode::Comment(e.decode()?.into_owned());
                attach(&mut stack, &mut document, comment);
            }
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {
                trace!("[XmlSource] 丢弃声明或处理指令");
            }
            Event::Eof => break,
            // expand_empty_elements 已把空元素展开为 Start + End
            _ => {}
        }
        buf.clear();
    }

    // 未闭合的元素挂回到各自的父节点
    while let Some(element) = stack.pop() {
        warn!("[XmlSource] 元素 <{}> 没有闭合", element.name);
        attach(&mut stack, &mut document, XmlNode::Element(element));
    }

    Ok(XmlNode::Document(document))
}

fn attach(stack: &mut [XmlElement], document: &mut Vec<XmlNode>, node: XmlNode) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => document.push(node),
    }
}
