//! # TTML 解析器
//!
//! 把通用的 [`XmlNode`] 树解释为 [`TimedText`] 元素树：
//!
//! 1. 校验输入是一个文档，并且唯一的根元素是 `<tt>`；
//! 2. 深度优先构建元素，转换每个元素自己的属性；
//! 3. 全部元素构建完成后，解析 `style` / `region` 的 id 引用；
//! 4. 生成默认属性集，并构建激活元素时间轴。

mod state;
mod timing;

use std::{fmt, sync::Arc};

use tracing::{debug, trace, warn};

use self::{state::DocumentBuilder, timing::TimeContext};
use crate::{
    TimedTextError,
    config::{SizeClamp, TimedTextOptions},
    model::{AttributeName, ElementId, ElementKind, TimedText},
    source::{XmlElement, XmlNode, local_name, read_xml},
    transform::{
        AttributeDefaultsFactory, AttributeTransformer, CssAttributeTransformer, DiagnosticSink,
        SizeClampedTransformer,
    },
};

const ROOT_TAG: &str = "tt";

/// TTML 解析器。
///
/// 解析器本身不保存任何文档状态，同一个实例可以重复使用。
#[derive(Clone, Default)]
pub struct Parser {
    options: TimedTextOptions,
    reporter: Option<DiagnosticSink>,
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("options", &self.options)
            .field("has_reporter", &self.reporter.is_some())
            .finish()
    }
}

impl Parser {
    #[must_use]
    pub fn new(options: TimedTextOptions) -> Self {
        Self {
            options,
            reporter: None,
        }
    }

    /// 设置接收无效属性值诊断的回调。
    #[must_use]
    pub fn with_diagnostic_sink(mut self, reporter: DiagnosticSink) -> Self {
        self.reporter = Some(reporter);
        self
    }

    #[must_use]
    pub const fn options(&self) -> &TimedTextOptions {
        &self.options
    }

    /// 按配置组装属性转换器。
    fn transformer(&self) -> Box<dyn AttributeTransformer> {
        let mut css = CssAttributeTransformer::new();
        if let Some(reporter) = &self.reporter {
            css = css.with_reporter(Arc::clone(reporter));
        }
        if let Some(font_map) = &self.options.font_map {
            css = css.with_font_map(font_map.clone());
        }

        match self.options.size_clamp {
            Some(SizeClamp { min_px, max_px }) => {
                Box::new(SizeClampedTransformer::new(css, min_px, max_px))
            }
            None => Box::new(css),
        }
    }

    /// 解析一个源文档。
    ///
    /// # Errors
    ///
    /// - `TimedTextError::MissingDocument`：`document` 为 `None`；
    /// - `TimedTextError::NotXmlDocument`：传入的不是文档节点；
    /// - `TimedTextError::WrongRoot`：文档没有唯一的根元素，或根元素不是 `<tt>`；
    /// - `TimedTextError::InvalidTimestamp`：某个 `begin` / `end` / `dur` 无法解析。
    pub fn parse(&self, document: Option<&XmlNode>) -> Result<TimedText, TimedTextError> {
        let document = document.ok_or(TimedTextError::MissingDocument)?;
        let XmlNode::Document(nodes) = document else {
            return Err(TimedTextError::NotXmlDocument {
                kind: document.kind_name(),
            });
        };

        let root = find_root(nodes)?;
        debug!("[TtmlParser] 找到根元素 <{}>", root.name);

        let transformer = self.transformer();
        let mut builder = DocumentBuilder::new(transformer.as_ref());
        build_root(&mut builder, root)?;

        let resolved = builder.resolve_references();
        debug!("[TtmlParser] 已解析 {resolved} 个 style/region 引用");

        let initial_attributes = {
            let mut factory = AttributeDefaultsFactory::new(transformer.as_ref());
            for (qualified_name, value) in &root.attributes {
                if let Some(name) = AttributeName::from_local_name(local_name(qualified_name))
                    && name.initial_value().is_some()
                {
                    factory.set_default(name, value);
                }
            }
            factory.attributes()
        };

        let mut timed_text =
            TimedText::from_parts(builder.elements, builder.ids, initial_attributes);
        timed_text.build_timeline();
        debug!(
            "[TtmlParser] 解析完成：{} 个元素，{} 个时间轴断点",
            timed_text.elements().count(),
            timed_text.timeline().breakpoints().len()
        );
        Ok(timed_text)
    }
}

/// 文档中必须恰好有一个元素节点，并且它的本地名是 `tt`。
fn find_root(nodes: &[XmlNode]) -> Result<&XmlElement, TimedTextError> {
    let mut elements = nodes.iter().filter_map(XmlNode::as_element);
    let (Some(root), None) = (elements.next(), elements.next()) else {
        return Err(TimedTextError::WrongRoot(None));
    };
    if root.local_name() != ROOT_TAG {
        return Err(TimedTextError::WrongRoot(Some(root.name.clone())));
    }
    Ok(root)
}

fn build_root(builder: &mut DocumentBuilder<'_>, root: &XmlElement) -> Result<(), TimedTextError> {
    let root_id = builder.push_element(ElementKind::Tt, None, root)?;
    if let Some(attributes) = builder.elements[root_id.index()].attributes() {
        builder.time_context = TimeContext::from_root(attributes);
    }

    let mut seen_head = false;
    let mut seen_body = false;
    for child in root.children.iter().filter_map(XmlNode::as_element) {
        match ElementKind::from_tag(child.local_name()) {
            Some(ElementKind::Head) if !seen_head => {
                seen_head = true;
                build_head(builder, root_id, child)?;
            }
            Some(ElementKind::Body) if !seen_body => {
                seen_body = true;
                let body = builder.push_element(ElementKind::Body, Some(root_id), child)?;
                build_mixed_content(builder, body, ElementKind::Body, child)?;
                debug!("[TtmlParser] 已构建 <body>");
            }
            _ => trace!("[TtmlParser] 跳过 <tt> 下的 <{}>", child.name),
        }
    }
    Ok(())
}

/// `<head>` 只保留 `<styling>` 和 `<layout>`，两者都没有时仍然构建一个空的 `<head>`。
fn build_head(
    builder: &mut DocumentBuilder<'_>,
    parent: ElementId,
    source: &XmlElement,
) -> Result<(), TimedTextError> {
    let head = builder.push_element(ElementKind::Head, Some(parent), source)?;

    for child in source.children.iter().filter_map(XmlNode::as_element) {
        let (container, item) = match ElementKind::from_tag(child.local_name()) {
            Some(ElementKind::Styling) => (ElementKind::Styling, ElementKind::Style),
            Some(ElementKind::Layout) => (ElementKind::Layout, ElementKind::Region),
            _ => {
                trace!("[TtmlParser] 跳过 <head> 下的 <{}>", child.name);
                continue;
            }
        };

        let container_id = builder.push_element(container, Some(head), child)?;
        for grandchild in child.children.iter().filter_map(XmlNode::as_element) {
            if ElementKind::from_tag(grandchild.local_name()) == Some(item) {
                builder.push_element(item, Some(container_id), grandchild)?;
            } else {
                trace!("[TtmlParser] 跳过 <{container}> 下的 <{}>", grandchild.name);
            }
        }
    }

    debug!("[TtmlParser] 已构建 <head>");
    Ok(())
}

/// `body`、`div`、`p`、`span` 共用的子节点规则：
/// 文本成为文本叶子，`div` / `p` / `span` 递归，`br` 成为叶子，其他标签跳过。
///
/// `body` 和 `div` 中只含空白的文本会被丢弃。
fn build_mixed_content(
    builder: &mut DocumentBuilder<'_>,
    parent: ElementId,
    parent_kind: ElementKind,
    source: &XmlElement,
) -> Result<(), TimedTextError> {
    for child in &source.children {
        match child {
            XmlNode::Text(text) => {
                let structural = matches!(parent_kind, ElementKind::Body | ElementKind::Div);
                if structural && text.trim().is_empty() {
                    continue;
                }
                builder.push_text(parent, text);
            }
            XmlNode::Element(element) => match ElementKind::from_tag(element.local_name()) {
                Some(kind @ (ElementKind::Div | ElementKind::P | ElementKind::Span)) => {
                    let id = builder.push_element(kind, Some(parent), element)?;
                    build_mixed_content(builder, id, kind, element)?;
                }
                Some(ElementKind::Br) => {
                    builder.push_element(ElementKind::Br, Some(parent), element)?;
                }
                _ => trace!("[TtmlParser] 跳过 <{parent_kind}> 下的 <{}>", element.name),
            },
            XmlNode::Comment(_) | XmlNode::Document(_) => {}
        }
    }
    Ok(())
}

/// 从字符串解析 TTML 文档，等价于 [`read_xml`] 加上 [`Parser::parse`]。
///
/// # Errors
///
/// XML 格式错误，或者 [`Parser::parse`] 返回的任何错误。
/// 属性语法错误意味着拿不到完整的根元素，报告为 `WrongRoot(None)`。
pub fn parse_ttml(content: &str, options: &TimedTextOptions) -> Result<TimedText, TimedTextError> {
    let document = read_xml(content).map_err(|err| match err {
        TimedTextError::Attribute(attr_err) => {
            warn!("[TtmlParser] 属性语法错误，无法确定根元素: {attr_err}");
            TimedTextError::WrongRoot(None)
        }
        other => other,
    })?;
    Parser::new(options.clone()).parse(Some(&document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttributeValue;
    use crate::transform::test_utils::collecting_sink;

    fn parse(content: &str) -> Result<TimedText, TimedTextError> {
        parse_ttml(content, &TimedTextOptions::default())
    }

    #[test]
    fn test_malformed_attribute_syntax_has_no_root() {
        for content in ["<tt foo=bar/>", "<tt foo=bar><body/></tt>"] {
            let err = parse(content).unwrap_err();
            assert!(matches!(err, TimedTextError::WrongRoot(None)), "{content}");
            assert_eq!(
                err.to_string(),
                "TTML document root element is not <tt> - it was: <null>"
            );
        }
    }

    #[test]
    fn test_input_validation_errors() {
        let parser = Parser::default();

        let err = parser.parse(None).unwrap_err();
        assert_eq!(err.to_string(), "TTML document is missing");

        let element = XmlNode::Element(XmlElement::new("tt"));
        let err = parser.parse(Some(&element)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TTML document is not a valid XML document (type=element)"
        );

        let err = parse("<gibberish><body/></gibberish>").unwrap_err();
        assert_eq!(
            err.to_string(),
            "TTML document root element is not <tt> - it was: <gibberish>"
        );

        let err = parser.parse(Some(&XmlNode::Document(vec![]))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TTML document root element is not <tt> - it was: <null>"
        );
    }

    #[test]
    fn test_head_and_body_are_optional() {
        let doc = parse("<tt/>").unwrap();
        assert!(doc.head().is_none());
        assert!(doc.body().is_none());
        assert!(doc.active_elements(1.0).is_empty());

        let doc = parse("<tt><head><metadata/></head></tt>").unwrap();
        let head = doc.head().unwrap();
        assert!(doc.children(head).is_empty());
        assert!(doc.body().is_none());
    }

    #[test]
    fn test_mixed_content_rules() {
        let doc = parse(
            "<tt><body>\n  <div>\n    <p>Hello <span>big</span><br/> <unknown>x</unknown>world</p>\n  </div>\n</body></tt>",
        )
        .unwrap();

        let body = doc.body().unwrap();
        let [div] = doc.children(body) else {
            panic!("body 应该只有一个 div");
        };
        let [p] = doc.children(*div) else {
            panic!("div 应该只有一个 p");
        };
        let kinds: Vec<ElementKind> = doc
            .children(*p)
            .iter()
            .map(|id| doc.element(*id).unwrap().kind())
            .collect();
        assert_eq!(
            kinds,
            vec![
                ElementKind::Text,
                ElementKind::Span,
                ElementKind::Br,
                ElementKind::Text,
                ElementKind::Text,
            ]
        );
        assert_eq!(doc.text_content(*p), "Hello big\n world");
        assert_eq!(doc.parent(*p), Some(*div));
    }

    #[test]
    fn test_invalid_attribute_values_are_reported_not_fatal() {
        let (sink, messages) = collecting_sink();
        let parser = Parser::default().with_diagnostic_sink(sink);
        let document = read_xml(
            r#"<tt xmlns:tts="http://www.w3.org/ns/ttml#styling"><body><p tts:fontWeight="heavy" tts:color="red" foo="bar">x</p></body></tt>"#,
        )
        .unwrap();

        let doc = parser.parse(Some(&document)).unwrap();
        let p = doc.elements_of_kind(ElementKind::P).next().unwrap().id();
        assert_eq!(doc.attribute(p, AttributeName::FontWeight), None);
        assert_eq!(
            doc.attribute(p, AttributeName::Color),
            Some(AttributeValue::Color("red".into()))
        );
        assert_eq!(
            *messages.lock().unwrap(),
            vec!["fontWeight attribute should be one of [normal, bold] but was: heavy"]
        );
    }

    #[test]
    fn test_invalid_timestamp_is_fatal() {
        let err = parse(r#"<tt><body><p begin="soon">x</p></body></tt>"#).unwrap_err();
        assert_eq!(err.to_string(), "Invalid timestamp: soon");
    }

    #[test]
    fn test_initial_attributes_follow_root_parameters() {
        let doc = parse(r#"<tt ttp:cellResolution="40 20" ttp:frameRate="0"/>"#).unwrap();
        let initial = doc.initial_attributes();
        assert_eq!(
            initial.own(AttributeName::CellResolution),
            Some(&AttributeValue::CellResolution {
                columns: 40,
                rows: 20
            })
        );
        assert_eq!(
            initial.own(AttributeName::FrameRate),
            Some(&AttributeValue::Integer(30))
        );
        assert_eq!(
            initial.own(AttributeName::Color),
            Some(&AttributeValue::Color("white".into()))
        );
    }
}
