use quick_xml::{
    Error as QuickXmlErrorMain, encoding::EncodingError,
    events::attributes::AttrError as QuickXmlAttrError,
};
use thiserror::Error;

use crate::model::AttributeName;

/// 解析和查询 TTML 文档时可能发生的错误。
///
/// 结构性错误（文档缺失、根元素错误、时间戳格式错误）会直接终止解析；
/// 单个属性值无效不会产生错误，只会通过诊断回调报告。
#[derive(Error, Debug)]
pub enum TimedTextError {
    /// 没有提供任何文档。
    #[error("TTML document is missing")]
    MissingDocument,
    /// 提供的节点不是一个文档节点。
    #[error("TTML document is not a valid XML document (type={kind})")]
    NotXmlDocument {
        /// 实际收到的节点类型。
        kind: &'static str,
    },
    /// 文档的根元素不是 `<tt>`。`None` 表示文档没有可用的根元素。
    #[error(
        "TTML document root element is not <tt> - it was: <{}>",
        .0.as_deref().unwrap_or("null")
    )]
    WrongRoot(Option<String>),
    /// 无效的时间表达式。
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// 同一个元素上的同一个属性被写入了两次。
    #[error("属性 {0} 已经设置过，不能重复设置")]
    AttributeAlreadySet(AttributeName),
    /// XML 读取错误，来自 `quick-xml` 库。
    #[error("XML 错误: {0}")]
    Xml(#[from] QuickXmlErrorMain),
    /// XML 属性解析错误，来自 `quick-xml` 库。
    #[error("XML 属性错误: {0}")]
    Attribute(#[from] QuickXmlAttrError),
    /// XML 文本编码或解码错误。
    #[error("文本编码或解码错误: {0}")]
    Encoding(#[from] EncodingError),
    /// 解析选项的 JSON 内容无效。
    #[error("解析选项无效: {0}")]
    InvalidOptions(#[from] serde_json::Error),
}

impl From<TimedTextError> for std::io::Error {
    fn from(err: TimedTextError) -> Self {
        Self::other(err)
    }
}
