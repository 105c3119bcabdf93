//! # TTML Timeline: A Timed-Text Document Model with an Active-Element Index
//!
//! This crate interprets TTML (Timed Text Markup Language) subtitle documents. It turns an
//! already-tokenized XML tree into a typed element tree with validated attributes, resolves
//! `style` and `region` references between elements, and builds a sorted timeline that answers
//! "which elements are on screen at time *t*?" with a single binary search.
//!
//! The main entry points are:
//! - [`parse_ttml`]: Reads a TTML string with `quick-xml` and parses it in one call.
//! - [`Parser`]: Parses an [`XmlNode`] tree produced by [`read_xml`] or by any other XML facility.
//! - [`TimedText::active_elements`]: Queries the timeline built at the end of parsing.
//!
//! Attribute values go through an [`AttributeTransformer`]. Invalid values never abort parsing;
//! they are dropped and, if a [`DiagnosticSink`] is installed, reported as
//! `<name> attribute should be <expectation> but was: <value>`.
//!
//! ## Examples
//!
//! ```rust
//! use ttml_timeline::{parse_ttml, AttributeName, TimedTextOptions};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ttml_content = r#"
//!     <tt xmlns="http://www.w3.org/ns/ttml" xmlns:tts="http://www.w3.org/ns/ttml#styling">
//!       <head>
//!         <styling>
//!           <style xml:id="yellow" tts:color="yellow"/>
//!         </styling>
//!       </head>
//!       <body>
//!         <div>
//!           <p begin="00:00:02.000" end="00:00:05.760" style="yellow">Hello</p>
//!           <p begin="5.8s" end="7.72s">world</p>
//!         </div>
//!       </body>
//!     </tt>"#;
//!
//!     let document = parse_ttml(ttml_content, &TimedTextOptions::default())?;
//!
//!     let active = document.active_elements(3.0);
//!     assert_eq!(active.len(), 1);
//!     assert_eq!(document.text_content(active[0]), "Hello");
//!
//!     let color = document.attribute(active[0], AttributeName::Color);
//!     assert_eq!(color.as_ref().and_then(|c| c.as_str()), Some("yellow"));
//!
//!     assert!(document.active_elements(5.77).is_empty());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod source;
pub mod timeline;
pub mod timestamp;
pub mod transform;

pub use config::{FontMap, SizeClamp, TimedTextOptions, TimedTextOptionsBuilder};
pub use error::TimedTextError;
pub use model::{
    AttributeCategory, AttributeName, AttributeValue, ElementContent, ElementId, ElementKind,
    ElementSet, Length, LengthUnit, TextOutline, TimedText, TimedTextAttributes, TimedTextElement,
    TimingInterval,
};
pub use parser::{Parser, parse_ttml};
pub use source::{XmlElement, XmlNode, read_xml};
pub use timeline::{Breakpoint, Timeline};
pub use timestamp::Timestamp;
pub use transform::{
    AttributeDefaultsFactory, AttributeTransformer, BaseAttributeTransformer,
    CssAttributeTransformer, DiagnosticSink, SizeClampedTransformer,
};
