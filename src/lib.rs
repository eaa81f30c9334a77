//! Find, classify, edit, and rewrite `<ref>` citations in wikitext.
//!
//! A scan turns wikitext into [`Reference`]s: each `<ref>...</ref>` block,
//! classified as a citation template from the [`Catalog`] or as raw text,
//! with the self-closing `<ref name="..."/>` tags that reuse it attached as
//! [`Citation`]s. An [`Editor`] drives scans, edit forms, and rewrites over
//! any [`TextBuffer`].

pub mod buffer;
pub mod catalog;
pub mod config;
pub mod editor;
pub mod error;
pub mod form;
pub mod parser;
pub mod reference;
pub mod types;

pub use buffer::{MemoryBuffer, TextBuffer};
pub use catalog::Catalog;
pub use editor::Editor;
pub use error::Error;
pub use form::EditForm;
pub use parser::{ReferenceParser, ScanOutcome, TemplatePattern, parse};
pub use types::{Citation, Params, Reference, ReferenceKind, TemplateReference, TextRange};
