//! Ordered element tree for cruise configuration documents
//!
//! Migration steps and the codec work on this tree rather than on markup:
//! every step is a plain function over [`Element`]s.
//!
//! ```
//! use cruise_xml::{parse, write_document};
//!
//! let root = parse(r#"<cruise schemaVersion="139"><server/></cruise>"#).unwrap();
//! assert_eq!(root.attr("schemaVersion"), Some("139"));
//! assert!(write_document(&root).contains("<server />"));
//! ```

pub mod error;
pub mod reader;
pub mod tree;
pub mod writer;

pub use error::{Error, Result};
pub use reader::{parse, parse_bytes};
pub use tree::{Element, Node};
pub use writer::{write_document, write_fragment};
