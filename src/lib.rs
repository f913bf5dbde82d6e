//! # imgcomment
//!
//! Images in documentation comments.
//!
//! A documentation comment can reference an image from its `<summary>`:
//!
//! ```xml
//! <summary>
//!   Help icon.
//!   <img src="icons/help.png" max="64px"/>
//! </summary>
//! ```
//!
//! This crate finds that tag, removes it from the text a generic doc
//! renderer sees, sniffs the image's pixel size from its header bytes,
//! fits it into the requested bounds and produces an `<img>` block that
//! embeds the file (or links to it, for large files).
//!
//! ## Features
//!
//! - Dimension sniffing for PNG, GIF, BMP, JPEG and SVG without decoding
//! - Aspect-preserving sizing under `min`/`max` edge, width and height bounds
//! - `data:` URIs for small files, `file:` URIs for large ones, memoized
//! - Host-agnostic presenter behind small traits
//!
//! ## Quick Start
//!
//! ```no_run
//! use imgcomment::presenter::{CommentSource, DocRenderer, ImagePresenter, PresenterConfig};
//!
//! struct Comment(&'static str);
//!
//! impl CommentSource for Comment {
//!     fn symbol_doc(&self) -> Option<String> {
//!         Some(self.0.to_string())
//!     }
//! }
//!
//! struct Plain;
//!
//! impl DocRenderer for Plain {
//!     fn render(&self, fragment: &str) -> String {
//!         format!("<pre>{fragment}</pre>")
//!     }
//! }
//!
//! let presenter = ImagePresenter::new(PresenterConfig::default());
//! let roots = presenter.solution_roots("/path/to/solution");
//! let doc = Comment(r#"<summary>Help <img src="help.png"/></summary>"#);
//! let html = presenter.present(&doc, &Plain, &roots).unwrap();
//! ```

pub mod error;
pub mod media;
pub mod presenter;
pub mod probe;
pub mod sizing;
pub mod source;
pub mod tag;
pub(crate) mod util;

pub use error::{Error, Result};
pub use presenter::{ImagePresenter, PresenterConfig};
pub use probe::{ImageSize, probe, probe_bytes, probe_path};
pub use sizing::{ResolvedSize, SizeConstraints, resolve};
pub use source::{SourceCache, build_src};
pub use tag::{Extraction, ImageTagInfo, extract};
