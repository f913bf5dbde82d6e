//! Quick-doc presentation with an embedded image.
//!
//! The host supplies documentation comments ([`CommentSource`]), renders
//! comment XML to HTML ([`DocRenderer`]) and names the directories image
//! paths are relative to ([`AssetRoots`]). [`ImagePresenter`] strips the
//! image from the comment, lets the host render the rest, and appends a
//! sized `<img>` block to the result.
//!
//! Image problems never cost the user their documentation: a missing
//! file, unreadable bytes or an encoding failure all fall back to the
//! host's image-less rendering.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::probe::probe_path;
use crate::sizing::{DEFAULT_TARGET_EDGE, ResolvedSize, resolve};
use crate::source::{DEFAULT_INLINE_THRESHOLD, SourceCache};
use crate::tag::{ImageTagInfo, extract, has_image};

/// Subdirectory of the solution root searched for images.
pub const DEFAULT_ASSET_DIR: &str = "Assets";

/// Type whose constants carry image comments by default.
pub const DEFAULT_TARGET_TYPE: &str = "EditorIcons";

/// Source of raw documentation comment XML for one symbol.
///
/// Lookups are tried in order: the symbol, its declaration in the current
/// file, then the containing type member.
pub trait CommentSource {
    fn symbol_doc(&self) -> Option<String>;

    fn declaration_doc(&self) -> Option<String> {
        None
    }

    fn member_doc(&self) -> Option<String> {
        None
    }
}

/// The host's documentation renderer.
pub trait DocRenderer {
    /// Render a comment fragment to HTML.
    fn render(&self, fragment: &str) -> String;
}

/// Directories an image `src` may be relative to, in priority order.
pub trait AssetRoots {
    fn roots(&self) -> Vec<PathBuf>;
}

/// Receiver for the final HTML.
pub trait RenderSink {
    fn submit(&mut self, html: String);
}

impl RenderSink for Vec<String> {
    fn submit(&mut self, html: String) {
        self.push(html);
    }
}

/// Solution directory, then its asset subdirectory.
#[derive(Debug, Clone)]
pub struct SolutionRoots {
    root: PathBuf,
    asset_dir: String,
}

impl SolutionRoots {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            asset_dir: DEFAULT_ASSET_DIR.to_string(),
        }
    }

    pub fn with_asset_dir(mut self, dir: impl Into<String>) -> Self {
        self.asset_dir = dir.into();
        self
    }
}

impl AssetRoots for SolutionRoots {
    fn roots(&self) -> Vec<PathBuf> {
        vec![self.root.clone(), self.root.join(&self.asset_dir)]
    }
}

/// What the host knows about the symbol under the caret.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolInfo {
    pub name: String,
    pub is_constant: bool,
    pub is_string: bool,
    /// Short name of the declaring type.
    pub containing_type: Option<String>,
}

/// Presenter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenterConfig {
    /// Edge used for images whose size cannot be sniffed.
    pub default_target_edge: u32,
    pub allow_upscale_by_default: bool,
    /// Largest file, in bytes, embedded as a `data:` URI.
    pub inline_threshold: u64,
    pub asset_dir: String,
    /// Only string constants of this type are handled; `None` handles
    /// every symbol.
    pub target_type: Option<String>,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            default_target_edge: DEFAULT_TARGET_EDGE,
            allow_upscale_by_default: false,
            inline_threshold: DEFAULT_INLINE_THRESHOLD,
            asset_dir: DEFAULT_ASSET_DIR.to_string(),
            target_type: Some(DEFAULT_TARGET_TYPE.to_string()),
        }
    }
}

impl PresenterConfig {
    pub fn with_default_target_edge(mut self, edge: u32) -> Self {
        self.default_target_edge = edge;
        self
    }

    pub fn with_upscale_by_default(mut self, allow: bool) -> Self {
        self.allow_upscale_by_default = allow;
        self
    }

    pub fn with_inline_threshold(mut self, bytes: u64) -> Self {
        self.inline_threshold = bytes;
        self
    }

    pub fn with_asset_dir(mut self, dir: impl Into<String>) -> Self {
        self.asset_dir = dir.into();
        self
    }

    pub fn with_target_type(mut self, ty: Option<String>) -> Self {
        self.target_type = ty;
        self
    }
}

/// Renders documentation comments, appending their `<summary>` image.
#[derive(Debug)]
pub struct ImagePresenter<'c> {
    config: PresenterConfig,
    cache: &'c SourceCache,
}

impl ImagePresenter<'static> {
    /// A presenter backed by the process-wide source cache.
    pub fn new(config: PresenterConfig) -> Self {
        Self::with_cache(config, SourceCache::global())
    }
}

impl<'c> ImagePresenter<'c> {
    pub fn with_cache(config: PresenterConfig, cache: &'c SourceCache) -> Self {
        Self { config, cache }
    }

    pub fn config(&self) -> &PresenterConfig {
        &self.config
    }

    /// Asset roots for a solution directory, using the configured
    /// asset subdirectory.
    pub fn solution_roots(&self, root: impl Into<PathBuf>) -> SolutionRoots {
        SolutionRoots::new(root).with_asset_dir(self.config.asset_dir.clone())
    }

    /// Whether this presenter should claim `symbol` at all.
    pub fn accepts_symbol(&self, symbol: &SymbolInfo) -> bool {
        let accepted = match &self.config.target_type {
            None => true,
            Some(ty) => {
                symbol.is_constant
                    && symbol.is_string
                    && symbol.containing_type.as_deref() == Some(ty.as_str())
            }
        };
        log::trace!("symbol {} accepted: {accepted}", symbol.name);
        accepted
    }

    /// Whether the symbol's comment has an image to present.
    pub fn can_present(&self, source: &impl CommentSource) -> bool {
        let found = documentation(source).is_some_and(|doc| has_image(&doc));
        log::trace!("image comment present: {found}");
        found
    }

    /// Render the symbol's documentation.
    ///
    /// Returns `None` only when the symbol has no documentation at all.
    /// Without a usable image the host rendering is returned as is.
    pub fn present(
        &self,
        source: &impl CommentSource,
        renderer: &impl DocRenderer,
        roots: &impl AssetRoots,
    ) -> Option<String> {
        let doc = documentation(source)?;
        let extraction = extract(&doc);

        let Some(tag) = extraction.tag else {
            return Some(renderer.render(&doc));
        };

        // Render without the image markup so none of it leaks through
        let base = renderer.render(&extraction.sanitized);

        let Some(path) = locate(roots, &tag.src) else {
            log::debug!("image {} not found under asset roots", tag.src);
            return Some(base);
        };

        match self.image_block_for(&path, &tag) {
            Ok(block) => Some(base + &block),
            Err(e) => {
                log::warn!("cannot embed {}: {e}", path.display());
                Some(base)
            }
        }
    }

    /// Like [`present`](Self::present), handing the HTML to `sink`.
    ///
    /// Returns whether anything was submitted.
    pub fn present_into(
        &self,
        source: &impl CommentSource,
        renderer: &impl DocRenderer,
        roots: &impl AssetRoots,
        sink: &mut impl RenderSink,
    ) -> bool {
        match self.present(source, renderer, roots) {
            Some(html) => {
                sink.submit(html);
                true
            }
            None => false,
        }
    }

    fn image_block_for(&self, path: &Path, tag: &ImageTagInfo) -> Result<String> {
        let intrinsic = probe_path(path);
        let size = resolve(
            intrinsic,
            Some(&tag.constraints),
            self.config.default_target_edge,
            self.config.allow_upscale_by_default,
        );
        let src = self.cache.build_src(path, self.config.inline_threshold)?;
        Ok(image_block(&src, size))
    }
}

/// First non-empty documentation lookup.
fn documentation(source: &impl CommentSource) -> Option<String> {
    source
        .symbol_doc()
        .or_else(|| source.declaration_doc())
        .or_else(|| source.member_doc())
}

/// First candidate `root/src` that is an existing file.
fn locate(roots: &impl AssetRoots, src: &str) -> Option<PathBuf> {
    roots.roots().into_iter().find_map(|root| {
        let candidate = root.join(src);
        if candidate.is_file() {
            log::debug!("found image at {}", candidate.display());
            Some(candidate)
        } else {
            log::debug!("no image at {}", candidate.display());
            None
        }
    })
}

/// The HTML appended to the rendered comment.
pub fn image_block(src: &str, size: ResolvedSize) -> String {
    // The attribute is single-quoted
    let src = src.replace('\'', "%27");
    format!(
        "<img src='{src}' width='{}' height='{}'/>",
        size.width(),
        size.height()
    )
}
