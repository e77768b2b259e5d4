//! Text rendering support: glyph atlases, the font cache and text layout

pub mod font_atlas;
pub mod font_cache;
pub mod layout;
pub mod shelf_packer;

pub use font_atlas::{FontError, FontResult, GlyphAtlas, GlyphMetrics};
pub use font_cache::{FileSystemSource, FontCache, FontSource, MemorySource};
pub use layout::{LaidOutText, TextAlign, TextBounds, TextJustify, TextLayout, TextLayoutOptions};
