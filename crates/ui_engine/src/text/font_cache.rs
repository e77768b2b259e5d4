//! Font cache keyed by (path, pixel size)
//!
//! The cache is an ordinary value owned by the engine and passed by reference
//! to whatever builds text. Atlases are baked on first request and shared via
//! `Rc`; a font that fails to load is cached as an invalid atlas so the failure
//! is logged once and every later request degrades to empty text.

use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use super::font_atlas::{FontError, FontResult, GlyphAtlas};
use crate::backend::RenderDevice;

/// Where font bytes come from
pub trait FontSource {
    /// Read the whole font file at `path`
    fn read(&self, path: &str) -> FontResult<Vec<u8>>;
}

/// Reads fonts from the filesystem, optionally relative to a root directory
#[derive(Debug, Clone, Default)]
pub struct FileSystemSource {
    root: Option<PathBuf>,
}

impl FileSystemSource {
    /// Resolve relative paths against `root`
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: Some(root.into()) }
    }
}

impl FontSource for FileSystemSource {
    fn read(&self, path: &str) -> FontResult<Vec<u8>> {
        let full = match &self.root {
            Some(root) => root.join(path),
            None => PathBuf::from(path),
        };
        std::fs::read(&full).map_err(|source| FontError::Io {
            path: full.display().to_string(),
            source,
        })
    }
}

/// Serves font bytes registered in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    /// Register `bytes` under `path`
    #[must_use]
    pub fn with_file(mut self, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.files.insert(path.into(), bytes);
        self
    }
}

impl FontSource for MemorySource {
    fn read(&self, path: &str) -> FontResult<Vec<u8>> {
        self.files.get(path).cloned().ok_or_else(|| FontError::Io {
            path: path.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not registered"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FontKey {
    path: String,
    size_bits: u32,
}

impl FontKey {
    fn new(path: &str, size: f32) -> Self {
        Self { path: path.to_string(), size_bits: size.to_bits() }
    }
}

/// Cache of baked glyph atlases
pub struct FontCache {
    source: Box<dyn FontSource>,
    fonts: HashMap<FontKey, Rc<GlyphAtlas>>,
}

impl Default for FontCache {
    fn default() -> Self {
        Self::new(FileSystemSource::default())
    }
}

impl std::fmt::Debug for FontCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontCache").field("fonts", &self.fonts.len()).finish_non_exhaustive()
    }
}

impl FontCache {
    /// Cache reading font files from `source`
    pub fn new(source: impl FontSource + 'static) -> Self {
        Self { source: Box::new(source), fonts: HashMap::new() }
    }

    /// Atlas for `path` at `size`, baking it on first request
    ///
    /// Never fails: if the font cannot be loaded the returned atlas is
    /// invalid (see [`GlyphAtlas::is_valid`]) and the error is logged.
    pub fn get_font(&mut self, path: &str, size: f32) -> Rc<GlyphAtlas> {
        match self.try_load(path, size) {
            Ok(atlas) => atlas,
            Err(err) => {
                log::error!("Font '{}' at {}px unavailable: {}", path, size, err);
                let invalid = Rc::new(GlyphAtlas::invalid(size));
                self.fonts.insert(FontKey::new(path, size), Rc::clone(&invalid));
                invalid
            }
        }
    }

    /// Atlas for `path` at `size`, surfacing load errors
    ///
    /// A previously failed load stays cached as invalid and is returned as
    /// such without retrying.
    pub fn try_load(&mut self, path: &str, size: f32) -> FontResult<Rc<GlyphAtlas>> {
        let key = FontKey::new(path, size);
        if let Some(atlas) = self.fonts.get(&key) {
            log::debug!("Font cache hit: {}@{}", path, size);
            return Ok(Rc::clone(atlas));
        }

        let bytes = self.source.read(path)?;
        let atlas = Rc::new(GlyphAtlas::bake(&bytes, size)?);
        log::info!("Loaded font '{}' at {}px", path, size);
        self.fonts.insert(key, Rc::clone(&atlas));
        Ok(atlas)
    }

    /// Put an atlas into the cache under `path`/`size`, replacing any existing entry
    pub fn insert(&mut self, path: &str, size: f32, atlas: GlyphAtlas) -> Rc<GlyphAtlas> {
        let atlas = Rc::new(atlas);
        self.fonts.insert(FontKey::new(path, size), Rc::clone(&atlas));
        atlas
    }

    /// Number of cached (path, size) entries, valid or not
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Drop every atlas and release their textures
    pub fn clear(&mut self, device: &mut dyn RenderDevice) {
        for atlas in self.fonts.values() {
            atlas.release_texture(device);
        }
        log::info!("Font cache cleared ({} entries)", self.fonts.len());
        self.fonts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingDevice;

    #[test]
    fn test_missing_font_is_cached_as_invalid() {
        let mut cache = FontCache::new(MemorySource::default());

        let atlas = cache.get_font("missing.ttf", 16.0);
        assert!(!atlas.is_valid());
        assert!(atlas.get_glyph('A').is_none());
        assert_eq!(cache.len(), 1);

        // Second request hits the cached invalid entry
        let again = cache.get_font("missing.ttf", 16.0);
        assert!(Rc::ptr_eq(&atlas, &again));
        assert!(cache.try_load("missing.ttf", 16.0).is_ok_and(|a| !a.is_valid()));
    }

    #[test]
    fn test_unparsable_font_surfaces_load_error() {
        let source = MemorySource::default().with_file("bad.ttf", b"not a font".to_vec());
        let mut cache = FontCache::new(source);
        assert!(matches!(cache.try_load("bad.ttf", 12.0), Err(FontError::Load(_))));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entries_are_keyed_by_path_and_size() {
        let mut cache = FontCache::new(MemorySource::default());
        let small = cache.insert("mono", 10.0, GlyphAtlas::fixed_pitch(5.0, 8.0, -2.0));
        let large = cache.insert("mono", 20.0, GlyphAtlas::fixed_pitch(10.0, 16.0, -4.0));

        assert!(Rc::ptr_eq(&cache.get_font("mono", 10.0), &small));
        assert!(Rc::ptr_eq(&cache.get_font("mono", 20.0), &large));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_clear_empties_cache() {
        let mut device = RecordingDevice::new();
        let mut cache = FontCache::new(MemorySource::default());
        cache.insert("mono", 10.0, GlyphAtlas::fixed_pitch(5.0, 8.0, -2.0));
        cache.clear(&mut device);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_filesystem_source_reports_io_error() {
        let source = FileSystemSource::with_root(std::env::temp_dir());
        let result = source.read("ui_engine_no_such_font.ttf");
        assert!(matches!(result, Err(FontError::Io { .. })));
    }
}
