use std::{collections::HashMap, path::PathBuf, sync::Arc};

use parking_lot::Mutex;

use crate::{
    error::Result,
    font::{FaceMetrics, FontProvider, FontRequest, Glyph, TextureRef},
    font_storage::FontStorage,
    geometry::point,
    glyph_id::GlyphId,
    style::FontId,
};

/// [`FontProvider`] backed by `fontdb` and `fontdue`.
///
/// Use `Mutex` to allow shared mutable access, so one font system can serve
/// any number of measurements, including ones on other threads.
///
/// Glyph quads reference [`TextureRef::Glyph`]; hosts turn those into pixels
/// with [`FontSystem::rasterize`].
pub struct FontSystem {
    /// The underlying font storage.
    pub font_storage: Mutex<FontStorage>,

    metrics: Mutex<HashMap<GlyphId, fontdue::Metrics, fxhash::FxBuildHasher>>,
    default_font_size: f32,
}

impl Default for FontSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FontSystem {
    /// Creates a font system with empty storage and a 16px default size.
    pub fn new() -> Self {
        Self {
            font_storage: Mutex::new(FontStorage::new()),
            metrics: Mutex::new(HashMap::with_hasher(fxhash::FxBuildHasher::default())),
            default_font_size: 16.0,
        }
    }

    pub fn with_default_font_size(mut self, size: f32) -> Self {
        self.default_font_size = size;
        self
    }
}

/// font storage initialization
impl FontSystem {
    /// Loads the system fonts into the storage.
    pub fn load_system_fonts(&self) {
        self.font_storage.lock().load_system_fonts();
    }

    /// Loads a font from binary data.
    pub fn load_font_binary(&self, data: impl Into<Vec<u8>>) {
        self.font_storage.lock().load_font_binary(data);
    }

    /// Loads a font from a file path.
    pub fn load_font_file(&self, path: PathBuf) -> Result<()> {
        self.font_storage.lock().load_font_file(path)
    }

    /// Loads all fonts from a directory.
    pub fn load_fonts_dir(&self, dir: PathBuf) {
        self.font_storage.lock().load_fonts_dir(dir)
    }

    /// Checks if the storage is empty.
    pub fn is_empty(&self) -> bool {
        self.font_storage.lock().is_empty()
    }

    /// Returns the number of known faces.
    pub fn len(&self) -> usize {
        self.font_storage.lock().len()
    }

    /// Returns a vec over all available faces.
    ///
    /// # Performance
    /// This method clones all face info to avoid holding a lock on the storage.
    /// If you need to iterate without allocation, lock `font_storage` directly.
    pub fn faces(&self) -> Vec<fontdb::FaceInfo> {
        self.font_storage.lock().faces().cloned().collect()
    }
}

/// face registry
impl FontSystem {
    /// Registers the best match for `query` and returns its id for use in a
    /// [`crate::style::FontSet`].
    pub fn register_query(&self, query: &fontdb::Query) -> Result<FontId> {
        self.font_storage.lock().register_query(query)
    }

    pub fn set_default_font(&self, font_id: FontId) {
        self.font_storage.lock().set_default_font(font_id);
    }

    /// Resolves a request to a registered face and its parsed font.
    fn resolve(&self, request: &FontRequest) -> Option<(FontId, Arc<fontdue::Font>)> {
        let mut storage = self.font_storage.lock();
        let font_id = request.face.or_else(|| storage.default_font())?;
        storage.font_for(font_id).ok().map(|font| (font_id, font))
    }
}

/// rasterization
impl FontSystem {
    /// Renders the coverage bitmap of a glyph referenced by a quad.
    pub fn rasterize(&self, glyph: GlyphId) -> Option<(fontdue::Metrics, Vec<u8>)> {
        let font = self.font_storage.lock().font_for(glyph.font_id()).ok()?;
        Some(font.rasterize_indexed(glyph.glyph_index(), glyph.font_size()))
    }

    /// Drops cached glyph metrics.
    pub fn clear_cache(&self) {
        self.metrics.lock().clear();
    }

    fn glyph_metrics(&self, font: &fontdue::Font, glyph: GlyphId) -> fontdue::Metrics {
        *self
            .metrics
            .lock()
            .entry(glyph)
            .or_insert_with(|| font.metrics_indexed(glyph.glyph_index(), glyph.font_size()))
    }
}

impl FontProvider for FontSystem {
    fn default_font_size(&self) -> f32 {
        self.default_font_size
    }

    fn face_metrics(&self, request: &FontRequest) -> Option<FaceMetrics> {
        let (_, font) = self.resolve(request)?;
        let line = font.horizontal_line_metrics(request.size)?;
        Some(FaceMetrics {
            ascent: line.ascent,
            descent: -line.descent,
        })
    }

    fn glyph(&self, request: &FontRequest, c: char) -> Option<Glyph> {
        let (font_id, font) = self.resolve(request)?;
        let index = font.lookup_glyph_index(c);
        if index == 0 {
            return None;
        }

        let id = GlyphId::new(font_id, index, request.size);
        let metrics = self.glyph_metrics(&font, id);
        let ascent = font
            .horizontal_line_metrics(request.size)
            .map_or(request.size * 0.8, |line| line.ascent);

        // fontdue measures up from the baseline; quads measure down from the em top
        let left = metrics.xmin as f32;
        let bottom = ascent - metrics.ymin as f32;
        let top = bottom - metrics.height as f32;

        Some(Glyph {
            codepoint: c,
            xy0: point(left, top),
            xy1: point(left + metrics.width as f32, bottom),
            advance: metrics.advance_width,
            uv0: point(0.0, 0.0),
            uv1: point(1.0, 1.0),
            texture: TextureRef::Glyph(id),
            visible: metrics.width > 0 && metrics.height > 0,
        })
    }

    fn kerning(&self, request: &FontRequest, left: char, right: char) -> f32 {
        self.resolve(request)
            .and_then(|(_, font)| font.horizontal_kern(left, right, request.size))
            .unwrap_or(0.0)
    }
}
