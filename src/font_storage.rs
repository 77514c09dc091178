use std::{collections::HashMap, path::PathBuf, sync::Arc};

use crate::error::{Error, Result};
use crate::style::FontId;

/// Manages font loading and retrieval using `fontdb` and `fontdue`.
///
/// Faces are discovered through a `fontdb` database and parsed by `fontdue`
/// on first use. Layout refers to faces by [`FontId`]; a face gets one when
/// it is registered, either directly or through [`FontStorage::register_query`].
pub struct FontStorage {
    /// This is the font set that has been loaded by fontdb.
    font_db: fontdb::Database,
    /// This is the font that has been loaded by fontdue.
    /// Not all fonts in fontdb are necessarily loaded here.
    loaded_font: HashMap<fontdb::ID, Arc<fontdue::Font>, fxhash::FxBuildHasher>,

    registered: Vec<fontdb::ID>,
    ids: HashMap<fontdb::ID, FontId, fxhash::FxBuildHasher>,
    default_font: Option<FontId>,
}

impl Default for FontStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl FontStorage {
    /// Creates a new empty font storage.
    pub fn new() -> Self {
        Self {
            font_db: fontdb::Database::new(),
            loaded_font: HashMap::with_hasher(fxhash::FxBuildHasher::default()),
            registered: Vec::new(),
            ids: HashMap::with_hasher(fxhash::FxBuildHasher::default()),
            default_font: None,
        }
    }
}

/// Loading fonts into fontdb and setting up fontdb.
impl FontStorage {
    /// Loads a font from binary data.
    pub fn load_font_binary(&mut self, data: impl Into<Vec<u8>>) {
        self.font_db.load_font_data(data.into());
    }

    /// Loads a font from a file path.
    pub fn load_font_file(&mut self, path: PathBuf) -> Result<()> {
        Ok(self.font_db.load_font_file(path)?)
    }

    /// Loads all fonts from a directory.
    pub fn load_fonts_dir(&mut self, dir: PathBuf) {
        self.font_db.load_fonts_dir(dir)
    }

    /// Loads the system fonts.
    pub fn load_system_fonts(&mut self) {
        self.font_db.load_system_fonts();
    }

    /// Checks if the storage is empty.
    pub fn is_empty(&self) -> bool {
        self.font_db.is_empty()
    }

    /// Returns the number of known faces.
    pub fn len(&self) -> usize {
        self.font_db.len()
    }

    /// Sets the family name for the "sans-serif" generic family.
    pub fn set_sans_serif_family(&mut self, family: impl Into<String>) {
        self.font_db.set_sans_serif_family(family);
    }

    /// Sets the family name for the "monospace" generic family.
    pub fn set_monospace_family(&mut self, family: impl Into<String>) {
        self.font_db.set_monospace_family(family);
    }

    /// Returns an iterator over all available faces.
    pub fn faces(&self) -> impl Iterator<Item = &fontdb::FaceInfo> {
        self.font_db.faces()
    }
}

/// Face registry
impl FontStorage {
    /// Hands out the [`FontId`] for a database face. Registering the same face
    /// again returns the same id.
    ///
    /// The first registered face becomes the default one.
    pub fn register(&mut self, id: fontdb::ID) -> FontId {
        if let Some(&font_id) = self.ids.get(&id) {
            return font_id;
        }

        let font_id = FontId(self.registered.len() as u32);
        self.registered.push(id);
        self.ids.insert(id, font_id);
        self.default_font.get_or_insert(font_id);
        font_id
    }

    /// Registers the best match for `query`.
    pub fn register_query(&mut self, query: &fontdb::Query) -> Result<FontId> {
        let id = self
            .font_db
            .query(query)
            .ok_or_else(|| Error::FontNotFound(format!("{:?}", query.families)))?;
        Ok(self.register(id))
    }

    /// Face used by requests that do not name one.
    pub fn default_font(&self) -> Option<FontId> {
        self.default_font
    }

    pub fn set_default_font(&mut self, font_id: FontId) {
        self.default_font = Some(font_id);
    }

    /// Database face behind a registered id.
    pub fn face_id(&self, font_id: FontId) -> Option<fontdb::ID> {
        self.registered.get(font_id.0 as usize).copied()
    }
}

/// Get `Font`
impl FontStorage {
    /// Retrieves the parsed font for a registered id, loading it if necessary.
    pub fn font_for(&mut self, font_id: FontId) -> Result<Arc<fontdue::Font>> {
        let id = self
            .face_id(font_id)
            .ok_or_else(|| Error::FontNotFound(format!("{font_id:?}")))?;
        self.font(id).map_err(|reason| Error::FontLoad {
            face: font_id.0,
            reason,
        })
    }

    fn font(&mut self, id: fontdb::ID) -> std::result::Result<Arc<fontdue::Font>, String> {
        use std::collections::hash_map::Entry;

        match self.loaded_font.entry(id) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let font_result = self
                    .font_db
                    .with_face_data(id, |data, index| {
                        fontdue::Font::from_bytes(
                            data,
                            fontdue::FontSettings {
                                collection_index: index,
                                scale: 40.0,
                                load_substitutions: true,
                            },
                        )
                    })
                    .ok_or_else(|| "face data is unavailable".to_string())?;

                match font_result {
                    Ok(font) => {
                        let r: &mut Arc<fontdue::Font> = entry.insert(Arc::new(font));
                        Ok(Arc::clone(r))
                    }
                    Err(e) => {
                        log::error!("Failed to load font (id: {:?}): {}", id, e);
                        Err(e.to_string())
                    }
                }
            }
        }
    }
}
