use std::fmt;
use std::sync::Arc;

use fontdb::{Database, Family, Query, Stretch, Style, Weight};

use crate::config::Config;

/// Fonts available to the renderer plus the family text is set in.
///
/// Built once and handed to the renderer explicitly. When no family can be
/// resolved text is skipped; geometry never depends on font availability.
#[derive(Clone)]
pub struct FontBook {
    db: Arc<Database>,
    family: Option<String>,
}

impl FontBook {
    /// No fonts at all. Cards render without text.
    pub fn empty() -> Self {
        Self {
            db: Arc::new(Database::new()),
            family: None,
        }
    }

    /// Load the configured font file and, if enabled, the host's fonts.
    pub fn from_config(config: &Config) -> Self {
        let mut db = Database::new();

        if let Some(path) = &config.font_path {
            match db.load_font_file(path) {
                Ok(()) => tracing::debug!(path = %path.display(), "Loaded font file"),
                Err(e) => tracing::warn!(path = %path.display(), %e, "Failed to load font file"),
            }
        }
        if config.load_system_fonts {
            db.load_system_fonts();
        }

        Self::resolve(db, &config.font_families)
    }

    /// Use in-memory font data only (no host fonts).
    pub fn from_font_data(data: Vec<u8>, preferred: &[String]) -> Self {
        let mut db = Database::new();
        db.load_font_data(data);
        Self::resolve(db, preferred)
    }

    fn resolve(db: Database, preferred: &[String]) -> Self {
        tracing::info!(font_count = db.len(), "Loaded fonts for text rendering");

        let family = preferred
            .iter()
            .find(|name| query_bold(&db, &[Family::Name(name.as_str())]).is_some())
            .cloned()
            .or_else(|| {
                let id = query_bold(&db, &[Family::SansSerif])?;
                db.face(id)?.families.first().map(|(name, _)| name.clone())
            })
            .or_else(|| {
                db.faces()
                    .find_map(|f| f.families.first().map(|(name, _)| name.clone()))
            });

        match &family {
            Some(name) => tracing::debug!(family = %name, "Resolved display font"),
            None => tracing::warn!("No usable font found, titles and labels will be skipped"),
        }

        Self {
            db: Arc::new(db),
            family,
        }
    }

    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    pub(crate) fn database(&self) -> Arc<Database> {
        self.db.clone()
    }
}

fn query_bold(db: &Database, families: &[Family<'_>]) -> Option<fontdb::ID> {
    db.query(&Query {
        families,
        weight: Weight::BOLD,
        stretch: Stretch::Normal,
        style: Style::Normal,
    })
}

impl Default for FontBook {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for FontBook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontBook")
            .field("faces", &self.db.len())
            .field("family", &self.family)
            .finish()
    }
}
