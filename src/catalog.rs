//! Program catalog loading and caching
//!
//! The catalog is a CSV table with one program per row. Columns the file
//! does not carry are synthesized as empty, numeric columns are coerced
//! leniently, and several candidate locations are tried in order.
//! Once loaded the catalog is shared read-only until an explicit reload.

use crate::error::CompassError;
use crate::models::Program;
use crate::Result;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Default catalog locations, relative to the working directory
pub const DEFAULT_CATALOG_PATHS: &[&str] = &[
    "welfare_data.csv",
    "data/welfare_data.csv",
    "data/welfare_save.csv",
];

/// Columns every catalog row is expected to have
pub const REQUIRED_COLUMNS: &[&str] = &[
    "id",
    "program_name",
    "category_primary",
    "category_secondary",
    "description",
    "age_min",
    "age_max",
    "income_type",
    "income_max",
    "residence_required",
    "employment_status",
    "special_conditions",
    "support_type",
    "support_amount",
    "support_duration",
    "how_to_apply",
    "contact",
    "difficulty_level",
    "source",
];

const UTF8_BOM: char = '\u{feff}';

/// Loaded program table plus where it came from
#[derive(Debug, Clone, Default)]
pub struct ProgramCatalog {
    pub programs: Vec<Program>,
    pub source: Option<PathBuf>,
}

impl ProgramCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Parse CSV content into programs
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let columns: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(index, name)| (name.trim_start_matches(UTF8_BOM).to_string(), index))
            .collect();

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|column| !columns.contains_key(*column))
            .collect();
        if !missing.is_empty() {
            debug!(?missing, "Synthesizing absent catalog columns as empty");
        }

        let mut programs = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let row = Row {
                columns: &columns,
                record: &record,
            };
            programs.push(row.to_program());
        }

        Ok(Self {
            programs,
            source: None,
        })
    }

    /// Load a single CSV file
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let mut catalog = Self::from_reader(io::BufReader::new(file))?;
        catalog.source = Some(path.to_path_buf());
        Ok(catalog)
    }

    /// First candidate that exists and parses wins
    pub fn load_first(candidates: &[PathBuf]) -> Result<Self> {
        let mut last_error: Option<CompassError> = None;

        for path in candidates {
            if !path.exists() {
                debug!(path = %path.display(), "Catalog candidate not found");
                continue;
            }

            match Self::from_path(path) {
                Ok(catalog) => {
                    info!(
                        path = %path.display(),
                        programs = catalog.len(),
                        "Program catalog loaded"
                    );
                    return Ok(catalog);
                }
                Err(e) => {
                    warn!(path = %path.display(), "Catalog candidate failed to parse: {}", e);
                    last_error = Some(e);
                }
            }
        }

        let mut message = "Welfare program data file not found".to_string();
        if let Some(e) = last_error {
            message.push_str(&format!(" (last error: {})", e));
        }
        Err(CompassError::CatalogUnavailable(message))
    }

    /// Like `load_first`, but total failure yields an empty catalog
    pub fn load_or_empty(candidates: &[PathBuf]) -> Self {
        match Self::load_first(candidates) {
            Ok(catalog) => catalog,
            Err(e) => {
                error!("{}", e);
                Self::empty()
            }
        }
    }
}

/// One CSV record viewed through the header map
struct Row<'a> {
    columns: &'a HashMap<String, usize>,
    record: &'a csv::StringRecord,
}

impl Row<'_> {
    fn text(&self, column: &str) -> Option<String> {
        let index = *self.columns.get(column)?;
        self.record
            .get(index)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    fn number(&self, column: &str) -> Option<f64> {
        self.text(column)
            .and_then(|value| value.replace(',', "").parse::<f64>().ok())
            .filter(|value| value.is_finite())
    }

    fn to_program(&self) -> Program {
        Program {
            id: self.text("id"),
            program_name: self.text("program_name").unwrap_or_default(),
            category_primary: self.text("category_primary"),
            category_secondary: self.text("category_secondary"),
            description: self.text("description"),
            age_min: self.number("age_min"),
            age_max: self.number("age_max"),
            income_type: self.text("income_type"),
            income_max: self.number("income_max"),
            residence_required: self.text("residence_required"),
            employment_status: self.text("employment_status"),
            special_conditions: self.text("special_conditions"),
            support_type: self.text("support_type"),
            support_amount: self.text("support_amount"),
            support_duration: self.text("support_duration"),
            how_to_apply: self.text("how_to_apply"),
            contact: self.text("contact"),
            difficulty_level: self.number("difficulty_level"),
            source: self.text("source"),
        }
    }
}

/// Candidate list with an optional explicit path tried first
pub fn default_candidates(explicit: Option<&Path>) -> Vec<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .into_iter()
        .chain(DEFAULT_CATALOG_PATHS.iter().map(PathBuf::from))
        .collect()
}

/// Lazily loaded, explicitly invalidated catalog shared across sessions
pub struct CatalogCache {
    candidates: Vec<PathBuf>,
    loaded: RwLock<Option<Arc<ProgramCatalog>>>,
}

impl CatalogCache {
    pub fn new(candidates: Vec<PathBuf>) -> Self {
        Self {
            candidates,
            loaded: RwLock::new(None),
        }
    }

    /// Cache seeded with an already built catalog
    pub fn with_catalog(catalog: ProgramCatalog) -> Self {
        let candidates = catalog.source.clone().into_iter().collect();
        Self {
            candidates,
            loaded: RwLock::new(Some(Arc::new(catalog))),
        }
    }

    pub fn candidates(&self) -> &[PathBuf] {
        &self.candidates
    }

    /// Current catalog, loading it on first use
    pub async fn get(&self) -> Arc<ProgramCatalog> {
        {
            let loaded = self.loaded.read().await;
            if let Some(catalog) = loaded.as_ref() {
                return Arc::clone(catalog);
            }
        }

        let mut loaded = self.loaded.write().await;
        if let Some(catalog) = loaded.as_ref() {
            return Arc::clone(catalog);
        }

        // file reads stay off the async workers
        let candidates = self.candidates.clone();
        let catalog = tokio::task::spawn_blocking(move || ProgramCatalog::load_or_empty(&candidates))
            .await
            .unwrap_or_else(|e| {
                error!("Catalog load task failed: {}", e);
                ProgramCatalog::empty()
            });

        let catalog = Arc::new(catalog);
        *loaded = Some(Arc::clone(&catalog));
        catalog
    }

    /// Drop the cached catalog; the next `get` reads the files again
    pub async fn invalidate(&self) {
        let mut loaded = self.loaded.write().await;
        *loaded = None;
        info!("Program catalog cache invalidated");
    }

    pub async fn reload(&self) -> Arc<ProgramCatalog> {
        self.invalidate().await;
        self.get().await
    }
}
