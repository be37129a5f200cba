use crate::error::ComposeError;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path};
use tracing::{debug, warn};

fn default_created_field() -> String {
    "created".to_string()
}

fn default_updated_field() -> String {
    "modified".to_string()
}

/// Serializable description of a table-backed source, as written in a
/// catalog file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceDef {
    pub name: String,
    pub table: String,
    #[serde(default)]
    pub primary_key: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default = "default_created_field")]
    pub created_field: String,
    #[serde(default = "default_updated_field")]
    pub updated_field: String,
    #[serde(default)]
    pub deleted_field: String,
}

impl SourceDef {
    pub fn new(name: &str, table: &str) -> Self {
        SourceDef {
            name: name.to_string(),
            table: table.to_string(),
            primary_key: None,
            columns: Vec::new(),
            prefix: None,
            created_field: default_created_field(),
            updated_field: default_updated_field(),
            deleted_field: String::new(),
        }
    }

    pub fn primary_key(mut self, primary_key: &str) -> Self {
        self.primary_key = Some(primary_key.to_string());
        self
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    /// Overrides the audit column names. Empty strings disable a column.
    pub fn audit_fields(mut self, created: &str, updated: &str, deleted: &str) -> Self {
        self.created_field = created.to_string();
        self.updated_field = updated.to_string();
        self.deleted_field = deleted.to_string();
        self
    }

    pub fn build(self) -> Source {
        Source::from(self)
    }
}

/// An immutable table-backed entity: its table, key, owned columns and
/// column prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    name: String,
    table: String,
    primary_key: Option<String>,
    rule_columns: Vec<String>,
    prefix: Option<String>,
    created_field: String,
    updated_field: String,
    deleted_field: String,
}

impl From<SourceDef> for Source {
    fn from(def: SourceDef) -> Self {
        let prefix = def.prefix.filter(|p| !p.is_empty());
        let apply = |field: String| match &prefix {
            Some(p) if !field.is_empty() && !contains_ignore_case(&field, p) => {
                format!("{p}{field}")
            }
            _ => field,
        };

        Source {
            name: def.name,
            table: def.table,
            primary_key: def.primary_key.filter(|pk| !pk.is_empty()).map(&apply),
            rule_columns: def.columns,
            created_field: apply(def.created_field),
            updated_field: apply(def.updated_field),
            deleted_field: apply(def.deleted_field),
            prefix,
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl Source {
    /// The identifier this source registers its columns under.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn primary_key(&self) -> Option<&str> {
        self.primary_key.as_deref()
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Owned columns followed by the audit columns. With `include_primary`
    /// the primary key comes first. No column is listed twice.
    pub fn columns(&self, include_primary: bool) -> Vec<String> {
        let mut cols: Vec<String> = Vec::new();
        let primary = self.primary_key.iter().filter(|_| include_primary);
        let audit = [&self.created_field, &self.updated_field, &self.deleted_field]
            .into_iter()
            .filter(|f| !f.is_empty());

        for col in primary.chain(self.rule_columns.iter()).chain(audit) {
            if !include_primary && self.primary_key.as_ref() == Some(col) {
                continue;
            }
            if !cols.contains(col) {
                cols.push(col.clone());
            }
        }
        cols
    }

    /// Returns the primary key or fails with `MissingPrimaryKey`.
    pub fn require_primary_key(&self) -> Result<&str, ComposeError> {
        self.primary_key()
            .ok_or_else(|| ComposeError::MissingPrimaryKey(self.name.clone()))
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    sources: Vec<SourceDef>,
}

/// Every source a composer may join, keyed by identifier. Populated once at
/// start-up.
#[derive(Debug, Clone, Default)]
pub struct SourceCatalog {
    sources: HashMap<String, Source>,
}

impl SourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, source: Source) {
        if self.sources.contains_key(source.name()) {
            warn!("Source `{}` registered twice; keeping the last", source.name());
        }
        self.sources.insert(source.name().to_string(), source);
    }

    pub fn get(&self, name: &str) -> Result<&Source, ComposeError> {
        self.sources
            .get(name)
            .ok_or_else(|| ComposeError::UnknownSource(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Parses a `{"sources": [...]}` document.
    pub fn from_json_str(json: &str) -> Result<Self, ComposeError> {
        let file: CatalogFile = serde_json::from_str(json)
            .map_err(|err| ComposeError::Config(format!("invalid source catalog: {err}")))?;

        let mut catalog = SourceCatalog::new();
        for def in file.sources {
            catalog.register(def.build());
        }
        debug!("Loaded {} sources", catalog.len());
        Ok(catalog)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ComposeError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|err| {
            ComposeError::Config(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_json_str(&json)
    }
}

impl FromIterator<Source> for SourceCatalog {
    fn from_iter<T: IntoIterator<Item = Source>>(iter: T) -> Self {
        let mut catalog = SourceCatalog::new();
        for source in iter {
            catalog.register(source);
        }
        catalog
    }
}
