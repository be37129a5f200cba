//! Tracks, per registered source, which qualified columns feed which output
//! fields.

use crate::error::ComposeError;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Ordered `alias.column -> output field` pairs of one registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnSet {
    entries: Vec<(String, String)>,
}

impl ColumnSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `alias.column` for every column, prefixing output fields.
    pub fn for_columns(alias: &str, columns: &[String], prefix: &str) -> Self {
        let mut set = ColumnSet::new();
        for col in columns {
            set.insert(&format!("{alias}.{col}"), &format!("{prefix}{col}"));
        }
        set
    }

    /// Inserts a mapping. An existing column keeps its position and takes
    /// the new field.
    pub fn insert(&mut self, column: &str, field: &str) {
        match self.entries.iter_mut().find(|(col, _)| col == column) {
            Some(entry) => entry.1 = field.to_string(),
            None => self.entries.push((column.to_string(), field.to_string())),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(col, _)| col == column)
            .map(|(_, field)| field.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(col, field)| (col.as_str(), field.as_str()))
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, field)| field.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn retain_fields(&mut self, keep: &[&str]) {
        self.entries.retain(|(_, field)| keep.contains(&field.as_str()));
    }

    fn check_unique_fields(&self, set: &str) -> Result<(), ComposeError> {
        let mut seen = HashSet::new();
        for field in self.fields() {
            if !seen.insert(field) {
                return Err(ComposeError::DuplicateOutputField {
                    set: set.to_string(),
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl<C: AsRef<str>, F: AsRef<str>> FromIterator<(C, F)> for ColumnSet {
    fn from_iter<T: IntoIterator<Item = (C, F)>>(iter: T) -> Self {
        let mut set = ColumnSet::new();
        for (col, field) in iter {
            set.insert(col.as_ref(), field.as_ref());
        }
        set
    }
}

/// Column sets in registration order, keyed by source identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    sets: Vec<(String, ColumnSet)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `set` under `source_id`, suffixing `1`, `2`, ... while the
    /// id is taken. Returns the id actually used.
    pub fn register(&mut self, source_id: &str, set: ColumnSet) -> Result<String, ComposeError> {
        let mut id = source_id.to_string();
        let mut suffix = 0;
        while self.get(&id).is_some() {
            suffix += 1;
            id = format!("{source_id}{suffix}");
        }

        set.check_unique_fields(&id)?;
        debug!("Registered {} columns under `{}`", set.len(), id);
        self.sets.push((id.clone(), set));
        Ok(id)
    }

    /// Registers every set of `other` in its order.
    pub fn merge(&mut self, other: Registry) -> Result<Vec<String>, ComposeError> {
        other
            .sets
            .into_iter()
            .map(|(id, set)| self.register(&id, set))
            .collect()
    }

    pub fn get(&self, source_id: &str) -> Option<&ColumnSet> {
        self.sets
            .iter()
            .find(|(id, _)| id == source_id)
            .map(|(_, set)| set)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnSet)> {
        self.sets.iter().map(|(id, set)| (id.as_str(), set))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sets.iter().map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Distinct table aliases referenced by qualified columns, in order.
    pub fn aliases(&self) -> Vec<String> {
        let mut aliases: Vec<String> = Vec::new();
        for (_, set) in &self.sets {
            for (col, _) in set.iter() {
                if let Some((alias, _)) = col.split_once('.')
                    && !aliases.iter().any(|a| a == alias)
                {
                    aliases.push(alias.to_string());
                }
            }
        }
        aliases
    }

    /// Rewrites the alias of each qualified column through `aliases` and
    /// prepends `prefix` to every output field. Columns whose alias has no
    /// rule pass through unchanged.
    pub fn remap(&self, aliases: &HashMap<String, String>, prefix: Option<&str>) -> Registry {
        let prefix = prefix.unwrap_or_default();
        let sets = self
            .sets
            .iter()
            .map(|(id, set)| {
                let remapped = set
                    .iter()
                    .map(|(col, field)| {
                        let col = match col.split_once('.') {
                            Some((alias, rest)) => match aliases.get(alias) {
                                Some(new_alias) => format!("{new_alias}.{rest}"),
                                None => col.to_string(),
                            },
                            None => col.to_string(),
                        };
                        (col, format!("{prefix}{field}"))
                    })
                    .collect();
                (id.clone(), remapped)
            })
            .collect();

        Registry { sets }
    }

    /// For a registry compiled into a subquery, points every entry whose
    /// output field starts with `prefix` at the column the subquery exposes:
    /// `<alias>.<field>`.
    pub fn expose_prefixed(&self, prefix: &str) -> Registry {
        let sets = self
            .sets
            .iter()
            .map(|(id, set)| {
                let exposed = set
                    .iter()
                    .map(|(col, field)| {
                        let col = match col.split_once('.') {
                            Some((alias, _)) if field.starts_with(prefix) => {
                                format!("{alias}.{field}")
                            }
                            _ => col.to_string(),
                        };
                        (col, field.to_string())
                    })
                    .collect();
                (id.clone(), exposed)
            })
            .collect();

        Registry { sets }
    }

    /// Restricts sets to entries whose output field is in `keep`. With a
    /// source id only the sets registered for it (including suffixed
    /// repeats) are touched; otherwise every set is. An empty `keep` removes
    /// the matching sets.
    pub fn filter(&mut self, source_id: Option<&str>, keep: &[&str]) {
        let matches = |id: &str| source_id.is_none_or(|base| matches_source(id, base));

        if let Some(base) = source_id
            && !self.sets.iter().any(|(id, _)| matches(id.as_str()))
        {
            warn!("Column filter for `{}` matched no registered source", base);
        }

        if keep.is_empty() {
            self.sets.retain(|(id, _)| !matches(id.as_str()));
        } else {
            for (id, set) in self.sets.iter_mut() {
                if matches(id.as_str()) {
                    set.retain_fields(keep);
                }
            }
        }
    }
}

/// `Foo` matches `Foo`, `Foo1`, `Foo12` but not `FooBar`.
fn matches_source(id: &str, base: &str) -> bool {
    match id.strip_prefix(base) {
        Some("") => true,
        Some(rest) => rest.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}
