//! Schema metadata.
//!
//! Loads Spider `tables.json` entries and derives the lookups the encoder
//! needs: the column-identity set, the owning table of each column and
//! the key map shown next to a derivation.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{SemqlError, SemqlResult};

/// One database entry of `tables.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct TableSchema {
    pub db_id: String,
    pub table_names: Vec<String>,
    /// `[table_id, name]` per column; `-1` owns the `*` column.
    pub column_names: Vec<(i64, String)>,
    #[serde(default)]
    pub primary_keys: Vec<usize>,
    #[serde(default)]
    pub foreign_keys: Vec<(usize, usize)>,
}

/// Per-database lookups shared by every query over that database.
#[derive(Debug, Clone)]
pub struct Schema {
    pub db_id: String,
    /// Display name of each column, by column id.
    pub names: Vec<String>,
    /// Column-identity set: `names` deduplicated in first-seen order.
    pub col_set: Vec<String>,
    /// Owning table of each column, by column id.
    pub col_table: Vec<Option<usize>>,
    pub table_names: Vec<String>,
    /// Foreign keys in both directions, primary keys mapped to themselves.
    pub keys: BTreeMap<usize, usize>,
    identity: HashMap<String, usize>,
}

impl Schema {
    pub fn new(table: TableSchema) -> Self {
        let names: Vec<String> = table.column_names.iter().map(|(_, n)| n.clone()).collect();
        let col_table = table
            .column_names
            .iter()
            .map(|(t, _)| usize::try_from(*t).ok())
            .collect();

        let mut col_set = Vec::new();
        let mut identity = HashMap::new();
        for name in &names {
            if !identity.contains_key(name) {
                identity.insert(name.clone(), col_set.len());
                col_set.push(name.clone());
            }
        }

        let mut keys = BTreeMap::new();
        for (a, b) in &table.foreign_keys {
            keys.insert(*a, *b);
            keys.insert(*b, *a);
        }
        for id in &table.primary_keys {
            keys.insert(*id, *id);
        }

        Self {
            db_id: table.db_id,
            names,
            col_set,
            col_table,
            table_names: table.table_names,
            keys,
            identity,
        }
    }

    /// Column-identity index of a column id (the `C` choice).
    pub fn column_identity(&self, column: usize) -> SemqlResult<usize> {
        let name = self
            .names
            .get(column)
            .ok_or(SemqlError::UnknownColumn(column))?;
        self.identity
            .get(name)
            .copied()
            .ok_or(SemqlError::UnknownColumn(column))
    }

    /// Owning table of a column, `None` for `*`.
    pub fn table_of(&self, column: usize) -> SemqlResult<Option<usize>> {
        self.col_table
            .get(column)
            .copied()
            .ok_or(SemqlError::UnknownColumn(column))
    }

    /// Owning table of a concrete (non-`*`) column.
    pub fn owning_table(&self, column: usize) -> SemqlResult<usize> {
        self.table_of(column)?
            .ok_or(SemqlError::UnownedColumn(column))
    }

    /// `table.column` display name of a column id.
    pub fn qualified_name(&self, column: usize) -> String {
        let name = self.names.get(column).map_or("?", String::as_str);
        match self.col_table.get(column).copied().flatten() {
            Some(table) => {
                let table = self.table_names.get(table).map_or("?", String::as_str);
                format!("{}.{}", table, name)
            }
            None => name.to_string(),
        }
    }

    /// Key columns among `columns`, each with the column it links to.
    /// A primary key without a foreign-key partner links to itself.
    pub fn key_links(&self, columns: impl IntoIterator<Item = usize>) -> Vec<(usize, usize)> {
        columns
            .into_iter()
            .filter_map(|column| self.keys.get(&column).map(|&other| (column, other)))
            .collect()
    }

    /// Validate a table id taken from a FROM clause.
    pub fn table(&self, table: usize) -> SemqlResult<usize> {
        if table < self.table_names.len() {
            Ok(table)
        } else {
            Err(SemqlError::UnknownTable(table))
        }
    }
}

/// All schemas of a dataset, by database id.
#[derive(Debug, Default)]
pub struct Catalog {
    schemas: HashMap<String, Schema>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a `tables.json` file.
    pub fn load_from_file(path: impl AsRef<Path>) -> SemqlResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let catalog = Self::from_json(&content)?;
        tracing::info!(
            "Loaded {} database schemas from {}",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn from_json(content: &str) -> SemqlResult<Self> {
        let tables: Vec<TableSchema> = serde_json::from_str(content)?;
        let mut catalog = Self::new();
        for table in tables {
            catalog.add(Schema::new(table));
        }
        Ok(catalog)
    }

    pub fn add(&mut self, schema: Schema) {
        tracing::debug!(
            "Loaded schema for database: {} ({} columns)",
            schema.db_id,
            schema.names.len()
        );
        self.schemas.insert(schema.db_id.clone(), schema);
    }

    pub fn get(&self, db_id: &str) -> SemqlResult<&Schema> {
        self.schemas
            .get(db_id)
            .ok_or_else(|| SemqlError::UnknownDatabase(db_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
