//! Static game data: JSON descriptors and data-file import
//!
//! Data files list items, raw resources and recipes. Item references inside
//! recipes are by key and are only resolved when the graph is built, so a
//! data set may be split across several files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::db;

const SAMPLE_DATA: &str = include_str!("../data/sample.json");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameData {
    #[serde(default)]
    pub items: Vec<ItemData>,
    #[serde(default)]
    pub resources: Vec<ResourceData>,
    #[serde(default)]
    pub recipes: Vec<RecipeData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemData {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub row: i64,
    #[serde(default)]
    pub category: Option<String>,
}

/// A raw resource: extraction of one unit of `item` per cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    pub key: String,
    pub item: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeData {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub time: f64,
    #[serde(default)]
    pub ingredients: Vec<AmountData>,
    #[serde(default)]
    pub products: Vec<AmountData>,
}

/// An item key with a per-cycle amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmountData {
    pub name: String,
    pub amount: f64,
}

impl GameData {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse game data")
    }

    /// The bundled sample data set.
    pub fn sample() -> Result<Self> {
        Self::from_json(SAMPLE_DATA)
    }

    pub fn extend(&mut self, other: GameData) {
        self.items.extend(other.items);
        self.resources.extend(other.resources);
        self.recipes.extend(other.recipes);
    }

    pub fn item(mut self, item: ItemData) -> Self {
        self.items.push(item);
        self
    }

    pub fn resource(mut self, resource: ResourceData) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn recipe(mut self, recipe: RecipeData) -> Self {
        self.recipes.push(recipe);
        self
    }
}

impl ItemData {
    pub fn new(key: &str, name: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
            row: 0,
            category: None,
        }
    }
}

impl ResourceData {
    pub fn new(key: &str, item: &str) -> Self {
        Self {
            key: key.to_string(),
            item: item.to_string(),
            category: None,
        }
    }
}

impl RecipeData {
    /// A recipe named after its key with no ingredients or products yet.
    pub fn new(key: &str, time: f64) -> Self {
        Self {
            key: key.to_string(),
            name: key.to_string(),
            category: None,
            time,
            ingredients: Vec::new(),
            products: Vec::new(),
        }
    }

    pub fn ingredient(mut self, item: &str, amount: f64) -> Self {
        self.ingredients.push(AmountData {
            name: item.to_string(),
            amount,
        });
        self
    }

    pub fn product(mut self, item: &str, amount: f64) -> Self {
        self.products.push(AmountData {
            name: item.to_string(),
            amount,
        });
        self
    }
}

/// Find all `*.json` data files below `data_dir`, in path order
pub fn find_data_files(data_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(data_dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

/// Parse a single data file
pub fn load_data_file(filepath: &Path) -> Result<GameData> {
    let content = fs::read_to_string(filepath)
        .with_context(|| format!("Failed to read {}", filepath.display()))?;
    GameData::from_json(&content).with_context(|| format!("In {}", filepath.display()))
}

/// Import every data file under `data_dir` into the database
pub fn import_to_database(conn: &Connection, data_dir: &Path) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    info!("Scanning {} for data files", data_dir.display());
    let files = find_data_files(data_dir)?;
    info!("Found {} data files", files.len());

    for filepath in &files {
        match load_data_file(filepath) {
            Ok(data) => {
                db::store_game_data(conn, &data)?;

                stats.files += 1;
                stats.items += data.items.len();
                stats.resources += data.resources.len();
                stats.recipes += data.recipes.len();

                debug!(
                    "Imported {} ({} items, {} resources, {} recipes)",
                    filepath.display(),
                    data.items.len(),
                    data.resources.len(),
                    data.recipes.len()
                );
            }
            Err(e) => {
                warn!("Error parsing {}: {:#}", filepath.display(), e);
                stats.errors += 1;
            }
        }
    }

    Ok(stats)
}

#[derive(Debug, Default)]
pub struct ImportStats {
    pub files: usize,
    pub items: usize,
    pub resources: usize,
    pub recipes: usize,
    pub errors: usize,
}

impl std::fmt::Display for ImportStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Imported {} files ({} items, {} resources, {} recipes). Errors: {}",
            self.files, self.items, self.resources, self.recipes, self.errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_layout() {
        let data = GameData::from_json(
            r#"{
                "items": [{"key": "iron-ore", "name": "Iron Ore", "row": 1, "category": "ore"}],
                "resources": [{"key": "iron-ore-node", "item": "iron-ore"}],
                "recipes": [{
                    "key": "iron-plate", "name": "Iron Plate", "time": 3.2,
                    "ingredients": [{"name": "iron-ore", "amount": 1}],
                    "products": [{"name": "iron-plate", "amount": 1}]
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(data.items[0].row, 1);
        assert_eq!(data.items[0].category.as_deref(), Some("ore"));
        assert_eq!(data.resources[0].item, "iron-ore");
        assert_eq!(data.recipes[0].time, 3.2);
        assert_eq!(data.recipes[0].ingredients[0].amount, 1.0);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let data = GameData::from_json(r#"{"items": []}"#).unwrap();
        assert!(data.resources.is_empty());
        assert!(data.recipes.is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(GameData::from_json(r#"{"items": [{"key": 1}]}"#).is_err());
    }

    #[test]
    fn sample_data_parses() {
        let data = GameData::sample().unwrap();
        assert!(!data.items.is_empty());
        assert!(!data.resources.is_empty());
        assert!(!data.recipes.is_empty());
    }

    #[test]
    fn finds_json_files_recursively() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("nested").join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let files = find_data_files(dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|f| f.extension().unwrap() == "json"));
    }

    #[test]
    fn import_counts_good_and_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let data = GameData::default()
            .item(ItemData::new("ore", "Ore"))
            .resource(ResourceData::new("ore", "ore"));
        fs::write(dir.path().join("good.json"), serde_json::to_string(&data).unwrap()).unwrap();
        fs::write(dir.path().join("bad.json"), "not json").unwrap();

        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let stats = import_to_database(&conn, dir.path()).unwrap();
        assert_eq!(stats.files, 1);
        assert_eq!(stats.items, 1);
        assert_eq!(stats.resources, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(db::load_game_data(&conn).unwrap(), data);
    }
}
