//! The static recipe/item graph
//!
//! Items and recipes live in arenas addressed by [`ItemId`] and [`RecipeId`].
//! The producer/use index is built once, after every recipe has been loaded,
//! and never changes afterwards. A built [`Graph`] can be shared between
//! threads; each aggregation only reads it.

use std::collections::HashMap;

use tracing::debug;

use crate::data::{AmountData, GameData, RecipeData};
use crate::models::{Ingredient, Item, ItemId, Recipe, RecipeId, RecipeKind};
use crate::rational::{Rational, RationalError};

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("repeated item key: {0}")]
    DuplicateItem(String),
    #[error("repeated recipe key: {0}")]
    DuplicateRecipe(String),
    #[error("recipe {recipe} references unknown item {item}")]
    UnknownItem { recipe: String, item: String },
    #[error("bad item: no recipe produces {0}")]
    NoProducer(String),
    #[error("too many {kind}: {count} does not fit a 32-bit id")]
    TooLarge { kind: &'static str, count: usize },
    #[error("recipe {recipe} has an invalid amount: {source}")]
    InvalidAmount {
        recipe: String,
        source: RationalError,
    },
}

/// Items keyed by their unique string key, before any recipe is attached.
#[derive(Debug, Default)]
pub struct ItemSet {
    items: Vec<Item>,
    keys: HashMap<String, ItemId>,
}

impl ItemSet {
    pub fn get(&self, key: &str) -> Option<ItemId> {
        self.keys.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn resolve(&self, recipe: &str, key: &str) -> Result<ItemId, GraphError> {
        self.get(key).ok_or_else(|| GraphError::UnknownItem {
            recipe: recipe.to_string(),
            item: key.to_string(),
        })
    }
}

/// Build the item set. Fails on a repeated key.
pub fn get_items(data: &GameData) -> Result<ItemSet, GraphError> {
    check_capacity("items", data.items.len())?;
    let mut set = ItemSet::default();
    for d in &data.items {
        if set.keys.contains_key(&d.key) {
            return Err(GraphError::DuplicateItem(d.key.clone()));
        }
        let id = ItemId::from_index(set.items.len());
        set.items.push(Item {
            key: d.key.clone(),
            name: d.name.clone(),
            row: d.row,
            category: d.category.clone(),
        });
        set.keys.insert(d.key.clone(), id);
    }
    Ok(set)
}

/// Ids are `u32` indexes, so an arena may hold at most `u32::MAX` entries.
fn check_capacity(kind: &'static str, count: usize) -> Result<(), GraphError> {
    match u32::try_from(count) {
        Ok(_) => Ok(()),
        Err(_) => Err(GraphError::TooLarge { kind, count }),
    }
}

/// Build resource recipes, then standard recipes, then the producer/use
/// index, and finally check that every item has a producer.
pub fn get_recipes(data: &GameData, items: ItemSet) -> Result<Graph, GraphError> {
    // Each item may later gain two disabled recipes.
    check_capacity(
        "recipes",
        data.resources
            .len()
            .saturating_add(data.recipes.len())
            .saturating_add(items.len().saturating_mul(2)),
    )?;
    let mut recipes: Vec<Recipe> = Vec::new();
    let mut recipe_keys: HashMap<String, RecipeId> = HashMap::new();

    let mut register = |recipe: Recipe| -> Result<(), GraphError> {
        if recipe_keys.contains_key(&recipe.key) {
            return Err(GraphError::DuplicateRecipe(recipe.key));
        }
        recipe_keys.insert(recipe.key.clone(), RecipeId::from_index(recipes.len()));
        recipes.push(recipe);
        Ok(())
    };

    for d in &data.resources {
        let item = items.resolve(&d.key, &d.item)?;
        register(Recipe {
            key: d.key.clone(),
            name: items.items[item.index()].name.clone(),
            category: d.category.clone(),
            time: Rational::zero(),
            ingredients: Vec::new(),
            products: vec![Ingredient::new(item, Rational::one())],
            kind: RecipeKind::Resource,
        })?;
    }
    for d in &data.recipes {
        register(make_recipe(d, &items)?)?;
    }

    let mut producers = vec![Vec::new(); items.len()];
    let mut uses = vec![Vec::new(); items.len()];
    for (index, recipe) in recipes.iter().enumerate() {
        let id = RecipeId::from_index(index);
        for ing in &recipe.ingredients {
            let list: &mut Vec<RecipeId> = &mut uses[ing.item.index()];
            if !list.contains(&id) {
                list.push(id);
            }
        }
        for product in &recipe.products {
            let list: &mut Vec<RecipeId> = &mut producers[product.item.index()];
            if !list.contains(&id) {
                list.push(id);
            }
        }
    }

    for (item, recipes) in items.items.iter().zip(&producers) {
        if recipes.is_empty() {
            return Err(GraphError::NoProducer(item.key.clone()));
        }
    }

    debug!(
        items = items.items.len(),
        recipes = recipes.len(),
        "recipe graph built"
    );

    let data_recipes = recipes.len();
    Ok(Graph {
        items: items.items,
        item_keys: items.keys,
        recipes,
        recipe_keys,
        data_recipes,
        producers,
        uses,
        disabled: HashMap::new(),
    })
}

fn make_recipe(d: &RecipeData, items: &ItemSet) -> Result<Recipe, GraphError> {
    let amount = |value: f64| {
        Rational::from_float(value).map_err(|source| GraphError::InvalidAmount {
            recipe: d.key.clone(),
            source,
        })
    };
    let ingredients = |list: &[AmountData]| -> Result<Vec<Ingredient>, GraphError> {
        list.iter()
            .map(|a| Ok(Ingredient::new(items.resolve(&d.key, &a.name)?, amount(a.amount)?)))
            .collect()
    };

    Ok(Recipe {
        key: d.key.clone(),
        name: d.name.clone(),
        category: d.category.clone(),
        time: amount(d.time)?,
        ingredients: ingredients(&d.ingredients)?,
        products: ingredients(&d.products)?,
        kind: RecipeKind::Standard,
    })
}

#[derive(Debug)]
pub struct Graph {
    items: Vec<Item>,
    item_keys: HashMap<String, ItemId>,
    recipes: Vec<Recipe>,
    recipe_keys: HashMap<String, RecipeId>,
    // Recipes past this index are synthetic disabled recipes.
    data_recipes: usize,
    producers: Vec<Vec<RecipeId>>,
    uses: Vec<Vec<RecipeId>>,
    disabled: HashMap<(ItemId, bool), RecipeId>,
}

impl Graph {
    pub fn from_data(data: &GameData) -> Result<Self, GraphError> {
        get_recipes(data, get_items(data)?)
    }

    pub fn item(&self, id: ItemId) -> &Item {
        &self.items[id.index()]
    }

    pub fn recipe(&self, id: RecipeId) -> &Recipe {
        &self.recipes[id.index()]
    }

    /// Like [`Graph::recipe`], but `None` for an id this graph never issued.
    pub fn get_recipe(&self, id: RecipeId) -> Option<&Recipe> {
        self.recipes.get(id.index())
    }

    pub fn item_id(&self, key: &str) -> Option<ItemId> {
        self.item_keys.get(key).copied()
    }

    pub fn recipe_id(&self, key: &str) -> Option<RecipeId> {
        self.recipe_keys.get(key).copied()
    }

    pub fn items(&self) -> impl Iterator<Item = (ItemId, &Item)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (ItemId::from_index(i), item))
    }

    /// Recipes loaded from data, in load order. Disabled recipes are excluded.
    pub fn recipes(&self) -> impl Iterator<Item = (RecipeId, &Recipe)> {
        self.recipes[..self.data_recipes]
            .iter()
            .enumerate()
            .map(|(i, recipe)| (RecipeId::from_index(i), recipe))
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.data_recipes
    }

    /// Recipes that produce `item`, in load order.
    pub fn producers(&self, item: ItemId) -> &[RecipeId] {
        &self.producers[item.index()]
    }

    /// Recipes that consume `item`, in load order.
    pub fn uses(&self, item: ItemId) -> &[RecipeId] {
        &self.uses[item.index()]
    }

    /// The fallback recipe that makes `item` out of nothing.
    ///
    /// Created on first request and reused afterwards. It is never listed
    /// among the item's producers.
    pub fn disabled_recipe(&mut self, item: ItemId, max_priority: bool) -> RecipeId {
        if let Some(&id) = self.disabled.get(&(item, max_priority)) {
            return id;
        }
        let source = &self.items[item.index()];
        let id = RecipeId::from_index(self.recipes.len());
        self.recipes.push(Recipe {
            key: format!("{}:disabled", source.key),
            name: source.name.clone(),
            category: None,
            time: Rational::zero(),
            ingredients: Vec::new(),
            products: vec![Ingredient::new(item, Rational::one())],
            kind: RecipeKind::Disabled { max_priority },
        });
        self.disabled.insert((item, max_priority), id);
        id
    }
}
