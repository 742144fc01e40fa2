//! Choosing which recipe supplies an item
//!
//! The calculator never decides between alternative recipes itself. It asks a
//! [`RecipeSelector`], which can be as simple as a closure.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::graph::Graph;
use crate::models::{ItemId, RecipeId};

pub trait RecipeSelector {
    /// The recipe that supplies all demand for `item`. It must produce `item`.
    fn select(&self, graph: &Graph, item: ItemId) -> RecipeId;

    /// Whether `recipe` has been ruled out for every item. Excluded recipes
    /// are not reported as zero-rate alternatives.
    fn excludes(&self, _recipe: RecipeId) -> bool {
        false
    }
}

impl<F> RecipeSelector for F
where
    F: Fn(ItemId) -> RecipeId,
{
    fn select(&self, _graph: &Graph, item: ItemId) -> RecipeId {
        self(item)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SelectorError {
    #[error("recipe {recipe} does not produce {item}")]
    NotAProducer { item: String, recipe: String },
    #[error("recipe {recipe} is disabled and cannot be chosen for {item}")]
    Disabled { item: String, recipe: String },
}

/// Per-item choices resolved once from user settings.
///
/// For each item: an explicit override wins; otherwise the enabled producer
/// sharing the item's key; otherwise the first enabled producer in load
/// order. Items whose producers are all disabled get the graph's disabled
/// recipe, marked max-priority so it ranks last.
#[derive(Debug, Clone)]
pub struct DefaultSelector {
    choices: Vec<RecipeId>,
    disabled: HashSet<RecipeId>,
}

impl DefaultSelector {
    pub fn new(
        graph: &mut Graph,
        overrides: &HashMap<ItemId, RecipeId>,
        disabled: &HashSet<RecipeId>,
    ) -> Result<Self, SelectorError> {
        let mut choices = Vec::with_capacity(graph.item_count());
        for index in 0..graph.item_count() {
            let item = ItemId::from_index(index);
            let choice = match overrides.get(&item) {
                Some(&recipe) => {
                    check_override(graph, item, recipe, disabled)?;
                    recipe
                }
                None => match default_choice(graph, item, disabled) {
                    Some(recipe) => recipe,
                    None => {
                        debug!(item = %graph.item(item).key, "all recipes disabled");
                        graph.disabled_recipe(item, true)
                    }
                },
            };
            choices.push(choice);
        }
        Ok(Self {
            choices,
            disabled: disabled.clone(),
        })
    }

    /// Default choices with nothing overridden or disabled.
    pub fn defaults(graph: &mut Graph) -> Self {
        let mut choices = Vec::with_capacity(graph.item_count());
        for index in 0..graph.item_count() {
            let item = ItemId::from_index(index);
            let choice = match default_choice(graph, item, &HashSet::new()) {
                Some(recipe) => recipe,
                None => graph.disabled_recipe(item, true),
            };
            choices.push(choice);
        }
        Self {
            choices,
            disabled: HashSet::new(),
        }
    }
}

impl RecipeSelector for DefaultSelector {
    fn select(&self, _graph: &Graph, item: ItemId) -> RecipeId {
        self.choices[item.index()]
    }

    fn excludes(&self, recipe: RecipeId) -> bool {
        self.disabled.contains(&recipe)
    }
}

fn default_choice(graph: &Graph, item: ItemId, disabled: &HashSet<RecipeId>) -> Option<RecipeId> {
    let key = &graph.item(item).key;
    let producers = graph.producers(item);
    producers
        .iter()
        .copied()
        .find(|r| !disabled.contains(r) && graph.recipe(*r).key == *key)
        .or_else(|| producers.iter().copied().find(|r| !disabled.contains(r)))
}

fn check_override(
    graph: &Graph,
    item: ItemId,
    recipe: RecipeId,
    disabled: &HashSet<RecipeId>,
) -> Result<(), SelectorError> {
    let describe = || (graph.item(item).key.clone(), graph.recipe(recipe).key.clone());
    if graph.recipe(recipe).gives(item).is_none() {
        let (item, recipe) = describe();
        return Err(SelectorError::NotAProducer { item, recipe });
    }
    if disabled.contains(&recipe) {
        let (item, recipe) = describe();
        return Err(SelectorError::Disabled { item, recipe });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GameData, ItemData, RecipeData, ResourceData};

    fn oil_graph() -> Graph {
        let data = GameData::default()
            .item(ItemData::new("crude", "Crude"))
            .item(ItemData::new("gas", "Gas"))
            .item(ItemData::new("heavy", "Heavy"))
            .resource(ResourceData::new("crude", "crude"))
            .recipe(RecipeData::new("basic", 5.0).ingredient("crude", 100.0).product("gas", 45.0))
            .recipe(
                RecipeData::new("advanced", 5.0)
                    .ingredient("crude", 100.0)
                    .product("heavy", 25.0)
                    .product("gas", 55.0),
            )
            .recipe(RecipeData::new("gas", 1.0).product("gas", 1.0));
        Graph::from_data(&data).unwrap()
    }

    #[test]
    fn closures_are_selectors() {
        let graph = oil_graph();
        let advanced = graph.recipe_id("advanced").unwrap();
        let select = |_item: ItemId| advanced;
        assert_eq!(select.select(&graph, graph.item_id("gas").unwrap()), advanced);
    }

    #[test]
    fn prefers_recipe_sharing_item_key() {
        let mut graph = oil_graph();
        let selector = DefaultSelector::defaults(&mut graph);
        let gas = graph.item_id("gas").unwrap();
        assert_eq!(selector.select(&graph, gas), graph.recipe_id("gas").unwrap());
        let heavy = graph.item_id("heavy").unwrap();
        assert_eq!(selector.select(&graph, heavy), graph.recipe_id("advanced").unwrap());
    }

    #[test]
    fn falls_back_to_first_enabled_producer() {
        let mut graph = oil_graph();
        let disabled = HashSet::from([graph.recipe_id("gas").unwrap()]);
        let selector = DefaultSelector::new(&mut graph, &HashMap::new(), &disabled).unwrap();
        let gas = graph.item_id("gas").unwrap();
        assert_eq!(selector.select(&graph, gas), graph.recipe_id("basic").unwrap());
    }

    #[test]
    fn all_disabled_uses_disabled_recipe() {
        let mut graph = oil_graph();
        let disabled = HashSet::from([graph.recipe_id("advanced").unwrap()]);
        let selector = DefaultSelector::new(&mut graph, &HashMap::new(), &disabled).unwrap();
        let heavy = graph.item_id("heavy").unwrap();
        let chosen = graph.recipe(selector.select(&graph, heavy));
        assert!(!chosen.is_real());
        assert!(chosen.max_priority());
    }

    #[test]
    fn override_wins() {
        let mut graph = oil_graph();
        let gas = graph.item_id("gas").unwrap();
        let advanced = graph.recipe_id("advanced").unwrap();
        let overrides = HashMap::from([(gas, advanced)]);
        let selector = DefaultSelector::new(&mut graph, &overrides, &HashSet::new()).unwrap();
        assert_eq!(selector.select(&graph, gas), advanced);
    }

    #[test]
    fn override_must_produce_item() {
        let mut graph = oil_graph();
        let heavy = graph.item_id("heavy").unwrap();
        let basic = graph.recipe_id("basic").unwrap();
        let overrides = HashMap::from([(heavy, basic)]);
        let err = DefaultSelector::new(&mut graph, &overrides, &HashSet::new()).unwrap_err();
        assert!(matches!(err, SelectorError::NotAProducer { .. }));
        assert_eq!(err.to_string(), "recipe basic does not produce heavy");
    }

    #[test]
    fn override_cannot_be_disabled() {
        let mut graph = oil_graph();
        let gas = graph.item_id("gas").unwrap();
        let basic = graph.recipe_id("basic").unwrap();
        let overrides = HashMap::from([(gas, basic)]);
        let disabled = HashSet::from([basic]);
        let err = DefaultSelector::new(&mut graph, &overrides, &disabled).unwrap_err();
        assert!(matches!(err, SelectorError::Disabled { .. }));
    }
}
