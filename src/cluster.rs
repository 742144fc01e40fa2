//! Grouping recipes that share products for display
//!
//! Recipes that produce a common tracked item are shown together, so the
//! rates from every producer of an item can be read side by side.

use std::collections::{BTreeMap, BTreeSet};

use crate::graph::Graph;
use crate::models::{ItemId, RecipeId};
use crate::totals::Totals;

/// A set of recipes connected through shared products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// Members in layered order.
    pub recipes: Vec<RecipeId>,
    /// Tracked products of the members, without repeats.
    pub items: Vec<ItemId>,
}

/// Partition the recipes in `totals` into display clusters.
///
/// Two recipes land in the same cluster when they both produce an item
/// tracked in `totals`, directly or through a chain of such items. Clusters
/// are ordered by their earliest member in [`Totals::topo`].
pub fn cluster_recipes(graph: &Graph, totals: &Totals) -> Vec<Cluster> {
    let mut groups: Vec<BTreeSet<RecipeId>> = Vec::new();
    let mut group_of: BTreeMap<RecipeId, usize> = BTreeMap::new();
    for &recipe in totals.rates().keys() {
        if !graph.recipe(recipe).products.is_empty() {
            group_of.insert(recipe, groups.len());
            groups.push(BTreeSet::from([recipe]));
        }
    }

    // Invoked producers of each tracked item, taken from the recipes' own
    // products; disabled recipes are missing from `Graph::producers`.
    let mut producers: BTreeMap<ItemId, Vec<RecipeId>> = BTreeMap::new();
    for &recipe in group_of.keys() {
        for product in &graph.recipe(recipe).products {
            if totals.items().contains_key(&product.item) {
                let list = producers.entry(product.item).or_default();
                if !list.contains(&recipe) {
                    list.push(recipe);
                }
            }
        }
    }

    for recipes in producers.values() {
        let Some((&first, rest)) = recipes.split_first() else {
            continue;
        };
        for recipe in rest {
            let target = group_of[&first];
            let source = group_of[recipe];
            if source == target {
                continue;
            }
            let moved = std::mem::take(&mut groups[source]);
            for &member in &moved {
                group_of.insert(member, target);
            }
            groups[target].extend(moved);
        }
    }

    let order: BTreeMap<RecipeId, usize> = totals
        .topo()
        .into_iter()
        .enumerate()
        .map(|(position, recipe)| (recipe, position))
        .collect();

    let mut clusters: Vec<Cluster> = groups
        .into_iter()
        .filter(|group| !group.is_empty())
        .map(|group| {
            let mut recipes: Vec<RecipeId> = group.into_iter().collect();
            recipes.sort_by_key(|r| order[r]);
            let mut items = Vec::new();
            for &recipe in &recipes {
                for product in &graph.recipe(recipe).products {
                    if totals.items().contains_key(&product.item) && !items.contains(&product.item)
                    {
                        items.push(product.item);
                    }
                }
            }
            Cluster { recipes, items }
        })
        .collect();
    clusters.sort_by_key(|cluster| order[&cluster.recipes[0]]);
    clusters
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::calculator::produce;
    use crate::data::{GameData, ItemData, RecipeData, ResourceData};
    use crate::rational::Rational;
    use crate::selector::DefaultSelector;

    fn keys(graph: &Graph, cluster: &Cluster) -> Vec<String> {
        cluster
            .recipes
            .iter()
            .map(|&r| graph.recipe(r).key.clone())
            .collect()
    }

    #[test]
    fn shared_output_groups_alternatives() {
        let data = GameData::default()
            .item(ItemData::new("x", "X"))
            .item(ItemData::new("z", "Z"))
            .recipe(RecipeData::new("recipe1", 1.0).product("x", 1.0))
            .recipe(RecipeData::new("recipe2", 1.0).product("x", 1.0))
            .recipe(RecipeData::new("recipe3", 1.0).ingredient("x", 1.0).product("z", 1.0));
        let mut graph = Graph::from_data(&data).unwrap();
        let selector = DefaultSelector::defaults(&mut graph);
        let z = graph.item_id("z").unwrap();
        let totals = produce(&graph, &selector, z, &Rational::one(), &HashSet::new()).unwrap();

        let clusters = cluster_recipes(&graph, &totals);
        assert_eq!(clusters.len(), 2);
        assert_eq!(keys(&graph, &clusters[0]), ["recipe3"]);
        assert_eq!(keys(&graph, &clusters[1]), ["recipe1", "recipe2"]);
        assert_eq!(clusters[1].items, [graph.item_id("x").unwrap()]);
    }

    #[test]
    fn unrelated_recipes_stay_apart() {
        let data = GameData::default()
            .item(ItemData::new("ore", "Ore"))
            .item(ItemData::new("plate", "Plate"))
            .resource(ResourceData::new("ore", "ore"))
            .recipe(RecipeData::new("plate", 1.0).ingredient("ore", 1.0).product("plate", 1.0));
        let mut graph = Graph::from_data(&data).unwrap();
        let selector = DefaultSelector::defaults(&mut graph);
        let plate = graph.item_id("plate").unwrap();
        let totals = produce(&graph, &selector, plate, &Rational::one(), &HashSet::new()).unwrap();

        let clusters = cluster_recipes(&graph, &totals);
        assert_eq!(clusters.len(), 2);
        assert_eq!(keys(&graph, &clusters[0]), ["plate"]);
        assert_eq!(keys(&graph, &clusters[1]), ["ore"]);
        assert_eq!(clusters[1].items, [graph.item_id("ore").unwrap()]);
    }

    #[test]
    fn chains_of_shared_items_merge_transitively() {
        // a and b share x; b and c share y; a and c share nothing directly.
        let data = GameData::default()
            .item(ItemData::new("x", "X"))
            .item(ItemData::new("y", "Y"))
            .item(ItemData::new("w", "W"))
            .item(ItemData::new("out", "Out"))
            .recipe(RecipeData::new("a", 1.0).product("x", 1.0))
            .recipe(RecipeData::new("b", 1.0).product("x", 1.0).product("y", 1.0))
            .recipe(RecipeData::new("c", 1.0).product("y", 1.0).product("w", 1.0))
            .recipe(
                RecipeData::new("out", 1.0)
                    .ingredient("x", 1.0)
                    .ingredient("w", 1.0)
                    .product("out", 1.0),
            );
        let graph = Graph::from_data(&data).unwrap();
        let id = |key: &str| graph.recipe_id(key).unwrap();
        let (a, b, c, out) = (id("a"), id("b"), id("c"), id("out"));
        let x = graph.item_id("x").unwrap();
        let y = graph.item_id("y").unwrap();
        let w = graph.item_id("w").unwrap();
        // a supplies x, c supplies w (and y as a byproduct); b is an alternative.
        let select = move |item: ItemId| {
            if item == x {
                a
            } else if item == w || item == y {
                c
            } else {
                out
            }
        };
        let target = graph.item_id("out").unwrap();
        let totals = produce(&graph, &select, target, &Rational::one(), &HashSet::new()).unwrap();
        assert!(totals.rate(b).unwrap().is_zero());

        let clusters = cluster_recipes(&graph, &totals);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].recipes, [out]);
        let mut merged = clusters[1].recipes.clone();
        merged.sort();
        assert_eq!(merged, [a, b, c]);
        // b never ran, so y is tracked only through c.
        assert!(clusters[1].items.contains(&y));
        assert!(clusters[1].items.contains(&w));
    }

    #[test]
    fn disabled_fallback_joins_its_item_cluster() {
        let data = GameData::default()
            .item(ItemData::new("x", "X"))
            .item(ItemData::new("z", "Z"))
            .recipe(RecipeData::new("recipe1", 1.0).product("x", 1.0))
            .recipe(RecipeData::new("recipe2", 1.0).product("x", 1.0))
            .recipe(RecipeData::new("z", 1.0).ingredient("x", 1.0).product("z", 1.0));
        let mut graph = Graph::from_data(&data).unwrap();
        let disabled = HashSet::from([
            graph.recipe_id("recipe1").unwrap(),
            graph.recipe_id("recipe2").unwrap(),
        ]);
        let selector = DefaultSelector::new(&mut graph, &Default::default(), &disabled).unwrap();
        let z = graph.item_id("z").unwrap();
        let totals = produce(&graph, &selector, z, &Rational::one(), &HashSet::new()).unwrap();

        let x = graph.item_id("x").unwrap();
        let clusters = cluster_recipes(&graph, &totals);
        let holding_x: Vec<&Cluster> =
            clusters.iter().filter(|c| c.items.contains(&x)).collect();
        assert_eq!(holding_x.len(), 1);
        assert_eq!(keys(&graph, holding_x[0]), ["x:disabled"]);
        assert_eq!(keys(&graph, &clusters[0]), ["z"]);
    }

    #[test]
    fn disabled_fallback_shares_cluster_with_byproduct_maker() {
        // "both" makes x as a byproduct of y; x itself falls back to a disabled recipe.
        let data = GameData::default()
            .item(ItemData::new("x", "X"))
            .item(ItemData::new("y", "Y"))
            .item(ItemData::new("z", "Z"))
            .recipe(RecipeData::new("make-x", 1.0).product("x", 1.0))
            .recipe(RecipeData::new("both", 1.0).product("y", 1.0).product("x", 1.0))
            .recipe(
                RecipeData::new("z", 1.0)
                    .ingredient("x", 1.0)
                    .ingredient("y", 1.0)
                    .product("z", 1.0),
            );
        let mut graph = Graph::from_data(&data).unwrap();
        let x = graph.item_id("x").unwrap();
        let both = graph.recipe_id("both").unwrap();
        let fallback = graph.disabled_recipe(x, true);
        let y = graph.item_id("y").unwrap();
        let z_recipe = graph.recipe_id("z").unwrap();
        let select = move |item: ItemId| {
            if item == x {
                fallback
            } else if item == y {
                both
            } else {
                z_recipe
            }
        };
        let z = graph.item_id("z").unwrap();
        let totals = produce(&graph, &select, z, &Rational::one(), &HashSet::new()).unwrap();

        let clusters = cluster_recipes(&graph, &totals);
        let holding_x: Vec<&Cluster> =
            clusters.iter().filter(|c| c.items.contains(&x)).collect();
        assert_eq!(holding_x.len(), 1);
        assert!(holding_x[0].recipes.contains(&fallback));
        assert!(holding_x[0].recipes.contains(&both));
    }

    #[test]
    fn every_recipe_in_exactly_one_cluster() {
        let mut graph = Graph::from_data(&GameData::sample().unwrap()).unwrap();
        let selector = DefaultSelector::defaults(&mut graph);
        let target = graph.item_id("advanced-circuit").unwrap();
        let totals = produce(&graph, &selector, target, &Rational::one(), &HashSet::new()).unwrap();

        let clusters = cluster_recipes(&graph, &totals);
        let mut seen = HashSet::new();
        for cluster in &clusters {
            for recipe in &cluster.recipes {
                assert!(seen.insert(*recipe), "recipe in two clusters");
            }
        }
        assert_eq!(seen.len(), totals.rates().len());
    }

    #[test]
    fn clustering_is_deterministic() {
        let mut graph = Graph::from_data(&GameData::sample().unwrap()).unwrap();
        let selector = DefaultSelector::defaults(&mut graph);
        let target = graph.item_id("solid-fuel").unwrap();
        let totals = produce(&graph, &selector, target, &Rational::one(), &HashSet::new()).unwrap();
        assert_eq!(cluster_recipes(&graph, &totals), cluster_recipes(&graph, &totals));
    }
}
