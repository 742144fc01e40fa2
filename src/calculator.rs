//! Production rate calculator logic

use std::collections::HashSet;

use tracing::{debug, instrument};

use crate::graph::Graph;
use crate::models::{ItemId, RecipeId};
use crate::rational::{Rational, RationalError};
use crate::selector::RecipeSelector;
use crate::totals::Totals;

#[derive(Debug, thiserror::Error)]
pub enum CalcError {
    #[error("selector chose recipe {recipe} for {item}, but it does not produce it")]
    NotProduced { item: String, recipe: String },
    #[error("cannot compute rate of {recipe} for {item}: {source}")]
    Arithmetic {
        item: String,
        recipe: String,
        source: RationalError,
    },
    #[error("production cycle: {item} is required to produce itself")]
    Cycle { item: String },
}

struct Request<'a, S: ?Sized> {
    graph: &'a Graph,
    selector: &'a S,
    ignore: &'a HashSet<RecipeId>,
}

/// Compute the totals needed to sustain `rate` of `item` per second.
///
/// Demand fans out through the recipe chosen by `selector` for each item.
/// Recipes in `ignore` are still counted, but their ingredients are treated
/// as supplied from outside. On error no partial totals are returned.
#[instrument(level = "debug", skip(graph, selector, ignore))]
pub fn produce<S>(
    graph: &Graph,
    selector: &S,
    item: ItemId,
    rate: &Rational,
    ignore: &HashSet<RecipeId>,
) -> Result<Totals, CalcError>
where
    S: RecipeSelector + ?Sized,
{
    let request = Request {
        graph,
        selector,
        ignore,
    };
    let mut path = Vec::new();
    let mut totals = propagate(&request, item, rate, &mut path)?;
    totals.add_demand(item, rate);
    totals.compute_surplus();

    debug!(
        target_item = %graph.item(item).key,
        recipes = totals.rates().len(),
        surplus_items = totals.surplus().len(),
        "aggregation complete"
    );
    Ok(totals)
}

/// Aggregate each target independently and merge the results.
#[instrument(level = "debug", skip_all, fields(targets = targets.len()))]
pub fn produce_targets<S>(
    graph: &Graph,
    selector: &S,
    targets: &[(ItemId, Rational)],
    ignore: &HashSet<RecipeId>,
) -> Result<Totals, CalcError>
where
    S: RecipeSelector + ?Sized,
{
    let mut totals = Totals::new();
    for (item, rate) in targets {
        totals.merge(produce(graph, selector, *item, rate, ignore)?);
    }
    Ok(totals)
}

fn propagate<S>(
    request: &Request<'_, S>,
    item: ItemId,
    rate: &Rational,
    path: &mut Vec<ItemId>,
) -> Result<Totals, CalcError>
where
    S: RecipeSelector + ?Sized,
{
    let graph = request.graph;
    if path.contains(&item) {
        return Err(CalcError::Cycle {
            item: graph.item(item).key.clone(),
        });
    }

    let recipe_id = request.selector.select(graph, item);
    let recipe = graph.get_recipe(recipe_id).ok_or_else(|| CalcError::NotProduced {
        item: graph.item(item).key.clone(),
        recipe: format!("#{}", recipe_id.index()),
    })?;
    let describe = || (graph.item(item).key.clone(), recipe.key.clone());

    let gives = recipe.gives(item).ok_or_else(|| {
        let (item, recipe) = describe();
        CalcError::NotProduced { item, recipe }
    })?;
    let recipe_rate = rate.checked_div(gives).map_err(|source| {
        let (item, recipe) = describe();
        CalcError::Arithmetic {
            item,
            recipe,
            source,
        }
    })?;

    let mut totals = Totals::new();
    totals.add(recipe_id, &recipe_rate);
    totals.update_height(recipe_id, 0);
    for product in &recipe.products {
        totals.add_item(product.item, &(&recipe_rate * &product.amount));
    }
    // Alternatives the selector passed over still show up, at zero.
    for &alternative in graph.producers(item) {
        if alternative != recipe_id && !request.selector.excludes(alternative) {
            totals.add(alternative, &Rational::zero());
            totals.update_height(alternative, 0);
        }
    }

    if request.ignore.contains(&recipe_id) {
        return Ok(totals);
    }

    path.push(item);
    for ing in &recipe.ingredients {
        let demand = &recipe_rate * &ing.amount;
        totals.add_consumer(ing.item, recipe_id, &demand);
        let subtotals = propagate(request, ing.item, &demand, path)?;
        totals.combine(subtotals);
    }
    path.pop();

    Ok(totals)
}
