//! Per-item drill-down of where an item's rate comes from and goes to

use crate::graph::Graph;
use crate::models::{ItemId, RecipeId};
use crate::rational::Rational;
use crate::totals::Totals;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// An ingredient consumed by a recipe that makes the item.
    Input,
    /// The item consumed by a downstream recipe.
    Consumer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BreakdownRow {
    pub item: ItemId,
    pub recipe: RecipeId,
    pub rate: Rational,
    pub flow: Flow,
}

/// Rows for `item`: first the ingredients its invoked producers consume,
/// then each real downstream recipe's share of the item.
pub fn breakdown(graph: &Graph, totals: &Totals, item: ItemId) -> Vec<BreakdownRow> {
    let mut rows = Vec::new();

    for &recipe in graph.producers(item) {
        if totals.rate(recipe).is_none() {
            continue;
        }
        for ing in &graph.recipe(recipe).ingredients {
            let Some(rate) = totals
                .consumers_of(ing.item)
                .and_then(|consumers| consumers.get(&recipe))
            else {
                continue;
            };
            rows.push(BreakdownRow {
                item: ing.item,
                recipe,
                rate: rate.clone(),
                flow: Flow::Input,
            });
        }
    }

    if let Some(consumers) = totals.consumers_of(item) {
        for (&recipe, rate) in consumers {
            if graph.recipe(recipe).is_real() {
                rows.push(BreakdownRow {
                    item,
                    recipe,
                    rate: rate.clone(),
                    flow: Flow::Consumer,
                });
            }
        }
    }

    rows
}
