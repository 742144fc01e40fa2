//! The aggregated result of a demand propagation

use std::collections::BTreeMap;

use crate::models::{ItemId, RecipeId};
use crate::rational::Rational;

/// Per-recipe and per-item rates for one aggregation request.
///
/// All rates are per second. Maps are ordered by id, so iteration follows
/// load order and is identical on every run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Totals {
    rates: BTreeMap<RecipeId, Rational>,
    items: BTreeMap<ItemId, Rational>,
    consumers: BTreeMap<ItemId, BTreeMap<RecipeId, Rational>>,
    demand: BTreeMap<ItemId, Rational>,
    surplus: BTreeMap<ItemId, Rational>,
    heights: BTreeMap<RecipeId, usize>,
}

impl Totals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invocation rate of every recipe involved, including zero-rate alternatives.
    pub fn rates(&self) -> &BTreeMap<RecipeId, Rational> {
        &self.rates
    }

    /// Produced rate of every item made by an invoked recipe.
    pub fn items(&self) -> &BTreeMap<ItemId, Rational> {
        &self.items
    }

    /// For each item, the rate each downstream recipe consumes.
    pub fn consumers(&self) -> &BTreeMap<ItemId, BTreeMap<RecipeId, Rational>> {
        &self.consumers
    }

    /// Externally requested rate of each target item.
    pub fn demand(&self) -> &BTreeMap<ItemId, Rational> {
        &self.demand
    }

    /// Produced rate left over after every consumer and target is satisfied.
    pub fn surplus(&self) -> &BTreeMap<ItemId, Rational> {
        &self.surplus
    }

    /// Longest chain length from each recipe to a target.
    pub fn heights(&self) -> &BTreeMap<RecipeId, usize> {
        &self.heights
    }

    pub fn rate(&self, recipe: RecipeId) -> Option<&Rational> {
        self.rates.get(&recipe)
    }

    pub fn item_rate(&self, item: ItemId) -> Option<&Rational> {
        self.items.get(&item)
    }

    pub fn surplus_of(&self, item: ItemId) -> Option<&Rational> {
        self.surplus.get(&item)
    }

    pub fn consumers_of(&self, item: ItemId) -> Option<&BTreeMap<RecipeId, Rational>> {
        self.consumers.get(&item)
    }

    /// Total rate at which `item` is consumed by recipes and targets.
    pub fn consumed(&self, item: ItemId) -> Rational {
        let mut total = self.demand.get(&item).cloned().unwrap_or_default();
        if let Some(consumers) = self.consumers.get(&item) {
            for rate in consumers.values() {
                total += rate;
            }
        }
        total
    }

    /// Recipes in layered order: targets first, then by increasing depth.
    /// Ties keep load order.
    pub fn topo(&self) -> Vec<RecipeId> {
        let mut order: Vec<RecipeId> = self.rates.keys().copied().collect();
        order.sort_by_key(|r| (self.heights.get(r).copied().unwrap_or(0), *r));
        order
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub(crate) fn add(&mut self, recipe: RecipeId, rate: &Rational) {
        *self.rates.entry(recipe).or_default() += rate;
    }

    pub(crate) fn add_item(&mut self, item: ItemId, rate: &Rational) {
        *self.items.entry(item).or_default() += rate;
    }

    pub(crate) fn add_consumer(&mut self, item: ItemId, recipe: RecipeId, rate: &Rational) {
        *self
            .consumers
            .entry(item)
            .or_default()
            .entry(recipe)
            .or_default() += rate;
    }

    pub(crate) fn add_demand(&mut self, item: ItemId, rate: &Rational) {
        *self.demand.entry(item).or_default() += rate;
    }

    pub(crate) fn update_height(&mut self, recipe: RecipeId, height: usize) {
        let entry = self.heights.entry(recipe).or_insert(height);
        if height > *entry {
            *entry = height;
        }
    }

    /// Fold in the totals of an ingredient one level further from the target.
    pub(crate) fn combine(&mut self, child: Totals) {
        self.sum_rates(&child);
        for (recipe, height) in child.heights {
            self.update_height(recipe, height + 1);
        }
    }

    /// Merge finished totals for another target at the same level.
    ///
    /// Aggregating `a` and `b` separately and merging gives the same totals
    /// as a single request that demands both.
    pub fn merge(&mut self, other: Totals) {
        self.sum_rates(&other);
        for (item, rate) in &other.demand {
            self.add_demand(*item, rate);
        }
        for (recipe, height) in other.heights {
            self.update_height(recipe, height);
        }
        self.compute_surplus();
    }

    fn sum_rates(&mut self, other: &Totals) {
        for (recipe, rate) in &other.rates {
            self.add(*recipe, rate);
        }
        for (item, rate) in &other.items {
            self.add_item(*item, rate);
        }
        for (item, consumers) in &other.consumers {
            for (recipe, rate) in consumers {
                self.add_consumer(*item, *recipe, rate);
            }
        }
    }

    /// Record every item whose production exceeds its consumption.
    pub(crate) fn compute_surplus(&mut self) {
        let surplus: BTreeMap<ItemId, Rational> = self
            .items
            .iter()
            .filter_map(|(&item, produced)| {
                let excess = produced - &self.consumed(item);
                (excess > 0).then_some((item, excess))
            })
            .collect();
        self.surplus = surplus;
    }
}
