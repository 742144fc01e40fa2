//! Data models for items, recipes and ingredients

use crate::rational::Rational;

/// Index of an [`Item`] in its [`Graph`](crate::graph::Graph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(u32);

/// Index of a [`Recipe`] in its [`Graph`](crate::graph::Graph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecipeId(u32);

impl ItemId {
    /// `index` must fit in a `u32`; graph construction checks arena sizes.
    pub(crate) fn from_index(index: usize) -> Self {
        debug_assert!(u32::try_from(index).is_ok());
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl RecipeId {
    /// `index` must fit in a `u32`; graph construction checks arena sizes.
    pub(crate) fn from_index(index: usize) -> Self {
        debug_assert!(u32::try_from(index).is_ok());
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
pub struct Item {
    pub key: String,
    pub name: String,
    pub row: i64, // ordering hint for display
    pub category: Option<String>,
}

/// An item and the amount of it consumed or produced per recipe cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Ingredient {
    pub item: ItemId,
    pub amount: Rational,
}

impl Ingredient {
    pub fn new(item: ItemId, amount: Rational) -> Self {
        Self { item, amount }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeKind {
    Standard,
    /// Raw extraction: no inputs, one unit of one item, zero time.
    Resource,
    /// Stand-in for an item whose real recipes have all been excluded.
    Disabled { max_priority: bool },
}

#[derive(Debug, Clone)]
pub struct Recipe {
    pub key: String,
    pub name: String,
    pub category: Option<String>,
    pub time: Rational,
    pub ingredients: Vec<Ingredient>,
    pub products: Vec<Ingredient>,
    pub kind: RecipeKind,
}

impl Recipe {
    /// Amount of `item` produced per cycle, or `None` if this recipe doesn't make it.
    pub fn gives(&self, item: ItemId) -> Option<&Rational> {
        self.products
            .iter()
            .find(|product| product.item == item)
            .map(|product| &product.amount)
    }

    pub fn is_resource(&self) -> bool {
        matches!(self.kind, RecipeKind::Resource)
    }

    /// False only for synthetic disabled recipes, which have no building.
    pub fn is_real(&self) -> bool {
        !matches!(self.kind, RecipeKind::Disabled { .. })
    }

    pub fn max_priority(&self) -> bool {
        matches!(self.kind, RecipeKind::Disabled { max_priority: true })
    }
}
