//! Plain-text rendering of a calculation

use std::fmt;

use crate::breakdown::{Flow, breakdown};
use crate::cluster::{Cluster, cluster_recipes};
use crate::graph::Graph;
use crate::models::ItemId;
use crate::rational::{Rational, RationalError};
use crate::totals::Totals;

/// Time unit that target rates are entered in and results are shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RateUnit {
    #[default]
    #[value(name = "s")]
    Second,
    #[value(name = "m")]
    Minute,
    #[value(name = "h")]
    Hour,
}

impl RateUnit {
    pub fn seconds(self) -> i64 {
        match self {
            RateUnit::Second => 1,
            RateUnit::Minute => 60,
            RateUnit::Hour => 3600,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            RateUnit::Second => "s",
            RateUnit::Minute => "m",
            RateUnit::Hour => "h",
        }
    }

    /// Convert a rate in this unit to a per-second rate.
    pub fn to_per_second(self, rate: &Rational) -> Result<Rational, RationalError> {
        rate.checked_div(&Rational::from_integer(self.seconds()))
    }

    /// Convert a per-second rate to this unit.
    pub fn from_per_second(self, rate: &Rational) -> Rational {
        rate * &Rational::from_integer(self.seconds())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    pub unit: RateUnit,
    pub precision: usize,
    pub breakdown: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            unit: RateUnit::Second,
            precision: 3,
            breakdown: false,
        }
    }
}

/// A rendered view of one set of totals.
pub struct Report<'a> {
    graph: &'a Graph,
    totals: &'a Totals,
    clusters: Vec<Cluster>,
    options: ReportOptions,
}

impl<'a> Report<'a> {
    pub fn new(graph: &'a Graph, totals: &'a Totals, options: ReportOptions) -> Self {
        Self {
            graph,
            totals,
            clusters: cluster_recipes(graph, totals),
            options,
        }
    }

    fn rate(&self, rate: &Rational) -> String {
        self.options
            .unit
            .from_per_second(rate)
            .to_fixed(self.options.precision)
    }

    fn write_cluster(&self, f: &mut fmt::Formatter<'_>, cluster: &Cluster) -> fmt::Result {
        let rows = cluster.items.len().max(cluster.recipes.len());
        for i in 0..rows {
            let (item_name, item_rate, surplus) = match cluster.items.get(i) {
                Some(&item) => {
                    let produced = self.totals.item_rate(item).cloned().unwrap_or_default();
                    let surplus = self.totals.surplus_of(item).cloned().unwrap_or_default();
                    (
                        self.graph.item(item).name.as_str(),
                        self.rate(&(&produced - &surplus)),
                        if surplus.is_zero() {
                            String::new()
                        } else {
                            self.rate(&surplus)
                        },
                    )
                }
                None => ("", String::new(), String::new()),
            };
            let (recipe_name, recipe_rate) = match cluster.recipes.get(i) {
                Some(&recipe) => {
                    let rate = self.totals.rate(recipe).cloned().unwrap_or_default();
                    (self.graph.recipe(recipe).name.as_str(), self.rate(&rate))
                }
                None => ("", String::new()),
            };
            writeln!(
                f,
                "  {:<28} {:>12} {:>12}   {:<28} {:>12}",
                item_name, item_rate, surplus, recipe_name, recipe_rate
            )?;

            if self.options.breakdown {
                if let Some(&item) = cluster.items.get(i) {
                    self.write_breakdown(f, item)?;
                }
            }
        }
        Ok(())
    }

    fn write_breakdown(&self, f: &mut fmt::Formatter<'_>, item: ItemId) -> fmt::Result {
        for row in breakdown(self.graph, self.totals, item) {
            let arrow = match row.flow {
                Flow::Input => "<-",
                Flow::Consumer => "->",
            };
            writeln!(
                f,
                "      {} {} {} via {}",
                arrow,
                self.graph.item(row.item).name,
                self.rate(&row.rate),
                self.graph.recipe(row.recipe).name
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = self.options.unit.suffix();
        writeln!(f, "=== Production Totals ===")?;
        for (&item, rate) in self.totals.demand() {
            writeln!(
                f,
                "Target: {} @ {}/{}",
                self.graph.item(item).name,
                self.rate(rate),
                unit
            )?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "  {:<28} {:>12} {:>12}   {:<28} {:>12}",
            "Item",
            format!("items/{unit}"),
            format!("surplus/{unit}"),
            "Recipe",
            format!("cycles/{unit}")
        )?;
        writeln!(f, "  {}", "-".repeat(98))?;
        for cluster in &self.clusters {
            self.write_cluster(f, cluster)?;
        }
        writeln!(f)?;

        writeln!(f, "Raw inputs required:")?;
        for recipe in self.totals.topo() {
            let r = self.graph.recipe(recipe);
            let rate = self.totals.rate(recipe).cloned().unwrap_or_default();
            if r.is_resource() && !rate.is_zero() {
                writeln!(f, "  {} @ {}/{}", r.name, self.rate(&rate), unit)?;
            }
        }

        if !self.totals.surplus().is_empty() {
            writeln!(f)?;
            writeln!(f, "Surplus:")?;
            for (&item, rate) in self.totals.surplus() {
                writeln!(f, "  {} @ {}/{}", self.graph.item(item).name, self.rate(rate), unit)?;
            }
        }

        Ok(())
    }
}
