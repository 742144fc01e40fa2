//! Production Rate Calculator
//!
//! Computes exact recipe and item rates for a set of production targets.

use std::collections::{HashMap, HashSet};
use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing::{debug, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use rate_calculator::calculator::produce_targets;
use rate_calculator::data::{self, GameData};
use rate_calculator::db;
use rate_calculator::graph::Graph;
use rate_calculator::models::{ItemId, RecipeId};
use rate_calculator::rational::Rational;
use rate_calculator::report::{RateUnit, Report, ReportOptions};
use rate_calculator::selector::DefaultSelector;

#[derive(Parser)]
#[command(name = "rate-calculator")]
#[command(about = "Production rate calculator for recipe graphs")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, env = "RATECALC_DB", default_value = "rate_data.db")]
    database: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import item and recipe data from a directory of JSON files
    Import {
        /// Directory to search for *.json data files
        data_dir: PathBuf,

        /// Clear existing data before import
        #[arg(long)]
        clear: bool,
    },

    /// Calculate rates needed to sustain one or more targets
    Calc {
        /// Targets as item:rate (e.g. "electronic-circuit:2", "plastic-bar:1/3")
        #[arg(required = true)]
        targets: Vec<String>,

        /// Recipe whose ingredients are supplied from outside
        #[arg(long = "ignore", value_name = "RECIPE")]
        ignore: Vec<String>,

        /// Force the recipe used for an item, as item=recipe
        #[arg(long = "recipe", value_name = "ITEM=RECIPE")]
        recipes: Vec<String>,

        /// Recipe that may not be chosen for any item
        #[arg(long = "disable", value_name = "RECIPE")]
        disable: Vec<String>,

        /// Time unit for target rates and results
        #[arg(short = 'u', long, value_enum, default_value = "s")]
        rate_unit: RateUnit,

        /// Decimal places shown for rates
        #[arg(short, long, default_value_t = 3)]
        precision: usize,

        /// Show where each item comes from and goes to
        #[arg(short, long)]
        verbose: bool,
    },

    /// List all items in the database
    ListItems,

    /// List all resources and recipes in the database
    ListRecipes,

    /// Show details for a specific recipe
    Recipe {
        /// Recipe key
        key: String,
    },

    /// Initialize empty database with schema
    Init,

    /// Load the bundled sample data set
    LoadSample,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let conn = Connection::open(&cli.database)
        .with_context(|| format!("failed to open database {}", cli.database.display()))?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Import { data_dir, clear } => {
            if clear {
                println!("Clearing existing data...");
                db::clear_data(&conn)?;
            }

            let stats = data::import_to_database(&conn, &data_dir)?;
            println!("\n{}", stats);
        }

        Commands::Calc {
            targets,
            ignore,
            recipes,
            disable,
            rate_unit,
            precision,
            verbose,
        } => {
            let game_data = db::load_game_data(&conn)?;
            let mut graph = Graph::from_data(&game_data).context("invalid game data")?;
            debug!(
                items = graph.item_count(),
                recipes = graph.recipe_count(),
                "graph loaded"
            );

            let targets = targets
                .iter()
                .map(|t| parse_target(&graph, t, rate_unit))
                .collect::<Result<Vec<_>>>()?;
            let ignore = recipe_set(&graph, &ignore)?;
            let disabled = recipe_set(&graph, &disable)?;
            let overrides = parse_overrides(&graph, &recipes)?;

            let selector = DefaultSelector::new(&mut graph, &overrides, &disabled)?;
            let totals = produce_targets(&graph, &selector, &targets, &ignore)?;
            info!(recipes = totals.rates().len(), "calculation complete");

            let options = ReportOptions {
                unit: rate_unit,
                precision,
                breakdown: verbose,
            };
            print!("{}", Report::new(&graph, &totals, options));
        }

        Commands::ListItems => {
            let items = db::list_items(&conn)?;
            if items.is_empty() {
                println!("No items in database. Run 'import' or 'load-sample' first.");
            } else {
                println!("{:<30} {:<30} {:>4}", "Key", "Name", "Row");
                println!("{}", "-".repeat(66));
                for item in items {
                    println!("{:<30} {:<30} {:>4}", item.key, item.name, item.row);
                }
            }
        }

        Commands::ListRecipes => {
            let recipes = db::list_recipes(&conn)?;
            if recipes.is_empty() {
                println!("No recipes in database. Run 'import' or 'load-sample' first.");
            } else {
                println!("Recipes:");
                for (key, name) in recipes {
                    println!("  {:<36} {}", key, name);
                }
            }
        }

        Commands::Recipe { key } => {
            let game_data = db::load_game_data(&conn)?;
            let graph = Graph::from_data(&game_data).context("invalid game data")?;
            match graph.recipe_id(&key) {
                Some(id) => {
                    let recipe = graph.recipe(id);
                    println!("Recipe: {}", recipe.name);
                    println!("  Key: {}", recipe.key);
                    if let Some(category) = &recipe.category {
                        println!("  Category: {}", category);
                    }
                    if recipe.is_resource() {
                        println!("  Raw resource");
                    } else {
                        println!("  Time: {}s", recipe.time.to_decimal(3));
                    }

                    if !recipe.ingredients.is_empty() {
                        println!("  Ingredients:");
                        for ing in &recipe.ingredients {
                            println!(
                                "    {} x {}",
                                ing.amount.to_decimal(3),
                                graph.item(ing.item).name
                            );
                        }
                    }
                    if !recipe.products.is_empty() {
                        println!("  Products:");
                        for product in &recipe.products {
                            println!(
                                "    {} x {}",
                                product.amount.to_decimal(3),
                                graph.item(product.item).name
                            );
                        }
                    }
                }
                None => println!("Recipe '{}' not found", key),
            }
        }

        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::LoadSample => {
            db::clear_data(&conn)?;
            let sample = GameData::sample()?;
            db::store_game_data(&conn, &sample)?;
            println!(
                "Sample data loaded: {} items, {} resources, {} recipes",
                sample.items.len(),
                sample.resources.len(),
                sample.recipes.len()
            );
        }
    }

    Ok(())
}

/// Parse `item:rate`, with the rate given in `unit`.
fn parse_target(graph: &Graph, spec: &str, unit: RateUnit) -> Result<(ItemId, Rational)> {
    let (key, rate) = spec
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("target '{}' must be item:rate", spec))?;
    let item = graph
        .item_id(key)
        .ok_or_else(|| anyhow!("unknown item '{}'", key))?;
    let rate: Rational = rate
        .parse()
        .with_context(|| format!("bad rate in target '{}'", spec))?;
    if rate.is_negative() {
        bail!("rate in target '{}' must not be negative", spec);
    }
    Ok((item, unit.to_per_second(&rate)?))
}

fn recipe_set(graph: &Graph, keys: &[String]) -> Result<HashSet<RecipeId>> {
    keys.iter()
        .map(|key| {
            graph
                .recipe_id(key)
                .ok_or_else(|| anyhow!("unknown recipe '{}'", key))
        })
        .collect()
}

fn parse_overrides(graph: &Graph, specs: &[String]) -> Result<HashMap<ItemId, RecipeId>> {
    let mut overrides = HashMap::new();
    for spec in specs {
        let (item_key, recipe_key) = spec
            .split_once('=')
            .ok_or_else(|| anyhow!("recipe override '{}' must be item=recipe", spec))?;
        let item = graph
            .item_id(item_key)
            .ok_or_else(|| anyhow!("unknown item '{}'", item_key))?;
        let recipe = graph
            .recipe_id(recipe_key)
            .ok_or_else(|| anyhow!("unknown recipe '{}'", recipe_key))?;
        overrides.insert(item, recipe);
    }
    Ok(overrides)
}

/// Logs go to stderr; reports go to stdout.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("RATECALC_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "rate_calculator=debug,info"
        } else {
            "rate_calculator=info,warn"
        })
    });

    let format = env::var("RATECALC_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}
