//! Database schema and operations

use anyhow::Result;
use rusqlite::Connection;

use crate::data::{AmountData, GameData, ItemData, RecipeData, ResourceData};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Keys are not unique here: duplicates are rejected when the graph is built
        CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            key TEXT NOT NULL,
            name TEXT NOT NULL,
            display_row INTEGER NOT NULL DEFAULT 0,
            category TEXT
        );

        -- Raw extraction, one unit of item_key per cycle
        CREATE TABLE IF NOT EXISTS resources (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            key TEXT NOT NULL,
            item_key TEXT NOT NULL,
            category TEXT
        );

        CREATE TABLE IF NOT EXISTS recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            key TEXT NOT NULL,
            name TEXT NOT NULL,
            category TEXT,
            time_s REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS recipe_ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL,
            item_key TEXT NOT NULL,
            amount REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS recipe_products (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL,
            item_key TEXT NOT NULL,
            amount REAL NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_recipe_ingredients_recipe ON recipe_ingredients(recipe_id);
        CREATE INDEX IF NOT EXISTS idx_recipe_products_recipe ON recipe_products(recipe_id);
        CREATE INDEX IF NOT EXISTS idx_recipe_products_item ON recipe_products(item_key);
        "#,
    )?;
    Ok(())
}

/// Clear all imported data (for re-import)
pub fn clear_data(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM recipe_products;
        DELETE FROM recipe_ingredients;
        DELETE FROM recipes;
        DELETE FROM resources;
        DELETE FROM items;
        "#,
    )?;
    Ok(())
}

pub fn insert_item(conn: &Connection, item: &ItemData) -> Result<()> {
    conn.execute(
        "INSERT INTO items (key, name, display_row, category) VALUES (?1, ?2, ?3, ?4)",
        (&item.key, &item.name, item.row, &item.category),
    )?;
    Ok(())
}

pub fn insert_resource(conn: &Connection, resource: &ResourceData) -> Result<()> {
    conn.execute(
        "INSERT INTO resources (key, item_key, category) VALUES (?1, ?2, ?3)",
        (&resource.key, &resource.item, &resource.category),
    )?;
    Ok(())
}

/// Insert a recipe with its ingredients and products, returning its row id
pub fn insert_recipe(conn: &Connection, recipe: &RecipeData) -> Result<i64> {
    conn.execute(
        "INSERT INTO recipes (key, name, category, time_s) VALUES (?1, ?2, ?3, ?4)",
        (&recipe.key, &recipe.name, &recipe.category, recipe.time),
    )?;
    let recipe_id = conn.last_insert_rowid();

    for ing in &recipe.ingredients {
        conn.execute(
            "INSERT INTO recipe_ingredients (recipe_id, item_key, amount) VALUES (?1, ?2, ?3)",
            (recipe_id, &ing.name, ing.amount),
        )?;
    }
    for product in &recipe.products {
        conn.execute(
            "INSERT INTO recipe_products (recipe_id, item_key, amount) VALUES (?1, ?2, ?3)",
            (recipe_id, &product.name, product.amount),
        )?;
    }
    Ok(recipe_id)
}

/// Append a whole data set, preserving declaration order
pub fn store_game_data(conn: &Connection, data: &GameData) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    for item in &data.items {
        insert_item(&tx, item)?;
    }
    for resource in &data.resources {
        insert_resource(&tx, resource)?;
    }
    for recipe in &data.recipes {
        insert_recipe(&tx, recipe)?;
    }
    tx.commit()?;
    Ok(())
}

/// Load everything back in insertion order
pub fn load_game_data(conn: &Connection) -> Result<GameData> {
    let items = list_items(conn)?;

    let mut stmt =
        conn.prepare("SELECT key, item_key, category FROM resources ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(ResourceData {
            key: row.get(0)?,
            item: row.get(1)?,
            category: row.get(2)?,
        })
    })?;
    let mut resources = Vec::new();
    for row in rows {
        resources.push(row?);
    }

    let mut stmt =
        conn.prepare("SELECT id, key, name, category, time_s FROM recipes ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            RecipeData {
                key: row.get(1)?,
                name: row.get(2)?,
                category: row.get(3)?,
                time: row.get(4)?,
                ingredients: Vec::new(),
                products: Vec::new(),
            },
        ))
    })?;
    let mut recipes = Vec::new();
    for row in rows {
        let (id, mut recipe) = row?;
        recipe.ingredients = get_amounts(conn, "recipe_ingredients", id)?;
        recipe.products = get_amounts(conn, "recipe_products", id)?;
        recipes.push(recipe);
    }

    Ok(GameData {
        items,
        resources,
        recipes,
    })
}

fn get_amounts(conn: &Connection, table: &str, recipe_id: i64) -> Result<Vec<AmountData>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT item_key, amount FROM {table} WHERE recipe_id = ?1 ORDER BY id"
    ))?;
    let rows = stmt.query_map([recipe_id], |row| {
        Ok(AmountData {
            name: row.get(0)?,
            amount: row.get(1)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// List all items in declaration order
pub fn list_items(conn: &Connection) -> Result<Vec<ItemData>> {
    let mut stmt =
        conn.prepare("SELECT key, name, display_row, category FROM items ORDER BY id")?;

    let rows = stmt.query_map([], |row| {
        Ok(ItemData {
            key: row.get(0)?,
            name: row.get(1)?,
            row: row.get(2)?,
            category: row.get(3)?,
        })
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}

/// List recipe keys and names, resources first
pub fn list_recipes(conn: &Connection) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(
        "SELECT key, name FROM (
             SELECT 0 AS src, r.id AS id, r.key AS key, i.name AS name
             FROM resources r LEFT JOIN items i ON i.key = r.item_key
             UNION ALL
             SELECT 1, id, key, name FROM recipes
         ) ORDER BY src, id",
    )?;

    let rows = stmt.query_map([], |row| {
        let key: String = row.get(0)?;
        let name: Option<String> = row.get(1)?;
        Ok((key.clone(), name.unwrap_or(key)))
    })?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}
