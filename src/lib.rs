//! Production rate calculator
//!
//! Loads a recipe graph, propagates target rates through it with exact
//! rational arithmetic, and groups the resulting recipes for display.

pub mod breakdown;
pub mod calculator;
pub mod cluster;
pub mod data;
pub mod db;
pub mod graph;
pub mod models;
pub mod rational;
pub mod report;
pub mod selector;
pub mod totals;
