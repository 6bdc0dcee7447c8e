/// State management module
///
/// This module handles all gallery state, including:
/// - Shared data structures (data.rs)
/// - The append-only link cache (cache.rs)
/// - Navigation, paging and the fetch lifecycle (controller.rs)

pub mod cache;
pub mod controller;
pub mod data;
