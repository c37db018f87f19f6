pub mod api;
pub mod app;
pub mod config;
pub mod models;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod tools;
pub mod types;
pub mod ui;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;
