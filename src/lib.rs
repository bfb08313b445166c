pub mod admin;
pub mod catalog;
pub mod scoreboard;
pub mod scoring;
pub mod store;
pub mod tabular;
pub mod types;
