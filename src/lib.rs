pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod readings;
pub mod seeding;
pub mod store;
pub mod thermal;
pub mod weather;
