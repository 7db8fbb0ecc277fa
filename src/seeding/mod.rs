pub mod profile;
pub mod service;

pub use service::{SeedFailure, SeedRequest, SeedService, SeedSummary};
