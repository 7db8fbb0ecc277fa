pub mod service;

pub use service::{RawSample, ReadingService};
