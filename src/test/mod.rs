pub mod analytics;
pub mod utils;
