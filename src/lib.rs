// Library exports for the CLI and integration tests

pub mod config;
pub mod html;
pub mod http;
pub mod import;
pub mod item_map;
pub mod models;
pub mod sources;

// Mock fetcher shared by unit and integration tests
#[doc(hidden)]
pub mod test_support;
