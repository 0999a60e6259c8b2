pub mod anime_service;
pub mod validation;

pub use anime_service::{AnimeError, AnimeService};
pub use validation::ValidationError;
