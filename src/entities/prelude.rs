pub use super::anime::Entity as Anime;
