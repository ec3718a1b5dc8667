// Library root: the card catalog, draw engine, and in-memory session store
// shared by the HTTP server and its tests.

pub mod catalog;
pub mod error;
pub mod model;
pub mod session;
pub mod template;

pub use catalog::{Catalog, CatalogError, CatalogStats, CardFilter, DrawFilter};
pub use error::{Error, Result};
pub use model::{Card, Category, CategoryInfo, Color, Difficulty, DrawnCard, GameSession};
pub use session::{History, SessionStore};
