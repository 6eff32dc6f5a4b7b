pub mod binding;
pub mod cache;
pub mod engine;
pub mod error;
pub mod models;
pub mod repository;
pub mod session;
pub mod settings;

pub use binding::*;
pub use cache::*;
pub use engine::*;
pub use error::*;
pub use models::*;
pub use repository::*;
pub use session::*;
pub use settings::*;
