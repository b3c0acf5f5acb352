pub mod api;
pub mod handlers;
pub mod models;

pub use handlers::router;
pub use models::Room;
