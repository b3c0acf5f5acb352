pub mod models;

pub use models::Friend;
