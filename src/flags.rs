pub mod models;

pub use models::Flag;
