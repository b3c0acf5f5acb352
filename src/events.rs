pub mod context;
mod events;
mod handlers;
pub mod presence;
pub mod tasks;
mod api;

pub use context::EventHub;
pub use events::{Event, EventBody, SystemMessage};
pub use handlers::router;
