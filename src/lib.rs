pub mod config;
pub mod engine;
pub mod gesture;
pub mod limits;
pub mod model;
pub mod notify;
pub mod observability;
pub mod saver;
pub mod store;
