// file: src/server/mod.rs
// description: web ui and json api served over http
// reference: internal module structure

pub mod handlers;
pub mod page;
pub mod routes;
pub mod server;
pub mod types;

pub use routes::create_router;
pub use server::{QaServer, shutdown_signal};
