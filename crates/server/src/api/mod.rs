pub mod batch;
pub mod errors;
pub mod handlers;
pub mod media;
pub mod middleware;
pub mod migration;
pub mod routes;

pub use routes::create_router;
