pub mod handlers;
pub mod imports;
pub mod middleware;
pub mod routes;

pub use routes::create_router;
