pub mod audit;
pub mod auth;
pub mod dashboard;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod tickets;
pub mod users;

pub use routes::create_router;
