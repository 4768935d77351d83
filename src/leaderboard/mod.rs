pub mod handlers;
pub mod ranker;

pub use handlers::routes as router;
