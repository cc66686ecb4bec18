//! PageRelay server — HTTP conversion API and the browser agent socket.

pub mod routes;
pub mod state;

pub use routes::build_router;
pub use state::AppState;
