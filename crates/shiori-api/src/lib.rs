pub mod boards;
pub mod error;
pub mod health;
pub mod links;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::{AppState, AppStateInner};
