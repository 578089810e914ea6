pub mod routes;
mod server;
pub use server::{app, load_context, load_index, serve};
pub mod public;
mod state;
pub use state::AppState;
