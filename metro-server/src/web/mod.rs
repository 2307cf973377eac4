//! Web layer for the metro departures server.
//!
//! JSON endpoints handing resolved departures, or the station list to
//! choose from, to the presentation layer.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
