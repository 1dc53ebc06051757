pub mod app_state;
pub mod error;
pub mod health;
pub mod request_log;
pub mod routes;
pub mod signature;
pub mod webhook;


pub use app_state::AppState;
pub use error::{ApiError, ServerError, ServerResult};
pub use routes::build_router;
pub use signature::{SIGNATURE_HEADER, sign, verify};
