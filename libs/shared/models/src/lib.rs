pub mod auth;
pub mod error;

pub use auth::Credential;
pub use error::AppError;
