pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{PasswordStrength, PasswordValidation, ValidationResult};
pub use router::identity_routes;
