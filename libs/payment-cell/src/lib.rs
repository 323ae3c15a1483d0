pub mod models;
pub mod services;

pub use models::{
    HandoffForm, PayerDetails, PaymentError, PaymentHandoff, PaymentInitiation,
    PaymentInitiationResponse,
};
pub use services::gateway::{HttpPaymentGateway, PaymentGateway};
pub use services::handoff::PaymentHandoffBuilder;
