// storefront/src/services/mod.rs

pub mod catalog;
pub mod inventory;
pub mod payment;
pub mod payment_mock;
pub mod signature;
pub mod stripe;
pub mod webhook_event;

pub use payment::{CheckoutSession, CheckoutSessionRequest, PaymentProcessor, SessionLineItem};
pub use payment_mock::MockPaymentProcessor;
pub use stripe::StripeClient;
