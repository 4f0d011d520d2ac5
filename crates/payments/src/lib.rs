//! Payment-gateway mapping and remote payment ids.

pub mod gateway;
pub mod payment;

pub use gateway::{
    GatewayData, GatewayResolver, InMemoryPaymentGatewayRepository, PaymentGateway,
    PaymentGatewayRepository, PaymentGateways,
};
pub use payment::{InMemoryPaymentRepository, Payment, PaymentRepository};
