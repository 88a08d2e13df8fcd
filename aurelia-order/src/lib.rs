pub mod checkout;
pub mod finance;
pub mod models;
pub mod payment;
pub mod paypal;
pub mod repository;

pub use checkout::{CheckoutManager, OrderError};
pub use models::{Installment, Order, OrderItem, OrderStatus, PaymentPlan};
pub use payment::{PaymentAdapter, PaymentIntent, PaymentStatus};
