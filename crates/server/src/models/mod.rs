//! Domain models shared by repositories, services, and route handlers.

pub mod order;
pub mod product;
pub mod user;

pub use order::{NewOrder, NewOrderItem, Order, OrderItem, PaymentResult, ShippingAddress};
pub use product::{NewProduct, Product, Review};
pub use user::User;
