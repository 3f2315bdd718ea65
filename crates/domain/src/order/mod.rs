//! Orders as seen by the payment pipeline.

mod mapping;
mod model;
mod notifier;
mod repository;
mod service;
mod state;

pub use mapping::StateMapping;
pub use model::{Order, PAYMENT_MODULE};
pub use notifier::{CustomerNotifier, LogNotifier};
pub use repository::{InMemoryOrderRepository, OrderRepository};
pub use service::OrderService;
pub use state::OrderState;
