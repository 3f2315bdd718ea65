use async_trait::async_trait;

use super::{Order, OrderState};
use crate::Result;

/// Sends the customer the message attached to an order state.
#[async_trait]
pub trait CustomerNotifier: Send + Sync {
    async fn notify(&self, order: &Order, state: OrderState) -> Result<()>;
}

/// Notifier that only logs. Mail delivery belongs to the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl CustomerNotifier for LogNotifier {
    async fn notify(&self, order: &Order, state: OrderState) -> Result<()> {
        tracing::info!(order_id = %order.id, state = %state, "Customer notified of order state");
        Ok(())
    }
}
