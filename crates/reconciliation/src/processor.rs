//! Response processor running handler chains.

use std::sync::Arc;
use std::time::Instant;

use domain::{CustomerNotifier, Order, OrderRepository, OrderService};
use gateway::GatewayResponse;
use ledger::Ledger;

use crate::handlers::{HandlerContext, ResponseHandler};
use crate::{HandlerChainResult, HandlerError, ReconciliationError, Result};

/// Runs a chain of response handlers over one order and one response.
///
/// Handlers run strictly in order. Declared failures are logged and
/// collected, and the remaining handlers still run so the terminal status
/// handler can move the order to `ERROR`. Any other error aborts the chain
/// immediately. When at least one handler failed, the run ends with an
/// aggregate failure joining all messages.
pub struct ResponseProcessor<R, L, N> {
    orders: Arc<OrderService<R, L, N>>,
}

impl<R, L, N> Clone for ResponseProcessor<R, L, N> {
    fn clone(&self) -> Self {
        Self {
            orders: Arc::clone(&self.orders),
        }
    }
}

impl<R, L, N> ResponseProcessor<R, L, N>
where
    R: OrderRepository,
    L: Ledger,
    N: CustomerNotifier,
{
    /// Creates a new processor.
    pub fn new(orders: Arc<OrderService<R, L, N>>) -> Self {
        Self { orders }
    }

    /// Returns the order service handlers act through.
    pub fn orders(&self) -> &Arc<OrderService<R, L, N>> {
        &self.orders
    }

    /// Processes a gateway response.
    #[tracing::instrument(skip(self, order, response, handlers), fields(order_id = %order.id, handlers = handlers.len()))]
    pub async fn process(
        &self,
        order: &mut Order,
        response: &GatewayResponse,
        handlers: &[ResponseHandler],
    ) -> Result<()> {
        let start = Instant::now();
        let mut chain = HandlerChainResult::default();

        for handler in handlers {
            let ctx = HandlerContext::new(&self.orders, chain.len());

            match handler.handle(&ctx, order, response).await {
                Ok(()) => {}
                Err(HandlerError::Failure(failure)) => {
                    tracing::error!(handler = %handler, error = %failure, "Payment handler failed");
                    metrics::counter!(
                        "response_handler_failures_total",
                        "handler" => handler.name(),
                        "kind" => failure.kind()
                    )
                    .increment(1);
                    chain.push(failure);
                }
                Err(HandlerError::Fatal(e)) => {
                    tracing::error!(handler = %handler, error = %e, "Payment handler aborted the chain");
                    metrics::counter!("response_processor_runs_total", "outcome" => "aborted")
                        .increment(1);
                    return Err(ReconciliationError::Domain(e));
                }
            }
        }

        let outcome = if chain.is_empty() { "ok" } else { "failed" };
        metrics::counter!("response_processor_runs_total", "outcome" => outcome).increment(1);
        metrics::histogram!("response_processor_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        chain.into_result()
    }
}
