use domain::{CustomerNotifier, Order, OrderRepository};
use gateway::GatewayResponse;
use ledger::{Ledger, RefundRecord};

use super::{HandlerContext, check_transaction_status};
use crate::{HandlerError, PaymentFailure};

pub(super) async fn refund<R, L, N>(
    ctx: &HandlerContext<'_, R, L, N>,
    order: &mut Order,
    response: &GatewayResponse,
) -> Result<(), HandlerError>
where
    R: OrderRepository,
    L: Ledger,
    N: CustomerNotifier,
{
    // A refund that fails the status check is skipped, never reported.
    if let Err(failure) = check_transaction_status(ctx, order, response) {
        tracing::warn!(order_id = %order.id, error = %failure, "Refund not recorded");
        return Ok(());
    }

    let detail = response
        .transaction()
        .ok_or(PaymentFailure::IncompleteResponse("transaction"))?;
    let transaction_id = detail
        .id
        .clone()
        .ok_or(PaymentFailure::IncompleteResponse("transaction.id"))?;
    let total = detail
        .amount
        .ok_or(PaymentFailure::IncompleteResponse("transaction.amount"))?;

    ctx.ledger()
        .append_refund(RefundRecord::new(order.id, transaction_id, total))
        .await?;

    tracing::info!(order_id = %order.id, total = %total, "Refund recorded");
    Ok(())
}
