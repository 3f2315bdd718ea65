use domain::{CustomerNotifier, Order, OrderRepository};
use gateway::GatewayResponse;
use ledger::{Ledger, VoidRecord};

use super::HandlerContext;
use crate::{HandlerError, PaymentFailure};

pub(super) async fn void<R, L, N>(
    ctx: &HandlerContext<'_, R, L, N>,
    order: &mut Order,
    response: &GatewayResponse,
) -> Result<(), HandlerError>
where
    R: OrderRepository,
    L: Ledger,
    N: CustomerNotifier,
{
    if !response.is_approved() {
        return Ok(());
    }

    let detail = response
        .transaction()
        .ok_or(PaymentFailure::IncompleteResponse("transaction"))?;
    let transaction_id = detail
        .id
        .clone()
        .ok_or(PaymentFailure::IncompleteResponse("transaction.id"))?;
    let target = detail
        .target_transaction_id
        .as_deref()
        .ok_or(PaymentFailure::IncompleteResponse("transaction.targetTransactionId"))?;

    let ledger = ctx.ledger();
    let authorized = match ledger.find_payment(order.id, target).await? {
        Some(payment) => {
            ledger.delete_payment(payment.id).await?;
            Some(payment.amount)
        }
        None => {
            tracing::warn!(order_id = %order.id, target, "Voided authorization has no local payment record");
            None
        }
    };

    let total = detail.amount.or(authorized).unwrap_or_default();
    ledger
        .append_void(VoidRecord::new(order.id, transaction_id, total))
        .await?;

    tracing::info!(order_id = %order.id, target, total = %total, "Authorization voided");
    Ok(())
}
