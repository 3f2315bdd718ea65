use domain::{CustomerNotifier, Order, OrderRepository};
use gateway::GatewayResponse;
use ledger::Ledger;

use super::HandlerContext;
use crate::HandlerError;
use crate::transitions::risk_target;

pub(super) async fn risk<R, L, N>(
    ctx: &HandlerContext<'_, R, L, N>,
    order: &mut Order,
    response: &GatewayResponse,
) -> Result<(), HandlerError>
where
    R: OrderRepository,
    L: Ledger,
    N: CustomerNotifier,
{
    let risk = response.risk_response();
    let code = risk.and_then(|r| r.gateway_code.as_deref());
    let decision = risk
        .and_then(|r| r.review.as_ref())
        .and_then(|review| review.decision.as_deref());

    let Some(target) = risk_target(code, decision) else {
        return Ok(());
    };

    let orders = ctx.orders();
    if orders.is_in(order, target) {
        return Ok(());
    }

    tracing::info!(order_id = %order.id, risk = code, decision, state = %target, "Applying risk assessment");
    orders.change_state(order, target).await?;
    Ok(())
}
