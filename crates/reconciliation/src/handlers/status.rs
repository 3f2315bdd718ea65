use domain::{CustomerNotifier, Order, OrderRepository, OrderState};
use gateway::GatewayResponse;
use ledger::Ledger;

use super::{HandlerContext, code_of};
use crate::transitions::status_target;
use crate::{HandlerError, PaymentFailure};

/// Precondition gate of every admin operation.
pub(crate) fn check_transaction_status<R, L, N>(
    ctx: &HandlerContext<'_, R, L, N>,
    order: &Order,
    response: &GatewayResponse,
) -> Result<(), PaymentFailure>
where
    R: OrderRepository,
    L: Ledger,
    N: CustomerNotifier,
{
    let orders = ctx.orders();

    if orders.is_in(order, OrderState::Fraud) {
        return Err(PaymentFailure::FraudBlocked);
    }

    if orders.is_in(order, OrderState::ReviewRequired) {
        return Err(PaymentFailure::ReviewBlocked);
    }

    if !response.is_approved() {
        return Err(PaymentFailure::OperationDeclined(code_of(response)));
    }

    Ok(())
}

pub(super) async fn order_status<R, L, N>(
    ctx: &HandlerContext<'_, R, L, N>,
    order: &mut Order,
    response: &GatewayResponse,
) -> Result<(), HandlerError>
where
    R: OrderRepository,
    L: Ledger,
    N: CustomerNotifier,
{
    let orders = ctx.orders();

    if orders.is_in(order, OrderState::Fraud) || orders.is_in(order, OrderState::ReviewRequired) {
        return Ok(());
    }

    if ctx.has_prior_failures() {
        orders.change_state(order, OrderState::Error).await?;
        return Ok(());
    }

    let target = match response.status().and_then(status_target) {
        Some(target) => target,
        None => {
            tracing::error!(
                order_id = %order.id,
                status = response.status().unwrap_or_default(),
                "Unexpected response status"
            );
            OrderState::Error
        }
    };

    orders.change_state(order, target).await?;
    Ok(())
}

pub(super) async fn action_status<R, L, N>(
    ctx: &HandlerContext<'_, R, L, N>,
    order: &mut Order,
    response: &GatewayResponse,
) -> Result<(), HandlerError>
where
    R: OrderRepository,
    L: Ledger,
    N: CustomerNotifier,
{
    if ctx.has_prior_failures() {
        return Ok(());
    }

    let Some(target) = response.status().and_then(status_target) else {
        tracing::warn!(
            order_id = %order.id,
            status = response.status().unwrap_or_default(),
            "Unrecognized status after admin action, order state left unchanged"
        );
        return Ok(());
    };

    let orders = ctx.orders();
    if !orders.is_in(order, target) {
        orders.change_state(order, target).await?;
    }
    Ok(())
}
