//! Mapping between logical payment states and host state identifiers.

use std::collections::{HashMap, HashSet};

use common::StateId;

use super::OrderState;
use crate::{DomainError, Result};

/// Resolves logical states to host state identifiers and back.
///
/// A mapping is always complete (every [`OrderState`] has an identifier) and
/// injective (no two states share an identifier), so both lookup directions
/// are well defined. It also records which states notify the customer when
/// an order enters them.
#[derive(Debug, Clone)]
pub struct StateMapping {
    ids: HashMap<OrderState, StateId>,
    states: HashMap<StateId, OrderState>,
    notify: HashSet<OrderState>,
}

impl StateMapping {
    /// Builds a mapping, rejecting incomplete or ambiguous tables.
    ///
    /// Customer notification defaults to the states the host sends emails for.
    pub fn new(entries: impl IntoIterator<Item = (OrderState, StateId)>) -> Result<Self> {
        let ids: HashMap<OrderState, StateId> = entries.into_iter().collect();

        if let Some(missing) = OrderState::ALL.into_iter().find(|s| !ids.contains_key(s)) {
            return Err(DomainError::UnmappedState(missing));
        }

        let mut states = HashMap::with_capacity(ids.len());
        for state in OrderState::ALL {
            let id = ids[&state];
            if let Some(first) = states.insert(id, state) {
                return Err(DomainError::DuplicateStateId {
                    id,
                    first,
                    second: state,
                });
            }
        }

        Ok(Self {
            ids,
            states,
            notify: Self::default_notify(),
        })
    }

    fn default_notify() -> HashSet<OrderState> {
        [
            OrderState::Authorized,
            OrderState::PaymentAccepted,
            OrderState::Canceled,
            OrderState::Refunded,
            OrderState::PartiallyRefunded,
            OrderState::Error,
        ]
        .into_iter()
        .collect()
    }

    /// Replaces the set of states that notify the customer.
    pub fn with_notifications(mut self, states: impl IntoIterator<Item = OrderState>) -> Self {
        self.notify = states.into_iter().collect();
        self
    }

    /// Returns the host identifier of a state.
    pub fn id(&self, state: OrderState) -> StateId {
        // Completeness is checked in `new`.
        self.ids[&state]
    }

    /// Returns the logical state behind a host identifier, if it is one of ours.
    pub fn state(&self, id: StateId) -> Option<OrderState> {
        self.states.get(&id).copied()
    }

    /// Returns true if the identifier is the one mapped to `state`.
    pub fn is(&self, id: StateId, state: OrderState) -> bool {
        self.id(state) == id
    }

    /// Returns true if entering `state` notifies the customer.
    pub fn notifies(&self, state: OrderState) -> bool {
        self.notify.contains(&state)
    }
}

impl Default for StateMapping {
    /// Host defaults: the storefront's built-in states for payment accepted,
    /// canceled, refunded and error, plus the states installed by the payment
    /// module.
    fn default() -> Self {
        let ids = HashMap::from([
            (OrderState::PaymentAccepted, StateId::new(2)),
            (OrderState::Canceled, StateId::new(6)),
            (OrderState::Refunded, StateId::new(7)),
            (OrderState::Error, StateId::new(8)),
            (OrderState::AwaitingPayment, StateId::new(20)),
            (OrderState::Authorized, StateId::new(21)),
            (OrderState::ReviewRequired, StateId::new(22)),
            (OrderState::Fraud, StateId::new(23)),
            (OrderState::PartiallyRefunded, StateId::new(24)),
        ]);
        let states = ids.iter().map(|(s, id)| (*id, *s)).collect();

        Self {
            ids,
            states,
            notify: Self::default_notify(),
        }
    }
}
