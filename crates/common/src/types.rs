use serde::{Deserialize, Serialize};

/// Identifier of an order in the host storefront.
///
/// Orders are owned by the host system; this crate only ever refers to
/// them by id, so the wrapper exists to keep order ids from being confused
/// with cart ids or state ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(i64);

impl OrderId {
    /// Creates an order id from the host's numeric id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw numeric id.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for OrderId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<OrderId> for i64 {
    fn from(id: OrderId) -> Self {
        id.0
    }
}

/// Identifier of the cart an order was placed from.
///
/// The gateway knows orders by a reference derived from the cart id, not by
/// the host order id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartId(i64);

impl CartId {
    /// Creates a cart id from the host's numeric id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw numeric id.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for CartId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for CartId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Host identifier of an order state.
///
/// The host storefront persists order states as numeric rows it creates at
/// setup time; the logical payment states are mapped onto these ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(i64);

impl StateId {
    /// Creates a state id from the host's numeric id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the raw numeric id.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for StateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for StateId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}
