//! Order ingestion request types.

use std::collections::HashSet;
use std::fmt;

use alloy::primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};

use crate::ingress::IngressError;

pub type OrderId = B256;

/// Length of an ECDSA signature with recovery id.
pub const SIGNATURE_LEN: usize = 65;

/// One encrypted share of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFragment {
    pub id: B256,
    pub order_id: OrderId,
    pub data: Bytes,
}

/// A fragment and the darknode it must be delivered to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentRoute {
    pub darknode: Address,
    pub fragment: OrderFragment,
}

impl FragmentRoute {
    pub fn validate(&self) -> Result<(), IngressError> {
        if self.darknode == Address::ZERO {
            return Err(IngressError::InvalidOrder("darknode address is zero".into()));
        }
        if self.fragment.id == B256::ZERO {
            return Err(IngressError::InvalidOrder("fragment id is zero".into()));
        }
        if self.fragment.data.is_empty() {
            return Err(IngressError::InvalidOrder(format!(
                "fragment {} has no data",
                self.fragment.id
            )));
        }
        Ok(())
    }
}

/// Signed request to open an order and distribute its fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenOrderRequest {
    pub signature: Bytes,
    pub order_id: OrderId,
    pub order_fragment_mappings: Vec<FragmentRoute>,
}

impl OpenOrderRequest {
    pub fn validate(&self) -> Result<(), IngressError> {
        if self.signature.len() != SIGNATURE_LEN {
            return Err(IngressError::InvalidOrder(format!(
                "signature must be {} bytes, got {}",
                SIGNATURE_LEN,
                self.signature.len()
            )));
        }
        if self.order_id == B256::ZERO {
            return Err(IngressError::InvalidOrder("order id is zero".into()));
        }
        if self.order_fragment_mappings.is_empty() {
            return Err(IngressError::InvalidOrder("no order fragments".into()));
        }

        let mut seen = HashSet::with_capacity(self.order_fragment_mappings.len());
        for route in &self.order_fragment_mappings {
            route.validate()?;
            if route.fragment.order_id != self.order_id {
                return Err(IngressError::InvalidOrder(format!(
                    "fragment {} belongs to order {}",
                    route.fragment.id, route.fragment.order_id
                )));
            }
            if !seen.insert(route.fragment.id) {
                return Err(IngressError::InvalidOrder(format!(
                    "duplicate fragment {}",
                    route.fragment.id
                )));
            }
        }
        Ok(())
    }
}

/// Ingestion pipeline label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pipeline {
    Orders,
    OrderFragments,
}

impl Pipeline {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pipeline::Orders => "order",
            Pipeline::OrderFragments => "order_fragment",
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pipeline::Orders => write!(f, "orders"),
            Pipeline::OrderFragments => write!(f, "order fragments"),
        }
    }
}
