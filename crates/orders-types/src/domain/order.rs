use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of an order.
///
/// Serialized as the upper-case names (`"CREATED"`, `"PAID"`, ...). Any other
/// string is rejected when deserializing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Created,
    Paid,
    Shipped,
    Completed,
    Failed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Created,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Completed,
        OrderStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::Paid => "PAID",
            OrderStatus::Shipped => "SHIPPED",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Failed => "FAILED",
        }
    }

    /// `true` for `Completed` and `Failed`; no transition leaves these.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Failed)
    }

    /// States reachable from `self` in a single step.
    pub fn allowed_transitions(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Created => &[OrderStatus::Paid, OrderStatus::Failed],
            OrderStatus::Paid => &[OrderStatus::Shipped, OrderStatus::Failed],
            OrderStatus::Shipped => &[OrderStatus::Completed, OrderStatus::Failed],
            OrderStatus::Completed | OrderStatus::Failed => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| OrderError::UnknownStatus(s.to_string()))
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemError {
    #[error("product id must not be empty")]
    EmptyProductId,

    #[error("item quantity must be greater than zero")]
    NonPositiveQuantity,

    #[error("item price must be greater than zero")]
    NonPositivePrice,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum OrderError {
    #[error("order id must not be empty")]
    EmptyOrderId,

    #[error("user id must not be empty")]
    EmptyUserId,

    #[error("order must contain at least one item")]
    NoItems,

    #[error("invalid item at position {index}: {source}")]
    InvalidItem {
        index: usize,
        #[source]
        source: ItemError,
    },

    #[error("order total must be greater than zero, got {0}")]
    NonPositiveTotal(f64),

    #[error("order total is too large to represent")]
    TotalOverflow,

    #[error("order status must be CREATED, got {0}")]
    NotCreated(OrderStatus),

    #[error("order is {0} and can no longer be updated")]
    Finalized(OrderStatus),

    #[error("order status is already {0}")]
    AlreadyInStatus(OrderStatus),

    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("unknown status: {0}")]
    UnknownStatus(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub product_id: String,
    pub quantity: i32,
    pub price: f64,
}

impl Item {
    pub fn validate(&self) -> Result<(), ItemError> {
        if self.product_id.is_empty() {
            return Err(ItemError::EmptyProductId);
        }
        if self.quantity <= 0 {
            return Err(ItemError::NonPositiveQuantity);
        }
        // NaN and infinities are not prices.
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(ItemError::NonPositivePrice);
        }
        Ok(())
    }

    pub fn subtotal(&self) -> f64 {
        f64::from(self.quantity) * self.price
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub items: Vec<Item>,
    pub total: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(user_id: String, items: Vec<Item>) -> Result<Self, OrderError> {
        if user_id.is_empty() {
            return Err(OrderError::EmptyUserId);
        }
        if items.is_empty() {
            return Err(OrderError::NoItems);
        }
        validate_items(&items)?;
        let total = sum_items(&items);
        if total.is_infinite() {
            return Err(OrderError::TotalOverflow);
        }

        let now = Utc::now();
        let order = Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            items,
            total,
            status: OrderStatus::Created,
            created_at: now,
            updated_at: now,
        };
        Ok(order)
    }

    /// Recomputes `total` from the items and bumps `updated_at`.
    pub fn calculate_total(&mut self) -> f64 {
        self.total = sum_items(&self.items);
        self.touch();
        self.total
    }

    /// Swaps the item list and recomputes the total. Nothing is validated
    /// here; run [`Order::validate_update`] before persisting.
    pub fn replace_items(&mut self, items: Vec<Item>) -> f64 {
        self.items = items;
        self.calculate_total()
    }

    /// Gate for persisting a brand-new order.
    pub fn validate_create(&self) -> Result<(), OrderError> {
        self.validate_structure()?;
        if self.status != OrderStatus::Created {
            return Err(OrderError::NotCreated(self.status));
        }
        Ok(())
    }

    /// Gate for persisting changes to an existing order.
    pub fn validate_update(&self) -> Result<(), OrderError> {
        self.validate_structure()?;
        if self.status.is_terminal() {
            return Err(OrderError::Finalized(self.status));
        }
        Ok(())
    }

    pub fn validate_status_change(&self, next: OrderStatus) -> Result<(), OrderError> {
        if self.id.is_empty() {
            return Err(OrderError::EmptyOrderId);
        }
        if self.status == next {
            return Err(OrderError::AlreadyInStatus(next));
        }
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        Ok(())
    }

    /// The only way `status` changes after construction. On error the order
    /// is left untouched.
    pub fn change_status(&mut self, next: OrderStatus) -> Result<(), OrderError> {
        self.validate_status_change(next)?;
        self.status = next;
        self.touch();
        Ok(())
    }

    fn validate_structure(&self) -> Result<(), OrderError> {
        if self.id.is_empty() {
            return Err(OrderError::EmptyOrderId);
        }
        if self.user_id.is_empty() {
            return Err(OrderError::EmptyUserId);
        }
        if self.items.is_empty() {
            return Err(OrderError::NoItems);
        }
        validate_items(&self.items)?;
        if self.total.is_infinite() {
            return Err(OrderError::TotalOverflow);
        }
        if !self.total.is_finite() || self.total <= 0.0 {
            return Err(OrderError::NonPositiveTotal(self.total));
        }
        Ok(())
    }

    /// Moves `updated_at` strictly forward, even if the wall clock stalls or
    /// steps backwards, so every stored change carries a distinct version.
    fn touch(&mut self) {
        let floor = self.updated_at.max(self.created_at) + chrono::Duration::nanoseconds(1);
        self.updated_at = Utc::now().max(floor);
    }
}

fn validate_items(items: &[Item]) -> Result<(), OrderError> {
    items.iter().enumerate().try_for_each(|(index, item)| {
        item.validate()
            .map_err(|source| OrderError::InvalidItem { index, source })
    })
}

fn sum_items(items: &[Item]) -> f64 {
    items.iter().map(Item::subtotal).sum()
}
