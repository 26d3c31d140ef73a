use crate::error::{Result, ShopError};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Largest order number the checkout simulator hands out.
pub const MAX_ORDER_NUMBER: u64 = 9_999_999_999;

/// Backend identifier of an order.
///
/// The API sends it as a JSON number, pages and URLs carry it as text, so it
/// is stored as a string either way.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawOrderId", into = "String")]
pub struct OrderId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOrderId {
    Number(u64),
    Text(String),
}

impl From<RawOrderId> for OrderId {
    fn from(raw: RawOrderId) -> Self {
        match raw {
            RawOrderId::Number(n) => Self(n.to_string()),
            RawOrderId::Text(s) => Self(s),
        }
    }
}

impl OrderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for OrderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<OrderId> for String {
    fn from(id: OrderId) -> Self {
        id.0
    }
}

impl FromStr for OrderId {
    type Err = ShopError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.contains('/') {
            return Err(ShopError::ValidationError(format!(
                "Invalid order id: {s:?}"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the buyer pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentMethod {
    #[default]
    Cash,
    /// M-Pesa; the payment completes asynchronously and must be polled.
    MobileMoney,
}

impl PaymentMethod {
    pub fn code(self) -> u8 {
        match self {
            Self::Cash => 0,
            Self::MobileMoney => 1,
        }
    }

    pub fn is_async(self) -> bool {
        self == Self::MobileMoney
    }
}

fn serialize_method<S>(
    method: &PaymentMethod,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u8(method.code())
}

/// Order number shown to the buyer before the order exists on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    pub fn random() -> Self {
        let n = rand::thread_rng().gen_range(0..=MAX_ORDER_NUMBER);
        Self(n.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated order line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub name: String,
    pub price: Decimal,
    pub quantity: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<u64>,
}

impl Position {
    pub fn new(
        name: impl Into<String>,
        price: Decimal,
        quantity: Decimal,
        item_id: Option<u64>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ShopError::ValidationError(
                "Position name must not be empty".to_string(),
            ));
        }
        if price < Decimal::ZERO {
            return Err(ShopError::ValidationError(
                "Position price must not be negative".to_string(),
            ));
        }
        if quantity <= Decimal::ZERO {
            return Err(ShopError::ValidationError(
                "Position quantity must be positive".to_string(),
            ));
        }
        Ok(Self {
            name,
            price,
            quantity,
            item_id,
        })
    }

    pub fn subtotal(&self) -> Decimal {
        self.price * self.quantity
    }
}

/// A possibly half-filled product line, as entered by the buyer.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct PositionDraft {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub item_id: Option<u64>,
}

impl PositionDraft {
    /// Turns a filled-in draft into a position.
    ///
    /// Drafts with a missing name, price or quantity are skipped (`Ok(None)`);
    /// filled drafts with invalid values are an error.
    pub fn complete(self) -> Result<Option<Position>> {
        match (self.name, self.price, self.quantity) {
            (Some(name), Some(price), Some(quantity)) if !name.trim().is_empty() => {
                Position::new(name, price, quantity, self.item_id).map(Some)
            }
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShippingAddress {
    pub address: String,
}

/// Payload of `POST /api/v1/orders/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub buyer_name: String,
    pub buyer_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer_email: Option<String>,
    pub shipping_address: ShippingAddress,
    #[serde(serialize_with = "serialize_method")]
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<String>,
    pub positions: Vec<Position>,
}

impl NewOrder {
    pub fn total(&self) -> Decimal {
        self.positions.iter().map(Position::subtotal).sum()
    }
}

/// The part of the order-creation reply the client cares about.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedOrder {
    pub id: OrderId,
    #[serde(default)]
    pub order_number: Option<String>,
    #[serde(default)]
    pub total_amount: Option<Decimal>,
}
