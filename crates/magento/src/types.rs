//! Wire types exchanged with the Magento API.

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::de;

/// Fault code the bulk inventory API uses for "product does not exist".
pub const FAULT_PRODUCT_NOT_FOUND: &str = "101";

/// Connection credentials of one remote instance.
#[derive(Clone)]
pub struct Credentials {
    pub url: String,
    pub api_user: String,
    pub api_key: SecretString,
}

impl Credentials {
    pub fn new(url: impl Into<String>, api_user: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_user: api_user.into(),
            api_key: SecretString::from(api_key.into()),
        }
    }

    pub fn expose_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url)
            .field("api_user", &self.api_user)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Remote product type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductType {
    Simple,
    Configurable,
    Grouped,
    Bundle,
    Virtual,
    Downloadable,
}

impl ProductType {
    /// Only simple products carry their own stock; every other type is
    /// reported as in stock and lets the remote side work it out.
    pub fn tracks_stock(self) -> bool {
        matches!(self, ProductType::Simple)
    }

    /// Virtual and downloadable products have nothing to ship.
    pub fn is_service(self) -> bool {
        matches!(self, ProductType::Virtual | ProductType::Downloadable)
    }
}

/// How `catalog_product.info` should interpret the product identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierType {
    ProductId,
    Sku,
}

impl IdentifierType {
    pub fn as_str(self) -> &'static str {
        match self {
            IdentifierType::ProductId => "productID",
            IdentifierType::Sku => "sku",
        }
    }
}

/// A website as listed by the remote instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteData {
    #[serde(deserialize_with = "de::id")]
    pub website_id: i64,
    pub code: String,
    pub name: String,
}

/// A store (group) of a website.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(deserialize_with = "de::id")]
    pub default_store_id: i64,
    pub name: String,
}

/// A category node; `children` is only populated by tree calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryData {
    #[serde(deserialize_with = "de::id")]
    pub category_id: i64,
    pub name: String,
    #[serde(default)]
    pub children: Vec<CategoryData>,
}

/// Product information as returned by `catalog_product.info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductData {
    #[serde(deserialize_with = "de::identifier")]
    pub product_id: String,
    pub sku: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de::optional_decimal")]
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "de::optional_decimal")]
    pub special_price: Option<Decimal>,
    #[serde(default, deserialize_with = "de::optional_decimal")]
    pub cost: Option<Decimal>,
    #[serde(default, deserialize_with = "de::id_list")]
    pub categories: Vec<i64>,
}

impl ProductData {
    /// Price the product is sold at: the special price when set, else the
    /// regular price, else zero.
    pub fn effective_price(&self) -> Decimal {
        self.special_price.or(self.price).unwrap_or(Decimal::ZERO)
    }

    pub fn cost_price(&self) -> Decimal {
        self.cost.unwrap_or(Decimal::ZERO)
    }
}

/// A product attribute set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSet {
    #[serde(deserialize_with = "de::id")]
    pub set_id: i64,
    pub name: String,
}

/// Stock values pushed for one product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockData {
    pub qty: f64,
    #[serde(serialize_with = "stock_flag")]
    pub is_in_stock: bool,
}

fn stock_flag<S: Serializer>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(if *flag { "1" } else { "0" })
}

/// One entry of a bulk inventory update.
///
/// Serialized as the pair `[product_identifier, {"qty": .., "is_in_stock": ..}]`.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryUpdate {
    pub product_identifier: String,
    pub stock: StockData,
}

impl InventoryUpdate {
    /// Build the update for a product of the given type.
    ///
    /// The in-stock flag is derived from the quantity for simple products and
    /// forced on for every other type.
    pub fn new(product_identifier: impl Into<String>, qty: f64, product_type: Option<ProductType>) -> Self {
        let is_in_stock = match product_type {
            Some(t) if t.tracks_stock() => qty > 0.0,
            _ => true,
        };
        Self {
            product_identifier: product_identifier.into(),
            stock: StockData { qty, is_in_stock },
        }
    }
}

impl Serialize for InventoryUpdate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.product_identifier)?;
        tuple.serialize_element(&self.stock)?;
        tuple.end()
    }
}

/// Per-item result of a bulk inventory update.
///
/// The bulk API does not raise faults; it reports them inline, one entry per
/// request, in request order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "Value")]
pub enum UpdateResult {
    Success,
    Fault { code: String, message: String },
    /// Neither `true` nor a fault object; kept verbatim for error reporting.
    Unrecognized(String),
}

impl UpdateResult {
    pub fn fault(code: impl Into<String>, message: impl Into<String>) -> Self {
        UpdateResult::Fault {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn is_product_not_found(&self) -> bool {
        matches!(self, UpdateResult::Fault { code, .. } if code == FAULT_PRODUCT_NOT_FOUND)
    }
}

impl From<Value> for UpdateResult {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(true) => UpdateResult::Success,
            Value::Object(ref map) if map.get("isFault") == Some(&Value::Bool(true)) => {
                UpdateResult::Fault {
                    code: map.get("faultCode").map(de::scalar_to_string).unwrap_or_default(),
                    message: map.get("faultMessage").map(de::scalar_to_string).unwrap_or_default(),
                }
            }
            other => UpdateResult::Unrecognized(other.to_string()),
        }
    }
}
