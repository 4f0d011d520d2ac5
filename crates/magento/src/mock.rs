//! Scripted in-memory Magento instance for tests and dry runs.
//!
//! Responses are configured up front; every inventory batch and product lookup
//! is recorded so callers can assert on what would have been sent.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use magesync_core::RemoteError;

use crate::api::{ApiConnector, MagentoApi};
use crate::types::{
    AttributeSet, CategoryData, Credentials, IdentifierType, InventoryUpdate, ProductData,
    StoreData, UpdateResult, WebsiteData,
};

#[derive(Debug, Default)]
struct State {
    websites: Vec<WebsiteData>,
    stores: HashMap<i64, Vec<StoreData>>,
    categories: HashMap<i64, CategoryData>,
    products: HashMap<String, ProductData>,
    attribute_sets: Vec<AttributeSet>,
    inventory_responses: VecDeque<Result<Vec<UpdateResult>, RemoteError>>,
    connect_error: Option<RemoteError>,

    connections: Vec<String>,
    inventory_calls: Vec<Vec<InventoryUpdate>>,
    product_lookups: Vec<String>,
}

/// A fake remote instance. Cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct ScriptedMagento {
    state: Arc<Mutex<State>>,
}

impl ScriptedMagento {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let mut guard = match self.state.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    pub fn with_website(self, website: WebsiteData, stores: Vec<StoreData>) -> Self {
        self.with_state(|s| {
            s.stores.insert(website.website_id, stores);
            s.websites.push(website);
        });
        self
    }

    pub fn with_category(self, category: CategoryData) -> Self {
        self.with_state(|s| {
            s.categories.insert(category.category_id, category);
        });
        self
    }

    /// Register a product, reachable by its product id and by its SKU.
    pub fn with_product(self, product: ProductData) -> Self {
        self.with_state(|s| {
            s.products.insert(product.sku.clone(), product.clone());
            s.products.insert(product.product_id.clone(), product);
        });
        self
    }

    pub fn with_attribute_set(self, set: AttributeSet) -> Self {
        self.with_state(|s| s.attribute_sets.push(set));
        self
    }

    /// Queue the answer to the next inventory call. Once the queue is empty,
    /// every request is answered with success.
    pub fn push_inventory_response(&self, response: Result<Vec<UpdateResult>, RemoteError>) {
        self.with_state(|s| s.inventory_responses.push_back(response));
    }

    /// Make every subsequent `connect` fail with `error`.
    pub fn fail_connections(&self, error: RemoteError) {
        self.with_state(|s| s.connect_error = Some(error));
    }

    /// URLs of every session opened so far.
    pub fn connections(&self) -> Vec<String> {
        self.with_state(|s| s.connections.clone())
    }

    /// Every inventory batch received so far, in call order.
    pub fn inventory_calls(&self) -> Vec<Vec<InventoryUpdate>> {
        self.with_state(|s| s.inventory_calls.clone())
    }

    pub fn product_lookups(&self) -> Vec<String> {
        self.with_state(|s| s.product_lookups.clone())
    }
}

impl ApiConnector for ScriptedMagento {
    type Session = ScriptedSession;

    fn connect(&self, credentials: &Credentials) -> Result<Self::Session, RemoteError> {
        self.with_state(|s| match &s.connect_error {
            Some(err) => Err(err.clone()),
            None => {
                s.connections.push(credentials.url.clone());
                Ok(())
            }
        })?;
        Ok(ScriptedSession {
            instance: self.clone(),
        })
    }
}

/// Session handed out by [`ScriptedMagento`].
#[derive(Debug)]
pub struct ScriptedSession {
    instance: ScriptedMagento,
}

impl MagentoApi for ScriptedSession {
    fn websites(&self) -> Result<Vec<WebsiteData>, RemoteError> {
        Ok(self.instance.with_state(|s| s.websites.clone()))
    }

    fn stores(&self, website_id: i64) -> Result<Vec<StoreData>, RemoteError> {
        self.instance.with_state(|s| {
            s.stores
                .get(&website_id)
                .cloned()
                .ok_or_else(|| RemoteError::fault("100", format!("Website {website_id} not exists.")))
        })
    }

    fn category_info(&self, category_id: i64) -> Result<CategoryData, RemoteError> {
        self.instance.with_state(|s| {
            s.categories
                .get(&category_id)
                .cloned()
                .ok_or_else(|| RemoteError::fault("102", "Category not exists."))
        })
    }

    fn product_info(
        &self,
        identifier: &str,
        _identifier_type: IdentifierType,
    ) -> Result<ProductData, RemoteError> {
        self.instance.with_state(|s| {
            s.product_lookups.push(identifier.to_string());
            s.products
                .get(identifier)
                .cloned()
                .ok_or_else(|| RemoteError::fault("101", "Product not exists."))
        })
    }

    fn attribute_sets(&self) -> Result<Vec<AttributeSet>, RemoteError> {
        Ok(self.instance.with_state(|s| s.attribute_sets.clone()))
    }

    fn update_inventory(&self, batch: &[InventoryUpdate]) -> Result<Vec<UpdateResult>, RemoteError> {
        self.instance.with_state(|s| {
            s.inventory_calls.push(batch.to_vec());
            s.inventory_responses
                .pop_front()
                .unwrap_or_else(|| Ok(vec![UpdateResult::Success; batch.len()]))
        })
    }
}
