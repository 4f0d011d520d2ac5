use std::collections::HashMap;
use std::sync::RwLock;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use magesync_channels::{Channel, ChannelContext};
use magesync_core::{CategoryId, ConnectorError, ConnectorResult, Entity, ProductId, UomId};
use magesync_magento::{IdentifierType, MagentoApi, ProductData};

use crate::catalog::Catalog;
use crate::category::Category;
use crate::listing::Listing;

/// Goods are shipped; services (virtual and downloadable products) are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Goods,
    Service,
}

/// A local product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub list_price: Decimal,
    pub cost_price: Decimal,
    pub category: Option<CategoryId>,
    pub kind: ProductKind,
    pub default_uom: UomId,
    pub sale_uom: UomId,
    pub salable: bool,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Values derived from remote product data, shared by create and update.
///
/// Downstream integrations that store extra product information extend this
/// rather than the product itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductValues {
    pub name: String,
    pub default_uom: UomId,
    pub sale_uom: UomId,
    pub salable: bool,
    /// Set only for remote types that force a service; otherwise the local
    /// kind is left alone.
    pub kind: Option<ProductKind>,
}

impl ProductValues {
    pub fn extract(channel: &Channel, data: &ProductData) -> Self {
        let name = match data.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("SKU: {}", data.sku),
        };
        let kind = data.product_type.is_service().then_some(ProductKind::Service);
        Self {
            name,
            default_uom: channel.default_uom,
            sale_uom: channel.default_uom,
            salable: true,
            kind,
        }
    }

    fn apply(self, product: &mut Product) {
        product.name = self.name;
        product.default_uom = self.default_uom;
        product.sale_uom = self.sale_uom;
        product.salable = self.salable;
        if let Some(kind) = self.kind {
            product.kind = kind;
        }
    }
}

/// Values sent to Magento when a product is created there.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductExportValues {
    pub categories: Vec<i64>,
    pub websites: Vec<i64>,
    pub name: String,
    pub description: String,
    pub short_description: String,
    pub status: &'static str,
    pub visibility: &'static str,
    pub price: f64,
    /// Always the remote default tax class.
    pub tax_class_id: &'static str,
}

/// Persistence for products.
pub trait ProductRepository: Send + Sync {
    fn get(&self, id: ProductId) -> Option<Product>;
    /// Every product with this code. More than one is a data problem the
    /// caller reports.
    fn find_by_code(&self, code: &str) -> Vec<Product>;
    fn insert(&self, product: Product) -> ConnectorResult<()>;
    fn save(&self, product: Product) -> ConnectorResult<()>;
}

/// In-memory product repository for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    inner: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProductRepository for InMemoryProductRepository {
    fn get(&self, id: ProductId) -> Option<Product> {
        let map = self.inner.read().ok()?;
        map.get(&id).cloned()
    }

    fn find_by_code(&self, code: &str) -> Vec<Product> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        let mut products: Vec<Product> = map.values().filter(|p| p.code == code).cloned().collect();
        products.sort_by_key(|p| p.id);
        products
    }

    fn insert(&self, product: Product) -> ConnectorResult<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| ConnectorError::conflict("product store poisoned"))?;
        if map.contains_key(&product.id) {
            return Err(ConnectorError::conflict(format!("product {} exists", product.id)));
        }
        map.insert(product.id, product);
        Ok(())
    }

    fn save(&self, product: Product) -> ConnectorResult<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| ConnectorError::conflict("product store poisoned"))?;
        if !map.contains_key(&product.id) {
            return Err(ConnectorError::not_found(format!("product {}", product.id)));
        }
        map.insert(product.id, product);
        Ok(())
    }
}

impl Catalog<'_> {
    /// Find the product with the remote SKU, creating the product and/or its
    /// listing on the current channel when missing.
    pub fn find_or_create_product_using_magento_data<A: MagentoApi>(
        &self,
        ctx: ChannelContext<'_>,
        api: &A,
        data: &ProductData,
    ) -> ConnectorResult<Product> {
        let channel = ctx.channel();
        let product = match self.single_product_by_code(&data.sku)? {
            Some(product) => product,
            None => self.create_product_from(ctx, api, data)?,
        };

        if self
            .listings
            .find_by_product(channel.id, product.id)
            .is_none()
        {
            self.create_listing_from(channel, data)?;
        }
        Ok(product)
    }

    fn single_product_by_code(&self, code: &str) -> ConnectorResult<Option<Product>> {
        let mut products = self.products.find_by_code(code);
        match products.len() {
            0 => Ok(None),
            1 => Ok(products.pop()),
            n => Err(ConnectorError::conflict(format!(
                "{n} products share the code {code:?}"
            ))),
        }
    }

    /// Create the product for a channel; non-Magento channels use the default
    /// channel behaviour.
    pub fn create_product_from<A: MagentoApi>(
        &self,
        ctx: ChannelContext<'_>,
        api: &A,
        data: &ProductData,
    ) -> ConnectorResult<Product> {
        if !ctx.channel().is_magento() {
            return self.fallback.create_product(ctx.channel(), data);
        }
        self.create_product_using_magento_data(ctx, api, data)
    }

    /// Create a product from remote data.
    ///
    /// The product goes into the local counterpart of its first remote
    /// category, or into the unclassified category when it has none.
    pub fn create_product_using_magento_data<A: MagentoApi>(
        &self,
        ctx: ChannelContext<'_>,
        api: &A,
        data: &ProductData,
    ) -> ConnectorResult<Product> {
        let category = match data.categories.first() {
            Some(&magento_id) => {
                self.find_or_create_category_using_magento_id(ctx, api, magento_id, None)?
            }
            None => self.unclassified_category()?,
        };

        let values = ProductValues::extract(ctx.channel(), data);
        let product = Product {
            id: ProductId::new(),
            code: data.sku.clone(),
            name: values.name,
            description: data.description.clone(),
            list_price: data.effective_price(),
            cost_price: data.cost_price(),
            category: Some(category.id),
            kind: values.kind.unwrap_or(ProductKind::Goods),
            default_uom: values.default_uom,
            sale_uom: values.sale_uom,
            salable: values.salable,
        };
        self.products.insert(product.clone())?;
        tracing::info!(product = %product.id, sku = %product.code, "created product from magento");
        Ok(product)
    }

    /// Create the listing of a remote product on a channel.
    ///
    /// The local product is matched by SKU; the listing itself is keyed by the
    /// remote product id.
    pub fn create_listing_from(&self, channel: &Channel, data: &ProductData) -> ConnectorResult<Listing> {
        if !channel.is_magento() {
            return self.fallback.create_listing(channel, data);
        }

        let mut products = self.products.find_by_code(&data.sku);
        if products.len() != 1 {
            return Err(ConnectorError::user("No product found for mapping"));
        }
        let product = products.remove(0);

        let listing = Listing::new(
            channel.id,
            product.id,
            data.product_id.clone(),
            Some(data.product_type),
        );
        self.listings.insert(listing.clone())?;
        Ok(listing)
    }

    /// Refresh a product from the remote side of the current channel.
    pub fn update_product_from_magento<A: MagentoApi>(
        &self,
        ctx: ChannelContext<'_>,
        api: &A,
        product: &Product,
    ) -> ConnectorResult<Product> {
        let listing = self
            .listings
            .find_by_product(ctx.channel_id(), product.id)
            .ok_or_else(|| {
                ConnectorError::not_found(format!(
                    "product {} has no listing on channel {}",
                    product.id,
                    ctx.channel_id()
                ))
            })?;
        let data = api.product_info(&listing.product_identifier, IdentifierType::ProductId)?;
        self.update_product_from_magento_using_data(ctx, product, &data)
    }

    pub fn update_product_from_magento_using_data(
        &self,
        ctx: ChannelContext<'_>,
        product: &Product,
        data: &ProductData,
    ) -> ConnectorResult<Product> {
        let mut updated = product.clone();
        ProductValues::extract(ctx.channel(), data).apply(&mut updated);
        updated.description = data.description.clone();
        updated.code = data.sku.clone();
        updated.list_price = data.effective_price();
        updated.cost_price = data.cost_price();

        self.products.save(updated.clone())?;
        Ok(updated)
    }

    /// Values for creating `product` on Magento under the first of
    /// `categories`, published to the websites of `channels`.
    pub fn product_values_for_export(
        &self,
        product: &Product,
        categories: &[Category],
        channels: &[Channel],
    ) -> ConnectorResult<ProductExportValues> {
        let category = categories
            .first()
            .ok_or_else(|| ConnectorError::validation("at least one category is required"))?;
        let category_ids: Vec<i64> = self
            .categories
            .mappings_for(category.id)
            .into_iter()
            .map(|m| m.magento_id)
            .collect();
        if category_ids.is_empty() {
            return Err(ConnectorError::user(format!(
                "Category \"{}\" must have a magento category associated",
                category.name
            )));
        }

        let websites = channels
            .iter()
            .map(|c| {
                c.website.as_ref().map(|w| w.id).ok_or_else(|| {
                    ConnectorError::validation(format!("channel \"{}\" has no website", c.name))
                })
            })
            .collect::<ConnectorResult<Vec<i64>>>()?;

        let description = product
            .description
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| product.name.clone());

        Ok(ProductExportValues {
            categories: category_ids,
            websites,
            name: product.name.clone(),
            short_description: description.clone(),
            description,
            status: "1",
            visibility: "4",
            price: product.list_price.to_f64().unwrap_or_default(),
            tax_class_id: "1",
        })
    }
}
