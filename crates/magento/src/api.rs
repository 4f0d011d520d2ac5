//! The remote API surface the connector depends on.

use std::sync::Arc;

use magesync_core::RemoteError;

use crate::types::{
    AttributeSet, CategoryData, Credentials, IdentifierType, InventoryUpdate, ProductData,
    StoreData, UpdateResult, WebsiteData,
};

/// An open session against one remote instance.
///
/// Calls block until the remote side answers. Dropping the session ends it.
pub trait MagentoApi {
    /// All websites of the instance.
    fn websites(&self) -> Result<Vec<WebsiteData>, RemoteError>;

    /// Store groups of one website.
    fn stores(&self, website_id: i64) -> Result<Vec<StoreData>, RemoteError>;

    fn category_info(&self, category_id: i64) -> Result<CategoryData, RemoteError>;

    fn product_info(
        &self,
        identifier: &str,
        identifier_type: IdentifierType,
    ) -> Result<ProductData, RemoteError>;

    fn attribute_sets(&self) -> Result<Vec<AttributeSet>, RemoteError>;

    /// Push stock for many products in one call.
    ///
    /// The remote side answers with one [`UpdateResult`] per request, in request
    /// order. Implementations return the list as received; callers must check
    /// its length before matching results to requests.
    fn update_inventory(&self, batch: &[InventoryUpdate]) -> Result<Vec<UpdateResult>, RemoteError>;
}

/// Opens sessions against remote instances.
pub trait ApiConnector: Send + Sync {
    type Session: MagentoApi;

    /// Authenticate and open a session.
    fn connect(&self, credentials: &Credentials) -> Result<Self::Session, RemoteError>;
}

impl<C> ApiConnector for Arc<C>
where
    C: ApiConnector + ?Sized,
{
    type Session = C::Session;

    fn connect(&self, credentials: &Credentials) -> Result<Self::Session, RemoteError> {
        (**self).connect(credentials)
    }
}

impl<C> ApiConnector for &C
where
    C: ApiConnector + ?Sized,
{
    type Session = C::Session;

    fn connect(&self, credentials: &Credentials) -> Result<Self::Session, RemoteError> {
        (**self).connect(credentials)
    }
}
