use std::collections::HashMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use magesync_channels::ChannelContext;
use magesync_core::{
    CategoryId, ChannelId, ChannelScoped, ChannelStore, ConnectorError, ConnectorResult, Entity,
    InMemoryChannelStore,
};
use magesync_magento::{CategoryData, MagentoApi};

use crate::catalog::Catalog;

/// Category that receives products imported without any remote category.
pub const UNCLASSIFIED_CATEGORY: &str = "Unclassified Magento Products";

/// A local product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub parent: Option<CategoryId>,
}

impl Category {
    pub fn new(name: impl Into<String>, parent: Option<CategoryId>) -> Self {
        Self {
            id: CategoryId::new(),
            name: name.into(),
            parent,
        }
    }
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// The id of a local category on one channel's remote instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryMapping {
    pub magento_id: i64,
    pub channel: ChannelId,
    pub category: CategoryId,
}

impl Entity for CategoryMapping {
    type Id = i64;

    fn id(&self) -> &Self::Id {
        &self.magento_id
    }
}

impl ChannelScoped for CategoryMapping {
    fn channel_id(&self) -> ChannelId {
        self.channel
    }
}

/// Persistence for categories and their remote mappings.
pub trait CategoryRepository: Send + Sync {
    fn get(&self, id: CategoryId) -> Option<Category>;
    fn find_by_name(&self, name: &str) -> Option<Category>;
    fn insert(&self, category: Category) -> ConnectorResult<()>;

    fn find_mapping(&self, channel: ChannelId, magento_id: i64) -> Option<CategoryMapping>;
    /// Mappings of one category across all channels.
    fn mappings_for(&self, category: CategoryId) -> Vec<CategoryMapping>;
    /// Fails if the remote id is already mapped on the channel.
    fn insert_mapping(&self, mapping: CategoryMapping) -> ConnectorResult<()>;
}

/// In-memory category repository for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCategoryRepository {
    categories: RwLock<HashMap<CategoryId, Category>>,
    mappings: InMemoryChannelStore<i64, CategoryMapping>,
}

impl InMemoryCategoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CategoryRepository for InMemoryCategoryRepository {
    fn get(&self, id: CategoryId) -> Option<Category> {
        let map = self.categories.read().ok()?;
        map.get(&id).cloned()
    }

    fn find_by_name(&self, name: &str) -> Option<Category> {
        let map = self.categories.read().ok()?;
        let mut matches: Vec<&Category> = map.values().filter(|c| c.name == name).collect();
        matches.sort_by_key(|c| c.id);
        matches.first().map(|c| (*c).clone())
    }

    fn insert(&self, category: Category) -> ConnectorResult<()> {
        let mut map = self
            .categories
            .write()
            .map_err(|_| ConnectorError::conflict("category store poisoned"))?;
        map.insert(category.id, category);
        Ok(())
    }

    fn find_mapping(&self, channel: ChannelId, magento_id: i64) -> Option<CategoryMapping> {
        self.mappings.get(channel, &magento_id)
    }

    fn mappings_for(&self, category: CategoryId) -> Vec<CategoryMapping> {
        let mut mappings: Vec<CategoryMapping> = self
            .mappings
            .all()
            .into_iter()
            .filter(|m| m.category == category)
            .collect();
        mappings.sort_by_key(|m| (m.channel, m.magento_id));
        mappings
    }

    fn insert_mapping(&self, mapping: CategoryMapping) -> ConnectorResult<()> {
        let channel = mapping.channel_id();
        let magento_id = mapping.magento_id;
        if !self.mappings.insert_unless(channel, magento_id, mapping, &|m: &CategoryMapping| {
            m.magento_id == magento_id
        }) {
            return Err(ConnectorError::conflict(format!(
                "category {magento_id} is already mapped on channel {channel}"
            )));
        }
        Ok(())
    }
}

impl Catalog<'_> {
    /// Import a whole remote category tree, parents before children.
    pub fn create_tree_using_magento_data(
        &self,
        ctx: ChannelContext<'_>,
        tree: &CategoryData,
    ) -> ConnectorResult<Category> {
        self.create_subtree(ctx, tree, None)
    }

    fn create_subtree(
        &self,
        ctx: ChannelContext<'_>,
        node: &CategoryData,
        parent: Option<CategoryId>,
    ) -> ConnectorResult<Category> {
        let category = self.find_or_create_category_using_magento_data(ctx, node, parent)?;
        for child in &node.children {
            self.create_subtree(ctx, child, Some(category.id))?;
        }
        Ok(category)
    }

    pub fn find_or_create_category_using_magento_data(
        &self,
        ctx: ChannelContext<'_>,
        data: &CategoryData,
        parent: Option<CategoryId>,
    ) -> ConnectorResult<Category> {
        match self.find_category_using_magento_data(ctx, data) {
            Some(category) => Ok(category),
            None => self.create_category_using_magento_data(ctx, data, parent),
        }
    }

    /// Resolve a remote category id, fetching the category from the remote
    /// side when it has not been imported yet.
    pub fn find_or_create_category_using_magento_id<A: MagentoApi>(
        &self,
        ctx: ChannelContext<'_>,
        api: &A,
        magento_id: i64,
        parent: Option<CategoryId>,
    ) -> ConnectorResult<Category> {
        if let Some(category) = self.find_category_using_magento_id(ctx, magento_id) {
            return Ok(category);
        }
        let data = api.category_info(magento_id)?;
        self.create_category_using_magento_data(ctx, &data, parent)
    }

    pub fn find_category_using_magento_data(
        &self,
        ctx: ChannelContext<'_>,
        data: &CategoryData,
    ) -> Option<Category> {
        self.find_category_using_magento_id(ctx, data.category_id)
    }

    pub fn find_category_using_magento_id(
        &self,
        ctx: ChannelContext<'_>,
        magento_id: i64,
    ) -> Option<Category> {
        let mapping = self.categories.find_mapping(ctx.channel_id(), magento_id)?;
        self.categories.get(mapping.category)
    }

    /// Create a category and its mapping on the current channel.
    pub fn create_category_using_magento_data(
        &self,
        ctx: ChannelContext<'_>,
        data: &CategoryData,
        parent: Option<CategoryId>,
    ) -> ConnectorResult<Category> {
        if self
            .categories
            .find_mapping(ctx.channel_id(), data.category_id)
            .is_some()
        {
            return Err(ConnectorError::conflict(format!(
                "category {} already exists on channel {}",
                data.category_id,
                ctx.channel_id()
            )));
        }

        let category = Category::new(data.name.clone(), parent);
        self.categories.insert(category.clone())?;
        self.categories.insert_mapping(CategoryMapping {
            magento_id: data.category_id,
            channel: ctx.channel_id(),
            category: category.id,
        })?;
        tracing::debug!(
            category = %category.id,
            magento_id = data.category_id,
            "created category from magento"
        );
        Ok(category)
    }

    /// The catch-all category, created on first use.
    pub fn unclassified_category(&self) -> ConnectorResult<Category> {
        if let Some(category) = self.categories.find_by_name(UNCLASSIFIED_CATEGORY) {
            return Ok(category);
        }
        let category = Category::new(UNCLASSIFIED_CATEGORY, None);
        self.categories.insert(category.clone())?;
        Ok(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use magesync_channels::Channel;
    use magesync_core::UomId;
    use magesync_magento::mock::ScriptedMagento;
    use magesync_magento::{ApiConnector, Credentials};

    use crate::catalog::InMemoryCatalog;

    fn channel() -> Channel {
        Channel::magento(
            "Shop",
            Credentials::new("https://shop.example", "api", "key"),
            UomId::new(),
        )
    }

    fn node(id: i64, name: &str, children: Vec<CategoryData>) -> CategoryData {
        CategoryData {
            category_id: id,
            name: name.to_string(),
            children,
        }
    }

    #[test]
    fn tree_import_links_children_to_their_parents() {
        let store = InMemoryCatalog::new();
        let catalog = store.catalog();
        let channel = channel();
        let ctx = ChannelContext::new(&channel);

        let tree = node(
            1,
            "Root",
            vec![node(2, "Apparel", vec![node(3, "Shirts", vec![])]), node(4, "Toys", vec![])],
        );
        let root = catalog.create_tree_using_magento_data(ctx, &tree).unwrap();

        let apparel = catalog.find_category_using_magento_id(ctx, 2).unwrap();
        let shirts = catalog.find_category_using_magento_id(ctx, 3).unwrap();
        let toys = catalog.find_category_using_magento_id(ctx, 4).unwrap();
        assert_eq!(root.parent, None);
        assert_eq!(apparel.parent, Some(root.id));
        assert_eq!(shirts.parent, Some(apparel.id));
        assert_eq!(toys.parent, Some(root.id));
    }

    #[test]
    fn importing_the_tree_twice_creates_nothing_new() {
        let store = InMemoryCatalog::new();
        let catalog = store.catalog();
        let channel = channel();
        let ctx = ChannelContext::new(&channel);
        let tree = node(1, "Root", vec![node(2, "Apparel", vec![])]);

        let first = catalog.create_tree_using_magento_data(ctx, &tree).unwrap();
        let second = catalog.create_tree_using_magento_data(ctx, &tree).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn remote_ids_are_resolved_per_channel() {
        let store = InMemoryCatalog::new();
        let catalog = store.catalog();
        let a = channel();
        let b = channel();

        catalog
            .create_category_using_magento_data(ChannelContext::new(&a), &node(9, "Misc", vec![]), None)
            .unwrap();

        assert!(catalog.find_category_using_magento_id(ChannelContext::new(&a), 9).is_some());
        assert!(catalog.find_category_using_magento_id(ChannelContext::new(&b), 9).is_none());
    }

    #[test]
    fn duplicate_mapping_is_a_conflict() {
        let store = InMemoryCatalog::new();
        let catalog = store.catalog();
        let channel = channel();
        let ctx = ChannelContext::new(&channel);
        catalog.create_category_using_magento_data(ctx, &node(5, "A", vec![]), None).unwrap();

        let err = catalog
            .create_category_using_magento_data(ctx, &node(5, "A", vec![]), None)
            .unwrap_err();
        assert!(matches!(err, ConnectorError::Conflict(_)));
    }

    #[test]
    fn unknown_ids_are_fetched_from_the_remote_side() {
        let store = InMemoryCatalog::new();
        let catalog = store.catalog();
        let channel = channel();
        let ctx = ChannelContext::new(&channel);
        let remote = ScriptedMagento::new().with_category(node(12, "Garden", vec![]));
        let session = remote.connect(channel.credentials().unwrap()).unwrap();

        let category = catalog
            .find_or_create_category_using_magento_id(ctx, &session, 12, None)
            .unwrap();
        assert_eq!(category.name, "Garden");

        let again = catalog
            .find_or_create_category_using_magento_id(ctx, &session, 12, None)
            .unwrap();
        assert_eq!(again.id, category.id);
    }

    #[test]
    fn unclassified_category_is_created_once() {
        let store = InMemoryCatalog::new();
        let catalog = store.catalog();
        let first = catalog.unclassified_category().unwrap();
        let second = catalog.unclassified_category().unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.name, UNCLASSIFIED_CATEGORY);
    }
}
