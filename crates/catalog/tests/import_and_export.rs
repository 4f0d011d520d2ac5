use magesync_catalog::{
    InMemoryCatalog, InventoryExporter, ListingRepository, ListingState, ProductKind,
};
use magesync_channels::{Channel, ChannelContext, ChannelRepository, InMemoryChannelRepository};
use magesync_core::UomId;
use magesync_magento::mock::ScriptedMagento;
use magesync_magento::{
    ApiConnector, CategoryData, Credentials, ProductData, ProductType, UpdateResult,
};
use rust_decimal::Decimal;

fn remote_product(id: &str, sku: &str, product_type: ProductType, categories: Vec<i64>) -> ProductData {
    ProductData {
        product_id: id.to_string(),
        sku: sku.to_string(),
        name: Some(sku.to_lowercase()),
        product_type,
        description: None,
        price: Some(Decimal::new(1000, 2)),
        special_price: None,
        cost: None,
        categories,
    }
}

#[test]
fn imported_products_can_be_exported_and_pruned() {
    let channels = InMemoryChannelRepository::new();
    let channel = Channel::magento(
        "Shop",
        Credentials::new("https://shop.example", "api", "key"),
        UomId::new(),
    );
    channels.save(channel.clone());

    let remote = ScriptedMagento::new().with_category(CategoryData {
        category_id: 4,
        name: "Garden".into(),
        children: vec![],
    });
    let store = InMemoryCatalog::new();
    let catalog = store.catalog();
    let ctx = ChannelContext::new(&channel);
    let api = remote.connect(channel.credentials().unwrap()).unwrap();

    let rake = remote_product("11", "RAKE", ProductType::Simple, vec![4]);
    let ebook = remote_product("12", "EBOOK", ProductType::Downloadable, vec![]);
    let rake_product = catalog
        .find_or_create_product_using_magento_data(ctx, &api, &rake)
        .unwrap();
    let ebook_product = catalog
        .find_or_create_product_using_magento_data(ctx, &api, &ebook)
        .unwrap();
    assert_eq!(ebook_product.kind, ProductKind::Service);
    assert_ne!(rake_product.category, ebook_product.category);

    let listings = store.listings.list_by_channel(channel.id);
    assert_eq!(listings.len(), 2);

    // The remote side lost the e-book in the meantime.
    let results = listings
        .iter()
        .map(|l| {
            if l.product_identifier == "12" {
                UpdateResult::fault("101", "Product not exists.")
            } else {
                UpdateResult::Success
            }
        })
        .collect();
    remote.push_inventory_response(Ok(results));

    let summary = InventoryExporter::new(&remote, &channels, &store.listings, &store.fallback)
        .export_bulk_inventory(&listings)
        .unwrap();

    assert_eq!(summary.batches, 1);
    assert_eq!(summary.disabled.len(), 1);
    let ebook_listing = store
        .listings
        .find_by_product(channel.id, ebook_product.id)
        .unwrap();
    assert_eq!(ebook_listing.state, ListingState::Disabled);
    let rake_listing = store
        .listings
        .find_by_product(channel.id, rake_product.id)
        .unwrap();
    assert_eq!(rake_listing.state, ListingState::Active);
}
