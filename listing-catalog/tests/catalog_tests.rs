use common::decimal::dec;
use common::error::Error;
use common::model::listing::Category;
use listing_catalog::{ListingQuery, ListingService, NewListing};
use uuid::Uuid;

fn new_listing(title: &str, price: rust_decimal::Decimal) -> NewListing {
    NewListing {
        title: title.to_string(),
        description: "test description".to_string(),
        category: Category::Technology,
        price,
    }
}

#[tokio::test]
async fn test_create_and_get_listing() {
    let service = ListingService::new();
    let seller = Uuid::new_v4();

    let listing = service.create_listing(seller, new_listing("Market report", dec!(40))).await.unwrap();

    assert_eq!(listing.seller_id, seller);
    assert_eq!(listing.price, dec!(40));
    assert!(listing.is_active);
    assert_eq!(listing.purchases, 0);

    let retrieved = service.get_listing(listing.id).await.unwrap().unwrap();
    assert_eq!(retrieved.id, listing.id);
}

#[tokio::test]
async fn test_create_listing_rejects_negative_price() {
    let service = ListingService::new();
    let result = service.create_listing(Uuid::new_v4(), new_listing("Bad", dec!(-1))).await;

    match result {
        Err(Error::ValidationError(_)) => (),
        _ => panic!("Expected ValidationError"),
    }
}

#[tokio::test]
async fn test_create_listing_rejects_empty_title() {
    let service = ListingService::new();
    let result = service.create_listing(Uuid::new_v4(), new_listing("   ", dec!(10))).await;

    match result {
        Err(Error::ValidationError(_)) => (),
        _ => panic!("Expected ValidationError"),
    }
}

#[tokio::test]
async fn test_find_active_rejects_missing_and_inactive() {
    let service = ListingService::new();
    let seller = Uuid::new_v4();

    // Missing
    match service.find_active(Uuid::new_v4()).await {
        Err(Error::ListingNotFound(_)) => (),
        _ => panic!("Expected ListingNotFound"),
    }

    // Deactivated
    let listing = service.create_listing(seller, new_listing("Report", dec!(10))).await.unwrap();
    service.deactivate(listing.id, seller).await.unwrap();

    match service.find_active(listing.id).await {
        Err(Error::ListingNotFound(_)) => (),
        _ => panic!("Expected ListingNotFound for inactive listing"),
    }

    // But the record itself still exists (soft delete only)
    assert!(service.get_listing(listing.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_deactivate_requires_seller() {
    let service = ListingService::new();
    let seller = Uuid::new_v4();
    let listing = service.create_listing(seller, new_listing("Report", dec!(10))).await.unwrap();

    match service.deactivate(listing.id, Uuid::new_v4()).await {
        Err(Error::AuthorizationError(_)) => (),
        _ => panic!("Expected AuthorizationError"),
    }

    // Still active
    assert!(service.find_active(listing.id).await.is_ok());
}

#[tokio::test]
async fn test_counters() {
    let service = ListingService::new();
    let seller = Uuid::new_v4();
    let listing = service.create_listing(seller, new_listing("Report", dec!(10))).await.unwrap();

    service.increment_purchase_count(listing.id).await.unwrap();
    let listing = service.increment_purchase_count(listing.id).await.unwrap();
    assert_eq!(listing.purchases, 2);

    let listing = service.record_view(listing.id).await.unwrap();
    assert_eq!(listing.views, 1);
}

#[tokio::test]
async fn test_list_active_filters_and_paginates() {
    let service = ListingService::new();
    let seller = Uuid::new_v4();

    for i in 0..3 {
        service.create_listing(seller, new_listing(&format!("Tech {}", i), dec!(10))).await.unwrap();
    }
    let business = service
        .create_listing(
            seller,
            NewListing {
                title: "Biz".to_string(),
                description: "d".to_string(),
                category: Category::Business,
                price: dec!(5),
            },
        )
        .await
        .unwrap();
    let deactivated = service.create_listing(seller, new_listing("Gone", dec!(10))).await.unwrap();
    service.deactivate(deactivated.id, seller).await.unwrap();

    // All active
    let (page, total) = service.list_active(&ListingQuery::default()).await.unwrap();
    assert_eq!(total, 4);
    assert_eq!(page.len(), 4);

    // Category filter
    let query = ListingQuery { category: Some(Category::Business), ..Default::default() };
    let (page, total) = service.list_active(&query).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(page[0].id, business.id);

    // Pagination
    let query = ListingQuery { page: Some(2), limit: Some(3), ..Default::default() };
    let (page, total) = service.list_active(&query).await.unwrap();
    assert_eq!(total, 4);
    assert_eq!(page.len(), 1);
}

#[tokio::test]
async fn test_list_by_seller_includes_inactive() {
    let service = ListingService::new();
    let seller = Uuid::new_v4();

    let listing = service.create_listing(seller, new_listing("Report", dec!(10))).await.unwrap();
    service.deactivate(listing.id, seller).await.unwrap();
    service.create_listing(Uuid::new_v4(), new_listing("Other seller", dec!(10))).await.unwrap();

    let (page, total) = service.list_by_seller(seller, &ListingQuery::default()).await.unwrap();
    assert_eq!(total, 1);
    assert_eq!(page[0].id, listing.id);
}
