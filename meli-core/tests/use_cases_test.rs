use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;
use meli_core::app::{
    GetPaymentMethods, GetProduct, GetReviewSummary, GetSeller, PurchaseProduct, SearchProducts,
};
use meli_core::storage::file_store;
use meli_core::EntityId;
use serde_json::{json, Value};
use tempfile::tempdir;

fn write_collection(dir: &Path, name: &str, value: Value) {
    std::fs::write(
        dir.join(format!("{name}.json")),
        serde_json::to_string_pretty(&value).unwrap(),
    )
    .unwrap();
}

fn seed_products(dir: &Path) {
    write_collection(
        dir,
        "products",
        json!([
            {
                "id": 1,
                "title": "Galaxy S23",
                "description": "Pantalla AMOLED",
                "brand": "Samsung",
                "model": "SM-S911",
                "condition": "new",
                "price": 899999.0,
                "currency": "ARS",
                "availableQuantity": 5
            },
            {
                "id": 2,
                "title": "Tune 510BT",
                "description": "Auriculares bluetooth",
                "brand": "JBL",
                "model": "510BT",
                "condition": "new",
                "price": 64999.0,
                "currency": "ARS",
                "availableQuantity": 1
            }
        ]),
    );
}

#[tokio::test]
async fn blank_search_returns_nothing() -> Result<()> {
    let dir = tempdir()?;
    seed_products(dir.path());
    let store = file_store(dir.path());
    let search = SearchProducts::new(&store);

    assert!(search.execute("").await?.is_empty());
    assert!(search.execute("   ").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn search_matches_fields_case_insensitively() -> Result<()> {
    let dir = tempdir()?;
    seed_products(dir.path());
    let store = file_store(dir.path());
    let search = SearchProducts::new(&store);

    let by_brand = search.execute("samsung").await?;
    assert_eq!(by_brand.len(), 1);
    assert_eq!(by_brand[0].title, "Galaxy S23");

    let by_description = search.execute("BLUETOOTH").await?;
    assert_eq!(by_description.len(), 1);

    let by_model = search.execute("sm-s911").await?;
    assert_eq!(by_model.len(), 1);

    assert!(search.execute("nintendo").await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn missing_product_is_null_not_error() -> Result<()> {
    let dir = tempdir()?;
    seed_products(dir.path());
    let store = file_store(dir.path());

    let product = GetProduct::new(&store).execute(&EntityId::Int(42)).await?;
    assert!(product.is_none());
    Ok(())
}

#[tokio::test]
async fn review_summary_covers_every_bucket() -> Result<()> {
    let dir = tempdir()?;
    write_collection(
        dir.path(),
        "comments",
        json!({
            "1": [
                { "id": 1, "user": "A", "rating": 5, "comment": "x", "date": "2025-07-01T00:00:00Z" },
                { "id": 2, "user": "B", "rating": 4, "comment": "y", "date": "2025-07-02T00:00:00Z" },
                { "id": 3, "user": "C", "rating": 5, "comment": "z", "date": "2025-07-03T00:00:00Z" }
            ]
        }),
    );
    let store = file_store(dir.path());

    let summary = GetReviewSummary::new(&store)
        .execute(&EntityId::Int(1))
        .await?;
    assert_eq!(summary.average_rating, 4.7);
    assert_eq!(summary.total_reviews, 3);
    assert_eq!(summary.rating_distribution[&5], 2);
    assert_eq!(summary.rating_distribution[&4], 1);
    assert_eq!(summary.rating_distribution[&3], 0);
    assert_eq!(summary.rating_distribution[&2], 0);
    assert_eq!(summary.rating_distribution[&1], 0);
    Ok(())
}

#[tokio::test]
async fn purchase_decrements_stock_and_persists() -> Result<()> {
    let dir = tempdir()?;
    seed_products(dir.path());
    let store = file_store(dir.path());

    let outcome = PurchaseProduct::new(&store)
        .execute(&EntityId::Int(1), 2)
        .await?;
    assert!(outcome.success);
    assert_eq!(
        outcome.product.as_ref().and_then(|p| p.available_quantity),
        Some(3)
    );

    let reread = store.products.find_by_id(&EntityId::Int(1)).await?.unwrap();
    assert_eq!(reread.available_quantity, Some(3));
    Ok(())
}

#[tokio::test]
async fn purchase_beyond_stock_is_rejected_without_a_partial_decrement() -> Result<()> {
    let dir = tempdir()?;
    seed_products(dir.path());
    let store = file_store(dir.path());

    let outcome = PurchaseProduct::new(&store)
        .execute(&EntityId::Int(1), 10)
        .await?;
    assert!(!outcome.success);
    assert_eq!(outcome.message.as_deref(), Some("Not enough stock"));

    let reread = store.products.find_by_id(&EntityId::Int(1)).await?.unwrap();
    assert_eq!(reread.available_quantity, Some(5));
    Ok(())
}

#[tokio::test]
async fn purchase_of_unknown_product_is_an_outcome_not_an_error() -> Result<()> {
    let dir = tempdir()?;
    seed_products(dir.path());
    let store = file_store(dir.path());

    let outcome = PurchaseProduct::new(&store)
        .execute(&EntityId::Int(404), 1)
        .await?;
    assert!(!outcome.success);
    assert_eq!(outcome.message.as_deref(), Some("Product not found"));
    Ok(())
}

#[tokio::test]
async fn zero_quantity_purchase_succeeds_without_touching_stock() -> Result<()> {
    let dir = tempdir()?;
    seed_products(dir.path());
    let store = file_store(dir.path());

    let outcome = PurchaseProduct::new(&store)
        .execute(&EntityId::Int(1), 0)
        .await?;
    assert!(outcome.success);

    let reread = store.products.find_by_id(&EntityId::Int(1)).await?.unwrap();
    assert_eq!(reread.available_quantity, Some(5));
    Ok(())
}

#[tokio::test]
async fn concurrent_purchases_never_oversell() -> Result<()> {
    let dir = tempdir()?;
    seed_products(dir.path());
    let store = file_store(dir.path());
    let purchase = Arc::new(PurchaseProduct::new(&store));

    // Product 1 starts with 5 units; eight buyers race for one each.
    let outcomes = join_all((0..8).map(|_| {
        let purchase = purchase.clone();
        async move { purchase.execute(&EntityId::Int(1), 1).await }
    }))
    .await;

    let successes = outcomes
        .iter()
        .filter(|o| o.as_ref().map(|o| o.success).unwrap_or(false))
        .count();
    assert_eq!(successes, 5);

    let reread = store.products.find_by_id(&EntityId::Int(1)).await?.unwrap();
    assert_eq!(reread.available_quantity, Some(0));
    Ok(())
}

#[tokio::test]
async fn payment_methods_are_enabled_and_ranked() -> Result<()> {
    let dir = tempdir()?;
    write_collection(
        dir.path(),
        "payment_methods",
        json!([
            { "id": 1, "name": "Visa", "type": "credit_card", "enabled": true, "priority": 2 },
            { "id": 2, "name": "Mercado Pago", "type": "digital_wallet", "enabled": true, "priority": 0 },
            { "id": 3, "name": "Transferencia", "type": "bank_transfer", "enabled": false, "priority": 1 }
        ]),
    );
    let store = file_store(dir.path());

    let methods = GetPaymentMethods::new(&store).execute().await?;
    let names: Vec<&str> = methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Mercado Pago", "Visa"]);
    Ok(())
}

#[tokio::test]
async fn seller_lookup_is_a_plain_pass_through() -> Result<()> {
    let dir = tempdir()?;
    write_collection(
        dir.path(),
        "sellers",
        json!([
            { "id": 1, "name": "TecnoHouse", "reputation": "green", "level": 5, "salesCount": 10, "isOfficialStore": true }
        ]),
    );
    let store = file_store(dir.path());

    let seller = GetSeller::new(&store).execute(&EntityId::from("1")).await?;
    assert_eq!(seller.map(|s| s.name), Some("TecnoHouse".to_string()));

    let missing = GetSeller::new(&store).execute(&EntityId::Int(9)).await?;
    assert!(missing.is_none());
    Ok(())
}
