use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod id;

pub use id::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    New,
    Used,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reputation {
    Green,
    Yellow,
    Orange,
    Red,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodType {
    CreditCard,
    DebitCard,
    DigitalWallet,
    CashPayment,
    BankTransfer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceType {
    Current,
    Historical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Installments {
    pub quantity: u32,
    pub amount: f64,
}

/// Flat name/value descriptor shown on the product sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAttribute {
    pub name: String,
    pub value: String,
}

/// Selectable configuration of a product, grouped by `attribute_id`
/// (e.g. COLOR, INTERNAL_MEMORY).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub attribute_id: String,
    pub value: String,
    #[serde(default)]
    pub selected: bool,
    #[serde(default = "default_true")]
    pub available: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub model: String,
    pub condition: Condition,
    pub price: f64,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installments: Option<Installments>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_quantity: Option<i64>,
    #[serde(default)]
    pub sold_quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<EntityId>,
    #[serde(default)]
    pub categories: Vec<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_id: Option<EntityId>,
    #[serde(default)]
    pub payment_method_ids: Vec<EntityId>,
    #[serde(default)]
    pub attributes: Vec<ProductAttribute>,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Keeps at most one `selected` variant per attribute group; the first
    /// one in document order wins. Seed data is never mutated, this runs on
    /// the in-memory copy a read composes.
    pub fn enforce_single_selection(&mut self) {
        let mut seen: HashSet<String> = HashSet::new();
        for variant in &mut self.variants {
            if variant.selected && !seen.insert(variant.attribute_id.clone()) {
                variant.selected = false;
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub path: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    pub id: EntityId,
    pub name: String,
    pub reputation: Reputation,
    #[serde(default)]
    pub level: i32,
    #[serde(default)]
    pub sales_count: i64,
    #[serde(default)]
    pub is_official_store: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    pub id: EntityId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PaymentMethodType,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Ascending sort key; lower is preferred.
    #[serde(default)]
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub id: EntityId,
    pub product_id: EntityId,
    pub url: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub is_main: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceHistoryEntry {
    pub id: EntityId,
    pub product_id: EntityId,
    pub price: f64,
    pub currency: String,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: PriceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One buyer review. Lives in a side collection keyed by product id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: EntityId,
    pub user: String,
    pub rating: u8,
    #[serde(rename = "comment")]
    pub text: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub average_rating: f64,
    pub total_reviews: usize,
    /// Histogram over ratings 1..=5; every bucket is present even when zero.
    pub rating_distribution: BTreeMap<u8, usize>,
}

impl ReviewSummary {
    pub fn from_comments(comments: &[Comment]) -> Self {
        let mut distribution: BTreeMap<u8, usize> = (1..=5).map(|r| (r, 0)).collect();
        let mut sum = 0u64;
        for comment in comments {
            sum += u64::from(comment.rating);
            if let Some(bucket) = distribution.get_mut(&comment.rating) {
                *bucket += 1;
            }
        }
        let total = comments.len();
        let average = if total == 0 {
            0.0
        } else {
            (sum as f64 / total as f64 * 10.0).round() / 10.0
        };
        Self {
            average_rating: average,
            total_reviews: total,
            rating_distribution: distribution,
        }
    }
}

/// Result of a purchase attempt. Business rejections (unknown product,
/// insufficient stock) are values here, never errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
}

impl PurchaseOutcome {
    pub fn completed(product: Product) -> Self {
        Self {
            success: true,
            message: None,
            product: Some(product),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            product: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(group: &str, value: &str, selected: bool) -> Variant {
        Variant {
            attribute_id: group.to_string(),
            value: value.to_string(),
            selected,
            available: true,
        }
    }

    #[test]
    fn first_selected_variant_per_group_wins() {
        let mut product: Product = serde_json::from_value(serde_json::json!({
            "id": 1,
            "title": "Phone",
            "condition": "new",
            "price": 100.0,
            "currency": "ARS",
        }))
        .unwrap();
        product.variants = vec![
            variant("COLOR", "black", true),
            variant("COLOR", "white", true),
            variant("INTERNAL_MEMORY", "128GB", true),
        ];

        product.enforce_single_selection();

        let selected: Vec<&str> = product
            .variants
            .iter()
            .filter(|v| v.selected)
            .map(|v| v.value.as_str())
            .collect();
        assert_eq!(selected, vec!["black", "128GB"]);
    }

    #[test]
    fn review_summary_counts_every_bucket() {
        let comments: Vec<Comment> = [5u8, 4, 5]
            .iter()
            .enumerate()
            .map(|(i, rating)| Comment {
                id: EntityId::Int(i as i64 + 1),
                user: format!("user{i}"),
                rating: *rating,
                text: "ok".to_string(),
                date: Utc::now(),
            })
            .collect();

        let summary = ReviewSummary::from_comments(&comments);
        assert_eq!(summary.average_rating, 4.7);
        assert_eq!(summary.total_reviews, 3);
        assert_eq!(summary.rating_distribution[&5], 2);
        assert_eq!(summary.rating_distribution[&4], 1);
        assert_eq!(summary.rating_distribution[&3], 0);
        assert_eq!(summary.rating_distribution[&2], 0);
        assert_eq!(summary.rating_distribution[&1], 0);
    }

    #[test]
    fn empty_reviews_average_to_zero() {
        let summary = ReviewSummary::from_comments(&[]);
        assert_eq!(summary.average_rating, 0.0);
        assert_eq!(summary.total_reviews, 0);
        assert_eq!(summary.rating_distribution.len(), 5);
    }
}
