//! Global search across products, categories and transactions.
//!
//! Searching is a pure function over an in-memory [`SearchIndex`]; where the
//! index comes from is the caller's business.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Product as listed in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub quantity: i64,
}

/// Product category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Product reference embedded in a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    #[serde(default, alias = "_id")]
    pub id: Option<String>,
    pub name: String,
}

/// Stock movement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub product: Option<ProductRef>,
}

/// Everything search looks through
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchIndex {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// Kind of record a result points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Product,
    Category,
    Transaction,
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultKind::Product => write!(f, "product"),
            ResultKind::Category => write!(f, "category"),
            ResultKind::Transaction => write!(f, "transaction"),
        }
    }
}

/// One search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub kind: ResultKind,
    pub title: String,
    pub description: String,
    pub url: String,
}

/// How closely a title matched, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MatchQuality {
    Exact,
    Prefix,
    Substring,
}

fn match_quality(haystack: &str, needle: &str) -> Option<MatchQuality> {
    let haystack = haystack.to_lowercase();
    if haystack == needle {
        Some(MatchQuality::Exact)
    } else if haystack.starts_with(needle) {
        Some(MatchQuality::Prefix)
    } else if haystack.contains(needle) {
        Some(MatchQuality::Substring)
    } else {
        None
    }
}

/// Case-insensitive search over `index`.
///
/// Exact title matches come first, then prefix matches, then any other
/// substring match. Within a tier products precede categories, which
/// precede transactions, each in index order. A blank query returns nothing.
pub fn search(query: &str, index: &SearchIndex) -> Vec<SearchResult> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let products = index.products.iter().filter_map(|product| {
        let quality = match_quality(&product.name, &needle)?;
        let category = product
            .category
            .as_ref()
            .map_or("Uncategorized", |category| category.name.as_str());
        Some((
            quality,
            SearchResult {
                id: product.id.clone(),
                kind: ResultKind::Product,
                title: product.name.clone(),
                description: format!("{category} - {} in stock", product.quantity),
                url: format!("/products/{}", product.id),
            },
        ))
    });

    let categories = index.categories.iter().filter_map(|category| {
        let quality = match_quality(&category.name, &needle)?;
        Some((
            quality,
            SearchResult {
                id: category.id.clone(),
                kind: ResultKind::Category,
                title: category.name.clone(),
                description: category
                    .description
                    .clone()
                    .filter(|d| !d.is_empty())
                    .unwrap_or_else(|| "No description".to_string()),
                url: format!("/categories/{}", category.id),
            },
        ))
    });

    let transactions = index.transactions.iter().filter_map(|transaction| {
        let product = transaction.product.as_ref()?;
        let quality = match_quality(&product.name, &needle)?;
        Some((
            quality,
            SearchResult {
                id: transaction.id.clone(),
                kind: ResultKind::Transaction,
                title: product.name.clone(),
                description: format!("{} - {} units", transaction.kind, transaction.quantity),
                url: format!("/transactions/{}", transaction.id),
            },
        ))
    });

    let mut ranked: Vec<(MatchQuality, SearchResult)> =
        products.chain(categories).chain(transactions).collect();
    // Stable: equal quality keeps kind order, then index order.
    ranked.sort_by_key(|(quality, _)| *quality);
    ranked.into_iter().map(|(_, result)| result).collect()
}
