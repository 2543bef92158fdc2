//! Catalog record types and their spreadsheet row mapping.

use serde::{Deserialize, Serialize};

/// One book in the shop.  Every field is kept as the sheet's text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub author: String,
    pub price: String,
    pub category: String,
    pub image_url: String,
    pub description: String,
    pub amazon_link: String,
    pub amazon_kindle_link: String,
    pub published_at: String,
}

/// One shop news item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct News {
    pub id: String,
    pub title: String,
    pub content: String,
    pub published_at: String,
}

/// Cell `idx` of `row`, or an empty string when the sheet omitted it.
fn cell(row: &[String], idx: usize) -> String {
    row.get(idx).cloned().unwrap_or_default()
}

impl Product {
    /// Columns A–J: id, title, author, price, category, image_url,
    /// description, amazon_link, amazon_kindle_link, published_at.
    pub fn from_row(row: &[String]) -> Self {
        Self {
            id: cell(row, 0),
            title: cell(row, 1),
            author: cell(row, 2),
            price: cell(row, 3),
            category: cell(row, 4),
            image_url: cell(row, 5),
            description: cell(row, 6),
            amazon_link: cell(row, 7),
            amazon_kindle_link: cell(row, 8),
            published_at: cell(row, 9),
        }
    }
}

impl News {
    /// Columns A–D: id, title, content, published_at.
    pub fn from_row(row: &[String]) -> Self {
        Self {
            id: cell(row, 0),
            title: cell(row, 1),
            content: cell(row, 2),
            published_at: cell(row, 3),
        }
    }
}
