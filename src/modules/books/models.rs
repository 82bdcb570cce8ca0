use serde::{Deserialize, Serialize};

/// A catalogue entry, one row of the `books` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Unique identifier assigned by the database
    pub id: i64,
    /// Title of the book
    pub title: String,
    /// Price of the book
    pub price: f64,
    /// Whether the book is no longer available for purchase
    pub soldout: bool,
}

/// Request model for creating a new book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBook {
    pub title: String,
    pub price: f64,
}

/// Partial update; absent (or `null`) fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBook {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub soldout: Option<bool>,
}

impl UpdateBook {
    /// Overwrite the fields of `book` that this update carries.
    pub fn apply_to(self, book: &mut Book) {
        if let Some(title) = self.title {
            book.title = title;
        }
        if let Some(price) = self.price {
            book.price = price;
        }
        if let Some(soldout) = self.soldout {
            book.soldout = soldout;
        }
    }
}
