//! In-memory book collection.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::{Number, Value};
use thiserror::Error;
use time::OffsetDateTime;

use super::models::{Book, BookFilter, BookPayload, BookSummary};

const ID_LENGTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BookError {
    #[error("book name is required")]
    MissingName,

    #[error("readPage ({read_page}) is greater than pageCount ({page_count})")]
    ReadPageExceedsPageCount {
        read_page: Number,
        page_count: Number,
    },

    #[error("book '{0}' not found")]
    NotFound(String),
}

pub type BookResult<T> = Result<T, BookError>;

/// Ordered collection of books behind a single lock.
///
/// Every operation holds the lock for its whole duration, and mutations
/// validate before touching the collection.
#[derive(Debug, Default)]
pub struct BookStore {
    books: RwLock<Vec<Book>>,
}

impl BookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append a new book, returning its generated id.
    pub fn add(&self, payload: BookPayload) -> BookResult<String> {
        let name = validate(&payload)?;
        let now = OffsetDateTime::now_utc();

        let book = Book {
            id: nanoid::nanoid!(ID_LENGTH),
            name,
            finished: payload.pages_read_all(),
            year: payload.year,
            author: payload.author,
            summary: payload.summary,
            publisher: payload.publisher,
            page_count: payload.page_count,
            read_page: payload.read_page,
            reading: payload.reading,
            inserted_at: now,
            updated_at: now,
        };
        let id = book.id.clone();

        self.write().push(book);
        tracing::info!(book_id = %id, "book added");
        Ok(id)
    }

    /// Project matching books to `{id, name, publisher}` in insertion order.
    pub fn list(&self, filter: &BookFilter) -> Vec<BookSummary> {
        self.read()
            .iter()
            .filter(|book| filter.matches(book))
            .map(Book::summary_view)
            .collect()
    }

    pub fn get(&self, id: &str) -> BookResult<Book> {
        self.read()
            .iter()
            .find(|book| book.id == id)
            .cloned()
            .ok_or_else(|| BookError::NotFound(id.to_string()))
    }

    /// Replace the mutable fields of an existing book.
    ///
    /// Payload validation runs before the id lookup.
    pub fn update(&self, id: &str, payload: BookPayload) -> BookResult<()> {
        let name = validate(&payload)?;

        let mut books = self.write();
        let book = books
            .iter_mut()
            .find(|book| book.id == id)
            .ok_or_else(|| BookError::NotFound(id.to_string()))?;

        book.apply(name, payload, OffsetDateTime::now_utc());
        tracing::info!(book_id = %id, "book updated");
        Ok(())
    }

    pub fn remove(&self, id: &str) -> BookResult<Book> {
        let mut books = self.write();
        let index = books
            .iter()
            .position(|book| book.id == id)
            .ok_or_else(|| BookError::NotFound(id.to_string()))?;

        // `Vec::remove` keeps the relative order of the remaining books.
        let removed = books.remove(index);
        tracing::info!(book_id = %id, "book removed");
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panic while holding the lock cannot leave a half-applied mutation, so
    // poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, Vec<Book>> {
        self.books.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Book>> {
        self.books.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Check the payload and return the owned, non-empty name.
fn validate(payload: &BookPayload) -> BookResult<String> {
    let name = match payload.name.as_deref() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Err(BookError::MissingName),
    };

    if let (Some(read_page), Some(page_count)) = (&payload.read_page, &payload.page_count) {
        if payload.read_page_exceeds_page_count() {
            return Err(BookError::ReadPageExceedsPageCount {
                read_page: read_page.clone(),
                page_count: page_count.clone(),
            });
        }
    }

    Ok(name)
}
