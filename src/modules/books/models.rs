use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use time::OffsetDateTime;
use utoipa::ToSchema;

/// A book record held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Unique identifier, assigned on creation
    pub id: String,
    pub name: String,
    #[schema(value_type = Option<i32>)]
    pub year: Option<Value>,
    pub author: Option<String>,
    pub summary: Option<String>,
    pub publisher: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub page_count: Option<Number>,
    #[schema(value_type = Option<f64>)]
    pub read_page: Option<Number>,
    #[schema(value_type = Option<bool>)]
    pub reading: Option<Value>,
    /// `readPage == pageCount` at creation time; not recomputed on update
    pub finished: bool,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub inserted_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: OffsetDateTime,
}

impl Book {
    pub fn summary_view(&self) -> BookSummary {
        BookSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            publisher: self.publisher.clone(),
        }
    }

    /// Overwrite every caller-supplied field; `id`, `inserted_at` and `finished` are kept.
    pub(crate) fn apply(&mut self, name: String, payload: BookPayload, now: OffsetDateTime) {
        self.name = name;
        self.year = payload.year;
        self.author = payload.author;
        self.summary = payload.summary;
        self.publisher = payload.publisher;
        self.page_count = payload.page_count;
        self.read_page = payload.read_page;
        self.reading = payload.reading;
        self.updated_at = now;
    }
}

/// Request body for creating or replacing a book.
///
/// Only `name` and the page counts are checked by the store; `year` and
/// `reading` are stored as sent, and the counts accept any JSON number.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    pub name: Option<String>,
    #[schema(value_type = Option<i32>)]
    pub year: Option<Value>,
    pub author: Option<String>,
    pub summary: Option<String>,
    pub publisher: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub page_count: Option<Number>,
    #[schema(value_type = Option<f64>)]
    pub read_page: Option<Number>,
    #[schema(value_type = Option<bool>)]
    pub reading: Option<Value>,
}

impl BookPayload {
    /// Numeric comparison of the page counts; both absent counts as equal.
    pub fn pages_read_all(&self) -> bool {
        match (&self.read_page, &self.page_count) {
            (Some(read), Some(total)) => read.as_f64() == total.as_f64(),
            (None, None) => true,
            _ => false,
        }
    }

    /// `true` when both counts are present and `readPage > pageCount`.
    pub fn read_page_exceeds_page_count(&self) -> bool {
        match (&self.read_page, &self.page_count) {
            (Some(read), Some(total)) => match (read.as_f64(), total.as_f64()) {
                (Some(read), Some(total)) => read > total,
                _ => false,
            },
            _ => false,
        }
    }
}

/// Listing projection of a book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookSummary {
    pub id: String,
    pub name: String,
    pub publisher: Option<String>,
}

/// Conjunctive listing filters; `None` disables a filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookFilter {
    /// Case-insensitive substring of `name`
    pub name: Option<String>,
    pub reading: Option<bool>,
    pub finished: Option<bool>,
}

impl BookFilter {
    pub fn matches(&self, book: &Book) -> bool {
        if let Some(needle) = &self.name {
            if !book.name.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        if let Some(reading) = self.reading {
            if book.reading != Some(Value::Bool(reading)) {
                return false;
            }
        }
        if let Some(finished) = self.finished {
            if book.finished != finished {
                return false;
            }
        }
        true
    }
}

/// Raw `GET /books` query string, every value kept per key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub name: Vec<String>,
    pub reading: Vec<String>,
    pub finished: Vec<String>,
}

impl FromIterator<(String, String)> for ListQuery {
    /// Unknown keys are ignored.
    fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut query = ListQuery::default();
        for (key, value) in pairs {
            match key.as_str() {
                "name" => query.name.push(value),
                "reading" => query.reading.push(value),
                "finished" => query.finished.push(value),
                _ => {}
            }
        }
        query
    }
}

impl From<ListQuery> for BookFilter {
    /// A flag is true only when given once as `"1"`; any other value, or a
    /// repeated key, means false. The last non-empty `name` wins.
    fn from(query: ListQuery) -> Self {
        let flag = |values: Vec<String>| match values.as_slice() {
            [] => None,
            [value] => Some(value == "1"),
            _ => Some(false),
        };
        Self {
            name: query.name.into_iter().rev().find(|name| !name.is_empty()),
            reading: flag(query.reading),
            finished: flag(query.finished),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBook {
    pub book_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookList {
    pub books: Vec<BookSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookDetail {
    pub book: Book,
}
