pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use bookshelf_kernel::{InitCtx, Module};
use serde_json::json;
use utoipa::PartialSchema;

use models::{Book, BookPayload, BookSummary, CreatedBook};
use store::BookStore;

/// Books module: an in-memory collection served under `/books`
pub struct BooksModule {
    store: Arc<BookStore>,
}

impl BooksModule {
    pub fn new() -> Self {
        Self::with_store(Arc::new(BookStore::new()))
    }

    /// Build the module around an existing store, e.g. one shared with a test
    pub fn with_store(store: Arc<BookStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<BookStore> {
        &self.store
    }
}

impl Default for BooksModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.store.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            dropped = self.store.len(),
            "books module stopped; in-memory records discarded"
        );
        Ok(())
    }
}

fn fail_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/FailResponse" }
            }
        }
    })
}

fn success_response(description: &str, data: serde_json::Value) -> serde_json::Value {
    let mut properties = json!({
        "status": { "type": "string", "enum": ["success"] },
        "message": { "type": "string" }
    });
    if !data.is_null() {
        properties["data"] = data;
    }
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": {
                    "type": "object",
                    "properties": properties,
                    "required": ["status"]
                }
            }
        }
    })
}

fn schema_json<T: PartialSchema>() -> serde_json::Value {
    serde_json::to_value(T::schema()).unwrap_or_default()
}

fn openapi_fragment() -> serde_json::Value {
    let id_param = json!([{
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "string" }
    }]);
    let payload_body = json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/BookPayload" }
            }
        }
    });
    let flag = |description: &str| {
        json!({
            "in": "query",
            "required": false,
            "description": description,
            "schema": { "type": "string", "enum": ["0", "1"] }
        })
    };
    let mut reading = flag("Only books whose `reading` flag matches");
    reading["name"] = json!("reading");
    let mut finished = flag("Only books whose `finished` flag matches");
    finished["name"] = json!("finished");

    json!({
        "paths": {
            "/books": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "parameters": [
                        {
                            "name": "name",
                            "in": "query",
                            "required": false,
                            "description": "Case-insensitive substring of the book name",
                            "schema": { "type": "string" }
                        },
                        reading,
                        finished
                    ],
                    "responses": {
                        "200": success_response("Matching books", json!({
                            "type": "object",
                            "properties": {
                                "books": {
                                    "type": "array",
                                    "items": { "$ref": "#/components/schemas/BookSummary" }
                                }
                            }
                        }))
                    }
                },
                "post": {
                    "summary": "Add a book",
                    "tags": ["Books"],
                    "requestBody": payload_body.clone(),
                    "responses": {
                        "201": success_response("Book added", json!({
                            "$ref": "#/components/schemas/CreatedBook"
                        })),
                        "400": fail_response("Missing name or readPage greater than pageCount")
                    }
                }
            },
            "/books/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": id_param.clone(),
                    "responses": {
                        "200": success_response("The book", json!({
                            "type": "object",
                            "properties": {
                                "book": { "$ref": "#/components/schemas/Book" }
                            }
                        })),
                        "404": fail_response("Book not found")
                    }
                },
                "put": {
                    "summary": "Replace a book's fields",
                    "tags": ["Books"],
                    "parameters": id_param.clone(),
                    "requestBody": payload_body,
                    "responses": {
                        "200": success_response("Book updated", serde_json::Value::Null),
                        "400": fail_response("Missing name or readPage greater than pageCount"),
                        "404": fail_response("Book not found")
                    }
                },
                "delete": {
                    "summary": "Delete a book",
                    "tags": ["Books"],
                    "parameters": id_param,
                    "responses": {
                        "200": success_response("Book deleted", serde_json::Value::Null),
                        "404": fail_response("Book not found")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Book": schema_json::<Book>(),
                "BookPayload": schema_json::<BookPayload>(),
                "BookSummary": schema_json::<BookSummary>(),
                "CreatedBook": schema_json::<CreatedBook>()
            }
        }
    })
}

/// Create a new instance of the books module
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(BooksModule::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_fragment_covers_all_routes() {
        let spec = BooksModule::new().openapi().unwrap();
        let books = &spec["paths"]["/books"];
        assert!(books.get("get").is_some());
        assert!(books.get("post").is_some());

        let book = &spec["paths"]["/books/{id}"];
        for method in ["get", "put", "delete"] {
            assert!(book.get(method).is_some(), "missing {method}");
        }
    }

    #[test]
    fn openapi_schemas_use_wire_names() {
        let spec = BooksModule::new().openapi().unwrap();
        let book = &spec["components"]["schemas"]["Book"]["properties"];
        assert!(book.get("pageCount").is_some());
        assert!(book.get("insertedAt").is_some());
        assert!(book.get("page_count").is_none());
    }

    #[tokio::test]
    async fn stop_reports_without_touching_store() {
        let module = BooksModule::new();
        module
            .store()
            .add(BookPayload {
                name: Some("Dune".to_string()),
                ..BookPayload::default()
            })
            .unwrap();

        module.stop().await.unwrap();
        assert_eq!(module.store().len(), 1);
    }
}
