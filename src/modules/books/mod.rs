pub mod error;
pub mod models;
pub mod persistence;
pub mod query;
pub mod routes;
pub mod stats;
pub mod store;
pub mod validation;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use serde_json::json;
use shelf_db::FileBlobStore;
use shelf_kernel::{InitCtx, Module};

pub use error::{CatalogError, ValidationError};
pub use models::{Book, BookSummary, Metadata};
pub use store::Store;

/// Books module: the catalog store and its HTTP surface
pub struct BooksModule {
    store: Arc<Store>,
}

impl BooksModule {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
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
            books = self.store.len(),
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
            books = self.store.len(),
            "books module stopped"
        );
        Ok(())
    }
}

/// Open the file-backed catalog at `path`.
pub fn open_store(path: &Path) -> Result<Arc<Store>, CatalogError> {
    let blob = FileBlobStore::new(path);
    Ok(Arc::new(Store::open(Arc::new(blob))?))
}

/// Create a new instance of the books module
pub fn create_module(store: Arc<Store>) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store))
}

fn error_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

fn json_response(description: &str, schema: serde_json::Value) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": { "schema": schema }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    let book_ref = json!({ "$ref": "#/components/schemas/Book" });
    let book_list = json!({ "type": "array", "items": book_ref });
    let id_param = json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "string" }
    });

    json!({
        "paths": {
            "/": {
                "get": {
                    "summary": "List books",
                    "tags": ["Books"],
                    "parameters": [
                        { "name": "genre", "in": "query", "schema": { "type": "string" },
                          "description": "Case-insensitive exact genre match" },
                        { "name": "min_rating", "in": "query", "schema": { "type": "number" } },
                        { "name": "sort", "in": "query", "schema": { "type": "string" },
                          "description": "Field name to sort ascending by" }
                    ],
                    "responses": {
                        "200": json_response("Books in catalog order unless sorted", book_list.clone()),
                        "400": error_response("Invalid query")
                    }
                },
                "post": {
                    "summary": "Create a book",
                    "tags": ["Books"],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": { "$ref": "#/components/schemas/CreateBook" }
                            }
                        }
                    },
                    "responses": {
                        "201": json_response("Created book", book_ref.clone()),
                        "422": error_response("Validation error"),
                        "500": error_response("Catalog could not be persisted")
                    }
                }
            },
            "/search": {
                "get": {
                    "summary": "Filter books by numeric field thresholds",
                    "description": "Every query key other than `operator` and `sort` is a `field > threshold` condition.",
                    "tags": ["Books"],
                    "parameters": [
                        { "name": "operator", "in": "query",
                          "schema": { "type": "string", "enum": ["AND", "OR"] } },
                        { "name": "sort", "in": "query", "schema": { "type": "string" } }
                    ],
                    "responses": {
                        "200": json_response("Matching books", book_list),
                        "400": error_response("No conditions or malformed thresholds")
                    }
                }
            },
            "/statistics": {
                "get": {
                    "summary": "Catalog statistics",
                    "tags": ["Books"],
                    "responses": {
                        "200": json_response("Statistics, or a notice when the catalog is empty",
                            json!({ "$ref": "#/components/schemas/Statistics" }))
                    }
                }
            },
            "/health": {
                "get": {
                    "summary": "Books health check",
                    "tags": ["Books"],
                    "responses": {
                        "200": {
                            "description": "OK",
                            "content": { "text/plain": { "schema": { "type": "string" } } }
                        }
                    }
                }
            },
            "/{id}": {
                "get": {
                    "summary": "Get a book",
                    "tags": ["Books"],
                    "parameters": [id_param.clone()],
                    "responses": {
                        "200": json_response("Book", book_ref.clone()),
                        "404": error_response("Book not found")
                    }
                }
            },
            "/{id}/rating": {
                "put": {
                    "summary": "Update a book's rating",
                    "tags": ["Books"],
                    "parameters": [id_param],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {
                                "schema": {
                                    "type": "object",
                                    "properties": { "rating": { "type": "number", "minimum": 0, "maximum": 5 } },
                                    "required": ["rating"]
                                }
                            }
                        }
                    },
                    "responses": {
                        "200": json_response("Updated book", book_ref),
                        "404": error_response("Book not found"),
                        "422": error_response("Validation error"),
                        "500": error_response("Catalog could not be persisted")
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "Metadata": {
                    "type": "object",
                    "properties": {
                        "pages": { "type": "number", "minimum": 0 },
                        "stockLeft": { "type": "number", "minimum": 0 },
                        "price": { "type": "number", "minimum": 0 },
                        "discount": { "type": "number", "minimum": 0 },
                        "edition": { "type": "number", "minimum": 0, "default": 1 }
                    }
                },
                "Book": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "description": "Identifier minted by the catalog" },
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "genre": { "type": "string" },
                        "publicationYear": { "type": "integer", "minimum": 1, "maximum": 9999 },
                        "description": { "type": "string" },
                        "rating": { "type": "number", "minimum": 0, "maximum": 5 },
                        "metadata": { "$ref": "#/components/schemas/Metadata" }
                    },
                    "required": ["id", "title", "author", "genre", "publicationYear", "description", "rating", "metadata"]
                },
                "CreateBook": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "author": { "type": "string" },
                        "genre": { "type": "string" },
                        "publicationYear": { "type": "integer", "minimum": 1, "maximum": 9999 },
                        "description": { "type": "string" },
                        "rating": { "type": "number", "minimum": 0, "maximum": 5, "default": 0 },
                        "metadata": { "$ref": "#/components/schemas/Metadata" }
                    },
                    "required": ["title", "author", "genre", "publicationYear", "description"]
                },
                "BookSummary": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "publicationYear": { "type": "integer" }
                    },
                    "required": ["title", "publicationYear"]
                },
                "Statistics": {
                    "type": "object",
                    "properties": {
                        "averageRatingByGenre": {
                            "type": "object",
                            "additionalProperties": { "type": "number" }
                        },
                        "oldestBook": { "$ref": "#/components/schemas/BookSummary" },
                        "newestBook": { "$ref": "#/components/schemas/BookSummary" },
                        "message": { "type": "string" }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_kernel::settings::Settings;
    use shelf_kernel::ModuleRegistry;

    #[test]
    fn open_store_reads_file_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.json");
        std::fs::write(&path, persistence::encode(&models::fixtures::sample()).unwrap()).unwrap();

        let store = open_store(&path).unwrap();
        assert_eq!(store.len(), 3);

        std::fs::write(&path, b"corrupt").unwrap();
        assert!(matches!(open_store(&path), Err(CatalogError::Storage(_))));
    }

    #[test]
    fn openapi_fragment_covers_every_route() {
        let paths = openapi_fragment()["paths"].as_object().unwrap().clone();
        for path in ["/", "/search", "/statistics", "/health", "/{id}", "/{id}/rating"] {
            assert!(paths.contains_key(path), "missing {path}");
        }
    }

    #[tokio::test]
    async fn module_lifecycle_through_registry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("books.json");
        std::fs::write(&path, b"[]").unwrap();

        let mut registry = ModuleRegistry::new();
        registry.register(create_module(open_store(&path).unwrap())).unwrap();

        let settings = Settings::default();
        let ctx = InitCtx {
            settings: &settings,
        };
        registry.init_all(&ctx).await.unwrap();
        registry.start_all(&ctx).await.unwrap();
        registry.stop_all().await.unwrap();
        assert!(registry.get_module("books").is_some());
    }
}
