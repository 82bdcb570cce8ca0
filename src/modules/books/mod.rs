pub mod models;
pub mod repository;
pub mod routes;

use async_trait::async_trait;
use axum::Router;
use bookstore_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use repository::BookRepository;

/// Books catalogue: the `books` table and its CRUD routes
pub struct BooksModule;

impl BooksModule {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let books = BookRepository::new(ctx.db.clone()).list_all().await?;
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            stored = books.len(),
            "books module initialized"
        );
        Ok(())
    }

    /// Served from the root so clients keep using `/get-books` and friends
    fn mount_path(&self) -> String {
        "/".to_string()
    }

    fn routes(&self, ctx: &InitCtx<'_>) -> Router {
        routes::router(BookRepository::new(ctx.db.clone()))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let no_content = json!({ "description": "No book with this id" });
        let book_response = json!({
            "description": "The updated book",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/Book" }
                }
            }
        });
        let id_param = json!({
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "integer", "format": "int64" }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "Book list page",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "HTML page shell",
                                "content": { "text/html": { "schema": { "type": "string" } } }
                            }
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Books health check",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "The books table is reachable",
                                "content": { "text/plain": { "schema": { "type": "string" } } }
                            },
                            "500": {
                                "description": "Storage failure",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                },
                "/get-books": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "Every stored book in insertion order",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Book" }
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "/new-book": {
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
                            "200": { "description": "Book stored" },
                            "422": {
                                "description": "Validation error",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                                    }
                                }
                            }
                        }
                    }
                },
                "/del-book/{id}": {
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": [id_param.clone()],
                        "responses": {
                            "200": { "description": "Book deleted" },
                            "204": no_content.clone()
                        }
                    }
                },
                "/update-book/{id}": {
                    "put": {
                        "summary": "Update some fields of a book",
                        "tags": ["Books"],
                        "parameters": [id_param.clone()],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/UpdateBook" }
                                }
                            }
                        },
                        "responses": {
                            "200": book_response.clone(),
                            "204": no_content.clone()
                        }
                    }
                },
                "/update-book/{id}/soldout/{flag}": {
                    "put": {
                        "summary": "Mark a book sold out (`1`) or available (anything else)",
                        "tags": ["Books"],
                        "parameters": [
                            id_param,
                            {
                                "name": "flag",
                                "in": "path",
                                "required": true,
                                "schema": { "type": "string" }
                            }
                        ],
                        "responses": {
                            "200": book_response,
                            "204": no_content
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "title": { "type": "string" },
                            "price": { "type": "number", "format": "double" },
                            "soldout": { "type": "boolean" }
                        },
                        "required": ["id", "title", "price", "soldout"]
                    },
                    "CreateBook": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "price": { "type": "number", "format": "double" }
                        },
                        "required": ["title", "price"]
                    },
                    "UpdateBook": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "price": { "type": "number", "format": "double" },
                            "soldout": { "type": "boolean" }
                        }
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        repository::MIGRATIONS.to_vec()
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use bookstore_kernel::{settings::Settings, ModuleRegistry};
    use serde_json::Value;
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
    }

    impl TestApp {
        async fn new() -> Self {
            let settings = Settings::default();
            let db = bookstore_db::connect_in_memory().await.unwrap();

            let mut registry = ModuleRegistry::new();
            registry.register(create_module());
            bookstore_db::run_migrations(&db, &registry.collect_migrations())
                .await
                .unwrap();

            let ctx = InitCtx {
                settings: &settings,
                db: &db,
            };
            registry.init_modules(&ctx).await.unwrap();
            let router = bookstore_http::build_router(&registry, &ctx);

            Self { router }
        }

        async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
            let request = Request::builder().method(method).uri(uri);
            let request = match body {
                Some(json) => request
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json.to_string())),
                None => request.body(Body::empty()),
            }
            .unwrap();

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, bytes.to_vec())
        }

        async fn send_raw(&self, method: Method, uri: &str, body: &'static str) -> (StatusCode, Vec<u8>) {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body))
                .unwrap();

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, bytes.to_vec())
        }

        async fn books(&self) -> Vec<Value> {
            let (status, body) = self.send(Method::GET, "/get-books", None).await;
            assert_eq!(status, StatusCode::OK);
            serde_json::from_slice(&body).unwrap()
        }

        async fn create(&self, title: &str, price: f64) -> i64 {
            let (status, body) = self
                .send(
                    Method::POST,
                    "/new-book",
                    Some(json!({ "title": title, "price": price })),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            assert!(body.is_empty());
            self.books().await.last().unwrap()["id"].as_i64().unwrap()
        }
    }

    #[tokio::test]
    async fn index_serves_page_shell() {
        let app = TestApp::new().await;
        let (status, body) = app.send(Method::GET, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(body).unwrap().contains("/static/js/bookview.js"));

        let (status, _) = app.send(Method::GET, "/static/js/bookview.js", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn create_list_delete_round() {
        let app = TestApp::new().await;
        assert!(app.books().await.is_empty());

        let id = app.create("Dune", 9.99).await;
        assert_eq!(
            app.books().await,
            vec![json!({ "id": id, "title": "Dune", "price": 9.99, "soldout": false })]
        );

        let (status, body) = app
            .send(Method::DELETE, &format!("/del-book/{}", id), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        assert!(app.books().await.is_empty());
    }

    #[tokio::test]
    async fn delete_missing_book_is_no_content() {
        let app = TestApp::new().await;
        let id = app.create("Dune", 9.99).await;

        let (status, body) = app
            .send(Method::DELETE, &format!("/del-book/{}", id + 100), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());

        let (status, _) = app.send(Method::DELETE, "/del-book/not-a-number", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(app.books().await.len(), 1);
    }

    #[tokio::test]
    async fn update_changes_only_supplied_fields() {
        let app = TestApp::new().await;
        let id = app.create("Dune", 9.99).await;

        let (status, body) = app
            .send(
                Method::PUT,
                &format!("/update-book/{}", id),
                Some(json!({ "price": 12.5 })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let book: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            book,
            json!({ "id": id, "title": "Dune", "price": 12.5, "soldout": false })
        );
        assert_eq!(app.books().await, vec![book]);
    }

    #[tokio::test]
    async fn update_missing_book_is_no_content() {
        let app = TestApp::new().await;
        let id = app.create("Dune", 9.99).await;

        let (status, body) = app
            .send(
                Method::PUT,
                &format!("/update-book/{}", id + 1),
                Some(json!({ "title": "Other" })),
            )
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());
        assert_eq!(app.books().await[0]["title"], "Dune");
    }

    #[tokio::test]
    async fn update_missing_book_ignores_body() {
        let app = TestApp::new().await;
        let id = app.create("Dune", 9.99).await;
        let missing = format!("/update-book/{}", id + 1);

        let (status, body) = app.send(Method::PUT, &missing, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(body.is_empty());

        let (status, _) = app
            .send(Method::PUT, &missing, Some(json!({ "price": "x" })))
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = app.send_raw(Method::PUT, &missing, "{not json").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn update_with_malformed_body_changes_nothing() {
        let app = TestApp::new().await;
        let id = app.create("Dune", 9.99).await;
        let uri = format!("/update-book/{}", id);

        let (status, body) = app
            .send(Method::PUT, &uri, Some(json!({ "price": "x" })))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let error: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(error["error"]["code"], "validation_error");

        let (status, _) = app.send_raw(Method::PUT, &uri, "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(
            app.books().await,
            vec![json!({ "id": id, "title": "Dune", "price": 9.99, "soldout": false })]
        );
    }

    #[tokio::test]
    async fn module_health_reports_ok() {
        let app = TestApp::new().await;
        let (status, body) = app.send(Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"books module is healthy");
    }

    #[tokio::test]
    async fn soldout_flag_route() {
        let app = TestApp::new().await;
        let id = app.create("Dune", 9.99).await;

        let (status, body) = app
            .send(Method::PUT, &format!("/update-book/{}/soldout/1", id), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let book: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(book["soldout"], true);
        assert_eq!(book["title"], "Dune");

        let (_, body) = app
            .send(Method::PUT, &format!("/update-book/{}/soldout/yes", id), None)
            .await;
        let book: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(book["soldout"], false);

        let (status, _) = app
            .send(Method::PUT, &format!("/update-book/{}/soldout/1", id + 1), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn create_without_price_is_rejected() {
        let app = TestApp::new().await;

        let (status, body) = app
            .send(Method::POST, "/new-book", Some(json!({ "title": "Dune" })))
            .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let error: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(error["error"]["code"], "validation_error");

        assert!(app.books().await.is_empty());
    }

    #[tokio::test]
    async fn openapi_lists_book_routes_at_root() {
        let app = TestApp::new().await;
        let (status, body) = app.send(Method::GET, "/docs/openapi.json", None).await;
        assert_eq!(status, StatusCode::OK);

        let spec: Value = serde_json::from_slice(&body).unwrap();
        assert!(spec["paths"]["/get-books"]["get"].is_object());
        assert!(spec["paths"]["/health"]["get"].is_object());
        assert!(spec["paths"]["/update-book/{id}/soldout/{flag}"]["put"].is_object());
        assert!(spec["components"]["schemas"]["Book"].is_object());
    }
}
