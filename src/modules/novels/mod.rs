pub mod handlers;
pub mod models;

use async_trait::async_trait;
use axum::{
    routing::{get, post},
    Router,
};
use serde_json::json;
use shelf_kernel::{InitCtx, Module};

use crate::state::AppState;

/// Catalogue of novels backed by the configured store
pub struct NovelsModule {
    state: AppState,
}

impl NovelsModule {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for NovelsModule {
    fn name(&self) -> &'static str {
        "novels"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            backend = self.state.store.backend(),
            "novels module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/", get(handlers::list).post(handlers::create))
            .route("/mine", get(handlers::list_mine))
            .route(
                "/{id}",
                get(handlers::show)
                    .post(handlers::update)
                    .delete(handlers::delete),
            )
            .route("/{id}/delete", post(handlers::delete))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let redirect = |description: &str| {
            json!({
                "description": description,
                "headers": { "Location": { "schema": { "type": "string" } } }
            })
        };
        let novel_list = json!({
            "description": "Novels ordered by title",
            "content": {
                "application/json": {
                    "schema": {
                        "type": "array",
                        "items": { "$ref": "#/components/schemas/Novel" }
                    }
                }
            }
        });
        let id_param = json!([{
            "name": "id",
            "in": "path",
            "required": true,
            "schema": { "type": "string" }
        }]);
        let form_body = json!({
            "required": true,
            "content": {
                "application/x-www-form-urlencoded": {
                    "schema": { "$ref": "#/components/schemas/NovelForm" }
                }
            }
        });

        let text = |description: &str| json!({ "type": "string", "description": description });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List novels",
                        "tags": ["Novels"],
                        "responses": {
                            "200": novel_list,
                            "503": error("Store closed")
                        }
                    },
                    "post": {
                        "summary": "Add a novel",
                        "tags": ["Novels"],
                        "requestBody": form_body,
                        "responses": {
                            "302": redirect("Redirect to the new novel"),
                            "503": error("Store closed")
                        }
                    }
                },
                "/mine": {
                    "get": {
                        "summary": "List novels created by the current user",
                        "tags": ["Novels"],
                        "responses": {
                            "200": novel_list,
                            "302": redirect("Redirect to login when anonymous")
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Get a novel",
                        "tags": ["Novels"],
                        "parameters": id_param,
                        "responses": {
                            "200": {
                                "description": "The novel",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Novel" }
                                    }
                                }
                            },
                            "404": error("No novel with this id")
                        }
                    },
                    "post": {
                        "summary": "Replace a novel",
                        "tags": ["Novels"],
                        "parameters": id_param,
                        "requestBody": form_body,
                        "responses": {
                            "302": redirect("Redirect to the updated novel"),
                            "400": error("Unset id"),
                            "404": error("No novel with this id")
                        }
                    },
                    "delete": {
                        "summary": "Delete a novel",
                        "tags": ["Novels"],
                        "parameters": id_param,
                        "responses": {
                            "302": redirect("Redirect to the list"),
                            "400": error("Unset id"),
                            "404": error("No novel with this id")
                        }
                    }
                },
                "/{id}/delete": {
                    "post": {
                        "summary": "Delete a novel from an HTML form",
                        "tags": ["Novels"],
                        "parameters": id_param,
                        "responses": {
                            "302": redirect("Redirect to the list"),
                            "404": error("No novel with this id")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Novel": {
                        "type": "object",
                        "properties": {
                            "id": text("Backend-assigned identifier"),
                            "title": text("Title"),
                            "author": text("Author"),
                            "publishedDate": text("Free-text publication date"),
                            "imageURL": text("Cover image URL"),
                            "description": text("Description"),
                            "createdBy": text("Display name of the creator"),
                            "createdByID": text("Identity of the creator")
                        },
                        "required": ["id", "title", "author", "publishedDate", "imageURL",
                                     "description", "createdBy", "createdByID"]
                    },
                    "NovelForm": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "publishedDate": { "type": "string" },
                            "imageURL": { "type": "string" },
                            "description": { "type": "string" },
                            "createdBy": { "type": "string" },
                            "createdByID": {
                                "type": "string",
                                "description": "Empty means the current user, or anonymous"
                            }
                        }
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "novels module stopped");
        Ok(())
    }
}
