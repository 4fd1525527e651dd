use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;
use crate::{boards, health, links};

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/boards", post(boards::create_board))
        .route("/me/boards", get(boards::list_my_boards))
        .route(
            "/boards/{board_id}",
            get(boards::get_board).patch(boards::update_board),
        )
        .route(
            "/boards/{board_id}/links",
            get(links::list_links).post(links::create_link),
        )
        .route("/boards/{board_id}/links/{link_id}", delete(links::delete_link))
        .route(
            "/boards/{board_id}/links/{link_id}/reactions",
            post(links::toggle_reaction),
        );

    Router::new()
        .nest("/api", api)
        .route("/healthz", get(health::healthz))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use shiori_db::Database;
    use shiori_preview::{FetchError, MetadataFetcher, PageMetadata};

    use super::*;
    use crate::state::AppStateInner;

    /// Pages under `ok.example` have metadata; everything else fails.
    struct FakeFetcher;

    #[async_trait]
    impl MetadataFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<PageMetadata, FetchError> {
            if url.starts_with("https://ok.example/") {
                Ok(PageMetadata {
                    title: "Fetched title".into(),
                    description: "Fetched description".into(),
                    image_url: "https://ok.example/og.png".into(),
                })
            } else {
                Err(FetchError::Status {
                    status: 404,
                    url: url.to_string(),
                })
            }
        }
    }

    struct TestApp {
        _dir: TempDir,
        router: Router,
    }

    impl TestApp {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let db = Arc::new(Database::open(&dir.path().join("api-test.db")).unwrap());
            let state = AppStateInner::new(db, Arc::new(FakeFetcher));
            Self {
                _dir: dir,
                router: router(state),
            }
        }

        async fn call(
            &self,
            method: Method,
            uri: &str,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            let body = match body {
                Some(json) => {
                    builder = builder.header("content-type", "application/json");
                    Body::from(json.to_string())
                }
                None => Body::empty(),
            };

            let response = self
                .router
                .clone()
                .oneshot(builder.body(body).unwrap())
                .await
                .unwrap();

            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        async fn create_board(&self, title: &str, device_id: &str) -> String {
            let (status, body) = self
                .call(
                    Method::POST,
                    "/api/boards",
                    Some(json!({
                        "title": title,
                        "members": ["Alice", "Bob"],
                        "device_id": device_id,
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            body["board_id"].as_str().unwrap().to_string()
        }

        async fn add_link(&self, board_id: &str, url: &str) -> Vec<Value> {
            let (status, body) = self
                .call(
                    Method::POST,
                    &format!("/api/boards/{board_id}/links"),
                    Some(json!({ "url": url, "category": "Food", "added_by": "Alice" })),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            body.as_array().unwrap().clone()
        }
    }

    #[tokio::test]
    async fn health_check() {
        let app = TestApp::new();
        let (status, body) = app.call(Method::GET, "/healthz", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn create_and_fetch_board() {
        let app = TestApp::new();
        let board_id = app.create_board("  Kyoto trip ", "device-1").await;

        let (status, board) = app.call(Method::GET, &format!("/api/boards/{board_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(board["id"], board_id.as_str());
        assert_eq!(board["title"], "Kyoto trip");
        assert_eq!(board["members"], json!(["Alice", "Bob"]));
        assert_eq!(board["tags"], json!(["Food", "Sightseeing", "Other"]));
        assert_eq!(board["created_by_device_id"], "device-1");
        assert!(board["created_at"].is_string());
    }

    #[tokio::test]
    async fn create_board_validation() {
        let app = TestApp::new();

        let (status, body) = app
            .call(Method::POST, "/api/boards", Some(json!({ "title": " ", "members": ["A"] })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "title is required");

        let (status, body) = app
            .call(Method::POST, "/api/boards", Some(json!({ "title": "Trip", "members": ["  "] })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "at least one member is required");

        let (status, body) = app
            .call(Method::POST, "/api/boards", Some(json!({ "title": 42 })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid request");
    }

    #[tokio::test]
    async fn missing_board_is_404() {
        let app = TestApp::new();
        let (status, body) = app.call(Method::GET, "/api/boards/nope", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "board not found");
    }

    #[tokio::test]
    async fn list_my_boards() {
        let app = TestApp::new();
        let older = app.create_board("Older", "device-1").await;
        let newer = app.create_board("Newer", "device-1").await;
        app.create_board("Someone else's", "device-2").await;

        let (status, boards) = app
            .call(Method::GET, "/api/me/boards?device_id=device-1&limit=abc", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = boards
            .as_array()
            .unwrap()
            .iter()
            .map(|b| b["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec![newer.as_str(), older.as_str()]);

        let (_, capped) = app
            .call(Method::GET, "/api/me/boards?device_id=device-1&limit=1", None)
            .await;
        assert_eq!(capped.as_array().unwrap().len(), 1);

        let (status, empty) = app.call(Method::GET, "/api/me/boards", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(empty, json!([]));
    }

    #[tokio::test]
    async fn patch_board() {
        let app = TestApp::new();
        let board_id = app.create_board("Trip", "device-1").await;
        let uri = format!("/api/boards/{board_id}");
        let (_, before) = app.call(Method::GET, &uri, None).await;

        let (status, board) = app
            .call(
                Method::PATCH,
                &uri,
                Some(json!({ "tags": ["Cafes"], "created_at": "2000-01-01T00:00:00Z" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(board["tags"], json!(["Cafes"]));
        assert_eq!(board["title"], "Trip");
        assert_eq!(board["created_at"], before["created_at"]);

        let (status, body) = app
            .call(Method::PATCH, &uri, Some(json!({ "created_at": "2000-01-01T00:00:00Z" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "no valid fields to update");

        let (status, _) = app
            .call(Method::PATCH, "/api/boards/nope", Some(json!({ "title": "x" })))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_link_relists_and_enriches() {
        let app = TestApp::new();
        let board_id = app.create_board("Trip", "d").await;

        let links = app.add_link(&board_id, "https://ok.example/ramen").await;
        assert_eq!(links.len(), 1);
        assert_eq!(links[0]["title"], "Fetched title");
        assert_eq!(links[0]["domain"], "ok.example");
        assert_eq!(links[0]["reactions"], json!({}));

        let links = app.add_link(&board_id, "https://www.broken.example/page").await;
        assert_eq!(links.len(), 2);
        let newest = &links[0];
        assert_eq!(newest["title"], "https://www.broken.example/page");
        assert_eq!(newest["description"], "");
        assert_eq!(newest["domain"], "broken.example");
        assert_eq!(
            newest["image_url"],
            "https://www.google.com/s2/favicons?domain=broken.example&sz=128"
        );
    }

    #[tokio::test]
    async fn create_link_validation_and_missing_board() {
        let app = TestApp::new();
        let board_id = app.create_board("Trip", "d").await;

        let (status, body) = app
            .call(
                Method::POST,
                &format!("/api/boards/{board_id}/links"),
                Some(json!({ "url": "https://ok.example/", "category": "Food" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "added_by is required");

        let (status, _) = app
            .call(
                Method::POST,
                "/api/boards/nope/links",
                Some(json!({ "url": "https://ok.example/", "category": "Food", "added_by": "A" })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_link_keeps_siblings() {
        let app = TestApp::new();
        let board_id = app.create_board("Trip", "d").await;
        app.add_link(&board_id, "https://ok.example/keep").await;
        let links = app.add_link(&board_id, "https://ok.example/gone").await;
        let gone = links[0]["id"].as_str().unwrap().to_string();

        let (status, body) = app
            .call(Method::DELETE, &format!("/api/boards/{board_id}/links/{gone}"), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);

        let (_, links) = app
            .call(Method::GET, &format!("/api/boards/{board_id}/links"), None)
            .await;
        let links = links.as_array().unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0]["url"], "https://ok.example/keep");
    }

    #[tokio::test]
    async fn toggle_reaction_round_trip() {
        let app = TestApp::new();
        let board_id = app.create_board("Trip", "d").await;
        let links = app.add_link(&board_id, "https://ok.example/ramen").await;
        let link_id = links[0]["id"].as_str().unwrap();
        let uri = format!("/api/boards/{board_id}/links/{link_id}/reactions");

        let (status, link) = app
            .call(Method::POST, &uri, Some(json!({ "emoji": "👍", "member": "Alice" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(link["reactions"]["👍"], json!(["Alice"]));

        let (_, link) = app
            .call(Method::POST, &uri, Some(json!({ "emoji": "👍", "member": "Alice" })))
            .await;
        assert_eq!(link["reactions"], json!({}));

        let (status, body) = app
            .call(Method::POST, &uri, Some(json!({ "emoji": "👍" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "member is required");

        let (status, _) = app
            .call(
                Method::POST,
                &format!("/api/boards/{board_id}/links/ghost/reactions"),
                Some(json!({ "emoji": "👍", "member": "Alice" })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
