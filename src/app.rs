use std::net::SocketAddr;
use axum::{Router, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::state::AppState;
use crate::{goals, planner, plans, recipes};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1",
              Router::new()
                  .merge(recipes::router())
                  .merge(goals::router())
                  .merge(planner::router())
                  .merge(plans::router())
                  .route("/health", get(|| async { "ok" }))
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, ms, "response");
                        } else {
                            tracing::info!(%status, ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
        .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::JwtKeys;
    use crate::recipes::{model::fixtures::recipe, model::Recipe, source::InMemoryRecipes};
    use axum::{
        body::Body,
        extract::FromRef,
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;
    use uuid::Uuid;

    struct Harness {
        app: Router,
        token: String,
    }

    impl Harness {
        fn new(catalog: Vec<Recipe>) -> Self {
            let mut state = AppState::fake();
            state.recipes = Arc::new(InMemoryRecipes::new(catalog));
            let token = JwtKeys::from_ref(&state).sign(Uuid::new_v4()).unwrap();
            Self {
                app: build_app(state),
                token,
            }
        }

        async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            let mut req = Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", self.token));
            let body = match body {
                Some(json) => {
                    req = req.header(header::CONTENT_TYPE, "application/json");
                    Body::from(json.to_string())
                }
                None => Body::empty(),
            };
            let res = self.app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
            let status = res.status();
            let bytes = axum::body::to_bytes(res.into_body(), 1 << 20).await.unwrap();
            let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, json)
        }
    }

    #[tokio::test]
    async fn health_needs_no_token() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn planner_rejects_missing_token() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(Request::get("/api/v1/planner").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let bytes = axum::body::to_bytes(res.into_body(), 1 << 20).await.unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn draft_starts_as_an_empty_week() {
        let h = Harness::new(vec![]);
        let (status, json) = h.call(Method::GET, "/api/v1/planner", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["days"].as_array().unwrap().len(), 7);
        assert_eq!(json["current_day"], 0);
        assert_eq!(json["days"][0]["meals"]["snacks"], json!([null]));
    }

    #[tokio::test]
    async fn meal_edits_go_to_the_selected_day() {
        let oats = recipe("Oats", "breakfast", 350.0);
        let h = Harness::new(vec![oats.clone()]);

        let (status, _) = h
            .call(Method::PUT, "/api/v1/planner/day", Some(json!({ "day": 2 })))
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, json) = h
            .call(
                Method::POST,
                "/api/v1/planner/meals",
                Some(json!({ "meal_type": "breakfast", "recipe_id": oats.id })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["change"], "inserted");
        assert_eq!(json["day"], 2);
        assert_eq!(json["meals"]["meals"]["breakfast"][0]["name"], "Oats");

        let (_, draft) = h.call(Method::GET, "/api/v1/planner", None).await;
        assert!(draft["days"][0]["meals"]["breakfast"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn eleventh_item_is_refused_with_a_warning() {
        let soup = recipe("Soup", "lunch", 300.0);
        let h = Harness::new(vec![soup.clone()]);
        let body = json!({ "meal_type": "lunch", "recipe_id": soup.id });
        for _ in 0..10 {
            let (status, _) = h.call(Method::POST, "/api/v1/planner/meals", Some(body.clone())).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, json) = h.call(Method::POST, "/api/v1/planner/meals", Some(body)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"]["message"], "You can only add up to 10 lunch items per day");
    }

    #[tokio::test]
    async fn lock_toggles_back_and_forth() {
        let h = Harness::new(vec![]);
        let body = json!({ "meal_type": "snack", "index": 1 });
        let (_, first) = h.call(Method::POST, "/api/v1/planner/locks", Some(body.clone())).await;
        assert_eq!(first, json!({ "key": "0-snack-1", "locked": true }));
        let (_, second) = h.call(Method::POST, "/api/v1/planner/locks", Some(body)).await;
        assert_eq!(second["locked"], false);
    }

    #[tokio::test]
    async fn drop_outside_a_list_changes_nothing() {
        let soup = recipe("Soup", "lunch", 300.0);
        let h = Harness::new(vec![soup.clone()]);
        h.call(
            Method::POST,
            "/api/v1/planner/meals",
            Some(json!({ "meal_type": "lunch", "recipe_id": soup.id })),
        )
        .await;

        let (status, json) = h
            .call(
                Method::POST,
                "/api/v1/planner/move",
                Some(json!({ "source": { "section": "lunch", "index": 0 }, "destination": null })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["change"], "unchanged");
        assert_eq!(json["draft"]["days"][0]["meals"]["lunch"][0]["name"], "Soup");
    }

    #[tokio::test]
    async fn recipes_filter_by_type() {
        let h = Harness::new(vec![
            recipe("Oats", "breakfast", 350.0),
            recipe("Chili", "dinner", 700.0),
        ]);
        let (status, json) = h.call(Method::GET, "/api/v1/recipes?type=dinner", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 1);
        assert_eq!(json[0]["name"], "Chili");

        let missing = format!("/api/v1/recipes/{}", Uuid::new_v4());
        let (status, _) = h.call(Method::GET, &missing, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
