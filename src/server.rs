// 🌐 HTTP Surface
// Router for the dashboard page and its JSON/GeoJSON endpoints.

use crate::choropleth::to_feature_collection;
use crate::config::DashboardConfig;
use crate::dashboard::Dashboard;
use crate::error::{LoadError, SelectionError};
use crate::filter::{FilterForm, FilterSelection};
use crate::join::JoinedRecord;
use crate::loader::DataLoader;
use crate::page::{escape_html, render_page};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    /// Base boundary layer, serialized once
    pub boundaries_json: Bytes,
    pub logo: Bytes,
    pub logo_content_type: &'static str,
}

impl AppState {
    pub fn new(dashboard: Dashboard, logo: Arc<Vec<u8>>, logo_content_type: &'static str) -> Self {
        let boundaries_json = geojson::GeoJson::from(dashboard.boundaries().to_feature_collection()).to_string();
        AppState {
            dashboard: Arc::new(dashboard),
            boundaries_json: Bytes::from(boundaries_json),
            logo: Bytes::from(logo.as_ref().clone()),
            logo_content_type,
        }
    }

    /// Load data and logo named by `config`; any failure aborts startup.
    pub fn load(config: &DashboardConfig, loader: &DataLoader) -> Result<Self, LoadError> {
        let dashboard = Dashboard::load(config, loader)?;
        let logo_path = config.logo_path();
        let logo = loader.logo(&logo_path)?;
        Ok(Self::new(dashboard, logo, content_type_for(&logo_path)))
    }
}

pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// API Response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: String) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message),
        }
    }
}

fn bad_request(err: SelectionError) -> Response {
    warn!(error = %err, "rejected filter selection");
    (StatusCode::BAD_REQUEST, Json(ApiResponse::err(err.to_string()))).into_response()
}

fn resolve(state: &AppState, form: &FilterForm) -> Result<FilterSelection, SelectionError> {
    state.dashboard.select(form)
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / - Dashboard page
async fn index(State(state): State<AppState>, Query(form): Query<FilterForm>) -> Response {
    match resolve(&state, &form) {
        Ok(selection) => {
            let view = state.dashboard.view(&selection);
            Html(render_page(&state.dashboard, &view)).into_response()
        }
        Err(err) => {
            warn!(error = %err, "rejected filter selection");
            (
                StatusCode::BAD_REQUEST,
                Html(format!(
                    "<!DOCTYPE html><p>Invalid filter selection: {}</p><p><a href=\"/\">Reset filters</a></p>",
                    escape_html(&err.to_string())
                )),
            )
                .into_response()
        }
    }
}

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/options - Choices for every form control
async fn get_options(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.dashboard.options().clone()))
}

#[derive(Serialize)]
struct CountiesResponse<'a> {
    selection: FilterSelection,
    count: usize,
    rows: Vec<&'a JoinedRecord>,
}

/// GET /api/counties - Filtered rows with display labels
async fn get_counties(State(state): State<AppState>, Query(form): Query<FilterForm>) -> Response {
    let selection = match resolve(&state, &form) {
        Ok(selection) => selection,
        Err(err) => return bad_request(err),
    };
    let view = state.dashboard.view(&selection);
    let body = CountiesResponse {
        selection: view.selection.clone(),
        count: view.rows.len(),
        rows: view.rows,
    };
    Json(ApiResponse::ok(body)).into_response()
}

/// GET /api/choropleth - Filtered rows as GeoJSON with fills and tooltips
async fn get_choropleth(State(state): State<AppState>, Query(form): Query<FilterForm>) -> Response {
    let selection = match resolve(&state, &form) {
        Ok(selection) => selection,
        Err(err) => return bad_request(err),
    };
    let view = state.dashboard.view(&selection);
    let collection = to_feature_collection(&view.rows, &view.choropleth);
    (
        [(header::CONTENT_TYPE, "application/geo+json")],
        geojson::GeoJson::from(collection).to_string(),
    )
        .into_response()
}

/// GET /api/boundaries - Base county layer
async fn get_boundaries(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/geo+json")],
        state.boundaries_json,
    )
}

/// GET /logo - Static logo image
async fn get_logo(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, state.logo_content_type)],
        state.logo,
    )
}

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/options", get(get_options))
        .route("/counties", get(get_counties))
        .route("/choropleth", get(get_choropleth))
        .route("/boundaries", get(get_boundaries))
        .with_state(state.clone());

    Router::new()
        .route("/", get(index))
        .route("/logo", get(get_logo))
        .with_state(state)
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::tests::sample_dashboard;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let state = AppState::new(sample_dashboard(), Arc::new(b"PNG".to_vec()), "image/png");
        build_router(state)
    }

    async fn get_body(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_body(test_router(), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"success":true,"data":"OK"}"#);
    }

    #[tokio::test]
    async fn test_index_renders_default_selection() {
        let (status, body) = get_body(test_router(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("U.S. Real Estate Insights"));
        assert!(body.contains("<strong>Metric</strong>: Median Sales Price"));
    }

    #[tokio::test]
    async fn test_index_rejects_out_of_range_threshold() {
        let (status, body) = get_body(test_router(), "/?min_homes_sold=900").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("between 1 and 500"));
    }

    #[tokio::test]
    async fn test_month_without_data_is_bad_request() {
        let (status, body) = get_body(test_router(), "/api/counties?period=2019-01-01").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["success"], serde_json::json!(false));

        let (status, _) = get_body(test_router(), "/?period=2019-01-01").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_boundaries_serialized_once_and_shared() {
        let state = AppState::new(sample_dashboard(), Arc::new(b"PNG".to_vec()), "image/png");
        let copy = state.clone();

        // Bytes clones share the same buffer
        assert_eq!(state.boundaries_json.as_ptr(), copy.boundaries_json.as_ptr());
        assert_eq!(&state.logo[..], b"PNG");
    }

    #[tokio::test]
    async fn test_counties_filtered_by_state() {
        let uri = "/api/counties?property_type=Single%20Family%20Residential&state=SC&min_homes_sold=10";
        let (status, body) = get_body(test_router(), uri).await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["data"]["count"], serde_json::json!(1));
        let row = &json["data"]["rows"][0];
        assert_eq!(row["state_code"], serde_json::json!("SC"));
        assert_eq!(row["county_fips"], serde_json::json!("45045"));
        assert!(row.get("Median Sales Price").is_some());
    }

    #[tokio::test]
    async fn test_counties_unknown_metric_is_bad_request() {
        let (status, body) = get_body(test_router(), "/api/counties?metric=Price").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["success"], serde_json::json!(false));
        assert_eq!(json["error"], serde_json::json!("unknown metric `Price`"));
    }

    #[tokio::test]
    async fn test_choropleth_empty_selection_is_valid_geojson() {
        let (status, body) = get_body(test_router(), "/api/choropleth?property_type=Townhouse").await;
        assert_eq!(status, StatusCode::OK);

        let collection: geojson::FeatureCollection = body.parse::<geojson::GeoJson>()
            .unwrap()
            .try_into()
            .unwrap();
        assert!(collection.features.is_empty());
    }

    #[tokio::test]
    async fn test_boundaries_and_logo() {
        let router = test_router();

        let (status, body) = get_body(router.clone(), "/api/boundaries").await;
        assert_eq!(status, StatusCode::OK);
        let collection: geojson::FeatureCollection = body.parse::<geojson::GeoJson>()
            .unwrap()
            .try_into()
            .unwrap();
        assert_eq!(collection.features.len(), 3);

        let (status, body) = get_body(router, "/logo").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "PNG");
    }

    #[tokio::test]
    async fn test_options() {
        let (status, body) = get_body(test_router(), "/api/options").await;
        assert_eq!(status, StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["data"]["states"], serde_json::json!(["All States", "NC", "SC"]));
        assert_eq!(json["data"]["periods"][0], serde_json::json!("2021-09-01"));
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(Path::new("data/logo.png")), "image/png");
        assert_eq!(content_type_for(Path::new("logo.SVG")), "image/svg+xml");
        assert_eq!(content_type_for(Path::new("logo")), "application/octet-stream");
    }
}
