//! REST API for the stowage planner.
//!
//! Exposes the planning engine over HTTP with Axum, documents it with
//! utoipa and allows cross-origin requests.

use std::sync::OnceLock;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};

use crate::config::{ApiConfig, EngineConfig};
use crate::demo::{DemoOptions, generate_items};
use crate::error::PlanError;
use crate::model::{Item, OmittedItem, PackedContainer, StowedItem};
use crate::packer::PackingMode;
use crate::partition::{Manifest, plan_shipment};

/// Upper bound for synthesised demo shipments.
pub const MAX_DEMO_ITEMS: usize = 5000;

#[derive(Clone, Default)]
struct ApiState {
    engine: EngineConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>stowage-planner API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                window.ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                });
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Request body of `POST /optimize`.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "items": [
            {
                "id": "P-1001",
                "category": "Dry_General",
                "destination": "Rotterdam",
                "volume": 2.4,
                "weight": 800.0,
                "length": 1.6,
                "width": 1.0,
                "height": 1.5
            }
        ],
        "mode": "spatial"
    })
)]
pub struct OptimizeRequest {
    pub items: Vec<Item>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub mode: Option<PackingMode>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub allow_rotations: Option<bool>,
}

/// Request body of `POST /demo`.
#[derive(Deserialize, ToSchema)]
#[schema(example = json!({ "count": 300, "seed": 42 }))]
pub struct DemoRequest {
    pub count: usize,
    #[serde(default)]
    #[schema(nullable = true)]
    pub seed: Option<u64>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub mode: Option<PackingMode>,
}

/// Planning result.
///
/// Percentages are rounded to two decimals; all other figures are reported
/// as computed.
#[derive(Serialize, ToSchema)]
pub struct OptimizeResponse {
    pub containers: Vec<ContainerResponse>,
    pub omitted: Vec<OmittedResponse>,
    /// Containers dropped because of the container limit.
    pub truncated: usize,
    pub is_complete: bool,
    pub total_volume: f64,
    pub total_weight: f64,
    pub average_volume_utilization: f64,
    pub elapsed_ms: u64,
}

/// One filled container.
#[derive(Serialize, ToSchema)]
pub struct ContainerResponse {
    /// 1-based position in the manifest.
    pub id: usize,
    pub label: Option<String>,
    pub kind: String,
    /// Interior length, width, height in metres.
    #[schema(value_type = [f64; 3], example = json!([12.03, 2.35, 2.69]))]
    pub dims: (f64, f64, f64),
    pub volume_capacity: f64,
    pub weight_capacity: f64,
    pub used_volume: f64,
    pub used_weight: f64,
    pub volume_utilization: f64,
    pub weight_utilization: f64,
    pub categories: Vec<String>,
    pub items: Vec<StowedItemResponse>,
}

/// Item inside a container, in its final orientation.
#[derive(Serialize, ToSchema)]
pub struct StowedItemResponse {
    pub id: String,
    pub name: String,
    pub category: String,
    pub destination: String,
    pub volume: f64,
    pub weight: f64,
    /// Length, width, height after orientation.
    #[schema(value_type = [f64; 3], example = json!([1.6, 1.0, 1.5]))]
    pub dims: (f64, f64, f64),
    /// Lower front left corner (x, y, z); absent in volume-only mode.
    #[schema(value_type = Option<Vec<f64>>, example = json!([0.0, 0.0, 0.0]))]
    pub position: Option<(f64, f64, f64)>,
    pub rotated: bool,
}

/// Item that ended up in no container.
#[derive(Serialize, ToSchema)]
pub struct OmittedResponse {
    pub id: String,
    pub name: String,
    pub category: String,
    pub destination: String,
    pub volume: f64,
    pub weight: f64,
    pub reason_code: String,
    pub reason: String,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn validation_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        details,
    )
}

fn plan_error_response(err: PlanError) -> Response {
    match err {
        PlanError::NoItems | PlanError::InvalidItem { .. } => validation_error(err.to_string()),
        PlanError::InvalidProfile { .. } | PlanError::InvalidConfiguration(_) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid planner configuration",
            err.to_string(),
        ),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl From<&StowedItem> for StowedItemResponse {
    fn from(stowed: &StowedItem) -> Self {
        Self {
            id: stowed.item.id.clone(),
            name: stowed.item.name.clone(),
            category: stowed.item.category.clone(),
            destination: stowed.item.destination.clone(),
            volume: stowed.item.volume,
            weight: stowed.item.weight,
            dims: (stowed.length(), stowed.width(), stowed.height()),
            position: stowed.placement.map(|p| p.position.as_tuple()),
            rotated: stowed.is_rotated(),
        }
    }
}

impl From<OmittedItem> for OmittedResponse {
    fn from(entry: OmittedItem) -> Self {
        Self {
            reason_code: entry.reason.code().to_string(),
            reason: entry.reason.to_string(),
            id: entry.item.id,
            name: entry.item.name,
            category: entry.item.category,
            destination: entry.item.destination,
            volume: entry.item.volume,
            weight: entry.item.weight,
        }
    }
}

impl ContainerResponse {
    fn from_packed(id: usize, container: PackedContainer) -> Self {
        let categories = container
            .categories()
            .into_iter()
            .map(str::to_owned)
            .collect();
        Self {
            id,
            volume_utilization: round2(container.volume_utilization_pct()),
            weight_utilization: round2(container.weight_utilization_pct()),
            categories,
            items: container.items.iter().map(StowedItemResponse::from).collect(),
            label: container.label,
            kind: container.profile.kind.clone(),
            dims: (
                container.profile.length,
                container.profile.width,
                container.profile.height,
            ),
            volume_capacity: container.profile.volume_capacity,
            weight_capacity: container.profile.weight_capacity,
            used_volume: container.used_volume,
            used_weight: container.used_weight,
        }
    }
}

impl OptimizeResponse {
    /// Creates the response from a planning manifest.
    pub fn from_manifest(manifest: Manifest, elapsed_ms: u64) -> Self {
        let is_complete = manifest.is_complete();
        let total_volume = manifest.total_volume();
        let total_weight = manifest.total_weight();
        let average_volume_utilization = round2(manifest.average_volume_utilization());
        let Manifest {
            containers,
            omitted,
            truncated,
        } = manifest;

        Self {
            containers: containers
                .into_iter()
                .enumerate()
                .map(|(i, container)| ContainerResponse::from_packed(i + 1, container))
                .collect(),
            omitted: omitted.into_iter().map(OmittedResponse::from).collect(),
            truncated,
            is_complete,
            total_volume,
            total_weight,
            average_volume_utilization,
            elapsed_ms,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_optimize, handle_demo),
    components(
        schemas(
            OptimizeRequest,
            DemoRequest,
            OptimizeResponse,
            ContainerResponse,
            StowedItemResponse,
            OmittedResponse,
            ErrorResponse,
            Item,
            PackingMode
        )
    ),
    tags((name = "planning", description = "Endpoints for container stowage planning"))
)]
struct ApiDoc;

fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/optimize", post(handle_optimize))
        .route("/demo", post(handle_demo))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state)
}

/// Starts the API server and serves until it terminates.
pub async fn start_api_server(config: ApiConfig, engine: EngineConfig) -> std::io::Result<()> {
    let app = router(ApiState { engine });

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(
        "🚀 Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() {
        info!("💡 Local access: http://localhost:{}", config.port());
    }
    info!("📦 API Endpoints: POST /optimize, POST /demo");
    info!("📑 Documentation: GET /docs, GET /docs/openapi.json");

    axum::serve(listener, app).await
}

/// Runs the planner off the async runtime and converts the outcome.
async fn run_plan(
    state: &ApiState,
    items: Vec<Item>,
    mode: Option<PackingMode>,
    allow_rotations: Option<bool>,
) -> Response {
    let mut planning = state.engine.planning().clone();
    if let Some(mode) = mode {
        planning.mode = mode;
    }
    let mut placement = state.engine.placement();
    if let Some(allow_rotations) = allow_rotations {
        placement.allow_item_rotation = allow_rotations;
    }

    let started = Instant::now();
    let joined =
        tokio::task::spawn_blocking(move || plan_shipment(items, &planning, &placement)).await;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match joined {
        Ok(Ok(manifest)) => {
            info!(
                "📦 Result: {} containers, {} omitted items, {} ms",
                manifest.container_count(),
                manifest.omitted.len(),
                elapsed_ms
            );
            let response = OptimizeResponse::from_manifest(manifest, elapsed_ms);
            (StatusCode::OK, Json(response)).into_response()
        }
        Ok(Err(err)) => plan_error_response(err),
        Err(err) => {
            error!("❌ Planning task failed: {}", err);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Planning failed",
                err.to_string(),
            )
        }
    }
}

/// Handler for POST /optimize.
///
/// Groups the items by destination and compatibility, packs every group and
/// returns the labelled container manifest.
#[utoipa::path(
    post,
    path = "/optimize",
    request_body = OptimizeRequest,
    responses(
        (status = 200, description = "Shipment planned", body = OptimizeResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Empty or invalid item list",
            body = ErrorResponse
        )
    ),
    tag = "planning"
)]
async fn handle_optimize(
    State(state): State<ApiState>,
    payload: Result<Json<OptimizeRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    info!("📥 New optimize request: {} items", request.items.len());
    run_plan(&state, request.items, request.mode, request.allow_rotations).await
}

/// Handler for POST /demo.
///
/// Plans a synthetic shipment of `count` items.
#[utoipa::path(
    post,
    path = "/demo",
    request_body = DemoRequest,
    responses(
        (status = 200, description = "Synthetic shipment planned", body = OptimizeResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Item count out of range",
            body = ErrorResponse
        )
    ),
    tag = "planning"
)]
async fn handle_demo(
    State(state): State<ApiState>,
    payload: Result<Json<DemoRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };

    if request.count == 0 || request.count > MAX_DEMO_ITEMS {
        return validation_error(format!(
            "count must be between 1 and {}",
            MAX_DEMO_ITEMS
        ));
    }

    info!(
        "🔄 Demo request: {} synthetic items (seed {:?})",
        request.count, request.seed
    );
    let items = generate_items(request.count, request.seed, &DemoOptions::default());
    run_plan(&state, items, request.mode, None).await
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Body should be readable");
        serde_json::from_slice(&bytes).expect("Body should be JSON")
    }

    fn item_json(id: &str, category: &str) -> serde_json::Value {
        json!({
            "id": id,
            "category": category,
            "destination": "Rotterdam",
            "volume": 1.0,
            "weight": 100.0,
            "length": 1.0,
            "width": 1.0,
            "height": 1.0
        })
    }

    #[test]
    fn openapi_doc_lists_expected_paths() {
        let doc = openapi_doc();
        let paths = &doc.paths.paths;
        assert!(
            paths.contains_key("/optimize"),
            "OpenAPI documentation is missing the /optimize path"
        );
        assert!(
            paths.contains_key("/demo"),
            "OpenAPI documentation is missing the /demo path"
        );
    }

    #[test]
    fn openapi_doc_contains_key_schemas() {
        let doc = openapi_doc();
        let components = doc
            .components
            .as_ref()
            .expect("OpenAPI documentation contains no components");
        for name in ["OptimizeRequest", "OptimizeResponse", "ErrorResponse", "Item"] {
            assert!(
                components.schemas.contains_key(name),
                "Expected schema '{}' is missing from OpenAPI spec",
                name
            );
        }
    }

    #[test]
    fn optimize_request_mode_is_optional() {
        let with_mode: OptimizeRequest = serde_json::from_value(json!({
            "items": [item_json("a", "Dry_General")],
            "mode": "volume"
        }))
        .expect("Should parse valid JSON");
        assert_eq!(with_mode.mode, Some(PackingMode::Volume));
        assert_eq!(with_mode.items[0].name, "");

        let without_mode: OptimizeRequest =
            serde_json::from_value(json!({ "items": [] })).expect("Should parse valid JSON");
        assert_eq!(without_mode.mode, None);
        assert_eq!(without_mode.allow_rotations, None);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let parsed = serde_json::from_value::<OptimizeRequest>(json!({
            "items": [],
            "mode": "4d"
        }));
        assert!(parsed.is_err());
    }

    #[tokio::test]
    async fn empty_item_list_is_unprocessable() {
        let request = OptimizeRequest {
            items: Vec::new(),
            mode: None,
            allow_rotations: None,
        };
        let response = handle_optimize(State(ApiState::default()), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["details"], "no items to pack");
    }

    #[tokio::test]
    async fn negative_weight_is_unprocessable() {
        let mut bad = item_json("bad", "Dry_General");
        bad["weight"] = json!(-1.0);
        let request: OptimizeRequest =
            serde_json::from_value(json!({ "items": [bad] })).expect("Should parse valid JSON");

        let response = handle_optimize(State(ApiState::default()), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn optimize_returns_labelled_containers() {
        let request: OptimizeRequest = serde_json::from_value(json!({
            "items": [
                item_json("a", "Dry_General"),
                item_json("b", "Perishable_Refrigerated")
            ]
        }))
        .expect("Should parse valid JSON");

        let response = handle_optimize(State(ApiState::default()), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let containers = body["containers"].as_array().expect("containers array");
        assert_eq!(containers.len(), 2);
        assert_eq!(containers[0]["label"], "High Cube - Dry_General #1 -> Rotterdam");
        assert_eq!(containers[0]["items"][0]["position"], json!([0.0, 0.0, 0.0]));
        assert_eq!(containers[0]["items"][0]["destination"], "Rotterdam");
        assert_eq!(body["is_complete"], true);
        assert_eq!(body["truncated"], 0);
    }

    #[tokio::test]
    async fn volume_mode_omits_positions() {
        let request: OptimizeRequest = serde_json::from_value(json!({
            "items": [item_json("a", "Dry_General")],
            "mode": "volume"
        }))
        .expect("Should parse valid JSON");

        let response = handle_optimize(State(ApiState::default()), Ok(Json(request))).await;
        let body = body_json(response).await;
        assert!(body["containers"][0]["items"][0]["position"].is_null());
    }

    #[tokio::test]
    async fn demo_rejects_out_of_range_counts() {
        for count in [0, MAX_DEMO_ITEMS + 1] {
            let request = DemoRequest {
                count,
                seed: Some(1),
                mode: None,
            };
            let response = handle_demo(State(ApiState::default()), Ok(Json(request))).await;
            assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
    }

    #[tokio::test]
    async fn demo_plans_every_generated_item() {
        let request = DemoRequest {
            count: 40,
            seed: Some(3),
            mode: None,
        };
        let response = handle_demo(State(ApiState::default()), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let packed: usize = body["containers"]
            .as_array()
            .expect("containers array")
            .iter()
            .map(|c| c["items"].as_array().map_or(0, Vec::len))
            .sum();
        let omitted = body["omitted"].as_array().map_or(0, Vec::len);
        assert_eq!(packed + omitted, 40);
    }
}
