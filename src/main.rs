use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use selfpay_core::{
    Catalog, CheckoutSession, CoreConfig, SearchEngine, ServiceItem, WaiverRule, resolve_data_dir,
};

/// Date format used by the practice-management side (MM/DD/YYYY).
const SERVICE_DATE_FORMAT: &str = "%m/%d/%Y";

/// Application state shared across REST API handlers
///
/// Holds the read-only catalog, the search engine bound to the keyword map,
/// and the waiver-rule table, all resolved once at startup.
#[derive(Clone)]
struct AppState {
    catalog: Arc<Catalog>,
    engine: Arc<SearchEngine>,
    waivers: Arc<Vec<WaiverRule>>,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, list_services, search_services, create_quote),
    components(schemas(HealthRes, ListServicesRes, SearchRes, QuoteReq, QuoteRes, ServiceRes))
)]
struct ApiDoc;

#[derive(Serialize, ToSchema)]
struct HealthRes {
    status: String,
}

/// A catalog record as returned by the REST surface.
#[derive(Serialize, ToSchema)]
struct ServiceRes {
    id: u32,
    name: String,
    #[schema(value_type = String)]
    price: Decimal,
    billing_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    is_fee: bool,
}

impl From<&ServiceItem> for ServiceRes {
    fn from(item: &ServiceItem) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            price: item.price,
            billing_code: item.billing_code.clone(),
            category: item.category.clone(),
            is_fee: item.is_fee,
        }
    }
}

#[derive(Serialize, ToSchema)]
struct ListServicesRes {
    services: Vec<ServiceRes>,
}

#[derive(Serialize, ToSchema)]
struct SearchRes {
    services: Vec<ServiceRes>,
}

#[derive(Deserialize, IntoParams)]
struct SearchParams {
    /// Free-text query; empty returns the full catalog
    #[serde(default)]
    query: String,
}

#[derive(Deserialize, ToSchema)]
struct QuoteReq {
    /// Ids of the selected services
    service_ids: Vec<u32>,
    /// Service date as MM/DD/YYYY; defaults to today
    service_date: Option<String>,
}

#[derive(Serialize, ToSchema)]
struct QuoteRes {
    services: Vec<ServiceRes>,
    fees: Vec<ServiceRes>,
    #[schema(value_type = String)]
    subtotal: Decimal,
    #[schema(value_type = String)]
    fees_total: Decimal,
    #[schema(value_type = String)]
    total: Decimal,
    service_date: String,
    payment_description: String,
}

/// Main entry point for the self-pay checkout service
///
/// Starts the REST server that backs the front-desk checkout tool.
///
/// # Environment Variables
/// - `SELFPAY_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `SELFPAY_DATA_DIR`: Directory containing services.json and optional
///   keywords.json / waivers.json overrides (default: located by searching
///   for a data/ directory)
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("selfpay_core=info".parse()?)
                .add_directive("selfpay_run=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr =
        std::env::var("SELFPAY_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let data_dir = resolve_data_dir(std::env::var("SELFPAY_DATA_DIR").ok().map(Into::into))?;
    let config = CoreConfig::new(data_dir)?;
    let catalog = config.load_catalog()?;
    let keywords = config.load_keyword_map()?;
    let waivers = config.load_waiver_rules()?;

    tracing::info!("++ Loaded catalog with {} services", catalog.len());
    tracing::info!("++ Starting SelfPay REST on {}", rest_addr);

    let state = AppState {
        engine: Arc::new(SearchEngine::new(keywords)),
        catalog: Arc::new(catalog),
        waivers: Arc::new(waivers),
    };

    let app = Router::new()
        .route("/health", get(health))
        .route("/services", get(list_services))
        .route("/services/search", get(search_services))
        .route("/quote", post(create_quote))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        status: "ok".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/services",
    responses(
        (status = 200, description = "Full service catalog in catalog order", body = ListServicesRes)
    )
)]
/// List the full service catalog
///
/// Returns every catalog record, fee records included, in catalog order.
async fn list_services(State(state): State<AppState>) -> Json<ListServicesRes> {
    let services = state.catalog.items().iter().map(ServiceRes::from).collect();
    Json(ListServicesRes { services })
}

#[utoipa::path(
    get,
    path = "/services/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Services ranked by relevance", body = SearchRes)
    )
)]
/// Search the catalog
///
/// Expands the query through the keyword map and returns matching services in
/// descending relevance order. An empty query returns the full catalog.
async fn search_services(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchRes> {
    let services = state
        .engine
        .search(&params.query, &state.catalog)
        .into_iter()
        .map(ServiceRes::from)
        .collect();
    Json(SearchRes { services })
}

#[utoipa::path(
    post,
    path = "/quote",
    request_body = QuoteReq,
    responses(
        (status = 200, description = "Quote with auto-applied fees and totals", body = QuoteRes),
        (status = 400, description = "Unknown service id, fee id, or malformed service date")
    )
)]
/// Quote a selection of services
///
/// Builds a cart from the given service ids, auto-applies dependent fees, and
/// returns line items, totals, and a payment description for the downstream
/// payment glue. The cart itself stays with the caller; this endpoint is
/// stateless.
async fn create_quote(
    State(state): State<AppState>,
    Json(req): Json<QuoteReq>,
) -> Result<Json<QuoteRes>, (StatusCode, String)> {
    let service_date = match req.service_date {
        Some(raw) => {
            let raw = raw.trim().to_string();
            if NaiveDate::parse_from_str(&raw, SERVICE_DATE_FORMAT).is_err() {
                return Err((
                    StatusCode::BAD_REQUEST,
                    format!("service_date must be MM/DD/YYYY, got '{}'", raw),
                ));
            }
            raw
        }
        None => Local::now().format(SERVICE_DATE_FORMAT).to_string(),
    };

    let mut session = CheckoutSession::with_waivers(&state.catalog, (*state.waivers).clone());
    for id in &req.service_ids {
        let service = state
            .catalog
            .get(*id)
            .ok_or_else(|| (StatusCode::BAD_REQUEST, format!("unknown service id {}", id)))?;
        session.add_service(service).map_err(|e| {
            tracing::warn!("Quote rejected: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string())
        })?;
    }

    let payment_description = payment_description(&session);

    Ok(Json(QuoteRes {
        services: session.cart().items().iter().map(ServiceRes::from).collect(),
        fees: session.applied_fees().iter().map(ServiceRes::from).collect(),
        subtotal: session.subtotal(),
        fees_total: session.fees_total(),
        total: session.total(),
        service_date,
        payment_description,
    }))
}

/// Human-readable summary of the quote for the payment link / receipt.
fn payment_description(session: &CheckoutSession) -> String {
    let names: Vec<&str> = session
        .cart()
        .items()
        .iter()
        .map(|item| item.name.as_str())
        .collect();
    let mut description = format!("Self-pay services: {}", names.join(", "));
    let fee_count = session.applied_fees().len();
    if fee_count == 1 {
        description.push_str(" (plus 1 fee)");
    } else if fee_count > 1 {
        description.push_str(&format!(" (plus {} fees)", fee_count));
    }
    description
}
