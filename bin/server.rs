// Labor & Social Protection Dashboard - Web Server
// JSON API over the same render cycle the TUI uses

use anyhow::Context;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use labor_dashboard::selection::parse_selection;
use labor_dashboard::{
    logging, CleanedTable, DashboardConfig, Section, Selection, SelectionError, Session, ViewModel,
    VERSION,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Shared application state. The session is read-only, so no lock.
#[derive(Clone)]
struct AppState {
    session: Arc<Session>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
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

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let body = ApiResponse {
        success: false,
        data: (),
        error: Some(message.into()),
    };
    (status, Json(body)).into_response()
}

/// Section with its indicator choices, as the selectors show them.
#[derive(Serialize)]
struct SectionResponse {
    slug: &'static str,
    title: &'static str,
    indicators: Vec<IndicatorResponse>,
}

#[derive(Serialize)]
struct IndicatorResponse {
    slug: &'static str,
    name: &'static str,
    description: &'static str,
}

impl From<Section> for SectionResponse {
    fn from(section: Section) -> Self {
        Self {
            slug: section.slug(),
            title: section.title(),
            indicators: section
                .indicator_options()
                .into_iter()
                .map(|i| IndicatorResponse {
                    slug: i.slug(),
                    name: i.name(),
                    description: i.description(),
                })
                .collect(),
        }
    }
}

/// Query string for `/api/view` and `/api/export`. Sections, indicators and
/// chart kinds accept slugs or display names.
#[derive(Debug, Default, Deserialize)]
struct ViewQuery {
    section: Option<String>,
    indicator: Option<String>,
    chart: Option<String>,
    from: Option<i32>,
    to: Option<i32>,
}

impl ViewQuery {
    fn selection(&self) -> Result<Selection, SelectionError> {
        parse_selection(
            self.section.as_deref(),
            self.indicator.as_deref(),
            self.chart.as_deref(),
            self.from,
            self.to,
        )
    }
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/sections - Sections and their indicators
async fn get_sections() -> impl IntoResponse {
    let sections: Vec<SectionResponse> = Section::ALL.into_iter().map(SectionResponse::from).collect();
    Json(ApiResponse::ok(sections))
}

/// GET /api/view - One render cycle for the given selection
async fn get_view(State(state): State<AppState>, Query(query): Query<ViewQuery>) -> Response {
    match query.selection() {
        Ok(selection) => {
            let view = state.session.render(&selection);
            (StatusCode::OK, Json(ApiResponse::ok(view))).into_response()
        }
        Err(e) => {
            warn!(error = %e, ?query, "rejected selection");
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
    }
}

/// GET /api/export - CSV download of the rows the detail view shows
async fn get_export(State(state): State<AppState>, Query(query): Query<ViewQuery>) -> Response {
    let selection = match query.selection() {
        Ok(selection) => selection,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let detail = match state.session.render(&selection) {
        ViewModel::Detail(detail) => detail,
        ViewModel::NoData(no_data) => return error_response(StatusCode::NOT_FOUND, no_data.message),
        ViewModel::Overview(_) => {
            return error_response(StatusCode::BAD_REQUEST, "Select an indicator to export its rows")
        }
    };

    match detail.export() {
        Ok(file) => {
            info!(filename = %file.filename, rows = detail.rows.len(), "export served");
            let headers = [
                (header::CONTENT_TYPE, format!("{}; charset=utf-8", file.mime)),
                (header::CONTENT_DISPOSITION, content_disposition(&file.filename)),
            ];
            (StatusCode::OK, headers, file.bytes).into_response()
        }
        Err(e) => {
            warn!(error = %e, "export failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Attachment header with an ASCII fallback name plus the exact UTF-8 one.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| if c.is_ascii() && c != '"' && c != '\\' { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/sections", get(get_sections))
        .route("/view", get(get_view))
        .route("/export", get(get_export))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging(None);

    println!("🌐 Labor & Social Protection Dashboard v{} - Web Server", VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = DashboardConfig::load()?;
    let path = &config.cleaned_output;

    if !path.exists() {
        eprintln!("❌ Cleaned table not found at {}", path.display());
        eprintln!("   Run: labor-dashboard clean");
        eprintln!("   to build it from the raw export first.");
        std::process::exit(1);
    }

    let table = CleanedTable::load(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    println!("✓ Loaded {} observations from {}", table.len(), path.display());

    let state = AppState {
        session: Arc::new(Session::new(table, config.render_options())),
    };

    let addr = config.server_addr.as_str();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   API: http://{}/api/view?indicator=unemployment-total", addr);
    println!("\n   Press Ctrl+C to stop\n");
    info!(addr, "server listening");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use labor_dashboard::{CleanedRecord, Indicator, RenderOptions};

    fn state() -> AppState {
        let records = (2015..=2020)
            .map(|year| CleanedRecord::new(Indicator::CoverageUrban.name(), year, Some(40.0 + (year - 2015) as f64)))
            .collect();
        let session = Session::new(CleanedTable::from_records(records), RenderOptions::default());
        AppState {
            session: Arc::new(session),
        }
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_view_detail() {
        let query = ViewQuery {
            indicator: Some("coverage-urban".to_string()),
            from: Some(2017),
            ..ViewQuery::default()
        };
        let response = get_view(State(state()), Query(query)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["mode"], "detail");
        assert_eq!(json["data"]["rows"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_view_rejects_bad_selection() {
        let query = ViewQuery {
            section: Some("employment-by-sector".to_string()),
            indicator: Some("coverage-urban".to_string()),
            ..ViewQuery::default()
        };
        let response = get_view(State(state()), Query(query)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("does not belong"));
    }

    #[tokio::test]
    async fn test_export_headers_and_missing_data() {
        let query = ViewQuery {
            indicator: Some("coverage-urban".to_string()),
            ..ViewQuery::default()
        };
        let response = get_export(State(state()), Query(query)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
        assert!(disposition.contains("Coverage_(%)_-All_Social_Protection_and_Labor_-urban_SriLanka.csv"));
        assert!(disposition.contains("filename*=UTF-8''"));

        let query = ViewQuery {
            indicator: Some("gini-reduction".to_string()),
            ..ViewQuery::default()
        };
        let response = get_export(State(state()), Query(query)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_years_outside_data() {
        let query = ViewQuery {
            indicator: Some("coverage-urban".to_string()),
            from: Some(1990),
            to: Some(1995),
            ..ViewQuery::default()
        };
        let response = get_view(State(state()), Query(query)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["mode"], "no-data");
        assert_eq!(json["data"]["requested"]["start"], 1990);

        let query = ViewQuery {
            indicator: Some("coverage-urban".to_string()),
            from: Some(1990),
            to: Some(1995),
            ..ViewQuery::default()
        };
        let response = get_export(State(state()), Query(query)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_sections_listing() {
        let response = get_sections().await.into_response();
        let json = body_json(response).await;
        assert_eq!(json["data"].as_array().unwrap().len(), 4);
        assert_eq!(json["data"][1]["indicators"].as_array().unwrap().len(), 3);
    }
}
