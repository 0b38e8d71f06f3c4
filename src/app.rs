use axum::{
    Form, Router,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use handlebars::Handlebars;
use serde::Deserialize;
use serde_json::json;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::keystroke::parse_keystrokes;
use crate::saving;
use crate::store::KeystrokeStore;

/// Message shown on the index page after a submission.
pub const SUCCESS_MESSAGE: &str = "Form submitted successfully!";

const INDEX_TEMPLATE: &str = "index";
const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub struct AppState {
    store: Mutex<KeystrokeStore>,
    pages: Handlebars<'static>,
}

impl AppState {
    pub fn new(store: KeystrokeStore) -> Result<Self> {
        let mut pages = Handlebars::new();
        pages.register_template_string(INDEX_TEMPLATE, include_str!("./static/index.html"))?;

        Ok(AppState {
            store: Mutex::new(store),
            pages,
        })
    }

    fn store(&self) -> Result<MutexGuard<'_, KeystrokeStore>> {
        self.store.lock().map_err(|_| Error::StorePoisoned)
    }
}

#[derive(Deserialize)]
struct IndexQuery {
    success_message: Option<String>,
}

/// Fields posted by the index page form.
///
/// A missing `username` or `email` is recorded as an empty string. Without
/// `keystrokes` there is nothing to record and the request fails.
#[derive(Debug, Deserialize)]
pub struct Submission {
    pub username: Option<String>,
    pub email: Option<String>,
    /// JSON array of `{key, action, time}` objects.
    pub keystrokes: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/submit", post(submit))
        .route("/download", get(download))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<()> {
    let store = KeystrokeStore::open(&config.storage.data_file)?;
    let app_state = Arc::new(AppState::new(store)?);
    let app = router(app_state);

    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Where a successful submission sends the browser.
pub fn success_location() -> String {
    format!(
        "/?success_message={}",
        urlencoding::encode(SUCCESS_MESSAGE)
    )
}

async fn serve_index(
    Query(params): Query<IndexQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>> {
    let page = state.pages.render(
        INDEX_TEMPLATE,
        &json!({ "success_message": params.success_message }),
    )?;
    Ok(Html(page))
}

async fn submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<Submission>,
) -> Result<Redirect> {
    let keystrokes = form.keystrokes.ok_or(Error::MissingField("keystrokes"))?;
    let events = parse_keystrokes(&keystrokes)?;
    let username = form.username.unwrap_or_default();
    let email = form.email.unwrap_or_default();

    blocking(move || {
        let mut store = state.store()?;
        store.submit(&username, &email, &events)?;
        Ok(())
    })
    .await?;

    Ok(Redirect::to(&success_location()))
}

async fn download(State(state): State<Arc<AppState>>) -> Result<Response> {
    let buffer = blocking(move || {
        let store = state.store()?;
        saving::to_xlsx(store.entries())
    })
    .await?;

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"keystrokes.xlsx\"",
            ),
        ],
        buffer,
    )
        .into_response())
}

// Store work holds a std mutex and touches the disk; keep it on the
// blocking pool.
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| Error::internal(format!("store task failed: {e}")))?
}

// Failures all look the same to the browser; the detail goes to the log.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        error!(error = %self, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_location_is_encoded() {
        assert_eq!(
            success_location(),
            "/?success_message=Form%20submitted%20successfully%21"
        );
    }

    #[test]
    fn test_index_renders_escaped_message() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeystrokeStore::open(dir.path().join("k.xlsx")).unwrap();
        let state = AppState::new(store).unwrap();

        let page = state
            .pages
            .render(INDEX_TEMPLATE, &json!({ "success_message": "<b>hi</b>" }))
            .unwrap();
        assert!(page.contains("&lt;b&gt;hi&lt;/b&gt;"));
        assert!(!page.contains("<b>hi</b>"));

        let page = state
            .pages
            .render(INDEX_TEMPLATE, &json!({ "success_message": null }))
            .unwrap();
        assert!(!page.contains("class=\"success\""));
    }

    #[tokio::test]
    async fn test_blocking_returns_work_result() {
        assert_eq!(blocking(|| Ok(7)).await.unwrap(), 7);
        let err = blocking::<(), _>(|| Err(Error::StorePoisoned)).await.unwrap_err();
        assert!(matches!(err, Error::StorePoisoned));
    }

    #[tokio::test]
    async fn test_blocking_panic_is_internal_error() {
        let err = blocking::<(), _>(|| panic!("boom")).await.unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }
}
