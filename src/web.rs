use crate::{
    config::Config,
    posts::{BackendMemory, Post, PostStore},
    search::{
        self, AutocompleteItem, FilterInfo, PostSearch, SearchError, StructuredQuery, TagId,
    },
};
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::signal;

pub(crate) struct SharedState {
    pub store: Arc<dyn PostStore>,
    pub config: Config,
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            log::error!("failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(err) => {
                log::error!("failed to install signal handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::warn!("shutting down");
}

pub(crate) fn router(state: Arc<SharedState>) -> Router {
    Router::new()
        .route("/api/posts/search", post(search))
        .route("/api/posts/search_form", post(search_form))
        .route("/api/posts/autocomplete", get(autocomplete))
        .route("/api/search/filters", get(filters))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(
                    tower_http::trace::DefaultMakeSpan::new().level(tracing::Level::INFO),
                )
                .on_response(
                    tower_http::trace::DefaultOnResponse::new().level(tracing::Level::INFO),
                ),
        )
        .with_state(state)
}

async fn start_app(config: Config, store: BackendMemory) -> anyhow::Result<()> {
    let listen_addr = config.listen_addr.clone();
    let shared_state = Arc::new(SharedState {
        store: Arc::new(store),
        config,
    });

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    log::info!("listening on {listen_addr}");
    axum::serve(listener, router(shared_state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

pub fn start_daemon(config: Config, store: BackendMemory) -> anyhow::Result<()> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(start_app(config, store))
}

#[derive(Debug)]
pub(crate) struct HttpError(pub SearchError);

impl IntoResponse for HttpError {
    fn into_response(self) -> axum::response::Response {
        let body = json!({"error": self.0.to_string(), "kind": self.0.kind()});
        match self.0 {
            SearchError::Store(_) => {
                log::error!("{:?}", self.0);
                (axum::http::StatusCode::INTERNAL_SERVER_ERROR, Json(body))
            }
            _ => (axum::http::StatusCode::BAD_REQUEST, Json(body)),
        }
        .into_response()
    }
}

impl<E> From<E> for HttpError
where
    E: Into<SearchError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: String,

    /// Added to the configured filter tags.
    #[serde(default)]
    pub exclude_tags: Vec<TagId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AutocompleteRequest {
    #[serde(default)]
    pub q: String,

    /// Completes this instead of the last fragment of `q`.
    pub partial: Option<String>,

    /// Defaults to the configured `show_filters`.
    pub filters: Option<bool>,
}

impl SharedState {
    pub(crate) fn search_posts(&self, request: &SearchRequest) -> Result<Vec<Post>, SearchError> {
        let excluded = self
            .config
            .filter_tags
            .iter()
            .chain(&request.exclude_tags)
            .copied();
        PostSearch::parse(&request.query)?
            .with_exclude_tags(excluded)
            .get_posts(self.store.as_ref())
    }

    pub(crate) fn search_form_posts(
        &self,
        pairs: &[(String, String)],
    ) -> Result<Vec<Post>, SearchError> {
        let query = StructuredQuery::from_pairs(pairs.iter().map(|(k, v)| (k, v)));
        PostSearch::from_structured(&query)?
            .with_exclude_tags(self.config.filter_tags.iter().copied())
            .get_posts(self.store.as_ref())
    }

    pub(crate) fn autocomplete(
        &self,
        request: &AutocompleteRequest,
    ) -> Result<Vec<AutocompleteItem>, SearchError> {
        let search = PostSearch::parse(&request.q)?
            .with_exclude_tags(self.config.filter_tags.iter().copied())
            .with_limits(self.config.suggestion_limits());
        let show_filters = request.filters.unwrap_or(self.config.show_filters);

        let items = search
            .autocomplete(
                self.store.as_ref(),
                request.partial.as_deref(),
                None,
                show_filters,
            )?
            .collect();
        Ok(items)
    }
}

async fn search(
    State(state): State<Arc<SharedState>>,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<Vec<Post>>, HttpError> {
    log::debug!("payload: {payload:?}");

    tokio::task::block_in_place(move || {
        state
            .search_posts(&payload)
            .map(Into::into)
            .map_err(Into::into)
    })
}

async fn search_form(
    State(state): State<Arc<SharedState>>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Json<Vec<Post>>, HttpError> {
    log::debug!("form: {pairs:?}");

    tokio::task::block_in_place(move || {
        state
            .search_form_posts(&pairs)
            .map(Into::into)
            .map_err(Into::into)
    })
}

async fn autocomplete(
    State(state): State<Arc<SharedState>>,
    Query(request): Query<AutocompleteRequest>,
) -> Result<Json<Vec<AutocompleteItem>>, HttpError> {
    tokio::task::block_in_place(move || {
        state
            .autocomplete(&request)
            .map(Into::into)
            .map_err(Into::into)
    })
}

async fn filters() -> Json<Vec<FilterInfo>> {
    Json(search::filter_infos())
}
