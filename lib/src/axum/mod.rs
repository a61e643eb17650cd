pub mod ai;
pub mod error;
pub mod image;
pub mod memory;

use std::future::Future;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Serialize;

use crate::store::{Outcome, Reason};
use crate::{App, Config, Gallery, ImageStore, Result, Studio};

pub type Router = axum::Router;

pub type ConfigExt = Extension<Arc<Config>>;
pub type StoreExt = Extension<ImageStore>;
pub type GalleryExt = Extension<Gallery>;
pub type StudioExt = Extension<Studio>;

/// Builds the application router with all routes and the shared state
/// extensions registered.
pub fn router(app: &App) -> Router {
    let mut router = Router::new()
        .merge(image::router())
        .merge(memory::router())
        .merge(ai::router());

    if app.config.assets.serve {
        router = router.nest_service(
            "/assets",
            tower_http::services::ServeDir::new(&app.config.assets.path),
        );
    }

    router
        .layer(Extension(app.config.clone()))
        .layer(Extension(app.store.clone()))
        .layer(Extension(app.gallery.clone()))
        .layer(Extension(app.studio.clone()))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Initializes application state and serves it until ctrl-c.
pub async fn start(config: Config) -> Result<()> {
    start_with(config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed listening for ctrl-c: {e}");
            std::future::pending::<()>().await;
        }
    })
    .await
}

/// Same as `start` but stops serving once `shutdown` resolves.
pub async fn start_with(
    config: Config,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    crate::tracing::init(&config).unwrap_or_else(|e| {
        log::warn!("failed to initialize tracing (perhaps it was already initialized?): {e}")
    });

    let app = App::new(config)?;
    if !app.connections.is_configured() {
        tracing::warn!("no database configured, gallery and memory images are disabled");
    }

    let addr = app.config.address;
    let router = router(&app);

    tracing::info!("starting server at {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    app.shutdown().await;
    tracing::info!("server stopped");
    Ok(())
}

#[derive(Serialize)]
struct UnavailableBody<'a> {
    error: String,
    reason: &'a Reason,
}

fn reason_status(reason: &Reason) -> StatusCode {
    match reason {
        Reason::BadInput(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Store outcomes map onto `200`, `404` and `503` (or `400` for rejected
/// input).
impl<T: Serialize> IntoResponse for Outcome<T> {
    fn into_response(self) -> Response {
        match self {
            Outcome::Value(value) => Json(value).into_response(),
            Outcome::NotFound => StatusCode::NOT_FOUND.into_response(),
            Outcome::Unavailable(reason) => (
                reason_status(&reason),
                Json(UnavailableBody {
                    error: reason.message(),
                    reason: &reason,
                }),
            )
                .into_response(),
        }
    }
}
