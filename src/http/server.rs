use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::WaitForCancellationFutureOwned;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::BloxchaserError;
use crate::http::api::RouterBuilder;
use crate::http::state::AppState;

pub(crate) async fn build_http_api(
    state: AppState,
    http_port: u16,
) -> Result<HttpServer, BloxchaserError> {
    let router = RouterBuilder::with_default_routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // a public read-only API, browsers anywhere may call it directly
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let bind_addr = format!("0.0.0.0:{}", http_port);
    let listener =
        TcpListener::bind(&bind_addr)
            .await
            .map_err(|source| BloxchaserError::HttpBindFailure {
                address: bind_addr.clone(),
                source,
            })?;
    tracing::info!("http api listening on {bind_addr}");

    Ok(HttpServer { router, listener })
}

pub(crate) struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub(crate) async fn run(self, receiver: WaitForCancellationFutureOwned) -> std::io::Result<()> {
        axum::serve(self.listener, self.router.into_make_service())
            .with_graceful_shutdown(receiver)
            .await
    }
}
