use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::State, response::Html, routing::get, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::ReportError;

async fn chart_page(State(html): State<Arc<String>>) -> Html<String> {
    Html(html.as_str().to_owned())
}

/// Router serving the rendered chart at `/`
pub fn chart_router(html: String) -> Router {
    Router::new()
        .route("/", get(chart_page))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(html))
}

/// Serve on an already bound listener until `shutdown` resolves
pub async fn serve_listener<F>(listener: TcpListener, html: String, shutdown: F) -> Result<(), ReportError>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, chart_router(html))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Serve the chart on localhost until `shutdown` resolves
pub async fn serve_chart<F>(html: String, port: u16, shutdown: F) -> Result<(), ReportError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ReportError::Server(format!("cannot bind {}: {}", addr, e)))?;

    info!("Chart available at http://localhost:{}", port);
    info!("Press Ctrl+C to stop the chart server");

    serve_listener(listener, html, shutdown).await?;
    info!("Chart server stopped");
    Ok(())
}
