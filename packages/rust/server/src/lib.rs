//! HTTP front end for quickdoc.
//!
//! `GET /` serves the search page, `GET /doc/{query}` classifies the query
//! and streams the external renderer's output back as plain text. Render
//! failures never change the status code: the body carries whatever the tool
//! printed followed by an `ERROR` marker.

mod page;

use std::future::Future;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{OriginalUri, State},
    http::header,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use quickdoc_index::PackageIndex;
use quickdoc_render::{Classifier, ERROR_MARKER, LookupPlan, RenderCommands, RenderRequest, USAGE};
use quickdoc_shared::{QuickdocError, Result};
use percent_encoding::percent_decode_str;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, instrument, warn};

pub use page::INDEX_HTML;

/// Buffer between a running renderer and the response body.
const PIPE_CAPACITY: usize = 64 * 1024;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

const DOC_PREFIX: &str = "/doc/";

/// Everything a request handler needs, built once at startup.
pub struct ServerContext {
    pub index: PackageIndex,
    pub classifier: Classifier,
    pub commands: RenderCommands,
}

impl ServerContext {
    pub fn new(index: PackageIndex, commands: RenderCommands) -> Self {
        Self {
            index,
            classifier: Classifier::new(),
            commands,
        }
    }
}

type SharedContext = Arc<ServerContext>;

/// Build the application router.
pub fn router(ctx: SharedContext) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/doc", get(handle_usage))
        .route("/doc/", get(handle_usage))
        .route("/doc/*query", get(handle_doc))
        .with_state(ctx)
}

/// Bind `addr` and serve until `shutdown` resolves.
pub async fn serve<F>(addr: &str, ctx: ServerContext, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| QuickdocError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    let local = listener.local_addr().map_err(QuickdocError::Serve)?;
    info!(packages = ctx.index.len(), "listening on http://{local}");

    axum::serve(listener, router(Arc::new(ctx)))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(QuickdocError::Serve)?;

    info!("server stopped");
    Ok(())
}

async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn handle_usage() -> Response {
    text_response(Body::from(USAGE))
}

#[instrument(skip(ctx))]
async fn handle_doc(State(ctx): State<SharedContext>, OriginalUri(uri): OriginalUri) -> Response {
    let query = doc_query(uri.path());
    match ctx.classifier.plan(&ctx.index, &query) {
        LookupPlan::Usage => text_response(Body::from(USAGE)),
        LookupPlan::Render(request) => {
            debug!(strategy = %request.strategy(), "dispatching render");
            text_response(stream_render(ctx, query, request))
        }
    }
}

/// Everything after `/doc/`, percent-decoded. Bytes that are not UTF-8
/// become U+FFFD so that every path still reaches a renderer.
fn doc_query(path: &str) -> String {
    let raw = path.strip_prefix(DOC_PREFIX).unwrap_or_default();
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

/// Run the renderer on its own task and hand its output to the body as it
/// arrives.
fn stream_render(ctx: SharedContext, query: String, request: RenderRequest) -> Body {
    let (mut writer, reader) = tokio::io::duplex(PIPE_CAPACITY);

    tokio::spawn(async move {
        if let Err(e) = quickdoc_render::render(&request, &ctx.commands, &mut writer).await {
            warn!(query = %query, strategy = %request.strategy(), error = %e, "could not render documentation");
            if let Err(e) = writer.write_all(ERROR_MARKER.as_bytes()).await {
                debug!(error = %e, "client went away before the error marker");
            }
        }
    });

    Body::from_stream(ReaderStream::new(reader))
}

fn text_response(body: Body) -> Response {
    ([(header::CONTENT_TYPE, TEXT_PLAIN)], body).into_response()
}
