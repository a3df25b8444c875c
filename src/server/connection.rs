//! Single-connection request handling.
//!
//! One call to [`handle_connection`] serves exactly one request:
//! set the deadline, read and parse the headers, read the body if one was
//! declared, route, run the handler, write the response and shut the socket
//! down. Every read and write is bounded by the connection deadline. The
//! socket is shut down on every path, including failures.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{timeout_at, Instant};

use crate::parser::{parse_request, HttpRequest, HEADER_BUFFER_SIZE};
use crate::server::config::ServerConfig;
use crate::server::context::Context;
use crate::server::error::{Error, TransferError};
use crate::server::handler::{ErrorHandlerFn, HandlerFn};
use crate::server::response::{HttpResponse, StatusCode};
use crate::server::router::Router;
use crate::server::transfer::read_body;

/// Serve one request on `socket` and shut it down.
///
/// A response is written for every failure after the deadline is set; the
/// returned error only says why the exchange did not complete normally.
///
/// # Errors
///
/// - [`Error::MissingErrorHandler`] if `router` has no error handler; nothing
///   is read or written
/// - [`Error::InvalidDeadline`] if the request timeout cannot be represented
/// - header read, parse, body transfer and response write failures
pub async fn handle_connection<S>(socket: &mut S, router: &Router, config: &ServerConfig) -> Result<(), Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let result = serve_request(socket, router, config).await;

    if let Err(e) = socket.shutdown().await {
        debug!("Error shutting down connection: {e}");
    }

    result
}

async fn serve_request<S>(socket: &mut S, router: &Router, config: &ServerConfig) -> Result<(), Error>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let error_handler = router.error_handler().ok_or(Error::MissingErrorHandler)?.clone();
    let mut ctx = Context::new(Default::default());

    let Some(deadline) = Instant::now().checked_add(config.request_timeout()) else {
        error!("Error setting request timeout of {}s", config.request_timeout_secs);
        return Err(Error::InvalidDeadline(config.request_timeout_secs));
    };

    // Headers must arrive in a single read
    let mut buf = vec![0; HEADER_BUFFER_SIZE];
    let n = match timeout_at(deadline, socket.read(&mut buf)).await {
        Ok(Ok(n)) => n,
        Ok(Err(e)) => {
            error!("Error reading connection: {e}");
            let _ = respond_with_status(socket, &mut ctx, StatusCode::BadRequest, deadline, config).await;
            return Err(e.into());
        }
        Err(_) => {
            error!("Timed out reading request headers");
            let _ = respond_with_status(socket, &mut ctx, StatusCode::BadRequest, deadline, config).await;
            return Err(Error::Timeout("reading request headers"));
        }
    };

    ctx.req = match parse_request(&buf[..n]) {
        Ok(request) => request,
        Err(e) => {
            warn!("Error parsing request: {e}");
            let _ = respond_with_status(socket, &mut ctx, StatusCode::BadRequest, deadline, config).await;
            return Err(e.into());
        }
    };

    match ctx.req.content_length.filter(|&len| len > 0) {
        Some(length) => {
            let prefix = ctx.req.body.take().unwrap_or_default();
            let body = match timeout_at(deadline, read_body(socket, prefix, length, config)).await {
                Ok(body) => body,
                Err(_) => Err(TransferError::ReadTimeout),
            };

            match body {
                Ok(body) => ctx.req.body = Some(body),
                Err(e) => {
                    error!("{e}");
                    let _ = respond_with_status(socket, &mut ctx, e.status_code(), deadline, config).await;
                    return Err(e.into());
                }
            }
        }
        // Without a declared length, bytes after the headers are not a body
        None => ctx.req.body = None,
    }

    let handler = match router.resolve(&ctx.req.method, ctx.req.route_path()) {
        Some(matched) => {
            ctx.set_params(matched.params);
            HandlerFn::clone(&matched.route.handler)
        }
        None => match router.not_found_handler() {
            Some(not_found) => HandlerFn::clone(not_found),
            None => {
                debug!("No route for {} {}", ctx.req.method, ctx.req.path);
                ctx.res = HttpResponse::new(StatusCode::NotFound);
                return respond(socket, &ctx, deadline, config).await;
            }
        },
    };

    // The context is gone if the handler task itself fails
    let request_line = HttpRequest::new(ctx.req.method.clone(), ctx.req.path.clone(), ctx.req.version.clone());
    let ctx = match dispatch(ctx, handler, error_handler).await {
        Ok(ctx) => ctx,
        Err(e) => {
            error!("{e}");
            let mut ctx = Context::new(request_line);
            let _ = respond_with_status(socket, &mut ctx, StatusCode::InternalServerError, deadline, config).await;
            return Err(e);
        }
    };

    respond(socket, &ctx, deadline, config).await
}

/// Run `handler`, and the error handler if it fails.
///
/// Fails only when a handler task cannot be joined; the context is lost then.
async fn dispatch(ctx: Context, handler: HandlerFn, error_handler: ErrorHandlerFn) -> Result<Context, Error> {
    let (ctx, result) = invoke(ctx, move |ctx| handler(ctx)).await?;
    let Err(err) = result else {
        return Ok(ctx);
    };

    warn!("Handler for {} {} failed: {err}", ctx.req.method, ctx.req.path);
    let (ctx, result) = invoke(ctx, move |ctx| error_handler(ctx, err)).await?;
    if let Err(e) = result {
        error!("Error handler failed: {e}");
    }
    Ok(ctx)
}

/// Run a handler on the blocking pool. A panic becomes [`Error::Handler`].
async fn invoke<F>(mut ctx: Context, f: F) -> Result<(Context, Result<(), Error>), Error>
where
    F: FnOnce(&mut Context) -> Result<(), Error> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let result = catch_unwind(AssertUnwindSafe(|| f(&mut ctx)))
            .unwrap_or_else(|panic| Err(Error::Handler(panic_message(&*panic))));
        (ctx, result)
    })
    .await
    .map_err(|e| Error::Handler(format!("handler task failed: {e}")))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        format!("handler panicked: {msg}")
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        format!("handler panicked: {msg}")
    } else {
        "handler panicked".to_string()
    }
}

async fn respond_with_status<S>(
    socket: &mut S,
    ctx: &mut Context,
    status: StatusCode,
    deadline: Instant,
    config: &ServerConfig,
) -> Result<(), Error>
where
    S: AsyncWrite + Unpin,
{
    ctx.res = HttpResponse::new(status);
    respond(socket, ctx, deadline, config).await
}

/// Serialize `ctx.res` and write it before `deadline`.
///
/// A status outside the supported table is replaced by a bare 500.
async fn respond<S>(socket: &mut S, ctx: &Context, deadline: Instant, config: &ServerConfig) -> Result<(), Error>
where
    S: AsyncWrite + Unpin,
{
    let (status, bytes) = match ctx.res.to_bytes() {
        Ok(bytes) => (ctx.res.status, bytes),
        Err(e) => {
            error!("{e}");
            let fallback = HttpResponse::new(StatusCode::InternalServerError);
            (fallback.status, fallback.to_bytes()?)
        }
    };

    if config.logging {
        info!(
            "{status} - {ms}ms | {method} {path}",
            ms = ctx.elapsed().as_millis(),
            method = ctx.req.method,
            path = ctx.req.path,
        );
    }

    let write = async {
        socket.write_all(&bytes).await?;
        socket.flush().await
    };
    match timeout_at(deadline, write).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            error!("Error writing response: {e}");
            Err(e.into())
        }
        Err(_) => {
            error!("Timed out writing response");
            Err(Error::Timeout("writing the response"))
        }
    }
}
