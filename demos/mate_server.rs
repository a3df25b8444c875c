//! Reference application for the mate-rs server API.
//!
//! Run with `RUST_LOG=info cargo run --example mate_server`, then:
//!
//! ```text
//! curl http://127.0.0.1:3000/
//! curl http://127.0.0.1:3000/greet/ana?punctuation=!
//! curl -X POST -d '{"name":"ana"}' http://127.0.0.1:3000/echo
//! ```

use mate_rs::{HttpServer, PartialConfig, ServerConfig, ServerError};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct Greeting {
    name: String,
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from(PartialConfig {
        logging_enabled: Some(true),
        ..Default::default()
    });

    let mut server = HttpServer::new(config);

    server
        .get("/", |ctx| ctx.send_string("Test String"))?
        .get("/greet/:name", |ctx| {
            let name = ctx.param("name")?.to_string();
            let punctuation = ctx
                .req
                .get_query_param("punctuation")
                .cloned()
                .unwrap_or_else(|| ".".to_string());
            ctx.send_string(format!("Hello, {name}{punctuation}"))
        })?
        .post("/echo", |ctx| {
            let greeting: Greeting = ctx.parse_body()?;
            ctx.status(201).json(&json!({ "hello": greeting.name }))
        })?
        .delete("/items/:id", |ctx| {
            let id: u64 = ctx
                .param("id")?
                .parse()
                .map_err(|_| ServerError::Handler("item id must be a number".to_string()))?;
            ctx.status(204).send_string(String::new())?;
            log::info!("Deleted item {id}");
            Ok(())
        })?;

    server.set_not_found(|ctx| ctx.status(404).html("<h1>Not Found</h1>"));
    server.set_error(|ctx, _err| ctx.status(500).json(&json!({ "success": false })));

    server.listen("127.0.0.1:3000").await
}
