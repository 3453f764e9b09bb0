use retry_request::{CancellationToken, Method, RequestClient, RequestOptions};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "retry_request=debug".into()))
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://jsonplaceholder.typicode.com/todos".to_owned());
    let client = RequestClient::from_env()?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    // Writes are only retried when idempotent_only is left unset.
    let options = RequestOptions::new(3).idempotent_only();
    let response = client
        .request_with_cancel(
            Method::POST,
            &url,
            Some(json!({ "title": "write once", "completed": false })),
            options,
            cancel,
        )
        .await?;

    println!("{} {}", response.status, response.body);

    Ok(())
}
