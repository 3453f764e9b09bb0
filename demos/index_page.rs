use retry_request::{page::IndexPage, RequestClient};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "retry_request=debug".into()))
        .init();

    let client = RequestClient::from_env()?;
    let mut page = match std::env::args().nth(1) {
        Some(url) => IndexPage::with_url(url),
        None => IndexPage::new(),
    };

    page.mount(&client).await;
    println!("{}", page.render());

    Ok(())
}
