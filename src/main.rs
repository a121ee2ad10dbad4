use anyhow::Context;
use dnevnik_scraper::{
    DnevnikScraper, LoadFromEnv, ScrapingContext, ServerConfig,
    routes::{AppState, app},
};
use dotenv::dotenv;
use tokio::net::TcpListener;

extern crate env_logger;
extern crate log;

use log::LevelFilter;

use log::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let server_config = ServerConfig::load_from_env()?;
    let scraping_context =
        ScrapingContext::new().context("failed to set up the portal scraper")?;
    info!(
        "scraping {} with a {:?} request timeout",
        scraping_context.scraping_config.feed_url, scraping_context.scraping_config.timeout
    );

    let app = app(AppState::new(DnevnikScraper::new(scraping_context)));

    let addr = format!("{}:{}", server_config.host, server_config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    info!("listening on {addr}");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
