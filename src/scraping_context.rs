use crate::{
    config::ScrapingConfig, requests::RequestClient, state_extractor::StateExtractor,
    timetable::PrintLinkFinder,
};

/// Everything a scraping operation needs, built once and shared read-only.
pub struct ScrapingContext {
    pub scraping_config: ScrapingConfig,
    pub state_extractor: StateExtractor,
    pub print_link_finder: PrintLinkFinder,
    pub request_client: RequestClient,
}

impl ScrapingContext {
    pub fn new() -> anyhow::Result<Self> {
        let scraping_config = ScrapingConfig::new()?;
        Self::from_config(scraping_config)
    }

    pub fn from_config(scraping_config: ScrapingConfig) -> anyhow::Result<Self> {
        let state_extractor = StateExtractor::new()?;
        let print_link_finder = PrintLinkFinder::new()?;
        let request_client = RequestClient::new(scraping_config.timeout)?;
        Ok(ScrapingContext {
            scraping_config,
            state_extractor,
            print_link_finder,
            request_client,
        })
    }

    /// Log target every operation run with this context writes to.
    pub fn log_target(&self) -> &str {
        &self.scraping_config.log_target
    }
}
