//! `!nhc` / `!noaa`

use tracing::{info, warn};

use crate::scraper::{self, PageFetcher, NHC_FALLBACK_URL};
use crate::state::BotState;

pub const UNAVAILABLE: &str = "Sorry, I couldn't find the NHC outlook right now.";

pub async fn run(state: &BotState, fetcher: &dyn PageFetcher) -> String {
    if state.settings().await.nhc_from_github {
        info!("Using nhc-cones mirror for the outlook image");
        return NHC_FALLBACK_URL.to_string();
    }

    match scraper::nhc_outlook(fetcher).await {
        Ok(url) => url,
        Err(e) => {
            warn!("NHC scrape failed: {}", e);
            UNAVAILABLE.to_string()
        }
    }
}
