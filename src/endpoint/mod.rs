//! Endpoint construction for the catalog site
//!
//! Builds the three request URLs the harvest needs from the `[source]`
//! configuration:
//! - listing: `base + listing-path ? listing-filter`
//! - custom card: `base + custom-card-path / id`
//! - overview: `base + detail-path / id / designation`

use crate::config::SourceConfig;
use crate::model::Entity;
use url::Url;

/// Resolved request URLs for the catalog site
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: String,
    listing: Url,
    detail_path: String,
    custom_card_path: String,
}

impl Endpoints {
    /// Builds endpoints from source configuration
    ///
    /// # Errors
    ///
    /// Returns a parse error if the base URL and listing path do not form a
    /// valid URL.
    pub fn new(config: &SourceConfig) -> Result<Self, url::ParseError> {
        let base = config.base_url.trim_end_matches('/').to_string();

        let mut listing = Url::parse(&format!("{}{}", base, config.listing_path))?;
        if !config.listing_filter.is_empty() {
            listing.set_query(Some(&config.listing_filter));
        }

        Ok(Self {
            base,
            listing,
            detail_path: config.detail_path.trim_end_matches('/').to_string(),
            custom_card_path: config.custom_card_path.trim_end_matches('/').to_string(),
        })
    }

    /// URL of the filtered listing page
    pub fn listing_url(&self) -> &Url {
        &self.listing
    }

    /// Path prefix that listing links to unit overviews start with
    pub fn detail_path(&self) -> &str {
        &self.detail_path
    }

    /// URL of a unit's custom card page
    pub fn custom_card_url(&self, entity: &Entity) -> Result<Url, url::ParseError> {
        Url::parse(&format!("{}{}/{}", self.base, self.custom_card_path, entity.id))
    }

    /// URL of a unit's overview page
    ///
    /// The designation is used exactly as it appeared in the listing link, so
    /// existing percent-escapes are preserved.
    pub fn overview_url(&self, entity: &Entity) -> Result<Url, url::ParseError> {
        Url::parse(&format!(
            "{}{}/{}/{}",
            self.base, self.detail_path, entity.id, entity.designation
        ))
    }
}
