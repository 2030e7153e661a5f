//! Listing discovery
//!
//! The listing page links every unit as `"<detail-path>/<id>/<designation>"`.
//! Discovery fetches the page once, pulls those pairs out in document order,
//! and drops ids that are duplicated or already in the results log.

use crate::checkpoint::{reconcile_pending, Reconciled};
use crate::endpoint::Endpoints;
use crate::harvest::fetcher::Fetcher;
use crate::model::PendingEntry;
use crate::HarvestError;
use regex::Regex;
use std::collections::HashSet;

/// Extracts unit links from a listing document
#[derive(Debug, Clone)]
pub struct Discoverer {
    pattern: Regex,
}

impl Discoverer {
    /// Builds a discoverer for links under `detail_path`
    ///
    /// # Example
    ///
    /// ```
    /// use unit_harvest::harvest::Discoverer;
    ///
    /// let discoverer = Discoverer::new("/Unit/Details").unwrap();
    /// let links = discoverer.extract_links(r#"<a href="/Unit/Details/140/Atlas-AS7-D">Atlas</a>"#);
    /// assert_eq!(links[0].id, "140");
    /// assert_eq!(links[0].designation, "Atlas-AS7-D");
    /// ```
    pub fn new(detail_path: &str) -> Result<Self, regex::Error> {
        let pattern = format!(r#""{}/(\d+)/([^"]*)""#, regex::escape(detail_path));
        Ok(Self {
            pattern: Regex::new(&pattern)?,
        })
    }

    /// Uses a caller-supplied pattern; group 1 is the id, group 2 the designation
    pub fn with_pattern(pattern: Regex) -> Self {
        Self { pattern }
    }

    /// Returns every link in document order, duplicates included
    pub fn extract_links(&self, listing: &str) -> Vec<PendingEntry> {
        self.pattern
            .captures_iter(listing)
            .filter_map(|caps| {
                let id = caps.get(1)?.as_str();
                let designation = caps.get(2)?.as_str();
                Some(PendingEntry {
                    id: id.to_string(),
                    designation: designation.to_string(),
                })
            })
            .collect()
    }

    /// Extracts links and removes duplicates and completed ids
    pub fn discover(&self, listing: &str, completed: &HashSet<String>) -> Reconciled {
        let links = self.extract_links(listing);
        let found = links.len();
        let reconciled = reconcile_pending(links, completed);

        tracing::info!(
            "Listing yielded {} links: {} pending, {} already completed, {} duplicates",
            found,
            reconciled.pending.len(),
            reconciled.already_completed,
            reconciled.duplicates
        );

        reconciled
    }
}

/// Fetches the listing page and discovers pending units
///
/// # Errors
///
/// Any failure here is fatal to the run: there is no partial discovery.
pub async fn discover(
    fetcher: &Fetcher,
    endpoints: &Endpoints,
    completed: &HashSet<String>,
) -> Result<Reconciled, HarvestError> {
    let discoverer = Discoverer::new(endpoints.detail_path())?;

    tracing::info!("Fetching listing: {}", endpoints.listing_url());
    let listing = fetcher.fetch_document(endpoints.listing_url()).await?;

    Ok(discoverer.discover(&listing, completed))
}
