//! Remote fetches for album pages and cover art.
//!
//! All metadata lookups go through one [`HttpFetcher`] built at init time
//! and passed by reference to every call site; it owns the only
//! process-wide resource in the crate. The [`Fetch`] trait is the seam the
//! recorder actually depends on, so tests can substitute canned pages.

use reqwest::blocking::Client;
use tracing::debug;

use crate::error::{Error, Result};

/// Something that can fetch a URL body into memory.
pub trait Fetch {
    /// Fetch `url` and return the whole response body. On error nothing is
    /// returned; partial bodies are never surfaced.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Blocking HTTP(S) fetcher with optional proxy support.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build the fetcher, routing through `proxy` when one is given.
    pub fn new(proxy: Option<&str>) -> Result<Self> {
        let mut builder = Client::builder();

        if let Some(url) = proxy {
            let proxy = reqwest::Proxy::all(url).map_err(Error::Http)?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(Error::Http)?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        debug!(url, "fetching");

        let response = self.client.get(url).send().map_err(|source| Error::Fetch {
            url: url.to_string(),
            source,
        })?;

        let body = response
            .error_for_status()
            .and_then(|r| r.bytes())
            .map_err(|source| Error::Fetch {
                url: url.to_string(),
                source,
            })?;

        Ok(body.to_vec())
    }
}
