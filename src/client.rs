use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;

use crate::config;
use crate::error::ScalperError;

/// Output columns, in write order. One entry per accessor on the source
/// item; the mapping is enumerated statically, no name conversion at
/// runtime.
pub const KERNEL_FIELDS: [&str; 5] = ["ref", "title", "author", "lastRunTime", "totalVotes"];

/// One page worth of search hits. `None` entries are null items in the
/// source payload; callers skip them but they still count toward the page
/// length used for termination.
pub type Page = Vec<Option<Vec<String>>>;

/// Contract the pagination loop depends on. Field-name translation and
/// value stringification happen behind this trait.
pub trait SearchClient {
    fn columns(&self) -> &'static [&'static str];

    /// Fetch one page of results. An empty vec means the results are
    /// exhausted.
    fn fetch_page(
        &self,
        term: &str,
        page: u32,
        page_size: usize,
        sort_by: &str,
    ) -> Result<Page, ScalperError>;
}

/// One kernel as returned by the listing endpoint. Every field is optional
/// on the wire; missing values stringify to the empty string.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KernelItem {
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub last_run_time: Option<String>,
    #[serde(default)]
    pub total_votes: Option<i64>,
}

impl KernelItem {
    fn row(self) -> Vec<String> {
        vec![
            self.reference.unwrap_or_default(),
            self.title.unwrap_or_default(),
            self.author.unwrap_or_default(),
            self.last_run_time.unwrap_or_default(),
            self.total_votes.map(|v| v.to_string()).unwrap_or_default(),
        ]
    }
}

#[derive(Debug, Clone, Deserialize)]
struct Credentials {
    username: String,
    key: String,
}

/// Blocking client for the Kaggle public API kernels listing.
pub struct KaggleClient {
    client: Client,
    credentials: Credentials,
}

impl KaggleClient {
    pub fn new() -> Result<Self, ScalperError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("scalper/0.2"));

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()?;

        Ok(KaggleClient {
            client,
            credentials: load_credentials()?,
        })
    }
}

impl SearchClient for KaggleClient {
    fn columns(&self) -> &'static [&'static str] {
        &KERNEL_FIELDS
    }

    fn fetch_page(
        &self,
        term: &str,
        page: u32,
        page_size: usize,
        sort_by: &str,
    ) -> Result<Page, ScalperError> {
        let url = format!("{}/kernels/list", config::KAGGLE_API_BASE);
        debug!("GET {} search={} page={}", url, term, page);

        let page_param = page.to_string();
        let page_size_param = page_size.to_string();
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.key))
            .query(&[
                ("search", term),
                ("page", page_param.as_str()),
                ("pageSize", page_size_param.as_str()),
                ("sortBy", sort_by),
            ])
            .send()?;

        if !response.status().is_success() {
            return Err(ScalperError::ApiStatus(response.status()));
        }

        let items: Vec<Option<KernelItem>> = response.json()?;
        Ok(items.into_iter().map(|item| item.map(KernelItem::row)).collect())
    }
}

/// Resolve Kaggle credentials the way the official client does: environment
/// first, then kaggle.json under KAGGLE_CONFIG_DIR or ~/.kaggle.
fn load_credentials() -> Result<Credentials, ScalperError> {
    if let (Ok(username), Ok(key)) = (env::var("KAGGLE_USERNAME"), env::var("KAGGLE_KEY")) {
        return Ok(Credentials { username, key });
    }

    let config_path = credentials_path().ok_or_else(|| {
        ScalperError::Credentials(
            "set KAGGLE_USERNAME/KAGGLE_KEY or provide ~/.kaggle/kaggle.json".to_string(),
        )
    })?;
    parse_credentials_file(&config_path)
}

fn credentials_path() -> Option<PathBuf> {
    if let Ok(dir) = env::var("KAGGLE_CONFIG_DIR") {
        return Some(PathBuf::from(dir).join("kaggle.json"));
    }
    env::var_os("HOME").map(|home| PathBuf::from(home).join(".kaggle").join("kaggle.json"))
}

fn parse_credentials_file(path: &Path) -> Result<Credentials, ScalperError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ScalperError::Credentials(format!("could not read {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        ScalperError::Credentials(format!("could not parse {}: {}", path.display(), e))
    })
}
