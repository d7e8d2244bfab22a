//! HTTP control endpoints of the running application.
//!
//! The application's embedded dev server exposes two endpoints:
//! `GET /wails/assetdir` answers with the directory it serves assets from
//! (raw text), and `GET /wails/reload` reloads the webview.

use crate::error::{CliError, Result};
use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;

pub const ASSET_DIR_PATH: &str = "/wails/assetdir";
pub const RELOAD_PATH: &str = "/wails/reload";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// What the event loop asks of the running application.
#[async_trait]
pub trait AppControl: Send + Sync {
    /// Directory the application serves its assets from.
    async fn asset_dir(&self) -> Result<String>;

    /// Reload the application's webview.
    async fn reload(&self) -> Result<()>;
}

/// [`AppControl`] over the application's dev server.
#[derive(Debug, Clone)]
pub struct AppClient {
    http: reqwest::Client,
    asset_dir_url: Url,
    reload_url: Url,
}

impl AppClient {
    pub fn new(dev_server_url: &Url) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            asset_dir_url: join_path(dev_server_url, ASSET_DIR_PATH),
            reload_url: join_path(dev_server_url, RELOAD_PATH),
        })
    }

    async fn get(&self, url: &Url) -> Result<reqwest::Response> {
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CliError::Custom(format!("GET {} returned {}", url, status)));
        }
        Ok(response)
    }
}

#[async_trait]
impl AppControl for AppClient {
    async fn asset_dir(&self) -> Result<String> {
        let response = self.get(&self.asset_dir_url).await?;
        Ok(response.text().await?)
    }

    async fn reload(&self) -> Result<()> {
        self.get(&self.reload_url).await?;
        Ok(())
    }
}

/// Append `sub_path` to the path of `base`, keeping any path prefix.
///
/// # Examples
///
/// ```
/// use hotswap_cli::dev::app_client::join_path;
/// use reqwest::Url;
///
/// let base = Url::parse("http://localhost:34115/app/").unwrap();
/// assert_eq!(
///     join_path(&base, "/wails/reload").as_str(),
///     "http://localhost:34115/app/wails/reload"
/// );
/// ```
pub fn join_path(base: &Url, sub_path: &str) -> Url {
    let mut url = base.clone();
    let joined = format!(
        "{}/{}",
        base.path().trim_end_matches('/'),
        sub_path.trim_start_matches('/')
    );
    url.set_path(&joined);
    url
}
