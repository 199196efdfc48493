use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info};

use crate::error::{Error, Result};
use crate::types::Location;

pub const DEFAULT_BASE_URL: &str =
    "https://developer.nrel.gov/api/nsrdb/v2/solar/psm3-5min-download.json";

/// Pause between consecutive download requests.
pub const DEFAULT_REQUEST_PAUSE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Five,
    Fifteen,
    Thirty,
    Sixty,
}

impl Interval {
    pub fn minutes(&self) -> u32 {
        match self {
            Self::Five => 5,
            Self::Fifteen => 15,
            Self::Thirty => 30,
            Self::Sixty => 60,
        }
    }
}

impl TryFrom<u32> for Interval {
    type Error = Error;

    fn try_from(minutes: u32) -> Result<Self> {
        match minutes {
            5 => Ok(Self::Five),
            15 => Ok(Self::Fifteen),
            30 => Ok(Self::Thirty),
            60 => Ok(Self::Sixty),
            other => Err(Error::InvalidArgument(format!(
                "interval must be 5, 15, 30 or 60 minutes, got {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest {
    pub attributes: Vec<String>,
    pub interval: Interval,
    pub location: Location,
    pub year: i32,
    pub to_utc: bool,
}

impl DownloadRequest {
    /// Well-known-text point; longitude comes first.
    pub fn wkt(&self) -> String {
        format!(
            "POINT({:.4} {:.4})",
            self.location.longitude, self.location.latitude
        )
    }

    pub fn query_params(&self, api_key: &str, email: &str) -> Vec<(&'static str, String)> {
        vec![
            ("attributes", self.attributes.join(",")),
            ("interval", self.interval.minutes().to_string()),
            ("to_utc", self.to_utc.to_string()),
            ("wkt", self.wkt()),
            ("api_key", api_key.to_string()),
            ("email", email.to_string()),
            ("names", self.year.to_string()),
        ]
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    errors: Vec<String>,
    outputs: Option<ApiOutputs>,
}

#[derive(Debug, Clone, Deserialize)]
struct ApiOutputs {
    #[serde(rename = "downloadUrl", default)]
    download_url: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTicket {
    pub url: String,
    pub message: Option<String>,
}

/// Turns a raw API reply into a ticket or an error.
pub fn parse_response(status: u16, body: &str) -> Result<DownloadTicket> {
    if status != 200 {
        return Err(Error::Http {
            status,
            body: body.to_string(),
        });
    }
    let parsed: ApiResponse = serde_json::from_str(body)
        .map_err(|e| Error::Api(format!("response is not valid JSON ({e}): {body}")))?;
    if !parsed.errors.is_empty() {
        return Err(Error::Api(parsed.errors.join("\n")));
    }
    let outputs = parsed
        .outputs
        .ok_or_else(|| Error::Api("response has no outputs".to_string()))?;
    let url = outputs
        .download_url
        .ok_or_else(|| Error::Api("response has no download url".to_string()))?;
    Ok(DownloadTicket {
        url,
        message: outputs.message,
    })
}

/// Client for the PSM download endpoint. The server prepares each archive
/// asynchronously and answers with a URL to it.
pub struct NsrdbClient {
    client: Client,
    base_url: String,
    api_key: String,
    email: String,
    pause: Duration,
}

impl NsrdbClient {
    pub fn new(base_url: &str, api_key: &str, email: &str) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(60)).build()?,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            email: email.to_string(),
            pause: DEFAULT_REQUEST_PAUSE,
        })
    }

    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    pub async fn request_download(&self, request: &DownloadRequest) -> Result<DownloadTicket> {
        debug!(year = request.year, wkt = %request.wkt(), "requesting NSRDB download");
        let response = self
            .client
            .post(&self.base_url)
            .query(&request.query_params(&self.api_key, &self.email))
            .header("x-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        let ticket = parse_response(status, &body).inspect_err(|e| {
            error!(year = request.year, error = %e, "NSRDB request failed");
        })?;
        if let Some(message) = &ticket.message {
            info!(year = request.year, "{message}");
        }
        Ok(ticket)
    }

    /// Requests every year in order, waiting between consecutive requests.
    /// Stops at the first failure.
    pub async fn request_all(&self, requests: &[DownloadRequest]) -> Result<Vec<DownloadTicket>> {
        let mut tickets = Vec::with_capacity(requests.len());
        for (i, request) in requests.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.pause).await;
            }
            tickets.push(self.request_download(request).await?);
        }
        Ok(tickets)
    }

    /// Fetches `url` into `dest`, returning the number of bytes written.
    pub async fn download_archive(&self, url: &str, dest: &Path) -> Result<u64> {
        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body,
            });
        }
        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        info!(path = %dest.display(), bytes = written, "downloaded archive");
        Ok(written)
    }
}
