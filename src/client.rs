use log::debug;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::Settings;
use crate::error::Error;
use crate::models::{CaseInsensitive, TestDetail, TestSummary};

const HEADER_API_KEY: &str = "api";
const HEADER_USERNAME: &str = "username";

/// Authenticated client for the StatusCake tests API.
///
/// Built once per run and shared by every request.
#[derive(Debug, Clone)]
pub struct StatusCakeClient {
    http: Client,
    base_url: Url,
}

impl StatusCakeClient {
    pub fn new(settings: &Settings) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut apikey = HeaderValue::from_str(&settings.apikey)?;
        apikey.set_sensitive(true);
        headers.insert(HEADER_API_KEY, apikey);
        headers.insert(HEADER_USERNAME, HeaderValue::from_str(&settings.username)?);

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(StatusCakeClient {
            http: builder.build().map_err(Error::Client)?,
            base_url: settings.base_url.clone(),
        })
    }

    /// Fetches every test on the account, in the order the API returns them.
    ///
    /// A `null` body is an empty list.
    pub async fn list_tests(&self) -> Result<Vec<TestSummary>, Error> {
        let url = self.base_url.join("Tests/")?;
        let tests: Option<Vec<CaseInsensitive<TestSummary>>> = self.get_json(url).await?;
        Ok(tests
            .unwrap_or_default()
            .into_iter()
            .map(|CaseInsensitive(test)| test)
            .collect())
    }

    /// Fetches the full record of a single test.
    ///
    /// A `null` body is a zero-valued record.
    pub async fn test_details(&self, test_id: i64) -> Result<TestDetail, Error> {
        let mut url = self.base_url.join("Tests/Details")?;
        url.query_pairs_mut()
            .append_pair("TestID", &test_id.to_string());
        let detail: Option<CaseInsensitive<TestDetail>> = self.get_json(url).await?;
        Ok(detail.map(|CaseInsensitive(detail)| detail).unwrap_or_default())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {url}");

        let response = match self.http.get(url.clone()).send().await {
            Ok(response) => response,
            Err(source) => return Err(Error::Transport { url, source }),
        };

        let status = response.status();
        debug!("{url}: {status}");
        if status != StatusCode::OK {
            return Err(Error::Status { url, status });
        }

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(source) => return Err(Error::Body { url, source }),
        };

        serde_json::from_slice(&body).map_err(|source| Error::Decode { url, source })
    }
}
