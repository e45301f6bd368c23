// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::listing::matches_filter;
use crate::model::{DeliveryRequest, RequestId, Snapshot};
use crate::status::StatusGroup;
use crate::DispatchError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const MAP_DATA_PATH: &str = "map/data";
const AUTOCOMPLETE_PATH: &str = "requests/autocomplete";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const LOCAL_SEARCH_LIMIT: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: RequestId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchResults {
    pub results: Vec<SearchHit>,
}

/// Where snapshots and autocomplete answers come from.
pub trait DataSource {
    fn fetch_snapshot(&self) -> Result<Snapshot, DispatchError>;

    fn search_requests(
        &self,
        query: &str,
        filter: Option<StatusGroup>,
    ) -> Result<SearchResults, DispatchError>;
}

pub struct HttpDataSource {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpDataSource {
    pub fn new(base_url: &str) -> Result<Self, DispatchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

impl DataSource for HttpDataSource {
    fn fetch_snapshot(&self) -> Result<Snapshot, DispatchError> {
        let url = self.url(MAP_DATA_PATH);
        info!("Fetching map data: url={}", url);

        let body = self.client.get(&url).send()?.error_for_status()?.text()?;
        debug!("Map data received: bytes={}", body.len());

        Snapshot::from_json(&body)
    }

    fn search_requests(
        &self,
        query: &str,
        filter: Option<StatusGroup>,
    ) -> Result<SearchResults, DispatchError> {
        let mut params = vec![("q", query.to_string())];
        if let Some(group) = filter {
            params.push(("status_group", group.key().to_string()));
        }

        let results = self
            .client
            .get(self.url(AUTOCOMPLETE_PATH))
            .query(&params)
            .send()?
            .error_for_status()?
            .json::<SearchResults>()?;
        debug!("Autocomplete '{}': hits={}", query, results.results.len());
        Ok(results)
    }
}

/// Snapshot stored on disk; search runs locally over it.
pub struct FileDataSource {
    path: PathBuf,
}

impl FileDataSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

fn search_text(request: &DeliveryRequest) -> String {
    let address = request
        .items
        .iter()
        .find_map(|i| i.address.as_deref())
        .or(request.status.as_deref())
        .unwrap_or("");
    format!("#{} {}", request.id, address)
        .trim_end()
        .to_string()
}

impl DataSource for FileDataSource {
    fn fetch_snapshot(&self) -> Result<Snapshot, DispatchError> {
        let content = fs::read_to_string(&self.path)?;
        Snapshot::from_json(&content)
    }

    fn search_requests(
        &self,
        query: &str,
        filter: Option<StatusGroup>,
    ) -> Result<SearchResults, DispatchError> {
        let snapshot = self.fetch_snapshot()?;
        let needle = query.trim().to_lowercase();

        let results = snapshot
            .requests
            .iter()
            .filter(|r| matches_filter(r, filter))
            .filter(|r| {
                needle.is_empty()
                    || r.id.to_string().contains(&needle)
                    || r.status.as_deref().is_some_and(|s| s.contains(&needle))
                    || r.items.iter().any(|i| {
                        i.address
                            .as_deref()
                            .is_some_and(|a| a.to_lowercase().contains(&needle))
                    })
            })
            .take(LOCAL_SEARCH_LIMIT)
            .map(|r| SearchHit {
                id: r.id,
                text: search_text(r),
            })
            .collect();

        Ok(SearchResults { results })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn snapshot_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "requests": [
                    {{"id": 101, "status": "new", "items": [{{"address": "Tverskaya 7"}}]}},
                    {{"id": 102, "status": "finished", "items": [{{"address": "Arbat 12"}}]}},
                    {{"id": 203, "status": "no_response"}}
                ],
                "workers": []
            }}"#
        )
        .unwrap();
        file
    }

    #[test]
    fn test_local_search_by_address_and_id() {
        let file = snapshot_file();
        let source = FileDataSource::new(file.path());

        let hits = source.search_requests("arbat", None).unwrap();
        assert_eq!(
            hits.results,
            vec![SearchHit {
                id: 102,
                text: "#102 Arbat 12".to_string()
            }]
        );

        let hits = source.search_requests("10", None).unwrap();
        assert_eq!(hits.results.len(), 2);

        let hits = source
            .search_requests("", Some(StatusGroup::NoContact))
            .unwrap();
        assert_eq!(
            hits.results,
            vec![SearchHit {
                id: 203,
                text: "#203 no_response".to_string()
            }]
        );
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = FileDataSource::new("/nonexistent/dispatch/snapshot.json");
        assert!(matches!(source.fetch_snapshot(), Err(DispatchError::Io(_))));
    }
}
