// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use anyhow::{Context as _, Result};
use log::{debug, trace};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::{
    errors::ConfigError,
    http::{build_client, require_ok},
    paging::{Page, PagedSource},
};

pub const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";

const DELIMITER: &str = "/";

/// Snapshots stored in a Google Cloud Storage bucket, one "directory" per commit.
///
/// Objects are listed with a `/` delimiter, so each snapshot's objects collapse into a single prefix like
/// `{root_prefix}{commit}/`.  Only the prefixes are used; the objects themselves are never read.
pub struct GcsSnapshotListing {
    list_url: Url,
    client: Client,
    root_prefix: String,
    page_size: Option<u32>,
    token: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ListObjectsResponse {
    #[serde(default)]
    prefixes: Vec<String>,
    next_page_token: Option<String>,
}

impl GcsSnapshotListing {
    pub fn new(
        endpoint: &Url,
        bucket: &str,
        root_prefix: Option<String>,
        page_size: Option<u32>,
        token: Option<String>,
    ) -> Result<GcsSnapshotListing> {
        let mut list_url = endpoint.clone();
        list_url
            .path_segments_mut()
            .map_err(|()| ConfigError::CannotBeABase(endpoint.to_string()))?
            .pop_if_empty()
            .extend(["storage", "v1", "b", bucket, "o"]);

        Ok(GcsSnapshotListing {
            list_url,
            client: build_client().context("building HTTP client for object storage")?,
            root_prefix: normalize_root_prefix(root_prefix),
            page_size,
            token,
        })
    }

    /// Map a listed prefix (`{root_prefix}{commit}/`) back to the commit identifier it was stored under.
    fn commit_from_prefix<'a>(&self, prefix: &'a str) -> Option<&'a str> {
        let commit = prefix
            .strip_prefix(self.root_prefix.as_str())?
            .trim_end_matches(DELIMITER);
        if commit.is_empty() {
            None
        } else {
            Some(commit)
        }
    }
}

/// A root prefix always names a "directory", so it must end with the delimiter for stripping to work.
fn normalize_root_prefix(root_prefix: Option<String>) -> String {
    match root_prefix {
        Some(prefix) if !prefix.is_empty() && !prefix.ends_with(DELIMITER) => {
            format!("{prefix}{DELIMITER}")
        }
        Some(prefix) => prefix,
        None => String::new(),
    }
}

impl PagedSource for GcsSnapshotListing {
    type Item = String;

    async fn fetch_page(&self, page_token: Option<&str>) -> Result<Page<String>> {
        let mut url = self.list_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("delimiter", DELIMITER);
            if !self.root_prefix.is_empty() {
                query.append_pair("prefix", &self.root_prefix);
            }
            if let Some(page_size) = self.page_size {
                query.append_pair("maxResults", &page_size.to_string());
            }
            if let Some(page_token) = page_token {
                query.append_pair("pageToken", page_token);
            }
        }
        debug!("HTTP request GET {url}");

        let mut request = self.client.get(url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .context("sending object listing request")?;
        let response = require_ok("object storage listing", response).await?;
        let body = response
            .json::<ListObjectsResponse>()
            .await
            .context("parsing object listing response")?;
        trace!("object listing response: {body:?}");

        let items = body
            .prefixes
            .iter()
            .filter_map(|prefix| self.commit_from_prefix(prefix))
            .map(String::from)
            .collect();
        Ok(Page {
            items,
            next_page_token: body.next_page_token,
        })
    }
}
