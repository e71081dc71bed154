// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::time::Duration;

use log::debug;
use reqwest::{Client, Response};

use crate::errors::RemoteApiError;

pub fn build_client() -> reqwest::Result<Client> {
    reqwest::ClientBuilder::new()
        .gzip(true)
        .user_agent(format!("dumped-commit ({})", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .build()
}

/// Turn any non-200 response into a [`RemoteApiError::UnexpectedStatus`], keeping the body for diagnostics.
pub async fn require_ok(service: &'static str, response: Response) -> anyhow::Result<Response> {
    debug!("HTTP response: {response:?}");
    let status = response.status();
    if status != 200 {
        let body = response.text().await.unwrap_or_default();
        return Err(RemoteApiError::UnexpectedStatus {
            service,
            status,
            body,
        }
        .into());
    }
    Ok(response)
}
