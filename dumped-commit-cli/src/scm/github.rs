// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{fmt, str::FromStr};

use anyhow::{Context as _, Result};
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    errors::{ConfigError, RemoteApiError},
    http::{build_client, require_ok},
    paging::{Page, PagedSource},
};

pub const DEFAULT_API_URL: &str = "https://api.github.com/graphql";

/// GitHub's upper limit for `first:` on a connection.
pub const MAX_PAGE_SIZE: u16 = 100;

pub const DEFAULT_PAGE_SIZE: u16 = MAX_PAGE_SIZE;

const HISTORY_QUERY: &str = r"
query($owner: String!, $name: String!, $qualifiedName: String!, $first: Int!, $after: String) {
  repository(owner: $owner, name: $name) {
    ref(qualifiedName: $qualifiedName) {
      target {
        ... on Commit {
          history(first: $first, after: $after) {
            pageInfo { hasNextPage endCursor }
            nodes { oid }
          }
        }
      }
    }
  }
}
";

/// An `owner/name` GitHub repository reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl FromStr for Repository {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Repository {
                    owner: String::from(owner),
                    name: String::from(name),
                })
            }
            _ => Err(ConfigError::InvalidRepository(String::from(s))),
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Commit history of a single branch, fetched from the GitHub GraphQL API newest-first.
pub struct GitHubHistory {
    api_url: Url,
    client: Client,
    token: String,
    repository: Repository,
    branch: String,
    page_size: u16,
}

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'static str,
    variables: HistoryVariables<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryVariables<'a> {
    owner: &'a str,
    name: &'a str,
    qualified_name: String,
    first: u16,
    after: Option<&'a str>,
}

#[derive(Deserialize, Debug)]
struct GraphQlResponse {
    data: Option<HistoryData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize, Debug)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize, Debug)]
struct HistoryData {
    repository: Option<RepositoryNode>,
}

#[derive(Deserialize, Debug)]
struct RepositoryNode {
    #[serde(rename = "ref")]
    git_ref: Option<RefNode>,
}

#[derive(Deserialize, Debug)]
struct RefNode {
    target: Option<TargetNode>,
}

#[derive(Deserialize, Debug)]
struct TargetNode {
    history: Option<HistoryConnection>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct HistoryConnection {
    page_info: PageInfo,
    nodes: Vec<CommitNode>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Deserialize, Debug)]
struct CommitNode {
    oid: String,
}

impl GitHubHistory {
    pub fn new(
        api_url: Url,
        token: String,
        repository: Repository,
        branch: String,
        page_size: u16,
    ) -> Result<GitHubHistory> {
        Ok(GitHubHistory {
            api_url,
            client: build_client().context("building HTTP client for GitHub")?,
            token,
            repository,
            branch,
            page_size,
        })
    }

    fn qualified_name(&self) -> String {
        if self.branch.starts_with("refs/") {
            self.branch.clone()
        } else {
            format!("refs/heads/{}", self.branch)
        }
    }

    fn history_from_response(&self, response: GraphQlResponse) -> Result<HistoryConnection> {
        if !response.errors.is_empty() {
            let messages = response
                .errors
                .into_iter()
                .map(|e| e.message)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(RemoteApiError::GraphQl(messages).into());
        }

        let repository = response
            .data
            .and_then(|data| data.repository)
            .ok_or_else(|| RemoteApiError::RepositoryNotFound(self.repository.to_string()))?;
        let target = repository
            .git_ref
            .ok_or_else(|| RemoteApiError::BranchNotFound {
                repository: self.repository.to_string(),
                branch: self.branch.clone(),
            })?
            .target;
        target
            .and_then(|target| target.history)
            .ok_or_else(|| RemoteApiError::NotACommit(self.qualified_name()).into())
    }
}

impl PagedSource for GitHubHistory {
    type Item = String;

    async fn fetch_page(&self, page_token: Option<&str>) -> Result<Page<String>> {
        let request = GraphQlRequest {
            query: HISTORY_QUERY,
            variables: HistoryVariables {
                owner: &self.repository.owner,
                name: &self.repository.name,
                qualified_name: self.qualified_name(),
                first: self.page_size,
                after: page_token,
            },
        };
        debug!(
            "HTTP request POST {} for history of {} on {} after {page_token:?}",
            self.api_url, self.branch, self.repository
        );

        let response = self
            .client
            .post(self.api_url.clone())
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .context("sending GitHub history query")?;
        let response = require_ok("GitHub GraphQL API", response).await?;
        let body = response
            .json::<GraphQlResponse>()
            .await
            .context("parsing GitHub history response")?;

        let history = self.history_from_response(body)?;
        let next_page_token = match (
            history.page_info.has_next_page,
            history.page_info.end_cursor,
        ) {
            (true, Some(cursor)) => Some(cursor),
            (true, None) => {
                return Err(RemoteApiError::MissingCursor {
                    service: "GitHub GraphQL API",
                }
                .into());
            }
            (false, _) => None,
        };
        Ok(Page {
            items: history.nodes.into_iter().map(|node| node.oid).collect(),
            next_page_token,
        })
    }
}
