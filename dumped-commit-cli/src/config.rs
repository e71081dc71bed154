// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{fs, path::Path};

use anyhow::Result;
use serde::Deserialize;
use url::Url;

use crate::{
    errors::ConfigError,
    scm::github::{self, Repository},
    storage,
};

pub const DEFAULT_CONFIG_PATH: &str = ".config/dumped-commit.toml";

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    storage: StorageConfig,
    #[serde(default)]
    github: GitHubConfig,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct StorageConfig {
    bucket: Option<String>,
    prefix: Option<String>,
    endpoint: Option<String>,
    page_size: Option<u32>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct GitHubConfig {
    repository: Option<String>,
    api_url: Option<String>,
    page_size: Option<u16>,
}

/// Fully resolved location of the snapshot listing.
#[derive(Debug, PartialEq, Eq)]
pub struct StorageSettings {
    pub endpoint: Url,
    pub bucket: String,
    pub prefix: Option<String>,
    pub page_size: Option<u32>,
    pub token: Option<String>,
}

/// Fully resolved GitHub API settings, less the per-invocation token and branch.
#[derive(Debug, PartialEq, Eq)]
pub struct GitHubSettings {
    pub api_url: Url,
    pub repository: Repository,
    pub page_size: u16,
}

fn parse_url(url: &str) -> Result<Url, ConfigError> {
    Url::parse(url).map_err(|error| ConfigError::InvalidUrl {
        url: String::from(url),
        error,
    })
}

impl Config {
    pub fn parse(content: &str) -> Result<Config> {
        Ok(toml::from_str(content)?)
    }

    /// Resolve storage settings; any `Some` argument (from the command line or environment) wins over the file.
    pub fn storage_settings(
        &self,
        bucket: Option<&str>,
        prefix: Option<&str>,
        token: Option<&str>,
    ) -> Result<StorageSettings, ConfigError> {
        let bucket = bucket
            .map(String::from)
            .or_else(|| self.storage.bucket.clone())
            .filter(|bucket| !bucket.is_empty())
            .ok_or(ConfigError::MissingBucket)?;
        let endpoint = parse_url(
            self.storage
                .endpoint
                .as_deref()
                .unwrap_or(storage::DEFAULT_ENDPOINT),
        )?;
        Ok(StorageSettings {
            endpoint,
            bucket,
            prefix: prefix
                .map(String::from)
                .or_else(|| self.storage.prefix.clone()),
            page_size: self.storage.page_size,
            token: token.map(String::from),
        })
    }

    pub fn github_settings(&self, repository: Option<&str>) -> Result<GitHubSettings, ConfigError> {
        let repository = repository
            .or(self.github.repository.as_deref())
            .ok_or(ConfigError::MissingRepository)?
            .parse::<Repository>()?;
        let api_url = parse_url(
            self.github
                .api_url
                .as_deref()
                .unwrap_or(github::DEFAULT_API_URL),
        )?;
        let page_size = self.github.page_size.unwrap_or(github::DEFAULT_PAGE_SIZE);
        if !(1..=github::MAX_PAGE_SIZE).contains(&page_size) {
            return Err(ConfigError::InvalidPageSize {
                value: page_size,
                max: github::MAX_PAGE_SIZE,
            });
        }
        Ok(GitHubSettings {
            api_url,
            repository,
            page_size,
        })
    }
}

pub fn get_config(override_config: Option<&Path>) -> Result<Config> {
    let path = override_config.unwrap_or(Path::new(DEFAULT_CONFIG_PATH));
    if fs::exists(path)? {
        Config::parse(&fs::read_to_string(path)?)
    } else {
        if let Some(override_config) = override_config {
            return Err(ConfigError::MissingOverrideConfig(
                override_config.display().to_string(),
            )
            .into());
        }
        Ok(Config::default())
    }
}
