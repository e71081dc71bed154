// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SubcommandErrors {
    #[error("unable to start sub-command '{command:?}': {error:?}")]
    UnableToStart {
        command: String,
        error: std::io::Error,
    },

    #[error("sub-command '{command:?}' failed with exit code {status:?} and stderr {stderr:?})")]
    SubcommandFailed {
        command: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

#[derive(Error, Debug)]
pub enum RemoteApiError {
    #[error("{service} returned unexpected status {status}: {body:?}")]
    UnexpectedStatus {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("GitHub GraphQL query failed: {0}")]
    GraphQl(String),

    #[error("repository `{0}` was not found or is not accessible with the provided token")]
    RepositoryNotFound(String),

    #[error("branch `{branch}` was not found in repository `{repository}`")]
    BranchNotFound { repository: String, branch: String },

    #[error("ref `{0}` does not point at a commit")]
    NotACommit(String),

    #[error("{service} reported more pages but returned no cursor to fetch them with")]
    MissingCursor { service: &'static str },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no snapshot bucket configured; pass --bucket, set DUMPED_COMMIT_BUCKET, or set storage.bucket in the config file")]
    MissingBucket,

    #[error("no GitHub repository configured; pass --repository, set GITHUB_REPOSITORY, or set github.repository in the config file")]
    MissingRepository,

    #[error("invalid repository `{0}`; expected the form owner/name")]
    InvalidRepository(String),

    #[error("invalid URL `{url}`: {error}")]
    InvalidUrl {
        url: String,
        error: url::ParseError,
    },

    #[error("github.page-size must be between 1 and {max}, but was {value}")]
    InvalidPageSize { value: u16, max: u16 },

    #[error("URL `{0}` cannot be used as a base for API requests")]
    CannotBeABase(String),

    #[error("config file {0} could not be opened")]
    MissingOverrideConfig(String),
}
