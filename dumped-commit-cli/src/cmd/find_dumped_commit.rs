// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::{env, process::ExitCode};

use anyhow::{Context as _, Result};
use log::info;

use crate::{
    config::{Config, get_config},
    matcher::find_dumped_commit,
    paging::{PagedSource, Pager},
    scm::{git::GitLog, github::GitHubHistory},
    storage::GcsSnapshotListing,
};

use super::cli::{CommonOptions, RemoteOptions};

pub const EXIT_NOT_FOUND: u8 = 1;
pub const EXIT_ERROR: u8 = 2;

// Design note: the `*_cli` functions perform the console output and exit status, while `search` and the sources it is
// given do the work and return data structures.
pub async fn local_cli(common_opts: &CommonOptions) -> ExitCode {
    let result = find_local(common_opts).await;
    report(&result, None)
}

pub async fn remote_cli(common_opts: &CommonOptions, remote_opts: &RemoteOptions) -> ExitCode {
    let result = find_remote(common_opts, remote_opts).await;
    report(&result, Some(&remote_opts.branch))
}

async fn find_local(common_opts: &CommonOptions) -> Result<Option<String>> {
    let config = get_config(common_opts.config.as_deref())?;
    let snapshots = snapshot_listing(&config, common_opts)?;
    let project_dir = env::current_dir().context("reading current directory")?;
    info!("searching local history of {}", project_dir.display());
    search(GitLog::new(project_dir), snapshots).await
}

async fn find_remote(
    common_opts: &CommonOptions,
    remote_opts: &RemoteOptions,
) -> Result<Option<String>> {
    let config = get_config(common_opts.config.as_deref())?;
    let snapshots = snapshot_listing(&config, common_opts)?;
    let settings = config.github_settings(remote_opts.repository.as_deref())?;
    info!(
        "searching history of {} on {}",
        remote_opts.branch, settings.repository
    );
    let commits = GitHubHistory::new(
        settings.api_url,
        remote_opts.github_token.clone(),
        settings.repository,
        remote_opts.branch.clone(),
        settings.page_size,
    )?;
    search(commits, snapshots).await
}

fn snapshot_listing(config: &Config, common_opts: &CommonOptions) -> Result<GcsSnapshotListing> {
    let settings = config.storage_settings(
        common_opts.bucket.as_deref(),
        common_opts.prefix.as_deref(),
        common_opts.storage_token.as_deref(),
    )?;
    info!(
        "listing snapshots in bucket {} at {}",
        settings.bucket, settings.endpoint
    );
    GcsSnapshotListing::new(
        &settings.endpoint,
        &settings.bucket,
        settings.prefix,
        settings.page_size,
        settings.token,
    )
}

/// Find the newest commit from `commits` that has a snapshot listed by `snapshots`.
pub async fn search<C, S>(commits: C, snapshots: S) -> Result<Option<String>>
where
    C: PagedSource<Item = String>,
    S: PagedSource<Item = String>,
{
    let mut commits = Pager::new(commits);
    let mut snapshots = Pager::new(snapshots);
    find_dumped_commit(&mut commits, &mut snapshots).await
}

#[must_use]
pub fn exit_status(result: &Result<Option<String>>) -> u8 {
    match result {
        Ok(Some(_)) => 0,
        Ok(None) => EXIT_NOT_FOUND,
        Err(_) => EXIT_ERROR,
    }
}

#[allow(clippy::print_stdout)]
#[allow(clippy::print_stderr)]
fn report(result: &Result<Option<String>>, branch: Option<&str>) -> ExitCode {
    match result {
        Ok(Some(commit)) => println!("{commit}"),
        Ok(None) => match branch {
            Some(branch) => eprintln!("No dumped commit found on branch {branch}"),
            None => eprintln!("No dumped commit found"),
        },
        Err(err) => eprintln!("Error: unable to determine dumped commit: {err:?}"),
    }
    ExitCode::from(exit_status(result))
}
