// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use anyhow::Result;
use log::debug;
use std::path::PathBuf;
use std::process::Command;

use crate::errors::SubcommandErrors;
use crate::paging::{Page, PagedSource};

/// Full commit history of a local checkout, as reported by `git log`.
pub struct GitLog {
    project_dir: PathBuf,
}

impl GitLog {
    #[must_use]
    pub fn new(project_dir: PathBuf) -> Self {
        Self { project_dir }
    }

    pub fn get_commit_identifiers(&self) -> Result<Vec<String>> {
        debug!("running git log in {:?}", self.project_dir);
        let output = Command::new("git")
            .args(["log", "--format=%H"])
            .current_dir(&self.project_dir)
            .output()
            .map_err(|e| SubcommandErrors::UnableToStart {
                command: "git log --format=%H".to_string(),
                error: e,
            })?;

        if !output.status.success() {
            return Err(SubcommandErrors::SubcommandFailed {
                command: String::from("git log --format=%H"),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }
            .into());
        }

        let stdout = String::from_utf8(output.stdout)?;
        let commits: Vec<String> = stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();
        debug!("git log listed {} commits", commits.len());
        Ok(commits)
    }
}

impl PagedSource for GitLog {
    type Item = String;

    async fn fetch_page(&self, _page_token: Option<&str>) -> Result<Page<String>> {
        Ok(Page::last(self.get_commit_identifiers()?))
    }
}
