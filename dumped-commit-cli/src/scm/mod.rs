// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Sources of commit history, newest commit first.
//!
//! Both implement [`crate::paging::PagedSource`] with `Item = String` (the full commit hash).  [`git::GitLog`] reads
//! the whole history of the local checkout in one page; [`github::GitHubHistory`] fetches a branch's history from the
//! GitHub GraphQL API in chunks.

pub mod git;
pub mod github;
