// SPDX-FileCopyrightText: 2024 Mathieu Fenniak <mathieu@fenniak.net>
//
// SPDX-License-Identifier: GPL-3.0-or-later

use std::collections::HashSet;

use anyhow::{Context as _, Result};
use log::{debug, trace};

use crate::paging::{PagedSource, Pager};

/// Find the most recent commit that has a stored snapshot.
///
/// `commits` must yield commit identifiers newest-first; `snapshots` yields the identifiers which have a snapshot, in
/// whatever order the storage listing provides them.  Returns `Ok(None)` when both sources are exhausted without a
/// match.
///
/// Search order:
///
/// - The first snapshot page is fetched before any commits.  If the storage listing is entirely empty, there's no
///   point looking at the commit history at all.
///
/// - The known commits are scanned newest-first against every snapshot identifier seen so far, and the first hit is
///   returned immediately.  Nothing more is fetched from either source after a hit, so a newer commit whose snapshot
///   sits on a later, unfetched listing page won't be considered.
///
/// - With no hit, more commits are requested until the commit history is exhausted; only then is another snapshot
///   page requested.  This keeps calls to the storage listing to a minimum.
///
/// - Whenever either side grows, the scan restarts from the newest commit.  Restarting is what guarantees that an
///   older commit is never reported when a newer one in the known history also matches.
pub async fn find_dumped_commit<C, S>(
    commits: &mut Pager<C>,
    snapshots: &mut Pager<S>,
) -> Result<Option<String>>
where
    C: PagedSource<Item = String>,
    S: PagedSource<Item = String>,
{
    let Some(first_page) = snapshots
        .next_page()
        .await
        .context("fetching first snapshot listing page")?
    else {
        return Ok(None);
    };
    if first_page.is_empty() && snapshots.is_exhausted() {
        debug!("snapshot listing is empty; no commit can match");
        return Ok(None);
    }
    let mut snapshot_ids: HashSet<String> = first_page.into_iter().collect();

    let mut known_commits: Vec<String> = Vec::new();
    let mut commits_examined: usize = 0;

    loop {
        trace!(
            "scanning {} commits against {} snapshot identifiers",
            known_commits.len(),
            snapshot_ids.len()
        );
        for commit in &known_commits {
            commits_examined += 1;
            if snapshot_ids.contains(commit) {
                debug!(
                    "matched commit {commit} after {commits_examined} membership checks ({} commit pages, {} snapshot pages)",
                    commits.pages_fetched(),
                    snapshots.pages_fetched()
                );
                return Ok(Some(commit.clone()));
            }
        }

        if let Some(batch) = commits
            .next_page()
            .await
            .context("fetching commit history")?
        {
            trace!("appending {} commits to the history", batch.len());
            known_commits.extend(batch);
            continue;
        }

        match snapshots
            .next_page()
            .await
            .context("fetching snapshot listing page")?
        {
            Some(page) => {
                trace!(
                    "commit history exhausted; adding {} snapshot identifiers",
                    page.len()
                );
                snapshot_ids.extend(page);
            }
            None => {
                debug!(
                    "no match after {commits_examined} membership checks ({} commit pages, {} snapshot pages)",
                    commits.pages_fetched(),
                    snapshots.pages_fetched()
                );
                return Ok(None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::anyhow;

    use super::find_dumped_commit;
    use crate::paging::{Page, PagedSource, Pager};

    /// Replays a fixed list of pages; the page token is just the index of the next page.
    struct MockPagedSource {
        pages: Vec<Vec<String>>,
    }

    impl MockPagedSource {
        fn new(pages: &[&[&str]]) -> Self {
            MockPagedSource {
                pages: pages
                    .iter()
                    .map(|page| page.iter().map(|id| String::from(*id)).collect())
                    .collect(),
            }
        }
    }

    impl PagedSource for MockPagedSource {
        type Item = String;

        async fn fetch_page(&self, page_token: Option<&str>) -> anyhow::Result<Page<String>> {
            let index = page_token.map_or(Ok(0), str::parse::<usize>)?;
            let Some(items) = self.pages.get(index) else {
                // an empty source still answers its first request, with nothing
                if index == 0 {
                    return Ok(Page::last(vec![]));
                }
                return Err(anyhow!("test error: page {index} does not exist"));
            };
            let next_page_token = (index + 1 < self.pages.len()).then(|| (index + 1).to_string());
            Ok(Page {
                items: items.clone(),
                next_page_token,
            })
        }
    }

    struct FailingSource;

    impl PagedSource for FailingSource {
        type Item = String;

        async fn fetch_page(&self, _page_token: Option<&str>) -> anyhow::Result<Page<String>> {
            Err(anyhow!("test error: upstream unavailable"))
        }
    }

    async fn run(
        commits: &[&[&str]],
        snapshots: &[&[&str]],
    ) -> (Option<String>, Pager<MockPagedSource>, Pager<MockPagedSource>) {
        let mut commits = Pager::new(MockPagedSource::new(commits));
        let mut snapshots = Pager::new(MockPagedSource::new(snapshots));
        let result = find_dumped_commit(&mut commits, &mut snapshots)
            .await
            .expect("mock sources never fail");
        (result, commits, snapshots)
    }

    #[tokio::test]
    async fn newest_commit_in_first_page() {
        let (result, commits, snapshots) =
            run(&[&["c3", "c2", "c1"]], &[&["c1", "c3"], &["c2"]]).await;
        assert_eq!(result.as_deref(), Some("c3"));
        assert_eq!(snapshots.pages_fetched(), 1);
        assert_eq!(commits.pages_fetched(), 1);
    }

    #[tokio::test]
    async fn older_match_in_first_page_wins_over_later_pages() {
        let (result, _commits, snapshots) = run(&[&["c3", "c2", "c1"]], &[&["c1"], &["c2"]]).await;
        assert_eq!(result.as_deref(), Some("c1"));
        assert_eq!(snapshots.pages_fetched(), 1);
    }

    #[tokio::test]
    async fn empty_first_page_then_match() {
        let (result, _commits, snapshots) = run(&[&["c3", "c2", "c1"]], &[&[], &["c3"]]).await;
        assert_eq!(result.as_deref(), Some("c3"));
        assert_eq!(snapshots.pages_fetched(), 2);
    }

    #[tokio::test]
    async fn no_commits() {
        let (result, commits, snapshots) = run(&[], &[&["c1"], &["c2"]]).await;
        assert!(result.is_none());
        assert_eq!(snapshots.pages_fetched(), 2);
        assert!(snapshots.is_exhausted());
        assert!(commits.is_exhausted());
    }

    #[tokio::test]
    async fn no_snapshots_skips_commit_history() {
        let (result, commits, snapshots) = run(&[&["c1"]], &[]).await;
        assert!(result.is_none());
        assert_eq!(snapshots.pages_fetched(), 1);
        assert_eq!(commits.pages_fetched(), 0);
    }

    #[tokio::test]
    async fn nothing_matches() {
        let (result, commits, snapshots) =
            run(&[&["c3", "c2"], &["c1"]], &[&["x1"], &[], &["x2", "x3"]]).await;
        assert!(result.is_none());
        assert!(commits.is_exhausted());
        assert!(snapshots.is_exhausted());
        assert_eq!(commits.pages_fetched(), 2);
        assert_eq!(snapshots.pages_fetched(), 3);
    }

    #[tokio::test]
    async fn all_commit_pages_fetched_before_second_snapshot_page() {
        let (result, commits, snapshots) =
            run(&[&["c5", "c4"], &["c3", "c2"], &["c1"]], &[&["c1"], &["c4"]]).await;
        // c4 would be newer, but c1 matches the first snapshot page once the history is fully fetched
        assert_eq!(result.as_deref(), Some("c1"));
        assert_eq!(commits.pages_fetched(), 3);
        assert_eq!(snapshots.pages_fetched(), 1);
    }

    #[tokio::test]
    async fn match_in_later_commit_page_stops_commit_fetching() {
        let (result, commits, snapshots) =
            run(&[&["c5", "c4"], &["c3", "c2"], &["c1"]], &[&["c2", "c1"]]).await;
        assert_eq!(result.as_deref(), Some("c2"));
        assert_eq!(commits.pages_fetched(), 2);
        assert!(!commits.is_exhausted());
        assert_eq!(snapshots.pages_fetched(), 1);
    }

    #[tokio::test]
    async fn newest_match_reported_after_snapshot_growth() {
        // page 2 brings in both c2 and c1; the restarted scan must prefer c2
        let (result, _commits, snapshots) =
            run(&[&["c3", "c2", "c1"]], &[&["x"], &["c1", "c2"], &["c3"]]).await;
        assert_eq!(result.as_deref(), Some("c2"));
        assert_eq!(snapshots.pages_fetched(), 2);
    }

    #[tokio::test]
    async fn repeatable() {
        let first = run(&[&["c4", "c3"], &["c2", "c1"]], &[&[], &["c2"], &["c4"]]).await;
        let second = run(&[&["c4", "c3"], &["c2", "c1"]], &[&[], &["c2"], &["c4"]]).await;
        assert_eq!(first.0.as_deref(), Some("c2"));
        assert_eq!(first.0, second.0);
    }

    #[tokio::test]
    async fn commit_source_failure_propagates() {
        let mut commits = Pager::new(FailingSource);
        let mut snapshots = Pager::new(MockPagedSource::new(&[&["c1"]]));
        let result = find_dumped_commit(&mut commits, &mut snapshots).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn snapshot_source_failure_propagates() {
        let mut commits = Pager::new(MockPagedSource::new(&[&["c1"]]));
        let mut snapshots = Pager::new(FailingSource);
        let result = find_dumped_commit(&mut commits, &mut snapshots).await;
        assert!(result.is_err());
        assert_eq!(commits.pages_fetched(), 0);
    }
}
