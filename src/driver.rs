use std::path::{Path, PathBuf};

use chrono::Local;
use log::info;

use crate::cancel::CancelToken;
use crate::client::SearchClient;
use crate::config;
use crate::error::ScalperError;
use crate::memory::{HistoryStore, ResourceKind, SearchRecord};
use crate::pacing::Pacing;
use crate::sink::RecordSink;

/// How a run ended. Interruption is not an error: whatever was fetched has
/// been saved and recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Interrupted,
}

#[derive(Debug)]
pub struct RunSummary {
    pub outcome: Outcome,
    pub rows: u64,
    pub file: PathBuf,
}

/// Progress reporting injected into the run, so tests can observe it and
/// the binary can route it through the log.
pub trait Reporter {
    fn page_done(&self, page: u32, items: usize);
    fn completed(&self, rows: u64, file: &Path);
    fn interrupted(&self, rows: u64, file: &Path);
}

pub struct LogReporter;

impl Reporter for LogReporter {
    fn page_done(&self, page: u32, items: usize) {
        info!("Page {} done with {} results", page, items);
    }

    fn completed(&self, rows: u64, file: &Path) {
        info!("Saved {} results to {}", rows, file.display());
    }

    fn interrupted(&self, rows: u64, file: &Path) {
        info!("Interrupted by user. Saved {} results to {}", rows, file.display());
    }
}

/// Drives one search run: fetch a page, stream its rows out, pace, repeat
/// until the source is exhausted or the user interrupts. Appends exactly
/// one history record when at least one row was written.
pub struct SearchRun<'a> {
    client: &'a dyn SearchClient,
    store: &'a HistoryStore,
    reporter: &'a dyn Reporter,
    kind: ResourceKind,
    pacing: Pacing,
    page_size: usize,
    sort_by: &'a str,
}

impl<'a> SearchRun<'a> {
    pub fn new(
        client: &'a dyn SearchClient,
        store: &'a HistoryStore,
        reporter: &'a dyn Reporter,
        kind: ResourceKind,
    ) -> Self {
        SearchRun {
            client,
            store,
            reporter,
            kind,
            pacing: kind.pacing(),
            page_size: config::PAGE_SIZE,
            sort_by: config::SORT_BY,
        }
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn execute(
        &self,
        term: &str,
        out_dir: &Path,
        cancel: &CancelToken,
    ) -> Result<RunSummary, ScalperError> {
        // Corrupt history aborts before any request is made.
        let mut memory = self.store.load()?;

        let file_name = format!(
            "{}-{}.csv",
            self.kind.label(),
            Local::now().format("%Y%m%d-%H%M%S")
        );
        let path = out_dir.join(&file_name);

        // The file always exists with its header, even for zero results,
        // so a run never leaves a headerless or absent output behind.
        let mut sink = RecordSink::create(&path)?;
        sink.write_header(self.client.columns())?;

        let mut page: u32 = 1;
        let mut rows: u64 = 0;
        let outcome = loop {
            if cancel.is_cancelled() {
                break Outcome::Interrupted;
            }

            let items = self
                .client
                .fetch_page(term, page, self.page_size, self.sort_by)?;
            if items.is_empty() {
                break Outcome::Completed;
            }

            // A cancellation arriving from here on is honored only after
            // this page's rows are all on disk.
            let received = items.len();
            for item in items {
                if let Some(fields) = item {
                    sink.write_row(&fields)?;
                    rows += 1;
                }
            }
            self.reporter.page_done(page, received);

            // Short page: the source has no further results.
            if received < self.page_size {
                break Outcome::Completed;
            }

            page += 1;
            self.pacing.wait(cancel);
        };
        sink.finish()?;

        match outcome {
            Outcome::Completed => self.reporter.completed(rows, &path),
            Outcome::Interrupted => self.reporter.interrupted(rows, &path),
        }

        if rows > 0 {
            memory.append(self.kind, SearchRecord::now(term, &file_name, rows));
            self.store.persist(&memory)?;
            info!("Memory JSON file updated");
        }

        Ok(RunSummary {
            outcome,
            rows,
            file: path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Page, KERNEL_FIELDS};
    use std::cell::{Cell, RefCell};
    use tempfile::tempdir;

    struct FakeClient {
        pages: RefCell<Vec<Page>>,
        calls: Cell<usize>,
        // Cancel this token while serving the nth fetch (1-based).
        cancel_on_call: Option<(usize, CancelToken)>,
        // Fail the nth fetch instead of answering.
        fail_on_call: Option<usize>,
    }

    impl FakeClient {
        fn new(pages: Vec<Page>) -> Self {
            FakeClient {
                pages: RefCell::new(pages),
                calls: Cell::new(0),
                cancel_on_call: None,
                fail_on_call: None,
            }
        }
    }

    impl SearchClient for FakeClient {
        fn columns(&self) -> &'static [&'static str] {
            &KERNEL_FIELDS
        }

        fn fetch_page(
            &self,
            _term: &str,
            _page: u32,
            _page_size: usize,
            _sort_by: &str,
        ) -> Result<Page, ScalperError> {
            let call = self.calls.get() + 1;
            self.calls.set(call);

            if self.fail_on_call == Some(call) {
                return Err(ScalperError::ApiStatus(
                    reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                ));
            }
            if let Some((at, token)) = &self.cancel_on_call {
                if *at == call {
                    token.cancel();
                }
            }

            let mut pages = self.pages.borrow_mut();
            if pages.is_empty() {
                Ok(Vec::new())
            } else {
                Ok(pages.remove(0))
            }
        }
    }

    struct NullReporter;

    impl Reporter for NullReporter {
        fn page_done(&self, _page: u32, _items: usize) {}
        fn completed(&self, _rows: u64, _file: &Path) {}
        fn interrupted(&self, _rows: u64, _file: &Path) {}
    }

    fn item(reference: &str) -> Option<Vec<String>> {
        Some(vec![
            reference.to_string(),
            "Title".to_string(),
            "Author".to_string(),
            "2024-03-01T10:00:00Z".to_string(),
            "5".to_string(),
        ])
    }

    fn run_with<'a>(
        client: &'a FakeClient,
        store: &'a HistoryStore,
        page_size: usize,
    ) -> SearchRun<'a> {
        static REPORTER: NullReporter = NullReporter;
        SearchRun::new(client, store, &REPORTER, ResourceKind::Kernels)
            .with_pacing(Pacing::none())
            .with_page_size(page_size)
    }

    fn data_lines(file: &Path) -> Vec<String> {
        let content = std::fs::read_to_string(file).expect("read output");
        content.lines().skip(1).map(str::to_string).collect()
    }

    #[test]
    fn rows_match_non_null_items_and_recorded_amount() {
        let dir = tempdir().expect("tempdir");
        let store = HistoryStore::new(dir.path());
        let client = FakeClient::new(vec![
            vec![item("a/1"), None, item("a/2")],
            vec![item("a/3")],
        ]);

        let summary = run_with(&client, &store, 3)
            .execute("cnn", dir.path(), &CancelToken::new())
            .expect("execute");

        assert_eq!(summary.outcome, Outcome::Completed);
        assert_eq!(summary.rows, 3);
        assert_eq!(client.calls.get(), 2);
        assert_eq!(data_lines(&summary.file).len(), 3);

        let memory = store.load().expect("load");
        let search = &memory.history(ResourceKind::Kernels).search;
        assert_eq!(search.len(), 1);
        assert_eq!(search[0].amount, 3);
        assert_eq!(search[0].search_str, "cnn");
        assert_eq!(
            search[0].file_name,
            summary.file.file_name().unwrap().to_str().unwrap()
        );
    }

    #[test]
    fn empty_first_page_leaves_header_only_file_and_no_record() {
        let dir = tempdir().expect("tempdir");
        let store = HistoryStore::new(dir.path());
        let client = FakeClient::new(vec![]);

        let summary = run_with(&client, &store, 100)
            .execute("nothing", dir.path(), &CancelToken::new())
            .expect("execute");

        assert_eq!(summary.outcome, Outcome::Completed);
        assert_eq!(summary.rows, 0);
        let content = std::fs::read_to_string(&summary.file).expect("read output");
        assert_eq!(content.lines().count(), 1);
        assert!(content.starts_with("ref,title,author,lastRunTime,totalVotes"));

        let memory = store.load().expect("load");
        assert!(memory.history(ResourceKind::Kernels).search.is_empty());
    }

    #[test]
    fn short_page_stops_without_another_fetch() {
        let dir = tempdir().expect("tempdir");
        let store = HistoryStore::new(dir.path());
        let client = FakeClient::new(vec![vec![item("a/1"), item("a/2")]]);

        let summary = run_with(&client, &store, 100)
            .execute("cnn", dir.path(), &CancelToken::new())
            .expect("execute");

        assert_eq!(summary.outcome, Outcome::Completed);
        assert_eq!(client.calls.get(), 1);
        assert_eq!(summary.rows, 2);
    }

    #[test]
    fn interruption_preserves_rows_and_appends_one_record() {
        let dir = tempdir().expect("tempdir");
        let store = HistoryStore::new(dir.path());
        let cancel = CancelToken::new();

        // Page 1 is full, so the run would normally keep going; the signal
        // lands while it is being fetched.
        let mut client = FakeClient::new(vec![
            vec![item("a/1"), item("a/2")],
            vec![item("a/3"), item("a/4")],
        ]);
        client.cancel_on_call = Some((1, cancel.clone()));

        let summary = run_with(&client, &store, 2)
            .execute("cnn", dir.path(), &cancel)
            .expect("execute");

        assert_eq!(summary.outcome, Outcome::Interrupted);
        assert_eq!(summary.rows, 2);
        assert_eq!(client.calls.get(), 1);
        assert_eq!(data_lines(&summary.file).len(), 2);

        let memory = store.load().expect("load");
        let search = &memory.history(ResourceKind::Kernels).search;
        assert_eq!(search.len(), 1);
        assert_eq!(search[0].amount, 2);
    }

    #[test]
    fn interruption_before_any_row_skips_history() {
        let dir = tempdir().expect("tempdir");
        let store = HistoryStore::new(dir.path());
        let cancel = CancelToken::new();
        cancel.cancel();

        let client = FakeClient::new(vec![vec![item("a/1")]]);
        let summary = run_with(&client, &store, 100)
            .execute("cnn", dir.path(), &cancel)
            .expect("execute");

        assert_eq!(summary.outcome, Outcome::Interrupted);
        assert_eq!(summary.rows, 0);
        assert_eq!(client.calls.get(), 0);

        let memory = store.load().expect("load");
        assert!(memory.history(ResourceKind::Kernels).search.is_empty());
    }

    #[test]
    fn failed_fetch_aborts_without_history_append() {
        let dir = tempdir().expect("tempdir");
        let store = HistoryStore::new(dir.path());

        let mut client = FakeClient::new(vec![vec![item("a/1"), item("a/2")]]);
        client.fail_on_call = Some(2);

        let result = run_with(&client, &store, 2).execute("cnn", dir.path(), &CancelToken::new());
        assert!(matches!(result, Err(ScalperError::ApiStatus(_))));

        // Rows flushed before the failure survive on disk.
        let output = std::fs::read_dir(dir.path())
            .expect("read dir")
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .find(|p| p.extension().map_or(false, |ext| ext == "csv"))
            .expect("output file");
        assert_eq!(data_lines(&output).len(), 2);

        let memory = store.load().expect("load");
        assert!(memory.history(ResourceKind::Kernels).search.is_empty());
    }

    #[test]
    fn sequential_runs_append_in_order() {
        let dir = tempdir().expect("tempdir");
        let store = HistoryStore::new(dir.path());

        let client = FakeClient::new(vec![vec![item("a/1")]]);
        run_with(&client, &store, 100)
            .execute("first", dir.path(), &CancelToken::new())
            .expect("first run");

        let client = FakeClient::new(vec![vec![item("b/1"), item("b/2")]]);
        run_with(&client, &store, 100)
            .execute("second", dir.path(), &CancelToken::new())
            .expect("second run");

        let memory = store.load().expect("load");
        let search = &memory.history(ResourceKind::Kernels).search;
        assert_eq!(search.len(), 2);
        assert_eq!(
            (search[0].search_str.as_str(), search[0].amount),
            ("first", 1)
        );
        assert_eq!(
            (search[1].search_str.as_str(), search[1].amount),
            ("second", 2)
        );
    }
}
