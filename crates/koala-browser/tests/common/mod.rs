//! Shared helpers for the page integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use koala_browser::dom::{ActiveParser, DocumentId, EventDetail, EventName, EventTarget, NavigableId, WindowId};
use koala_browser::{HistoryStepApplication, NewDocument, Page, PageClient, PageConfig};
use url::Url;

/// Shared, ordered record of everything a test observed.
pub type Journal = Rc<RefCell<Vec<String>>>;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Client that writes every notification into a journal.
pub struct RecordingClient {
    pub journal: Journal,
    pub confirm_unload: bool,
}

impl PageClient for RecordingClient {
    fn page_did_finish_loading(&mut self, url: &Url) {
        self.journal.borrow_mut().push(format!("finished {url}"));
    }

    fn page_did_request_unload_confirmation(&mut self, document: DocumentId) -> bool {
        self.journal.borrow_mut().push(format!("prompt {document}"));
        self.confirm_unload
    }

    fn page_did_request_scroll_to_fragment(&mut self, document: DocumentId, fragment: Option<&str>) {
        self.journal
            .borrow_mut()
            .push(format!("scroll {document} {}", fragment.unwrap_or("-")));
    }

    fn document_became_inactive(&mut self, document: DocumentId) {
        self.journal.borrow_mut().push(format!("inactive {document}"));
    }

    fn page_did_destroy_document(&mut self, document: DocumentId) {
        self.journal.borrow_mut().push(format!("destroy {document}"));
    }
}

/// A page with the default configuration and a recording client.
pub fn recording_page() -> (Page, Journal) {
    recording_page_with(PageConfig::default(), true)
}

/// A page with a recording client answering unload prompts with `confirm_unload`.
pub fn recording_page_with(config: PageConfig, confirm_unload: bool) -> (Page, Journal) {
    init_logging();
    let journal = Journal::default();
    let client = RecordingClient {
        journal: Rc::clone(&journal),
        confirm_unload,
    };
    (Page::with_client(config, client), journal)
}

pub fn url(input: &str) -> Url {
    Url::parse(input).expect("valid test url")
}

/// Commit, activate and fully load a document for `address` in `navigable`.
pub fn load(page: &mut Page, navigable: NavigableId, address: &str) -> NewDocument {
    let new = page
        .create_document(navigable, url(address))
        .expect("document is created");
    page.activate(new.document).expect("document activates");
    let entries = page
        .navigable(navigable)
        .map(|navigable| navigable.session_history().to_vec())
        .unwrap_or_default();
    page.apply_history_step(
        new.document,
        HistoryStepApplication::new(new.entry).with_navigation_api_entries(entries),
    )
    .expect("first history step applies");
    page.finish_loading(new.document).expect("load finishes");
    let _ = page.run_until_idle();
    new
}

/// A top-level document `a` containing `b`, which contains `c`.
pub struct Tree {
    pub a: NewDocument,
    pub b: NewDocument,
    pub c: NewDocument,
    pub a_nav: NavigableId,
    pub b_nav: NavigableId,
    pub c_nav: NavigableId,
}

pub fn build_tree(page: &mut Page) -> Tree {
    let a_nav = page.create_top_level_traversable();
    let a = load(page, a_nav, "https://a.example/");
    let b_nav = page.create_child_navigable(a.document).expect("child of a");
    let b = load(page, b_nav, "https://b.example/");
    let c_nav = page.create_child_navigable(b.document).expect("child of b");
    let c = load(page, c_nav, "https://c.example/");
    Tree {
        a,
        b,
        c,
        a_nav,
        b_nav,
        c_nav,
    }
}

/// Record `name` events at `target` as "`name` `label`", with the
/// page-transition `persisted` flag appended for pagehide/pageshow.
pub fn record(page: &mut Page, journal: &Journal, target: EventTarget, name: EventName, label: &str) {
    let journal = Rc::clone(journal);
    let label = label.to_owned();
    page.add_event_listener(target, name, move |_, event| {
        let line = match event.detail() {
            EventDetail::PageTransition { persisted } => format!("{name} {label} {persisted}"),
            _ => format!("{name} {label}"),
        };
        journal.borrow_mut().push(line);
    });
}

/// Record every window-level unload-related event of `window`.
pub fn record_window(page: &mut Page, journal: &Journal, window: WindowId, label: &str) {
    for name in [EventName::PageHide, EventName::Unload] {
        record(page, journal, EventTarget::Window(window), name, label);
    }
}

/// Journal lines starting with one of `prefixes`.
pub fn lines_with(journal: &Journal, prefixes: &[&str]) -> Vec<String> {
    journal
        .borrow()
        .iter()
        .filter(|line| prefixes.iter().any(|prefix| line.starts_with(prefix)))
        .cloned()
        .collect()
}

/// Parser stand-in that remembers whether it was aborted.
pub struct FlagParser(pub Rc<Cell<bool>>);

impl ActiveParser for FlagParser {
    fn abort(&mut self) {
        self.0.set(true);
    }
}
