//! Integration tests for applying session history steps.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;
use common::{Journal, lines_with, load, record, recording_page, url};
use koala_browser::dom::{Document, EventDetail, EventName, EventTarget, HistoryEntryId, WindowId};
use koala_browser::html::NavigationType;
use koala_browser::{HistoryStepApplication, LifecycleError, NewDocument, Page};
use serde_json::{Value, json};

/// Journal `popstate`, `hashchange` and `currententrychange` at `window`,
/// including the interesting parts of their details.
fn record_history_events(page: &mut Page, journal: &Journal, window: WindowId) {
    for name in [EventName::PopState, EventName::HashChange, EventName::CurrentEntryChange] {
        let journal = Rc::clone(journal);
        page.add_event_listener(EventTarget::Window(window), name, move |_, event| {
            let line = match event.detail() {
                EventDetail::PopState { state } => format!("{name} {state}"),
                EventDetail::HashChange { old_url, new_url } => {
                    format!("{name} {old_url} -> {new_url}")
                }
                _ => format!("{name}"),
            };
            journal.borrow_mut().push(line);
        });
    }
}

/// Load `address` and append a second entry for `next` to its navigable.
fn loaded_with_next_entry(page: &mut Page, address: &str, next: &str) -> (NewDocument, HistoryEntryId) {
    let top = page.create_top_level_traversable();
    let new = load(page, top, address);
    let entry = page
        .push_session_history_entry(top, url(next))
        .expect("navigable exists");
    (new, entry)
}

#[test]
fn test_first_step_initializes_new_document() -> Result<()> {
    let (mut page, journal) = recording_page();
    let top = page.create_top_level_traversable();
    let new = page.create_document(top, url("https://example.com/#intro"))?;
    page.activate(new.document)?;
    record_history_events(&mut page, &journal, new.window);

    page.apply_history_step(
        new.document,
        HistoryStepApplication::new(new.entry).with_navigation_api_entries(vec![new.entry]),
    )?;

    assert_eq!(*journal.borrow(), [format!("scroll {} intro", new.document)]);
    let doc = page.document(new.document).expect("exists");
    assert_eq!(doc.latest_entry(), Some(new.entry));
    assert!(doc.is_ready_to_run_scripts());
    assert!(page.can_run_scripts(new.document));

    let window = page.window(new.window).expect("exists");
    assert_eq!(window.navigation.entries(), [new.entry]);
    assert_eq!(window.navigation.current_entry(), Some(new.entry));
    assert_eq!(window.history.length, 1);
    assert_eq!(window.history.index, 0);
    assert_eq!(window.history.state, Value::Null);

    let entry = page.history_entry(new.entry).expect("exists");
    assert_eq!(entry.document_state.document, Some(new.document));
    assert!(entry.document_state.ever_populated);
    assert_eq!(page.navigable(top).and_then(|nav| nav.active_entry()), Some(new.entry));
    Ok(())
}

#[test]
fn test_first_step_without_fragment_scrolls_to_top() -> Result<()> {
    let (mut page, journal) = recording_page();
    let top = page.create_top_level_traversable();
    let new = load(&mut page, top, "https://example.com/");

    assert_eq!(lines_with(&journal, &["scroll"]), [format!("scroll {} -", new.document)]);
    Ok(())
}

#[test]
fn test_first_step_needs_navigation_entries() -> Result<()> {
    let (mut page, journal) = recording_page();
    let top = page.create_top_level_traversable();
    let new = page.create_document(top, url("https://example.com/"))?;

    let result = page.apply_history_step(new.document, HistoryStepApplication::new(new.entry));

    assert!(matches!(result, Err(LifecycleError::MissingNavigationEntries(_))));
    assert_eq!(page.document(new.document).and_then(Document::latest_entry), None);
    assert!(!page.document(new.document).expect("exists").is_ready_to_run_scripts());
    assert!(journal.borrow().is_empty());
    Ok(())
}

#[test]
fn test_parked_scripts_run_after_first_step() -> Result<()> {
    let (mut page, _journal) = recording_page();
    let top = page.create_top_level_traversable();
    let new = page.create_document(top, url("https://example.com/"))?;
    page.activate(new.document)?;

    let ran: Rc<RefCell<Vec<&str>>> = Rc::default();
    let log = Rc::clone(&ran);
    page.queue_script(new.document, move |_| log.borrow_mut().push("script"))?;
    assert_eq!(page.parked_script_count(), 1);

    page.apply_history_step(
        new.document,
        HistoryStepApplication::new(new.entry).with_navigation_api_entries(vec![new.entry]),
    )?;
    assert_eq!(page.parked_script_count(), 0);
    assert!(ran.borrow().is_empty());

    let _ = page.run_until_idle();
    assert_eq!(*ran.borrow(), ["script"]);
    Ok(())
}

#[test]
fn test_fragment_step_fires_popstate_then_hashchange() -> Result<()> {
    let (mut page, journal) = recording_page();
    let (new, next) =
        loaded_with_next_entry(&mut page, "https://example.com/page", "https://example.com/page#two");
    record_history_events(&mut page, &journal, new.window);
    journal.borrow_mut().clear();

    page.apply_history_step(
        new.document,
        HistoryStepApplication::new(next)
            .with_navigation_type(NavigationType::Push)
            .with_script_history(2, 1),
    )?;

    // popstate is synchronous; hashchange waits for a task.
    assert_eq!(*journal.borrow(), ["currententrychange", "popstate null"]);

    let _ = page.run_until_idle();
    assert_eq!(
        lines_with(&journal, &["hashchange"]),
        ["hashchange https://example.com/page -> https://example.com/page#two"]
    );

    let doc = page.document(new.document).expect("exists");
    assert_eq!(doc.url().as_str(), "https://example.com/page#two");
    assert_eq!(doc.latest_entry(), Some(next));
    let window = page.window(new.window).expect("exists");
    assert_eq!(window.history.length, 2);
    assert_eq!(window.history.index, 1);
    assert_eq!(window.navigation.entries(), [new.entry, next]);
    assert_eq!(window.navigation.current_entry(), Some(next));
    Ok(())
}

#[test]
fn test_path_step_fires_no_hashchange() -> Result<()> {
    let (mut page, journal) = recording_page();
    let (new, next) =
        loaded_with_next_entry(&mut page, "https://example.com/one", "https://example.com/two");
    record_history_events(&mut page, &journal, new.window);

    page.apply_history_step(
        new.document,
        HistoryStepApplication::new(next).with_navigation_type(NavigationType::Push),
    )?;
    let _ = page.run_until_idle();

    assert_eq!(lines_with(&journal, &["popstate"]).len(), 1);
    assert!(lines_with(&journal, &["hashchange"]).is_empty());
    Ok(())
}

#[test]
fn test_step_restores_classic_history_state() -> Result<()> {
    let (mut page, journal) = recording_page();
    let (new, next) =
        loaded_with_next_entry(&mut page, "https://example.com/", "https://example.com/?page=2");
    page.history_entry_mut(next)
        .expect("exists")
        .set_classic_history_api_state(&json!({ "page": 2 }))?;
    record_history_events(&mut page, &journal, new.window);

    page.apply_history_step(
        new.document,
        HistoryStepApplication::new(next).with_navigation_type(NavigationType::Replace),
    )?;

    assert_eq!(
        page.window(new.window).map(|window| window.history.state.clone()),
        Some(json!({ "page": 2 }))
    );
    assert_eq!(lines_with(&journal, &["popstate"]), [r#"popstate {"page":2}"#]);
    assert_eq!(
        page.window(new.window).map(|window| window.navigation.entries().to_vec()),
        Some(vec![next])
    );
    Ok(())
}

#[test]
fn test_changed_entry_needs_navigation_type() -> Result<()> {
    let (mut page, journal) = recording_page();
    let (new, next) =
        loaded_with_next_entry(&mut page, "https://example.com/", "https://example.com/#later");
    record_history_events(&mut page, &journal, new.window);

    let result = page.apply_history_step(
        new.document,
        HistoryStepApplication::new(next).with_script_history(2, 1),
    );

    assert!(matches!(result, Err(LifecycleError::MissingNavigationType(_))));
    let doc = page.document(new.document).expect("exists");
    assert_eq!(doc.latest_entry(), Some(new.entry));
    assert_eq!(doc.url().as_str(), "https://example.com/");
    assert_eq!(page.window(new.window).map(|window| window.history.length), Some(1));
    assert!(lines_with(&journal, &["popstate"]).is_empty());
    Ok(())
}

#[test]
fn test_unchanged_entry_fires_nothing() -> Result<()> {
    let (mut page, journal) = recording_page();
    let top = page.create_top_level_traversable();
    let new = load(&mut page, top, "https://example.com/#a");
    record_history_events(&mut page, &journal, new.window);
    journal.borrow_mut().clear();

    page.apply_history_step(new.document, HistoryStepApplication::new(new.entry).with_script_history(3, 2))?;
    page.apply_history_step(new.document, HistoryStepApplication::new(new.entry).without_reactivation())?;
    let _ = page.run_until_idle();

    assert!(journal.borrow().is_empty());
    assert_eq!(page.window(new.window).map(|window| window.history.length), Some(1));
    Ok(())
}

#[test]
fn test_unknown_entry_is_rejected() -> Result<()> {
    let (mut page, _journal) = recording_page();
    let top = page.create_top_level_traversable();
    let new = load(&mut page, top, "https://example.com/");

    let result = page.apply_history_step(new.document, HistoryStepApplication::new(HistoryEntryId(999)));

    assert!(matches!(result, Err(LifecycleError::UnknownHistoryEntry(HistoryEntryId(999)))));
    Ok(())
}

#[test]
fn test_step_into_destroyed_document_is_rejected() -> Result<()> {
    let (mut page, _journal) = recording_page();
    let top = page.create_top_level_traversable();
    let new = load(&mut page, top, "https://example.com/");
    page.destroy(new.document)?;

    let result = page.apply_history_step(new.document, HistoryStepApplication::new(new.entry));

    assert!(matches!(result, Err(LifecycleError::DocumentDestroyed(_))));
    Ok(())
}

#[test]
fn test_hashchange_dropped_when_document_destroyed() -> Result<()> {
    let (mut page, journal) = recording_page();
    let (new, next) =
        loaded_with_next_entry(&mut page, "https://example.com/", "https://example.com/#gone");
    record(
        &mut page,
        &journal,
        EventTarget::Window(new.window),
        EventName::HashChange,
        "doc",
    );

    page.apply_history_step(
        new.document,
        HistoryStepApplication::new(next).with_navigation_type(NavigationType::Push),
    )?;
    page.destroy(new.document)?;
    let _ = page.run_until_idle();

    assert!(lines_with(&journal, &["hashchange"]).is_empty());
    Ok(())
}
