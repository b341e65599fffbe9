//! Integration tests for page construction, configuration, loading and
//! visibility.

mod common;

use std::cell::Cell;
use std::rc::Rc;

use anyhow::Result;
use common::{FlagParser, build_tree, lines_with, load, record, recording_page, url};
use koala_browser::dom::{Document, DocumentId, DocumentReadyState, EventName, EventTarget, VisibilityState};
use koala_browser::html::Navigable;
use koala_browser::{ConfigError, HistoryStepApplication, LifecycleError, Page, PageConfig};

#[test]
fn test_config_defaults() -> Result<()> {
    let config = PageConfig::from_json("{}")?;
    assert_eq!(config, PageConfig::default());
    assert!(!config.back_forward_cache);
    assert!(config.unload_prompts);
    Ok(())
}

#[test]
fn test_config_overrides() -> Result<()> {
    let config = PageConfig::from_json(r#"{ "back_forward_cache": true, "unload_prompts": false }"#)?;
    assert!(config.back_forward_cache);
    assert!(!config.unload_prompts);
    Ok(())
}

#[test]
fn test_config_rejects_bad_input() {
    assert!(matches!(PageConfig::from_json("not json"), Err(ConfigError::Parse(_))));
    assert!(matches!(
        PageConfig::from_json(r#"{ "bfcache": true }"#),
        Err(ConfigError::Parse(_))
    ));
    assert!(matches!(
        PageConfig::from_json(r#"{ "unload_prompts": "yes" }"#),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_new_page_is_empty() {
    let page = Page::new(PageConfig::default());
    assert_eq!(page.navigable_count(), 0);
    assert_eq!(page.document_count(), 0);
    assert_eq!(page.pending_task_count(), 0);
    assert_eq!(page.termination_nesting_level(), 0);
}

#[test]
fn test_create_document_is_not_active() -> Result<()> {
    let (mut page, _journal) = recording_page();
    let top = page.create_top_level_traversable();
    let new = page.create_document(top, url("https://example.com/"))?;

    let doc = page.document(new.document).expect("exists");
    assert_eq!(doc.window(), Some(new.window));
    assert_eq!(doc.navigable(), Some(top));
    assert_eq!(doc.readiness(), DocumentReadyState::Loading);
    assert!(doc.is_salvageable());
    assert_eq!(page.navigable(top).and_then(Navigable::active_document), None);
    assert_eq!(page.navigable(top).map(Navigable::session_history), Some(&[new.entry][..]));
    assert!(!page.is_top_level_active_document(new.document));
    Ok(())
}

#[test]
fn test_child_navigable_needs_live_container() -> Result<()> {
    let (mut page, _journal) = recording_page();
    let top = page.create_top_level_traversable();
    let new = load(&mut page, top, "https://example.com/");
    assert!(matches!(
        page.create_child_navigable(DocumentId(77)),
        Err(LifecycleError::UnknownDocument(_))
    ));

    page.destroy(new.document)?;
    assert!(matches!(
        page.create_child_navigable(new.document),
        Err(LifecycleError::DocumentDestroyed(_))
    ));
    Ok(())
}

#[test]
fn test_descendant_navigables_in_tree_order() {
    let (mut page, _journal) = recording_page();
    let tree = build_tree(&mut page);

    assert_eq!(page.descendant_navigables(tree.a.document), [tree.b_nav, tree.c_nav]);
    assert_eq!(
        page.inclusive_descendant_navigables(tree.b.document),
        [tree.b_nav, tree.c_nav]
    );
    assert_eq!(page.child_navigables(tree.a.document), [tree.b_nav]);
    assert_eq!(page.traversable_of(tree.c_nav), Some(tree.a_nav));
    assert!(page.is_top_level_active_document(tree.a.document));
    assert!(!page.is_top_level_active_document(tree.b.document));
}

#[test]
fn test_finish_loading_event_order() -> Result<()> {
    let (mut page, journal) = recording_page();
    let top = page.create_top_level_traversable();
    let new = page.create_document(top, url("https://example.com/"))?;
    page.activate(new.document)?;
    page.apply_history_step(
        new.document,
        HistoryStepApplication::new(new.entry).with_navigation_api_entries(vec![new.entry]),
    )?;
    page.set_active_parser(new.document, Box::new(FlagParser(Rc::default())))?;
    let _ = page.begin_navigation(top)?;
    record(
        &mut page,
        &journal,
        EventTarget::Document(new.document),
        EventName::ReadyStateChange,
        "doc",
    );
    for name in [EventName::Load, EventName::PageShow] {
        record(&mut page, &journal, EventTarget::Window(new.window), name, "doc");
    }
    journal.borrow_mut().clear();

    page.finish_loading(new.document)?;
    assert_eq!(*journal.borrow(), ["readystatechange doc"]);
    assert_eq!(
        page.document(new.document).map(Document::readiness),
        Some(DocumentReadyState::Interactive)
    );

    let _ = page.run_until_idle();
    assert_eq!(
        *journal.borrow(),
        [
            "readystatechange doc",
            "readystatechange doc",
            "finished https://example.com/",
            "load doc",
            "pageshow doc false",
        ]
    );

    let doc = page.document(new.document).expect("exists");
    assert_eq!(doc.readiness(), DocumentReadyState::Complete);
    assert!(!doc.has_active_parser());
    assert!(!doc.active_parser_was_aborted());
    assert!(doc.is_page_showing());
    assert!(doc.is_completely_loaded());
    assert_eq!(doc.navigation_id(), None);
    assert!(doc.load_timing_info().dom_interactive_time.is_some());
    assert!(doc.load_timing_info().dom_complete_time.is_some());
    Ok(())
}

#[test]
fn test_load_without_parser_records_no_timing() -> Result<()> {
    let (mut page, _journal) = recording_page();
    let top = page.create_top_level_traversable();
    let new = load(&mut page, top, "https://example.com/");

    let doc = page.document(new.document).expect("exists");
    assert!(doc.is_completely_loaded());
    assert_eq!(doc.load_timing_info().dom_complete_time, None);
    Ok(())
}

#[test]
fn test_child_load_fires_load_at_container() -> Result<()> {
    let (mut page, journal) = recording_page();
    let top = page.create_top_level_traversable();
    let parent = load(&mut page, top, "https://example.com/");
    let child_nav = page.create_child_navigable(parent.document)?;
    record(
        &mut page,
        &journal,
        EventTarget::Container(child_nav),
        EventName::Load,
        "iframe",
    );

    let child = load(&mut page, child_nav, "https://frame.example/");

    assert_eq!(lines_with(&journal, &["load"]), ["load iframe"]);
    // Only the top-level document reports "finished loading" right away.
    assert!(!lines_with(&journal, &["finished"]).contains(&"finished https://frame.example/".to_owned()));
    assert!(page.document(child.document).expect("exists").is_completely_loaded());
    Ok(())
}

#[test]
fn test_system_visibility_updates_every_document() -> Result<()> {
    let (mut page, journal) = recording_page();
    let tree = build_tree(&mut page);
    for (document, label) in [(tree.a.document, "A"), (tree.b.document, "B"), (tree.c.document, "C")] {
        record(
            &mut page,
            &journal,
            EventTarget::Document(document),
            EventName::VisibilityChange,
            label,
        );
    }

    page.set_system_visibility_state(tree.a_nav, VisibilityState::Hidden)?;
    assert!(lines_with(&journal, &["visibilitychange"]).is_empty());

    let _ = page.run_until_idle();
    assert_eq!(
        lines_with(&journal, &["visibilitychange"]),
        ["visibilitychange A", "visibilitychange B", "visibilitychange C"]
    );
    for document in [tree.a.document, tree.b.document, tree.c.document] {
        assert_eq!(
            page.document(document).map(Document::visibility_state),
            Some(VisibilityState::Hidden)
        );
    }

    // Same state again: nothing queued.
    page.set_system_visibility_state(tree.a_nav, VisibilityState::Hidden)?;
    assert_eq!(page.pending_task_count(), 0);
    Ok(())
}

#[test]
fn test_system_visibility_needs_traversable() {
    let (mut page, _journal) = recording_page();
    let tree = build_tree(&mut page);

    assert!(matches!(
        page.set_system_visibility_state(tree.b_nav, VisibilityState::Hidden),
        Err(LifecycleError::NotTraversable(_))
    ));
}

#[test]
fn test_scripts_run_once_document_is_ready() -> Result<()> {
    let (mut page, _journal) = recording_page();
    let top = page.create_top_level_traversable();
    let new = load(&mut page, top, "https://example.com/");

    let ran = Rc::new(Cell::new(0));
    let counter = Rc::clone(&ran);
    page.queue_script(new.document, move |_| counter.set(counter.get() + 1))?;
    assert_eq!(page.parked_script_count(), 0);
    assert_eq!(page.pending_task_count(), 1);

    let _ = page.run_until_idle();
    assert_eq!(ran.get(), 1);
    Ok(())
}

#[test]
fn test_parked_scripts_discarded_on_destroy() -> Result<()> {
    let (mut page, _journal) = recording_page();
    let top = page.create_top_level_traversable();
    let new = page.create_document(top, url("https://example.com/"))?;
    let ran = Rc::new(Cell::new(false));
    let flag = Rc::clone(&ran);
    page.queue_script(new.document, move |_| flag.set(true))?;

    page.destroy(new.document)?;
    let _ = page.run_until_idle();

    assert_eq!(page.parked_script_count(), 0);
    assert!(!ran.get());
    assert!(matches!(
        page.queue_script(new.document, |_| {}),
        Err(LifecycleError::DocumentDestroyed(_))
    ));
    Ok(())
}

#[test]
fn test_message_channel_disentangled_with_either_side() -> Result<()> {
    let (mut page, _journal) = recording_page();
    let tree = build_tree(&mut page);
    let (outer, inner) = page.create_message_channel(tree.a.window, tree.c.window)?;
    assert_eq!(page.message_port(outer).and_then(|port| port.entangled_port()), Some(inner));
    assert_eq!(page.message_port(inner).and_then(|port| port.entangled_port()), Some(outer));

    page.destroy(tree.c.document)?;

    assert_eq!(page.message_port(outer).and_then(|port| port.entangled_port()), None);
    assert_eq!(page.message_port(inner).and_then(|port| port.entangled_port()), None);
    Ok(())
}

#[test]
fn test_begin_navigation_supersedes_previous() -> Result<()> {
    let (mut page, _journal) = recording_page();
    let top = page.create_top_level_traversable();
    let new = load(&mut page, top, "https://example.com/");

    let first = page.begin_navigation(top)?;
    let second = page.begin_navigation(top)?;

    assert_ne!(first, second);
    assert_eq!(page.navigable(top).and_then(Navigable::ongoing_navigation), Some(second));
    assert_eq!(page.document(new.document).and_then(Document::navigation_id), Some(second));
    assert!(matches!(
        page.begin_navigation(koala_browser::dom::NavigableId(99)),
        Err(LifecycleError::UnknownNavigable(_))
    ));
    Ok(())
}

#[test]
fn test_begin_navigation_refused_during_unload() -> Result<()> {
    let (mut page, _journal) = recording_page();
    let top = page.create_top_level_traversable();
    let new = load(&mut page, top, "https://example.com/");

    let refused = Rc::new(Cell::new(false));
    let flag = Rc::clone(&refused);
    page.add_event_listener(EventTarget::Window(new.window), EventName::Unload, move |page, _| {
        flag.set(matches!(
            page.begin_navigation(top),
            Err(LifecycleError::UnloadInProgress(_))
        ));
    });

    page.unload(new.document, None)?;

    assert!(refused.get());
    assert_eq!(page.navigable(top).and_then(Navigable::ongoing_navigation), None);
    Ok(())
}

#[test]
fn test_simple_dialogs() -> Result<()> {
    let (mut page, _journal) = recording_page();
    let top = page.create_top_level_traversable();
    let new = load(&mut page, top, "https://example.com/");

    assert!(page.may_show_simple_dialog(new.window)?);
    page.set_sandboxed_modals(new.document, true)?;
    assert!(!page.may_show_simple_dialog(new.window)?);

    page.destroy(new.document)?;
    assert!(matches!(
        page.may_show_simple_dialog(new.window),
        Err(LifecycleError::UnknownWindow(_))
    ));
    Ok(())
}

#[test]
fn test_document_setup_rejects_destroyed_documents() -> Result<()> {
    let (mut page, _journal) = recording_page();
    let top = page.create_top_level_traversable();
    let new = load(&mut page, top, "https://example.com/");
    page.destroy(new.document)?;

    assert!(matches!(
        page.set_sandboxed_modals(new.document, true),
        Err(LifecycleError::DocumentDestroyed(_))
    ));
    assert!(matches!(
        page.set_active_parser(new.document, Box::new(FlagParser(Rc::default()))),
        Err(LifecycleError::DocumentDestroyed(_))
    ));
    assert!(!page.document(new.document).expect("tombstone kept").has_active_parser());
    Ok(())
}

#[test]
fn test_user_activation_is_sticky() -> Result<()> {
    let (mut page, _journal) = recording_page();
    let top = page.create_top_level_traversable();
    let new = load(&mut page, top, "https://example.com/");

    assert!(!page.window(new.window).expect("exists").has_sticky_activation());
    page.notify_user_activation(new.window)?;
    assert!(page.window(new.window).expect("exists").has_sticky_activation());
    Ok(())
}
