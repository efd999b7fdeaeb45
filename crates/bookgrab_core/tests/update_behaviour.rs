use std::collections::{BTreeMap, VecDeque};
use std::sync::Once;

use bookgrab_core::{
    update, DownloadMode, Effect, Msg, Phase, ProgressMessage, SessionStatus, StopReason,
    TraversalState,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(grab_logging::initialize_for_tests);
}

/// Scripted provider: what each traversal index shows. Missing indices are empty.
#[derive(Default)]
struct ScriptedBook {
    batches: BTreeMap<i64, (&'static str, usize)>,
}

impl ScriptedBook {
    fn with(mut self, index: i64, fingerprint: &'static str, pages: usize) -> Self {
        self.batches.insert(index, (fingerprint, pages));
        self
    }
}

#[derive(Debug, Default)]
struct Run {
    visited: Vec<i64>,
    appended: Vec<String>,
    resets: usize,
    reports: Vec<ProgressMessage>,
}

fn drive(mode: DownloadMode, book: &ScriptedBook) -> (TraversalState, Run) {
    let mut run = Run::default();
    let (mut state, effects) = update(TraversalState::new(mode), Msg::Start);
    let mut queue: VecDeque<Effect> = effects.into();
    let mut held: Option<String> = None;
    let mut steps = 0;

    while let Some(effect) = queue.pop_front() {
        steps += 1;
        assert!(steps < 1_000, "traversal did not terminate");
        let msg = match effect {
            Effect::Report(message) => {
                run.reports.push(message);
                None
            }
            Effect::Navigate { index } => {
                run.visited.push(index);
                Some(Msg::NavigationDone)
            }
            Effect::ResetNavigation => {
                run.resets += 1;
                None
            }
            Effect::AwaitReady => Some(Msg::ReadinessSettled { timed_out: false }),
            Effect::Extract => {
                let batch = book.batches.get(&state.current_index()).copied();
                held = batch.map(|(fingerprint, _)| fingerprint.to_string());
                Some(Msg::BatchExtracted {
                    fingerprint: held.clone(),
                    pages: batch.map(|(_, pages)| pages).unwrap_or(0),
                })
            }
            Effect::AppendBatch => {
                run.appended.push(held.take().expect("held batch"));
                Some(Msg::BatchAppended)
            }
            Effect::DiscardBatch => {
                held = None;
                None
            }
            Effect::Finalize => Some(Msg::Finalized),
            Effect::ReloadHost => None,
        };
        if let Some(msg) = msg {
            let (next, effects) = update(state, msg);
            state = next;
            queue.extend(effects);
        }
    }

    (state, run)
}

#[test]
fn repeated_batch_stops_without_reappending() {
    init_logging();
    let book = ScriptedBook::default()
        .with(-1, "a", 1)
        .with(1, "b", 1)
        .with(2, "c", 1)
        .with(3, "c", 1);

    let (state, run) = drive(DownloadMode::WholeBook, &book);

    assert_eq!(run.appended, vec!["a", "b", "c"]);
    assert_eq!(state.pages_appended(), 3);
    assert_eq!(state.stop_reason(), Some(StopReason::RepeatedPage));
    assert_eq!(state.status(), SessionStatus::Completed);
    assert_eq!(run.resets, 1);
}

#[test]
fn wraparound_to_first_batch_stops() {
    init_logging();
    let book = ScriptedBook::default()
        .with(-1, "a", 1)
        .with(1, "b", 1)
        .with(2, "a", 1);

    let (state, run) = drive(DownloadMode::WholeBook, &book);

    assert_eq!(run.appended, vec!["a", "b"]);
    assert_eq!(state.stop_reason(), Some(StopReason::WrappedAround));
}

#[test]
fn empty_batch_after_last_page_ends_the_book() {
    init_logging();
    let book = ScriptedBook::default()
        .with(1, "p1", 1)
        .with(2, "p2", 1)
        .with(3, "p3", 1)
        .with(4, "p4", 1)
        .with(5, "p5", 1);

    let (state, run) = drive(DownloadMode::WholeBook, &book);

    assert_eq!(run.visited, vec![-1, 1, 2, 3, 4, 5, 6]);
    assert_eq!(state.pages_appended(), 5);
    assert_eq!(state.stop_reason(), Some(StopReason::EndOfDocument));
    assert_eq!(state.phase(), Phase::Completed);
    assert_eq!(run.resets, 1);
    assert_eq!(run.reports.last(), Some(&ProgressMessage::Complete));
}

#[test]
fn sentinel_showing_first_page_does_not_end_the_walk() {
    init_logging();
    let book = ScriptedBook::default()
        .with(-1, "p1", 1)
        .with(1, "p1", 1)
        .with(2, "p2", 1);

    let (state, run) = drive(DownloadMode::WholeBook, &book);

    assert_eq!(run.appended, vec!["p1", "p2"]);
    assert_eq!(run.visited, vec![-1, 1, 2, 3]);
    assert_eq!(state.stop_reason(), Some(StopReason::EndOfDocument));
}

#[test]
fn double_page_views_advance_by_batch_size() {
    init_logging();
    let book = ScriptedBook::default()
        .with(1, "p1", 1)
        .with(2, "p2", 2)
        .with(4, "p4", 2);

    let (state, run) = drive(DownloadMode::WholeBook, &book);

    assert_eq!(run.visited, vec![-1, 1, 2, 4, 6]);
    assert_eq!(state.pages_appended(), 5);
}

#[test]
fn empty_batch_before_first_content_continues() {
    init_logging();
    let book = ScriptedBook::default().with(2, "p2", 1);

    let (state, run) = drive(DownloadMode::WholeBook, &book);

    assert_eq!(run.visited, vec![-1, 1, 2, 3]);
    assert_eq!(run.appended, vec!["p2"]);
    assert_eq!(state.status(), SessionStatus::Completed);
}

#[test]
fn current_page_mode_extracts_one_batch() {
    init_logging();
    let book = ScriptedBook::default().with(-1, "open", 2);

    let (state, run) = drive(DownloadMode::CurrentPage, &book);

    assert!(run.visited.is_empty());
    assert_eq!(run.appended, vec!["open"]);
    assert_eq!(state.pages_appended(), 2);
    assert_eq!(state.stop_reason(), Some(StopReason::SinglePage));
    assert_eq!(state.status(), SessionStatus::Completed);
    assert_eq!(run.resets, 0);
}

#[test]
fn failure_finalizes_and_reloads() {
    init_logging();
    let (state, _) = update(TraversalState::new(DownloadMode::WholeBook), Msg::Start);
    let (state, _) = update(state, Msg::NavigationDone);
    let (state, effects) = update(state, Msg::Failed);

    assert_eq!(effects, vec![Effect::Finalize, Effect::ReloadHost]);
    assert_eq!(state.status(), SessionStatus::Aborted);
    assert_eq!(state.view().phase, Phase::Aborted);
}
