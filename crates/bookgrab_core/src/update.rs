use crate::state::{next_index, StopReason, FIRST_CONTENT_INDEX, SENTINEL_INDEX};
use crate::{DownloadMode, Effect, Msg, Phase, ProgressMessage, TraversalState};

/// Pure update function: applies a message to the traversal and returns the
/// effects the runner has to perform next.
pub fn update(mut state: TraversalState, msg: Msg) -> (TraversalState, Vec<Effect>) {
    if state.phase().is_terminal() {
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::Start => match (state.phase(), state.mode()) {
            (Phase::Init, DownloadMode::WholeBook) => {
                state.start();
                state.set_phase(Phase::Navigate(SENTINEL_INDEX));
                vec![
                    Effect::Report(ProgressMessage::StartBook),
                    Effect::Report(ProgressMessage::LoadNextPage),
                    Effect::Navigate {
                        index: SENTINEL_INDEX,
                    },
                ]
            }
            (Phase::Init, DownloadMode::CurrentPage) => {
                state.start();
                state.set_phase(Phase::Extract);
                vec![
                    Effect::Report(ProgressMessage::DownloadingCurrentPage),
                    Effect::Extract,
                ]
            }
            _ => Vec::new(),
        },
        Msg::NavigationDone => {
            if matches!(state.phase(), Phase::Navigate(_)) {
                state.set_phase(Phase::AwaitReady);
                vec![Effect::AwaitReady]
            } else {
                Vec::new()
            }
        }
        Msg::ReadinessSettled { .. } => {
            if state.phase() == Phase::AwaitReady {
                state.set_phase(Phase::Extract);
                vec![Effect::Extract]
            } else {
                Vec::new()
            }
        }
        Msg::BatchExtracted { fingerprint, pages } => {
            if state.phase() == Phase::Extract {
                state.set_phase(Phase::Decide);
                decide(&mut state, fingerprint.filter(|_| pages > 0), pages)
            } else {
                Vec::new()
            }
        }
        Msg::BatchAppended => {
            if state.phase() == Phase::Decide {
                let pages = state.commit_batch();
                match state.mode() {
                    DownloadMode::CurrentPage => terminate(&mut state, StopReason::SinglePage, false),
                    DownloadMode::WholeBook => {
                        let next = next_index(state.current_index(), pages);
                        advance(&mut state, next)
                    }
                }
            } else {
                Vec::new()
            }
        }
        Msg::Finalized => {
            if state.phase() == Phase::Terminate {
                state.complete();
                vec![Effect::Report(ProgressMessage::Complete)]
            } else {
                Vec::new()
            }
        }
        Msg::Failed => {
            state.abort();
            vec![Effect::Finalize, Effect::ReloadHost]
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn decide(state: &mut TraversalState, fingerprint: Option<String>, pages: usize) -> Vec<Effect> {
    if state.mode() == DownloadMode::CurrentPage {
        return match fingerprint {
            Some(fingerprint) => {
                state.hold_batch(fingerprint, pages);
                vec![Effect::AppendBatch]
            }
            None => terminate(state, StopReason::SinglePage, false),
        };
    }

    let past_first_content = state.current_index() > FIRST_CONTENT_INDEX;
    match fingerprint {
        None if past_first_content => terminate(state, StopReason::EndOfDocument, true),
        None => {
            let next = next_index(state.current_index(), 1);
            advance(state, next)
        }
        Some(fingerprint) if state.is_repeat(&fingerprint) => {
            let reason = if state.previous_fingerprint() == Some(fingerprint.as_str()) {
                StopReason::RepeatedPage
            } else {
                StopReason::WrappedAround
            };
            let mut effects = vec![Effect::DiscardBatch];
            if past_first_content {
                effects.extend(terminate(state, reason, true));
            } else {
                let next = next_index(state.current_index(), 1);
                effects.extend(advance(state, next));
            }
            effects
        }
        Some(fingerprint) => {
            state.hold_batch(fingerprint, pages);
            vec![Effect::AppendBatch]
        }
    }
}

fn advance(state: &mut TraversalState, index: i64) -> Vec<Effect> {
    state.set_phase(Phase::Navigate(index));
    vec![
        Effect::Report(ProgressMessage::LoadNextPage),
        Effect::Navigate { index },
    ]
}

fn terminate(state: &mut TraversalState, reason: StopReason, reset: bool) -> Vec<Effect> {
    state.terminate(reason);
    let mut effects = Vec::with_capacity(3);
    if reset {
        effects.push(Effect::ResetNavigation);
    }
    effects.push(Effect::Report(ProgressMessage::SaveFile));
    effects.push(Effect::Finalize);
    effects
}
