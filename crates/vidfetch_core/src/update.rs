use vidfetch_logging::{vid_debug, vid_info, vid_trace, vid_warn};

use crate::{
    AppState, Effect, Msg, Notice, ReconcileError, RetrievalError, RetrievalOutcome,
    RetrievalState, SessionRecord,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    if state.is_shut_down() {
        if msg != Msg::NoOp {
            vid_debug!("Discarding message after shutdown: {:?}", msg);
        }
        return (state, Vec::new());
    }

    let mut effects = match msg {
        Msg::InputChanged(text) => {
            state.set_url_input(text);
            Vec::new()
        }
        Msg::QualitySelected(quality) => {
            state.set_quality(quality);
            Vec::new()
        }
        Msg::FormatSelected(format) => {
            state.set_format(format);
            Vec::new()
        }
        Msg::SubmitClicked => {
            if state.is_submitting() {
                return (state, Vec::new());
            }
            // Blank input is not an error, just nothing to do.
            let Some(request) = state.pending_request() else {
                return (state, Vec::new());
            };
            vid_info!(
                "Submitting url={} quality={} format={}",
                request.url,
                request.quality,
                request.format
            );
            state.set_submitting(true);
            vec![Effect::StartJob(request)]
        }
        Msg::SubmitAccepted {
            session_id,
            request,
            accepted_at,
        } => {
            vid_info!("Job accepted id={} url={}", session_id, request.url);
            state.set_submitting(false);
            state.set_notice(None);
            state.replace_session(SessionRecord::new(session_id, &request, accepted_at));
            Vec::new()
        }
        Msg::SubmitFailed(err) => {
            vid_warn!("Submission failed: {}", err);
            state.set_submitting(false);
            state.set_notice(Some(Notice::error(err.to_string())));
            Vec::new()
        }
        Msg::PollTick => {
            let effects: Vec<_> = state
                .sessions()
                .active_ids()
                .into_iter()
                .map(|session_id| Effect::PollStatus { session_id })
                .collect();
            vid_trace!("Poll tick: {} status request(s)", effects.len());
            effects
        }
        Msg::StatusReceived { session_id, patch } => {
            match state.sessions_mut().reconcile(&session_id, &patch) {
                Ok(reconciled) => {
                    if reconciled.changed {
                        let status = reconciled.record.status();
                        if status != reconciled.previous_status {
                            vid_info!(
                                "Session {} {} -> {}",
                                session_id,
                                reconciled.previous_status,
                                status
                            );
                        }
                        state.mark_dirty();
                    }
                }
                Err(ReconcileError::NotFound) => {
                    vid_debug!("Dropping status for untracked session {}", session_id);
                }
                Err(err) => {
                    vid_warn!("Ignoring status for session {}: {}", session_id, err);
                }
            }
            Vec::new()
        }
        Msg::PollFailed { session_id, reason } => {
            vid_warn!("Status poll for {} failed: {}", session_id, reason);
            Vec::new()
        }
        Msg::RetrieveClicked { session_id } => match retrieve(&state, &session_id) {
            Ok(effect) => {
                if state.retrieval(&session_id) == Some(&RetrievalState::InFlight) {
                    vid_debug!("Retrieval for {} already in flight", session_id);
                    Vec::new()
                } else {
                    state.set_retrieval(session_id, RetrievalState::InFlight);
                    state.set_notice(None);
                    vec![effect]
                }
            }
            Err(err) => {
                vid_warn!("Retrieval refused for '{}': {}", session_id, err);
                state.set_notice(Some(Notice::error(err.to_string())));
                Vec::new()
            }
        },
        Msg::RetrievalFinished {
            session_id,
            outcome,
        } => {
            if state.sessions().get(&session_id).is_none() {
                vid_debug!("Dropping retrieval result for replaced session {}", session_id);
                return (state, Vec::new());
            }
            match outcome {
                RetrievalOutcome::Saved { path, bytes } => {
                    vid_info!("Saved {} ({} bytes) for {}", path.display(), bytes, session_id);
                    state.set_notice(Some(Notice::info(format!("Saved {}", path.display()))));
                    state.set_retrieval(session_id, RetrievalState::Saved { path, bytes });
                }
                RetrievalOutcome::Failed { message } => {
                    vid_warn!("Retrieval for {} failed: {}", session_id, message);
                    state.set_notice(Some(Notice::error(format!("Download failed: {message}"))));
                    state.set_retrieval(session_id, RetrievalState::Failed(message));
                }
            }
            Vec::new()
        }
        Msg::NoticeDismissed => {
            state.set_notice(None);
            Vec::new()
        }
        Msg::Shutdown => {
            vid_info!("Shutting down session tracking");
            let was_polling = state.is_polling();
            state.set_polling(false);
            state.shut_down();
            let effects = if was_polling {
                vec![Effect::StopPolling]
            } else {
                Vec::new()
            };
            return (state, effects);
        }
        Msg::NoOp => Vec::new(),
    };

    sync_polling(&mut state, &mut effects);
    (state, effects)
}

/// Checks that `session_id` names a completed session with a result and
/// returns the effect that fetches it.
pub fn retrieve(state: &AppState, session_id: &str) -> Result<Effect, RetrievalError> {
    if session_id.trim().is_empty() {
        return Err(RetrievalError::MissingId);
    }
    let record = state
        .sessions()
        .get(session_id)
        .ok_or(RetrievalError::MissingId)?;
    if !record.is_retrievable() {
        return Err(RetrievalError::NotReady);
    }
    Ok(Effect::RetrieveFile {
        session_id: record.id().to_string(),
        filename_hint: record.filename().map(ToOwned::to_owned),
    })
}

/// Arms the timer when the active set becomes non-empty and disarms it when
/// it empties. Field changes inside the set never re-arm.
fn sync_polling(state: &mut AppState, effects: &mut Vec<Effect>) {
    let any_active = state
        .sessions()
        .iter()
        .any(|record| !record.status().is_terminal());
    match (any_active, state.is_polling()) {
        (true, false) => {
            vid_debug!("Arming poll timer");
            state.set_polling(true);
            effects.push(Effect::StartPolling);
        }
        (false, true) => {
            vid_debug!("Disarming poll timer");
            state.set_polling(false);
            effects.push(Effect::StopPolling);
        }
        _ => {}
    }
}
