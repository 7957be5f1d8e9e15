use crate::{Effect, Msg, PipelineState};

/// Pure update function: applies a message to state and returns any effects.
///
/// Messages tagged with an episode other than the active one are stale (a late
/// worker report after cancellation, say) and are dropped without touching the
/// counters.
pub fn update(mut state: PipelineState, msg: Msg) -> (PipelineState, Vec<Effect>) {
    let effects = match msg {
        Msg::ContainerRequested { label } => {
            if let Some(active) = state.processing().label() {
                let active = active.to_owned();
                return (
                    state,
                    vec![Effect::RejectBusy {
                        requested: label,
                        active,
                    }],
                );
            }
            let episode = state.begin_episode(label.clone());
            vec![
                Effect::StartEpisode { episode, label },
                Effect::Publish(state.processing().clone()),
            ]
        }
        Msg::ContainerEnumerated { episode, total } => {
            if state.is_active(episode) && state.set_total(total) {
                vec![Effect::Publish(state.processing().clone())]
            } else {
                Vec::new()
            }
        }
        Msg::ItemFinished { episode } => {
            if state.is_active(episode) && state.advance() {
                vec![Effect::Publish(state.processing().clone())]
            } else {
                Vec::new()
            }
        }
        Msg::EpisodeEnded { episode, outcome } => {
            if state.is_active(episode) {
                state.end_episode(outcome);
                vec![Effect::Publish(state.processing().clone())]
            } else {
                Vec::new()
            }
        }
    };

    (state, effects)
}
