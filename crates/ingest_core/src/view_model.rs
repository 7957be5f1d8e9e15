use crate::{EpisodeOutcome, LastEpisode, ProcessingState};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PipelineViewModel {
    pub processing: ProcessingState,
    pub busy: bool,
    pub percent: Option<u8>,
    pub status_line: String,
    pub last_episode: Option<LastEpisode>,
}

impl PipelineViewModel {
    pub(crate) fn from_state(
        processing: &ProcessingState,
        last_episode: Option<&LastEpisode>,
    ) -> Self {
        Self {
            processing: processing.clone(),
            busy: processing.is_processing(),
            percent: processing.percent(),
            status_line: status_line(processing, last_episode),
            last_episode: last_episode.cloned(),
        }
    }
}

fn status_line(processing: &ProcessingState, last_episode: Option<&LastEpisode>) -> String {
    match processing {
        ProcessingState::Processing { total: 0, label, .. } => format!("Scanning {label}"),
        ProcessingState::Processing {
            current,
            total,
            label,
        } => format!("Processing {label} ({current}/{total})"),
        ProcessingState::Idle => match last_episode {
            Some(LastEpisode {
                label,
                outcome: EpisodeOutcome::Completed,
            }) => format!("Added {label}"),
            Some(LastEpisode {
                label,
                outcome: EpisodeOutcome::Failed,
            }) => format!("Could not read {label}"),
            Some(LastEpisode {
                label,
                outcome: EpisodeOutcome::Cancelled,
            }) => format!("Cancelled {label}"),
            None => "Ready".to_string(),
        },
    }
}
