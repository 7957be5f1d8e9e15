use crate::view_model::PipelineViewModel;

pub type EpisodeId = u64;

/// Process-wide container extraction status.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProcessingState {
    #[default]
    Idle,
    Processing {
        current: usize,
        total: usize,
        label: String,
    },
}

impl ProcessingState {
    pub fn is_processing(&self) -> bool {
        matches!(self, ProcessingState::Processing { .. })
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            ProcessingState::Idle => None,
            ProcessingState::Processing { label, .. } => Some(label),
        }
    }

    /// Completion in whole percent; `None` while idle or before the total is known.
    pub fn percent(&self) -> Option<u8> {
        match self {
            ProcessingState::Processing { current, total, .. } if *total > 0 => {
                Some(((*current).min(*total) * 100 / *total) as u8)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeOutcome {
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastEpisode {
    pub label: String,
    pub outcome: EpisodeOutcome,
}

/// State owned by the coordinator. Mutated only through [`crate::update`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PipelineState {
    processing: ProcessingState,
    active_episode: Option<EpisodeId>,
    episodes_started: EpisodeId,
    last_episode: Option<LastEpisode>,
}

impl PipelineState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn processing(&self) -> &ProcessingState {
        &self.processing
    }

    pub fn active_episode(&self) -> Option<EpisodeId> {
        self.active_episode
    }

    pub fn last_episode(&self) -> Option<&LastEpisode> {
        self.last_episode.as_ref()
    }

    pub fn view(&self) -> PipelineViewModel {
        PipelineViewModel::from_state(&self.processing, self.last_episode.as_ref())
    }

    pub(crate) fn begin_episode(&mut self, label: String) -> EpisodeId {
        self.episodes_started += 1;
        let episode = self.episodes_started;
        self.active_episode = Some(episode);
        self.processing = ProcessingState::Processing {
            current: 0,
            total: 0,
            label,
        };
        episode
    }

    pub(crate) fn is_active(&self, episode: EpisodeId) -> bool {
        self.active_episode == Some(episode)
    }

    /// Records the enumerated file count. Never drops below what already completed.
    pub(crate) fn set_total(&mut self, new_total: usize) -> bool {
        match &mut self.processing {
            ProcessingState::Processing { current, total, .. } => {
                let clamped = new_total.max(*current);
                if *total == clamped {
                    return false;
                }
                *total = clamped;
                true
            }
            ProcessingState::Idle => false,
        }
    }

    /// Counts one finished item; refuses to run past the total.
    pub(crate) fn advance(&mut self) -> bool {
        match &mut self.processing {
            ProcessingState::Processing { current, total, .. } if *current < *total => {
                *current += 1;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn end_episode(&mut self, outcome: EpisodeOutcome) {
        let label = match std::mem::take(&mut self.processing) {
            ProcessingState::Processing { label, .. } => label,
            ProcessingState::Idle => String::new(),
        };
        self.active_episode = None;
        self.last_episode = Some(LastEpisode { label, outcome });
    }
}
