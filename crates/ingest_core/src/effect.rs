#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Run extraction for the episode that was just opened.
    StartEpisode {
        episode: crate::EpisodeId,
        label: String,
    },
    /// A container was refused because another episode holds the pipeline.
    RejectBusy { requested: String, active: String },
    /// Observers must be told about this state.
    Publish(crate::ProcessingState),
}
