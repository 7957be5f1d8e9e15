#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// A folder or archive was handed to the pipeline.
    ContainerRequested { label: String },
    /// The engine finished enumerating the container.
    ContainerEnumerated {
        episode: crate::EpisodeId,
        total: usize,
    },
    /// One enumerated file was read or skipped.
    ItemFinished { episode: crate::EpisodeId },
    /// The episode finished, failed or was cancelled.
    EpisodeEnded {
        episode: crate::EpisodeId,
        outcome: crate::EpisodeOutcome,
    },
}
