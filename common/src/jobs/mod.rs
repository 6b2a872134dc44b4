use serde::{Deserialize, Serialize};

/// The states a submission passes through, in order. There are no backward transitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PipelineStage {
    Received,
    PathDerived,
    FolderResolved,
    DocumentInstantiated,
    PlaceholdersSubstituted,
    FieldsAppended,
    Finalized,
}

/// Status of a report job as exposed by `GET /api/reports/status/{job_id}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    /// The last stage the pipeline reached.
    InProgress(PipelineStage),
    /// Carries the archival path of the finished report.
    Completed(String),
    Failed(String),
}
