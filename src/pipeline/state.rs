use std::fmt;

use serde::Serialize;

use crate::error::StageError;

/// The four stages that can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Stage {
    Uploading,
    Digesting,
    Anchoring,
    Recording,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Uploading => "Uploading",
            Stage::Digesting => "Digesting",
            Stage::Anchoring => "Anchoring",
            Stage::Recording => "Recording",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Observable progress of one run:
/// `Idle -> Uploading -> Digesting -> Anchoring -> Recording -> Completed`,
/// or `Failed` from any stage.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Idle,
    Uploading,
    Digesting,
    Anchoring,
    Recording,
    Completed,
    Failed { stage: Stage, reason: StageError },
}

impl PipelineState {
    pub fn entering(stage: Stage) -> Self {
        match stage {
            Stage::Uploading => PipelineState::Uploading,
            Stage::Digesting => PipelineState::Digesting,
            Stage::Anchoring => PipelineState::Anchoring,
            Stage::Recording => PipelineState::Recording,
        }
    }

    /// The stage this state belongs to, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineState::Uploading => Some(Stage::Uploading),
            PipelineState::Digesting => Some(Stage::Digesting),
            PipelineState::Anchoring => Some(Stage::Anchoring),
            PipelineState::Recording => Some(Stage::Recording),
            PipelineState::Failed { stage, .. } => Some(*stage),
            PipelineState::Idle | PipelineState::Completed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Completed | PipelineState::Failed { .. })
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => f.write_str("Idle"),
            PipelineState::Completed => f.write_str("Completed"),
            PipelineState::Failed { stage, reason } => write!(f, "Failed({stage}, {reason})"),
            other => match other.stage() {
                Some(stage) => f.write_str(stage.name()),
                None => Ok(()),
            },
        }
    }
}
