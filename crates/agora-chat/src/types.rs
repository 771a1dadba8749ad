use agora_context::WorkflowState;
use agora_core::{EntityKind, NlpResult};

/// Everything resolved about one turn before a response is generated.
///
/// Built once per turn by the orchestrator and read by the dispatcher and
/// the response generator.
#[derive(Debug, Clone)]
pub struct Enrichment {
    pub nlp: NlpResult,
    /// Workflow snapshot after this turn's entities were absorbed, if one is
    /// active or just completed.
    pub workflow: Option<WorkflowState>,
    /// Fields the workflow captured from this utterance, in schema order.
    pub newly_captured: Vec<EntityKind>,
    /// The user abandoned the active workflow this turn.
    pub cancelled: bool,
}

impl Enrichment {
    pub fn plain(nlp: NlpResult) -> Self {
        Self {
            nlp,
            workflow: None,
            newly_captured: Vec::new(),
            cancelled: false,
        }
    }
}
