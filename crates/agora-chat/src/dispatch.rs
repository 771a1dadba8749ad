//! Pure resolution of the platform action for a turn.

use agora_core::{ActionDescriptor, Intent};

use crate::types::Enrichment;

/// Maps an enriched turn to at most one platform action.
///
/// A live workflow suppresses navigation (the conversation stays on rails);
/// a workflow that just completed produces the listing submission. Outside
/// workflows, the intent table decides.
pub struct ActionDispatcher;

impl ActionDispatcher {
    pub fn resolve(enrichment: &Enrichment) -> ActionDescriptor {
        if enrichment.cancelled {
            return ActionDescriptor::None;
        }

        if let Some(workflow) = &enrichment.workflow {
            return if workflow.is_complete() {
                ActionDescriptor::SubmitListing {
                    fields: workflow.submission_fields(),
                }
            } else {
                ActionDescriptor::None
            };
        }

        match enrichment.nlp.intent {
            Intent::CreateListing => ActionDescriptor::Navigate {
                path: "/create".to_string(),
            },
            Intent::SearchItem => match enrichment.nlp.entity(agora_core::EntityKind::Category) {
                Some(category) => ActionDescriptor::Navigate {
                    path: format!("/listings?category={}", category.value),
                },
                None => ActionDescriptor::None,
            },
            Intent::ViewMessages => ActionDescriptor::Navigate {
                path: "/messages".to_string(),
            },
            Intent::ViewFavorites => ActionDescriptor::Navigate {
                path: "/favorites".to_string(),
            },
            Intent::Housing => ActionDescriptor::Navigate {
                path: "/housing".to_string(),
            },
            Intent::Jobs => ActionDescriptor::Navigate {
                path: "/jobs".to_string(),
            },
            _ => ActionDescriptor::None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
