//! Guided listing-creation workflows.
//!
//! A workflow is a typed checklist: the transaction type fixes the required
//! fields once at creation, and each turn may fill some of them from
//! extracted entities. Progress is monotone: a filled field is never
//! overwritten, and a completed workflow never reopens.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use agora_core::{Entity, EntityKind, WorkflowType};

/// Required-field schema per transaction type, in asking order.
pub fn required_fields(workflow_type: WorkflowType) -> &'static [EntityKind] {
    match workflow_type {
        WorkflowType::Sell => &[
            EntityKind::ProductName,
            EntityKind::Category,
            EntityKind::Price,
            EntityKind::Condition,
            EntityKind::PaymentMethods,
        ],
        WorkflowType::Gift => &[
            EntityKind::ProductName,
            EntityKind::Category,
            EntityKind::DonationReason,
        ],
        WorkflowType::Swap => &[
            EntityKind::ProductName,
            EntityKind::Category,
            EntityKind::DesiredItems,
            EntityKind::EstimatedValue,
        ],
        WorkflowType::Service => &[
            EntityKind::ProductName,
            EntityKind::Category,
            EntityKind::HourlyRate,
            EntityKind::Duration,
            EntityKind::Skills,
        ],
    }
}

/// Submission payload key for a workflow field.
pub fn submission_key(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::ProductName => "title",
        EntityKind::Category => "category",
        EntityKind::Price => "price",
        EntityKind::Condition => "condition",
        EntityKind::PaymentMethods => "payment_methods",
        EntityKind::DonationReason => "donation_reason",
        EntityKind::DesiredItems => "desired_items",
        EntityKind::EstimatedValue => "estimated_value",
        EntityKind::HourlyRate => "hourly_rate",
        EntityKind::Duration => "duration",
        EntityKind::Skills => "skills",
    }
}

/// Infer the transaction type from a normalized listing utterance.
///
/// Gift and swap wording is checked before the sell default; services are
/// recognized by the offering vocabulary.
pub fn detect_workflow_type(normalized: &str) -> WorkflowType {
    let has = |needle: &str| normalized.contains(needle);

    if has("donner") || has("donne") || has("a donner") {
        WorkflowType::Gift
    } else if has("echanger") || has("echange") || has("troquer") || has("troque") || has("contre")
    {
        WorkflowType::Swap
    } else if has("service") || has("cours particuliers") || has("je propose") {
        WorkflowType::Service
    } else {
        WorkflowType::Sell
    }
}

/// State of one in-progress (or completed) guided workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub workflow_type: WorkflowType,
    /// Field values captured so far, keyed by entity kind.
    collected: BTreeMap<EntityKind, String>,
    completed: bool,
}

impl WorkflowState {
    pub fn new(workflow_type: WorkflowType) -> Self {
        Self {
            workflow_type,
            collected: BTreeMap::new(),
            completed: false,
        }
    }

    pub fn required(&self) -> &'static [EntityKind] {
        required_fields(self.workflow_type)
    }

    /// Required fields still unfilled, in asking order.
    pub fn missing(&self) -> Vec<EntityKind> {
        self.required()
            .iter()
            .copied()
            .filter(|kind| !self.collected.contains_key(kind))
            .collect()
    }

    /// Next field to ask for.
    pub fn next_missing(&self) -> Option<EntityKind> {
        self.missing().into_iter().next()
    }

    /// Current step, 1-based: number of filled fields plus one, capped at
    /// the total once everything is collected.
    pub fn step(&self) -> usize {
        let total = self.required().len();
        let filled = total - self.missing().len();
        (filled + 1).min(total)
    }

    pub fn total_steps(&self) -> usize {
        self.required().len()
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }

    pub fn value(&self, kind: EntityKind) -> Option<&str> {
        self.collected.get(&kind).map(String::as_str)
    }

    /// Fields captured so far as `(kind, value)` pairs, in schema order.
    pub fn collected(&self) -> Vec<(EntityKind, &str)> {
        self.required()
            .iter()
            .filter_map(|kind| self.collected.get(kind).map(|v| (*kind, v.as_str())))
            .collect()
    }

    /// Absorb extracted entities into vacant required slots.
    ///
    /// Returns the kinds newly captured this turn, in schema order. Filled
    /// slots are never overwritten, entities for kinds outside the schema
    /// are ignored, and a completed workflow absorbs nothing.
    pub fn absorb(&mut self, entities: &[Entity]) -> Vec<EntityKind> {
        if self.completed {
            return Vec::new();
        }

        let mut captured = Vec::new();
        for kind in self.required() {
            if self.collected.contains_key(kind) {
                continue;
            }
            if let Some(entity) = entities.iter().find(|e| e.kind == *kind) {
                self.collected.insert(*kind, entity.value.clone());
                captured.push(*kind);
            }
        }

        if self.missing().is_empty() {
            self.completed = true;
        }
        captured
    }

    /// Submission payload for a completed workflow: every collected field
    /// under its submission key, plus the transaction type tag.
    pub fn submission_fields(&self) -> BTreeMap<String, String> {
        let mut fields: BTreeMap<String, String> = self
            .collected
            .iter()
            .map(|(kind, value)| (submission_key(*kind).to_string(), value.clone()))
            .collect();
        fields.insert("workflow_type".to_string(), self.workflow_type.to_string());
        fields
    }
}

// =============================================================================
// Tests
// =============================================================================
