//! Data model shared across the assistant engine.
//!
//! Defines intents, entities, messages, actions, and workflow tags. All of
//! these are plain values: no type here owns behavior beyond conversion and
//! formatting.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Intents
// =============================================================================

/// Closed set of user intents. Exactly one is resolved per turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CreateListing,
    SearchItem,
    ViewMessages,
    ViewFavorites,
    Greeting,
    Thanks,
    PricingQuestion,
    SafetyQuestion,
    Housing,
    Jobs,
    Unknown,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Intent::CreateListing => "create_listing",
            Intent::SearchItem => "search_item",
            Intent::ViewMessages => "view_messages",
            Intent::ViewFavorites => "view_favorites",
            Intent::Greeting => "greeting",
            Intent::Thanks => "thanks",
            Intent::PricingQuestion => "pricing_question",
            Intent::SafetyQuestion => "safety_question",
            Intent::Housing => "housing",
            Intent::Jobs => "jobs",
            Intent::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Intent {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create_listing" => Ok(Intent::CreateListing),
            "search_item" => Ok(Intent::SearchItem),
            "view_messages" => Ok(Intent::ViewMessages),
            "view_favorites" => Ok(Intent::ViewFavorites),
            "greeting" => Ok(Intent::Greeting),
            "thanks" => Ok(Intent::Thanks),
            "pricing_question" => Ok(Intent::PricingQuestion),
            "safety_question" => Ok(Intent::SafetyQuestion),
            "housing" => Ok(Intent::Housing),
            "jobs" => Ok(Intent::Jobs),
            "unknown" => Ok(Intent::Unknown),
            _ => Err(format!("Unknown intent: {}", s)),
        }
    }
}

// =============================================================================
// Entities
// =============================================================================

/// Typed entity kinds, keyed to the workflow field slots they can fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    ProductName,
    Category,
    Price,
    Condition,
    PaymentMethods,
    DonationReason,
    DesiredItems,
    EstimatedValue,
    HourlyRate,
    Duration,
    Skills,
}

impl EntityKind {
    /// Whether this kind accepts an arbitrary free-text value.
    ///
    /// Free-text kinds can be filled from a whole utterance when the bot has
    /// just asked for them; the others only come from typed extractors.
    pub fn is_free_text(&self) -> bool {
        matches!(
            self,
            EntityKind::ProductName
                | EntityKind::DonationReason
                | EntityKind::DesiredItems
                | EntityKind::Skills
        )
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::ProductName => "product_name",
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
        };
        write!(f, "{}", s)
    }
}

/// A single extracted entity with its source span in the normalized text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub value: String,
    /// Byte range of the match in the normalized utterance.
    pub span: (usize, usize),
}

impl Entity {
    pub fn new(kind: EntityKind, value: impl Into<String>, span: (usize, usize)) -> Self {
        Self {
            kind,
            value: value.into(),
            span,
        }
    }
}

// =============================================================================
// NLP result
// =============================================================================

/// Coarse sentiment of an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// Output of the NLP engine for one utterance. Produced fresh each turn and
/// never mutated afterward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NlpResult {
    pub intent: Intent,
    /// Classification confidence in `[0, 1]`.
    pub confidence: f32,
    pub entities: Vec<Entity>,
    pub sentiment: Sentiment,
}

impl NlpResult {
    /// Find the first extracted entity of the given kind.
    pub fn entity(&self, kind: EntityKind) -> Option<&Entity> {
        self.entities.iter().find(|e| e.kind == kind)
    }
}

// =============================================================================
// Actions and responses
// =============================================================================

/// Platform-level side effect resolved from an intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionDescriptor {
    /// No side effect.
    None,
    /// Navigate the UI to the given path.
    Navigate { path: String },
    /// Submit a completed listing with all collected fields.
    SubmitListing { fields: BTreeMap<String, String> },
}

impl ActionDescriptor {
    pub fn is_none(&self) -> bool {
        matches!(self, ActionDescriptor::None)
    }
}

/// Which path produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Rule,
    Llm,
}

/// A generated assistant reply, before it is recorded as a [`Message`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotResponse {
    pub text: String,
    pub suggestions: Vec<String>,
    pub action: ActionDescriptor,
    pub source: ResponseSource,
    /// Fixed provenance confidence: rule templates carry the classifier's
    /// confidence, LLM output carries a configured constant.
    pub confidence: f32,
}

// =============================================================================
// Messages
// =============================================================================

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

/// End-user quality feedback on a bot message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feedback {
    Positive,
    Negative,
}

/// One entry in a conversation's append-only message history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub text: String,
    pub sender: Sender,
    /// Epoch seconds.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Feedback>,
}

impl Message {
    /// Build a user-authored message.
    pub fn from_user(text: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            sender: Sender::User,
            timestamp,
            suggestions: None,
            action: None,
            feedback: None,
        }
    }

    /// Build a bot-authored message from a generated response.
    pub fn from_response(response: &BotResponse, timestamp: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: response.text.clone(),
            sender: Sender::Bot,
            timestamp,
            suggestions: if response.suggestions.is_empty() {
                None
            } else {
                Some(response.suggestions.clone())
            },
            action: if response.action.is_none() {
                None
            } else {
                Some(response.action.clone())
            },
            feedback: None,
        }
    }
}

// =============================================================================
// Workflow tag
// =============================================================================

/// Transaction type of a guided listing-creation workflow. The required-field
/// schema is resolved from this tag once, at workflow creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowType {
    Sell,
    Gift,
    Swap,
    Service,
}

impl fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkflowType::Sell => "sell",
            WorkflowType::Gift => "gift",
            WorkflowType::Swap => "swap",
            WorkflowType::Service => "service",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for WorkflowType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sell" => Ok(WorkflowType::Sell),
            "gift" => Ok(WorkflowType::Gift),
            "swap" => Ok(WorkflowType::Swap),
            "service" => Ok(WorkflowType::Service),
            _ => Err(format!("Unknown workflow type: {}", s)),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    // ---- Intent round trips ----

    #[test]
    fn test_intent_display_from_str_round_trip() {
        let all = [
            Intent::CreateListing,
            Intent::SearchItem,
            Intent::ViewMessages,
            Intent::ViewFavorites,
            Intent::Greeting,
            Intent::Thanks,
            Intent::PricingQuestion,
            Intent::SafetyQuestion,
            Intent::Housing,
            Intent::Jobs,
            Intent::Unknown,
        ];
        for intent in all {
            let parsed = Intent::from_str(&intent.to_string()).unwrap();
            assert_eq!(parsed, intent);
        }
    }

    #[test]
    fn test_intent_from_str_unknown_tag() {
        assert!(Intent::from_str("buy_castle").is_err());
    }

    #[test]
    fn test_intent_serde_snake_case() {
        let json = serde_json::to_string(&Intent::CreateListing).unwrap();
        assert_eq!(json, "\"create_listing\"");
        let back: Intent = serde_json::from_str("\"pricing_question\"").unwrap();
        assert_eq!(back, Intent::PricingQuestion);
    }

    // ---- Entity kinds ----

    #[test]
    fn test_entity_kind_free_text() {
        assert!(EntityKind::ProductName.is_free_text());
        assert!(EntityKind::DonationReason.is_free_text());
        assert!(EntityKind::DesiredItems.is_free_text());
        assert!(EntityKind::Skills.is_free_text());
        assert!(!EntityKind::Price.is_free_text());
        assert!(!EntityKind::Category.is_free_text());
        assert!(!EntityKind::Condition.is_free_text());
        assert!(!EntityKind::HourlyRate.is_free_text());
    }

    #[test]
    fn test_entity_kind_display() {
        assert_eq!(EntityKind::ProductName.to_string(), "product_name");
        assert_eq!(EntityKind::PaymentMethods.to_string(), "payment_methods");
        assert_eq!(EntityKind::EstimatedValue.to_string(), "estimated_value");
    }

    #[test]
    fn test_entity_new() {
        let e = Entity::new(EntityKind::Price, "50", (3, 5));
        assert_eq!(e.kind, EntityKind::Price);
        assert_eq!(e.value, "50");
        assert_eq!(e.span, (3, 5));
    }

    // ---- NlpResult ----

    #[test]
    fn test_nlp_result_entity_lookup() {
        let result = NlpResult {
            intent: Intent::CreateListing,
            confidence: 0.9,
            entities: vec![
                Entity::new(EntityKind::ProductName, "livre de maths", (0, 14)),
                Entity::new(EntityKind::Price, "50", (20, 22)),
            ],
            sentiment: Sentiment::Neutral,
        };
        assert_eq!(result.entity(EntityKind::Price).unwrap().value, "50");
        assert!(result.entity(EntityKind::Condition).is_none());
    }

    // ---- ActionDescriptor ----

    #[test]
    fn test_action_descriptor_is_none() {
        assert!(ActionDescriptor::None.is_none());
        assert!(!ActionDescriptor::Navigate {
            path: "/create".into()
        }
        .is_none());
    }

    #[test]
    fn test_action_descriptor_serde_tagged() {
        let action = ActionDescriptor::Navigate {
            path: "/listings".into(),
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "navigate");
        assert_eq!(json["path"], "/listings");

        let mut fields = BTreeMap::new();
        fields.insert("title".to_string(), "livre".to_string());
        let submit = ActionDescriptor::SubmitListing { fields };
        let json = serde_json::to_value(&submit).unwrap();
        assert_eq!(json["type"], "submit_listing");
        assert_eq!(json["fields"]["title"], "livre");
    }

    // ---- Messages ----

    #[test]
    fn test_message_from_user() {
        let msg = Message::from_user("bonjour", 1700000000);
        assert_eq!(msg.sender, Sender::User);
        assert_eq!(msg.text, "bonjour");
        assert_eq!(msg.timestamp, 1700000000);
        assert!(msg.suggestions.is_none());
        assert!(msg.action.is_none());
        assert!(msg.feedback.is_none());
        assert_ne!(msg.id, Uuid::nil());
    }

    #[test]
    fn test_message_from_response_drops_empty_extras() {
        let response = BotResponse {
            text: "Bonjour !".into(),
            suggestions: vec![],
            action: ActionDescriptor::None,
            source: ResponseSource::Rule,
            confidence: 0.95,
        };
        let msg = Message::from_response(&response, 1700000000);
        assert_eq!(msg.sender, Sender::Bot);
        assert!(msg.suggestions.is_none());
        assert!(msg.action.is_none());
    }

    #[test]
    fn test_message_from_response_keeps_extras() {
        let response = BotResponse {
            text: "Voici".into(),
            suggestions: vec!["Voir mes annonces".into()],
            action: ActionDescriptor::Navigate {
                path: "/create".into(),
            },
            source: ResponseSource::Rule,
            confidence: 0.9,
        };
        let msg = Message::from_response(&response, 1);
        assert_eq!(msg.suggestions.as_ref().unwrap().len(), 1);
        assert!(matches!(
            msg.action,
            Some(ActionDescriptor::Navigate { .. })
        ));
    }

    #[test]
    fn test_message_serde_round_trip() {
        let msg = Message::from_user("test", 42);
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_message_serde_omits_absent_optionals() {
        let msg = Message::from_user("test", 42);
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("suggestions"));
        assert!(!json.contains("feedback"));
    }

    // ---- Workflow type ----

    #[test]
    fn test_workflow_type_round_trip() {
        for wt in [
            WorkflowType::Sell,
            WorkflowType::Gift,
            WorkflowType::Swap,
            WorkflowType::Service,
        ] {
            assert_eq!(WorkflowType::from_str(&wt.to_string()).unwrap(), wt);
        }
    }

    #[test]
    fn test_workflow_type_from_str_invalid() {
        assert!(WorkflowType::from_str("rent").is_err());
    }

    // ---- Feedback / sender serde ----

    #[test]
    fn test_feedback_serde() {
        assert_eq!(
            serde_json::to_string(&Feedback::Positive).unwrap(),
            "\"positive\""
        );
        assert_eq!(
            serde_json::to_string(&Sender::Bot).unwrap(),
            "\"bot\""
        );
    }
}
