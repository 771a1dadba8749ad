//! Rule-based response templates.
//!
//! Turns an enriched turn into reply text, quick-reply suggestions, and the
//! resolved action. Workflow turns get progression replies (acknowledge what
//! was captured, ask for the next missing field with examples); everything
//! else gets a per-intent template.

use agora_context::{UserContext, WorkflowState};
use agora_core::{BotResponse, EntityKind, Intent, ResponseSource};
use tracing::trace;

use crate::dispatch::ActionDispatcher;
use crate::types::Enrichment;

/// French UI label for a workflow field.
fn field_label(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::ProductName => "le titre",
        EntityKind::Category => "la catégorie",
        EntityKind::Price => "le prix",
        EntityKind::Condition => "l'état",
        EntityKind::PaymentMethods => "les moyens de paiement",
        EntityKind::DonationReason => "la raison du don",
        EntityKind::DesiredItems => "l'objet recherché en échange",
        EntityKind::EstimatedValue => "la valeur estimée",
        EntityKind::HourlyRate => "le tarif horaire",
        EntityKind::Duration => "la durée",
        EntityKind::Skills => "les compétences",
    }
}

/// Question asked when a workflow field is the next one missing.
fn field_question(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::ProductName => "Quel objet veux-tu proposer ?",
        EntityKind::Category => "Dans quelle catégorie ?",
        EntityKind::Price => "À quel prix ?",
        EntityKind::Condition => "Dans quel état est-il ?",
        EntityKind::PaymentMethods => "Quels moyens de paiement acceptes-tu ?",
        EntityKind::DonationReason => "Pourquoi le donnes-tu ?",
        EntityKind::DesiredItems => "Contre quoi veux-tu l'échanger ?",
        EntityKind::EstimatedValue => "Quelle est sa valeur estimée ?",
        EntityKind::HourlyRate => "Quel est ton tarif horaire ?",
        EntityKind::Duration => "Quelle durée proposes-tu ?",
        EntityKind::Skills => "Quelles compétences proposes-tu ?",
    }
}

/// Quick-reply examples offered alongside a field question.
fn field_examples(kind: EntityKind) -> Vec<String> {
    let examples: &[&str] = match kind {
        EntityKind::ProductName => &["Livre de maths", "Vélo", "Mini-frigo"],
        EntityKind::Category => &[
            "Livres & Cours",
            "Électronique",
            "Meubles",
            "Vêtements",
            "Sport & Loisirs",
            "Électroménager",
        ],
        EntityKind::Price => &["10 €", "25 €", "50 €"],
        EntityKind::Condition => &["Neuf", "Comme neuf", "Bon état", "État correct"],
        EntityKind::PaymentMethods => &["Espèces", "Lydia", "Virement", "PayPal"],
        EntityKind::DonationReason => &["Je déménage", "Je n'en ai plus besoin"],
        EntityKind::DesiredItems => &["Une cafetière", "Des livres", "Peu importe"],
        EntityKind::EstimatedValue => &["20 €", "50 €", "100 €"],
        EntityKind::HourlyRate => &["10 €/h", "15 €/h", "20 €/h"],
        EntityKind::Duration => &["1 heure", "2 heures", "À la demande"],
        EntityKind::Skills => &["Maths", "Anglais", "Informatique"],
    };
    examples.iter().map(|s| s.to_string()).collect()
}

/// Generates rule-path responses and decorates LLM responses.
pub struct ResponseGenerator;

impl ResponseGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Build the rule-template response for an enriched turn.
    pub fn generate(&self, enrichment: &Enrichment, context: &UserContext) -> BotResponse {
        let action = ActionDispatcher::resolve(enrichment);

        let (text, suggestions) = if enrichment.cancelled {
            (
                "Pas de souci, j'ai annulé la création de l'annonce.".to_string(),
                vec!["Vendre un objet".to_string(), "Chercher un objet".to_string()],
            )
        } else if let Some(workflow) = &enrichment.workflow {
            self.workflow_reply(workflow, &enrichment.newly_captured)
        } else {
            self.intent_reply(enrichment, context)
        };

        trace!(intent = %enrichment.nlp.intent, "rule response generated");
        BotResponse {
            text,
            suggestions,
            action,
            source: ResponseSource::Rule,
            confidence: enrichment.nlp.confidence,
        }
    }

    /// Attach the rule-resolved action and suggestions to a model-generated
    /// response, keeping its text and provenance.
    pub fn decorate_llm(&self, mut response: BotResponse, enrichment: &Enrichment) -> BotResponse {
        response.action = ActionDispatcher::resolve(enrichment);
        if response.suggestions.is_empty() {
            if let Some(workflow) = &enrichment.workflow {
                if let Some(next) = workflow.next_missing() {
                    response.suggestions = field_examples(next);
                }
            }
        }
        response
    }

    fn workflow_reply(
        &self,
        workflow: &WorkflowState,
        newly_captured: &[EntityKind],
    ) -> (String, Vec<String>) {
        if workflow.is_complete() {
            let mut text = String::from("Parfait, j'ai tout ce qu'il faut ! Récapitulatif :");
            for (kind, value) in workflow.collected() {
                text.push_str(&format!("\n• {} : {}", capitalize(field_label(kind)), value));
            }
            text.push_str("\nJe publie ton annonce.");
            return (
                text,
                vec![
                    "Voir mes annonces".to_string(),
                    "Créer une autre annonce".to_string(),
                ],
            );
        }

        let mut text = String::new();
        if !newly_captured.is_empty() {
            let labels: Vec<&str> = newly_captured.iter().map(|k| field_label(*k)).collect();
            text.push_str(&format!("C'est noté pour {}. ", labels.join(", ")));
        }

        // An incomplete workflow always has a next field.
        let suggestions = match workflow.next_missing() {
            Some(next) => {
                text.push_str(&format!(
                    "Étape {}/{} — {}",
                    workflow.step(),
                    workflow.total_steps(),
                    field_question(next)
                ));
                field_examples(next)
            }
            None => Vec::new(),
        };
        (text, suggestions)
    }

    fn intent_reply(&self, enrichment: &Enrichment, context: &UserContext) -> (String, Vec<String>) {
        let nlp = &enrichment.nlp;
        match nlp.intent {
            Intent::Greeting => {
                let name = context
                    .display_name
                    .as_ref()
                    .map(|n| format!(" {}", n))
                    .unwrap_or_default();
                (
                    format!(
                        "Bonjour{} ! Je peux t'aider à vendre, donner, échanger ou trouver \
                         des objets sur le campus.",
                        name
                    ),
                    vec![
                        "Vendre un objet".to_string(),
                        "Chercher un objet".to_string(),
                        "Mes favoris".to_string(),
                    ],
                )
            }
            Intent::Thanks => (
                "Avec plaisir ! N'hésite pas si tu as besoin d'autre chose.".to_string(),
                Vec::new(),
            ),
            Intent::CreateListing => (
                "Super ! Créons ton annonce ensemble.".to_string(),
                vec!["Vendre".to_string(), "Donner".to_string(), "Échanger".to_string()],
            ),
            Intent::SearchItem => match nlp.entity(EntityKind::Category) {
                Some(category) => (
                    format!("Voici les annonces dans la catégorie {}.", category.value),
                    Vec::new(),
                ),
                None => (
                    "Que cherches-tu ? Donne-moi un mot-clé ou choisis une catégorie."
                        .to_string(),
                    field_examples(EntityKind::Category),
                ),
            },
            Intent::ViewMessages => ("Direction ta messagerie.".to_string(), Vec::new()),
            Intent::ViewFavorites => ("Voici tes favoris.".to_string(), Vec::new()),
            Intent::PricingQuestion => (
                "Pour fixer un prix, regarde les annonces similaires : un objet d'occasion \
                 part en général entre 30 et 50 % de son prix neuf, selon l'état."
                    .to_string(),
                vec!["Vendre un objet".to_string()],
            ),
            Intent::SafetyQuestion => (
                "Privilégie les remises en main propre sur le campus et les paiements \
                 traçables (Lydia, virement). Ne communique jamais tes identifiants."
                    .to_string(),
                vec!["Contacter le support".to_string()],
            ),
            Intent::Housing => (
                "Pour le logement étudiant, consulte la section dédiée : colocations, \
                 studios et chambres près du campus."
                    .to_string(),
                Vec::new(),
            ),
            Intent::Jobs => (
                "Les jobs étudiants et petits boulots sont regroupés dans la section emplois."
                    .to_string(),
                Vec::new(),
            ),
            Intent::Unknown => (
                "Je n'ai pas bien compris. Tu peux reformuler ?".to_string(),
                vec![
                    "Vendre un objet".to_string(),
                    "Chercher un objet".to_string(),
                    "Mes messages".to_string(),
                ],
            ),
        }
    }
}

impl Default for ResponseGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use agora_core::{ActionDescriptor, Entity, NlpResult, Sentiment, WorkflowType};

    fn enrichment(intent: Intent, confidence: f32) -> Enrichment {
        Enrichment::plain(NlpResult {
            intent,
            confidence,
            entities: vec![],
            sentiment: Sentiment::Neutral,
        })
    }

    fn generator() -> ResponseGenerator {
        ResponseGenerator::new()
    }

    // ---- Intent templates ----

    #[test]
    fn test_greeting_uses_display_name() {
        let mut ctx = UserContext::default();
        ctx.display_name = Some("Camille".into());
        let r = generator().generate(&enrichment(Intent::Greeting, 0.95), &ctx);
        assert!(r.text.starts_with("Bonjour Camille !"));
        assert_eq!(r.source, ResponseSource::Rule);
        assert!((r.confidence - 0.95).abs() < f32::EPSILON);
    }

    #[test]
    fn test_greeting_without_display_name() {
        let r = generator().generate(&enrichment(Intent::Greeting, 0.95), &UserContext::default());
        assert!(r.text.starts_with("Bonjour !"));
        assert!(!r.suggestions.is_empty());
    }

    #[test]
    fn test_safety_question_offers_support() {
        let r = generator().generate(
            &enrichment(Intent::SafetyQuestion, 0.8),
            &UserContext::default(),
        );
        assert!(r.suggestions.contains(&"Contacter le support".to_string()));
    }

    #[test]
    fn test_search_without_category_offers_category_buttons() {
        let r = generator().generate(&enrichment(Intent::SearchItem, 0.85), &UserContext::default());
        assert!(r.suggestions.contains(&"Livres & Cours".to_string()));
        assert!(r.action.is_none());
    }

    #[test]
    fn test_search_with_category_navigates() {
        let mut e = enrichment(Intent::SearchItem, 0.85);
        e.nlp
            .entities
            .push(Entity::new(EntityKind::Category, "Meubles", (0, 7)));
        let r = generator().generate(&e, &UserContext::default());
        assert!(r.text.contains("Meubles"));
        assert!(matches!(r.action, ActionDescriptor::Navigate { .. }));
    }

    #[test]
    fn test_unknown_asks_to_rephrase() {
        let r = generator().generate(&enrichment(Intent::Unknown, 0.3), &UserContext::default());
        assert!(r.text.contains("reformuler"));
        assert!((r.confidence - 0.3).abs() < f32::EPSILON);
    }

    // ---- Workflow progression ----

    #[test]
    fn test_workflow_first_step_asks_product_name() {
        let mut e = enrichment(Intent::CreateListing, 0.9);
        e.workflow = Some(WorkflowState::new(WorkflowType::Sell));

        let r = generator().generate(&e, &UserContext::default());
        assert!(r.text.contains("Étape 1/5"));
        assert!(r.text.contains("Quel objet veux-tu proposer ?"));
        assert!(r.action.is_none());
    }

    #[test]
    fn test_workflow_acknowledges_captured_and_asks_next() {
        let mut workflow = WorkflowState::new(WorkflowType::Sell);
        let captured =
            workflow.absorb(&[Entity::new(EntityKind::ProductName, "livre de maths", (0, 14))]);

        let mut e = enrichment(Intent::CreateListing, 0.9);
        e.workflow = Some(workflow);
        e.newly_captured = captured;

        let r = generator().generate(&e, &UserContext::default());
        assert!(r.text.contains("C'est noté pour le titre."));
        assert!(r.text.contains("Étape 2/5"));
        assert!(r.text.contains("Dans quelle catégorie ?"));
        // Category quick replies ride along.
        assert!(r.suggestions.contains(&"Livres & Cours".to_string()));
    }

    #[test]
    fn test_workflow_never_asks_for_collected_field() {
        let mut workflow = WorkflowState::new(WorkflowType::Sell);
        workflow.absorb(&[
            Entity::new(EntityKind::ProductName, "velo", (0, 4)),
            Entity::new(EntityKind::Category, "Sport & Loisirs", (0, 5)),
        ]);

        let mut e = enrichment(Intent::Unknown, 0.3);
        e.workflow = Some(workflow);

        let r = generator().generate(&e, &UserContext::default());
        assert!(!r.text.contains("Quel objet"));
        assert!(!r.text.contains("quelle catégorie"));
        assert!(r.text.contains("À quel prix ?"));
    }

    #[test]
    fn test_completed_workflow_recap_and_submission() {
        let mut workflow = WorkflowState::new(WorkflowType::Gift);
        let captured = workflow.absorb(&[
            Entity::new(EntityKind::ProductName, "canapé", (0, 6)),
            Entity::new(EntityKind::Category, "Meubles", (0, 7)),
            Entity::new(EntityKind::DonationReason, "je déménage", (0, 11)),
        ]);

        let mut e = enrichment(Intent::Unknown, 0.3);
        e.workflow = Some(workflow);
        e.newly_captured = captured;

        let r = generator().generate(&e, &UserContext::default());
        assert!(r.text.contains("Récapitulatif"));
        assert!(r.text.contains("canapé"));
        assert!(matches!(r.action, ActionDescriptor::SubmitListing { .. }));
    }

    #[test]
    fn test_cancelled_workflow_reply() {
        let mut e = enrichment(Intent::Unknown, 0.3);
        e.cancelled = true;
        let r = generator().generate(&e, &UserContext::default());
        assert!(r.text.contains("annulé"));
        assert!(r.action.is_none());
    }

    // ---- LLM decoration ----

    #[test]
    fn test_decorate_llm_attaches_action_and_keeps_text() {
        let llm = BotResponse {
            text: "Réponse du modèle.".to_string(),
            suggestions: Vec::new(),
            action: ActionDescriptor::None,
            source: ResponseSource::Llm,
            confidence: 0.75,
        };
        let e = enrichment(Intent::ViewMessages, 0.4);
        let r = generator().decorate_llm(llm, &e);
        assert_eq!(r.text, "Réponse du modèle.");
        assert_eq!(r.source, ResponseSource::Llm);
        assert!(matches!(r.action, ActionDescriptor::Navigate { .. }));
    }
}
