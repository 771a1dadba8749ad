//! System prompt and history assembly for the fallback model.

use agora_context::UserContext;
use agora_core::{NlpResult, Sender};

use crate::client::ApiMessage;

/// How many recent history messages ride along with the new utterance.
const HISTORY_WINDOW: usize = 10;

/// Build the system prompt for one turn.
///
/// The prompt carries everything the rule pipeline already knows: detected
/// intent, extracted entities, and the state of any active workflow, so the
/// model continues the guided flow instead of restarting it.
pub fn build_system_prompt(nlp: &NlpResult, context: &UserContext) -> String {
    let mut prompt = String::from(
        "Tu es l'assistant d'Agora, une place de marché étudiante (petites annonces, \
         dons, trocs, services entre étudiants). Réponds dans la langue de \
         l'utilisateur, en 2 ou 3 phrases maximum, sur un ton amical et concret.",
    );

    if let Some(name) = &context.display_name {
        prompt.push_str(&format!(" L'utilisateur s'appelle {}.", name));
    }
    if let Some(page) = &context.platform.page {
        prompt.push_str(&format!(" Il se trouve sur la page {}.", page));
    }

    prompt.push_str(&format!(
        "\n\nAnalyse de la demande : intention \"{}\" (confiance {:.2}).",
        nlp.intent, nlp.confidence
    ));
    if !nlp.entities.is_empty() {
        prompt.push_str("\nÉléments détectés :");
        for entity in &nlp.entities {
            prompt.push_str(&format!("\n- {} : {}", entity.kind, entity.value));
        }
    }

    if let Some(workflow) = &context.workflow {
        prompt.push_str(&format!(
            "\n\nUne annonce de type \"{}\" est en cours de création (étape {}/{}).",
            workflow.workflow_type,
            workflow.step(),
            workflow.total_steps()
        ));
        prompt.push_str("\nChamps de l'annonce :");
        for kind in workflow.required() {
            match workflow.value(*kind) {
                Some(value) => prompt.push_str(&format!("\n- [x] {} : {}", kind, value)),
                None => prompt.push_str(&format!("\n- [ ] {}", kind)),
            }
        }
        prompt.push_str(
            "\nNe redemande jamais un champ déjà coché ; demande uniquement le prochain \
             champ manquant.",
        );
    }

    prompt
}

/// Convert the recent history plus the new utterance into wire messages,
/// system prompt first.
pub fn build_history(
    system_prompt: &str,
    context: &UserContext,
    user_text: &str,
) -> Vec<ApiMessage> {
    let mut messages = vec![ApiMessage::system(system_prompt)];

    let start = context.history.len().saturating_sub(HISTORY_WINDOW);
    for msg in &context.history[start..] {
        messages.push(match msg.sender {
            Sender::User => ApiMessage::user(&msg.text),
            Sender::Bot => ApiMessage::assistant(&msg.text),
        });
    }

    messages.push(ApiMessage::user(user_text));
    messages
}

// =============================================================================
// Tests
// =============================================================================
