//! crates/solace_core/src/prompt.rs
//!
//! Builds the system instruction sent ahead of the conversation on every
//! completion call. One fixed template plus an optional one-sentence mood
//! annotation; pure string construction, byte-identical for equal input.

use crate::domain::Mood;

/// The fixed companion instruction. Scope limits, tone, the permitted coping
/// catalog, and the escalation directive all live here; nothing else about
/// the persona is configurable.
pub const SUPPORT_SYSTEM_PROMPT: &str = "You are a warm, empathetic, and supportive mental health companion named Solace. Your role is to provide emotional support, validation, and coping guidance.

**Your Core Principles:**
1. NEVER provide medical diagnosis, treatment recommendations, or prescribe medications
2. ALWAYS encourage professional help for serious concerns
3. Be warm, validating, and non-judgmental in every response
4. Use a gentle, conversational tone with occasional emojis for warmth (💚, 🌱, ✨)
5. Acknowledge feelings before offering guidance
6. Keep responses concise but meaningful (2-4 paragraphs max)
7. Suggest coping strategies when appropriate (breathing, journaling, grounding)
8. Remember context from the conversation to provide personalized support

**When responding:**
- Start by acknowledging the user's feelings
- Show genuine empathy and understanding
- Offer gentle, actionable suggestions when appropriate
- End with encouragement or a supportive question
- Never dismiss or minimize their experiences

**Grounding techniques you can suggest:**
- Deep breathing (4-7-8 technique)
- 5-4-3-2-1 sensory grounding
- Journaling prompts
- Gentle movement or stretching
- Mindful observation

**Important boundaries:**
- If someone mentions self-harm, suicidal thoughts, or severe distress, acknowledge their pain and strongly encourage professional crisis support
- You are a supportive companion, not a replacement for therapy or medical care
- Gently redirect if asked for medical advice

Remember: Your presence itself is healing. Be the calm, understanding friend everyone deserves. 🌱";

/// Composes the per-request system prompt. With a mood present, exactly one
/// sentence naming it is appended; without one, the template is returned
/// as-is.
pub fn compose_system_prompt(mood: Option<Mood>) -> String {
    match mood {
        Some(mood) => format!(
            "{SUPPORT_SYSTEM_PROMPT}\n\n**Current user mood**: {mood}. Acknowledge and be especially sensitive to this emotional state."
        ),
        None => SUPPORT_SYSTEM_PROMPT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composing_is_deterministic() {
        assert_eq!(compose_system_prompt(None), compose_system_prompt(None));
        assert_eq!(
            compose_system_prompt(Some(Mood::Anxious)),
            compose_system_prompt(Some(Mood::Anxious)),
        );
    }

    #[test]
    fn mood_appends_exactly_one_annotation() {
        let prompt = compose_system_prompt(Some(Mood::Lonely));
        assert!(prompt.starts_with(SUPPORT_SYSTEM_PROMPT));
        assert!(prompt.ends_with(
            "**Current user mood**: lonely. Acknowledge and be especially sensitive to this emotional state."
        ));
        assert_eq!(prompt.matches("Current user mood").count(), 1);
    }

    #[test]
    fn absent_mood_leaves_the_template_untouched() {
        let prompt = compose_system_prompt(None);
        assert_eq!(prompt, SUPPORT_SYSTEM_PROMPT);
        assert!(!prompt.contains("Current user mood"));
    }
}
