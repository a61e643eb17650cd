//! Prompt templates and the texts shown when generation doesn't work out.

/// Shown when the companion gets an empty answer.
pub const COMPANION_EMPTY_FALLBACK: &str =
    "My heart is full of love for you, even when words are few. 💖";

/// Shown when the companion request fails.
pub const COMPANION_ERROR_FALLBACK: &str = "Thinking of our journey... it's simply wonderful! 🥰";

pub fn poem(months_together: u32, user_name: &str, partner_name: &str) -> String {
    format!(
        "Write a short, personalized love poem for {user_name} to give to {partner_name} \
        celebrating {months_together} months together. The poem should be no more than 6 lines."
    )
}

pub fn companion(milestone: Option<&str>, user_interaction: Option<&str>) -> String {
    format!(
        r#"You are a supportive and affectionate AI companion, designed to enhance the emotional impact of an anniversary web experience.

Based on the relationship milestone or user interaction, provide a relevant and heartwarming message. The message should be relatively short and sweet.

Examples:
- Milestone: "11 months" -> Message: "11 months and counting... ready for 100 more?"
- User Interaction: "clicked surprise button" -> Message: "She's going to love this... 💌"
- User Interaction: "requested another thought" -> Message: "Thinking of you always brings a smile to my face! 😊"
- User Interaction: "viewed first memory" -> Message: "Remember that first spark? It still burns so brightly! ✨"

Milestone: {}
User Interaction: {}

Respond with a single, unique, and heartfelt message. Avoid repetition if similar inputs are provided."#,
        milestone.unwrap_or(""),
        user_interaction.unwrap_or(""),
    )
}

/// Prompt for a memory card illustration, from the memory's hint.
pub fn memory_image(hint: &str) -> String {
    format!(
        "A dreamy, romantic illustration of a cherished memory: {}. \
        Soft warm light, gentle colors, no text.",
        hint.trim()
    )
}

/// Prompt for the free-form image studio. The user's words are used as is.
pub fn studio_image(prompt: &str) -> String {
    prompt.trim().to_string()
}
