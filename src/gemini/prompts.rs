//! Prompt templates and the structured-output schema for the teaching

use serde_json::{json, Value};

pub const WISDOM_TEMPERATURE: f32 = 0.7;
pub const ECHO_TEMPERATURE: f32 = 0.8;

pub fn wisdom_prompt(exclude_terms: &[String]) -> String {
    let exclude_list = if exclude_terms.is_empty() {
        String::new()
    } else {
        format!("Please avoid these previously generated terms: {}.", exclude_terms.join(", "))
    };
    format!(
        "Generate a profound Buddhist philosophical concept for a \"Word of the Day\" app. \
         It should be a concept from Theravada, Mahayana, Zen, or Tibetan traditions. \
         Focus on concepts that offer psychological insight or ethical guidance. {} \
         Ensure the tone is serene, wise, and accessible to laypeople.",
        exclude_list
    )
}

pub fn reflective_echo_prompt(concept: &str, reflection: &str) -> String {
    format!(
        "The user is reflecting on the Buddhist concept of \"{}\". User's reflection: \"{}\" \
         Provide a one-sentence \"Dharma Echo\", a short, compassionate, and wise response that \
         validates their feeling and connects it back to the essence of the teaching. \
         The response should be very brief (under 20 words), warm, and supportive. \
         Use a gentle, non-judgmental tone.",
        concept, reflection
    )
}

pub fn speech_prompt(script: &str) -> String {
    format!("Speak slowly and serenely like a calm, soothing meditation teacher: {}", script)
}

fn string_property(description: &str) -> Value {
    json!({ "type": "STRING", "description": description })
}

/// JSON schema the text model must follow when generating a teaching.
pub fn wisdom_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "term": string_property("The Buddhist concept in English alphabet (e.g., 'Metta', 'Dukkha', 'Sunyata')."),
            "originalTerm": string_property("The term in its original language script or standard romanization if different."),
            "language": string_property("The origin language, e.g., 'Pali' or 'Sanskrit'."),
            "translation": string_property("A short, direct English translation of the word."),
            "definition": string_property("A concise definition of what the concept means."),
            "wisdom": string_property("A deeper explanation of the Buddhist philosophy behind this concept. About 2-3 sentences."),
            "application": string_property("Practical advice on how to apply this wisdom in modern daily life. About 2-3 sentences."),
            "reflectionPrompt": string_property("A specific question or small action for the user to ponder or do today."),
            "affirmation": string_property("A powerful, short 'I AM' affirmation based on this concept (e.g., 'I am a source of loving-kindness')."),
        },
        "required": [
            "term", "originalTerm", "language", "translation", "definition",
            "wisdom", "application", "reflectionPrompt", "affirmation"
        ]
    })
}
