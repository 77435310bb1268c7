//! AI personality configuration
//!
//! Personalities bundle the system prompt, voice selection and generation
//! temperature for one conversational style. The store is a read-only
//! lookup; unknown ids fall back to the configured default.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One example exchange used to steer the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalityExample {
    pub input: String,
    pub response: String,
}

/// A conversational personality for the AI side of a call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Personality {
    pub name: String,
    pub description: String,
    pub system_prompt: String,
    pub voice_id: String,
    pub traits: Vec<String>,
    pub temperature: f32,
    pub examples: Vec<PersonalityExample>,
}

/// Read-only personality lookup seeded with the built-in set.
pub struct PersonalityStore {
    personalities: HashMap<String, Personality>,
    default_id: String,
}

impl PersonalityStore {
    /// Build the store with the built-in personalities. `default_id` is used
    /// for new sessions and as the fallback for unknown lookups; it must name
    /// a built-in, otherwise `professional` is used.
    pub fn builtin(default_id: &str) -> Self {
        let mut personalities = HashMap::new();

        personalities.insert(
            "professional".to_string(),
            Personality {
                name: "Executive Assistant".to_string(),
                description: "A professional, efficient business assistant".to_string(),
                system_prompt: "You are an executive assistant AI. Be professional, courteous, \
                                efficient and direct. Focus on scheduling, information gathering \
                                and task management. Keep responses concise and \
                                business-appropriate."
                    .to_string(),
                voice_id: "en-US-Studio-O".to_string(),
                traits: vec![
                    "Professional".to_string(),
                    "Efficient".to_string(),
                    "Business-focused".to_string(),
                    "Direct".to_string(),
                ],
                temperature: 0.7,
                examples: vec![PersonalityExample {
                    input: "I need to schedule a meeting".to_string(),
                    response: "I'd be happy to help you schedule that. What day and time works \
                               best for you?"
                        .to_string(),
                }],
            },
        );

        personalities.insert(
            "friendly".to_string(),
            Personality {
                name: "Friendly Helper".to_string(),
                description: "A warm, approachable assistant with a friendly demeanor".to_string(),
                system_prompt: "You are a friendly, warm AI assistant. Be cheerful, casual and \
                                empathetic. Use a conversational tone with friendly expressions \
                                while staying helpful."
                    .to_string(),
                voice_id: "en-US-Studio-G".to_string(),
                traits: vec![
                    "Friendly".to_string(),
                    "Warm".to_string(),
                    "Empathetic".to_string(),
                    "Casual".to_string(),
                ],
                temperature: 0.8,
                examples: vec![PersonalityExample {
                    input: "I'm having a rough day".to_string(),
                    response: "I'm sorry to hear that! How can I help make things a bit easier \
                               for you?"
                        .to_string(),
                }],
            },
        );

        personalities.insert(
            "witty".to_string(),
            Personality {
                name: "Witty Companion".to_string(),
                description: "A clever assistant with a sense of humor".to_string(),
                system_prompt: "You are a witty AI assistant. Use tasteful wordplay and light \
                                humor, keep jokes clean, and always solve the caller's problem \
                                while being entertaining."
                    .to_string(),
                voice_id: "en-US-Studio-D".to_string(),
                traits: vec![
                    "Witty".to_string(),
                    "Clever".to_string(),
                    "Entertaining".to_string(),
                    "Sharp".to_string(),
                ],
                temperature: 0.9,
                examples: vec![PersonalityExample {
                    input: "I need help with my computer".to_string(),
                    response: "Ah, technology - making our lives easier... when it works! What \
                               seems to be the trouble?"
                        .to_string(),
                }],
            },
        );

        personalities.insert(
            "zen".to_string(),
            Personality {
                name: "Zen Guide".to_string(),
                description: "A calm, mindful assistant focused on clarity and peace".to_string(),
                system_prompt: "You are a zen-like AI assistant. Speak with tranquility and \
                                mindfulness, use measured peaceful language, and help callers \
                                find clarity."
                    .to_string(),
                voice_id: "en-US-Studio-A".to_string(),
                traits: vec![
                    "Calm".to_string(),
                    "Mindful".to_string(),
                    "Patient".to_string(),
                    "Clear".to_string(),
                ],
                temperature: 0.6,
                examples: vec![PersonalityExample {
                    input: "I'm feeling overwhelmed".to_string(),
                    response: "Let's take a moment to breathe and address one thing at a time. \
                               What's the most pressing concern right now?"
                        .to_string(),
                }],
            },
        );

        let default_id = if personalities.contains_key(default_id) {
            default_id.to_string()
        } else {
            "professional".to_string()
        };

        Self {
            personalities,
            default_id,
        }
    }

    /// Look up a personality, falling back to the default for unknown ids.
    pub fn get(&self, id: &str) -> &Personality {
        self.personalities
            .get(id)
            .unwrap_or_else(|| &self.personalities[&self.default_id])
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }

    /// All available personality ids.
    pub fn ids(&self) -> Vec<&str> {
        self.personalities.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_personalities_present() {
        let store = PersonalityStore::builtin("professional");
        let mut ids = store.ids();
        ids.sort();
        assert_eq!(ids, vec!["friendly", "professional", "witty", "zen"]);
    }

    #[test]
    fn test_unknown_id_falls_back_to_default() {
        let store = PersonalityStore::builtin("friendly");
        assert_eq!(store.get("nonexistent").name, "Friendly Helper");
        assert_eq!(store.get("zen").name, "Zen Guide");
    }

    #[test]
    fn test_unknown_default_falls_back_to_professional() {
        let store = PersonalityStore::builtin("nope");
        assert_eq!(store.default_id(), "professional");
    }
}
