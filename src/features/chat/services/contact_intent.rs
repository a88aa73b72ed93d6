use crate::shared::constants::{CONTACT_KEYWORDS, CONTACT_MARKER};

/// Whether the visitor should be offered a way to get in touch.
///
/// Two tiers: the model's explicit marker, then a keyword scan of the visitor's
/// own message. The keyword tier is only evaluated when the marker is absent, so
/// at most one of the two flags is ever set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactIntent {
    /// The generated text carried the contact marker
    pub explicit: bool,
    /// The visitor's message used contact, meeting or pricing vocabulary
    pub inferred: bool,
}

impl ContactIntent {
    pub fn classify(generated_text: &str, user_message: &str) -> Self {
        if generated_text.contains(CONTACT_MARKER) {
            return Self {
                explicit: true,
                inferred: false,
            };
        }

        Self {
            explicit: false,
            inferred: mentions_contact_keyword(user_message),
        }
    }

    pub fn show_contact_button(&self) -> bool {
        self.explicit || self.inferred
    }
}

fn mentions_contact_keyword(text: &str) -> bool {
    let lowered = text.to_lowercase();
    CONTACT_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

/// Remove every occurrence of the contact marker, then trim once
pub fn strip_contact_marker(text: &str) -> String {
    text.replace(CONTACT_MARKER, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_sets_explicit_intent() {
        let text = format!("Con gusto te ayudamos.\n{}", CONTACT_MARKER);
        let intent = ContactIntent::classify(&text, "hola");
        assert!(intent.explicit);
        assert!(!intent.inferred);
        assert!(intent.show_contact_button());
    }

    #[test]
    fn test_marker_short_circuits_keyword_tier() {
        let text = format!("Claro. {}", CONTACT_MARKER);
        let intent = ContactIntent::classify(&text, "quiero contactarme");
        assert_eq!(
            intent,
            ContactIntent {
                explicit: true,
                inferred: false
            }
        );
    }

    #[test]
    fn test_keyword_fallback() {
        let intent = ContactIntent::classify("Somos una consultora de RH.", "quiero contactarme");
        assert!(!intent.explicit);
        assert!(intent.inferred);
        assert!(intent.show_contact_button());
    }

    #[test]
    fn test_keyword_match_ignores_case() {
        let intent = ContactIntent::classify("", "¿Cuál es el PRECIO del servicio?");
        assert!(intent.show_contact_button());

        let intent = ContactIntent::classify("", "Quisiera agendar una REUNIÓN");
        assert!(intent.show_contact_button());
    }

    #[test]
    fn test_no_signal() {
        let intent = ContactIntent::classify("¡Hola! ¿En qué puedo ayudarte?", "hola");
        assert_eq!(intent, ContactIntent::default());
        assert!(!intent.show_contact_button());
    }

    #[test]
    fn test_strip_marker() {
        let text = format!("Podemos ayudarte con eso.\n\n{}\n", CONTACT_MARKER);
        assert_eq!(strip_contact_marker(&text), "Podemos ayudarte con eso.");

        let inline = format!("Escríbenos {}y te contactamos.", CONTACT_MARKER);
        assert_eq!(strip_contact_marker(&inline), "Escríbenos y te contactamos.");

        assert_eq!(strip_contact_marker("  sin marcador  "), "sin marcador");
    }
}
