/// Maximum length of a visitor message, in characters
pub const MAX_CHAT_MESSAGE_CHARS: usize = 300;

/// Maximum length of an assistant turn replayed from client history, in characters
pub const MAX_ASSISTANT_TURN_CHARS: usize = 4000;

/// Number of prior conversation entries forwarded upstream
pub const MAX_HISTORY_MESSAGES: usize = 10;

/// Substring the model emits when the visitor should be offered a contact button.
/// Stripped from the final response before it reaches the client.
pub const CONTACT_MARKER: &str = "[MOSTRAR_CONTACTO]";

/// Lowercase vocabulary that signals contact, meeting or pricing intent
pub const CONTACT_KEYWORDS: &[&str] = &[
    "contacto",
    "contactar",
    "contactarme",
    "comunicar",
    "comunicarme",
    "llamar",
    "llamada",
    "llámame",
    "reunión",
    "reunion",
    "agendar",
    "asesoría",
    "asesoria",
    "cotización",
    "cotizacion",
    "presupuesto",
    "precio",
    "costo",
    "tarifa",
    "contratar",
    "interesa",
    "interesado",
    "interesada",
    "whatsapp",
    "correo",
    "teléfono",
    "telefono",
];

/// Text sent to the client whenever something fails inside the stream
pub const GENERIC_STREAM_ERROR: &str =
    "Ocurrió un error al generar la respuesta. Por favor, intenta de nuevo.";

/// Capacity of the per-request channel between the relay task and the SSE body
pub const STREAM_EVENT_BUFFER: usize = 32;

// =============================================================================
// RATE LIMIT POLICY NAMES
// =============================================================================

pub const CHAT_POLICY: &str = "chat";

pub const CONTACT_POLICY: &str = "contact";

/// Identifier used when a request carries neither a forwarded address nor a peer address
pub const ANONYMOUS_IDENTIFIER: &str = "anonymous";
