/// Settings for the AI-assisted path, supplied by the settings collaborator.
/// Both fields absent means the AI path is unavailable — that is a reported
/// reason, never a startup failure.
#[derive(Debug, Clone, Default)]
pub struct AiSettings {
    pub api_key: Option<String>,
    pub model: Option<String>,
}

impl AiSettings {
    pub fn new(api_key: Option<String>, model: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.filter(|m| !m.trim().is_empty()),
        }
    }

    /// Loads settings from `GEMINI_API_KEY` / `GEMINI_MODEL`, honouring a
    /// `.env` file if present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::new(
            std::env::var("GEMINI_API_KEY").ok(),
            std::env::var("GEMINI_MODEL").ok(),
        )
    }

    /// Both a key and a model are required before any request is attempted.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.api_key.as_deref(), self.model.as_deref()) {
            (Some(key), Some(model)) => Some((key, model)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_values_count_as_missing() {
        let settings = AiSettings::new(Some("  ".to_string()), Some("gemini-pro".to_string()));
        assert!(settings.credentials().is_none());
    }

    #[test]
    fn test_credentials_present_when_both_set() {
        let settings = AiSettings::new(
            Some("key-123".to_string()),
            Some("gemini-pro".to_string()),
        );
        assert_eq!(settings.credentials(), Some(("key-123", "gemini-pro")));
    }

    #[test]
    fn test_default_is_unconfigured() {
        assert!(AiSettings::default().credentials().is_none());
    }
}
