/// Trait for loading client configuration from environment variables.
///
/// Implementors derive `serde::Deserialize` and get `from_env()` /
/// `from_env_prefixed()` for free. Field names map to upper-snake-case env
/// vars (`api_key` → `API_KEY`, or `DUET_API_KEY` with the `"DUET_"` prefix).
///
/// # Panics
///
/// Panics if a required env var is missing or cannot be deserialized. Config
/// is loaded once at startup; a bad environment is not recoverable.
pub trait Config: Sized + serde::de::DeserializeOwned {
    fn from_env() -> Self {
        envy::from_env().expect("failed to load config from environment")
    }

    fn from_env_prefixed(prefix: &str) -> Self {
        envy::prefixed(prefix)
            .from_env()
            .expect("failed to load config from environment")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(serde::Deserialize)]
    struct SampleConfig {
        duet_sample_value: String,
        duet_sample_port: u16,
    }

    impl Config for SampleConfig {}

    #[derive(serde::Deserialize)]
    struct PrefixedConfig {
        sample_value: String,
    }

    impl Config for PrefixedConfig {}

    #[test]
    fn loads_fields_from_env() {
        // Uppercase field names are the env var names.
        unsafe {
            std::env::set_var("DUET_SAMPLE_VALUE", "hello");
            std::env::set_var("DUET_SAMPLE_PORT", "8080");
        }
        let config = SampleConfig::from_env();
        assert_eq!(config.duet_sample_value, "hello");
        assert_eq!(config.duet_sample_port, 8080);
    }

    #[test]
    fn prefixed_loading_strips_the_prefix() {
        unsafe {
            std::env::set_var("DUET_SAMPLE_VALUE", "hello");
        }
        let config = PrefixedConfig::from_env_prefixed("DUET_");
        assert_eq!(config.sample_value, "hello");
    }
}
