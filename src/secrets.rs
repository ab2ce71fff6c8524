use std::env;

pub const GLM_API_KEY_SECRET: &str = "glm_api_key";

/// Optional deployment-level secret storage. A key found here wins over the
/// one typed into the form.
pub trait SecretStore: Send + Sync {
    fn get_secret(&self, name: &str) -> Option<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoSecrets;

impl SecretStore for NoSecrets {
    fn get_secret(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Reads `name` upper-cased from the process environment (`glm_api_key` ->
/// `GLM_API_KEY`). Blank values count as missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    fn lookup_with(
        name: &str,
        mut get_var: impl FnMut(&str) -> Option<String>,
    ) -> Option<String> {
        get_var(&name.to_ascii_uppercase())
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

impl SecretStore for EnvSecretStore {
    fn get_secret(&self, name: &str) -> Option<String> {
        Self::lookup_with(name, |key| env::var(key).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::{EnvSecretStore, GLM_API_KEY_SECRET, NoSecrets, SecretStore};

    #[test]
    fn env_lookup_uses_upper_case_name() {
        let found = EnvSecretStore::lookup_with(GLM_API_KEY_SECRET, |key| {
            (key == "GLM_API_KEY").then(|| " from-env ".to_string())
        });
        assert_eq!(found.as_deref(), Some("from-env"));
    }

    #[test]
    fn env_lookup_treats_blank_as_missing() {
        let found = EnvSecretStore::lookup_with(GLM_API_KEY_SECRET, |_| Some("  ".to_string()));
        assert!(found.is_none());
    }

    #[test]
    fn no_secrets_never_answers() {
        assert!(NoSecrets.get_secret(GLM_API_KEY_SECRET).is_none());
    }
}
