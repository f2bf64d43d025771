//! Environment and file lookups for a flag's initial value.

use std::fs;

/// Where environment variables are read from during registration.
#[derive(Debug, Clone, Default)]
pub enum Environment {
    /// The current process environment.
    #[default]
    Process,
    /// A fixed snapshot, e.g. for tests or embedding.
    Fixed(Vec<(String, String)>),
}

impl Environment {
    pub fn fixed<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Fixed(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// A variable that is set but empty still counts as defined.
    pub fn var(&self, key: &str) -> Option<String> {
        match self {
            Self::Process => std::env::var_os(key).map(|v| v.to_string_lossy().into_owned()),
            Self::Fixed(vars) => vars
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone()),
        }
    }
}

/// Which source produced a flag's initial value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Env(String),
    File(String),
}

/// First defined env var wins, then the first readable file.
pub(crate) fn lookup(
    env: &Environment,
    env_vars: &[String],
    file_paths: &[String],
) -> Option<(String, Origin)> {
    for key in env_vars.iter().map(|k| k.trim()).filter(|k| !k.is_empty()) {
        if let Some(value) = env.var(key) {
            return Some((value, Origin::Env(key.to_string())));
        }
    }
    for path in file_paths.iter().filter(|p| !p.is_empty()) {
        match fs::read_to_string(path) {
            Ok(contents) => return Some((contents, Origin::File(path.clone()))),
            Err(err) => tracing::trace!(path = %path, error = %err, "flag source file not readable"),
        }
    }
    None
}
