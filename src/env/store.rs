use std::collections::HashMap;
use std::sync::RwLock;

/// Read/write access to the environment that `$env.NAME$` placeholders and
/// postscript hooks share.
pub trait EnvAccess: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str);
    /// Values written through [`EnvAccess::set`], handed to child hooks.
    fn overrides(&self) -> Vec<(String, String)>;
}

/// The process environment with hook-written values layered on top.
///
/// Writes never touch the real process environment, so reads from other
/// threads stay sound; later child processes inherit the overlay instead.
#[derive(Debug, Default)]
pub struct ProcessEnv {
    overlay: RwLock<HashMap<String, String>>,
}

impl ProcessEnv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EnvAccess for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        let overlay = self.overlay.read().unwrap_or_else(|e| e.into_inner());
        match overlay.get(name) {
            Some(value) => Some(value.clone()),
            None => std::env::var(name).ok(),
        }
    }

    fn set(&self, name: &str, value: &str) {
        let mut overlay = self.overlay.write().unwrap_or_else(|e| e.into_inner());
        overlay.insert(name.to_string(), value.to_string());
    }

    fn overrides(&self) -> Vec<(String, String)> {
        let overlay = self.overlay.read().unwrap_or_else(|e| e.into_inner());
        let mut pairs: Vec<(String, String)> =
            overlay.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        pairs.sort();
        pairs
    }
}

/// In-memory environment for tests.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryEnv {
    vars: RwLock<HashMap<String, String>>,
}

#[cfg(test)]
impl MemoryEnv {
    pub fn with(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            vars: RwLock::new(vars),
        }
    }
}

#[cfg(test)]
impl EnvAccess for MemoryEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.read().unwrap().get(name).cloned()
    }

    fn set(&self, name: &str, value: &str) {
        self.vars.write().unwrap().insert(name.to_string(), value.to_string());
    }

    fn overrides(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .vars
            .read()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        pairs.sort();
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_shadows_process_env() {
        let env = ProcessEnv::new();
        assert!(env.get("PATH").is_some());
        env.set("PATH", "shadowed");
        assert_eq!(env.get("PATH").as_deref(), Some("shadowed"));
        assert_eq!(env.overrides(), vec![("PATH".to_string(), "shadowed".to_string())]);
    }

    #[test]
    fn test_unset_is_none() {
        let env = ProcessEnv::new();
        assert_eq!(env.get("HTTUI_TEST_SURELY_UNSET_VARIABLE"), None);
    }
}
