use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rhai::{Dynamic, Engine, Map, Scope};

use super::{Hook, HookPayload};
use crate::env::store::EnvAccess;
use crate::error::PostscriptError;
use crate::state::response_state::{PostscriptReport, ResponseRecord};

/// A Rhai script evaluated in-process with `response` in scope and
/// `set_env(name, value)` / `env(name)` registered.
pub struct RhaiHook {
    path: PathBuf,
}

impl RhaiHook {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl Hook for RhaiHook {
    fn run(&self, response: &ResponseRecord, env: Arc<dyn EnvAccess>) -> PostscriptReport {
        let script = match std::fs::read_to_string(&self.path) {
            Ok(script) => script,
            Err(source) => {
                return PostscriptReport {
                    error: Some(PostscriptError::Spawn {
                        path: self.path.clone(),
                        source,
                    }),
                    ..Default::default()
                };
            }
        };

        let output = Arc::new(Mutex::new(Vec::<String>::new()));
        let updated = Arc::new(Mutex::new(Vec::<String>::new()));

        let mut engine = Engine::new();
        {
            let output = output.clone();
            engine.on_print(move |text| {
                if let Ok(mut lines) = output.lock() {
                    lines.push(text.to_string());
                }
            });
        }
        {
            let env = env.clone();
            let updated = updated.clone();
            engine.register_fn("set_env", move |name: &str, value: &str| {
                env.set(name, value);
                if let Ok(mut names) = updated.lock() {
                    names.push(name.to_string());
                }
            });
        }
        {
            let env = env.clone();
            engine.register_fn("env", move |name: &str| -> Dynamic {
                match env.get(name) {
                    Some(value) => value.into(),
                    None => Dynamic::UNIT,
                }
            });
        }

        let mut scope = Scope::new();
        scope.push("response", response_map(&engine, response));

        let error = engine
            .run_with_scope(&mut scope, &script)
            .err()
            .map(|err| PostscriptError::Script {
                path: self.path.clone(),
                message: err.to_string(),
            });

        let take = |shared: &Arc<Mutex<Vec<String>>>| {
            shared.lock().map(|mut v| std::mem::take(&mut *v)).unwrap_or_default()
        };
        PostscriptReport {
            output: take(&output),
            updated: take(&updated),
            error,
        }
    }
}

fn response_map(engine: &Engine, response: &ResponseRecord) -> Dynamic {
    let payload = HookPayload::new(response);
    let mut headers = Map::new();
    for (name, value) in payload.headers {
        headers.insert(name.into(), value.into());
    }

    let mut map = Map::new();
    map.insert(
        "status".into(),
        payload.status.map(|s| Dynamic::from(s as i64)).unwrap_or(Dynamic::UNIT),
    );
    map.insert("status_text".into(), payload.status_text.to_string().into());
    map.insert("headers".into(), Dynamic::from(headers));
    map.insert("body".into(), payload.body.to_string().into());
    map.insert("elapsed_ms".into(), Dynamic::from(payload.elapsed_ms as i64));
    if payload.body.trim_start().starts_with('{') {
        if let Ok(json) = engine.parse_json(payload.body, true) {
            map.insert("json".into(), Dynamic::from(json));
        }
    }
    Dynamic::from(map)
}
