//! Environment variable overrides.
//!
//! With [`EnvironmentOverride`] active, a keyed read first looks for an
//! environment variable named after the key. `"server.port"` becomes
//! `SERVER_PORT`. When the container also has path access, the container's
//! own path is included, so reading `"port"` from the mapping at
//! `.server` consults `SERVER_PORT` and then `PORT`.
//!
//! Variable contents are parsed as JSON when possible and used verbatim
//! otherwise. The container is never modified; the read runs against a copy
//! holding the override.

use std::fmt;
use std::rc::Rc;
use std::sync::OnceLock;

use burrow::{
    wrap, Args, Capability, Container, Decorator, DecoratorId, Key, Next, Operation, Owner, Result,
    Value, Viral, WrapOptions, PATHED,
};
use regex::Regex;
use tracing::debug;

use crate::dup::recursive_dup;

/// Name of the [`EnvironmentOverride`] capability.
pub const ENVIRONMENT_OVERRIDE: &str = "environment_override";

/// Looks up a variable by name.
pub type EnvSource = dyn Fn(&str) -> Option<String>;

fn non_alnum() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^[:alnum:]]+").expect("valid pattern"))
}

/// Converts a key or path to an environment variable name.
///
/// # Example
///
/// ```
/// use burrow_caps::key_to_env;
///
/// assert_eq!(key_to_env("some!@email.org"), "SOME_EMAIL_ORG");
/// assert_eq!(key_to_env(".foo.bar"), "FOO_BAR");
/// assert_eq!(key_to_env("."), "");
/// ```
pub fn key_to_env(key: &str) -> String {
    let upper = key.to_uppercase();
    non_alnum()
        .replace_all(&upper, "_")
        .trim_matches('_')
        .to_string()
}

/// Overrides keyed reads with environment variables.
#[derive(Clone)]
pub struct EnvironmentOverride {
    source: Rc<EnvSource>,
    id: DecoratorId,
}

impl Default for EnvironmentOverride {
    fn default() -> Self {
        Self::with_source(|name| std::env::var(name).ok())
    }
}

impl EnvironmentOverride {
    /// Reads the process environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads variables from `source` instead of the process environment.
    pub fn with_source<F>(source: F) -> Self
    where
        F: Fn(&str) -> Option<String> + 'static,
    {
        EnvironmentOverride {
            source: Rc::new(source),
            id: DecoratorId::fresh(),
        }
    }
}

impl fmt::Debug for EnvironmentOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentOverride")
            .field("id", &self.id)
            .finish()
    }
}

impl Capability for EnvironmentOverride {
    fn name(&self) -> &str {
        ENVIRONMENT_OVERRIDE
    }

    fn requires(&self) -> Vec<Rc<dyn Capability>> {
        vec![Rc::new(Viral)]
    }

    fn install(&self, owner: Owner<'_>) -> Result<()> {
        for operation in Operation::KEYED_READ {
            let source = self.source.clone();
            let read = Decorator::with_id(self.id, "environment.read", move |next, args| {
                override_read(next, args, source.as_ref())
            });
            wrap(owner, operation, read, WrapOptions::default())?;
        }
        Ok(())
    }
}

/// Variable names to try for `key`, most qualified first.
pub fn candidate_names(receiver: &Container, key: &Key) -> Vec<String> {
    let mut paths = Vec::new();
    if receiver.has_capability(PATHED) {
        let mut components = receiver.path_components(receiver.path_prefix());
        let key_components = receiver.path_components(key.text().into_owned());
        if key_components.first() == components.last() {
            components.pop();
        }
        components.extend(key_components);
        while !components.is_empty() {
            paths.push(receiver.normalize_path(components.clone()));
            components.remove(0);
        }
    } else {
        paths.push(key.to_string());
    }

    let mut names: Vec<String> = Vec::new();
    for path in paths {
        let name = key_to_env(&path);
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

fn override_read(next: &Next<'_>, args: Args, source: &EnvSource) -> Result<Value> {
    let Some(key) = args.key().cloned() else {
        return next.call(args);
    };
    let Some(replacement) = find_override(next, &key, source)? else {
        return next.call(args);
    };
    let double = recursive_dup(next.receiver())?;
    double.store(key, replacement)?;
    double.invoke(next.operation(), args)
}

fn find_override(next: &Next<'_>, key: &Key, source: &EnvSource) -> Result<Option<Value>> {
    for name in candidate_names(next.receiver(), key) {
        let Some(raw) = source(&name) else {
            continue;
        };
        let parsed = match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(json) => Value::from(json),
            Err(_) => Value::Str(raw),
        };
        if parsed.is_null() {
            return Ok(None);
        }
        let current = next.dispatch(Operation::Get, Args::keyed(key.clone()))?;
        if parsed == current {
            return Ok(None);
        }
        debug!(variable = %name, key = %key, "environment override");
        return Ok(Some(parsed));
    }
    Ok(None)
}
