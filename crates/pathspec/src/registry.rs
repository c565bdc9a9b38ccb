/*!
A process-wide registry of named pattern factories.

The registry is populated idempotently on first use (via [`OnceLock`]) and
is intended to be read-only thereafter: built-in factories are installed
once, and callers may register additional factories under new names.
*/

use std::{
    collections::HashMap,
    sync::{Mutex, OnceLock},
};

use crate::{
    error::Error,
    gitignore::Dialect,
    pattern::Pattern,
};

/// A function that compiles one raw pattern line into a [`Pattern`].
pub type PatternFactory = fn(&str) -> Result<Pattern, Error>;

/// The documented `gitignore(5)` dialect. Registered as `"gitignore"`.
pub fn gitignore_documented(line: &str) -> Result<Pattern, Error> {
    crate::gitignore::compile_line(line, Dialect::Documented)
}

/// Git's actual behavior. Registered internally as `"gitignore-spec"` and
/// used by [`crate::spec::GitIgnoreSpec`] directly.
pub fn gitignore_spec(line: &str) -> Result<Pattern, Error> {
    crate::gitignore::compile_line(line, Dialect::Spec)
}

fn registry() -> &'static Mutex<HashMap<String, PatternFactory>> {
    static REGISTRY: OnceLock<Mutex<HashMap<String, PatternFactory>>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut map = HashMap::new();
        map.insert("gitignore".to_string(), gitignore_documented as PatternFactory);
        map.insert("gitignore-spec".to_string(), gitignore_spec as PatternFactory);
        map.insert("gitwildmatch".to_string(), gitignore_spec as PatternFactory);
        Mutex::new(map)
    })
}

/// Register a new pattern factory under `name`.
///
/// Fails with [`Error::AlreadyRegistered`] if `name` is already taken and
/// `override_existing` is false.
pub fn register_pattern(
    name: &str,
    factory: PatternFactory,
    override_existing: bool,
) -> Result<(), Error> {
    let mut map = registry().lock().unwrap();
    if !override_existing && map.contains_key(name) {
        return Err(Error::AlreadyRegistered { name: name.to_string() });
    }
    map.insert(name.to_string(), factory);
    Ok(())
}

/// Look up a pattern factory by name.
pub fn lookup_pattern(name: &str) -> Result<PatternFactory, Error> {
    if name == "gitwildmatch" {
        log::warn!(
            "\"gitwildmatch\" is a deprecated alias for the gitignore-spec dialect"
        );
    }
    let map = registry().lock().unwrap();
    map.get(name).copied().ok_or_else(|| Error::Unknown {
        kind: "pattern factory",
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        assert!(lookup_pattern("gitignore").is_ok());
        assert!(lookup_pattern("gitignore-spec").is_ok());
        assert!(lookup_pattern("gitwildmatch").is_ok());
        assert!(lookup_pattern("nonexistent").is_err());
    }

    #[test]
    fn register_rejects_collisions_without_override() {
        fn my_factory(line: &str) -> Result<Pattern, Error> {
            gitignore_spec(line)
        }
        register_pattern("test-dialect-a", my_factory, false).unwrap();
        assert!(register_pattern("test-dialect-a", my_factory, false).is_err());
        assert!(register_pattern("test-dialect-a", my_factory, true).is_ok());
    }
}
