use std::{
    collections::{BTreeMap, HashMap},
    env,
    ffi::OsString,
};

/// The variables handed to the command we run.
///
/// The process environment is global state, so everything that reads or mutates it goes through
/// this trait. `ProcessEnv` is the real thing; `MemoryEnv` lets tests run without touching the
/// environment of the test binary.
pub trait EnvironmentStore {
    fn get(&self, name: &str) -> Option<String>;

    /// Overwrites any existing value. `name` must be non-empty and free of `=`, and neither side
    /// may contain a NUL byte.
    fn set(&mut self, name: &str, value: &str);

    fn clear(&mut self);

    /// Every variable, including inherited ones that aren't valid unicode.
    fn snapshot(&self) -> BTreeMap<OsString, OsString>;
}

/// The environment of the current process.
#[derive(Debug, Default)]
pub struct ProcessEnv;

impl EnvironmentStore for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        env::var(name).ok()
    }

    fn set(&mut self, name: &str, value: &str) {
        env::set_var(name, value)
    }

    fn clear(&mut self) {
        for (name, _) in env::vars_os() {
            env::remove_var(name);
        }
    }

    fn snapshot(&self) -> BTreeMap<OsString, OsString> {
        env::vars_os().collect()
    }
}

/// An environment that lives only in memory, for tests.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct MemoryEnv {
    vars: HashMap<OsString, OsString>,
}

#[cfg(test)]
impl MemoryEnv {
    pub fn new() -> MemoryEnv {
        MemoryEnv::default()
    }

    /// Seed from the current process environment.
    pub fn inherit() -> MemoryEnv {
        MemoryEnv {
            vars: ProcessEnv.snapshot().into_iter().collect(),
        }
    }
}

#[cfg(test)]
impl<K: Into<OsString>, V: Into<OsString>> FromIterator<(K, V)> for MemoryEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        MemoryEnv {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
impl EnvironmentStore for MemoryEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.vars
            .get(&OsString::from(name))
            .and_then(|v| v.to_str())
            .map(|v| v.to_string())
    }

    fn set(&mut self, name: &str, value: &str) {
        self.vars.insert(name.into(), value.into());
    }

    fn clear(&mut self) {
        self.vars.clear();
    }

    fn snapshot(&self) -> BTreeMap<OsString, OsString> {
        self.vars
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
