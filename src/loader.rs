use crate::environment::EnvironmentStore;
use log::debug;
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::PathBuf,
};

/// Loaded when no `-env` option is given, relative to the working directory.
pub const DEFAULT_ENV_FILE: &str = ".env";

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("ERROR loading dotenv file '{}': {}", path, source)]
    Open { path: String, source: io::Error },

    #[error("ERROR loading dotenv file '{}': {}", path, source)]
    Read { path: String, source: io::Error },

    #[error("ERROR loading dotenv file '{}': bad environment line: '{}'", path, line)]
    MalformedLine { path: String, line: String },
}

/// Expand a leading `~/` to the home directory. Anything else (including a bare `~` or `~user/`)
/// is returned as is, and so is `~/...` when the home directory can't be found.
pub fn expand_path(path: &str) -> PathBuf {
    expand_path_with(path, dirs::home_dir().map(|h| h.to_string_lossy().into_owned()))
}

fn expand_path_with(path: &str, home: Option<String>) -> PathBuf {
    if !path.starts_with("~/") {
        return PathBuf::from(path);
    }
    if home.is_none() {
        debug!("no home directory to expand {}", path);
    }
    PathBuf::from(shellexpand::tilde_with_context(path, || home).into_owned())
}

/// Apply the dotenv file at `path` to `store`, clearing the store first if asked to.
///
/// Each entry is written as soon as its line is parsed: when a malformed line aborts the load, the
/// lines above it stay applied.
pub fn load(
    store: &mut dyn EnvironmentStore,
    path: &str,
    clear_first: bool,
) -> Result<(), LoadError> {
    let expanded = expand_path(path);
    debug!("loading {}", expanded.display());

    if clear_first {
        debug!("clearing environment");
        store.clear();
    }

    let file = File::open(&expanded).map_err(|source| LoadError::Open {
        path: path.to_string(),
        source,
    })?;

    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| LoadError::Read {
            path: path.to_string(),
            source,
        })?;

        match parse_line(&line) {
            Ok(None) => continue,
            Ok(Some((name, value))) => {
                if store.get(name).is_some() {
                    debug!("overriding {}", name);
                } else {
                    debug!("setting {}", name);
                }
                store.set(name, value);
            }
            Err(line) => {
                return Err(LoadError::MalformedLine {
                    path: path.to_string(),
                    line: line.to_string(),
                })
            }
        }
    }

    Ok(())
}

/// Load every file in order, or the default one if there are none. Only the first load clears
/// the store, and the first failure stops everything.
pub fn load_all(
    store: &mut dyn EnvironmentStore,
    files: &[String],
    only: bool,
) -> Result<(), LoadError> {
    let default = [DEFAULT_ENV_FILE.to_string()];
    let files = if files.is_empty() { &default[..] } else { files };

    for (i, file) in files.iter().enumerate() {
        load(store, file, only && i == 0)?;
    }
    Ok(())
}

/// `Ok(None)` for blank lines and comments. The error is the trimmed line.
fn parse_line(line: &str) -> Result<Option<(&str, &str)>, &str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (name, value) = line.split_once('=').ok_or(line)?;
    let (name, value) = (name.trim(), value.trim());

    // can't be stored in a process environment
    if name.is_empty() || name.contains('\0') || value.contains('\0') {
        return Err(line);
    }

    Ok(Some((name, value)))
}
