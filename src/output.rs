use anyhow::Error;
use log::LevelFilter;
use regex::Regex;
use std::{env, io::IsTerminal, sync::OnceLock};

// "dotrun" in a light gray, readable on both dark and light backgrounds.
const DOTRUN: &str = "\x1b[38;5;249mdotrun";

const LOG_ENV: &str = "DOTRUN_LOG";
const NO_COLOR_ENV: &str = "DOTRUN_NO_COLOR";

/// Developer diagnostics, quiet unless `$DOTRUN_LOG` asks for more (e.g. `DOTRUN_LOG=debug`).
pub fn init_logging() {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .parse_env(LOG_ENV)
        .format_timestamp(None)
        .init();
}

/// Writes failures to stderr. Built before the environment can be cleared by `-only`, so our own
/// settings are read from the environment we were started with.
#[derive(Debug)]
pub struct Reporter {
    color: bool,
}

impl Reporter {
    pub fn from_env() -> Reporter {
        Reporter {
            color: std::io::stderr().is_terminal() && color_allowed(env::var(NO_COLOR_ENV).ok()),
        }
    }

    pub fn print_error(&self, err: &Error) {
        eprintln!("{}", self.format_error(err));
    }

    fn format_error(&self, err: &Error) -> String {
        if self.color {
            format!(
                "{} \x1b[1;31m{}\x1b[0m",
                DOTRUN,
                backticks_to_bright_green(err)
            )
        } else {
            format!("dotrun: {}", err)
        }
    }
}

fn color_allowed(no_color: Option<String>) -> bool {
    match no_color {
        Some(value) => matches!(value.to_lowercase().as_str(), "0" | "false" | "no" | ""),
        None => true,
    }
}

fn backticks_to_bright_green(err: &Error) -> String {
    static BACKTICKS: OnceLock<Regex> = OnceLock::new();
    let re = BACKTICKS.get_or_init(|| Regex::new(r"`(.*?)`").unwrap());
    let before = format!("{}", err);
    re.replace_all(before.as_ref(), "\x1b[1;32m$1\x1b[1;31m")
        .to_string()
}
