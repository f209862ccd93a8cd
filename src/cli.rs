use std::ffi::OsString;

pub const HELP: &str = "Usage: dotrun [-version] [-help] [-shell] [-only] [-env file]... command [args...]
-version    Print version and exit
-help       Print this help and exit
-shell      Run the command through the platform shell
-only       Clear the environment before loading dotenv files
-env file   Dotenv file to load (may be repeated to load multiple files, defaults to .env)
command     The command to run
args        The command arguments";

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("you must pass a command to run: see `dotrun -help`")]
    MissingCommand,

    #[error("option {} expects a value: see `dotrun -help`", option)]
    MissingOptionValue { option: &'static str },

    #[error("argument is not valid unicode: {}", arg)]
    NotUnicode { arg: String },
}

/// What the command line asked for.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Invocation {
    pub print_version: bool,
    pub print_help: bool,
    pub use_shell: bool,
    pub only: bool,
    /// in command-line order; empty means the default file
    pub env_files: Vec<String>,
    pub command: String,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueOption {
    Env,
}

impl ValueOption {
    fn flag(self) -> &'static str {
        match self {
            ValueOption::Env => "-env",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    AwaitingOption,
    AwaitingOptionValue(ValueOption),
    CollectingArgs,
}

/// Like `parse`, for arguments straight from the OS.
pub fn parse_os(args: Vec<OsString>) -> Result<Invocation, ParseError> {
    let args = args
        .into_iter()
        .map(|arg| {
            arg.into_string().map_err(|arg| ParseError::NotUnicode {
                arg: arg.to_string_lossy().into_owned(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    parse(args)
}

/// Parse our own arguments (program name excluded).
///
/// Options are only recognized before the command: the first token that isn't one of ours becomes
/// the command and everything after it is handed to the command untouched, even if it looks like
/// one of our flags.
pub fn parse(args: Vec<String>) -> Result<Invocation, ParseError> {
    let mut invocation = Invocation::default();
    let mut state = State::AwaitingOption;

    for arg in args {
        state = match state {
            State::AwaitingOption => match arg.as_str() {
                "-version" => {
                    invocation.print_version = true;
                    State::AwaitingOption
                }
                "-help" => {
                    invocation.print_help = true;
                    State::AwaitingOption
                }
                "-shell" => {
                    invocation.use_shell = true;
                    State::AwaitingOption
                }
                "-only" => {
                    invocation.only = true;
                    State::AwaitingOption
                }
                "-env" => State::AwaitingOptionValue(ValueOption::Env),
                _ => {
                    invocation.command = arg;
                    State::CollectingArgs
                }
            },
            State::AwaitingOptionValue(ValueOption::Env) => {
                invocation.env_files.push(arg);
                State::AwaitingOption
            }
            State::CollectingArgs => {
                invocation.args.push(arg);
                State::CollectingArgs
            }
        };
    }

    if let State::AwaitingOptionValue(option) = state {
        return Err(ParseError::MissingOptionValue {
            option: option.flag(),
        });
    }

    if invocation.command.is_empty() && !invocation.print_help && !invocation.print_version {
        return Err(ParseError::MissingCommand);
    }

    Ok(invocation)
}
