mod cli;
mod environment;
mod execcmd;
mod loader;
mod output;
mod shell;

use crate::{
    environment::{EnvironmentStore, ProcessEnv},
    execcmd::ExecError,
    loader::LoadError,
    shell::{PlatformShell, ShellResolver},
};
use anyhow::Error;
use std::{env, ffi::OsString, io::Write, process};

const EXIT_PARSE_ERROR: i32 = 1;
const EXIT_LOAD_ERROR: i32 = 2;
/// The command couldn't be started, or ended without an exit code.
const EXIT_EXEC_FAILURE: i32 = -4;

fn main() {
    output::init_logging();
    let reporter = output::Reporter::from_env();

    let args: Vec<OsString> = env::args_os().skip(1).collect();
    let code = match run(args, &mut ProcessEnv, &PlatformShell, &mut std::io::stdout()) {
        Ok(code) => code,
        Err(err) => {
            reporter.print_error(&err);
            exit_code(&err)
        }
    };

    process::exit(code);
}

/// Parse `args`, load the dotenv files into `store` and run the command. Returns the code we
/// should exit with.
fn run(
    args: Vec<OsString>,
    store: &mut dyn EnvironmentStore,
    resolver: &dyn ShellResolver,
    out: &mut dyn Write,
) -> Result<i32, Error> {
    let invocation = cli::parse_os(args)?;

    if invocation.print_version {
        writeln!(out, "{}", cli::version())?;
        return Ok(0);
    }
    if invocation.print_help {
        writeln!(out, "{}", cli::HELP)?;
        return Ok(0);
    }

    loader::load_all(store, &invocation.env_files, invocation.only)?;

    Ok(execcmd::run(&invocation, resolver, store)?)
}

fn exit_code(err: &Error) -> i32 {
    if err.downcast_ref::<LoadError>().is_some() {
        EXIT_LOAD_ERROR
    } else if err.downcast_ref::<ExecError>().is_some() {
        EXIT_EXEC_FAILURE
    } else {
        // bad arguments, or failing to print help or version
        EXIT_PARSE_ERROR
    }
}
