use crate::{
    cli::Invocation,
    environment::EnvironmentStore,
    shell::{self, ShellResolver},
};
use log::debug;
use shell_escape as escape;
use std::{
    borrow::Cow,
    io,
    process::{Command, ExitStatus, Stdio},
};

#[derive(thiserror::Error, Debug)]
pub enum ExecError {
    #[error("unable to run `{}`: {}", command, source)]
    Spawn { command: String, source: io::Error },

    #[error("command terminated by signal {}", signal)]
    Signaled { signal: i32 },

    #[error("unable to determine the exit status of the command")]
    UnknownStatus,
}

/// Build the child process: `command args...` as is, or a single script for the platform shell.
///
/// The child sees exactly what `store` holds, and shares our stdin, stdout and stderr.
pub fn build_command(
    invocation: &Invocation,
    resolver: &dyn ShellResolver,
    store: &dyn EnvironmentStore,
) -> Command {
    let mut command = if invocation.use_shell {
        let sh = resolver.resolve();
        let mut command = Command::new(sh.program);
        command.arg(sh.flag);
        script_arg(&mut command, shell::script(&invocation.command, &invocation.args));
        command
    } else {
        let mut command = Command::new(&invocation.command);
        command.args(&invocation.args);
        command
    };

    command
        .env_clear()
        .envs(store.snapshot())
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    command
}

#[cfg(not(windows))]
fn script_arg(command: &mut Command, script: String) {
    command.arg(script);
}

/// `cmd` doesn't unquote its command line the way MSVC programs do, so the script goes through as
/// typed.
#[cfg(windows)]
fn script_arg(command: &mut Command, script: String) {
    use std::os::windows::process::CommandExt;
    command.raw_arg(script);
}

/// Run the command to completion and return its exit code.
pub fn run(
    invocation: &Invocation,
    resolver: &dyn ShellResolver,
    store: &dyn EnvironmentStore,
) -> Result<i32, ExecError> {
    let mut command = build_command(invocation, resolver, store);
    debug!("running {}", describe(&command));

    let status = command.status().map_err(|source| ExecError::Spawn {
        command: invocation.command.clone(),
        source,
    })?;
    exit_code(status)
}

fn exit_code(status: ExitStatus) -> Result<i32, ExecError> {
    if let Some(code) = status.code() {
        debug!("command exited with {}", code);
        return Ok(code);
    }
    match signal(status) {
        Some(signal) => Err(ExecError::Signaled { signal }),
        None => Err(ExecError::UnknownStatus),
    }
}

#[cfg(unix)]
fn signal(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn signal(_status: ExitStatus) -> Option<i32> {
    None
}

fn describe(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(|s| escape::escape(Cow::from(s.to_string_lossy().into_owned())).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        environment::{MemoryEnv, ProcessEnv},
        shell::PlatformShell,
    };
    use std::{env, ffi::OsStr};

    fn invocation(command: &str, args: &[&str], use_shell: bool) -> Invocation {
        Invocation {
            command: command.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            use_shell,
            ..Default::default()
        }
    }

    fn args_of(command: &Command) -> Vec<&OsStr> {
        command.get_args().collect()
    }

    #[test]
    #[cfg(unix)]
    fn test_build_command_shell() {
        let command = build_command(
            &invocation("echo", &["hi"], true),
            &PlatformShell,
            &MemoryEnv::new(),
        );
        assert_eq!(command.get_program(), "sh");
        assert_eq!(args_of(&command), vec!["-c", "echo hi"]);
    }

    #[test]
    #[cfg(windows)]
    fn test_build_command_shell_keeps_quotes() {
        let command = build_command(
            &invocation("echo", &["\"a b\""], true),
            &PlatformShell,
            &MemoryEnv::new(),
        );
        assert_eq!(command.get_program(), "cmd");
        assert_eq!(args_of(&command), vec!["/C", "echo \"a b\""]);
    }

    #[test]
    fn test_build_command_direct() {
        let command = build_command(
            &invocation("echo", &["hi", "-shell"], false),
            &PlatformShell,
            &MemoryEnv::new(),
        );
        assert_eq!(command.get_program(), "echo");
        assert_eq!(args_of(&command), vec!["hi", "-shell"]);
    }

    #[test]
    fn test_build_command_uses_store() {
        let store: MemoryEnv = [("FOO", "bar")].into_iter().collect();
        let command = build_command(&invocation("env", &[], false), &PlatformShell, &store);

        let envs: Vec<_> = command.get_envs().collect();
        assert_eq!(envs, vec![(OsStr::new("FOO"), Some(OsStr::new("bar")))]);
    }

    #[test]
    #[cfg(unix)]
    fn test_describe_escapes() {
        let command = build_command(
            &invocation("echo", &["a b", "c"], false),
            &PlatformShell,
            &MemoryEnv::new(),
        );
        assert_eq!(describe(&command), "echo 'a b' c");
    }

    #[test]
    #[cfg(unix)]
    fn test_run_propagates_exit_code() {
        let store = MemoryEnv::inherit();
        let code = run(&invocation("exit 3", &[], true), &PlatformShell, &store).unwrap();
        assert_eq!(code, 3);

        let code = run(&invocation("true", &[], false), &PlatformShell, &store).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    #[cfg(unix)]
    fn test_run_sees_store_variables() {
        let mut store = MemoryEnv::inherit();
        store.set("DOTRUN_TEST_CHILD", "from the store");
        let code = run(
            &invocation("test", &["\"$DOTRUN_TEST_CHILD\"", "=", "'from the store'"], true),
            &PlatformShell,
            &store,
        )
        .unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    #[cfg(unix)]
    fn test_run_inherits_process_environment() {
        use std::os::unix::ffi::OsStrExt;

        let latin1 = OsStr::from_bytes(b"caf\xe9");
        env::set_var("DOTRUN_TEST_INHERITED_PLAIN", "plain");
        env::set_var("DOTRUN_TEST_INHERITED_LATIN1", latin1);

        let request = invocation(
            "test",
            &[
                "\"$DOTRUN_TEST_INHERITED_PLAIN\"",
                "=",
                "plain",
                "&&",
                "test",
                "-n",
                "\"$DOTRUN_TEST_INHERITED_LATIN1\"",
            ],
            true,
        );
        let command = build_command(&request, &PlatformShell, &ProcessEnv);
        let passed = command
            .get_envs()
            .any(|(k, v)| k == "DOTRUN_TEST_INHERITED_LATIN1" && v == Some(latin1));
        let code = run(&request, &PlatformShell, &ProcessEnv);

        env::remove_var("DOTRUN_TEST_INHERITED_PLAIN");
        env::remove_var("DOTRUN_TEST_INHERITED_LATIN1");

        assert!(passed);
        assert_eq!(code.unwrap(), 0);
    }

    #[test]
    #[cfg(unix)]
    fn test_run_after_clear_hides_inherited_variables() {
        let mut store = MemoryEnv::inherit();
        let path = store.get("PATH");
        store.set("DOTRUN_TEST_HIDDEN", "visible");
        store.clear();
        if let Some(path) = path {
            store.set("PATH", &path);
        }
        let code = run(
            &invocation("test", &["-z", "\"$DOTRUN_TEST_HIDDEN\""], true),
            &PlatformShell,
            &store,
        )
        .unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn test_run_spawn_failure() {
        let err = run(
            &invocation("dotrun-no-such-command", &[], false),
            &PlatformShell,
            &MemoryEnv::inherit(),
        )
        .unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
        assert!(err.to_string().contains("dotrun-no-such-command"));
    }

    #[test]
    #[cfg(unix)]
    fn test_run_killed_by_signal() {
        let err = run(
            &invocation("kill", &["-9", "$$"], true),
            &PlatformShell,
            &MemoryEnv::inherit(),
        )
        .unwrap_err();
        assert!(matches!(err, ExecError::Signaled { signal: 9 }));
    }
}
