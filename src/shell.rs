/// A command interpreter and the flag that makes it run its next argument as a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shell {
    pub program: String,
    pub flag: String,
}

pub trait ShellResolver {
    fn resolve(&self) -> Shell;
}

/// `sh -c` everywhere except Windows, where it's `cmd /C`.
#[derive(Debug, Default)]
pub struct PlatformShell;

impl ShellResolver for PlatformShell {
    fn resolve(&self) -> Shell {
        if cfg!(windows) {
            Shell {
                program: "cmd".to_string(),
                flag: "/C".to_string(),
            }
        } else {
            Shell {
                program: "sh".to_string(),
                flag: "-c".to_string(),
            }
        }
    }
}

/// The script handed to the shell: command and arguments joined by single spaces, as typed.
pub fn script(command: &str, args: &[String]) -> String {
    let mut script = command.to_string();
    for arg in args {
        script.push(' ');
        script.push_str(arg);
    }
    script
}
