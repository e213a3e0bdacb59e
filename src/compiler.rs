use std::process::{Command, ExitStatus};

use anyhow::{Context, Result};
use itertools::Itertools;
use log::{info, warn};

use crate::invocation::Invocation;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Launch {
    /// Run the compiler directly, passing every argument through untouched.
    #[default]
    Direct,
    /// Join everything with spaces and hand the line to the system shell.
    Shell,
}

pub fn command(invocation: &Invocation, launch: Launch) -> Command {
    match launch {
        Launch::Direct => {
            let words = invocation.compiler_words();
            let (program, leading) = match words.split_first() {
                Some((program, leading)) => (program.as_str(), leading),
                None => (invocation.compiler.as_str(), &[][..]),
            };
            let mut cmd = Command::new(program);
            cmd.args(leading).args(&invocation.args);
            cmd
        }
        Launch::Shell => {
            let line = shell_line(invocation);
            let mut cmd = if cfg!(windows) {
                let mut cmd = Command::new("cmd");
                cmd.arg("/C");
                cmd
            } else {
                let mut cmd = Command::new("sh");
                cmd.arg("-c");
                cmd
            };
            cmd.arg(line);
            cmd
        }
    }
}

pub fn shell_line(invocation: &Invocation) -> String {
    std::iter::once(&invocation.compiler)
        .chain(&invocation.args)
        .join(" ")
}

pub fn run(invocation: &Invocation, launch: Launch) -> Result<ExitStatus> {
    let mut cmd = command(invocation, launch);
    info!("{}", describe(&cmd));

    let status = cmd
        .status()
        .with_context(|| format!("Failed to launch `{}`.", invocation.compiler))?;
    if status.code().is_none() {
        warn!("compiler terminated without an exit code: {status}");
    }
    Ok(status)
}

fn describe(cmd: &Command) -> String {
    let words = std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|w| w.to_string_lossy().into_owned())
        .collect_vec();
    shlex::try_join(words.iter().map(String::as_str)).unwrap_or_else(|_| words.join(" "))
}
