//! Hand the container's main process over to another command.

use anyhow::anyhow;

/// Replace the current process image with `argv[0]`, resolved through `PATH`.
///
/// Only returns on failure. On non-Unix targets the command runs as a child
/// and this process exits with its status.
pub fn exec_command(argv: &[String]) -> anyhow::Error {
    let Some((program, args)) = argv.split_first() else {
        return anyhow!("No command given to exec");
    };

    tracing::info!(command = %program, ?args, "Handing over to command");
    exec_impl(program, args)
}

#[cfg(unix)]
fn exec_impl(program: &str, args: &[String]) -> anyhow::Error {
    use std::os::unix::process::CommandExt;

    let err = std::process::Command::new(program).args(args).exec();
    anyhow::Error::new(err).context(format!("Failed to exec {}", program))
}

#[cfg(not(unix))]
fn exec_impl(program: &str, args: &[String]) -> anyhow::Error {
    match std::process::Command::new(program).args(args).status() {
        Ok(status) => std::process::exit(status.code().unwrap_or(1)),
        Err(err) => anyhow::Error::new(err).context(format!("Failed to run {}", program)),
    }
}
