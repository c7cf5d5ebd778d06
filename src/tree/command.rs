use std::process::Command;

use anyhow::{Context, Result, anyhow};

pub(super) fn run_source_command(program: &str, args: &[String]) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .with_context(|| format!("failed to spawn {program} with args: {args:?}"))?;

    if output.status.success() {
        String::from_utf8(output.stdout)
            .with_context(|| format!("{program} output was not valid UTF-8"))
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(anyhow!(
            "{program} exited with {} for args {args:?}: {stderr}",
            output.status
        ))
    }
}
