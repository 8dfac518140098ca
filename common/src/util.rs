use std::{path::Path, process::Stdio};

use eyre::{Context, Result, bail};
use serde::de::DeserializeOwned;
use tokio::{fs::read_to_string, process::Command};
use tracing::debug;

use crate::error::PipelineError;

pub async fn read_json_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let data = read_to_string(path)
        .await
        .with_context(|| format!("Reading {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("Parsing {}", path.display()))
}

/// Runs a program to completion in `dir`, failing on a nonzero exit status
///
/// The child is killed if the returned future is dropped, so cancelling a
/// batch never leaves jobs running behind it.
pub async fn run_program(
    program: &str,
    args: &[String],
    dir: &Path,
    job: Option<&str>,
) -> Result<()> {
    debug!("dir={} program={program} args={}", dir.display(), args.join(" "));
    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .with_context(|| format!("Spawning {program}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            debug!("{program} stderr: {}", stderr.trim());
        }
        bail!(PipelineError::JobFailed {
            program: program.to_owned(),
            status: output.status,
            job: job.map(|x| x.to_owned()),
        });
    }
    Ok(())
}

/// Quotes an argument for a POSIX shell line inside a makefile recipe
pub fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,+@%".contains(c));
    let quoted = if safe {
        arg.to_owned()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    };
    // make expands `$` before the shell sees the line
    quoted.replace('$', "$$")
}
