use anyhow::Context;
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::debug;

/// Copy the transcription to the system clipboard. `arboard` is the primary
/// path; when it is unavailable (headless session, missing display server) we
/// fall back to whichever platform clipboard utility answers.
pub fn copy_text(text: &str) -> anyhow::Result<()> {
    match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text.to_string()))
    {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!("arboard unavailable ({}), trying clipboard utilities", e);
            copy_via_utility(text)
        }
    }
}

fn copy_via_utility(text: &str) -> anyhow::Result<()> {
    let candidates: &[(&str, &[&str])] = &[
        ("pbcopy", &[]),
        ("wl-copy", &[]),
        ("xclip", &["-selection", "clipboard"]),
        ("xsel", &["--clipboard", "--input"]),
    ];

    for (program, args) in candidates {
        let spawned = Command::new(program)
            .args(*args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        let Ok(mut child) = spawned else {
            continue;
        };
        child
            .stdin
            .take()
            .context("clipboard utility did not expose stdin")?
            .write_all(text.as_bytes())?;
        if child.wait()?.success() {
            debug!("Copied via {}", program);
            return Ok(());
        }
    }

    anyhow::bail!("no clipboard available — install wl-copy or xclip, or copy the output manually")
}
