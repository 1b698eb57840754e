//! Opening preview URLs in the system browser.

use std::io;
use std::process::{Command, Stdio};

use tracing::debug;

/// Launch the platform URL opener, detached from our stdio.
///
/// The child is not waited on; failure to spawn is returned so the caller
/// can fall back to printing the URL.
pub fn open_in_browser(url: &str) -> io::Result<()> {
    let (program, args) = open_command(url);
    debug!(program, url, "launching browser");
    Command::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    Ok(())
}

// `start` is a cmd builtin; the empty string is the window title slot.
#[cfg(target_os = "windows")]
fn open_command(url: &str) -> (&'static str, Vec<String>) {
    ("cmd", vec!["/C".into(), "start".into(), String::new(), url.into()])
}

#[cfg(target_os = "macos")]
fn open_command(url: &str) -> (&'static str, Vec<String>) {
    ("open", vec![url.to_string()])
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn open_command(url: &str) -> (&'static str, Vec<String>) {
    ("xdg-open", vec![url.to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_matches_platform() {
        let (program, args) = open_command("http://127.0.0.1:3000/preview/abc");
        if cfg!(target_os = "windows") {
            assert_eq!(program, "cmd");
        } else if cfg!(target_os = "macos") {
            assert_eq!(program, "open");
        } else {
            assert_eq!(program, "xdg-open");
        }
        assert!(args.last().is_some_and(|a| a.ends_with("/preview/abc")));
    }
}
