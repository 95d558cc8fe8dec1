//! DOS-style switches (`/Q`, `/r`, ...) rewritten into the long flags clap
//! understands. Matching is case-insensitive.

use std::ffi::OsString;

const SWITCH_PREFIX: char = '/';

fn long_form(token: &str) -> Option<&'static str> {
    match token.to_ascii_uppercase().as_str() {
        "/Q" => Some("--quiet"),
        "/R" => Some("--recursive"),
        "/V" => Some("--verbose"),
        "/?" => Some("--help"),
        _ => None,
    }
}

/// Rewrites recognized switches. The program name and everything after a
/// literal `--` pass through untouched.
///
/// Returns the offending token when a switch is not recognized.
pub(super) fn translate(argv: Vec<OsString>) -> Result<Vec<OsString>, String> {
    let mut out = Vec::with_capacity(argv.len());
    let mut args = argv.into_iter();
    out.extend(args.next());

    let mut switches_done = false;
    for arg in args {
        if switches_done {
            out.push(arg);
            continue;
        }
        let Some(token) = arg.to_str() else {
            out.push(arg);
            continue;
        };
        if token == "--" {
            switches_done = true;
        } else if token.starts_with(SWITCH_PREFIX) {
            if let Some(long) = long_form(token) {
                out.push(long.into());
                continue;
            }
            if is_unknown_switch(token) {
                return Err(token.to_string());
            }
        }
        out.push(arg);
    }
    Ok(out)
}

#[cfg(windows)]
fn is_unknown_switch(_token: &str) -> bool {
    true
}

// Absolute paths share the prefix here. Only a bare `/word` that names
// nothing on disk is taken for a mistyped switch.
#[cfg(not(windows))]
fn is_unknown_switch(token: &str) -> bool {
    let rest = &token[SWITCH_PREFIX.len_utf8()..];
    !rest.is_empty()
        && !rest.contains(&['/', '*', '?'][..])
        && !std::path::Path::new(token).exists()
}
