//! Utility functions and helpers

mod progress;

use std::fs;
use std::io;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

pub use progress::Reporter;

static SCOPE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^@.*/").unwrap());

static UNSAFE_CHARS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"((^[^a-zA-Z]+)|[^\w.-])|([^a-zA-Z0-9]+$)").unwrap());

/// Remove the package scope, if any
pub fn remove_scope(name: &str) -> &str {
    SCOPE_REGEX
        .find(name)
        .map_or(name, |scope| &name[scope.end()..])
}

/// Package name usable as a file name: `@acme/My-Lib!` becomes `my-lib`
pub fn safe_package_name(name: &str) -> String {
    let lower = name.to_lowercase();
    UNSAFE_CHARS_REGEX
        .replace_all(remove_scope(&lower), "")
        .into_owned()
}

/// Package name usable as a UMD global: `@acme/my-lib` becomes `myLib`
pub fn safe_variable_name(name: &str) -> String {
    let lower = remove_scope(name).to_lowercase();
    let cleaned = UNSAFE_CHARS_REGEX.replace_all(&lower, "");
    camel_case(&cleaned)
}

fn camel_case(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    for (index, word) in input
        .split(['-', '_', '.', ' '])
        .filter(|w| !w.is_empty())
        .enumerate()
    {
        if index == 0 {
            result.push_str(word);
            continue;
        }
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            result.extend(first.to_uppercase());
            result.push_str(chars.as_str());
        }
    }
    result
}

/// Remove the output directory and everything in it
pub fn clean_dist(out_dir: &Path) -> io::Result<()> {
    match fs::remove_dir_all(out_dir) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

/// Write `<out_dir>/index.js`, which loads the CommonJS build matching `NODE_ENV`.
///
/// Both file names are relative to `out_dir`.
pub fn write_cjs_entry_file(out_dir: &Path, production: &str, development: &str) -> io::Result<()> {
    let contents = format!(
        r#"
'use strict'

if (process.env.NODE_ENV === 'production') {{
  module.exports = require('./{production}')
}} else {{
  module.exports = require('./{development}')
}}
"#
    );

    fs::create_dir_all(out_dir)?;
    fs::write(out_dir.join("index.js"), contents)
}

/// Format bytes as human-readable size
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Format duration as human-readable string
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f64();

    if secs >= 60.0 {
        let mins = (secs / 60.0).floor() as u64;
        let remaining_secs = secs - (mins as f64 * 60.0);
        format!("{}m {:.2}s", mins, remaining_secs)
    } else if secs >= 1.0 {
        format!("{:.2}s", secs)
    } else {
        format!("{:.0}ms", secs * 1000.0)
    }
}
