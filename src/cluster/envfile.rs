//! Flat `KEY=VALUE` env files.
//!
//! Parsing is best effort and never fails. Serialization is deterministic
//! (sorted keys, trailing newline) so rewriting an unchanged layer produces a
//! byte-identical file.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::Result;

pub type EnvMap = BTreeMap<String, String>;

pub fn parse_env_text(text: &str) -> EnvMap {
    let mut map = EnvMap::new();
    for raw_line in text.split('\n') {
        let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        map.insert(key.to_string(), unquote(value).to_string());
    }
    map
}

/// Strip one pair of matching surrounding quotes.
fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn needs_quotes(value: &str) -> bool {
    value.contains(' ')
        || value.contains('#')
        || value.starts_with(['"', '\''])
        || value.ends_with(['"', '\''])
}

pub fn serialize_env(map: &EnvMap) -> String {
    let mut out = String::new();
    for (key, value) in map {
        out.push_str(key);
        out.push('=');
        if needs_quotes(value) {
            out.push('"');
            out.push_str(value);
            out.push('"');
        } else {
            out.push_str(value);
        }
        out.push('\n');
    }
    if out.is_empty() {
        out.push('\n');
    }
    out
}

/// `base` with every key of `overrides` replacing it.
pub fn merge(base: &EnvMap, overrides: &EnvMap) -> EnvMap {
    let mut merged = base.clone();
    merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Missing file reads as an empty layer.
pub fn read_env_file(path: &Path) -> Result<EnvMap> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(parse_env_text(&text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(EnvMap::new()),
        Err(e) => Err(e.into()),
    }
}

pub fn write_env_file(path: &Path, map: &EnvMap) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serialize_env(map))?;
    Ok(())
}
