//! Per-frame content hashes and structural JSON comparison.

use std::path::Path;

use serde_json::{Map, Value};

use crate::encode::command::build_framemd5_command;
use crate::encode::runner::{EncoderOpts, run_ffmpeg};
use crate::foundation::error::ShotreelResult;

static NULL: Value = Value::Null;

/// Ordered per-frame hash lines for `video`, as reported by ffmpeg's `framemd5` muxer.
pub fn extract_frame_hashes(opts: &EncoderOpts, video: &Path) -> ShotreelResult<Vec<String>> {
    let cmd = build_framemd5_command(opts.program.as_os_str(), video);
    let out = run_ffmpeg(&cmd, opts.timeout)?;
    Ok(parse_framemd5(&String::from_utf8_lossy(&out.stdout)))
}

/// Drop `#` header lines from `framemd5` output.
pub fn parse_framemd5(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Paths (`a.b`, `list[2]`, `list[length_mismatch]`) where `a` and `b` differ.
///
/// Keys named in `skip` are ignored at every depth. A missing key equals `null`. Array
/// elements are compared whole, position by position. Output is sorted.
pub fn diff_json(a: &Value, b: &Value, skip: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    match (a, b) {
        (Value::Object(a), Value::Object(b)) => diff_objects(a, b, skip, "", &mut out),
        _ if a != b => out.push(String::new()),
        _ => {}
    }
    out.sort();
    out
}

fn diff_objects(
    a: &Map<String, Value>,
    b: &Map<String, Value>,
    skip: &[&str],
    prefix: &str,
    out: &mut Vec<String>,
) {
    let mut keys = a.keys().chain(b.keys()).collect::<Vec<_>>();
    keys.sort_unstable();
    keys.dedup();

    for key in keys {
        if skip.contains(&key.as_str()) {
            continue;
        }
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        let va = a.get(key).unwrap_or(&NULL);
        let vb = b.get(key).unwrap_or(&NULL);
        match (va, vb) {
            (Value::Object(oa), Value::Object(ob)) => diff_objects(oa, ob, skip, &path, out),
            (Value::Array(la), Value::Array(lb)) => {
                for (i, (x, y)) in la.iter().zip(lb).enumerate() {
                    if x != y {
                        out.push(format!("{path}[{i}]"));
                    }
                }
                if la.len() != lb.len() {
                    out.push(format!("{path}[length_mismatch]"));
                }
            }
            _ if va != vb => out.push(path),
            _ => {}
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/fingerprint.rs"]
mod tests;
