//! Capture transcripts: the TCP payload of each captured segment, in
//! capture order.
//!
//! ```toml
//! [[segment]]
//! stream = 0          # connection number, defaults to 0
//! src = 40000
//! dst = 6566
//! data = "00000000 01020003 00000004 61626364"
//! ```
//!
//! `data` is hex; whitespace inside it is ignored.

use std::{ops::Range, path::Path};

use anyhow::{Context, bail};
use sanetrace_proto::Ports;
use toml_spanner::{Arena, Item};

use crate::config::{bounded_integer, mismatched};
use crate::diagnostic::{Diagnostic, emit_diagnostic, toml_error_to_diagnostic};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub stream: u64,
    pub ports: Ports,
    pub data: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct Transcript {
    pub segments: Vec<Segment>,
}

impl Transcript {
    pub fn stream_count(&self) -> usize {
        let mut streams: Vec<u64> = self.segments.iter().map(|s| s.stream).collect();
        streams.sort_unstable();
        streams.dedup();
        streams.len()
    }

    pub fn byte_count(&self) -> usize {
        self.segments.iter().map(|s| s.data.len()).sum()
    }
}

pub fn load(path: &Path) -> anyhow::Result<Transcript> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read transcript {}", path.display()))?;
    let file_name = path.display().to_string();
    match parse(&content, &mut |diagnostic| emit_diagnostic(&file_name, &content, &diagnostic)) {
        Ok(transcript) => {
            kvlog::info!("Loaded transcript", path = %path.display(), segments = transcript.segments.len());
            Ok(transcript)
        }
        Err(()) => bail!("Invalid transcript: {}", path.display()),
    }
}

fn hex_payload(value: &Item<'_>, re: &mut dyn FnMut(Diagnostic)) -> Result<Vec<u8>, ()> {
    let Some(text) = value.as_str() else {
        mismatched(re, "string", value, "data");
        return Err(());
    };
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(&compact).map_err(|err| {
        re(Diagnostic::new("invalid hex payload", value.span().into()).label(err.to_string()));
    })
}

fn segment(value: &Item<'_>, re: &mut dyn FnMut(Diagnostic)) -> Result<Segment, ()> {
    let Some(table) = value.as_table() else {
        mismatched(re, "table", value, "segment");
        return Err(());
    };

    let mut stream = 0;
    let mut src = None;
    let mut dst = None;
    let mut data = None;
    for (key, val) in table {
        match key.as_str() {
            "stream" => stream = bounded_integer(val, "stream", 0, i64::MAX, re)? as u64,
            "src" => src = Some(bounded_integer(val, "src", 0, u16::MAX as i64, re)? as u16),
            "dst" => dst = Some(bounded_integer(val, "dst", 0, u16::MAX as i64, re)? as u16),
            "data" => data = Some(hex_payload(val, re)?),
            unknown => {
                re(Diagnostic::new(format!("unknown key `{unknown}` in segment"), key.span.into())
                    .note("expected one of: stream, src, dst, data"));
                return Err(());
            }
        }
    }

    let span: Range<usize> = value.span().into();
    let missing = |field: &str| {
        Diagnostic::new(format!("missing field '{field}'"), span.clone()).label("segment with missing field")
    };
    let Some(src) = src else {
        re(missing("src"));
        return Err(());
    };
    let Some(dst) = dst else {
        re(missing("dst"));
        return Err(());
    };
    let Some(data) = data else {
        re(missing("data"));
        return Err(());
    };
    Ok(Segment { stream, ports: Ports { src, dst }, data })
}

/// Parses a transcript, reporting every bad segment rather than stopping at
/// the first one.
pub fn parse(content: &str, re: &mut dyn FnMut(Diagnostic)) -> Result<Transcript, ()> {
    let arena = Arena::new();
    let root = match toml_spanner::parse(content, &arena) {
        Ok(root) => root,
        Err(err) => {
            re(toml_error_to_diagnostic(&err));
            return Err(());
        }
    };

    let mut transcript = Transcript::default();
    let mut failed = false;
    for (key, val) in &root {
        if key.as_str() != "segment" {
            re(Diagnostic::new(format!("unknown key `{key}` in transcript"), key.span.into())
                .note("segments are written as [[segment]] tables"));
            failed = true;
            continue;
        }
        let Some(items) = val.as_array() else {
            mismatched(re, "array of tables", val, "segment");
            failed = true;
            continue;
        };
        for item in items {
            match segment(item, re) {
                Ok(segment) => transcript.segments.push(segment),
                Err(()) => failed = true,
            }
        }
    }

    if failed {
        return Err(());
    }
    Ok(transcript)
}
