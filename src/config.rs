use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use sanetrace_proto::SANE_PORT;
use toml_spanner::{Arena, Item};

use crate::diagnostic::{Diagnostic, emit_diagnostic, toml_error_to_diagnostic};

pub const CONFIG_FILE_NAME: &str = "sanetrace.toml";

/// Settings for one analysis session. Every key of the config file is
/// optional; a missing file means all defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub service_port: u16,
    /// Full analysis passes over the capture; fields are reported from the
    /// last one.
    pub passes: u32,
    pub log_file: String,
    /// Largest number of bytes a single direction may buffer while waiting
    /// for a message to complete.
    pub max_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            service_port: SANE_PORT,
            passes: 1,
            log_file: "/tmp/.sanetrace.log".to_string(),
            max_buffer: 1 << 20,
        }
    }
}

pub fn find_config_path_from(path: &Path) -> Option<PathBuf> {
    let mut dir = path.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Loads `explicit` if given, otherwise the nearest config file above the
/// current directory, otherwise the defaults.
pub fn load(explicit: Option<&Path>) -> anyhow::Result<SessionConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let cwd = std::env::current_dir()?;
            match find_config_path_from(&cwd) {
                Some(path) => path,
                None => return Ok(SessionConfig::default()),
            }
        }
    };
    let content =
        std::fs::read_to_string(&path).with_context(|| format!("Failed to read config {}", path.display()))?;
    let file_name = path.display().to_string();
    match parse(&content, &mut |diagnostic| emit_diagnostic(&file_name, &content, &diagnostic)) {
        Ok(config) => Ok(config),
        Err(()) => bail!("Invalid config file: {}", path.display()),
    }
}

pub(crate) fn mismatched(report_error: &mut dyn FnMut(Diagnostic), expected: &str, found: &Item<'_>, key: &str) {
    report_error(
        Diagnostic::new("mismatched types", found.span().into())
            .label(format!("expected `{expected}`, found `{}`", found.type_str()))
            .note(format!("The {key:?} property should be a `{expected}`")),
    );
}

/// Reads an integer that must fall within `min..=max`.
pub(crate) fn bounded_integer(
    value: &Item<'_>,
    key: &str,
    min: i64,
    max: i64,
    re: &mut dyn FnMut(Diagnostic),
) -> Result<i64, ()> {
    let Some(number) = value.as_i64() else {
        mismatched(re, "integer", value, key);
        return Err(());
    };
    if number < min || number > max {
        re(Diagnostic::new(format!("`{key}` is out of range"), value.span().into())
            .label(format!("expected {min}..={max}")));
        return Err(());
    }
    Ok(number)
}

pub fn parse(content: &str, re: &mut dyn FnMut(Diagnostic)) -> Result<SessionConfig, ()> {
    let arena = Arena::new();
    let root = match toml_spanner::parse(content, &arena) {
        Ok(root) => root,
        Err(err) => {
            re(toml_error_to_diagnostic(&err));
            return Err(());
        }
    };

    let mut config = SessionConfig::default();
    for (key, value) in &root {
        match key.as_str() {
            "service_port" => {
                config.service_port = bounded_integer(value, "service_port", 1, u16::MAX as i64, re)? as u16;
            }
            "passes" => {
                config.passes = bounded_integer(value, "passes", 1, 16, re)? as u32;
            }
            "max_buffer" => {
                config.max_buffer = bounded_integer(value, "max_buffer", 4, u32::MAX as i64, re)? as usize;
            }
            "log_file" => {
                let Some(path) = value.as_str() else {
                    mismatched(re, "string", value, "log_file");
                    return Err(());
                };
                config.log_file = path.to_string();
            }
            unknown => {
                re(Diagnostic::new(format!("unknown key `{unknown}` in config"), key.span.into())
                    .note("expected one of: service_port, passes, log_file, max_buffer"));
                return Err(());
            }
        }
    }
    Ok(config)
}
