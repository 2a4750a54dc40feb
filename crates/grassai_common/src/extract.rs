//! Suggested-command extraction
//!
//! Model completions are prose, not a grammar, so extraction is an
//! explicit allow-list matcher, not a parser. The accepted pattern set:
//!
//! - GRASS module invocations: a line-leading `g.`, `r.`, `r3.`, `v.`,
//!   `i.`, `db.`, `t.`, `m.`, `d.` or `ps.` token followed by flags and
//!   key=value arguments (e.g. `r.slope.aspect elevation=dem slope=slope`)
//! - GDAL/OGR tools: a line-leading `gdal*` or `ogr*` token
//!   (e.g. `gdalinfo input.tif`, `ogr2ogr out.gpkg in.shp`)
//! - Data-preparation tools: wget, curl, unzip, tar, gzip, awk, sed, grep
//!
//! Candidates are recognized only at line starts, after stripping markdown
//! decoration (code fences, backticks, list markers, `$ `/`> ` prompts).
//! Lines carrying shell metacharacters that would enable injection are
//! rejected outright: the executor runs single commands, never scripts.
//! Anything that does not match is ignored - this is best effort.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What family an extracted command belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// GRASS module (g.*, r.*, v.*, ...)
    Grass,
    /// GDAL/OGR command line tool
    Gdal,
    /// Generic data-preparation tool
    SystemTool,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Grass => "grass",
            CommandKind::Gdal => "gdal",
            CommandKind::SystemTool => "system",
        }
    }
}

/// One candidate command line, in order of appearance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedCommand {
    pub line: String,
    pub kind: CommandKind,
}

/// Shell metacharacters that would turn one command into a script
const INJECTION_PATTERNS: &[&str] = &[";", "&&", "||", "|", "`", "$(", ">", ">>", "<"];

/// Allow-list matcher over model output
pub struct CommandExtractor {
    grass_re: Regex,
    gdal_re: Regex,
    tool_re: Regex,
}

impl CommandExtractor {
    pub fn new() -> Self {
        Self {
            // r.slope.aspect and friends carry dots inside the module name
            grass_re: Regex::new(
                r"^(?:g|r|r3|v|i|db|t|m|d|ps)\.[a-z][a-z0-9._]*(?:\s+\S+)*$",
            )
            .expect("grass command pattern"),
            gdal_re: Regex::new(r"^(?:gdal[a-z0-9_.]+|ogr[a-z0-9_]+)(?:\s+\S+)*$")
                .expect("gdal command pattern"),
            tool_re: Regex::new(r"^(?:wget|curl|unzip|tar|gzip|awk|sed|grep)\s+\S+(?:\s+\S+)*$")
                .expect("system tool pattern"),
        }
    }

    /// Scan a completion for candidate command lines.
    ///
    /// Duplicates are dropped keeping the first occurrence; order of
    /// appearance is preserved.
    pub fn extract(&self, response: &str) -> Vec<SuggestedCommand> {
        let mut seen = HashSet::new();
        let mut commands = Vec::new();

        for raw_line in response.lines() {
            let line = match clean_line(raw_line) {
                Some(l) => l,
                None => continue,
            };

            if INJECTION_PATTERNS.iter().any(|p| line.contains(p)) {
                tracing::debug!("Rejected suggestion with shell metacharacters: {}", line);
                continue;
            }

            let kind = if self.grass_re.is_match(&line) {
                CommandKind::Grass
            } else if self.gdal_re.is_match(&line) {
                CommandKind::Gdal
            } else if self.tool_re.is_match(&line) {
                CommandKind::SystemTool
            } else {
                continue;
            };

            if seen.insert(line.clone()) {
                commands.push(SuggestedCommand { line, kind });
            }
        }

        commands
    }
}

impl Default for CommandExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip markdown decoration from one line; None means skip the line.
fn clean_line(raw: &str) -> Option<String> {
    let mut line = raw.trim();

    // Fence markers themselves carry no command
    if line.starts_with("```") {
        return None;
    }

    // Shell prompts and blockquotes
    for prefix in ["$ ", "> "] {
        if let Some(rest) = line.strip_prefix(prefix) {
            line = rest.trim_start();
        }
    }

    // List markers: "- ", "* ", "1. ", "2) "
    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        line = rest.trim_start();
    } else {
        let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits > 0 {
            let after = &line[digits..];
            if let Some(rest) = after.strip_prefix(". ").or_else(|| after.strip_prefix(") ")) {
                line = rest.trim_start();
            }
        }
    }

    // Inline code wrapping
    line = line.trim_matches('`').trim();

    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}
