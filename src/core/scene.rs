//! Mixer-scene rewriter.
//!
//! X32 scene files are line-oriented UTF-8 text. Every line is tokenized
//! into a tagged record and dispatched on by kind; anything unrecognized
//! passes through byte-for-byte, terminator included. Line length is
//! unconstrained in this dialect, so none of the fixed-footprint machinery
//! from the binary patcher applies here.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::error::{Error, Result};

/// Icon forced onto a disabled channel.
const OFF_ICON: &str = "1";
/// Color token forced onto a disabled channel.
const OFF_COLOR: &str = "OFF";

// ============================================================================
// Records
// ============================================================================

/// Channel classes a rename pass can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChannelKind {
    Channel,
    Auxin,
    Bus,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Channel => "ch",
            ChannelKind::Auxin => "auxin",
            ChannelKind::Bus => "bus",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "ch" => Some(ChannelKind::Channel),
            "auxin" => Some(ChannelKind::Auxin),
            "bus" => Some(ChannelKind::Bus),
            _ => None,
        }
    }

    /// Parse a mode string of single-letter flags: `a` auxin, `b` bus,
    /// `c` channel.
    pub fn parse_mode(mode: &str) -> Result<BTreeSet<ChannelKind>> {
        let mut enabled = BTreeSet::new();
        for c in mode.chars() {
            match c {
                'a' => {
                    enabled.insert(ChannelKind::Auxin);
                }
                'b' => {
                    enabled.insert(ChannelKind::Bus);
                }
                'c' => {
                    enabled.insert(ChannelKind::Channel);
                }
                _ => {
                    return Err(Error::Format(format!("mode flag '{c}' does not exist")));
                }
            }
        }
        Ok(enabled)
    }
}

/// One `/type/NN/config` line, fields in grammar order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRecord {
    pub object_type: String,
    pub channel: u8,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub input: Option<String>,
}

impl ConfigRecord {
    pub fn kind(&self) -> Option<ChannelKind> {
        ChannelKind::from_token(&self.object_type)
    }

    fn emit(&self) -> String {
        let mut line = format!(
            "/{}/{:02}/config \"{}\" {} {}",
            self.object_type, self.channel, self.name, self.icon, self.color
        );
        if let Some(input) = &self.input {
            line.push(' ');
            line.push_str(input);
        }
        line
    }
}

/// The distinguished `#ver# "title" …` header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneTitleRecord {
    pub version: String,
    pub title: String,
    pub rest: String,
}

impl SceneTitleRecord {
    fn emit(&self) -> String {
        format!("{} \"{}\"{}", self.version, self.title, self.rest)
    }
}

/// Any other `/ch/NN/…` line; a permutation relocates these too, so every
/// line of a channel moves with its config record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelScopedRecord {
    pub channel: u8,
    pub payload: String,
}

impl ChannelScopedRecord {
    fn emit(&self) -> String {
        format!("/ch/{:02}/{}", self.channel, self.payload)
    }
}

/// Tagged parse of one scene line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Config(ConfigRecord),
    SceneTitle(SceneTitleRecord),
    ChannelScoped(ChannelScopedRecord),
    Unrecognized,
}

// ============================================================================
// Tokenizer
// ============================================================================

pub fn tokenize(line: &str) -> Record {
    if let Some(record) = parse_config(line) {
        return Record::Config(record);
    }
    if let Some(record) = parse_scene_title(line) {
        return Record::SceneTitle(record);
    }
    if let Some(record) = parse_channel_scoped(line) {
        return Record::ChannelScoped(record);
    }
    Record::Unrecognized
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn parse_two_digit_channel(s: &str) -> Option<u8> {
    if s.len() != 2 || !all_digits(s) {
        return None;
    }
    s.parse().ok()
}

fn parse_config(line: &str) -> Option<ConfigRecord> {
    let rest = line.strip_prefix('/')?;
    let (object_type, rest) = rest.split_once('/')?;
    if object_type.is_empty() {
        return None;
    }
    let (number, rest) = rest.split_once('/')?;
    let channel = parse_two_digit_channel(number)?;
    let rest = rest.strip_prefix("config \"")?;
    // The display name may contain quotes; the closing quote is the last one.
    let (name, rest) = rest.rsplit_once('"')?;
    let rest = rest.strip_prefix(' ')?;

    let mut fields = rest.split(' ');
    let icon = fields.next()?;
    if !all_digits(icon) {
        return None;
    }
    let color = fields.next()?;
    if color.is_empty() {
        return None;
    }
    let input = fields.next();
    if let Some(input) = input {
        if !all_digits(input) {
            return None;
        }
    }
    if fields.next().is_some() {
        return None;
    }

    Some(ConfigRecord {
        object_type: object_type.to_string(),
        channel,
        name: name.to_string(),
        icon: icon.to_string(),
        color: color.to_string(),
        input: input.map(str::to_string),
    })
}

fn parse_scene_title(line: &str) -> Option<SceneTitleRecord> {
    if !line.starts_with('#') {
        return None;
    }
    let close = line[1..].find('#')? + 1;
    let version = &line[..=close];
    let rest = line[close + 1..].strip_prefix(" \"")?;
    // First closing quote ends the title.
    let (title, rest) = rest.split_once('"')?;
    if !rest.starts_with(' ') {
        return None;
    }
    Some(SceneTitleRecord {
        version: version.to_string(),
        title: title.to_string(),
        rest: rest.to_string(),
    })
}

fn parse_channel_scoped(line: &str) -> Option<ChannelScopedRecord> {
    let rest = line.strip_prefix("/ch/")?;
    let (number, payload) = rest.split_once('/')?;
    let channel = parse_two_digit_channel(number)?;
    Some(ChannelScopedRecord {
        channel,
        payload: payload.to_string(),
    })
}

/// Split text into (content, terminator) pairs preserving exact endings,
/// so untouched lines round-trip byte-for-byte.
fn split_lines(text: &str) -> Vec<(&str, &str)> {
    let mut out = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        match rest.find('\n') {
            Some(i) => {
                let (content, terminator) = if i > 0 && rest.as_bytes()[i - 1] == b'\r' {
                    (&rest[..i - 1], &rest[i - 1..=i])
                } else {
                    (&rest[..i], &rest[i..=i])
                };
                out.push((content, terminator));
                rest = &rest[i + 1..];
            }
            None => {
                out.push((rest, ""));
                break;
            }
        }
    }
    out
}

// ============================================================================
// Rename pass
// ============================================================================

/// One channel touched by a rename pass.
#[derive(Debug, Clone, Serialize)]
pub struct RenamedChannel {
    pub object_type: String,
    pub channel: u8,
    pub from: String,
    pub to: String,
    pub disabled: bool,
}

/// Outcome of a rename pass over one scene.
#[derive(Debug, Serialize)]
pub struct RenameOutcome {
    #[serde(skip)]
    pub output: String,
    pub renamed: Vec<RenamedChannel>,
    /// Table keys that matched no record. Reported, never fuzzy-matched.
    pub not_found: Vec<String>,
}

/// Rewrite the display name of every enabled-type config record whose name
/// equals a table key. Mapping a name to the empty string disables the
/// channel: icon, color, and input are forced to their off values.
pub fn rename(
    scene: &str,
    table: &HashMap<String, String>,
    enabled: &BTreeSet<ChannelKind>,
) -> RenameOutcome {
    let mut output = String::with_capacity(scene.len());
    let mut renamed = Vec::new();
    let mut pending: BTreeSet<&str> = table.keys().map(String::as_str).collect();

    for (line, terminator) in split_lines(scene) {
        if let Record::Config(mut record) = tokenize(line) {
            let type_enabled = record.kind().is_some_and(|k| enabled.contains(&k));
            if type_enabled {
                if let Some(new_name) = table.get(&record.name) {
                    pending.remove(record.name.as_str());
                    let disabled = new_name.is_empty();
                    let from = std::mem::replace(&mut record.name, new_name.clone());
                    if disabled {
                        record.icon = OFF_ICON.to_string();
                        record.color = OFF_COLOR.to_string();
                        record.input = Some("0".to_string());
                    }
                    renamed.push(RenamedChannel {
                        object_type: record.object_type.clone(),
                        channel: record.channel,
                        from,
                        to: new_name.clone(),
                        disabled,
                    });
                    output.push_str(&record.emit());
                    output.push_str(terminator);
                    continue;
                }
            }
        }
        output.push_str(line);
        output.push_str(terminator);
    }

    RenameOutcome {
        output,
        renamed,
        not_found: pending.into_iter().map(String::from).collect(),
    }
}

// ============================================================================
// Channel permutation
// ============================================================================

/// Outcome of a permutation pass.
#[derive(Debug, Serialize)]
pub struct SwapOutcome {
    #[serde(skip)]
    pub output: String,
    pub moved_lines: usize,
}

/// Rewrite the channel-number field of every channel-scoped line whose
/// number is a key of `permutation`. All other fields are untouched.
/// Bijectivity is not checked here; a non-bijective map collides at the
/// caller's risk.
pub fn swap(scene: &str, permutation: &BTreeMap<u8, u8>) -> SwapOutcome {
    let mut output = String::with_capacity(scene.len());
    let mut moved_lines = 0;

    for (line, terminator) in split_lines(scene) {
        let rewritten = match tokenize(line) {
            Record::Config(mut record) if record.kind() == Some(ChannelKind::Channel) => {
                permutation.get(&record.channel).map(|&to| {
                    record.channel = to;
                    record.emit()
                })
            }
            Record::ChannelScoped(mut record) => permutation.get(&record.channel).map(|&to| {
                record.channel = to;
                record.emit()
            }),
            _ => None,
        };
        match rewritten {
            Some(new_line) => {
                moved_lines += 1;
                output.push_str(&new_line);
            }
            None => output.push_str(line),
        }
        output.push_str(terminator);
    }

    SwapOutcome {
        output,
        moved_lines,
    }
}

// ============================================================================
// Scene title
// ============================================================================

/// Rewrite the quoted title of the scene header line, wherever it sits in
/// the file. Errors if no header line is present.
pub fn rename_scene_title(scene: &str, new_title: &str) -> Result<String> {
    let mut output = String::with_capacity(scene.len());
    let mut found = false;

    for (line, terminator) in split_lines(scene) {
        if !found {
            if let Record::SceneTitle(mut record) = tokenize(line) {
                record.title = new_title.to_string();
                output.push_str(&record.emit());
                output.push_str(terminator);
                found = true;
                continue;
            }
        }
        output.push_str(line);
        output.push_str(terminator);
    }

    if !found {
        return Err(Error::Format("scene has no title header line".into()));
    }
    Ok(output)
}

// ============================================================================
// Read-only views
// ============================================================================

/// A channel and its current display name.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelName {
    pub channel: u8,
    pub name: String,
}

/// List `(channel, name)` for every input-channel config record, in file
/// order.
pub fn channel_names(scene: &str) -> Vec<ChannelName> {
    split_lines(scene)
        .into_iter()
        .filter_map(|(line, _)| match tokenize(line) {
            Record::Config(record) if record.kind() == Some(ChannelKind::Channel) => {
                Some(ChannelName {
                    channel: record.channel,
                    name: record.name,
                })
            }
            _ => None,
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
