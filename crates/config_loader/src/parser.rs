//! Configuration parsing
//!
//! TOML (primary), JSON, and the flat Java-properties layout used by
//! existing sink deployments.

use contracts::{ContractError, ExecutorKind, SinkBlueprint, StoreKind, CDC_TOPIC_SEPARATOR};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (recommended)
    Toml,
    /// JSON
    Json,
    /// `key=value` properties
    Properties,
}

impl ConfigFormat {
    /// Infer format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "properties" | "conf" => Some(Self::Properties),
            _ => None,
        }
    }
}

/// Parse TOML configuration
pub fn parse_toml(content: &str) -> Result<SinkBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON configuration
pub fn parse_json(content: &str) -> Result<SinkBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

const STREAMS_SINK_NAMESPACE: &str = "streams.sink.";
const CYPHER_PREFIX: &str = "streams.sink.topic.cypher.";
const CDC_SOURCE_ID_KEY: &str = "streams.sink.topic.cdc.sourceId";
const CDC_SCHEMA_KEY: &str = "streams.sink.topic.cdc.schema";
const LABEL_NAME_KEY: &str = "streams.sink.topic.cdc.sourceId.labelName";
const ID_NAME_KEY: &str = "streams.sink.topic.cdc.sourceId.idName";
const STORE_PREFIX: &str = "streams.sink.store.";
const EXECUTOR_PREFIX: &str = "streams.sink.executor.";

/// Parse properties configuration
///
/// Keys outside the `streams.sink.` namespace are ignored, so a shared
/// properties file can be passed as is.
pub fn parse_properties(content: &str) -> Result<SinkBlueprint, ContractError> {
    let mut blueprint = SinkBlueprint::default();

    for (line_no, key, value) in properties_entries(content) {
        let field_error = |message: String| {
            ContractError::config_parse(format!("properties line {line_no}: {key}: {message}"))
        };

        if let Some(topic) = key.strip_prefix(CYPHER_PREFIX) {
            blueprint.topics.cypher.insert(topic.to_string(), value);
            continue;
        }

        match key.as_str() {
            CDC_SOURCE_ID_KEY => blueprint.topics.cdc_source_id.extend(split_topics(&value)),
            CDC_SCHEMA_KEY => blueprint.topics.cdc_schema.extend(split_topics(&value)),
            LABEL_NAME_KEY => blueprint.strategies.source_id.label_name = value,
            ID_NAME_KEY => blueprint.strategies.source_id.id_name = value,
            _ => {
                if let Some(field) = key.strip_prefix(STORE_PREFIX) {
                    let store = &mut blueprint.store;
                    match field {
                        "name" => store.name = value,
                        "kind" => {
                            store.kind = match value.to_lowercase().as_str() {
                                "memory" => StoreKind::Memory,
                                "file" => StoreKind::File,
                                other => return Err(field_error(format!("unknown store kind '{other}'"))),
                            }
                        }
                        "path" => store.path = Some(value.into()),
                        "read_only" | "readOnly" => {
                            store.read_only = value
                                .parse()
                                .map_err(|_| field_error(format!("expected true/false, got '{value}'")))?
                        }
                        _ => {}
                    }
                } else if let Some(field) = key.strip_prefix(EXECUTOR_PREFIX) {
                    let executor = &mut blueprint.executor;
                    match field {
                        "name" => executor.name = value,
                        "kind" => {
                            executor.kind = match value.to_lowercase().as_str() {
                                "log" => ExecutorKind::Log,
                                "file" => ExecutorKind::File,
                                other => {
                                    return Err(field_error(format!("unknown executor kind '{other}'")))
                                }
                            }
                        }
                        "path" => executor.path = Some(value.into()),
                        _ => {}
                    }
                }
            }
        }
    }

    Ok(blueprint)
}

/// Split a `t1;t2` list, skipping blanks
fn split_topics(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(CDC_TOPIC_SEPARATOR)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Logical `(line, key, value)` entries of a properties file
///
/// Supports `=` / `:` separators, `#` / `!` comments, continuation lines
/// (odd number of trailing backslashes) and the escapes written by
/// [`to_properties`]. Only entries under the sink namespace are returned.
fn properties_entries(content: &str) -> Vec<(usize, String, String)> {
    let mut entries = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (index, raw) in content.lines().enumerate() {
        let line = raw.trim_start();
        let (start, mut logical) = match pending.take() {
            Some((start, acc)) => (start, acc),
            None => {
                if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                    continue;
                }
                (index + 1, String::new())
            }
        };

        if trailing_backslashes(line) % 2 == 1 {
            logical.push_str(&line[..line.len() - 1]);
            pending = Some((start, logical));
            continue;
        }
        logical.push_str(line);

        let (key, value) = split_entry(&logical);
        let key = unescape(trim_unescaped_end(key));
        if key.starts_with(STREAMS_SINK_NAMESPACE) {
            let value = unescape(trim_unescaped_end(value.trim_start()));
            entries.push((start, key, value));
        }
    }

    entries
}

fn trailing_backslashes(text: &str) -> usize {
    text.chars().rev().take_while(|&c| c == '\\').count()
}

/// Split at the first unescaped `=` or `:`
fn split_entry(logical: &str) -> (&str, &str) {
    let mut escaped = false;
    for (pos, c) in logical.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '=' | ':' => return (&logical[..pos], &logical[pos + 1..]),
            _ => {}
        }
    }
    (logical, "")
}

/// Trim trailing whitespace that is not escaped
fn trim_unescaped_end(text: &str) -> &str {
    let mut end = text.len();
    while let Some(c) = text[..end].chars().next_back() {
        if !c.is_whitespace() || trailing_backslashes(&text[..end - c.len_utf8()]) % 2 == 1 {
            break;
        }
        end -= c.len_utf8();
    }
    &text[..end]
}

/// Decode `\n`, `\r`, `\t`, `\f`, `\uXXXX`; any other escaped char stands for itself
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('f') => out.push('\u{0c}'),
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 4 => {
                        out.push(decoded);
                        chars.nth(3);
                    }
                    _ => out.push('u'),
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Escape a key or value so [`properties_entries`] reads it back unchanged
fn escape(text: &str, is_key: bool) -> String {
    let last = text.chars().count().saturating_sub(1);
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0c}' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' if is_key => {
                out.push('\\');
                out.push(c);
            }
            ' ' if is_key || i == 0 || i == last => out.push_str("\\ "),
            _ => out.push(c),
        }
    }
    out
}

/// Render a blueprint in the properties layout
///
/// Inverse of [`parse_properties`]: every value the parser understands is
/// written back under its key, escaped so that multi-line templates and
/// paths survive the round trip.
pub fn to_properties(blueprint: &SinkBlueprint) -> String {
    let mut lines = Vec::new();
    let mut push = |key: String, value: &str| {
        lines.push(format!("{}={}", escape(&key, true), escape(value, false)));
    };

    let store = &blueprint.store;
    push(format!("{STORE_PREFIX}name"), &store.name);
    push(
        format!("{STORE_PREFIX}kind"),
        match store.kind {
            StoreKind::Memory => "memory",
            StoreKind::File => "file",
        },
    );
    if let Some(path) = &store.path {
        push(format!("{STORE_PREFIX}path"), &path.display().to_string());
    }
    push(format!("{STORE_PREFIX}read_only"), &store.read_only.to_string());

    for (topic, query) in &blueprint.topics.cypher {
        push(format!("{CYPHER_PREFIX}{topic}"), query);
    }
    let join = |topics: &std::collections::BTreeSet<String>| {
        topics
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(&CDC_TOPIC_SEPARATOR.to_string())
    };
    if !blueprint.topics.cdc_source_id.is_empty() {
        push(CDC_SOURCE_ID_KEY.to_string(), &join(&blueprint.topics.cdc_source_id));
    }
    if !blueprint.topics.cdc_schema.is_empty() {
        push(CDC_SCHEMA_KEY.to_string(), &join(&blueprint.topics.cdc_schema));
    }

    let source_id = &blueprint.strategies.source_id;
    push(LABEL_NAME_KEY.to_string(), &source_id.label_name);
    push(ID_NAME_KEY.to_string(), &source_id.id_name);

    let executor = &blueprint.executor;
    push(format!("{EXECUTOR_PREFIX}name"), &executor.name);
    push(
        format!("{EXECUTOR_PREFIX}kind"),
        match executor.kind {
            ExecutorKind::Log => "log",
            ExecutorKind::File => "file",
        },
    );
    if let Some(path) = &executor.path {
        push(format!("{EXECUTOR_PREFIX}path"), &path.display().to_string());
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Parse configuration by format
pub fn parse(content: &str, format: ConfigFormat) -> Result<SinkBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
        ConfigFormat::Properties => parse_properties(content),
    }
}
