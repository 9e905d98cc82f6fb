use anyhow::{anyhow, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniEntry {
    pub section: Option<String>,
    pub key: String,
    pub value: String,
}

/// Parses INI-style `key = value` text the way environment files are written.
///
/// Blank lines and `;`/`#` comments are skipped and `[section]` headers are
/// allowed. Unquoted values must not contain `=` or stray quotes.
pub fn parse_env_file(raw: &str) -> Result<Vec<IniEntry>> {
    let mut entries = Vec::new();
    let mut section = None;

    for (index, line) in raw.lines().enumerate() {
        let line_no = index + 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line.strip_prefix('[') {
            let name = rest
                .strip_suffix(']')
                .ok_or_else(|| anyhow!("line {line_no}: unterminated section header"))?
                .trim();
            if name.is_empty() || name.contains(['[', ']']) {
                return Err(anyhow!("line {line_no}: invalid section header"));
            }
            section = Some(name.to_string());
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(anyhow!("line {line_no}: expected 'key = value'"));
        };
        let key = key.trim();
        validate_key(key).map_err(|reason| anyhow!("line {line_no}: {reason}"))?;
        let value = parse_value(value.trim()).map_err(|reason| anyhow!("line {line_no}: {reason}"))?;

        entries.push(IniEntry {
            section: section.clone(),
            key: key.to_string(),
            value,
        });
    }

    Ok(entries)
}

fn validate_key(key: &str) -> std::result::Result<(), String> {
    let (base, index) = match key.split_once('[') {
        Some((base, rest)) => {
            let index = rest
                .strip_suffix(']')
                .ok_or_else(|| format!("invalid key '{key}': unterminated index"))?;
            (base, Some(index))
        }
        None => (key, None),
    };

    if base.is_empty() {
        return Err("key must not be empty".to_string());
    }
    if !base.chars().all(is_key_char) {
        return Err(format!("invalid key '{key}'"));
    }
    if let Some(index) = index {
        if !index.chars().all(is_key_char) {
            return Err(format!("invalid key '{key}'"));
        }
    }
    Ok(())
}

fn is_key_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '.' || ch == '-'
}

fn parse_value(value: &str) -> std::result::Result<String, String> {
    let mut chars = value.chars();
    match chars.next() {
        None => Ok(String::new()),
        Some(quote @ ('"' | '\'')) => parse_quoted(chars.as_str(), quote),
        Some(_) => {
            let unquoted = match value.find(';') {
                Some(pos) => value[..pos].trim_end(),
                None => value,
            };
            if unquoted.contains('=') {
                return Err(format!("unexpected '=' in value '{unquoted}'"));
            }
            if unquoted.contains(['"', '\'']) {
                return Err(format!("unbalanced quote in value '{unquoted}'"));
            }
            Ok(unquoted.to_string())
        }
    }
}

fn parse_quoted(body: &str, quote: char) -> std::result::Result<String, String> {
    let mut out = String::new();
    let mut escaped = false;
    for (pos, ch) in body.char_indices() {
        if escaped {
            out.push(ch);
            escaped = false;
            continue;
        }
        if ch == '\\' && quote == '"' {
            escaped = true;
            continue;
        }
        if ch == quote {
            let trailing = body[pos + ch.len_utf8()..].trim();
            if trailing.is_empty() || trailing.starts_with(';') || trailing.starts_with('#') {
                return Ok(out);
            }
            return Err(format!("unexpected text after quoted value: '{trailing}'"));
        }
        out.push(ch);
    }
    Err("unterminated quoted value".to_string())
}
