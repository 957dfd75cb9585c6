// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Command-string tokenization (spec §6 "Command input"): whitespace-separated
//! tokens, single/double-quoted arguments, no escape processing inside single quotes.

/// A reason a command string failed to tokenize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenizeError {
    #[error("unterminated quoted argument")]
    UnterminatedQuote,
}

/// Split a raw command line into whitespace-separated tokens, honoring quoting.
pub fn tokenize(line: &str) -> Result<Vec<String>, TokenizeError> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        tokens.push(read_token(&mut chars)?);
    }
    Ok(tokens)
}

fn read_token(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Result<String, TokenizeError> {
    let mut token = String::new();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => break,
            '\'' => {
                chars.next();
                read_quoted(chars, '\'', &mut token)?;
            }
            '"' => {
                chars.next();
                read_quoted(chars, '"', &mut token)?;
            }
            _ => {
                token.push(c);
                chars.next();
            }
        }
    }
    Ok(token)
}

fn read_quoted(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    quote: char,
    out: &mut String,
) -> Result<(), TokenizeError> {
    for c in chars.by_ref() {
        if c == quote {
            return Ok(());
        }
        out.push(c);
    }
    Err(TokenizeError::UnterminatedQuote)
}

/// An option value, whether bare (`-f`) or carrying an argument (`-l 10`, `--size=10`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    Flag,
    Value(String),
}

/// A parsed command: its name plus remaining tokens split into options and positional
/// arguments. GNU-style short `-x [VALUE]` and long `--name[=VALUE]` forms (spec §6).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedCommand {
    pub name: String,
    pub options: Vec<(String, OptionValue)>,
    pub positionals: Vec<String>,
}

/// Parse a full command line: first token is the command name, the rest are option
/// and positional tokens. `value_options` names short-option letters that consume the
/// following token as a value (e.g. `l`, `p`, `x`, `y`, `N`) rather than being a flag.
pub fn parse_command(
    line: &str,
    value_options: &[&str],
) -> Result<ParsedCommand, TokenizeError> {
    let tokens = tokenize(line)?;
    let mut iter = tokens.into_iter();
    let name = iter.next().unwrap_or_default();
    let mut cmd = ParsedCommand { name, ..Default::default() };

    let mut rest: Vec<String> = iter.collect();
    let mut i = 0;
    while i < rest.len() {
        let tok = rest[i].clone();
        if let Some(long) = tok.strip_prefix("--") {
            if let Some((key, value)) = long.split_once('=') {
                cmd.options.push((key.to_string(), OptionValue::Value(value.to_string())));
            } else {
                cmd.options.push((long.to_string(), OptionValue::Flag));
            }
        } else if let Some(short) = tok.strip_prefix('-') {
            if short.is_empty() {
                cmd.positionals.push(tok);
            } else if value_options.contains(&short) {
                i += 1;
                let value = rest.get(i).cloned().unwrap_or_default();
                cmd.options.push((short.to_string(), OptionValue::Value(value)));
            } else {
                cmd.options.push((short.to_string(), OptionValue::Flag));
            }
        } else {
            cmd.positionals.push(tok);
        }
        i += 1;
    }
    rest.clear();
    Ok(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_splits_on_whitespace() {
        assert_eq!(tokenize("split-window -h").unwrap(), vec!["split-window", "-h"]);
    }

    #[test]
    fn tokenize_honors_double_quotes() {
        assert_eq!(
            tokenize(r#"bind-key x "split-window -v""#).unwrap(),
            vec!["bind-key", "x", "split-window -v"]
        );
    }

    #[test]
    fn tokenize_rejects_unterminated_quote() {
        assert_eq!(tokenize("bind-key \"x"), Err(TokenizeError::UnterminatedQuote));
    }

    #[test]
    fn parse_command_splits_value_and_flag_options() {
        let cmd = parse_command("split-window -h -l 10 -d", &["l"]).unwrap();
        assert_eq!(cmd.name, "split-window");
        assert_eq!(cmd.options, vec![
            ("h".to_string(), OptionValue::Flag),
            ("l".to_string(), OptionValue::Value("10".to_string())),
            ("d".to_string(), OptionValue::Flag),
        ]);
    }

    #[test]
    fn parse_command_reads_long_option_with_equals() {
        let cmd = parse_command("resize-pane --size=20", &[]).unwrap();
        assert_eq!(cmd.options, vec![("size".to_string(), OptionValue::Value("20".to_string()))]);
    }

    #[test]
    fn parse_command_collects_positionals() {
        let cmd = parse_command("set-option prefix ^B", &[]).unwrap();
        assert_eq!(cmd.positionals, vec!["prefix".to_string(), "^B".to_string()]);
    }
}
