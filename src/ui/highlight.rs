//! JSON highlighting through syntect's scope parser, colored from the theme
//! palette rather than a syntect theme. `$env.NAME$` placeholders are
//! picked out separately.

use std::sync::LazyLock;

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use syntect::easy::ScopeRegionIterator;
use syntect::parsing::{ParseState, ScopeStack, SyntaxSet};

use crate::env::interpolator::parse_env_tokens;
use crate::theme::Palette;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Key,
    String,
    Number,
    Plain,
}

impl Token {
    fn from_scopes(stack: &ScopeStack) -> Self {
        let names: Vec<String> = stack.as_slice().iter().map(|scope| scope.build_string()).collect();
        if names.iter().any(|name| name.starts_with("constant.")) {
            Token::Number
        } else if names.iter().any(|name| name.starts_with("string.")) {
            if names.iter().any(|name| name.contains(".key")) {
                Token::Key
            } else {
                Token::String
            }
        } else {
            Token::Plain
        }
    }
}

/// Classify every line of `text` as JSON. Adjacent runs of the same token
/// are merged. Text the parser rejects falls back to plain.
pub fn classify_json(text: &str) -> Vec<Vec<(Token, String)>> {
    let Some(syntax) = SYNTAX_SET.find_syntax_by_extension("json") else {
        return text.lines().map(|line| vec![(Token::Plain, line.to_string())]).collect();
    };
    let mut state = ParseState::new(syntax);
    let mut stack = ScopeStack::new();

    text.lines()
        .map(|line| {
            let with_newline = format!("{line}\n");
            let Ok(ops) = state.parse_line(&with_newline, &SYNTAX_SET) else {
                return vec![(Token::Plain, line.to_string())];
            };

            let mut runs: Vec<(Token, String)> = Vec::new();
            for (region, op) in ScopeRegionIterator::new(&ops, &with_newline) {
                if stack.apply(op).is_err() {
                    stack = ScopeStack::new();
                }
                let region = region.trim_end_matches('\n');
                if region.is_empty() {
                    continue;
                }
                let token = Token::from_scopes(&stack);
                match runs.last_mut() {
                    Some((last, run)) if *last == token => run.push_str(region),
                    _ => runs.push((token, region.to_string())),
                }
            }
            mark_keys(&mut runs);
            runs
        })
        .collect()
}

/// Older JSON grammars scope keys as plain strings.
fn mark_keys(runs: &mut [(Token, String)]) {
    for i in 1..runs.len() {
        if runs[i - 1].0 == Token::String && runs[i].1.trim_start().starts_with(':') {
            runs[i - 1].0 = Token::Key;
        }
    }
}

pub fn json_lines(text: &str, palette: &Palette) -> Vec<Line<'static>> {
    classify_json(text)
        .into_iter()
        .map(|runs| {
            let spans: Vec<Span<'static>> = runs
                .into_iter()
                .map(|(token, run)| {
                    let fg = match token {
                        Token::Key => palette.json_key,
                        Token::String => palette.json_string,
                        Token::Number => palette.json_number,
                        Token::Plain => palette.text,
                    };
                    Span::styled(run, Style::default().fg(fg))
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

/// `text` in `base`, with `$env.NAME$` placeholders picked out.
pub fn with_placeholders(text: &str, base: Style, palette: &Palette) -> Vec<Span<'static>> {
    let placeholder = Style::default()
        .fg(palette.placeholder)
        .add_modifier(Modifier::ITALIC);
    let mut spans = Vec::new();
    let mut last = 0;
    for (start, end, _) in parse_env_tokens(text) {
        if last < start {
            spans.push(Span::styled(text[last..start].to_string(), base));
        }
        spans.push(Span::styled(text[start..end].to_string(), placeholder));
        last = end;
    }
    if last < text.len() || spans.is_empty() {
        spans.push(Span::styled(text[last..].to_string(), base));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs_of(lines: &[Vec<(Token, String)>], wanted: Token) -> String {
        lines
            .iter()
            .flatten()
            .filter(|(token, _)| *token == wanted)
            .map(|(_, run)| run.as_str())
            .collect()
    }

    #[test]
    fn test_classify_json_tokens() {
        let lines = classify_json(r#"{"id": 42, "name": "ada", "ok": true}"#);
        assert!(runs_of(&lines, Token::Key).contains("id"));
        assert!(runs_of(&lines, Token::Key).contains("name"));
        assert!(runs_of(&lines, Token::String).contains("ada"));
        assert!(!runs_of(&lines, Token::String).contains("id"));
        assert!(runs_of(&lines, Token::Number).contains("42"));
        assert!(runs_of(&lines, Token::Number).contains("true"));
    }

    #[test]
    fn test_classify_keeps_every_byte_across_lines() {
        let text = "{\n  \"a\": [1, -2.5e3, null],\n  \"b\": \"x\"\n}";
        let lines = classify_json(text);
        assert_eq!(lines.len(), 4);
        let joined: Vec<String> = lines
            .iter()
            .map(|runs| runs.iter().map(|(_, run)| run.as_str()).collect())
            .collect();
        assert_eq!(joined.join("\n"), text);
    }

    #[test]
    fn test_nested_object_on_a_later_line() {
        let lines = classify_json("{\n  \"nested\": {\"k\": \"v\"}\n}");
        assert!(runs_of(&lines[1..2], Token::Key).contains("nested"));
        assert!(runs_of(&lines[1..2], Token::String).contains('v'));
    }

    #[test]
    fn test_json_lines_use_palette_slots() {
        let palette = Palette::default();
        let lines = json_lines(r#"{"n": 1}"#, &palette);
        let number = lines[0]
            .spans
            .iter()
            .find(|span| span.content.contains('1'))
            .unwrap();
        assert_eq!(number.style.fg, Some(palette.json_number));
    }

    #[test]
    fn test_placeholders_are_split_out() {
        let palette = Palette::default();
        let spans = with_placeholders("Bearer $env.TOKEN$!", Style::default(), &palette);
        let texts: Vec<&str> = spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(texts, ["Bearer ", "$env.TOKEN$", "!"]);
        assert_eq!(spans[1].style.fg, Some(palette.placeholder));
    }
}
