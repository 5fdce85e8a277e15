//! Directive recognition
//!
//! A logical line is a directive when it matches
//! `ws? '#' ws? command ws? symbol? ws? remainder`, where `command` and
//! `symbol` are `[A-Za-z0-9_]` words. The head of the logical line is matched
//! against the grammar; continuation fragments extend the remainder.

use super::expr::is_ident_char;
use super::lines::LogicalLine;

/// A recognised preprocessor directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Command word, lowercased (`define`, `ifdef`, ...)
    pub command: String,
    /// First word after the command, possibly empty
    pub symbol: String,
    /// Remaining text with comments removed, possibly empty
    pub body: String,
    /// Everything after the command word with comments removed
    pub args: String,
    /// Line number of the first physical line
    pub line: usize,
}

impl Directive {
    /// Recognise a single line of text
    pub fn parse(text: &str) -> Option<Self> {
        Self::recognize(text, &[], 0)
    }

    /// Recognise a joined logical line
    pub fn from_logical(line: &LogicalLine) -> Option<Self> {
        Self::recognize(line.head(), line.continuation(), line.line)
    }

    fn recognize(head: &str, continuation: &[String], line: usize) -> Option<Self> {
        let rest = head.trim_start().strip_prefix('#')?.trim_start();

        let (command, rest) = split_word(rest);
        if command.is_empty() {
            return None;
        }

        let (symbol, remainder) = split_word(rest.trim_start());

        Some(Self {
            command: command.to_ascii_lowercase(),
            symbol: symbol.to_string(),
            body: extend(remainder, continuation),
            args: extend(rest, continuation),
            line,
        })
    }
}

/// Trimmed `head` followed by the continuation fragments, comments removed
fn extend(head: &str, continuation: &[String]) -> String {
    let mut text = head.trim().to_string();
    for fragment in continuation {
        text.push_str(fragment);
    }
    strip_comments(&text).trim().to_string()
}

/// Split off the leading `[A-Za-z0-9_]*` word
pub(crate) fn split_word(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !is_ident_char(c)).unwrap_or(s.len());
    s.split_at(end)
}

/// Remove `//` and `/* */` comments outside of string and character literals
fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut quote: Option<char> = None;

    while let Some(ch) = chars.next() {
        if let Some(q) = quote {
            out.push(ch);
            if ch == '\\' {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            } else if ch == q {
                quote = None;
            }
            continue;
        }

        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                out.push(ch);
            }
            '/' if chars.peek() == Some(&'/') => break,
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = '\0';
                let mut closed = false;
                for inner in chars.by_ref() {
                    if previous == '*' && inner == '/' {
                        closed = true;
                        break;
                    }
                    previous = inner;
                }
                if !closed {
                    break;
                }
                out.push(' ');
            }
            _ => out.push(ch),
        }
    }

    out
}
