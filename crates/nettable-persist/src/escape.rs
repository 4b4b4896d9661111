//! String escaping for the line format
//!
//! Names and string literals appear between double quotes. Backslash,
//! quote, newline, and tab get the usual short escapes; other control
//! characters become `\xNN`. Everything else, including non-ASCII, passes
//! through unchanged.

use std::fmt::Write as _;

/// Escape a string for placement between quotes
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\x7f' => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Scan a quoted, escaped string starting at `input` (which must begin
/// with `"`); returns the unescaped content and the remainder after the
/// closing quote.
pub fn parse_quoted(input: &str) -> Result<(String, &str), String> {
    let rest = input
        .strip_prefix('"')
        .ok_or_else(|| "expected opening quote".to_string())?;

    let mut out = String::new();
    let mut chars = rest.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((out, &rest[i + 1..])),
            '\\' => match chars.next() {
                Some((_, '\\')) => out.push('\\'),
                Some((_, '"')) => out.push('"'),
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, 'x')) => {
                    let hi = chars.next();
                    let lo = chars.next();
                    let (Some((_, hi)), Some((_, lo))) = (hi, lo) else {
                        return Err("truncated \\x escape".into());
                    };
                    let code = u32::from_str_radix(&format!("{hi}{lo}"), 16)
                        .map_err(|_| format!("bad \\x escape \\x{hi}{lo}"))?;
                    let c = char::from_u32(code).ok_or("bad \\x escape codepoint")?;
                    out.push(c);
                }
                Some((_, other)) => return Err(format!("unknown escape \\{other}")),
                None => return Err("trailing backslash".into()),
            },
            c => out.push(c),
        }
    }
    Err("missing closing quote".into())
}
