//! Positional placeholder substitution (`{0}`, `{1}`, ...).

use crate::codegen::value_expr::NEUTRAL_LITERAL;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub text: String,
    /// Placeholder indices with no matching argument, in order of appearance.
    pub unresolved: Vec<usize>,
}

/// Replace `{i}` with `args[i]`. Out-of-range indices become the neutral
/// literal and are reported in `unresolved`. `{{` and `}}` are literal braces;
/// any other brace text is copied through untouched.
pub fn apply_pattern(pattern: &str, args: &[String]) -> Substitution {
    let mut text = String::with_capacity(pattern.len());
    let mut unresolved = Vec::new();
    let mut rest = pattern;

    while let Some(pos) = rest.find(['{', '}']) {
        text.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            text.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            text.push('}');
            rest = &tail[1..];
            continue;
        }

        let digits = tail[1..]
            .find(|c: char| !c.is_ascii_digit())
            .map_or(&tail[1..], |end| &tail[1..1 + end]);
        let closes = tail[1 + digits.len()..].starts_with('}');

        match digits.parse::<usize>() {
            Ok(index) if closes => {
                match args.get(index) {
                    Some(arg) => text.push_str(arg),
                    None => {
                        text.push_str(NEUTRAL_LITERAL);
                        unresolved.push(index);
                    }
                }
                rest = &tail[digits.len() + 2..];
            }
            _ => {
                text.push('{');
                rest = &tail[1..];
            }
        }
    }
    text.push_str(rest);

    Substitution { text, unresolved }
}
