//! `${name}` placeholder templates
//!
//! Used for autofill format patterns and for loop-counter substitution. Lexing is done
//! with logos; anything that is not a well-formed placeholder is kept as literal text.

use logos::Logos;
use std::borrow::Cow;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum TemplateToken<'src> {
    #[regex(r"\$\{[A-Za-z0-9_\-]+\}", |lex| { let s = lex.slice(); &s[2..s.len() - 1] })]
    Placeholder(&'src str),

    #[regex(r"[^$]+")]
    Text,

    #[token("$")]
    Dollar,
}

/// Piece of a parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'src> {
    Text(&'src str),
    Placeholder(&'src str),
}

/// Split a template into literal text and placeholder names
pub fn parse(source: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    // Start of the pending literal run; stray "$" tokens are folded into it
    let mut text_start: Option<usize> = None;

    for (token, span) in TemplateToken::lexer(source).spanned() {
        match token {
            Ok(TemplateToken::Placeholder(name)) => {
                if let Some(start) = text_start.take() {
                    segments.push(Segment::Text(&source[start..span.start]));
                }
                segments.push(Segment::Placeholder(name));
            }
            Ok(TemplateToken::Text) | Ok(TemplateToken::Dollar) | Err(_) => {
                text_start.get_or_insert(span.start);
            }
        }
    }

    if let Some(start) = text_start {
        segments.push(Segment::Text(&source[start..]));
    }

    segments
}

/// Names of all placeholders, in order of appearance
pub fn placeholders(source: &str) -> Vec<&str> {
    parse(source)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Placeholder(name) => Some(name),
            Segment::Text(_) => None,
        })
        .collect()
}

/// Replace every placeholder; fails with the first name `lookup` cannot resolve
pub fn render<F>(source: &str, mut lookup: F) -> Result<String, String>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut output = String::with_capacity(source.len());
    for segment in parse(source) {
        match segment {
            Segment::Text(text) => output.push_str(text),
            Segment::Placeholder(name) => match lookup(name) {
                Some(value) => output.push_str(&value),
                None => return Err(name.to_string()),
            },
        }
    }
    Ok(output)
}

/// Replace the single placeholder `name`, leaving every other placeholder intact
pub fn substitute<'a>(source: &'a str, name: &str, value: &str) -> Cow<'a, str> {
    if !source.contains('$') {
        return Cow::Borrowed(source);
    }

    let segments = parse(source);
    if !segments
        .iter()
        .any(|segment| matches!(segment, Segment::Placeholder(n) if *n == name))
    {
        return Cow::Borrowed(source);
    }

    let mut output = String::with_capacity(source.len());
    for segment in segments {
        match segment {
            Segment::Text(text) => output.push_str(text),
            Segment::Placeholder(n) if n == name => output.push_str(value),
            Segment::Placeholder(n) => {
                output.push_str("${");
                output.push_str(n);
                output.push('}');
            }
        }
    }
    Cow::Owned(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed() {
        let segments = parse("${month}/${year}");
        assert_eq!(
            segments,
            vec![
                Segment::Placeholder("month"),
                Segment::Text("/"),
                Segment::Placeholder("year"),
            ]
        );
    }

    #[test]
    fn test_dangling_dollar_is_text() {
        assert_eq!(parse("cost: $5 ${"), vec![Segment::Text("cost: $5 ${")]);
        assert!(placeholders("$}").is_empty());
    }

    #[test]
    fn test_render_reports_missing_name() {
        let result = render("${name} ${unknown}", |name| {
            (name == "name").then(|| "Jane".to_string())
        });
        assert_eq!(result, Err("unknown".to_string()));
    }

    #[test]
    fn test_substitute_leaves_other_placeholders() {
        assert_eq!(substitute("cell_${i}_${j}", "i", "2"), "cell_2_${j}");
        assert!(matches!(substitute("plain", "i", "2"), Cow::Borrowed("plain")));
    }
}
