//! Inline text markup: `<b>`, `<i>` and `<linkN>`
//!
//! Tags may nest. Closing tags without a matching opening tag, and anything else that
//! looks like a tag, are kept as literal text.

use logos::Logos;
use serde::{Deserialize, Serialize};

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum MarkupToken {
    #[token("<b>")]
    BoldOpen,

    #[token("</b>")]
    BoldClose,

    #[token("<i>")]
    ItalicOpen,

    #[token("</i>")]
    ItalicClose,

    #[regex(r"<link[0-9]+>", |lex| { let s = lex.slice(); s[5..s.len() - 1].parse::<i32>().ok() })]
    LinkOpen(i32),

    #[regex(r"</link[0-9]+>", |lex| { let s = lex.slice(); s[6..s.len() - 1].parse::<i32>().ok() })]
    LinkClose(i32),

    #[regex(r"[^<]+")]
    Text,

    #[token("<")]
    Angle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StyledText {
    pub spans: Vec<TextSpan>,
}

impl StyledText {
    pub fn parse(source: &str) -> Self {
        let mut text = StyledText::default();
        let mut bold = 0usize;
        let mut italic = 0usize;
        let mut links: Vec<i32> = Vec::new();
        let mut lexer = MarkupToken::lexer(source);

        while let Some(token) = lexer.next() {
            let slice = lexer.slice();
            match token {
                Ok(MarkupToken::BoldOpen) => bold += 1,
                Ok(MarkupToken::ItalicOpen) => italic += 1,
                Ok(MarkupToken::LinkOpen(link)) => links.push(link),
                Ok(MarkupToken::BoldClose) if bold > 0 => bold -= 1,
                Ok(MarkupToken::ItalicClose) if italic > 0 => italic -= 1,
                Ok(MarkupToken::LinkClose(link)) if links.last() == Some(&link) => {
                    links.pop();
                }
                _ => text.push(slice, bold > 0, italic > 0, links.last().copied()),
            }
        }

        text
    }

    fn push(&mut self, fragment: &str, bold: bool, italic: bool, link: Option<i32>) {
        if let Some(last) = self.spans.last_mut() {
            if last.bold == bold && last.italic == italic && last.link == link {
                last.text.push_str(fragment);
                return;
            }
        }
        self.spans.push(TextSpan {
            text: fragment.to_string(),
            bold,
            italic,
            link,
        });
    }

    /// Text with all markup removed
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }

    pub fn has_link(&self, link: i32) -> bool {
        self.spans.iter().any(|span| span.link == Some(link))
    }

    pub fn links(&self) -> Vec<i32> {
        let mut links: Vec<i32> = self.spans.iter().filter_map(|span| span.link).collect();
        links.dedup();
        links
    }
}
