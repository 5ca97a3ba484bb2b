//! Tokenizer for tank assembly.
//!
//! Tokenizing never fails. Fragments that cannot be classified become
//! [`TokenKind::Unknown`] and are reported by the parser.

use crate::isa::Opcode;

/// Characters that start a comment running to the end of the line.
const COMMENT_CHARS: [char; 2] = [';', '#'];
/// Two-character comment marker.
const COMMENT_SLASHES: &str = "//";
/// Suffix marking a label definition.
const LABEL_SUFFIX: char = ':';

/// Classification of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// An opcode mnemonic at the head of an instruction.
    Opcode(Opcode),
    /// A bare word: register name, label reference or direction literal.
    Ident(String),
    /// A decimal integer literal.
    Int(i32),
    /// A label definition (`name:`).
    LabelDef(String),
    /// Something the tokenizer could not classify.
    Unknown(String),
}

/// A token and the source line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token classification.
    pub kind: TokenKind,
    /// 1-based source line.
    pub line: usize,
}

impl Token {
    /// Source-like text for diagnostics.
    #[must_use]
    pub fn text(&self) -> String {
        match &self.kind {
            TokenKind::Opcode(op) => op.mnemonic().to_string(),
            TokenKind::Ident(word) | TokenKind::Unknown(word) => word.clone(),
            TokenKind::Int(value) => value.to_string(),
            TokenKind::LabelDef(name) => format!("{name}{LABEL_SUFFIX}"),
        }
    }
}

/// Split source text into tokens.
///
/// Comments start with `;`, `#` or `//`. Commas separate operands but are
/// optional. A word is classified as an opcode only at the head of an
/// instruction (start of line or right after a label definition), so `CMP`
/// can be both an opcode and a register name.
#[must_use]
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();

    for (idx, raw_line) in source.lines().enumerate() {
        let line = idx + 1;
        let code = strip_comment(raw_line);
        let mut at_head = true;
        let mut word = String::new();

        for ch in code.chars() {
            if ch == LABEL_SUFFIX {
                if word.is_empty() {
                    tokens.push(Token {
                        kind: TokenKind::Unknown(LABEL_SUFFIX.to_string()),
                        line,
                    });
                    at_head = false;
                } else if is_identifier(&word) {
                    tokens.push(Token {
                        kind: TokenKind::LabelDef(std::mem::take(&mut word)),
                        line,
                    });
                    at_head = true;
                } else {
                    word.push(ch);
                    flush_word(&mut word, line, &mut at_head, &mut tokens);
                }
            } else if ch.is_whitespace() || ch == ',' {
                flush_word(&mut word, line, &mut at_head, &mut tokens);
            } else {
                word.push(ch);
            }
        }
        flush_word(&mut word, line, &mut at_head, &mut tokens);
    }

    tokens
}

/// Drop everything from the first comment marker onward.
fn strip_comment(line: &str) -> &str {
    let hash_or_semi = line.find(COMMENT_CHARS);
    let slashes = line.find(COMMENT_SLASHES);
    let cut = match (hash_or_semi, slashes) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    };
    cut.map_or(line, |end| &line[..end])
}

/// Classify the pending word (if any) and push it.
fn flush_word(word: &mut String, line: usize, at_head: &mut bool, tokens: &mut Vec<Token>) {
    if word.is_empty() {
        return;
    }
    let text = std::mem::take(word);
    let kind = classify(text, *at_head);
    *at_head = false;
    tokens.push(Token { kind, line });
}

fn classify(text: String, at_head: bool) -> TokenKind {
    if looks_numeric(&text) {
        return match text.parse::<i32>() {
            Ok(value) => TokenKind::Int(value),
            Err(_) => TokenKind::Unknown(text),
        };
    }

    if !is_identifier(&text) {
        return TokenKind::Unknown(text);
    }

    if at_head {
        if let Some(op) = Opcode::from_mnemonic(&text) {
            return TokenKind::Opcode(op);
        }
    }
    TokenKind::Ident(text)
}

fn looks_numeric(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    digits.starts_with(|c: char| c.is_ascii_digit())
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
