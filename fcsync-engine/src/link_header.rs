//! `Link` header parsing.
//!
//! A header value is a comma-separated list of entries of the form
//! `<uri>; name=value; name="quoted value"`. Commas and semicolons inside
//! the `<uri>` or inside quoted strings do not split anything.

use reqwest::header::{HeaderMap, LINK};

/// One parsed entry of a `Link` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkValue {
    pub uri: String,
    /// Parameters in header order, names lowercased.
    pub params: Vec<(String, String)>,
}

impl LinkValue {
    /// Returns the first value of a parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns true if `rel` lists the given relation type.
    pub fn has_rel(&self, relation: &str) -> bool {
        self.param("rel").is_some_and(|rel| {
            rel.split_ascii_whitespace()
                .any(|r| r.eq_ignore_ascii_case(relation))
        })
    }

    /// Returns true if the `type` parameter equals `media_type`.
    pub fn has_type(&self, media_type: &str) -> bool {
        self.param("type")
            .is_some_and(|t| t.trim().eq_ignore_ascii_case(media_type))
    }
}

/// Finds the first link in any `Link` header with the given relation and,
/// if supplied, media type. Non-ASCII bytes in a value are decoded lossily.
pub fn find_link(headers: &HeaderMap, relation: &str, media_type: Option<&str>) -> Option<String> {
    headers
        .get_all(LINK)
        .iter()
        .flat_map(|value| parse(&String::from_utf8_lossy(value.as_bytes())))
        .find(|link| link.has_rel(relation) && media_type.is_none_or(|t| link.has_type(t)))
        .map(|link| link.uri)
}

/// Parses a single `Link` header value into its entries.
pub fn parse(header: &str) -> Vec<LinkValue> {
    let mut cursor = Cursor::new(header);
    let mut links = Vec::new();

    loop {
        cursor.skip_while(|c| c == ',' || c.is_whitespace());
        if cursor.is_done() {
            break;
        }
        match parse_entry(&mut cursor) {
            Some(link) => links.push(link),
            None => cursor.skip_entry(),
        }
    }

    links
}

fn parse_entry(cursor: &mut Cursor<'_>) -> Option<LinkValue> {
    if !cursor.eat('<') {
        return None;
    }
    let uri = cursor.take_until(|c| c == '>').trim().to_string();
    if !cursor.eat('>') {
        return None;
    }

    let mut params = Vec::new();
    loop {
        cursor.skip_while(char::is_whitespace);
        if !cursor.eat(';') {
            break;
        }
        cursor.skip_while(char::is_whitespace);
        let name = cursor
            .take_until(|c| c == '=' || c == ';' || c == ',')
            .trim()
            .to_ascii_lowercase();
        let value = if cursor.eat('=') {
            cursor.skip_while(char::is_whitespace);
            if cursor.peek() == Some('"') {
                cursor.quoted_string()
            } else {
                cursor
                    .take_until(|c| c == ';' || c == ',')
                    .trim()
                    .to_string()
            }
        } else {
            String::new()
        };
        if !name.is_empty() {
            params.push((name, value));
        }
    }

    // Anything left before the next comma is junk for this entry.
    cursor.skip_entry();
    Some(LinkValue { uri, params })
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        let input = self.input;
        &input[self.pos..]
    }

    fn is_done(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn skip_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
    }

    fn take_until(&mut self, stop: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(|c| !stop(c)) {
            self.bump();
        }
        let input = self.input;
        &input[start..self.pos]
    }

    /// Reads a quoted string starting at the opening quote.
    fn quoted_string(&mut self) -> String {
        let mut out = String::new();
        self.bump();
        while let Some(c) = self.bump() {
            match c {
                '"' => break,
                '\\' => {
                    if let Some(escaped) = self.bump() {
                        out.push(escaped);
                    }
                }
                _ => out.push(c),
            }
        }
        out
    }

    /// Skips to the next comma outside a quoted string.
    ///
    /// Only called where no `<uri>` is open, so `<` and `>` are plain text.
    fn skip_entry(&mut self) {
        let mut in_quotes = false;
        while let Some(c) = self.peek() {
            match c {
                ',' if !in_quotes => return,
                '"' => in_quotes = !in_quotes,
                '\\' if in_quotes => {
                    self.bump();
                }
                _ => {}
            }
            self.bump();
        }
    }
}
