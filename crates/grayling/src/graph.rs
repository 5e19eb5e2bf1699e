//! Minimal graph document model and reader.
//!
//! A text source may contain several top-level graph definitions; the
//! scanner extracts them one at a time so the stream can stay lazy. Only the
//! parts this layer consumes are modeled: the header (`strict`,
//! `graph`/`digraph`, name), graph-scope attribute assignments, and nested
//! subgraph blocks. Node and edge statements are tolerated and skipped.

use crate::attr::{AttrScope, AttributeStore, GlobalDefaults};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphDoc {
    pub name: String,
    pub directed: bool,
    pub strict: bool,
    pub attrs: AttributeStore,
    pub subgraphs: Vec<GraphDoc>,
}

impl GraphDoc {
    /// Fills in staged graph-scope defaults wherever this document (and its
    /// subgraphs) did not set the attribute itself.
    pub fn apply_graph_defaults(&mut self, defaults: &GlobalDefaults) {
        for (name, value) in defaults.iter_scope(AttrScope::Graph) {
            self.attrs.set_if_absent(name, value);
        }
        for sub in &mut self.subgraphs {
            sub.apply_graph_defaults(defaults);
        }
    }
}

/// Scans graph documents out of a fully-read source text.
#[derive(Debug)]
pub struct DocScanner {
    text: String,
    pos: usize,
}

struct Token {
    text: String,
    quoted: bool,
}

impl DocScanner {
    pub fn new(text: String) -> Self {
        Self { text, pos: 0 }
    }

    /// Extracts the next top-level graph document, or `None` when the source
    /// is exhausted. Malformed trailing text exhausts the source.
    pub fn next_doc(&mut self) -> Option<GraphDoc> {
        loop {
            self.skip_trivia();
            let token = self.read_token()?;
            if token.quoted {
                continue;
            }
            let mut doc = GraphDoc::default();
            let keyword = if token.text.eq_ignore_ascii_case("strict") {
                doc.strict = true;
                self.skip_trivia();
                self.read_token()?
            } else {
                token
            };
            if keyword.quoted {
                continue;
            }
            if keyword.text.eq_ignore_ascii_case("digraph") {
                doc.directed = true;
            } else if !keyword.text.eq_ignore_ascii_case("graph") {
                continue;
            }

            self.skip_trivia();
            if self.peek() != Some(b'{') {
                let Some(name) = self.read_token() else {
                    return None;
                };
                doc.name = name.text;
                self.skip_trivia();
            }
            if self.peek() != Some(b'{') {
                // header without a body; resynchronize on the next keyword
                continue;
            }
            self.pos += 1;
            self.read_body(&mut doc);
            return Some(doc);
        }
    }

    fn read_body(&mut self, doc: &mut GraphDoc) {
        loop {
            self.skip_trivia();
            match self.peek() {
                None => return,
                Some(b'}') => {
                    self.pos += 1;
                    return;
                }
                Some(b';') | Some(b',') => {
                    self.pos += 1;
                }
                Some(b'[') => {
                    self.pos += 1;
                    let _ = self.read_attr_list();
                }
                Some(b'{') => {
                    self.pos += 1;
                    let mut sub = GraphDoc {
                        directed: doc.directed,
                        ..GraphDoc::default()
                    };
                    self.read_body(&mut sub);
                    doc.subgraphs.push(sub);
                }
                Some(b'=') => {
                    // stray assignment with no left-hand side
                    self.pos += 1;
                }
                Some(_) => {
                    let Some(token) = self.read_token() else {
                        return;
                    };
                    self.read_statement(doc, token);
                }
            }
        }
    }

    fn read_statement(&mut self, doc: &mut GraphDoc, token: Token) {
        if !token.quoted && token.text.eq_ignore_ascii_case("subgraph") {
            self.skip_trivia();
            let mut sub = GraphDoc {
                directed: doc.directed,
                ..GraphDoc::default()
            };
            if self.peek() != Some(b'{') {
                if let Some(name) = self.read_token() {
                    sub.name = name.text;
                }
                self.skip_trivia();
            }
            if self.peek() == Some(b'{') {
                self.pos += 1;
                self.read_body(&mut sub);
                doc.subgraphs.push(sub);
            }
            return;
        }

        if !token.quoted
            && (token.text.eq_ignore_ascii_case("graph")
                || token.text.eq_ignore_ascii_case("node")
                || token.text.eq_ignore_ascii_case("edge"))
        {
            let is_graph_scope = token.text.eq_ignore_ascii_case("graph");
            self.skip_trivia();
            while self.peek() == Some(b'[') {
                self.pos += 1;
                let pairs = self.read_attr_list();
                if is_graph_scope {
                    for (name, value) in pairs {
                        doc.attrs.set(name, value);
                    }
                }
                self.skip_trivia();
            }
            return;
        }

        self.skip_trivia();
        if self.peek() == Some(b'=') {
            self.pos += 1;
            self.skip_trivia();
            if let Some(value) = self.read_token() {
                doc.attrs.set(token.text, value.text);
            }
        }
        // anything else is a node/edge statement fragment; the body loop
        // consumes it token by token
    }

    fn read_attr_list(&mut self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        loop {
            self.skip_trivia();
            match self.peek() {
                None => return pairs,
                Some(b']') => {
                    self.pos += 1;
                    return pairs;
                }
                Some(b',') | Some(b';') => {
                    self.pos += 1;
                }
                Some(_) => {
                    let Some(name) = self.read_token() else {
                        return pairs;
                    };
                    self.skip_trivia();
                    if self.peek() == Some(b'=') {
                        self.pos += 1;
                        self.skip_trivia();
                        if let Some(value) = self.read_token() {
                            pairs.push((name.text, value.text));
                        }
                    } else {
                        pairs.push((name.text, "true".to_string()));
                    }
                }
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn rest(&self) -> &str {
        &self.text[self.pos..]
    }

    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            let ws = rest.len() - trimmed.len();
            if trimmed.starts_with("//") || trimmed.starts_with('#') {
                match trimmed.find('\n') {
                    Some(nl) => self.pos += ws + nl + 1,
                    None => self.pos = self.text.len(),
                }
            } else if let Some(after) = trimmed.strip_prefix("/*") {
                match after.find("*/") {
                    Some(end) => self.pos += ws + 2 + end + 2,
                    None => self.pos = self.text.len(),
                }
            } else {
                self.pos += ws;
                return;
            }
        }
    }

    /// Reads a quoted string (backslash escapes resolved) or a bare word.
    fn read_token(&mut self) -> Option<Token> {
        self.skip_trivia();
        let bytes = self.text.as_bytes();
        let first = *bytes.get(self.pos)?;
        if first == b'"' {
            self.pos += 1;
            let mut out = String::new();
            let mut chars = self.text[self.pos..].char_indices();
            while let Some((i, ch)) = chars.next() {
                match ch {
                    '"' => {
                        self.pos += i + 1;
                        return Some(Token {
                            text: out,
                            quoted: true,
                        });
                    }
                    '\\' => {
                        if let Some((_, escaped)) = chars.next() {
                            match escaped {
                                '"' | '\\' => out.push(escaped),
                                '\n' => {} // line continuation
                                other => {
                                    out.push('\\');
                                    out.push(other);
                                }
                            }
                        }
                    }
                    other => out.push(other),
                }
            }
            // unterminated string runs to the end of the source
            self.pos = self.text.len();
            return Some(Token {
                text: out,
                quoted: true,
            });
        }

        let rest = &self.text[self.pos..];
        let mut end = 0;
        for ch in rest.chars() {
            if ch.is_whitespace() || matches!(ch, '{' | '}' | '[' | ']' | '=' | ';' | ',' | '"') {
                break;
            }
            end += ch.len_utf8();
        }
        if end == 0 {
            return None;
        }
        let text = rest[..end].to_string();
        self.pos += end;
        Some(Token {
            text,
            quoted: false,
        })
    }
}
