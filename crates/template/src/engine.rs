//! Placeholder replacement

use crate::fields::DocumentKind;
use docx_core::{Document, Paragraph, PartKind};
use log::debug;

/// Opening marker of a placeholder token
pub const TOKEN_OPEN: &str = "{{";
/// Closing marker of a placeholder token
pub const TOKEN_CLOSE: &str = "}}";

/// Token to replacement mapping
///
/// Entries keep insertion order; replacements are applied one entry at a
/// time as literal substring substitutions. Keys should not be substrings
/// of each other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderMap {
    entries: Vec<(String, String)>,
}

impl PlaceholderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a literal token; re-inserting a token overwrites its value
    pub fn insert(&mut self, token: impl Into<String>, value: impl Into<String>) {
        let token = token.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == token) {
            Some((_, v)) => *v = value,
            None => self.entries.push((token, value)),
        }
    }

    /// Insert by bare key name (`CLIENTE` becomes `{{ CLIENTE }}`)
    pub fn insert_field(&mut self, name: &str, value: impl Into<String>) {
        self.insert(format!("{TOKEN_OPEN} {name} {TOKEN_CLOSE}"), value);
    }

    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == token)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply every entry, in order, to `text`
    pub fn apply(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (token, value) in &self.entries {
            if !token.is_empty() && out.contains(token.as_str()) {
                out = out.replace(token.as_str(), value);
            }
        }
        out
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PlaceholderMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

/// Which parts of a document are visited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Traversal {
    /// Body paragraphs, including every table cell at any depth
    #[default]
    Body,
    /// Body plus every header and footer
    BodyAndHeaders,
}

impl Traversal {
    pub fn includes_headers_footers(&self) -> bool {
        matches!(self, Traversal::BodyAndHeaders)
    }

    /// Whether a part of this kind is visited
    pub fn visits(&self, kind: PartKind) -> bool {
        kind == PartKind::Body || self.includes_headers_footers()
    }
}

/// Placeholder engine bound to a mapping
pub struct PlaceholderEngine<'a> {
    map: &'a PlaceholderMap,
    traversal: Traversal,
}

impl<'a> PlaceholderEngine<'a> {
    /// Create an engine visiting the body only
    pub fn new(map: &'a PlaceholderMap) -> Self {
        Self {
            map,
            traversal: Traversal::Body,
        }
    }

    /// Set which parts are visited
    pub fn with_traversal(mut self, traversal: Traversal) -> Self {
        self.traversal = traversal;
        self
    }

    /// Fill the document in place, returning the number of rewritten paragraphs
    pub fn fill(&self, doc: &mut Document) -> usize {
        let mut rewritten = 0;
        for part in doc.parts_mut(self.traversal.includes_headers_footers()) {
            let mut in_part = 0;
            for paragraph in part.paragraphs_mut() {
                if self.fill_paragraph(paragraph) {
                    in_part += 1;
                }
            }
            if in_part > 0 {
                debug!("{}: rewrote {in_part} paragraphs", part.name());
            }
            rewritten += in_part;
        }
        rewritten
    }

    /// Replace tokens in one paragraph; `true` when it was rewritten
    fn fill_paragraph(&self, paragraph: &mut Paragraph) -> bool {
        let text = paragraph.text();
        if !text.contains(TOKEN_OPEN) {
            return false;
        }
        let filled = self.map.apply(&text);
        if filled == text {
            return false;
        }
        paragraph.collapse_text(&filled);
        true
    }
}

/// Fill every visited paragraph of `doc` from `map`
///
/// Returns the number of paragraphs rewritten.
pub fn fill(doc: &mut Document, map: &PlaceholderMap, traversal: Traversal) -> usize {
    PlaceholderEngine::new(map)
        .with_traversal(traversal)
        .fill(doc)
}

/// Every distinct `{{ ... }}` token in the visited paragraphs, in document order
pub fn scan_tokens(doc: &Document, traversal: Traversal) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for part in doc.parts() {
        if !traversal.visits(part.kind()) {
            continue;
        }
        for paragraph in part.paragraphs() {
            for token in tokens_in(&paragraph.text()) {
                if !tokens.iter().any(|t| t == token) {
                    tokens.push(token.to_string());
                }
            }
        }
    }
    tokens
}

/// Tokens in `doc` that are not recognized keys of `kind`
pub fn lint_tokens(kind: DocumentKind, doc: &Document) -> Vec<String> {
    let known: Vec<String> = kind.keys().iter().map(|key| key.token()).collect();
    scan_tokens(doc, kind.traversal())
        .into_iter()
        .filter(|token| !known.contains(token))
        .collect()
}

fn tokens_in(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(TOKEN_OPEN) {
        let after = &rest[start + TOKEN_OPEN.len()..];
        let Some(end) = after.find(TOKEN_CLOSE) else {
            break;
        };
        let len = TOKEN_OPEN.len() + end + TOKEN_CLOSE.len();
        out.push(&rest[start..start + len]);
        rest = &rest[start + len..];
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use docx_core::{Run, RunFormat};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_map_insert_overwrites_in_place() {
        let mut map = PlaceholderMap::new();
        map.insert_field("A", "1");
        map.insert_field("B", "2");
        map.insert("{{ A }}", "3");
        let entries: Vec<(&str, &str)> = map.iter().collect();
        assert_eq!(entries, vec![("{{ A }}", "3"), ("{{ B }}", "2")]);
        assert_eq!(map.get("{{ B }}"), Some("2"));
        assert_eq!(map.get("{{ C }}"), None);
    }

    #[test]
    fn test_apply_is_sequential() {
        let map: PlaceholderMap = [("{{ A }}", "{{ B }}"), ("{{ B }}", "x")].into_iter().collect();
        assert_eq!(map.apply("{{ A }} {{ B }}"), "x x");
        assert_eq!(map.apply("nada"), "nada");
    }

    #[test]
    fn test_fill_paragraph_without_opener_is_untouched() {
        let map: PlaceholderMap = [("CLIENTE", "Maria")].into_iter().collect();
        let engine = PlaceholderEngine::new(&map);
        let mut p = Paragraph::from_runs([Run::new("CLIENTE")]);
        let before = p.clone();
        assert!(!engine.fill_paragraph(&mut p));
        assert_eq!(p, before);
    }

    #[test]
    fn test_fill_paragraph_collapses_runs() {
        let map: PlaceholderMap = [("{{ CLIENTE }}", "Maria Silva")].into_iter().collect();
        let engine = PlaceholderEngine::new(&map);
        let mut p = Paragraph::from_runs([
            Run::styled("Cliente: {{ CLI", RunFormat::bold()),
            Run::styled("ENTE }}", RunFormat::italic()),
        ]);
        assert!(engine.fill_paragraph(&mut p));
        let runs: Vec<&Run> = p.runs().collect();
        assert_eq!(runs[0].text(), "Cliente: Maria Silva");
        assert_eq!(runs[0].format, RunFormat::bold());
        assert_eq!(runs[1].text(), "");
    }

    #[test]
    fn test_unknown_token_left_alone() {
        let map: PlaceholderMap = [("{{ CLIENTE }}", "Maria")].into_iter().collect();
        let engine = PlaceholderEngine::new(&map);
        let mut p = Paragraph::with_text("{{ OUTRO }}");
        assert!(!engine.fill_paragraph(&mut p));
        assert_eq!(p.text(), "{{ OUTRO }}");
    }

    #[test]
    fn test_tokens_in() {
        assert_eq!(
            tokens_in("a {{ X }} b {{Y}} c {{ aberto"),
            vec!["{{ X }}", "{{Y}}"]
        );
        assert!(tokens_in("sem marcadores").is_empty());
    }

    #[test]
    fn test_traversal_visits() {
        assert!(Traversal::Body.visits(PartKind::Body));
        assert!(!Traversal::Body.visits(PartKind::Footer));
        assert!(Traversal::BodyAndHeaders.visits(PartKind::Header));
    }
}
