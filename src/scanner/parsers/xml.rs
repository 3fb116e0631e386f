//! Markup parser.
//!
//! A minimal hand-rolled XML reader decodes the document into the shared
//! [`Node`] tree using the attribute/text convention the recursive walk
//! expects: attribute keys carry a `-` prefix, text content lives under
//! `#text`, and leaf elements with neither attributes nor children collapse
//! to plain strings. The walk collects each element's sibling attributes and
//! applies the attribute-group heuristics after visiting its children.

use anyhow::{bail, Result};
use std::path::Path;
use tracing::debug;

use crate::config::ScanType;
use crate::scanner::core::{file_stem_and_extension, read_lossy, Scanner};
use crate::scanner::tree::Node;
use crate::scanner::types::{Finding, FindingKind};

const XML_SUFFIX: &str = ".xml";

const ATTRIBUTE_PREFIX: char = '-';
const TEXT_KEY: &str = "#text";
const NAME_ATTRIBUTE: &str = "name";

/// Attributes which may identify the real purpose of an element, as in
/// `<property key="password">blah</property>`.
const IDENTIFIER_ATTRIBUTE_NAMES: &[&str] = &["id", "key", "name"];

impl Scanner {
    pub(crate) fn is_parsable_xml_file(&self, path: &Path) -> bool {
        if !self.scan_type_enabled(ScanType::Xml) {
            return false;
        }

        let (_, extension) = file_stem_and_extension(path);
        extension == XML_SUFFIX
    }

    pub(crate) fn parse_xml_file(&self, path: &Path, out: &mut Vec<Finding>) {
        let data = match read_lossy(path) {
            Ok(data) => data,
            Err(err) => {
                debug!("could not read {}: {err}", path.display());
                return;
            }
        };
        if data.is_empty() {
            return;
        }

        let root = match decode_xml(&data) {
            Ok(root) => root,
            Err(err) => {
                debug!("could not parse {}: {err}", path.display());
                return;
            }
        };

        let file = path.to_string_lossy();
        self.walk_xml_map(&file, &[root], "", out);
    }

    fn walk_xml_map(
        &self,
        file: &str,
        entries: &[(String, Node)],
        parent_key: &str,
        out: &mut Vec<Finding>,
    ) {
        let mut siblings: Vec<(String, String)> = Vec::new();
        let mut text_body = "";

        for (key, value) in entries {
            match value {
                Node::Str(s) => {
                    if key == TEXT_KEY {
                        text_body = s.as_str();
                    }

                    if let Some(attr) = key.strip_prefix(ATTRIBUTE_PREFIX) {
                        siblings.push((attr.to_string(), s.clone()));
                    } else if key.starts_with('#') {
                        if let Some(m) = self.classifier.classify_named_value(parent_key, s) {
                            out.push(Finding {
                                file: file.to_string(),
                                kind: FindingKind::XmlElement,
                                line: 0,
                                name: parent_key.to_string(),
                                value: s.clone(),
                                credential_category: m.category,
                            });
                        }
                    } else if let Some(m) = self.classifier.classify_named_value(key, s) {
                        out.push(Finding {
                            file: file.to_string(),
                            kind: FindingKind::XmlElement,
                            line: 0,
                            name: key.clone(),
                            value: s.clone(),
                            credential_category: m.category,
                        });
                    }
                }
                Node::List(items) => {
                    for item in items {
                        if let Node::Map(entries) = item {
                            self.walk_xml_map(file, entries, key, out);
                        }
                    }
                }
                Node::Map(entries) => {
                    self.walk_xml_map(file, entries, key, out);
                }
                Node::Other => {}
            }
        }

        if !text_body.is_empty()
            && self.xml_attributes_with_text_body_contain_credentials(text_body, &siblings)
        {
            out.push(Finding {
                file: file.to_string(),
                kind: FindingKind::XmlAttribute,
                line: 0,
                name: parent_key.to_string(),
                value: build_xml_element_line(parent_key, &siblings, text_body),
                credential_category: None,
            });
        }
        if self.xml_attributes_contain_credentials(&siblings) {
            out.push(Finding {
                file: file.to_string(),
                kind: FindingKind::XmlAttribute,
                line: 0,
                name: parent_key.to_string(),
                value: build_xml_attribute_line(parent_key, &siblings),
                credential_category: None,
            });
        }
    }

    /// The sibling-attribute heuristic: does some combination of this
    /// element's attributes look like a credential pair?
    fn xml_attributes_contain_credentials(&self, siblings: &[(String, String)]) -> bool {
        // any key=>value pair on its own
        for (key, value) in siblings {
            // attributes on the markup exclusion list veto the whole element
            if self.classifier.attribute_name_excluded(key)
                || self.classifier.attribute_name_excluded(value)
            {
                return false;
            }

            if self.classifier.classify_named_value(key, value).is_some() {
                return true;
            }
        }

        // no suspicious key; with a single attribute there is nothing to pair
        if siblings.len() < 2 {
            return false;
        }

        if let Some(name_value) = siblings
            .iter()
            .find(|(k, _)| k == NAME_ATTRIBUTE)
            .map(|(_, v)| v.as_str())
        {
            // a generic "name" attribute paired with every other value, as in
            // <property name="api_key" value="...">
            for (_, value) in siblings {
                if value == name_value {
                    continue;
                }
                if self
                    .classifier
                    .classify_named_value(name_value, value)
                    .is_some()
                {
                    return true;
                }
            }

            // once a "name" attribute exists, it is the variable name; no
            // further pairing makes sense
            return false;
        }

        // fallback: values paired against each other; requires at least two
        // plausible values, none excluded
        let mut long_enough = 0;
        for (_, value) in siblings {
            if value.len() < self.classifier.min_value_length() {
                continue;
            }
            long_enough += 1;

            if self.classifier.name_excluded(value) {
                return false;
            }
            if self.classifier.value_excluded(value) {
                return false;
            }
        }
        if long_enough < 2 {
            return false;
        }

        siblings.iter().any(|(_, value)| {
            self.classifier.any_name_pattern_matches(value) && !self.classifier.name_excluded(value)
        })
    }

    /// Identifier-attribute heuristic: an attribute meaning "id"/"key"/"name"
    /// names the element's text body, as in `<entry key="password">x</entry>`.
    fn xml_attributes_with_text_body_contain_credentials(
        &self,
        body: &str,
        siblings: &[(String, String)],
    ) -> bool {
        for (key, value) in siblings {
            if !IDENTIFIER_ATTRIBUTE_NAMES.contains(&key.as_str()) {
                continue;
            }
            if self.classifier.classify_named_value(value, body).is_some() {
                return true;
            }
        }
        false
    }
}

/// Reconstruct a tag-like line for reporting, attributes sorted by key for
/// determinism.
fn build_xml_attribute_line(parent: &str, siblings: &[(String, String)]) -> String {
    let mut attributes: Vec<String> = siblings
        .iter()
        .map(|(k, v)| format!(" {k}=\"{v}\""))
        .collect();
    attributes.sort();

    format!("<{parent}{}>", attributes.join(""))
}

fn build_xml_element_line(parent: &str, siblings: &[(String, String)], body: &str) -> String {
    format!(
        "{}{body}</{parent}>",
        build_xml_attribute_line(parent, siblings)
    )
}

// ---------------------------------------------------------------------------
// Minimal XML reader
// ---------------------------------------------------------------------------

/// Decode a document into its root entry. Handles prologs, comments,
/// DOCTYPE, CDATA, the five predefined entities plus numeric references, and
/// self-closing tags. Anything structurally broken is an error; the caller
/// skips the file.
fn decode_xml(input: &str) -> Result<(String, Node)> {
    let mut reader = XmlReader {
        s: input.as_bytes(),
        pos: 0,
    };
    reader.skip_misc();
    if reader.pos >= reader.s.len() {
        bail!("document contains no element");
    }
    let root = reader.parse_element()?;
    Ok(root)
}

struct XmlReader<'a> {
    s: &'a [u8],
    pos: usize,
}

impl XmlReader<'_> {
    fn starts_with(&self, token: &[u8]) -> bool {
        self.s[self.pos..].starts_with(token)
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.s.len() && self.s[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn skip_until(&mut self, token: &[u8]) {
        while self.pos < self.s.len() && !self.starts_with(token) {
            self.pos += 1;
        }
        self.pos = (self.pos + token.len()).min(self.s.len());
    }

    /// Skip whitespace, prologs, comments, and DOCTYPE ahead of an element.
    fn skip_misc(&mut self) {
        loop {
            self.skip_whitespace();
            if self.starts_with(b"<?") {
                self.skip_until(b"?>");
            } else if self.starts_with(b"<!--") {
                self.skip_until(b"-->");
            } else if self.starts_with(b"<!") {
                self.skip_until(b">");
            } else {
                return;
            }
        }
    }

    fn read_name(&mut self) -> Result<String> {
        let start = self.pos;
        while self.pos < self.s.len() {
            let b = self.s[self.pos];
            if b.is_ascii_alphanumeric() || matches!(b, b':' | b'_' | b'-' | b'.') {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            bail!("expected a name at offset {}", start);
        }
        Ok(String::from_utf8_lossy(&self.s[start..self.pos]).into_owned())
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        if self.pos < self.s.len() && self.s[self.pos] == byte {
            self.pos += 1;
            return Ok(());
        }
        bail!(
            "expected {:?} at offset {}",
            char::from(byte),
            self.pos
        );
    }

    fn parse_element(&mut self) -> Result<(String, Node)> {
        self.expect(b'<')?;
        let name = self.read_name()?;

        let mut attributes: Vec<(String, String)> = Vec::new();
        loop {
            self.skip_whitespace();
            if self.starts_with(b"/>") {
                self.pos += 2;
                return Ok((name, build_node(attributes, Vec::new(), String::new())));
            }
            if self.starts_with(b">") {
                self.pos += 1;
                break;
            }
            if self.pos >= self.s.len() {
                bail!("unterminated tag <{name}>");
            }

            let attr_name = self.read_name()?;
            self.skip_whitespace();
            self.expect(b'=')?;
            self.skip_whitespace();
            let attr_value = self.read_quoted()?;
            attributes.push((attr_name, attr_value));
        }

        let mut children: Vec<(String, Node)> = Vec::new();
        let mut text = String::new();
        loop {
            if self.pos >= self.s.len() {
                bail!("missing closing tag for <{name}>");
            }

            if self.starts_with(b"</") {
                self.pos += 2;
                let closing = self.read_name()?;
                if closing != name {
                    bail!("mismatched closing tag </{closing}> for <{name}>");
                }
                self.skip_whitespace();
                self.expect(b'>')?;
                return Ok((name, build_node(attributes, children, text)));
            }
            if self.starts_with(b"<!--") {
                self.skip_until(b"-->");
            } else if self.starts_with(b"<![CDATA[") {
                self.pos += b"<![CDATA[".len();
                let start = self.pos;
                self.skip_until(b"]]>");
                let end = self.pos.saturating_sub(3).max(start);
                text.push_str(&String::from_utf8_lossy(&self.s[start..end]));
            } else if self.starts_with(b"<?") {
                self.skip_until(b"?>");
            } else if self.starts_with(b"<") {
                children.push(self.parse_element()?);
            } else {
                let start = self.pos;
                while self.pos < self.s.len() && self.s[self.pos] != b'<' {
                    self.pos += 1;
                }
                text.push_str(&decode_entities(&String::from_utf8_lossy(
                    &self.s[start..self.pos],
                )));
            }
        }
    }

    fn read_quoted(&mut self) -> Result<String> {
        let quote = if self.starts_with(b"\"") {
            b'"'
        } else if self.starts_with(b"'") {
            b'\''
        } else {
            bail!("expected a quoted attribute value at offset {}", self.pos);
        };
        self.pos += 1;

        let start = self.pos;
        while self.pos < self.s.len() && self.s[self.pos] != quote {
            self.pos += 1;
        }
        if self.pos >= self.s.len() {
            bail!("unterminated attribute value");
        }
        let value = decode_entities(&String::from_utf8_lossy(&self.s[start..self.pos]));
        self.pos += 1;
        Ok(value)
    }
}

fn build_node(attributes: Vec<(String, String)>, children: Vec<(String, Node)>, text: String) -> Node {
    let text = text.trim();
    if attributes.is_empty() && children.is_empty() {
        return Node::Str(text.to_string());
    }

    let mut entries: Vec<(String, Node)> = attributes
        .into_iter()
        .map(|(k, v)| (format!("{ATTRIBUTE_PREFIX}{k}"), Node::Str(v)))
        .collect();
    entries.extend(children);
    if !text.is_empty() {
        entries.push((TEXT_KEY.to_string(), Node::Str(text.to_string())));
    }

    Node::Map(entries)
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        result.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let Some(semi) = rest.find(';') else {
            result.push_str(rest);
            return result;
        };
        let entity = &rest[1..semi];
        match entity {
            "amp" => result.push('&'),
            "lt" => result.push('<'),
            "gt" => result.push('>'),
            "quot" => result.push('"'),
            "apos" => result.push('\''),
            _ => {
                let decoded = entity
                    .strip_prefix('#')
                    .and_then(|n| n.parse::<u32>().ok())
                    .and_then(char::from_u32);
                match decoded {
                    Some(c) => result.push(c),
                    None => result.push_str(&rest[..=semi]),
                }
            }
        }
        rest = &rest[semi + 1..];
    }
    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::io::Write;

    fn parse_xml(content: &str) -> Vec<Finding> {
        let scanner = Scanner::new(&Config::load(None).unwrap()).unwrap();
        let mut file = tempfile::NamedTempFile::with_suffix(".xml").unwrap();
        file.write_all(content.as_bytes()).unwrap();
        let mut out = Vec::new();
        scanner.parse_xml_file(file.path(), &mut out);
        out
    }

    #[test]
    fn element_text_classified_against_element_name() {
        let findings =
            parse_xml("<config><password>supersecret123</password><host>db01</host></config>");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::XmlElement);
        assert_eq!(findings[0].name, "password");
        assert_eq!(findings[0].value, "supersecret123");
        assert_eq!(findings[0].line, 0);
    }

    #[test]
    fn sibling_name_value_pair_yields_single_attribute_finding() {
        let findings =
            parse_xml(r#"<root><property name="api_key" value="ajskdjlwlkej3k#kd3"/></root>"#);
        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.kind, FindingKind::XmlAttribute);
        assert_eq!(f.name, "property");
        // reconstructed, attributes sorted by key
        assert_eq!(
            f.value,
            r#"<property name="api_key" value="ajskdjlwlkej3k#kd3">"#
        );
    }

    #[test]
    fn identifier_attribute_with_text_body() {
        let findings = parse_xml(r#"<entry key="password">hunter2hunter2</entry>"#);
        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.kind, FindingKind::XmlAttribute);
        assert_eq!(f.value, r#"<entry key="password">hunter2hunter2</entry>"#);
    }

    #[test]
    fn suspicious_attribute_key_directly() {
        let findings = parse_xml(r#"<conn secret="ajskdjlwlkej3k44" timeout="30"/>"#);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::XmlAttribute);
    }

    #[test]
    fn attribute_exclusion_vetoes_element() {
        // default config excludes (?i)token attribute names in markup
        let findings = parse_xml(r#"<root><x token="abc" value="ajskdjlwlkej3k44"/></root>"#);
        assert!(findings.is_empty());
    }

    #[test]
    fn malformed_markup_is_skipped() {
        assert!(parse_xml("<a><b></a>").is_empty());
        assert!(parse_xml("no markup at all").is_empty());
    }

    #[test]
    fn decoder_conventions() {
        let (name, node) = decode_xml(
            r#"<?xml version="1.0"?>
<!-- comment -->
<root attr="x &amp; y">
  <leaf>text</leaf>
</root>"#,
        )
        .unwrap();
        assert_eq!(name, "root");
        assert_eq!(
            node,
            Node::Map(vec![
                ("-attr".to_string(), Node::Str("x & y".to_string())),
                ("leaf".to_string(), Node::Str("text".to_string())),
            ])
        );
    }

    #[test]
    fn entities_and_cdata() {
        let (_, node) = decode_xml("<a><![CDATA[1 < 2]]></a>").unwrap();
        assert_eq!(node, Node::Str("1 < 2".to_string()));
    }
}
