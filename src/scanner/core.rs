use anyhow::Result;
use std::collections::HashSet;
use std::path::Path;

use crate::config::{Config, ScanType};

use super::patterns::Classifier;
use super::types::Finding;

/// Main scanner - owns the configuration and the compiled classifier, both
/// read-only for the lifetime of a scan and safely shared across workers.
pub struct Scanner {
    pub(crate) config: Config,
    pub(crate) classifier: Classifier,
    scan_types: HashSet<ScanType>,
}

impl Scanner {
    pub fn new(config: &Config) -> Result<Self> {
        let classifier = Classifier::new(config)?;
        Ok(Scanner {
            scan_types: config.enabled_scan_types(),
            config: config.clone(),
            classifier,
        })
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub(crate) fn scan_type_enabled(&self, t: ScanType) -> bool {
        self.scan_types.contains(&t)
    }

    /// Select and run the format parser for `path`. Returns `None` when no
    /// parser recognizes the path (the file is then not counted as scanned).
    ///
    /// First matching parser wins, with one exception: a properties-style
    /// file is also handed to the private-key parser, because extensionless
    /// files such as `id_rsa` are ambiguous between the two.
    pub fn parse_file(&self, path: &Path) -> Option<Vec<Finding>> {
        let mut findings = Vec::new();

        if self.is_parsable_go_file(path) {
            self.parse_go_file(path, &mut findings);
        } else if self.is_parsable_json_file(path) {
            self.parse_json_file(path, &mut findings);
        } else if self.is_parsable_xml_file(path) {
            self.parse_xml_file(path, &mut findings);
        } else if self.is_parsable_yaml_file(path) {
            self.parse_yaml_file(path, &mut findings);
        } else if self.is_parsable_php_file(path) {
            self.parse_php_file(path, &mut findings);
        } else if self.is_parsable_properties_file(path) {
            self.parse_properties_file(path, &mut findings);
            self.parse_private_key_file(path, &mut findings);
        } else if self.is_parsable_private_key_file(path) {
            self.parse_private_key_file(path, &mut findings);
        } else if self.is_parsable_bash_file(path) {
            self.parse_bash_file(path, &mut findings);
        } else if self.is_parsable_generic_code_file(path) {
            self.parse_generic_code_file(path, &mut findings);
        } else if self.is_parsable_generic_file(path) {
            self.parse_generic_file(path, &mut findings);
        } else {
            return None;
        }

        Some(findings)
    }
}

/// Split a path's base name into stem and extension with the extension being
/// the suffix from the last dot inclusive: `.env` has an empty stem and
/// extension `.env`; `id_rsa` has an empty extension.
pub(crate) fn file_stem_and_extension(path: &Path) -> (String, String) {
    let file = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    match file.rfind('.') {
        Some(i) => (file[..i].to_string(), file[i..].to_string()),
        None => (file, String::new()),
    }
}

/// Read a file tolerating invalid UTF-8 (scanning is byte-oriented in spirit;
/// undecodable sequences are replaced, not fatal).
pub(crate) fn read_lossy(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Trim any combination of surrounding double, single, and backtick quotes.
pub(crate) fn trim_quotes(s: &str) -> &str {
    s.trim_matches(|c| c == '"' || c == '\'' || c == '`')
}

/// Trim whitespace, then any trailing semicolons.
pub(crate) fn trim_semicolon(s: &str) -> &str {
    s.trim().trim_end_matches(';')
}

/// Cut a string at the last occurrence of `tok` (crude comment-suffix strip).
pub(crate) fn trim_after<'a>(s: &'a str, tok: &str) -> &'a str {
    match s.rfind(tok) {
        Some(i) => &s[..i],
        None => s,
    }
}

/// Consume a C-style multi-line comment starting at `lines[start]` (already
/// known to open with `/*`). Returns the joined body and the index of the
/// closing line, or `None` when the comment never closes before EOF.
pub(crate) fn parse_multiline_c_comment(lines: &[&str], start: usize) -> (Option<String>, usize) {
    let first = lines[start].trim();
    if first.contains("*/") {
        return (Some(first.to_string()), start);
    }

    let mut body = vec![first];
    for (i, line) in lines.iter().enumerate().skip(start + 1) {
        let trimmed = line.trim();
        body.push(trimmed);
        if trimmed.contains("*/") {
            return (Some(body.join("\n")), i);
        }
    }

    (None, lines.len().saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn stem_and_extension_follow_last_dot() {
        let cases = [
            ("/etc/passwd", "passwd", ""),
            ("/home/blah/test.txt", "test", ".txt"),
            ("/home/blah/.bash_rc", "", ".bash_rc"),
            ("/home/blah/.test.swp", ".test", ".swp"),
        ];
        for (path, stem, ext) in cases {
            let (s, e) = file_stem_and_extension(&PathBuf::from(path));
            assert_eq!((s.as_str(), e.as_str()), (stem, ext), "{path}");
        }
    }

    #[test]
    fn quote_and_semicolon_trimming() {
        assert_eq!(trim_quotes("\"hello\""), "hello");
        assert_eq!(trim_quotes("'hello'"), "hello");
        assert_eq!(trim_quotes("`raw`"), "raw");
        assert_eq!(trim_quotes("plain"), "plain");
        assert_eq!(trim_semicolon("  \"x\"; "), "\"x\"");
    }

    #[test]
    fn multiline_comment_collection() {
        let lines = ["/* one", " * two", " */", "after"];
        let (body, end) = parse_multiline_c_comment(&lines, 0);
        assert_eq!(body.as_deref(), Some("/* one\n* two\n*/"));
        assert_eq!(end, 2);

        let oneline = ["/* compact */"];
        let (body, end) = parse_multiline_c_comment(&oneline, 0);
        assert_eq!(body.as_deref(), Some("/* compact */"));
        assert_eq!(end, 0);

        let unclosed = ["/* never", "ends"];
        let (body, _) = parse_multiline_c_comment(&unclosed, 0);
        assert!(body.is_none());
    }
}
