use regex::Regex;
use std::path::Path;
use tracing::debug;

use crate::config::ScanType;
use crate::scanner::core::{file_stem_and_extension, read_lossy, trim_quotes, Scanner};
use crate::scanner::types::{Finding, FindingKind};

const BASH_SUFFIX: &str = ".sh";

/// `NAME='value'` at the start of a line.
const BASH_DECLARATION_PATTERN: &str = r#"^[a-zA-Z_][a-zA-Z0-9_]*=['"].+"#;

impl Scanner {
    pub(crate) fn is_parsable_bash_file(&self, path: &Path) -> bool {
        if !self.scan_type_enabled(ScanType::GenericCode) {
            return false;
        }

        let (_, extension) = file_stem_and_extension(path);
        extension == BASH_SUFFIX
    }

    pub(crate) fn parse_bash_file(&self, path: &Path, out: &mut Vec<Finding>) {
        let data = match read_lossy(path) {
            Ok(data) => data,
            Err(err) => {
                debug!("could not read {}: {err}", path.display());
                return;
            }
        };

        let Ok(declaration) = Regex::new(BASH_DECLARATION_PATTERN) else {
            return;
        };

        let file = path.to_string_lossy();
        for (idx, raw) in data.lines().enumerate() {
            let line = raw.trim();
            if !declaration.is_match(line) {
                continue;
            }

            // the pattern guarantees an "="
            let Some((name, value)) = line.split_once('=') else {
                continue;
            };

            if let Some(m) = self
                .classifier
                .classify_named_value(name, trim_quotes(value))
            {
                out.push(Finding {
                    file: file.to_string(),
                    kind: FindingKind::BashVariable,
                    line: idx + 1,
                    name: name.to_string(),
                    value: line.to_string(),
                    credential_category: m.category,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::io::Write;

    fn parse_bash(content: &str) -> Vec<Finding> {
        let scanner = Scanner::new(&Config::load(None).unwrap()).unwrap();
        let mut file = tempfile::NamedTempFile::with_suffix(".sh").unwrap();
        file.write_all(content.as_bytes()).unwrap();
        let mut out = Vec::new();
        scanner.parse_bash_file(file.path(), &mut out);
        out
    }

    #[test]
    fn quoted_declarations_only() {
        let findings = parse_bash(
            "#!/bin/bash\nexport PATH=/usr/bin\nDB_PASSWORD=\"supersecret123\"\nOTHER=$HOME\n",
        );
        assert_eq!(findings.len(), 1);
        let f = &findings[0];
        assert_eq!(f.kind, FindingKind::BashVariable);
        assert_eq!(f.name, "DB_PASSWORD");
        assert_eq!(f.value, "DB_PASSWORD=\"supersecret123\"");
        assert_eq!(f.line, 3);
    }

    #[test]
    fn unquoted_values_are_not_declarations() {
        let findings = parse_bash("DB_PASSWORD=supersecret123\n");
        assert!(findings.is_empty());
    }

    #[test]
    fn eligibility_rides_on_generic_code() {
        let mut config = Config::load(None).unwrap();
        let s = Scanner::new(&config).unwrap();
        assert!(s.is_parsable_bash_file(Path::new("/x/deploy.sh")));
        assert!(!s.is_parsable_bash_file(Path::new("/x/deploy.bash")));

        config.scan_types.retain(|t| t != "generic_code");
        let s = Scanner::new(&config).unwrap();
        assert!(!s.is_parsable_bash_file(Path::new("/x/deploy.sh")));
    }
}
