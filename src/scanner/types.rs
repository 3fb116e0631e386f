use serde::Serialize;

/// Where in a file a finding came from and how it was derived.
///
/// The tag is intrinsic to the parser that produced the finding; it is never
/// inferred after the fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    GoVariable,
    GoComment,
    GoOther,

    JsonVariable,
    JsonListElement,

    YamlVariable,
    YamlListElement,

    XmlElement,
    XmlAttribute,

    PhpVariable,
    PhpHeredoc,
    PhpConstant,
    PhpComment,
    PhpOther,

    PropertiesValue,
    PropertiesComment,

    PrivateKey,

    BashVariable,

    GenericCodeVariable,
    GenericCodeComment,
    GenericCodeOther,

    GenericText,
}

impl FindingKind {
    /// Short human-readable label used by the text printer.
    pub fn label(&self) -> &'static str {
        match self {
            FindingKind::GoVariable => "Go variable",
            FindingKind::GoComment => "Go comment",
            FindingKind::GoOther => "Go line",
            FindingKind::JsonVariable => "JSON field",
            FindingKind::JsonListElement => "JSON list item",
            FindingKind::YamlVariable => "YAML field",
            FindingKind::YamlListElement => "YAML list item",
            FindingKind::XmlElement => "XML element",
            FindingKind::XmlAttribute => "XML attributes",
            FindingKind::PhpVariable => "PHP variable",
            FindingKind::PhpHeredoc => "PHP heredoc",
            FindingKind::PhpConstant => "PHP constant",
            FindingKind::PhpComment => "PHP comment",
            FindingKind::PhpOther => "PHP line",
            FindingKind::PropertiesValue => "property",
            FindingKind::PropertiesComment => "properties comment",
            FindingKind::PrivateKey => "private key",
            FindingKind::BashVariable => "shell variable",
            FindingKind::GenericCodeVariable => "declaration",
            FindingKind::GenericCodeComment => "comment",
            FindingKind::GenericCodeOther => "line",
            FindingKind::GenericText => "text line",
        }
    }

    /// Tree-structured formats carry no stable line mapping.
    pub fn has_line(&self) -> bool {
        !matches!(
            self,
            FindingKind::JsonVariable
                | FindingKind::JsonListElement
                | FindingKind::YamlVariable
                | FindingKind::YamlListElement
                | FindingKind::XmlElement
                | FindingKind::XmlAttribute
        )
    }
}

/// One reported credential-like occurrence.
///
/// Immutable once emitted; the aggregation step only appends findings to the
/// result collection.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub file: String,
    pub kind: FindingKind,
    /// 1-based line number; 0 for tree-structured formats.
    pub line: usize,
    /// Variable/field/attribute name; empty for free-text and comment findings.
    pub name: String,
    /// Raw matched text, including surrounding syntax such as quotes or a
    /// full heredoc block.
    pub value: String,
    /// Name of the value-inclusion pattern that matched, when classification
    /// was driven by the value rather than the variable name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_category: Option<String>,
}

/// Scan-run counters, computed once after aggregation completes.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Statistics {
    /// Regular files discovered by the tree walk.
    pub files_found: usize,
    /// Files that matched some format parser.
    pub files_scanned: usize,
    /// Findings produced.
    pub results_found: usize,
}

/// Result of a full scan run.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub findings: Vec<Finding>,
    pub statistics: Statistics,
}
