//! Result printing for humans and CI logs.

use console::style;

use crate::scanner::{Finding, FindingKind, Statistics};

/// Stable presentation order: by file, then line, then name. Ordering is a
/// presentation concern; the scanner itself makes no ordering guarantee
/// across files.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        (a.file.as_str(), a.line, a.name.as_str()).cmp(&(b.file.as_str(), b.line, b.name.as_str()))
    });
}

pub fn print_findings(findings: &mut [Finding]) {
    sort_findings(findings);

    let mut current_file = "";
    for finding in findings.iter() {
        if finding.file != current_file {
            if !current_file.is_empty() {
                println!("\n");
            }
            current_file = &finding.file;
            println!("\n{}\n", style(format!("In {current_file}")).white().on_red());
        }

        let header = if finding.kind.has_line() {
            format!("Line {}:", finding.line)
        } else {
            format!("{}:", finding.kind.label())
        };
        match &finding.credential_category {
            Some(category) => println!(
                "{} {}",
                style(header).yellow(),
                style(format!("({category})")).dim()
            ),
            None => println!("{}", style(header).yellow()),
        }

        match finding.kind {
            FindingKind::JsonVariable | FindingKind::YamlVariable => {
                println!("\"{}\": \"{}\"", finding.name, finding.value);
            }
            FindingKind::JsonListElement | FindingKind::YamlListElement => {
                println!("\"{}\": [ ... \"{}\" ... ]", finding.name, finding.value);
            }
            _ if finding.name.is_empty() => println!("{}", finding.value),
            _ => println!("{} = {}", finding.name, finding.value),
        }
        println!();
    }
}

pub fn print_statistics(statistics: &Statistics) {
    println!();
    println!(
        "{} {} files found, {} scanned, {} findings",
        style("Scan complete:").bold(),
        statistics.files_found,
        statistics.files_scanned,
        style(statistics.results_found.to_string()).yellow().bold()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(file: &str, line: usize, name: &str) -> Finding {
        Finding {
            file: file.to_string(),
            kind: FindingKind::GenericText,
            line,
            name: name.to_string(),
            value: "v".to_string(),
            credential_category: None,
        }
    }

    #[test]
    fn sort_is_file_then_line_then_name() {
        let mut findings = vec![
            finding("b.txt", 1, "x"),
            finding("a.txt", 9, "z"),
            finding("a.txt", 9, "a"),
            finding("a.txt", 2, "m"),
        ];
        sort_findings(&mut findings);

        let order: Vec<_> = findings
            .iter()
            .map(|f| (f.file.as_str(), f.line, f.name.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a.txt", 2, "m"),
                ("a.txt", 9, "a"),
                ("a.txt", 9, "z"),
                ("b.txt", 1, "x"),
            ]
        );
    }
}
