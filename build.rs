use grep::regex::RegexMatcher;
use grep::searcher::{Searcher, Sink, SinkMatch};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use walkdir::WalkDir;

// Source directories owned by this crate. Anything else in the checkout
// (reference material, target/) is never scanned.
const SOURCE_DIRS: [&str; 5] = ["roc", "plot", "cli", "tests", "benches"];

// Which lines a rule cares about once its regex has matched.
#[derive(Clone, Copy)]
enum LineFilter {
    // Code outside comments and string literals.
    Code,
    // Any comment, doc comments included.
    AnyComment,
    // Plain comments only; doc comments may use markdown emphasis.
    PlainComment,
    // Comments whose letters are all upper case.
    ShoutingComment,
    // Every match.
    All,
}

struct Rule {
    name: &'static str,
    pattern: &'static str,
    filter: LineFilter,
    advice: &'static str,
}

const RULES: [Rule; 5] = [
    Rule {
        name: "underscore-prefixed identifiers",
        pattern: r"\b(_[a-zA-Z0-9_]+)\b",
        filter: LineFilter::Code,
        advice: "Either use the binding (removing the underscore) or remove it completely.",
    },
    Rule {
        name: "forbidden comment markers",
        pattern: r"(//|/\*).*(?:FIXED|CORRECTED|FIX|FIXES|NEW|CHANGED|CHANGES|CHANGE|MODIFIED|MODIFIES|MODIFY|UPDATED|UPDATES|UPDATE)",
        filter: LineFilter::AnyComment,
        advice: "Comments describe the code as it is, not its edit history. Remove the marker.",
    },
    Rule {
        name: "'**' in plain comments",
        pattern: r"(//|/\*).*\*\*",
        filter: LineFilter::PlainComment,
        advice: "Emphasis markup belongs in doc comments only.",
    },
    Rule {
        name: "all-uppercase comments",
        pattern: r"(//|/\*).*",
        filter: LineFilter::ShoutingComment,
        advice: "Strongly consider deleting the comment completely.",
    },
    Rule {
        name: "#[allow(dead_code)] attributes",
        pattern: r"#\s*\[\s*allow\s*\(\s*dead_code\s*\)\s*\]",
        filter: LineFilter::All,
        advice: "Either use the code (removing the attribute) or remove it completely.",
    },
];

// Collects the offending lines of one file for one rule.
struct ViolationCollector {
    filter: LineFilter,
    violations: Vec<String>,
}

impl ViolationCollector {
    fn new(filter: LineFilter) -> Self {
        Self {
            filter,
            violations: Vec::new(),
        }
    }

    fn keeps(&self, line: &str) -> bool {
        let trimmed = line.trim_start();
        let is_comment = trimmed.starts_with("//") || line.contains("/*");
        match self.filter {
            LineFilter::Code => !is_comment && !inside_string_literal(line),
            LineFilter::AnyComment => is_comment,
            LineFilter::PlainComment => is_comment && !is_doc_comment(trimmed),
            LineFilter::ShoutingComment => is_comment && is_all_uppercase(comment_text(line)),
            LineFilter::All => true,
        }
    }

    fn report(&self, rule: &Rule, path: &Path) -> Option<String> {
        if self.violations.is_empty() {
            return None;
        }
        let mut message = format!(
            "\n❌ ERROR: Found {} {} in {}:\n",
            self.violations.len(),
            rule.name,
            path.display()
        );
        for violation in &self.violations {
            message.push_str(&format!("   {violation}\n"));
        }
        message.push_str(&format!(
            "\n⚠️ {} are not allowed in this project.\n   {}\n",
            rule.name, rule.advice
        ));
        Some(message)
    }
}

impl Sink for ViolationCollector {
    type Error = std::io::Error;

    fn matched(&mut self, _: &Searcher, mat: &SinkMatch) -> Result<bool, Self::Error> {
        let line_number = mat.line_number().unwrap_or(0);
        let line_text = std::str::from_utf8(mat.bytes()).unwrap_or("").trim_end();
        if self.keeps(line_text) {
            self.violations.push(format!("{line_number}:{line_text}"));
        }
        Ok(true)
    }
}

fn is_doc_comment(trimmed: &str) -> bool {
    trimmed.starts_with("///") || trimmed.starts_with("//!")
}

// True when some underscore word sits between a pair of double quotes.
fn inside_string_literal(line: &str) -> bool {
    line.split('"')
        .enumerate()
        .any(|(i, part)| i % 2 == 1 && part.contains('_'))
}

fn comment_text(line: &str) -> &str {
    let trimmed = line.trim_start();
    if let Some(rest) = trimmed
        .strip_prefix("///")
        .or_else(|| trimmed.strip_prefix("//!"))
        .or_else(|| trimmed.strip_prefix("//"))
    {
        return rest.trim();
    }
    match line.find("/*") {
        Some(idx) => {
            let body = &line[idx + 2..];
            body.find("*/").map_or(body, |end| &body[..end]).trim()
        }
        None => "",
    }
}

fn is_all_uppercase(text: &str) -> bool {
    let mut letters = text.chars().filter(|c| c.is_alphabetic()).peekable();
    letters.peek().is_some() && letters.all(char::is_uppercase)
}

fn rust_sources() -> Vec<PathBuf> {
    let mut sources: Vec<PathBuf> = SOURCE_DIRS
        .iter()
        .flat_map(|dir| WalkDir::new(dir).into_iter().filter_map(|e| e.ok()))
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "rs"))
        .collect();
    sources.sort();
    sources
}

fn scan_sources() -> Result<(), Box<dyn Error>> {
    let sources = rust_sources();
    let mut searcher = Searcher::new();
    for rule in &RULES {
        let matcher = RegexMatcher::new_line_matcher(rule.pattern)?;
        for path in &sources {
            let mut collector = ViolationCollector::new(rule.filter);
            searcher.search_path(&matcher, path, &mut collector)?;
            if let Some(message) = collector.report(rule, path) {
                return Err(message.into());
            }
        }
    }
    Ok(())
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    for dir in SOURCE_DIRS {
        println!("cargo:rerun-if-changed={dir}");
    }

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    println!("cargo:rustc-env=OXROC_BUILD_TIMESTAMP={timestamp}");

    if let Err(e) = scan_sources() {
        // The build must fail loudly so the violation shows up in cargo's output.
        eprintln!("{e}");
        std::process::exit(1);
    }
}
