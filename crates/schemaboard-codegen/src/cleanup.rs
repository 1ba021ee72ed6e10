//! Model output cleanup
//!
//! Models wrap code in markdown fences and chatty preambles even when told
//! not to. `clean_code_response` strips those and cuts any remaining prose
//! in front of the first line that looks like DDL.

use once_cell::sync::Lazy;
use regex::Regex;

static FENCE_OPENER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[a-zA-Z]*\n").expect("valid regex"));

// Preambles: only the first occurrence at the very start of the text.
static LEADING_PREAMBLES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)^Here's the.*?:\s*",
        r"^This code.*?:\s*",
        r"^The following.*?:\s*",
        r"^Below is.*?:\s*",
        r"^Here are.*?:\s*",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

// Annotation lines and comments, removed everywhere.
static ANNOTATIONS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?m)^\s*Note:.*$",
        r"(?m)^\s*Important:.*$",
        r"(?m)^\s*--.*$",
        r"(?ms)^\s*/\*.*?\*/",
        r"(?m)^\s*//.*$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

const CODE_LINE_PREFIXES: [&str; 7] = [
    "create table",
    "create index",
    "alter table",
    "use ",
    "db.",
    "drop table",
    "insert into",
];

/// Strip fences, preambles, annotations and leading prose from model output.
pub fn clean_code_response(response: &str) -> String {
    let without_openers = FENCE_OPENER.replace_all(response, "");
    let mut cleaned = without_openers.replace("```", "");

    for pattern in LEADING_PREAMBLES.iter() {
        cleaned = pattern.replace(&cleaned, "").into_owned();
    }
    for pattern in ANNOTATIONS.iter() {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }

    let cleaned = cleaned.trim();
    let lines: Vec<&str> = cleaned.split('\n').collect();
    match lines.iter().position(|line| looks_like_code(line)) {
        Some(start) if start > 0 => lines[start..].join("\n").trim().to_string(),
        _ => cleaned.to_string(),
    }
}

fn looks_like_code(line: &str) -> bool {
    let line = line.trim().to_lowercase();
    CODE_LINE_PREFIXES.iter().any(|p| line.starts_with(p)) || line.contains("collection")
}
