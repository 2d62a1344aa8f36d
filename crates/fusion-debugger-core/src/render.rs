//! Box-drawing rendering of object trees and their terminal colouring.

use std::sync::LazyLock;

use console::Style;
use regex::{Captures, Regex};

use crate::tree::{Branch, Node, Scalar};

const BRANCH: &str = "├── ";
const CORNER: &str = "└── ";
const PIPE: &str = "│   ";
const SPACE: &str = "    ";

/// Placeholder for loosely empty values.
pub const EMPTY_PLACEHOLDER: &str = "<empty>";

static PROTOTYPE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^prototype\([\w.:-]+\)( \(\?\))?$").unwrap());

/// Render `data` as tree lines below `root_label`.
pub fn render_tree(data: &Branch, root_label: &str) -> Vec<String> {
    let mut lines = vec![root_label.to_string()];
    let count = data.len();

    for (index, (key, node)) in data.iter().enumerate() {
        let last = index + 1 == count;
        let connector = if last { CORNER } else { BRANCH };

        let child = match node {
            Node::Scalar(scalar) => {
                lines.push(format!("{connector}{key} => {}", format_scalar(scalar)));
                continue;
            }
            Node::Wrapper(wrapper) => render_tree(&wrapper.to_branch(), key),
            Node::Branch(branch) => render_tree(branch, key),
        };

        let continuation = if last { SPACE } else { PIPE };
        let mut child = child.into_iter();
        if let Some(first) = child.next() {
            lines.push(format!("{connector}{first}"));
        }
        lines.extend(child.map(|line| format!("{continuation}{line}")));
    }

    lines
}

fn format_scalar(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Null => "null".to_string(),
        Scalar::Bool(b) => b.to_string(),
        s if s.is_empty() => EMPTY_PLACEHOLDER.to_string(),
        Scalar::String(s) if s.starts_with("${") || PROTOTYPE_MARKER.is_match(s) => s.clone(),
        Scalar::String(s) => format!("\"{s}\""),
        Scalar::Number(n) => n.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Colouring
// ---------------------------------------------------------------------------

type Replacer = fn(&Captures) -> String;

fn paint(style: Style, text: &str) -> String {
    style.force_styling(true).apply_to(text).to_string()
}

fn red() -> Style {
    Style::new().red()
}

fn highlight() -> Style {
    Style::new().yellow().bold()
}

/// Ordered colouring rules. Quoted strings come late so that already
/// tagged parts are not matched again.
static COLOR_RULES: LazyLock<Vec<(Regex, Replacer)>> = LazyLock::new(|| {
    let rules: [(&str, Replacer); 9] = [
        // meta properties
        (r"@[\w.:-]+", |c| paint(red(), &c[0])),
        // eel expressions
        (r"\$\{(.+)\}", |c| {
            paint(Style::new().magenta(), &format!("${{{}}}", &c[1]))
        }),
        // object types, except null
        (r"__objectType => ([a-zA-Z0-9.:]+)", |c| {
            if c[1].starts_with("null") {
                c[0].to_string()
            } else {
                format!("__objectType => {}", paint(highlight(), &c[1]))
            }
        }),
        // prototype names of typed keys
        (r"([\w-]+(?: =>)?) \[([a-zA-Z0-9.:]+)\]", |c| {
            format!("{} {}", &c[1], paint(highlight(), &format!("[{}]", &c[2])))
        }),
        // internal properties
        (r"─ (__[\w.:-]+)", |c| format!("─ {}", paint(red(), &c[1]))),
        // other properties
        (r"─ ([\w.:-]+)", |c| {
            format!("─ {}", paint(Style::new().blue(), &c[1]))
        }),
        // string values
        (r#"".+""#, |c| paint(Style::new().green(), &c[0])),
        // unknown prototypes
        (r"\(\?\)$", |_| paint(red().reverse(), "(?)")),
        // booleans
        (r" (true|false)$", |c| {
            format!(" {}", paint(Style::new().green(), &c[1]))
        }),
    ];
    rules
        .into_iter()
        .map(|(pattern, replacer)| (Regex::new(pattern).unwrap(), replacer))
        .collect()
});

/// Colour one rendered line.
pub fn colorize(line: &str) -> String {
    COLOR_RULES
        .iter()
        .fold(line.to_string(), |line, (pattern, replacer)| {
            pattern.replace_all(&line, replacer).into_owned()
        })
}

/// Colour the root label of a tree.
pub fn colorize_root(label: &str) -> String {
    paint(highlight(), label)
}

/// Colour rendered tree lines, the first one being the root label.
pub fn colorize_tree(lines: &[String]) -> Vec<String> {
    let mut lines = lines.iter();
    lines
        .next()
        .map(|root| colorize_root(root))
        .into_iter()
        .chain(lines.map(|line| colorize(line)))
        .collect()
}
