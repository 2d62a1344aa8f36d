//! Natural string ordering and the positional ordering of Fusion entries.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::iter::Peekable;
use std::str::Chars;

use crate::tree::{Node, Scalar};

/// Meta key holding the positional hint of a flattened entry.
pub const POSITION_KEY: &str = "@position";

/// Natural order: digit runs compare by numeric value, everything else by character.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let ord = compare_digit_runs(&take_digits(&mut left), &take_digits(&mut right));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                if l != r {
                    return l.cmp(&r);
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        digits.push(c);
    }
    digits
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a_trimmed = a.trim_start_matches('0');
    let b_trimmed = b.trim_start_matches('0');
    a_trimmed
        .len()
        .cmp(&b_trimmed.len())
        .then_with(|| a_trimmed.cmp(b_trimmed))
        .then_with(|| a.len().cmp(&b.len()))
}

// ---------------------------------------------------------------------------
// Positional sorting
// ---------------------------------------------------------------------------

/// A parsed `@position` hint.
#[derive(Debug, Clone, PartialEq)]
pub enum Position {
    Start(i64),
    Middle(f64),
    End(i64),
    Before(String, i64),
    After(String, i64),
}

impl Position {
    /// Position of an entry: its `@position` hint, its numeric key, or the middle.
    pub fn of(key: &str, node: &Node) -> Self {
        let hint = match node {
            Node::Branch(branch) => branch.get(POSITION_KEY).and_then(Node::as_scalar),
            _ => None,
        };
        match hint {
            Some(hint) => Self::parse(hint),
            None => Self::Middle(key.parse::<i64>().map_or(0.0, |n| n as f64)),
        }
    }

    pub fn parse(hint: &Scalar) -> Self {
        if let Some(number) = hint.as_f64() {
            return Self::Middle(number);
        }
        let text = hint.as_str().unwrap_or_default();
        let words: Vec<&str> = text.split_whitespace().collect();
        let priority = |word: Option<&&str>| word.and_then(|w| w.parse().ok()).unwrap_or(0);
        match words.as_slice() {
            ["start", rest @ ..] if rest.len() <= 1 => Self::Start(priority(rest.first())),
            ["end", rest @ ..] if rest.len() <= 1 => Self::End(priority(rest.first())),
            ["before", reference, rest @ ..] if rest.len() <= 1 => {
                Self::Before(reference.to_string(), priority(rest.first()))
            }
            ["after", reference, rest @ ..] if rest.len() <= 1 => {
                Self::After(reference.to_string(), priority(rest.first()))
            }
            _ => Self::Middle(0.0),
        }
    }
}

/// Order entries the way the framework's positional sorter does: `start` (higher
/// priority first), then numeric and unpositioned entries ascending, then `end`
/// (lower priority first). `before`/`after` entries sit next to their reference
/// and join the middle group when the reference is missing. Ties keep insertion order.
pub fn sort_by_position(entries: Vec<(String, Node)>) -> Vec<(String, Node)> {
    let keys: Vec<String> = entries.iter().map(|(k, _)| k.clone()).collect();
    let mut start: Vec<(i64, usize)> = Vec::new();
    let mut middle: Vec<(f64, usize)> = Vec::new();
    let mut end: Vec<(i64, usize)> = Vec::new();
    let mut before: HashMap<&str, Vec<(i64, usize)>> = HashMap::new();
    let mut after: HashMap<&str, Vec<(i64, usize)>> = HashMap::new();

    let known = |reference: &str, own: &str| reference != own && keys.iter().any(|k| k == reference);

    for (index, (key, node)) in entries.iter().enumerate() {
        match Position::of(key, node) {
            Position::Start(priority) => start.push((priority, index)),
            Position::Middle(position) => middle.push((position, index)),
            Position::End(priority) => end.push((priority, index)),
            Position::Before(reference, priority) if known(reference.as_str(), key.as_str()) => {
                let slot = keys.iter().find(|k| **k == reference).map(String::as_str);
                if let Some(slot) = slot {
                    before.entry(slot).or_default().push((priority, index));
                }
            }
            Position::After(reference, priority) if known(reference.as_str(), key.as_str()) => {
                let slot = keys.iter().find(|k| **k == reference).map(String::as_str);
                if let Some(slot) = slot {
                    after.entry(slot).or_default().push((priority, index));
                }
            }
            Position::Before(..) | Position::After(..) => middle.push((0.0, index)),
        }
    }

    start.sort_by(|a, b| b.0.cmp(&a.0));
    middle.sort_by(|a, b| a.0.total_cmp(&b.0));
    end.sort_by(|a, b| a.0.cmp(&b.0));
    for group in before.values_mut().chain(after.values_mut()) {
        group.sort_by(|a, b| b.0.cmp(&a.0));
    }

    let relative = Relative {
        keys: &keys,
        before: &before,
        after: &after,
    };
    let mut emitted = vec![false; entries.len()];
    let mut order = Vec::with_capacity(entries.len());
    let anchored = start
        .iter()
        .map(|(_, i)| *i)
        .chain(middle.iter().map(|(_, i)| *i))
        .chain(end.iter().map(|(_, i)| *i))
        // Entries only reachable through a before/after cycle
        .chain(0..entries.len());
    for index in anchored {
        relative.emit(index, &mut emitted, &mut order);
    }

    let mut slots: Vec<Option<(String, Node)>> = entries.into_iter().map(Some).collect();
    order
        .into_iter()
        .filter_map(|index| slots[index].take())
        .collect()
}

struct Relative<'a> {
    keys: &'a [String],
    before: &'a HashMap<&'a str, Vec<(i64, usize)>>,
    after: &'a HashMap<&'a str, Vec<(i64, usize)>>,
}

impl Relative<'_> {
    fn emit(&self, index: usize, emitted: &mut [bool], order: &mut Vec<usize>) {
        if emitted[index] {
            return;
        }
        emitted[index] = true;
        let key = self.keys[index].as_str();
        for (_, other) in self.before.get(key).into_iter().flatten() {
            self.emit(*other, emitted, order);
        }
        order.push(index);
        for (_, other) in self.after.get(key).into_iter().flatten() {
            self.emit(*other, emitted, order);
        }
    }
}
