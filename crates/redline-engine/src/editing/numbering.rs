//! Numbering series renumbering.
//!
//! Members of a series are numbered together by relative indentation level:
//! same-level siblings increment, descending a level resets the deeper
//! counter, and deeper labels inherit the parent counters as a dotted
//! prefix. Only changed labels are written back, which makes a renumber of
//! an already-consistent series a no-op.

use crate::editing::document::Document;
use crate::model::SeriesId;

/// Label format of one numbering level
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NumberFormat {
    Decimal,
    LowerLetter,
    UpperLetter,
    LowerRoman,
    UpperRoman,
}

impl NumberFormat {
    pub fn render(self, n: u32) -> String {
        match self {
            NumberFormat::Decimal => n.to_string(),
            NumberFormat::LowerLetter => letter(n, b'a'),
            NumberFormat::UpperLetter => letter(n, b'A'),
            NumberFormat::LowerRoman => roman(n).to_lowercase(),
            NumberFormat::UpperRoman => roman(n),
        }
    }
}

fn letter(n: u32, base: u8) -> String {
    if (1..=26).contains(&n) {
        char::from(base + (n as u8) - 1).to_string()
    } else {
        n.to_string()
    }
}

fn roman(mut n: u32) -> String {
    if n == 0 {
        return "0".to_string();
    }
    const NUMERALS: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (value, numeral) in NUMERALS {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}

/// Per-level formats of one series; levels past the end render decimal
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeriesFormat {
    pub levels: Vec<NumberFormat>,
}

impl SeriesFormat {
    pub fn new(levels: Vec<NumberFormat>) -> Self {
        Self { levels }
    }

    pub fn level(&self, level: usize) -> NumberFormat {
        self.levels.get(level).copied().unwrap_or(NumberFormat::Decimal)
    }
}

/// Recompute the labels of one series in document order. Returns how many
/// labels actually changed; a consistent series reports zero.
pub fn renumber(doc: &mut Document, series: SeriesId) -> usize {
    let format = doc.series_format(series);
    let spans = doc.leaf_spans();
    let mut counters: Vec<u32> = Vec::new();
    let mut changed = 0;

    for span in &spans {
        let Some(numbering) = doc.node(&span.path).attrs.numbering else {
            continue;
        };
        if numbering.series != series {
            continue;
        }
        let level = numbering.level as usize;
        if counters.len() <= level {
            counters.resize(level + 1, 0);
        }
        counters[level] += 1;
        counters.truncate(level + 1);

        let mut label = String::new();
        for (l, count) in counters.iter().enumerate() {
            label.push_str(&format.level(l).render(*count));
            label.push('.');
        }

        let label = Some(label);
        let node = doc.node_mut(&span.path);
        if node.attrs.label != label {
            node.attrs.label = label;
            changed += 1;
        }
    }
    changed
}
