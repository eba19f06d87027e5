//! Heuristic single-edit diff, transform and apply over document text.
//!
//! This is deliberately not a general minimal-edit-distance algorithm: one
//! call captures a single contiguous insert or delete, which is sufficient
//! for convergence when edits are relayed with short real latency. The
//! explicit resync path is the correctness backstop for everything this
//! scheme cannot express.
//!
//! Positions and lengths are counted in characters, not bytes, so applying
//! an operation can never split a UTF-8 sequence.

use serde::{Deserialize, Serialize};

/// A tagged insert-or-delete edit description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Operation {
    Insert { position: usize, text: String },
    Delete { position: usize, length: usize },
}

impl Operation {
    pub fn position(&self) -> usize {
        match self {
            Operation::Insert { position, .. } => *position,
            Operation::Delete { position, .. } => *position,
        }
    }

    fn set_position(&mut self, new_position: usize) {
        match self {
            Operation::Insert { position, .. } => *position = new_position,
            Operation::Delete { position, .. } => *position = new_position,
        }
    }
}

/// Compute the single contiguous operation turning `old` into `new`, if any.
///
/// Finds the first index where the two texts diverge; a longer `new` yields
/// an insert of the appended run, a shorter one a delete of the removed
/// length. `cursor_hint` (the client's cursor at edit time) overrides the
/// computed position when supplied. Identical texts, and equal-length
/// replacements the heuristic cannot express, yield `None`.
pub fn diff(old: &str, new: &str, cursor_hint: Option<usize>) -> Option<Operation> {
    if old == new {
        return None;
    }

    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();

    // First differing character
    let min_len = old_chars.len().min(new_chars.len());
    let mut i = 0;
    while i < min_len && old_chars[i] == new_chars[i] {
        i += 1;
    }

    if new_chars.len() > old_chars.len() {
        let added = new_chars.len() - old_chars.len();
        let text: String = new_chars[i..i + added].iter().collect();
        Some(Operation::Insert {
            position: cursor_hint.unwrap_or(i),
            text,
        })
    } else if new_chars.len() < old_chars.len() {
        Some(Operation::Delete {
            position: cursor_hint.unwrap_or(i),
            length: old_chars.len() - new_chars.len(),
        })
    } else {
        // Equal-length replacement; the resync backstop reconciles it.
        None
    }
}

/// Adjust `op`'s position assuming `against` was already applied.
///
/// Disjoint ranges are left untouched. An insert before `op` shifts it right
/// by the inserted length; a delete before `op` shifts it left by the
/// overlapping deleted length, clamped so the position never crosses the
/// deletion start.
pub fn transform(op: &Operation, against: &Operation) -> Operation {
    let mut transformed = op.clone();

    // An edit at or after op's position leaves it untouched; the guards
    // below only fire when `against` lands strictly before `op`.
    match against {
        Operation::Insert { position, text } => {
            if op.position() > *position {
                transformed.set_position(op.position() + text.chars().count());
            }
        }
        Operation::Delete { position, length } => {
            if op.position() > *position {
                let overlap = (*length).min(op.position() - *position);
                transformed.set_position(op.position() - overlap);
            }
        }
    }

    transformed
}

/// Apply an operation to `text` by slice-and-splice.
///
/// Out-of-range positions and lengths clamp to the text bounds; applying
/// never fails or panics.
pub fn apply(text: &str, op: &Operation) -> String {
    let chars: Vec<char> = text.chars().collect();

    match op {
        Operation::Insert {
            position,
            text: inserted,
        } => {
            let pos = (*position).min(chars.len());
            let mut out = String::with_capacity(text.len() + inserted.len());
            out.extend(&chars[..pos]);
            out.push_str(inserted);
            out.extend(&chars[pos..]);
            out
        }
        Operation::Delete { position, length } => {
            let pos = (*position).min(chars.len());
            let end = pos.saturating_add(*length).min(chars.len());
            let mut out = String::with_capacity(text.len());
            out.extend(&chars[..pos]);
            out.extend(&chars[end..]);
            out
        }
    }
}
