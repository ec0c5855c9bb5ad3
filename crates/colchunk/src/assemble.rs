//! Assemble nested lists from definition and repetition levels.
//!
//! Each list depth `k` (starting at 1) owns two definition levels after
//! normalization: `2k - 1` means the list is present but empty, `2k` means a
//! null element in it. The max level places a value at the innermost depth,
//! and level 0 is a null row.
use colchunk_error::{ColchunkError, ErrorKind, Result};

use crate::value::Value;

/// Assemble rows of (possibly nested) lists.
///
/// `is_null` indicates the top level list is nullable. When it isn't, every
/// definition level is shifted up by one so the pairing above holds.
/// Definition levels may be empty, in which case every slot is at the max
/// level.
pub fn assemble_nested(
    definition_levels: &[i16],
    repetition_levels: &[i16],
    values: Vec<Value>,
    is_null: bool,
    max_definition_level: i16,
    max_repetition_level: i16,
) -> Result<Vec<Value>> {
    if max_repetition_level <= 0 {
        return Err(ColchunkError::with_kind(
            ErrorKind::PreconditionViolation,
            "Nested assembly requires a repeated column",
        ));
    }
    if !definition_levels.is_empty() && definition_levels.len() != repetition_levels.len() {
        return Err(invalid(format!(
            "Got {} definition levels for {} repetition levels",
            definition_levels.len(),
            repetition_levels.len()
        )));
    }

    let shift = if is_null { 0 } else { 1 };
    let max_def = max_definition_level as usize + shift;
    let max_rep = max_repetition_level as usize;

    let mut assembler = Assembler {
        rows: Vec::new(),
        lists: Vec::with_capacity(max_rep),
        row_started: false,
        values: values.into_iter(),
    };

    for (idx, &rep) in repetition_levels.iter().enumerate() {
        let def = match definition_levels.get(idx) {
            Some(&def) => def,
            None => max_definition_level,
        };
        if def < 0 || rep < 0 {
            return Err(invalid(format!("Negative level at slot {idx}")));
        }
        let def = def as usize + shift;
        let rep = rep as usize;

        if def > max_def || rep > max_rep {
            return Err(invalid(format!(
                "Levels (def {def}, rep {rep}) exceed max levels (def {max_def}, rep {max_rep})"
            )));
        }

        if rep == 0 {
            assembler.finish_row();
            assembler.row_started = true;
            if def == 0 {
                // Null row, no lists opened.
                continue;
            }
        } else {
            if rep > assembler.lists.len() {
                return Err(invalid(format!(
                    "Repetition level {rep} deeper than open list depth {}",
                    assembler.lists.len()
                )));
            }
            assembler.close_to(rep);
        }

        // Depth of the deepest list present for this slot.
        let depth = ((def + 1) / 2).min(max_rep);
        if depth < rep {
            return Err(invalid(format!(
                "Definition level {def} does not define the list repeated at level {rep}"
            )));
        }
        while assembler.lists.len() < depth {
            assembler.lists.push(Vec::new());
        }

        if def == max_def {
            let value = assembler.values.next().ok_or_else(|| {
                ColchunkError::with_kind(
                    ErrorKind::BoundsViolation,
                    format!("Ran out of values at slot {idx}"),
                )
            })?;
            assembler.push(value);
        } else if def >= 2 * depth {
            assembler.push(Value::Null);
        }
        // Otherwise the innermost list is present and empty.
    }

    assembler.finish_row();
    Ok(assembler.rows)
}

struct Assembler {
    rows: Vec<Value>,
    /// Open lists, outermost first.
    lists: Vec<Vec<Value>>,
    row_started: bool,
    values: std::vec::IntoIter<Value>,
}

impl Assembler {
    fn push(&mut self, value: Value) {
        if let Some(list) = self.lists.last_mut() {
            list.push(value);
        }
    }

    /// Close lists until only `depth` remain open.
    fn close_to(&mut self, depth: usize) {
        while self.lists.len() > depth.max(1) {
            if let Some(inner) = self.lists.pop() {
                self.push(Value::List(inner));
            }
        }
    }

    fn finish_row(&mut self) {
        if !self.row_started {
            return;
        }
        self.close_to(1);
        let row = match self.lists.pop() {
            Some(list) => Value::List(list),
            None => Value::Null,
        };
        self.rows.push(row);
        self.row_started = false;
    }
}

fn invalid(msg: String) -> ColchunkError {
    ColchunkError::with_kind(ErrorKind::InvalidData, msg)
}
