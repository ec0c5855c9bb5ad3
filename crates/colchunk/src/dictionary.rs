use colchunk_error::{ColchunkError, ErrorKind, Result};

use crate::value::Value;

/// Values decoded from a dictionary page.
///
/// Valid for data pages that follow it in the same column chunk, until
/// another dictionary page replaces it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dictionary {
    values: Vec<Value>,
}

impl Dictionary {
    pub fn new(values: Vec<Value>) -> Self {
        Dictionary { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Look up the entry for an index slot.
    pub fn lookup(&self, slot: &Value) -> Result<&Value> {
        let idx = slot.as_dictionary_index().ok_or_else(|| {
            ColchunkError::with_kind(
                ErrorKind::BoundsViolation,
                format!("Value {slot:?} is not a dictionary index"),
            )
        })?;

        self.values.get(idx).ok_or_else(|| {
            ColchunkError::with_kind(
                ErrorKind::BoundsViolation,
                format!(
                    "Dictionary index {idx} out of range for dictionary of length {}",
                    self.values.len()
                ),
            )
        })
    }
}

/// Replace dictionary index slots with the entries they point to.
///
/// Does nothing without a dictionary.
pub fn dereference(dictionary: Option<&Dictionary>, slots: &mut [Value]) -> Result<()> {
    let dictionary = match dictionary {
        Some(dictionary) => dictionary,
        None => return Ok(()),
    };

    for slot in slots.iter_mut() {
        *slot = dictionary.lookup(slot)?.clone();
    }

    Ok(())
}
