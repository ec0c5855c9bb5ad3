//! Flattened parquet schema.
//!
//! The schema is stored the same way it is in the file footer: a depth first
//! list of elements where each group records how many children follow it.
//! The first element is the root.
use colchunk_error::{ColchunkError, ErrorKind, Result};

use crate::types::{ConvertedType, LogicalType, PhysicalType, Repetition};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaElement {
    pub name: String,
    /// Set for leaves only. Fixed length byte arrays carry their length.
    pub physical_type: Option<PhysicalType>,
    /// Missing for the root. Treated as required anywhere else.
    pub repetition: Option<Repetition>,
    /// Set for groups only.
    pub num_children: Option<usize>,
    pub converted_type: Option<ConvertedType>,
    pub logical_type: Option<LogicalType>,
    pub scale: Option<i32>,
    pub precision: Option<i32>,
    pub field_id: Option<i32>,
}

impl SchemaElement {
    pub fn root(name: impl Into<String>, num_children: usize) -> Self {
        SchemaElement {
            name: name.into(),
            physical_type: None,
            repetition: None,
            num_children: Some(num_children),
            converted_type: None,
            logical_type: None,
            scale: None,
            precision: None,
            field_id: None,
        }
    }

    pub fn group(name: impl Into<String>, repetition: Repetition, num_children: usize) -> Self {
        SchemaElement {
            repetition: Some(repetition),
            ..Self::root(name, num_children)
        }
    }

    pub fn leaf(name: impl Into<String>, physical_type: PhysicalType, repetition: Repetition) -> Self {
        SchemaElement {
            physical_type: Some(physical_type),
            repetition: Some(repetition),
            num_children: None,
            ..Self::root(name, 0)
        }
    }

    pub fn with_converted_type(mut self, converted_type: ConvertedType) -> Self {
        self.converted_type = Some(converted_type);
        self
    }

    pub fn with_logical_type(mut self, logical_type: LogicalType) -> Self {
        self.logical_type = Some(logical_type);
        self
    }

    pub fn with_decimal(mut self, scale: i32, precision: i32) -> Self {
        self.scale = Some(scale);
        self.precision = Some(precision);
        self
    }

    fn repetition_or_required(&self) -> Repetition {
        self.repetition.unwrap_or(Repetition::Required)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub elements: Vec<SchemaElement>,
}

impl Schema {
    pub fn new(elements: Vec<SchemaElement>) -> Self {
        Schema { elements }
    }

    /// Resolve the chain of elements for a column path, root excluded.
    ///
    /// The last element of the returned chain is the element the path names.
    pub fn resolve_path<S: AsRef<str>>(&self, path: &[S]) -> Result<Vec<&SchemaElement>> {
        if self.elements.is_empty() {
            return Err(invalid("Schema has no root element"));
        }

        let mut chain = Vec::with_capacity(path.len());
        let mut parent = 0;

        for part in path {
            let part = part.as_ref();
            let num_children = self.elements[parent].num_children.unwrap_or(0);

            let mut child = parent + 1;
            let mut found = None;
            for _ in 0..num_children {
                let element = self.elements.get(child).ok_or_else(|| {
                    invalid(format!(
                        "Schema element '{}' declares more children than the schema holds",
                        self.elements[parent].name
                    ))
                })?;
                if element.name == part {
                    found = Some(child);
                    break;
                }
                child += self.subtree_len(child)?;
            }

            let idx = found.ok_or_else(|| {
                invalid(format!(
                    "Schema element '{part}' not found under '{}'",
                    self.elements[parent].name
                ))
            })?;
            chain.push(&self.elements[idx]);
            parent = idx;
        }

        Ok(chain)
    }

    /// Get the element a column path names.
    pub fn resolve_element<S: AsRef<str>>(&self, path: &[S]) -> Result<&SchemaElement> {
        self.resolve_path(path)?
            .pop()
            .ok_or_else(|| invalid("Cannot resolve an empty column path"))
    }

    /// Max definition level for a column, the number of non-required
    /// elements along its path.
    pub fn max_definition_level<S: AsRef<str>>(&self, path: &[S]) -> Result<i16> {
        let level = self
            .resolve_path(path)?
            .iter()
            .filter(|e| e.repetition_or_required() != Repetition::Required)
            .count();
        to_level(level)
    }

    /// Max repetition level for a column, the number of repeated elements
    /// along its path.
    pub fn max_repetition_level<S: AsRef<str>>(&self, path: &[S]) -> Result<i16> {
        let level = self
            .resolve_path(path)?
            .iter()
            .filter(|e| e.repetition_or_required() == Repetition::Repeated)
            .count();
        to_level(level)
    }

    /// If every element along the path is required.
    pub fn is_required<S: AsRef<str>>(&self, path: &[S]) -> Result<bool> {
        Ok(self
            .resolve_path(path)?
            .iter()
            .all(|e| e.repetition_or_required() == Repetition::Required))
    }

    /// Number of elements in the subtree rooted at `idx`, itself included.
    fn subtree_len(&self, idx: usize) -> Result<usize> {
        let mut len = 1;
        let mut pending = self.elements[idx].num_children.unwrap_or(0);

        while pending > 0 {
            let element = self.elements.get(idx + len).ok_or_else(|| {
                invalid(format!(
                    "Schema element '{}' declares more children than the schema holds",
                    self.elements[idx].name
                ))
            })?;
            pending = pending - 1 + element.num_children.unwrap_or(0);
            len += 1;
        }

        Ok(len)
    }
}

fn to_level(level: usize) -> Result<i16> {
    i16::try_from(level).map_err(|_| invalid(format!("Schema too deep: level {level}")))
}

fn invalid(msg: impl Into<String>) -> ColchunkError {
    ColchunkError::with_kind(ErrorKind::InvalidData, msg)
}
