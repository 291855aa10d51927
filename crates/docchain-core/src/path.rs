//! Dotted path access into nested documents
//!
//! A path such as `user.name` addresses a value through nested mappings.
//! Paths never index sequences by position: reads that cross a sequence walk
//! every element of it instead (see [`extract`] and [`resolve_mut`]).
//!
//! Writes auto-vivify missing intermediate mappings but refuse to replace an
//! intermediate value that is not a mapping.

use std::borrow::Cow;

use crate::document::{Document, Map, Value};
use crate::error::{PathError, PathOperation};

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '.';

/// Strict lookup walking mappings only.
///
/// Returns `None` when a segment is missing or an intermediate value is not a
/// mapping.
pub fn get<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    if !path.contains(PATH_SEPARATOR) {
        return document.get(path);
    }

    let mut segments = path.split(PATH_SEPARATOR);
    let first = segments.next()?;
    let mut current = document.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Sequence tolerant read used by stages.
///
/// When an intermediate value is a sequence, every element is walked with the
/// remaining path and the values found are collected into a new sequence.
/// `null` counts as absent.
pub fn extract<'a>(document: &'a Document, path: &str) -> Option<Cow<'a, Value>> {
    if !path.contains(PATH_SEPARATOR) {
        return document
            .get(path)
            .filter(|v| !v.is_null())
            .map(Cow::Borrowed);
    }

    let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    let (head, rest) = segments.split_first()?;
    extract_from(document.get(*head)?, rest)
}

fn extract_from<'a>(node: &'a Value, segments: &[&str]) -> Option<Cow<'a, Value>> {
    let Some((head, rest)) = segments.split_first() else {
        return if node.is_null() {
            None
        } else {
            Some(Cow::Borrowed(node))
        };
    };

    match node {
        Value::Object(map) => extract_from(map.get(*head)?, rest),
        Value::Array(items) => Some(Cow::Owned(Value::Array(
            items
                .iter()
                .filter_map(|item| extract_from(item, segments))
                .map(Cow::into_owned)
                .collect(),
        ))),
        _ => None,
    }
}

/// Mutable resolution result of [`resolve_mut`].
#[derive(Debug)]
pub enum Resolved<'a> {
    /// Nothing found at the path.
    Absent,
    /// The path was walked through mappings only.
    Node(&'a mut Value),
    /// The path crossed at least one sequence; every value found is listed.
    Collected(Vec<&'a mut Value>),
}

/// Mutable counterpart of [`extract`].
///
/// Sequences crossed while walking are expanded; nested expansions are
/// flattened into one list of nodes.
pub fn resolve_mut<'a>(document: &'a mut Document, path: &str) -> Resolved<'a> {
    let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    let Some((head, rest)) = segments.split_first() else {
        return Resolved::Absent;
    };
    match document.get_mut(*head) {
        Some(node) => resolve_node(node, rest),
        None => Resolved::Absent,
    }
}

fn resolve_node<'a>(node: &'a mut Value, segments: &[&str]) -> Resolved<'a> {
    let Some((head, rest)) = segments.split_first() else {
        return if node.is_null() {
            Resolved::Absent
        } else {
            Resolved::Node(node)
        };
    };

    match node {
        Value::Object(map) => match map.get_mut(*head) {
            Some(child) => resolve_node(child, rest),
            None => Resolved::Absent,
        },
        Value::Array(items) => {
            let mut found = Vec::new();
            for item in items.iter_mut() {
                match resolve_node(item, segments) {
                    Resolved::Absent => {}
                    Resolved::Node(n) => found.push(n),
                    Resolved::Collected(nodes) => found.extend(nodes),
                }
            }
            Resolved::Collected(found)
        }
        _ => Resolved::Absent,
    }
}

fn split_path(path: &str) -> Result<(Vec<&str>, &str), PathError> {
    if path.trim().is_empty() {
        return Err(PathError::EmptyPath);
    }
    let mut segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    let last = segments.pop().ok_or(PathError::EmptyPath)?;
    Ok((segments, last))
}

/// Put a value at `path`, creating intermediate mappings as needed.
///
/// An intermediate value that exists and is not a mapping raises
/// [`PathError::StructureConflict`]; the document is left unchanged in that
/// case. `null` intermediates are treated as absent.
pub fn put(document: &mut Document, path: &str, value: Value) -> Result<(), PathError> {
    let (parents, last) = split_path(path)?;

    let mut level = document;
    for segment in parents {
        let slot = level.entry(segment.to_string()).or_insert(Value::Null);
        if slot.is_null() {
            *slot = Value::Object(Map::new());
        }
        level = match slot {
            Value::Object(map) => map,
            _ => {
                return Err(PathError::StructureConflict {
                    operation: PathOperation::Put,
                    path: path.to_string(),
                    segment: segment.to_string(),
                })
            }
        };
    }

    level.insert(last.to_string(), value);
    Ok(())
}

/// Remove the value at `path`, returning what was stored there.
///
/// A missing intermediate segment means there is nothing to remove.
pub fn delete(document: &mut Document, path: &str) -> Result<Option<Value>, PathError> {
    let (parents, last) = split_path(path)?;

    let mut level = document;
    for segment in parents {
        level = match level.get_mut(segment) {
            None | Some(Value::Null) => return Ok(None),
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(PathError::StructureConflict {
                    operation: PathOperation::Delete,
                    path: path.to_string(),
                    segment: segment.to_string(),
                })
            }
        };
    }

    Ok(level.remove(last))
}

/// Join a base path and a field path.
pub fn full_field_name(base: Option<&str>, field: &str) -> String {
    match base {
        Some(base) => format!("{}{}{}", base, PATH_SEPARATOR, field),
        None => field.to_string(),
    }
}
