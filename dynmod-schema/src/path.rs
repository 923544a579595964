//! Dotted-path addressing and in-place edits of field lists.
//!
//! Paths name fields by `.`-separated names from the top level, e.g.
//! `Address.Street`. A leading `.` and surrounding whitespace are ignored;
//! an empty path (or `.`) is the top level itself.

use crate::FieldSpec;

/// Splits a dotted path into its segments. The root path yields none.
pub fn split_path(path: &str) -> Vec<&str> {
    let path = path.trim();
    let path = path.strip_prefix('.').unwrap_or(path);
    if path.is_empty() {
        Vec::new()
    } else {
        path.split('.').collect()
    }
}

/// Canonical form of a dotted path: a leading `.`, root is `"."`.
pub fn normalize_path(path: &str) -> String {
    format!(".{}", split_path(path).join("."))
}

/// Appends `new_field` under the field at `path` (or at the top level for
/// the root path). The target must accept children; see
/// [`FieldSpec::accepts_children`]. Returns whether anything was inserted.
pub fn insert_field(fields: &mut Vec<FieldSpec>, path: &str, new_field: FieldSpec) -> bool {
    insert_at(fields, &split_path(path), new_field)
}

fn insert_at(fields: &mut Vec<FieldSpec>, segments: &[&str], new_field: FieldSpec) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        fields.push(new_field);
        return true;
    };

    fields
        .iter_mut()
        .filter(|f| f.name == *first && f.accepts_children())
        .any(|f| insert_at(&mut f.children, rest, new_field.clone()))
}

/// Replaces the field named by the final segment of `path`, subtree
/// included. Returns whether a field was replaced.
pub fn update_field(fields: &mut [FieldSpec], path: &str, new_field: FieldSpec) -> bool {
    update_at(fields, &split_path(path), new_field)
}

fn update_at(fields: &mut [FieldSpec], segments: &[&str], new_field: FieldSpec) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return false;
    };

    for field in fields.iter_mut().filter(|f| f.name == *first) {
        if rest.is_empty() {
            *field = new_field;
            return true;
        }
        if update_at(&mut field.children, rest, new_field.clone()) {
            return true;
        }
    }
    false
}

/// Removes the field at `path`. A parent left without children is removed
/// as well, cascading upward. Returns whether a field was removed.
pub fn delete_field(fields: &mut Vec<FieldSpec>, path: &str) -> bool {
    delete_at(fields, &split_path(path))
}

fn delete_at(fields: &mut Vec<FieldSpec>, segments: &[&str]) -> bool {
    let Some((first, rest)) = segments.split_first() else {
        return false;
    };

    if rest.is_empty() {
        return match fields.iter().position(|f| f.name == *first) {
            Some(index) => {
                fields.remove(index);
                true
            }
            None => false,
        };
    }

    for index in 0..fields.len() {
        if fields[index].name != *first || !delete_at(&mut fields[index].children, rest) {
            continue;
        }
        if fields[index].children.is_empty() {
            fields.remove(index);
        }
        return true;
    }
    false
}
