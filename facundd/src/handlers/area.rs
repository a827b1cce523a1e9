// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Argument parsing shared by `list_updates`/`list_installed`, grounded on
//! `facund_get_update_types`/`facund_get_dir_list`/
//! `facund_read_type_directory` in
//! `original_source/trunk/backend/facund-comms.c`.
//!
//! The C original flags an area as matched whenever a string *isn't* equal
//! to the other candidate area's keyword (`strcmp(areas[0], "base") == 0 ||
//! strcmp(areas[1], "base")`, the second disjunct missing its `== 0`) --
//! almost certainly a typo, since it makes "ports" match on anything that
//! isn't the literal string "ports". This parses the fixed, intended rule:
//! a position contributes a flag only when it equals that keyword exactly.

use facund_object::{Object, ObjectType};

/// Which update areas a `list_updates`/`list_installed` call asked about.
/// Parsed but not used to filter the result set below -- matching the
/// original, which computes these flags only to assert that at least one
/// was requested, never to gate which base directories are considered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AreaSelection {
    pub base: bool,
    pub ports: bool,
}

/// Parses the first element of a `list_updates`/`list_installed` argument:
/// either a single `"base"`/`"ports"` string, or a two-element array of such
/// strings.
pub fn parse_areas(obj: &Object) -> Result<AreaSelection, &'static str> {
    match obj.kind() {
        ObjectType::String => {
            let mut sel = AreaSelection::default();
            match obj.get_string() {
                "base" => sel.base = true,
                "ports" => sel.ports = true,
                _ => {}
            }
            Ok(sel)
        }
        ObjectType::Array => {
            if obj.array_size() != 2 {
                return Err("Wrong number of arguments");
            }
            let mut sel = AreaSelection::default();
            for item in obj.array_iter() {
                if item.kind() != ObjectType::String {
                    return Err("Incorrect data type");
                }
                match item.get_string() {
                    "base" => sel.base = true,
                    "ports" => sel.ports = true,
                    _ => {}
                }
            }
            Ok(sel)
        }
        _ => Err("Incorrect data type"),
    }
}

/// Parses a `list_updates`/`list_installed` directory argument: either a
/// single base-directory string or an array of them (`facund_get_dir_list`).
pub fn parse_dir_list(obj: &Object) -> Result<Vec<String>, &'static str> {
    match obj.kind() {
        ObjectType::String => Ok(vec![obj.get_string().to_string()]),
        ObjectType::Array => {
            if obj.array_size() == 0 {
                return Err("Bad data sent");
            }
            let mut dirs = Vec::with_capacity(obj.array_size());
            for item in obj.array_iter() {
                if item.kind() != ObjectType::String {
                    return Err("Bad data sent");
                }
                dirs.push(item.get_string().to_string());
            }
            Ok(dirs)
        }
        _ => Err("Bad data sent"),
    }
}

/// Parses the full `[areas, dirs]` argument shared by `list_updates` and
/// `list_installed` (`facund_read_type_directory`).
pub fn parse_type_directory(obj: &Object) -> Result<(AreaSelection, Vec<String>), &'static str> {
    if obj.kind() != ObjectType::Array {
        return Err("Bad data sent");
    }
    if obj.array_size() < 2 {
        return Err("Not enough arguments");
    }
    if obj.array_size() > 2 {
        return Err("Too many arguments");
    }

    let areas = parse_areas(obj.get_array_item(0).expect("size checked above"))?;
    let dirs = parse_dir_list(obj.get_array_item(1).expect("size checked above"))?;
    Ok((areas, dirs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use facund_object::Object;

    fn string(s: &str) -> Object {
        let mut o = Object::new_string();
        o.set_string(s).unwrap();
        o
    }

    #[test]
    fn single_string_area_sets_matching_flag_only() {
        let sel = parse_areas(&string("base")).unwrap();
        assert!(sel.base);
        assert!(!sel.ports);
    }

    #[test]
    fn unrecognized_string_area_sets_no_flags() {
        let sel = parse_areas(&string("bogus")).unwrap();
        assert!(!sel.base);
        assert!(!sel.ports);
    }

    #[test]
    fn array_area_requires_exact_match_per_position() {
        let mut arr = Object::new_array();
        arr.array_append(string("bogus")).unwrap();
        arr.array_append(string("ports")).unwrap();
        let sel = parse_areas(&arr).unwrap();
        assert!(!sel.base);
        assert!(sel.ports);
    }

    #[test]
    fn array_area_wrong_size_is_an_error() {
        let mut arr = Object::new_array();
        arr.array_append(string("base")).unwrap();
        assert_eq!(parse_areas(&arr), Err("Wrong number of arguments"));
    }

    #[test]
    fn dir_list_accepts_single_string_or_array() {
        assert_eq!(parse_dir_list(&string("/")).unwrap(), vec!["/".to_string()]);

        let mut arr = Object::new_array();
        arr.array_append(string("/")).unwrap();
        arr.array_append(string("/usr/jails/one")).unwrap();
        assert_eq!(
            parse_dir_list(&arr).unwrap(),
            vec!["/".to_string(), "/usr/jails/one".to_string()]
        );
    }
}
