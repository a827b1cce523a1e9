// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Tagged value with assignment tracking, grounded on
//! `original_source/trunk/lib/facund_object.c`. The C original stores a
//! single discriminated union plus a mutable error slot that every getter
//! and setter writes to, and uses `__DECONST` to mutate that slot through a
//! `const` pointer; here the union is a real Rust enum and the error slot is
//! a `Cell`, so getters can stay `&self` without the cast.

use std::cell::Cell;

use crate::xml_text;

/// The five value shapes the wire protocol can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Bool,
    Int32,
    UInt32,
    String,
    Array,
}

impl ObjectType {
    /// The `type="..."` attribute text used on the wire for this variant.
    pub fn xml_name(self) -> &'static str {
        match self {
            ObjectType::Bool => "bool",
            ObjectType::Int32 => "int",
            ObjectType::UInt32 => "unsigned int",
            ObjectType::String => "string",
            ObjectType::Array => "array",
        }
    }

    /// Parses a `type="..."` attribute value, returning `None` for anything
    /// other than the five recognized type names.
    pub fn from_xml_name(name: &str) -> Option<ObjectType> {
        match name {
            "bool" => Some(ObjectType::Bool),
            "int" => Some(ObjectType::Int32),
            "unsigned int" => Some(ObjectType::UInt32),
            "string" => Some(ObjectType::String),
            "array" => Some(ObjectType::Array),
            _ => None,
        }
    }
}

/// The error slot every getter/setter writes, mirroring
/// `facund_object_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectError {
    #[default]
    None,
    NoObject,
    Unassigned,
    WrongType,
    BadString,
}

#[derive(Debug, Clone, PartialEq)]
enum Payload {
    Bool(bool),
    Int32(i32),
    UInt32(u32),
    String(String),
    Array(Vec<Object>),
}

/// A tagged, possibly-unassigned value.
///
/// Invariants (see spec §3 and §8):
/// - An unassigned object never reports a value: getters return the
///   variant's zero value and set `last_error = Unassigned`.
/// - Assigning or reading the wrong variant sets `WrongType` and never
///   mutates the stored value.
/// - An array becomes assigned the moment it holds at least one child.
#[derive(Debug, Clone)]
pub struct Object {
    kind: ObjectType,
    assigned: bool,
    last_error: Cell<ObjectError>,
    payload: Payload,
}

impl Object {
    fn unassigned(kind: ObjectType, payload: Payload) -> Object {
        Object {
            kind,
            assigned: false,
            last_error: Cell::new(ObjectError::None),
            payload,
        }
    }

    pub fn new_bool() -> Object {
        Object::unassigned(ObjectType::Bool, Payload::Bool(false))
    }

    pub fn new_int32() -> Object {
        Object::unassigned(ObjectType::Int32, Payload::Int32(0))
    }

    pub fn new_uint32() -> Object {
        Object::unassigned(ObjectType::UInt32, Payload::UInt32(0))
    }

    pub fn new_string() -> Object {
        Object::unassigned(ObjectType::String, Payload::String(String::new()))
    }

    pub fn new_array() -> Object {
        Object::unassigned(ObjectType::Array, Payload::Array(Vec::new()))
    }

    /// Constructs an unassigned object of the variant named by a `type="..."`
    /// attribute value, or `None` if the name isn't recognized.
    pub fn from_type_name(name: &str) -> Option<Object> {
        match ObjectType::from_xml_name(name)? {
            ObjectType::Bool => Some(Object::new_bool()),
            ObjectType::Int32 => Some(Object::new_int32()),
            ObjectType::UInt32 => Some(Object::new_uint32()),
            ObjectType::String => Some(Object::new_string()),
            ObjectType::Array => Some(Object::new_array()),
        }
    }

    pub fn kind(&self) -> ObjectType {
        self.kind
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned
    }

    pub fn last_error(&self) -> ObjectError {
        self.last_error.get()
    }

    fn fail(&self, err: ObjectError) {
        self.last_error.set(err);
    }

    fn succeed(&self) {
        self.last_error.set(ObjectError::None);
    }

    // --- bool ---------------------------------------------------------

    pub fn set_bool(&mut self, value: bool) -> Result<(), ObjectError> {
        if self.kind != ObjectType::Bool {
            self.fail(ObjectError::WrongType);
            return Err(ObjectError::WrongType);
        }
        self.payload = Payload::Bool(value);
        self.assigned = true;
        self.succeed();
        Ok(())
    }

    pub fn get_bool(&self) -> bool {
        if self.kind != ObjectType::Bool {
            self.fail(ObjectError::WrongType);
            return false;
        }
        if !self.assigned {
            self.fail(ObjectError::Unassigned);
            return false;
        }
        self.succeed();
        match self.payload {
            Payload::Bool(v) => v,
            _ => unreachable!("kind/payload mismatch"),
        }
    }

    // --- int32 ----------------------------------------------------------

    pub fn set_int32(&mut self, value: i32) -> Result<(), ObjectError> {
        if self.kind != ObjectType::Int32 {
            self.fail(ObjectError::WrongType);
            return Err(ObjectError::WrongType);
        }
        self.payload = Payload::Int32(value);
        self.assigned = true;
        self.succeed();
        Ok(())
    }

    pub fn get_int32(&self) -> i32 {
        if self.kind != ObjectType::Int32 {
            self.fail(ObjectError::WrongType);
            return 0;
        }
        if !self.assigned {
            self.fail(ObjectError::Unassigned);
            return 0;
        }
        self.succeed();
        match self.payload {
            Payload::Int32(v) => v,
            _ => unreachable!("kind/payload mismatch"),
        }
    }

    // --- uint32 -----------------------------------------------------------

    pub fn set_uint32(&mut self, value: u32) -> Result<(), ObjectError> {
        if self.kind != ObjectType::UInt32 {
            self.fail(ObjectError::WrongType);
            return Err(ObjectError::WrongType);
        }
        self.payload = Payload::UInt32(value);
        self.assigned = true;
        self.succeed();
        Ok(())
    }

    pub fn get_uint32(&self) -> u32 {
        if self.kind != ObjectType::UInt32 {
            self.fail(ObjectError::WrongType);
            return 0;
        }
        if !self.assigned {
            self.fail(ObjectError::Unassigned);
            return 0;
        }
        self.succeed();
        match self.payload {
            Payload::UInt32(v) => v,
            _ => unreachable!("kind/payload mismatch"),
        }
    }

    // --- string -------------------------------------------------------

    pub fn set_string(&mut self, value: impl Into<String>) -> Result<(), ObjectError> {
        if self.kind != ObjectType::String {
            self.fail(ObjectError::WrongType);
            return Err(ObjectError::WrongType);
        }
        self.payload = Payload::String(value.into());
        self.assigned = true;
        self.succeed();
        Ok(())
    }

    pub fn get_string(&self) -> &str {
        if self.kind != ObjectType::String {
            self.fail(ObjectError::WrongType);
            return "";
        }
        if !self.assigned {
            self.fail(ObjectError::Unassigned);
            return "";
        }
        self.succeed();
        match &self.payload {
            Payload::String(s) => s.as_str(),
            _ => unreachable!("kind/payload mismatch"),
        }
    }

    // --- array ----------------------------------------------------------

    /// Appends `item` to an array, attaching it as the new last child. An
    /// array becomes assigned the instant it holds its first child.
    pub fn array_append(&mut self, item: Object) -> Result<(), ObjectError> {
        if self.kind != ObjectType::Array {
            self.fail(ObjectError::WrongType);
            return Err(ObjectError::WrongType);
        }
        match &mut self.payload {
            Payload::Array(items) => items.push(item),
            _ => unreachable!("kind/payload mismatch"),
        }
        self.assigned = true;
        self.succeed();
        Ok(())
    }

    pub fn get_array_item(&self, pos: usize) -> Option<&Object> {
        if self.kind != ObjectType::Array {
            self.fail(ObjectError::WrongType);
            return None;
        }
        if !self.assigned {
            self.fail(ObjectError::Unassigned);
            return None;
        }
        let items = match &self.payload {
            Payload::Array(items) => items,
            _ => unreachable!("kind/payload mismatch"),
        };
        match items.get(pos) {
            Some(item) => {
                self.succeed();
                Some(item)
            }
            None => {
                self.fail(ObjectError::NoObject);
                None
            }
        }
    }

    /// Number of children, or 0 if this isn't an array. Unlike the other
    /// getters this does not touch `last_error` -- the C original's
    /// `facund_object_array_size` never set `obj_error` either.
    pub fn array_size(&self) -> usize {
        match &self.payload {
            Payload::Array(items) if self.kind == ObjectType::Array => items.len(),
            _ => 0,
        }
    }

    pub fn array_iter(&self) -> impl Iterator<Item = &Object> {
        let items: &[Object] = match &self.payload {
            Payload::Array(items) if self.kind == ObjectType::Array => items.as_slice(),
            _ => &[],
        };
        items.iter()
    }

    // --- textual form --------------------------------------------------

    /// Parses `value` according to this object's variant, the dynamic
    /// counterpart to `set_bool`/`set_int32`/etc used while decoding
    /// `<data>` character content off the wire.
    ///
    /// Booleans accept any text case-insensitively equal to "true" as true
    /// and everything else as false (never a parse failure). Integers are
    /// parsed as decimal and must fit their respective range. Arrays never
    /// accept a textual form.
    pub fn set_from_str(&mut self, value: &str) -> Result<(), ObjectError> {
        match self.kind {
            ObjectType::Bool => self.set_bool(value.eq_ignore_ascii_case("true")),
            ObjectType::Int32 => match value.parse::<i32>() {
                Ok(v) => self.set_int32(v),
                Err(_) => {
                    self.fail(ObjectError::BadString);
                    Err(ObjectError::BadString)
                }
            },
            ObjectType::UInt32 => match value.parse::<u32>() {
                Ok(v) => self.set_uint32(v),
                Err(_) => {
                    self.fail(ObjectError::BadString);
                    Err(ObjectError::BadString)
                }
            },
            ObjectType::String => self.set_string(value),
            ObjectType::Array => {
                self.fail(ObjectError::BadString);
                Err(ObjectError::BadString)
            }
        }
    }

    /// Renders this object as `<data type="...">...</data>`, or `None` if
    /// it is unassigned -- an unassigned object contributes nothing to the
    /// wire, matching `facund_object_xml_string`'s `NULL` return.
    pub fn to_xml(&self) -> Option<String> {
        if !self.assigned {
            return None;
        }
        let mut buf = String::new();
        self.render_into(&mut buf);
        Some(buf)
    }

    fn render_into(&self, buf: &mut String) {
        if !self.assigned {
            return;
        }
        buf.push_str("<data type=\"");
        buf.push_str(self.kind.xml_name());
        buf.push_str("\">");
        match &self.payload {
            Payload::Bool(v) => buf.push_str(if *v { "true" } else { "false" }),
            Payload::Int32(v) => buf.push_str(&v.to_string()),
            Payload::UInt32(v) => buf.push_str(&v.to_string()),
            Payload::String(s) => xml_text::escape_into(buf, s),
            Payload::Array(items) => {
                for item in items {
                    item.render_into(buf);
                }
            }
        }
        buf.push_str("</data>");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unassigned_reads_are_zero_and_record_unassigned() {
        let o = Object::new_int32();
        assert_eq!(o.get_int32(), 0);
        assert_eq!(o.last_error(), ObjectError::Unassigned);
        assert!(o.to_xml().is_none());
    }

    #[test]
    fn wrong_type_read_does_not_mutate() {
        let mut o = Object::new_int32();
        o.set_int32(42).unwrap();
        assert_eq!(o.get_string(), "");
        assert_eq!(o.last_error(), ObjectError::WrongType);
        // the int value survived the failed string read
        assert_eq!(o.get_int32(), 42);
        assert_eq!(o.last_error(), ObjectError::None);
    }

    #[test]
    fn wrong_type_set_leaves_value_untouched() {
        let mut o = Object::new_int32();
        o.set_int32(42).unwrap();
        assert_eq!(o.set_bool(true), Err(ObjectError::WrongType));
        assert_eq!(o.get_int32(), 42);
    }

    #[test]
    fn bool_textual_form_is_case_insensitive_true_else_false() {
        let mut o = Object::new_bool();
        o.set_from_str("TrUe").unwrap();
        assert!(o.get_bool());

        let mut o = Object::new_bool();
        o.set_from_str("nope").unwrap();
        assert!(!o.get_bool());
    }

    #[test]
    fn int32_boundary_values() {
        let mut o = Object::new_int32();
        assert!(o.set_from_str("2147483647").is_ok());
        assert_eq!(o.get_int32(), i32::MAX);

        let mut o = Object::new_int32();
        assert!(o.set_from_str("-2147483648").is_ok());
        assert_eq!(o.get_int32(), i32::MIN);

        let mut o = Object::new_int32();
        assert_eq!(o.set_from_str("2147483648"), Err(ObjectError::BadString));
        assert!(!o.is_assigned());

        let mut o = Object::new_int32();
        assert_eq!(o.set_from_str("-2147483649"), Err(ObjectError::BadString));
        assert!(!o.is_assigned());
    }

    #[test]
    fn uint32_boundary_values() {
        let mut o = Object::new_uint32();
        assert!(o.set_from_str("4294967295").is_ok());
        assert_eq!(o.get_uint32(), u32::MAX);

        let mut o = Object::new_uint32();
        assert_eq!(o.set_from_str("4294967296"), Err(ObjectError::BadString));

        let mut o = Object::new_uint32();
        assert_eq!(o.set_from_str("-1"), Err(ObjectError::BadString));
    }

    #[test]
    fn array_set_from_str_is_always_bad_string() {
        let mut o = Object::new_array();
        assert_eq!(o.set_from_str("anything"), Err(ObjectError::BadString));
    }

    #[test]
    fn array_size_tracks_appends_and_ignores_errors() {
        let mut a = Object::new_array();
        assert_eq!(a.array_size(), 0);
        assert!(!a.is_assigned());

        let mut child = Object::new_int32();
        child.set_int32(1).unwrap();
        a.array_append(child).unwrap();
        assert_eq!(a.array_size(), 1);
        assert!(a.is_assigned());

        let not_array = Object::new_bool();
        assert_eq!(not_array.array_size(), 0);
    }

    #[test]
    fn array_render_matches_seed_scenario_5() {
        let mut a = Object::new_array();

        let mut i = Object::new_int32();
        i.set_int32(1).unwrap();
        a.array_append(i).unwrap();

        let mut s = Object::new_string();
        s.set_string("x").unwrap();
        a.array_append(s).unwrap();

        let mut nested = Object::new_array();
        let mut b = Object::new_bool();
        b.set_bool(true).unwrap();
        nested.array_append(b).unwrap();
        a.array_append(nested).unwrap();

        assert_eq!(
            a.to_xml().unwrap(),
            "<data type=\"array\"><data type=\"int\">1</data>\
<data type=\"string\">x</data>\
<data type=\"array\"><data type=\"bool\">true</data></data></data>"
        );
    }

    #[test]
    fn rendering_is_idempotent() {
        let mut s = Object::new_string();
        s.set_string("hello").unwrap();
        assert_eq!(s.to_xml(), s.to_xml());
    }

    #[test]
    fn from_type_name_rejects_unknown_types() {
        assert!(Object::from_type_name("bogus").is_none());
        assert!(Object::from_type_name("unsigned int").is_some());
    }
}
