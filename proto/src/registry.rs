// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! Call registry, re-expressed per the REDESIGN FLAGS note as state owned by
//! the protocol engine rather than the process-wide `DB_HASH` table
//! `facund_server_add_call` installs into in
//! `original_source/trunk/lib/facund_server.c`.

use std::collections::HashMap;

use facund_object::{Object, Response};

/// A call handler: takes the call's `id` attribute (if any) and its parsed
/// argument object (absent when the call carried no `<data>`), and produces
/// a response.
pub type Handler = Box<dyn Fn(Option<&str>, Option<&Object>) -> Response + Send>;

/// Maps call names to handlers. Registration is one-shot per name.
#[derive(Default)]
pub struct CallRegistry {
    handlers: HashMap<String, Handler>,
}

impl CallRegistry {
    pub fn new() -> CallRegistry {
        CallRegistry {
            handlers: HashMap::new(),
        }
    }

    /// Registers `handler` under `name`. Returns `Err(())` if `name` is
    /// already registered -- duplicate registration is refused, never
    /// overwritten.
    pub fn register(&mut self, name: impl Into<String>, handler: Handler) -> Result<(), ()> {
        let name = name.into();
        if self.handlers.contains_key(&name) {
            return Err(());
        }
        self.handlers.insert(name, handler);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Handler> {
        self.handlers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facund_object::ResponseCode;

    fn handler() -> Handler {
        Box::new(|id, _arg| Response::new(id.map(str::to_string), ResponseCode::SUCCESS, "ok", None).unwrap())
    }

    #[test]
    fn duplicate_registration_is_refused() {
        let mut reg = CallRegistry::new();
        assert!(reg.register("ping", handler()).is_ok());
        assert!(reg.register("ping", handler()).is_err());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn unknown_name_is_absent() {
        let reg = CallRegistry::new();
        assert!(reg.get("ping").is_none());
    }
}
