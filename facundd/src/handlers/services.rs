// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! `get_services`/`restart_services`, grounded on
//! `facund_call_get_services`/`facund_call_restart_services` in
//! `original_source/trunk/backend/facund-comms.c`.

use std::fs;
use std::path::Path;
use std::process::Command;

use log::warn;

use facund_object::{Object, ObjectType, Response, ResponseCode};
use facund_watch::{EffectivePrivilege, WatchEntry};

/// The system service-script directory (spec §6's "system service-script
/// directory").
const PRIMARY_SERVICE_DIR: &str = "/etc/rc.d";
/// The package-manager-local fallback, searched second.
const FALLBACK_SERVICE_DIR: &str = "/usr/local/etc/rc.d";

fn known_base(entries: &[WatchEntry], base_dir: &str) -> bool {
    base_dir == "/" && entries.iter().any(|e| e.base == base_dir)
}

pub fn get_services(id: Option<String>, arg: Option<&Object>, entries: &[WatchEntry]) -> Response {
    let Some(arg) = arg else {
        return Response::new(id, ResponseCode::GENERIC_FAILURE, "No data sent", None).unwrap();
    };
    if arg.kind() != ObjectType::String {
        return Response::new(id, ResponseCode::GENERIC_FAILURE, "Incorrect data", None).unwrap();
    }

    let base_dir = arg.get_string();
    if base_dir != "/" {
        return Response::new(
            id,
            ResponseCode::GENERIC_FAILURE,
            "Can only restart services in /",
            None,
        )
        .unwrap();
    }
    if !known_base(entries, base_dir) {
        return Response::new(id, ResponseCode::GENERIC_FAILURE, "Unknown base dir", None).unwrap();
    }

    let read_dir = match fs::read_dir(PRIMARY_SERVICE_DIR) {
        Ok(rd) => rd,
        Err(e) => {
            warn!("could not open {PRIMARY_SERVICE_DIR}: {e}");
            return Response::new(
                id,
                ResponseCode::GENERIC_FAILURE,
                format!("Could not open {PRIMARY_SERVICE_DIR}/"),
                None,
            )
            .unwrap();
        }
    };

    let mut services = Object::new_array();
    for entry in read_dir.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with('.') {
            continue;
        }
        let mut item = Object::new_string();
        item.set_string(name.into_owned()).unwrap();
        services.array_append(item).unwrap();
    }

    if services.array_size() == 0 {
        return Response::new(id, ResponseCode::GENERIC_FAILURE, "No services found", None).unwrap();
    }

    Response::new(id, ResponseCode::SUCCESS, "Services found", Some(services)).unwrap()
}

/// Finds the first service script matching `service` under the two
/// well-known directories, in order.
fn find_service_script(service: &str) -> Option<String> {
    for dir in [PRIMARY_SERVICE_DIR, FALLBACK_SERVICE_DIR] {
        let candidate = Path::new(dir).join(service);
        if candidate.exists() {
            return Some(candidate.to_string_lossy().into_owned());
        }
    }
    None
}

pub fn restart_services(id: Option<String>, arg: Option<&Object>, entries: &[WatchEntry]) -> Response {
    let Some(arg) = arg else {
        return Response::new(id, ResponseCode::GENERIC_FAILURE, "No data sent", None).unwrap();
    };
    if arg.kind() != ObjectType::Array || arg.array_size() != 2 {
        return Response::new(id, ResponseCode::GENERIC_FAILURE, "Incorrect data", None).unwrap();
    }

    let base_obj = arg.get_array_item(0).expect("size checked above");
    if base_obj.kind() != ObjectType::String {
        return Response::new(id, ResponseCode::GENERIC_FAILURE, "Incorrect data", None).unwrap();
    }
    let base_dir = base_obj.get_string();
    if base_dir != "/" {
        return Response::new(
            id,
            ResponseCode::GENERIC_FAILURE,
            "Can only restart services in /",
            None,
        )
        .unwrap();
    }
    if !known_base(entries, base_dir) {
        return Response::new(id, ResponseCode::GENERIC_FAILURE, "Unknown base dir", None).unwrap();
    }

    let service_obj = arg.get_array_item(1).expect("size checked above");
    if service_obj.kind() != ObjectType::String {
        return Response::new(id, ResponseCode::GENERIC_FAILURE, "Incorrect data", None).unwrap();
    }
    let service = service_obj.get_string();

    let Some(script) = find_service_script(service) else {
        return Response::new(id, ResponseCode::GENERIC_FAILURE, "Unknown service", None).unwrap();
    };

    let restarted = {
        let _priv = match EffectivePrivilege::raise_saved_set() {
            Ok(guard) => guard,
            Err(e) => {
                warn!("could not raise privilege to restart {service}: {e}");
                return Response::new(id, ResponseCode::GENERIC_FAILURE, "Service restart failed", None)
                    .unwrap();
            }
        };
        Command::new("sh")
            .arg("-c")
            .arg(format!("{script} restart"))
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    };

    if restarted {
        Response::new(id, ResponseCode::SUCCESS, "Service restart successful", None).unwrap()
    } else {
        Response::new(id, ResponseCode::GENERIC_FAILURE, "Service restart failed", None).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_services_rejects_non_root_base() {
        let entries = vec![WatchEntry::new("/")];
        let mut arg = Object::new_string();
        arg.set_string("/usr/jails/one").unwrap();

        let resp = get_services(Some("1".into()), Some(&arg), &entries);
        assert_eq!(resp.code(), ResponseCode::GENERIC_FAILURE);
        assert_eq!(resp.message(), "Can only restart services in /");
    }

    #[test]
    fn get_services_rejects_unknown_base() {
        let entries = vec![WatchEntry::new("/usr/jails/one")];
        let mut arg = Object::new_string();
        arg.set_string("/").unwrap();

        let resp = get_services(Some("1".into()), Some(&arg), &entries);
        assert_eq!(resp.code(), ResponseCode::GENERIC_FAILURE);
        assert_eq!(resp.message(), "Unknown base dir");
    }

    #[test]
    fn restart_services_rejects_unknown_service() {
        let entries = vec![WatchEntry::new("/")];
        let mut arg = Object::new_array();
        let mut base = Object::new_string();
        base.set_string("/").unwrap();
        arg.array_append(base).unwrap();
        let mut service = Object::new_string();
        service.set_string("definitely-not-a-real-service").unwrap();
        arg.array_append(service).unwrap();

        let resp = restart_services(Some("1".into()), Some(&arg), &entries);
        assert_eq!(resp.code(), ResponseCode::GENERIC_FAILURE);
        assert_eq!(resp.message(), "Unknown service");
    }
}
