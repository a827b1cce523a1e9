// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

//! The post-authentication call set, grounded on the `facund_server_add_call`
//! sequence in `facund_call_authenticate`
//! (`original_source/trunk/backend/facund-comms.c`).

mod area;
mod patches;
mod services;
mod updates;

use std::sync::Arc;

use facund_object::{Object, Response, ResponseCode};
use facund_proto::CallRegistry;
use facund_watch::WatchEntry;

/// Builds the closure `facund_proto::Engine` calls once per session, on
/// handshake (when no authentication is required) or on successful
/// `authenticate`, to install the full handler set.
pub fn build_handler_set(
    entries: Arc<Vec<WatchEntry>>,
    release: Arc<String>,
) -> impl Fn(&mut CallRegistry) + Send + Sync + 'static {
    move |registry: &mut CallRegistry| {
        registry.register("ping", Box::new(ping)).ok();

        let dirs_entries = Arc::clone(&entries);
        registry
            .register(
                "get_directories",
                Box::new(move |id, _arg| get_directories(id.map(str::to_string), &dirs_entries)),
            )
            .ok();

        let lu_entries = Arc::clone(&entries);
        let lu_release = Arc::clone(&release);
        registry
            .register(
                "list_updates",
                Box::new(move |id, arg| {
                    updates::list_updates(id.map(str::to_string), arg, &lu_entries, &lu_release)
                }),
            )
            .ok();

        let li_entries = Arc::clone(&entries);
        let li_release = Arc::clone(&release);
        registry
            .register(
                "list_installed",
                Box::new(move |id, arg| {
                    updates::list_installed(id.map(str::to_string), arg, &li_entries, &li_release)
                }),
            )
            .ok();

        let ip_entries = Arc::clone(&entries);
        registry
            .register(
                "install_patches",
                Box::new(move |id, arg| {
                    patches::install_patches(id.map(str::to_string), arg, &ip_entries)
                }),
            )
            .ok();

        let rp_entries = Arc::clone(&entries);
        registry
            .register(
                "rollback_patches",
                Box::new(move |id, arg| {
                    patches::rollback_patches(id.map(str::to_string), arg, &rp_entries)
                }),
            )
            .ok();

        let gs_entries = Arc::clone(&entries);
        registry
            .register(
                "get_services",
                Box::new(move |id, arg| {
                    services::get_services(id.map(str::to_string), arg, &gs_entries)
                }),
            )
            .ok();

        let rs_entries = Arc::clone(&entries);
        registry
            .register(
                "restart_services",
                Box::new(move |id, arg| {
                    services::restart_services(id.map(str::to_string), arg, &rs_entries)
                }),
            )
            .ok();
    }
}

fn ping(id: Option<&str>, _arg: Option<&Object>) -> Response {
    let mut pong = Object::new_string();
    pong.set_string("pong").unwrap();
    Response::new(id.map(str::to_string), ResponseCode::SUCCESS, "No error", Some(pong)).unwrap()
}

fn get_directories(id: Option<String>, entries: &[WatchEntry]) -> Response {
    let mut dirs = Object::new_array();
    for entry in entries {
        let mut item = Object::new_string();
        item.set_string(entry.base.clone()).unwrap();
        dirs.array_append(item).unwrap();
    }
    Response::new(id, ResponseCode::SUCCESS, "No Error", Some(dirs)).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_replies_pong() {
        let resp = ping(Some("a"), None);
        assert_eq!(resp.code(), ResponseCode::SUCCESS);
        assert_eq!(resp.value().unwrap().get_string(), "pong");
    }

    #[test]
    fn get_directories_lists_configured_bases_in_order() {
        let entries = vec![WatchEntry::new("/"), WatchEntry::new("/usr/jails/one")];
        let resp = get_directories(Some("1".into()), &entries);
        let value = resp.value().unwrap();
        assert_eq!(value.array_size(), 2);
        assert_eq!(value.get_array_item(0).unwrap().get_string(), "/");
        assert_eq!(value.get_array_item(1).unwrap().get_string(), "/usr/jails/one");
    }

    #[test]
    fn handler_set_registers_all_eight_post_auth_calls() {
        let entries = Arc::new(vec![WatchEntry::new("/")]);
        let release = Arc::new("13.2-RELEASE".to_string());
        let mut registry = CallRegistry::new();
        build_handler_set(entries, release)(&mut registry);

        for name in [
            "ping",
            "get_directories",
            "list_updates",
            "list_installed",
            "install_patches",
            "rollback_patches",
            "get_services",
            "restart_services",
        ] {
            assert!(registry.contains(name), "missing handler for {name}");
        }
        assert_eq!(registry.len(), 8);
    }
}
