//! Placement report printed after a plan is allocated.

use super::terminal::{format_field, format_optional, state_label};
use crate::models::int_to_ip;
use crate::network::Network;
use crate::plan::InstanceNetwork;
use colored::Colorize;
use itertools::Itertools;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One CSV-style row per placed instance.
pub fn placement_rows(placed: &[InstanceNetwork]) -> Vec<String> {
    placed
        .iter()
        .map(|p| {
            format!(
                "{instance},{network},{kind},{state},{ip},{gateway},{dns}",
                instance = format_field(&p.instance, 12),
                network = format_field(p.reservation.network(), 10),
                kind = format_field(p.reservation.kind(), 9),
                state = format_field(state_label(p.reservation.state()), 12),
                ip = format_optional(p.reservation.ip_addr(), 17),
                gateway = format_optional(p.settings.gateway, 17),
                dns = format_field(
                    p.settings.dns.as_deref().unwrap_or_default().iter().join(" "),
                    20
                ),
            )
        })
        .collect()
}

/// Print placements followed by per-network address usage.
pub fn print_placements(placed: &[InstanceNetwork], networks: &BTreeMap<String, Arc<Network>>) {
    log::info!("#Start print_placements() count={}", placed.len());

    println!(
        r#"   "instance",  "network",    "kind",      "state",                "ip",           "gateway",                "dns""#
    );
    for row in placement_rows(placed) {
        println!("{row}");
    }

    println!();
    for network in networks.values() {
        let held = network.held_addresses();
        let addresses = if held.is_empty() {
            "-".to_string()
        } else {
            held.into_iter().map(int_to_ip).join(", ")
        };
        println!("#{}# {network}: {addresses}", "NET".on_blue());
    }
}
