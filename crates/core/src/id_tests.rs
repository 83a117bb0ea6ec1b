// SPDX-License-Identifier: MIT

use super::*;
use std::collections::HashMap;

#[test]
fn workflow_id_hash_map_lookup() {
    let mut map = HashMap::new();
    map.insert(WorkflowId::new("wf-1"), 42);
    assert_eq!(map.get("wf-1"), Some(&42));
}

#[test]
fn node_id_display_round_trips_arbitrary_length_strings() {
    let long = "a".repeat(64);
    let id = NodeId::new(&long);
    assert_eq!(id.to_string(), long);
    assert_eq!(id.as_str(), long);
}

#[test]
fn node_id_from_str_and_string_agree() {
    let a = NodeId::from("n1");
    let b = NodeId::from(String::from("n1"));
    assert_eq!(a, b);
}

#[test]
fn subscription_ids_are_unique() {
    let a = new_subscription_id();
    let b = new_subscription_id();
    assert_ne!(a, b);
}
