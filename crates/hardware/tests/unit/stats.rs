//! # Statistics Tests
//!
//! Verifies the relay counters' derived averages, sectioned text rendering, and JSON
//! serialization.

use gadget_core::stats::{RelayStats, STATS_SECTIONS};
use pretty_assertions::assert_eq;

fn sample() -> RelayStats {
    RelayStats {
        total_inspection_buffer_latency: 3_000,
        num_requests_inspected: 6,
        num_requests_fwded: 4,
        total_response_buffer_latency: 900,
        num_responses_fwded: 3,
        num_req_resp_displacements: 2,
    }
}

#[test]
fn averages_are_zero_without_traffic() {
    let stats = RelayStats::default();
    assert_eq!(stats.avg_inspection_buffer_latency(), 0.0);
    assert_eq!(stats.avg_response_buffer_latency(), 0.0);
}

#[test]
fn averages_divide_by_the_counts_that_accumulated_latency() {
    let stats = sample();
    // Two inspected requests are still waiting to be forwarded.
    assert_eq!(stats.avg_inspection_buffer_latency(), 500.0);
    assert_eq!(stats.avg_response_buffer_latency(), 300.0);
}

#[test]
fn inspection_average_before_any_forward() {
    let stats = RelayStats {
        total_inspection_buffer_latency: 666,
        num_requests_inspected: 2,
        ..RelayStats::default()
    };
    assert_eq!(stats.avg_inspection_buffer_latency(), 333.0);
}

#[test]
fn render_all_sections_by_default() {
    let text = sample().render_sections("system.inspector", &[]);
    assert!(text.contains("system.inspector.totalInspectionBufferLatency"));
    assert!(text.contains("system.inspector.numRequestsInspected"));
    assert!(text.contains("system.inspector.numRequestsFwded"));
    assert!(text.contains("system.inspector.totalResponseBufferLatency"));
    assert!(text.contains("system.inspector.numResponsesFwded"));
    assert!(text.contains("system.inspector.numReqRespDisplacements"));
}

#[test]
fn render_selected_sections_only() {
    let text = sample().render_sections("r", &["ordering".to_string()]);
    assert!(text.contains("r.numReqRespDisplacements"));
    assert!(!text.contains("r.numRequestsFwded"));
    assert!(!text.contains("r.numResponsesFwded"));
}

#[test]
fn section_names_cover_every_counter_group() {
    assert_eq!(STATS_SECTIONS, &["requests", "responses", "ordering"]);
}

#[test]
fn serializes_counter_names() {
    let value = serde_json::to_value(sample()).unwrap();
    assert_eq!(value["num_requests_fwded"], 4);
    assert_eq!(value["num_requests_inspected"], 6);
    assert_eq!(value["num_req_resp_displacements"], 2);
    assert_eq!(value["total_response_buffer_latency"], 900);
}
