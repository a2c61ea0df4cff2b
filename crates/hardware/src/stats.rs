//! Relay statistics collection and reporting.
//!
//! This module tracks the relay's observable counters. It provides:
//! 1. **Request path:** Total time requests spent in the inspection buffer, and the number
//!    of requests handed to the far-side endpoint.
//! 2. **Response path:** Total time responses spent in the response buffer, and the number
//!    of responses handed to the near-side endpoint.
//! 3. **Ordering:** The number of responses that returned out of their request order.
//!
//! The relay is the only writer; everything else sees a shared reference.

use serde::Serialize;

use crate::common::Tick;

/// Counters maintained by a relay.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RelayStats {
    /// Sum over inspected requests of ticks spent in the inspection buffer.
    pub total_inspection_buffer_latency: Tick,
    /// Requests that have left the inspection buffer.
    pub num_requests_inspected: u64,
    /// Requests handed to the far-side endpoint (including ones it then held).
    pub num_requests_fwded: u64,
    /// Sum over forwarded responses of ticks spent in the response buffer.
    pub total_response_buffer_latency: Tick,
    /// Responses handed to the near-side endpoint (including ones it then held).
    pub num_responses_fwded: u64,
    /// Responses whose sequence tag did not match the expected number.
    pub num_req_resp_displacements: u64,
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"requests"`, `"responses"`, `"ordering"`.
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &["requests", "responses", "ordering"];

impl RelayStats {
    /// Average ticks an inspected request spent in the inspection buffer.
    ///
    /// Divides by the requests inspected, not forwarded, so the value stays exact while
    /// requests still wait in the output buffer. Returns 0.0 before the first inspection.
    pub fn avg_inspection_buffer_latency(&self) -> f64 {
        if self.num_requests_inspected == 0 {
            return 0.0;
        }
        self.total_inspection_buffer_latency as f64 / self.num_requests_inspected as f64
    }

    /// Average ticks a forwarded response spent in the response buffer.
    pub fn avg_response_buffer_latency(&self) -> f64 {
        if self.num_responses_fwded == 0 {
            return 0.0;
        }
        self.total_response_buffer_latency as f64 / self.num_responses_fwded as f64
    }

    /// Renders the requested sections as text.
    ///
    /// # Arguments
    ///
    /// * `name` - Relay name used as the stat prefix.
    /// * `sections` - Section names to include, or empty for all.
    pub fn render_sections(&self, name: &str, sections: &[String]) -> String {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let mut out = String::new();
        out.push_str("==========================================================\n");
        out.push_str("RELAY STATISTICS\n");
        out.push_str("==========================================================\n");
        if want("requests") {
            out.push_str(&format!(
                "{name}.totalInspectionBufferLatency  {:<12} # Total inspection buffer latency (Tick)\n",
                self.total_inspection_buffer_latency
            ));
            out.push_str(&format!(
                "{name}.numRequestsInspected          {:<12} # Number of requests inspected (Count)\n",
                self.num_requests_inspected
            ));
            out.push_str(&format!(
                "{name}.numRequestsFwded              {:<12} # Number of requests forwarded (Count)\n",
                self.num_requests_fwded
            ));
            out.push_str(&format!(
                "{name}.avgInspectionBufferLatency    {:<12.2} # Average inspection buffer latency (Tick)\n",
                self.avg_inspection_buffer_latency()
            ));
            out.push_str("----------------------------------------------------------\n");
        }
        if want("responses") {
            out.push_str(&format!(
                "{name}.totalResponseBufferLatency    {:<12} # Total response buffer latency (Tick)\n",
                self.total_response_buffer_latency
            ));
            out.push_str(&format!(
                "{name}.numResponsesFwded             {:<12} # Number of responses forwarded (Count)\n",
                self.num_responses_fwded
            ));
            out.push_str(&format!(
                "{name}.avgResponseBufferLatency      {:<12.2} # Average response buffer latency (Tick)\n",
                self.avg_response_buffer_latency()
            ));
            out.push_str("----------------------------------------------------------\n");
        }
        if want("ordering") {
            out.push_str(&format!(
                "{name}.numReqRespDisplacements       {:<12} # Number of request-response displacements (Count)\n",
                self.num_req_resp_displacements
            ));
        }
        out.push_str("==========================================================\n");
        out
    }

    /// Prints only the requested statistics sections to stdout.
    pub fn print_sections(&self, name: &str, sections: &[String]) {
        print!("{}", self.render_sections(name, sections));
    }

    /// Prints all statistics sections to stdout.
    ///
    /// Equivalent to `print_sections(name, &[])`.
    pub fn print(&self, name: &str) {
        self.print_sections(name, &[]);
    }
}
