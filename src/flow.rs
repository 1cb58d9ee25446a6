use hwaddr::HwAddr;

use crate::{OutputPort, PortNo};

/// Priority of the table-miss rule installed on connect.
pub const BASELINE_PRIORITY: u16 = 0;
/// Priority of reactively installed forwarding rules.
pub const REACTIVE_PRIORITY: u16 = 10;
/// Bulk flushes delete every rule at or above this priority, which keeps
/// the baseline rule in place.
pub const FLUSH_PRIORITY_FLOOR: u16 = 1;

/// Match fields of a flow rule. `None` fields are wildcards, so the
/// default value matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowMatch {
    pub in_port: Option<PortNo>,
    pub dl_src: Option<HwAddr>,
    pub dl_dst: Option<HwAddr>,
}

impl FlowMatch {
    pub fn match_all() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowAction {
    Output(OutputPort),
}

/// A rule handed to the switch-programming layer. The core never retains
/// installed rules; the switch expires them via `idle_timeout` on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowRule {
    pub matching: FlowMatch,
    pub priority: u16,
    pub actions: Vec<FlowAction>,
    pub idle_timeout: Option<u64>,
}

impl FlowRule {
    /// The permanent lowest-priority rule sending unmatched traffic to the
    /// controller. Defines the miss path every reactive rule relies on.
    pub fn baseline() -> Self {
        Self {
            matching: FlowMatch::match_all(),
            priority: BASELINE_PRIORITY,
            actions: vec![FlowAction::Output(OutputPort::Controller)],
            idle_timeout: None,
        }
    }

    /// A reactive unicast rule for one (in_port, src, dst) flow.
    pub fn reactive(
        in_port: PortNo,
        dl_src: HwAddr,
        dl_dst: HwAddr,
        out_port: PortNo,
        idle_timeout_secs: u64,
    ) -> Self {
        Self {
            matching: FlowMatch {
                in_port: Some(in_port),
                dl_src: Some(dl_src),
                dl_dst: Some(dl_dst),
            },
            priority: REACTIVE_PRIORITY,
            actions: vec![FlowAction::Output(OutputPort::Port(out_port))],
            idle_timeout: Some(idle_timeout_secs),
        }
    }
}

/// Programming commands issued through a `SwitchHandle`. All of them are
/// fire-and-forget: no acknowledgement is awaited and nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchCommand {
    InstallFlow(FlowRule),
    DeleteFlows {
        above_priority: u16,
    },
    PacketOut {
        /// Switch-side buffer holding the frame, when one was supplied.
        buffer_id: Option<u32>,
        /// Raw frame bytes, only carried when there is no buffer reference.
        payload: Option<Vec<u8>>,
        in_port: PortNo,
        actions: Vec<FlowAction>,
    },
}
