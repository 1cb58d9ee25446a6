use async_trait::async_trait;
use log::{debug, info, trace, warn};
use packet::ether::{Packet, Protocol};

use crate::{
    DatapathId, EventSink, FlowAction, FlowRule, ForwardingTable, OutputPort, PortNo,
    SwitchHandle, SwitchRegistry, SwitchState, FLUSH_PRIORITY_FLOOR,
};

pub const DEFAULT_FLOW_IDLE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LIVENESS_PERIOD_SECS: u64 = 10;

/// The two tunables the embedding process may override.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Idle timeout stamped onto reactive flow rules; the switch removes a
    /// rule on its own once no traffic matched it for this long.
    pub flow_idle_timeout_secs: u64,
    /// Period of the background liveness task.
    pub liveness_period_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            flow_idle_timeout_secs: DEFAULT_FLOW_IDLE_TIMEOUT_SECS,
            liveness_period_secs: DEFAULT_LIVENESS_PERIOD_SECS,
        }
    }
}

/// Reactive forwarding/failover decision engine.
///
/// Learns source MACs from packet-in events, answers known destinations
/// with a unicast rule plus packet-out and unknown ones with a flood,
/// and reacts to port removal by purging learned state and flushing all
/// reactive rules so live flows re-derive a path through a fresh miss.
#[derive(Debug, Default)]
pub struct Controller {
    config: ControllerConfig,
    registry: SwitchRegistry,
    table: ForwardingTable,
}

impl Controller {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            registry: SwitchRegistry::new(),
            table: ForwardingTable::new(),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn registry(&self) -> &SwitchRegistry {
        &self.registry
    }

    pub fn table(&self) -> &ForwardingTable {
        &self.table
    }

    // Shared by the disconnect event and the dead-state transition: the
    // handle and the learned map go away together, so no per-switch state
    // can dangle.
    fn drop_switch(&mut self, dpid: DatapathId) {
        self.registry.remove(dpid);
        self.table.clear(dpid);
    }
}

#[async_trait]
impl EventSink for Controller {
    async fn switch_connected(
        &mut self,
        dpid: DatapathId,
        handle: SwitchHandle,
    ) -> anyhow::Result<()> {
        info!("switch {dpid} connected");
        self.table.ensure(dpid);
        // Switches lose rule state across restarts, so the miss rule is
        // (re)installed on every connect before anything reactive happens.
        handle.install_flow(FlowRule::baseline());
        self.registry.register(dpid, handle);
        Ok(())
    }

    async fn switch_disconnected(&mut self, dpid: DatapathId) -> anyhow::Result<()> {
        info!("switch {dpid} disconnected");
        self.drop_switch(dpid);
        Ok(())
    }

    async fn port_removed(&mut self, dpid: DatapathId, port: PortNo) -> anyhow::Result<()> {
        info!("port {port} removed on switch {dpid}");
        for mac in self.table.remove_by_port(dpid, port) {
            info!("purged learned {mac} on switch {dpid} port {port}");
        }
        // Coarse on purpose: without path knowledge any installed rule may
        // route through the broken link, so flush everything above the
        // baseline and let traffic re-trigger packet-ins.
        if let Some(handle) = self.registry.lookup(dpid) {
            handle.delete_flows(FLUSH_PRIORITY_FLOOR);
            debug!("flushed reactive flows on switch {dpid}");
        }
        Ok(())
    }

    async fn packet_in(
        &mut self,
        dpid: DatapathId,
        in_port: PortNo,
        buffer_id: Option<u32>,
        payload: Vec<u8>,
    ) -> anyhow::Result<()> {
        // Resolve the handle first: a miss means the switch disconnected
        // mid-processing, and learning for an unregistered switch would
        // leave state no later event could clean up.
        let Some(handle) = self.registry.lookup(dpid).cloned() else {
            debug!("dropping packet-in from unregistered switch {dpid}");
            return Ok(());
        };

        let (src, dst) = {
            let frame = match Packet::new(payload.as_slice()) {
                Ok(frame) => frame,
                Err(err) => {
                    warn!("dropping packet-in on {dpid} port {in_port} without ethernet header: {err}");
                    return Ok(());
                }
            };
            // LLDP is infrastructure discovery traffic, never data to forward.
            if frame.protocol() == Protocol::Lldp {
                trace!("ignoring lldp frame on switch {dpid} port {in_port}");
                return Ok(());
            }
            (frame.source(), frame.destination())
        };

        if self.table.learn(dpid, src, in_port) {
            info!("learned {src} on switch {dpid} port {in_port}");
        }

        let output = match self.table.lookup_output(dpid, dst) {
            Some(port) => OutputPort::Port(port),
            None => OutputPort::Flood,
        };

        if let OutputPort::Port(out_port) = output {
            let rule = FlowRule::reactive(
                in_port,
                src,
                dst,
                out_port,
                self.config.flow_idle_timeout_secs,
            );
            handle.install_flow(rule);
            debug!("installed flow on {dpid}: {src} -> {dst} out {out_port}");
        } else {
            debug!("flooding {dst} on switch {dpid}");
        }

        // The frame in hand predates the rule; forward it explicitly so the
        // first packet of a flow is never dropped.
        let data = if buffer_id.is_none() {
            Some(payload)
        } else {
            None
        };
        handle.send_packet_out(buffer_id, data, in_port, vec![FlowAction::Output(output)]);
        Ok(())
    }

    async fn switch_state_changed(
        &mut self,
        dpid: DatapathId,
        state: SwitchState,
    ) -> anyhow::Result<()> {
        match state {
            SwitchState::Active => {
                if self.registry.is_registered(dpid) {
                    trace!("switch {dpid} reported active");
                } else {
                    // No handle arrives with a state change, so there is
                    // nothing to register here.
                    debug!("active state for unregistered switch {dpid}, ignoring");
                }
            }
            SwitchState::Dead => {
                info!("switch {dpid} reported dead");
                self.drop_switch(dpid);
            }
        }
        Ok(())
    }
}
