use async_trait::async_trait;

use crate::{DatapathId, PortNo, SwitchHandle};

/// Connection state reported by the protocol layer after the initial
/// connect, e.g. when the control channel goes silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchState {
    Active,
    Dead,
}

/// Events delivered by the protocol layer. The runtime feeds them to the
/// controller one at a time, in arrival order; that single stream is the
/// synchronization boundary for all shared state.
#[derive(Debug)]
pub enum Event {
    SwitchConnected {
        dpid: DatapathId,
        handle: SwitchHandle,
    },
    SwitchDisconnected {
        dpid: DatapathId,
    },
    PortRemoved {
        dpid: DatapathId,
        port: PortNo,
    },
    PacketIn {
        dpid: DatapathId,
        in_port: PortNo,
        /// Switch-side buffer reference, when the switch buffered the frame.
        buffer_id: Option<u32>,
        /// Raw frame bytes starting at the Ethernet header.
        payload: Vec<u8>,
    },
    SwitchStateChanged {
        dpid: DatapathId,
        state: SwitchState,
    },
}

/// One method per event kind. The protocol adapter (or the runtime's event
/// loop on its behalf) invokes these; the core never polls for events
/// itself apart from the liveness task.
#[async_trait]
pub trait EventSink {
    async fn switch_connected(
        &mut self,
        dpid: DatapathId,
        handle: SwitchHandle,
    ) -> anyhow::Result<()>;

    async fn switch_disconnected(&mut self, dpid: DatapathId) -> anyhow::Result<()>;

    async fn port_removed(&mut self, dpid: DatapathId, port: PortNo) -> anyhow::Result<()>;

    async fn packet_in(
        &mut self,
        dpid: DatapathId,
        in_port: PortNo,
        buffer_id: Option<u32>,
        payload: Vec<u8>,
    ) -> anyhow::Result<()>;

    async fn switch_state_changed(
        &mut self,
        dpid: DatapathId,
        state: SwitchState,
    ) -> anyhow::Result<()>;

    async fn handle_event(&mut self, event: Event) -> anyhow::Result<()> {
        match event {
            Event::SwitchConnected { dpid, handle } => self.switch_connected(dpid, handle).await,
            Event::SwitchDisconnected { dpid } => self.switch_disconnected(dpid).await,
            Event::PortRemoved { dpid, port } => self.port_removed(dpid, port).await,
            Event::PacketIn {
                dpid,
                in_port,
                buffer_id,
                payload,
            } => self.packet_in(dpid, in_port, buffer_id, payload).await,
            Event::SwitchStateChanged { dpid, state } => {
                self.switch_state_changed(dpid, state).await
            }
        }
    }
}
