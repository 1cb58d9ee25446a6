use log::warn;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::{DatapathId, FlowAction, FlowRule, PortNo, SwitchCommand};

/// Sender half of one switch's command channel. Owned by the registry while
/// the switch is connected and dropped on disconnect; the protocol layer
/// owns the receiver and encodes commands onto the wire.
#[derive(Debug, Clone)]
pub struct SwitchHandle {
    dpid: DatapathId,
    sender: UnboundedSender<SwitchCommand>,
}

impl SwitchHandle {
    pub fn new(dpid: DatapathId, sender: UnboundedSender<SwitchCommand>) -> Self {
        Self { dpid, sender }
    }

    /// Handle backed by a fresh channel, returning the receiver. Used by
    /// tests and demos standing in for the protocol layer.
    pub fn new_mock(dpid: DatapathId) -> (Self, UnboundedReceiver<SwitchCommand>) {
        let (sender, receiver) = unbounded_channel();
        (Self::new(dpid, sender), receiver)
    }

    pub fn dpid(&self) -> DatapathId {
        self.dpid
    }

    pub fn install_flow(&self, rule: FlowRule) {
        self.send(SwitchCommand::InstallFlow(rule));
    }

    pub fn delete_flows(&self, above_priority: u16) {
        self.send(SwitchCommand::DeleteFlows { above_priority });
    }

    pub fn send_packet_out(
        &self,
        buffer_id: Option<u32>,
        payload: Option<Vec<u8>>,
        in_port: PortNo,
        actions: Vec<FlowAction>,
    ) {
        self.send(SwitchCommand::PacketOut {
            buffer_id,
            payload,
            in_port,
            actions,
        });
    }

    // Delivery is best effort. A closed channel means the protocol layer
    // already tore the connection down; the next packet-in for the same
    // flow retriggers the reactive path.
    fn send(&self, command: SwitchCommand) {
        if self.sender.send(command).is_err() {
            warn!(
                "dropping command for switch {dpid}: connection closed",
                dpid = self.dpid
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{OutputPort, FLUSH_PRIORITY_FLOOR};

    #[test]
    fn commands_arrive_in_order() {
        let (handle, mut receiver) = SwitchHandle::new_mock(DatapathId(1));
        handle.install_flow(FlowRule::baseline());
        handle.delete_flows(FLUSH_PRIORITY_FLOOR);
        handle.send_packet_out(
            Some(7),
            None,
            PortNo(2),
            vec![FlowAction::Output(OutputPort::Flood)],
        );

        assert_eq!(
            receiver.try_recv().unwrap(),
            SwitchCommand::InstallFlow(FlowRule::baseline())
        );
        assert_eq!(
            receiver.try_recv().unwrap(),
            SwitchCommand::DeleteFlows {
                above_priority: FLUSH_PRIORITY_FLOOR
            }
        );
        assert_eq!(
            receiver.try_recv().unwrap(),
            SwitchCommand::PacketOut {
                buffer_id: Some(7),
                payload: None,
                in_port: PortNo(2),
                actions: vec![FlowAction::Output(OutputPort::Flood)],
            }
        );
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn send_after_receiver_dropped_is_swallowed() {
        let (handle, receiver) = SwitchHandle::new_mock(DatapathId(1));
        drop(receiver);
        handle.install_flow(FlowRule::baseline());
    }
}
