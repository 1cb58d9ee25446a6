//! Drives the controller with a scripted protocol adapter: two hosts on one
//! switch exchange frames, then the port of the first host fails and the
//! host shows up again on another port.
//!
//! Run with `RUST_LOG=info cargo run --example reactive_failover`.

use hwaddr::HwAddr;
use sdnctl_rs::{ControllerRuntime, DatapathId, Event, PortNo, SwitchCommand, SwitchHandle};
use tokio::sync::mpsc::UnboundedReceiver;

fn host_a() -> HwAddr {
    HwAddr::from([0x02, 0x00, 0x00, 0x00, 0x00, 0xaa])
}

fn host_b() -> HwAddr {
    HwAddr::from([0x02, 0x00, 0x00, 0x00, 0x00, 0xbb])
}

fn eth_frame(dst: HwAddr, src: HwAddr) -> Vec<u8> {
    let mut frame = Vec::with_capacity(60);
    frame.extend_from_slice(&dst.octets());
    frame.extend_from_slice(&src.octets());
    frame.extend_from_slice(&0x0800u16.to_be_bytes());
    frame.extend_from_slice(&[0u8; 46]);
    frame
}

async fn print_commands(dpid: DatapathId, mut commands: UnboundedReceiver<SwitchCommand>) {
    while let Some(command) = commands.recv().await {
        match command {
            SwitchCommand::InstallFlow(rule) => {
                println!("switch {dpid}: install priority {} flow {:?}", rule.priority, rule.matching)
            }
            SwitchCommand::DeleteFlows { above_priority } => {
                println!("switch {dpid}: flush flows at priority >= {above_priority}")
            }
            SwitchCommand::PacketOut { actions, .. } => {
                println!("switch {dpid}: packet-out via {:?}", actions)
            }
        }
    }
}

fn packet_in(dpid: DatapathId, in_port: PortNo, dst: HwAddr, src: HwAddr) -> Event {
    Event::PacketIn {
        dpid,
        in_port,
        buffer_id: None,
        payload: eth_frame(dst, src),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let runtime = ControllerRuntime::from_args()?;
    let events = runtime.event_sender();

    let s1 = DatapathId(0x1);
    let (handle, commands) = SwitchHandle::new_mock(s1);
    let printer = tokio::spawn(print_commands(s1, commands));

    events.send(Event::SwitchConnected { dpid: s1, handle });

    // A -> B: B unknown, flood. B -> A: A known, unicast rule installed.
    events.send(packet_in(s1, PortNo(1), host_b(), host_a()));
    events.send(packet_in(s1, PortNo(2), host_a(), host_b()));

    // Port 1 dies; A's entry is purged and reactive rules are flushed.
    events.send(Event::PortRemoved {
        dpid: s1,
        port: PortNo(1),
    });

    // A re-appears through the surviving path and is re-learned.
    events.send(packet_in(s1, PortNo(3), host_b(), host_a()));

    let controller = runtime.shutdown().await?;
    println!(
        "learned {} addresses on switch {s1}",
        controller.table().learned_count(s1)
    );

    // Dropping the controller drops the switch handle and ends the printer.
    drop(controller);
    printer.await?;
    Ok(())
}
