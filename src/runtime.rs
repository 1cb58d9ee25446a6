use std::fs;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{command, Parser};
use log::{debug, warn};
use smallvec::SmallVec;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::{Controller, ControllerConfig, Event, EventSink, LivenessTask};

const EVENT_BATCH_SIZE: usize = 32;

#[derive(Parser)]
#[command(about, long_about = None)]
struct ControllerArgs {
    /// toml config file with the controller tunables
    #[arg(short, long)]
    toml: Option<String>,
}

/// Parse the toml config file to get the controller config.
/// The toml file should be like:
/// ```toml
/// flow_idle_timeout_secs = 30
/// liveness_period_secs = 10
/// ```
/// Missing keys keep their defaults.
fn parse_toml_config_file(path: &str) -> anyhow::Result<ControllerConfig> {
    let file_content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {path}"))?;
    let table: toml::Table = toml::from_str(&file_content)?;

    let mut config = ControllerConfig::default();
    if let Some(value) = table.get("flow_idle_timeout_secs") {
        config.flow_idle_timeout_secs = value
            .as_integer()
            .context("flow_idle_timeout_secs must be an integer")?
            as u64;
    }
    if let Some(value) = table.get("liveness_period_secs") {
        config.liveness_period_secs = value
            .as_integer()
            .context("liveness_period_secs must be an integer")?
            as u64;
    }
    Ok(config)
}

/// Clonable sender half of the event stream. The protocol adapter pushes
/// events through this; delivery into the stream is fire-and-forget.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: UnboundedSender<Event>,
}

impl EventSender {
    pub fn send(&self, event: Event) {
        if self.sender.send(event).is_err() {
            warn!("dropping event: controller runtime already stopped");
        }
    }
}

/// Owns the single event-processing stream. All registry and table
/// mutation happens inside the one task spawned here, which consumes
/// events strictly in arrival order.
pub struct ControllerRuntime {
    events: EventSender,
    event_loop: JoinHandle<Controller>,
    liveness: LivenessTask,
    shutdown: Arc<Notify>,
}

impl ControllerRuntime {
    pub fn start(config: ControllerConfig) -> Self {
        let (sender, receiver) = unbounded_channel();
        let shutdown = Arc::new(Notify::new());
        let liveness = LivenessTask::spawn(Duration::from_secs(config.liveness_period_secs));
        let controller = Controller::new(config);
        let event_loop = tokio::spawn(event_loop(controller, receiver, shutdown.clone()));
        Self {
            events: EventSender { sender },
            event_loop,
            liveness,
            shutdown,
        }
    }

    /// Entry point for an embedding binary: read the config file named on
    /// the command line (defaults when absent) and start.
    pub fn from_args() -> anyhow::Result<Self> {
        let args = ControllerArgs::parse();
        let config = match args.toml {
            Some(path) => parse_toml_config_file(&path)?,
            None => ControllerConfig::default(),
        };
        Ok(Self::start(config))
    }

    pub fn event_sender(&self) -> EventSender {
        self.events.clone()
    }

    /// Stop the event loop and the liveness task, returning the final
    /// controller state for inspection.
    pub async fn shutdown(self) -> anyhow::Result<Controller> {
        self.shutdown.notify_one();
        let controller = self
            .event_loop
            .await
            .context("controller event loop panicked")?;
        self.liveness.shutdown().await;
        Ok(controller)
    }
}

async fn event_loop(
    mut controller: Controller,
    mut receiver: UnboundedReceiver<Event>,
    shutdown: Arc<Notify>,
) -> Controller {
    loop {
        // Biased so queued events are always consumed before a pending
        // shutdown is observed.
        let first = tokio::select! {
            biased;
            maybe = receiver.recv() => match maybe {
                Some(event) => event,
                // All senders gone; nothing can arrive anymore.
                None => break,
            },
            _ = shutdown.notified() => break,
        };

        // Drain whatever else is already queued and process the batch in
        // order before sleeping again.
        let mut batch: SmallVec<[Event; EVENT_BATCH_SIZE]> = SmallVec::new();
        batch.push(first);
        while batch.len() < EVENT_BATCH_SIZE {
            match receiver.try_recv() {
                Ok(event) => batch.push(event),
                Err(_) => break,
            }
        }

        for event in batch {
            if let Err(err) = controller.handle_event(event).await {
                // Nothing in the core is fatal; keep consuming the stream.
                debug!("event handler error: {err:#}");
            }
        }
    }
    controller
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DatapathId, PortNo, SwitchCommand, SwitchHandle};

    fn eth_frame(dst: u8, src: u8) -> Vec<u8> {
        let mut frame = vec![0u8; 60];
        frame[5] = dst;
        frame[11] = src;
        frame[12] = 0x08;
        frame[13] = 0x00;
        frame
    }

    #[tokio::test]
    async fn runtime_serializes_events_and_shuts_down() {
        let runtime = ControllerRuntime::start(ControllerConfig::default());
        let events = runtime.event_sender();

        let dpid = DatapathId(0x17);
        let (handle, mut commands) = SwitchHandle::new_mock(dpid);
        events.send(Event::SwitchConnected { dpid, handle });
        events.send(Event::PacketIn {
            dpid,
            in_port: PortNo(1),
            buffer_id: None,
            payload: eth_frame(0xbb, 0xaa),
        });

        let controller = runtime.shutdown().await.unwrap();
        assert!(controller.registry().is_registered(dpid));
        assert_eq!(controller.table().learned_count(dpid), 1);

        // Baseline install then the flood packet-out, in issue order.
        assert!(matches!(
            commands.try_recv().unwrap(),
            SwitchCommand::InstallFlow(_)
        ));
        assert!(matches!(
            commands.try_recv().unwrap(),
            SwitchCommand::PacketOut { .. }
        ));
    }

    #[tokio::test]
    async fn send_after_shutdown_is_swallowed() {
        let runtime = ControllerRuntime::start(ControllerConfig::default());
        let events = runtime.event_sender();
        runtime.shutdown().await.unwrap();
        events.send(Event::SwitchDisconnected {
            dpid: DatapathId(1),
        });
    }

    #[test]
    fn config_file_overrides_and_defaults() {
        let dir = std::env::temp_dir();
        let path = dir.join("sdnctl_rs_config_test.toml");
        fs::write(&path, "flow_idle_timeout_secs = 5\n").unwrap();

        let config = parse_toml_config_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.flow_idle_timeout_secs, 5);
        assert_eq!(config.liveness_period_secs, 10);
        fs::remove_file(&path).ok();

        assert!(parse_toml_config_file("/nonexistent/sdnctl.toml").is_err());
    }
}
