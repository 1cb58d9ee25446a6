use std::collections::HashMap;

use crate::{DatapathId, SwitchHandle};

/// Tracks which switches are currently connected and holds their command
/// handles. A miss is an ordinary `None`: it means "switch already gone,
/// drop the action", never a fatal condition.
#[derive(Debug, Default)]
pub struct SwitchRegistry {
    switches: HashMap<DatapathId, SwitchHandle>,
}

impl SwitchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or re-register) a switch. A reconnect overwrites the stale
    /// handle with the fresh one.
    pub fn register(&mut self, dpid: DatapathId, handle: SwitchHandle) {
        self.switches.insert(dpid, handle);
    }

    /// Drop the handle for a switch. Returns it so the caller can observe
    /// the removal; the reference is usually just dropped.
    pub fn remove(&mut self, dpid: DatapathId) -> Option<SwitchHandle> {
        self.switches.remove(&dpid)
    }

    pub fn lookup(&self, dpid: DatapathId) -> Option<&SwitchHandle> {
        self.switches.get(&dpid)
    }

    pub fn is_registered(&self, dpid: DatapathId) -> bool {
        self.switches.contains_key(&dpid)
    }

    pub fn len(&self) -> usize {
        self.switches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.switches.is_empty()
    }
}
