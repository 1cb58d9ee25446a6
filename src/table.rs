use std::collections::HashMap;

use hwaddr::HwAddr;

use crate::{DatapathId, PortNo};

/// Per-switch MAC learning table: "a frame from this MAC was last observed
/// entering on this port". Soft state; entries are only invalidated by
/// port-removed and disconnect events, never by elapsed time, so they may
/// lag behind rules that already idled out on the switch.
///
/// Owned by the controller's event loop. All operations are pure map
/// operations, which keeps the single-writer discipline trivial.
#[derive(Debug, Default)]
pub struct ForwardingTable {
    inner: HashMap<DatapathId, HashMap<HwAddr, PortNo>>,
}

impl ForwardingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure an (empty) inner map exists for a switch. Called on
    /// connect; a reconnect keeps whatever was already learned.
    pub fn ensure(&mut self, dpid: DatapathId) {
        self.inner.entry(dpid).or_default();
    }

    /// Record that `src` was seen entering `dpid` on `in_port`, overwriting
    /// any previous port unconditionally. Returns whether the address was
    /// new on this switch; callers only use that for logging.
    pub fn learn(&mut self, dpid: DatapathId, src: HwAddr, in_port: PortNo) -> bool {
        self.inner
            .entry(dpid)
            .or_default()
            .insert(src, in_port)
            .is_none()
    }

    pub fn lookup_output(&self, dpid: DatapathId, dst: HwAddr) -> Option<PortNo> {
        self.inner.get(&dpid)?.get(&dst).copied()
    }

    /// Drop every entry on `dpid` that pointed at `port`, returning the
    /// purged MACs so those sources get re-learned on their next frame.
    pub fn remove_by_port(&mut self, dpid: DatapathId, port: PortNo) -> Vec<HwAddr> {
        let Some(macs) = self.inner.get_mut(&dpid) else {
            return Vec::new();
        };
        let removed: Vec<HwAddr> = macs
            .iter()
            .filter(|(_, p)| **p == port)
            .map(|(mac, _)| *mac)
            .collect();
        for mac in &removed {
            macs.remove(mac);
        }
        removed
    }

    /// Remove the switch's whole inner map. Counterpart of the registry's
    /// disconnect path.
    pub fn clear(&mut self, dpid: DatapathId) {
        self.inner.remove(&dpid);
    }

    pub fn has_switch(&self, dpid: DatapathId) -> bool {
        self.inner.contains_key(&dpid)
    }

    pub fn learned_count(&self, dpid: DatapathId) -> usize {
        self.inner.get(&dpid).map_or(0, HashMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const S1: DatapathId = DatapathId(1);
    const S2: DatapathId = DatapathId(2);

    fn mac(last: u8) -> HwAddr {
        HwAddr::from([0x00, 0x00, 0x00, 0x00, 0x00, last])
    }

    #[test]
    fn most_recent_observation_wins() {
        let mut table = ForwardingTable::new();
        assert!(table.learn(S1, mac(0xaa), PortNo(1)));
        assert!(!table.learn(S1, mac(0xaa), PortNo(2)));
        assert_eq!(table.lookup_output(S1, mac(0xaa)), Some(PortNo(2)));
    }

    #[test]
    fn entries_do_not_span_switches() {
        let mut table = ForwardingTable::new();
        table.learn(S1, mac(0xaa), PortNo(1));
        assert_eq!(table.lookup_output(S2, mac(0xaa)), None);
        // The same address learned independently on another switch is new there.
        assert!(table.learn(S2, mac(0xaa), PortNo(3)));
    }

    #[test]
    fn remove_by_port_purges_exactly_the_matching_entries() {
        let mut table = ForwardingTable::new();
        table.learn(S1, mac(0xaa), PortNo(1));
        table.learn(S1, mac(0xbb), PortNo(2));
        table.learn(S1, mac(0xcc), PortNo(1));

        let mut removed = table.remove_by_port(S1, PortNo(1));
        removed.sort_by_key(|m| m.octets());
        assert_eq!(removed, vec![mac(0xaa), mac(0xcc)]);
        assert_eq!(table.lookup_output(S1, mac(0xaa)), None);
        assert_eq!(table.lookup_output(S1, mac(0xbb)), Some(PortNo(2)));

        // Duplicate removal finds nothing left.
        assert!(table.remove_by_port(S1, PortNo(1)).is_empty());
    }

    #[test]
    fn remove_by_port_on_unknown_switch_is_a_noop() {
        let mut table = ForwardingTable::new();
        assert!(table.remove_by_port(S1, PortNo(1)).is_empty());
    }

    #[test]
    fn clear_drops_the_whole_switch_map() {
        let mut table = ForwardingTable::new();
        table.learn(S1, mac(0xaa), PortNo(1));
        table.learn(S2, mac(0xbb), PortNo(1));

        table.clear(S1);
        assert!(!table.has_switch(S1));
        assert_eq!(table.lookup_output(S1, mac(0xaa)), None);
        assert_eq!(table.lookup_output(S2, mac(0xbb)), Some(PortNo(1)));
    }

    #[test]
    fn ensure_preserves_learned_entries() {
        let mut table = ForwardingTable::new();
        table.learn(S1, mac(0xaa), PortNo(1));
        table.ensure(S1);
        assert_eq!(table.lookup_output(S1, mac(0xaa)), Some(PortNo(1)));
        assert_eq!(table.learned_count(S1), 1);
    }
}
