use std::fmt;

/// Identifier assigned to a switch by the protocol layer at connect time.
/// Stable for the lifetime of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatapathId(pub u64);

impl fmt::Display for DatapathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Port number, unique within a single switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortNo(pub u32);

impl fmt::Display for PortNo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Output target of a forwarding decision. `Flood` and `Controller` are
/// reserved pseudo-ports whose concrete values belong to the protocol layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPort {
    Port(PortNo),
    Flood,
    Controller,
}

impl fmt::Display for OutputPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputPort::Port(port) => write!(f, "{}", port),
            OutputPort::Flood => write!(f, "flood"),
            OutputPort::Controller => write!(f, "controller"),
        }
    }
}
