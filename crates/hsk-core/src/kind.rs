//! Component registry: every hydraulic node kind maps to a static
//! descriptor holding its default size, display defaults and canonical
//! socket layout.
//!
//! Socket anchors are stored as fractions of the node's width/height,
//! measured from the node centre (node-local coordinates are centred on
//! the origin, y pointing down).

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ─── Socket types ────────────────────────────────────────────────────────

/// Connection class of a socket. Only affects the rendered colour; any two
/// sockets may be linked regardless of type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SocketType {
    Orange,
    #[default]
    Green,
    Blue,
    Purple,
    Red,
    Yellow,
}

impl SocketType {
    pub const ALL: [SocketType; 6] = [
        SocketType::Orange,
        SocketType::Green,
        SocketType::Blue,
        SocketType::Purple,
        SocketType::Red,
        SocketType::Yellow,
    ];

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Fill colour for renderers, `#RRGGBB`.
    pub fn color_hex(self) -> &'static str {
        match self {
            SocketType::Orange => "#FF7700",
            SocketType::Green => "#52E220",
            SocketType::Blue => "#0056A6",
            SocketType::Purple => "#A86DB1",
            SocketType::Red => "#B54747",
            SocketType::Yellow => "#DBE220",
        }
    }
}

impl Serialize for SocketType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.index())
    }
}

impl<'de> Deserialize<'de> for SocketType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let index = u8::deserialize(deserializer)?;
        SocketType::from_index(index)
            .ok_or_else(|| serde::de::Error::custom(format!("socket_type {index} out of range 0..=5")))
    }
}

// ─── Descriptors ─────────────────────────────────────────────────────────

/// Relative anchor of one socket within a node's bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SocketAnchor {
    /// Horizontal offset from the centre, as a fraction of the width.
    pub fx: f64,
    /// Vertical offset from the centre, as a fraction of the height.
    pub fy: f64,
    pub socket_type: SocketType,
}

const fn anchor(fx: f64, fy: f64) -> SocketAnchor {
    SocketAnchor {
        fx,
        fy,
        socket_type: SocketType::Blue,
    }
}

/// Static per-kind defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeDescriptor {
    pub width: f64,
    pub height: f64,
    pub unit: &'static str,
    pub min: f64,
    pub max: f64,
    pub value: f64,
    pub text: &'static str,
    pub sockets: &'static [SocketAnchor],
}

const BASE: NodeDescriptor = NodeDescriptor {
    width: 500.0,
    height: 120.0,
    unit: " ",
    min: 0.0,
    max: 100.0,
    value: 0.0,
    text: "",
    sockets: &[],
};

const TOP: SocketAnchor = anchor(0.0, -0.5);
const BOTTOM: SocketAnchor = anchor(0.0, 0.5);
const THROUGH: &[SocketAnchor] = &[TOP, BOTTOM];
const SERVO: &[SocketAnchor] = &[
    anchor(0.05, 0.5),
    anchor(-0.05, 0.5),
    anchor(-0.05, -0.5),
    anchor(0.05, -0.5),
];
const PISTON: &[SocketAnchor] = &[anchor(-0.225, 0.5), anchor(0.225, 0.5)];
const RELIEF: &[SocketAnchor] = &[anchor(0.125, -0.5), anchor(0.125, 0.5)];

// ─── Node kinds ──────────────────────────────────────────────────────────

/// The closed set of component kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    PressureSensor,
    FlowMeter,
    Tank,
    SimpleTank,
    Gauge,
    ServoValve,
    PistonDual,
    PistonRight,
    PistonLeft,
    Pump,
    Filter,
    Accumulator,
    OneWayValve,
    ReliefValve,
    Text,
    /// Fallback for unknown kinds: a plain box without sockets.
    Generic,
}

impl NodeKind {
    /// Every placeable kind, in palette order.
    pub const ALL: [NodeKind; 15] = [
        NodeKind::PressureSensor,
        NodeKind::FlowMeter,
        NodeKind::Tank,
        NodeKind::SimpleTank,
        NodeKind::Gauge,
        NodeKind::ServoValve,
        NodeKind::PistonDual,
        NodeKind::PistonRight,
        NodeKind::PistonLeft,
        NodeKind::Pump,
        NodeKind::Filter,
        NodeKind::Accumulator,
        NodeKind::OneWayValve,
        NodeKind::ReliefValve,
        NodeKind::Text,
    ];

    /// Name used in saved files.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::PressureSensor => "pressure sensor",
            NodeKind::FlowMeter => "flow meter",
            NodeKind::Tank => "tank",
            NodeKind::SimpleTank => "simple tank",
            NodeKind::Gauge => "gauge",
            NodeKind::ServoValve => "servo valve",
            NodeKind::PistonDual => "piston dual",
            NodeKind::PistonRight => "piston right",
            NodeKind::PistonLeft => "piston left",
            NodeKind::Pump => "pump",
            NodeKind::Filter => "filter",
            NodeKind::Accumulator => "accumulator",
            NodeKind::OneWayValve => "one-way valve",
            NodeKind::ReliefValve => "relief valve",
            NodeKind::Text => "text",
            NodeKind::Generic => "generic",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        if name == "generic" {
            return Some(NodeKind::Generic);
        }
        Self::ALL.iter().copied().find(|k| k.as_str() == name)
    }

    pub fn descriptor(self) -> NodeDescriptor {
        match self {
            NodeKind::PressureSensor => NodeDescriptor {
                width: 250.0,
                height: 375.0,
                unit: "MPa",
                sockets: &[BOTTOM],
                ..BASE
            },
            NodeKind::FlowMeter => NodeDescriptor {
                width: 200.0,
                height: 400.0,
                unit: "mL",
                sockets: THROUGH,
                ..BASE
            },
            NodeKind::Tank => NodeDescriptor {
                width: 1000.0,
                height: 1000.0,
                unit: "cm",
                value: 20.0,
                sockets: &[TOP],
                ..BASE
            },
            NodeKind::SimpleTank => NodeDescriptor {
                width: 250.0,
                height: 125.0,
                unit: "cm",
                value: 50.0,
                sockets: &[TOP],
                ..BASE
            },
            NodeKind::Gauge => NodeDescriptor {
                width: 300.0,
                height: 600.0,
                unit: "MPa",
                max: 30.0,
                sockets: &[BOTTOM],
                ..BASE
            },
            NodeKind::ServoValve => NodeDescriptor {
                width: 2500.0,
                height: 625.0,
                unit: "mA",
                min: -100.0,
                sockets: SERVO,
                ..BASE
            },
            NodeKind::PistonDual | NodeKind::PistonRight | NodeKind::PistonLeft => NodeDescriptor {
                width: 5000.0,
                height: 625.0,
                unit: "cm",
                min: -100.0,
                sockets: PISTON,
                ..BASE
            },
            NodeKind::Pump => NodeDescriptor {
                width: 300.0,
                height: 600.0,
                unit: "L/min",
                sockets: THROUGH,
                ..BASE
            },
            NodeKind::Filter => NodeDescriptor {
                width: 200.0,
                height: 320.0,
                unit: "L/min",
                sockets: THROUGH,
                ..BASE
            },
            NodeKind::Accumulator => NodeDescriptor {
                width: 300.0,
                height: 750.0,
                unit: "mL",
                sockets: &[BOTTOM],
                ..BASE
            },
            NodeKind::OneWayValve => NodeDescriptor {
                width: 150.0,
                height: 300.0,
                unit: "mL",
                sockets: THROUGH,
                ..BASE
            },
            NodeKind::ReliefValve => NodeDescriptor {
                width: 500.0,
                height: 500.0,
                unit: "mL",
                sockets: RELIEF,
                ..BASE
            },
            // Width follows the text length, see `Node::size`.
            NodeKind::Text => NodeDescriptor {
                height: 100.0,
                unit: "",
                text: "Hello world!",
                ..BASE
            },
            NodeKind::Generic => BASE,
        }
    }
}

impl Serialize for NodeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(NodeKind::from_name(&name).unwrap_or_else(|| {
            log::warn!("unknown node type {name:?}, loading as generic box");
            NodeKind::Generic
        }))
    }
}
