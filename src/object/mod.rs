//! Simulation objects: a scene node plus the state every kind shares.

use std::any::Any;
use std::fmt;

use nalgebra::{Matrix4, Vector3};
use serde::{Deserialize, Serialize};

use crate::bodies::Earth;
use crate::math::JulianDate;
use crate::orbital::Propagator;
use crate::scene::{ObjectId, ReferenceFrame, SceneNode};
use crate::sensor::{AzElGimbal, ElectroOpticalSensor, GroundStation};
use crate::sim::Universe;

/// Called after an object finishes updating.
pub type UpdateListener = Box<dyn FnMut(&Universe, ObjectId, &JulianDate)>;

/// Attitude rule for satellite nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Node axes stay aligned with the inertial axes.
    #[default]
    Fixed,
    /// +X along velocity, +Z toward the Earth's centre.
    Nadir,
}

/// What an object is and how it refreshes each tick.
pub enum Kind {
    Earth(Earth),
    Sun,
    GroundStation(GroundStation),
    Satellite {
        propagator: Box<dyn Propagator>,
        orientation: Orientation,
    },
    Gimbal(AzElGimbal),
    Sensor(ElectroOpticalSensor),
    /// Plain transform group; keeps whatever position it was given.
    Group,
}

impl Kind {
    pub fn label(&self) -> &'static str {
        match self {
            Kind::Earth(_) => "earth",
            Kind::Sun => "sun",
            Kind::GroundStation(_) => "ground-station",
            Kind::Satellite { .. } => "satellite",
            Kind::Gimbal(_) => "gimbal",
            Kind::Sensor(_) => "sensor",
            Kind::Group => "group",
        }
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Satellite { propagator, orientation } => f
                .debug_struct("Satellite")
                .field("propagator", &propagator.name())
                .field("orientation", orientation)
                .finish(),
            other => f.write_str(other.label()),
        }
    }
}

/// A node in the simulated scene.
pub struct SimObject {
    name: String,
    frame: Option<ReferenceFrame>,
    pub(crate) node: SceneNode,
    pub(crate) position: Vector3<f64>, // m, in the resolved frame
    pub(crate) velocity: Vector3<f64>, // m/s
    pub(crate) time: Option<JulianDate>,
    pub(crate) listeners: Vec<UpdateListener>,
    pub(crate) kind: Kind,
    /// Opaque slot for a renderer; the kernel never reads it.
    pub visualizer: Option<Box<dyn Any>>,
}

impl SimObject {
    pub fn new(name: &str, frame: Option<ReferenceFrame>, kind: Kind) -> Self {
        Self {
            name: name.to_string(),
            frame,
            node: SceneNode::default(),
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
            time: None,
            listeners: Vec::new(),
            kind,
            visualizer: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Frame declared on this node, without ancestor resolution.
    pub fn declared_frame(&self) -> Option<ReferenceFrame> {
        self.frame
    }

    pub fn node(&self) -> &SceneNode {
        &self.node
    }

    pub fn node_mut(&mut self) -> &mut SceneNode {
        &mut self.node
    }

    pub fn position(&self) -> &Vector3<f64> {
        &self.position
    }

    pub fn velocity(&self) -> &Vector3<f64> {
        &self.velocity
    }

    /// Set the state of a group node; other kinds overwrite it on update.
    pub fn set_state(&mut self, position: Vector3<f64>, velocity: Vector3<f64>) {
        self.position = position;
        self.velocity = velocity;
        self.node.set_translation(&position);
    }

    /// Time of the last update, `None` before the first.
    pub fn time(&self) -> Option<&JulianDate> {
        self.time.as_ref()
    }

    pub fn local_transform(&self) -> &Matrix4<f64> {
        self.node.local()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn earth(&self) -> Option<&Earth> {
        match &self.kind {
            Kind::Earth(e) => Some(e),
            _ => None,
        }
    }

    pub fn ground_station(&self) -> Option<&GroundStation> {
        match &self.kind {
            Kind::GroundStation(g) => Some(g),
            _ => None,
        }
    }

    pub fn gimbal(&self) -> Option<&AzElGimbal> {
        match &self.kind {
            Kind::Gimbal(g) => Some(g),
            _ => None,
        }
    }

    pub(crate) fn gimbal_mut(&mut self) -> Option<&mut AzElGimbal> {
        match &mut self.kind {
            Kind::Gimbal(g) => Some(g),
            _ => None,
        }
    }

    pub fn sensor(&self) -> Option<&ElectroOpticalSensor> {
        match &self.kind {
            Kind::Sensor(s) => Some(s),
            _ => None,
        }
    }

    pub fn propagator(&self) -> Option<&dyn Propagator> {
        match &self.kind {
            Kind::Satellite { propagator, .. } => Some(&**propagator),
            _ => None,
        }
    }

    /// Period reported by the satellite's propagator, s.
    pub fn period(&self) -> Option<f64> {
        self.propagator().and_then(|p| p.period())
    }

    pub fn eccentricity(&self) -> Option<f64> {
        self.propagator().and_then(|p| p.eccentricity())
    }

    /// Refresh every kind that needs nothing outside this object.
    /// Gimbals are driven by the universe.
    pub(crate) fn refresh_local(&mut self, t: &JulianDate) {
        match &mut self.kind {
            Kind::Earth(earth) => {
                let r_fi = earth.update(t);
                self.node.set_rotation(&r_fi);
                self.position = Vector3::zeros();
                self.velocity = Vector3::zeros();
            }
            Kind::Sun => {
                self.position = crate::bodies::sun_position(t);
            }
            Kind::GroundStation(station) => {
                self.node.set_rotation(station.sez_basis());
                self.position = *station.ecef();
                self.velocity = Vector3::zeros();
            }
            Kind::Satellite { propagator, orientation } => {
                let (pos, vel) = propagator.propagate(t);
                self.position = pos;
                self.velocity = vel;
                if *orientation == Orientation::Nadir {
                    if let Some([x, y, z]) = nadir_axes(&pos, &vel) {
                        self.node.set_columns(&x, &y, &z);
                    }
                }
            }
            Kind::Gimbal(_) | Kind::Sensor(_) | Kind::Group => {}
        }
    }
}

impl fmt::Debug for SimObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimObject")
            .field("name", &self.name)
            .field("frame", &self.frame)
            .field("kind", &self.kind)
            .field("position", &self.position)
            .field("time", &self.time)
            .finish()
    }
}

/// Nadir-pointing body axes; `None` when position and velocity are degenerate.
pub fn nadir_axes(pos: &Vector3<f64>, vel: &Vector3<f64>) -> Option<[Vector3<f64>; 3]> {
    let z = -pos.try_normalize(f64::EPSILON)?;
    let y = z.cross(vel).try_normalize(f64::EPSILON)?;
    let x = y.cross(&z);
    Some([x, y, z])
}
