use std::f64::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use crate::math::AzElRange;
use crate::scene::{ObjectId, SceneNode};

/// How a gimbal chooses its pointing each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackMode {
    /// Hold the last commanded angles.
    #[default]
    Fixed,
    /// Follow the track object.
    Rate,
    /// Reserved; angles are left untouched.
    Sidereal,
}

/// Mount geometry of a gimbal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GimbalType {
    #[default]
    AzEl,
}

/// Azimuth over elevation mount on a South-East-Zenith site.
///
/// The gimbal frame has its boresight along -Z and +Y up; at zero angles the
/// boresight points north along the horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct AzElGimbal {
    mode: TrackMode,
    target: Option<ObjectId>,
    az: f64,              // deg
    el: f64,              // deg
    range: Option<f64>,   // m, while tracking
    default_range: f64,   // m
}

impl AzElGimbal {
    pub fn new(default_range: f64) -> Self {
        Self {
            mode: TrackMode::Fixed,
            target: None,
            az: 0.0,
            el: 0.0,
            range: None,
            default_range,
        }
    }

    pub fn track_mode(&self) -> TrackMode {
        self.mode
    }

    pub fn set_track_mode(&mut self, mode: TrackMode) {
        self.mode = mode;
        if mode != TrackMode::Rate {
            self.range = None;
        }
    }

    pub fn track_object(&self) -> Option<ObjectId> {
        self.target
    }

    /// Unchecked; the universe validates the target against the hierarchy.
    pub(crate) fn set_track_object(&mut self, target: Option<ObjectId>) {
        self.target = target;
        if target.is_none() {
            self.range = None;
        }
    }

    pub fn az(&self) -> f64 {
        self.az
    }

    pub fn el(&self) -> f64 {
        self.el
    }

    /// Slant range to the target while rate tracking, else the default.
    pub fn range(&self) -> f64 {
        match (self.mode, self.range) {
            (TrackMode::Rate, Some(range)) => range,
            _ => self.default_range,
        }
    }

    pub fn look(&self) -> AzElRange {
        AzElRange { az: self.az, el: self.el, range: self.range() }
    }

    /// Command the mount directly, degrees.
    pub fn set_angles(&mut self, az: f64, el: f64) {
        self.az = az.rem_euclid(360.0);
        self.el = el.clamp(-90.0, 90.0);
    }

    pub(crate) fn point(&mut self, look: &AzElRange) {
        self.az = look.az;
        self.el = look.el;
        self.range = Some(look.range);
    }

    /// Write the mount rotation into the gimbal's node.
    pub fn compose(&self, node: &mut SceneNode) {
        node.reset();
        node.rotate_y(FRAC_PI_2);
        node.rotate_z(FRAC_PI_2);
        node.rotate_y(-self.az.to_radians());
        node.rotate_x(self.el.to_radians());
    }
}
