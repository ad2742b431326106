use crate::math::AzElRange;

use super::regard::{in_regard, FieldOfRegard};

/// Passive focal-plane sensor carried by a gimbal.
///
/// The sensor frame coincides with the gimbal frame: boresight -Z, +Y up,
/// +X right.
#[derive(Debug, Clone, PartialEq)]
pub struct ElectroOpticalSensor {
    height: u32, // pixels
    width: u32,  // pixels
    y_fov: f64,  // deg
    x_fov: f64,  // deg
    y_ifov: f64, // deg per pixel
    x_ifov: f64, // deg per pixel
    field_of_regard: Vec<FieldOfRegard>,
}

impl ElectroOpticalSensor {
    pub fn new(height: u32, width: u32, y_fov: f64, x_fov: f64, field_of_regard: Vec<FieldOfRegard>) -> Self {
        Self {
            height,
            width,
            y_fov,
            x_fov,
            y_ifov: y_fov / height.max(1) as f64,
            x_ifov: x_fov / width.max(1) as f64,
            field_of_regard,
        }
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn y_fov(&self) -> f64 {
        self.y_fov
    }

    pub fn x_fov(&self) -> f64 {
        self.x_fov
    }

    /// Instantaneous field of view `(x, y)`, deg per pixel.
    pub fn ifov(&self) -> (f64, f64) {
        (self.x_ifov, self.y_ifov)
    }

    pub fn field_of_regard(&self) -> &[FieldOfRegard] {
        &self.field_of_regard
    }

    /// Site look angles inside any field-of-regard entry.
    pub fn in_regard(&self, look: &AzElRange) -> bool {
        in_regard(&self.field_of_regard, look)
    }

    /// Off-boresight look inside the instantaneous frame.
    pub fn in_field_of_view(&self, boresight: &AzElRange, look: &AzElRange) -> bool {
        let mut daz = (look.az - boresight.az + 180.0).rem_euclid(360.0) - 180.0;
        daz *= boresight.el.to_radians().cos();
        let del = look.el - boresight.el;
        daz.abs() < 0.5 * self.x_fov && del.abs() < 0.5 * self.y_fov
    }
}
