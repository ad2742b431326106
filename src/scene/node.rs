use nalgebra::{Matrix3, Matrix4, Vector3};

use super::ObjectId;
use crate::math::rigid;

// ---------------------------------------------------------------------------
// SceneNode: parent link, ordered children, local rigid transform
// ---------------------------------------------------------------------------

/// Transform-group state of one scene-graph node.
///
/// Every mutation of the local transform raises the dirty flag; the universe
/// clears it when it next re-derives the node's world transform.
#[derive(Debug, Clone)]
pub struct SceneNode {
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
    local: Matrix4<f64>,
    dirty: bool,
}

impl Default for SceneNode {
    fn default() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            local: Matrix4::identity(),
            dirty: true,
        }
    }
}

impl SceneNode {
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    pub fn children(&self) -> &[ObjectId] {
        &self.children
    }

    pub fn local(&self) -> &Matrix4<f64> {
        &self.local
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn translation(&self) -> Vector3<f64> {
        rigid::translation_part(&self.local)
    }

    pub fn rotation(&self) -> Matrix3<f64> {
        rigid::rotation_part(&self.local)
    }

    pub(crate) fn set_parent(&mut self, parent: Option<ObjectId>) {
        self.parent = parent;
        self.dirty = true;
    }

    pub(crate) fn add_child(&mut self, child: ObjectId) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub(crate) fn remove_child(&mut self, child: ObjectId) -> bool {
        let before = self.children.len();
        self.children.retain(|&c| c != child);
        self.children.len() != before
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    // -- compose-on-right operations --------------------------------------

    pub fn rotate_x(&mut self, angle: f64) {
        self.local *= rigid::rotation_x(angle);
        self.dirty = true;
    }

    pub fn rotate_y(&mut self, angle: f64) {
        self.local *= rigid::rotation_y(angle);
        self.dirty = true;
    }

    pub fn rotate_z(&mut self, angle: f64) {
        self.local *= rigid::rotation_z(angle);
        self.dirty = true;
    }

    /// Move along the node's own (rotated) axes.
    pub fn translate(&mut self, v: &Vector3<f64>) {
        self.local *= rigid::translation(v);
        self.dirty = true;
    }

    pub fn set_translation(&mut self, v: &Vector3<f64>) {
        rigid::set_translation_part(&mut self.local, v);
        self.dirty = true;
    }

    pub fn set_rotation(&mut self, r: &Matrix3<f64>) {
        rigid::set_rotation_part(&mut self.local, r);
        self.dirty = true;
    }

    /// Rotation block from three column vectors (the node's axes in parent coordinates).
    pub fn set_columns(&mut self, x: &Vector3<f64>, y: &Vector3<f64>, z: &Vector3<f64>) {
        self.set_rotation(&Matrix3::from_columns(&[*x, *y, *z]));
    }

    pub fn reset(&mut self) {
        self.local = Matrix4::identity();
        self.dirty = true;
    }
}
