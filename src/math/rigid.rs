use nalgebra::{Matrix3, Matrix4, Rotation3, Translation3, Vector3, Vector4};

// ---------------------------------------------------------------------------
// 4x4 rigid-transform helpers (rotation block + translation column)
// ---------------------------------------------------------------------------

pub fn rotation_x(angle: f64) -> Matrix4<f64> {
    Rotation3::from_axis_angle(&Vector3::x_axis(), angle).to_homogeneous()
}

pub fn rotation_y(angle: f64) -> Matrix4<f64> {
    Rotation3::from_axis_angle(&Vector3::y_axis(), angle).to_homogeneous()
}

pub fn rotation_z(angle: f64) -> Matrix4<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), angle).to_homogeneous()
}

pub fn translation(v: &Vector3<f64>) -> Matrix4<f64> {
    Translation3::from(*v).to_homogeneous()
}

/// Upper-left 3x3 block.
pub fn rotation_part(m: &Matrix4<f64>) -> Matrix3<f64> {
    m.fixed_view::<3, 3>(0, 0).into_owned()
}

pub fn translation_part(m: &Matrix4<f64>) -> Vector3<f64> {
    Vector3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)])
}

pub fn set_rotation_part(m: &mut Matrix4<f64>, r: &Matrix3<f64>) {
    m.fixed_view_mut::<3, 3>(0, 0).copy_from(r);
}

pub fn set_translation_part(m: &mut Matrix4<f64>, t: &Vector3<f64>) {
    m[(0, 3)] = t.x;
    m[(1, 3)] = t.y;
    m[(2, 3)] = t.z;
}

/// Inverse of a rigid transform: transposed rotation, translation `-R^T t`.
pub fn rigid_inverse(m: &Matrix4<f64>) -> Matrix4<f64> {
    let rt = rotation_part(m).transpose();
    let t = -(rt * translation_part(m));
    let mut inv = Matrix4::identity();
    set_rotation_part(&mut inv, &rt);
    set_translation_part(&mut inv, &t);
    inv
}

pub fn transform_point(m: &Matrix4<f64>, p: &Vector3<f64>) -> Vector3<f64> {
    let h = m * Vector4::new(p.x, p.y, p.z, 1.0);
    Vector3::new(h.x, h.y, h.z)
}

/// Rotation only: vectors carry no translation.
pub fn transform_vector(m: &Matrix4<f64>, v: &Vector3<f64>) -> Vector3<f64> {
    rotation_part(m) * v
}
