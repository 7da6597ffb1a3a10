//! Math utilities and types
//!
//! Provides the fundamental math types used for model transforms and GPU uploads.

pub use nalgebra::{
    Vector3, Vector4,
    Matrix4,
    Unit,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a rotation matrix around the Y axis
    fn rotation_y(angle: f32) -> Mat4;

    /// Create a rotation matrix around the Z axis
    fn rotation_z(angle: f32) -> Mat4;

    /// Create a rotation matrix around an arbitrary axis (need not be normalized)
    fn rotation_axis(axis: &Vec3, angle: f32) -> Mat4;

    /// Column-major element array, the layout uniform blocks expect
    fn to_column_array(&self) -> [f32; 16];
}

impl Mat4Ext for Mat4 {
    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn rotation_z(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::z_axis(), angle)
    }

    fn rotation_axis(axis: &Vec3, angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Unit::new_normalize(*axis), angle)
    }

    fn to_column_array(&self) -> [f32; 16] {
        let mut out = [0.0; 16];
        out.copy_from_slice(self.as_slice());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rotation_y_quarter_turn() {
        let rotation = Mat4::rotation_y(utils::deg_to_rad(90.0));
        let rotated = rotation.transform_vector(&Vec3::new(1.0, 0.0, 0.0));

        // Right-handed: +X rotates onto -Z
        assert_relative_eq!(rotated, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_rotation_axis_normalizes() {
        let a = Mat4::rotation_axis(&Vec3::new(0.0, 5.0, 0.0), 0.3);
        let b = Mat4::rotation_y(0.3);
        assert_relative_eq!(a, b, epsilon = 1e-6);
    }

    #[test]
    fn test_column_array_layout() {
        let m = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
        let cols = m.to_column_array();
        assert_eq!(&cols[12..15], &[1.0, 2.0, 3.0]);
        assert_eq!(cols[15], 1.0);
    }

    #[test]
    fn test_degree_conversion() {
        assert_relative_eq!(utils::deg_to_rad(180.0), constants::PI);
        assert_relative_eq!(utils::deg_to_rad(-45.0), -constants::PI / 4.0);
    }
}
