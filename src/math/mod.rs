pub mod matrix;
pub mod roots;
pub mod vector;

pub use matrix::Matrix;
pub use vector::{is_equal, is_greater, is_less, is_zero, Color, Point3, Vec2, Vec3, Vec4, VERY_LARGE, VERY_SMALL};
