//! Vectors and matrices over the integers and over groups.

mod gauss;
mod group_vector;
mod matrix;
mod vector;

pub use gauss::gaussian_elimination;
pub use group_vector::{GroupVector, VectorEc, VectorG1, VectorG2, VectorGt};
pub use matrix::Matrix;
pub use vector::Vector;
