//! Audio-driven icosphere: static geometry plus per-frame animation state.

mod animator;
mod mesh;

pub use animator::{model_matrix, MeshAnimator, SphereUniforms, HUE_EPSILON};
pub use mesh::{SphereMesh, SphereVertex};
