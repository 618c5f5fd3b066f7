pub mod oracle;

pub use oracle::{BoxFace, ElementId, RayHit, RayHitOracle};
