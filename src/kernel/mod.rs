//! Gapped k-mer kernel construction and kernel functions

pub mod accumulator;
pub mod construct;
pub mod gmers;
pub mod linear;
pub mod matrix;
pub mod patterns;
pub mod precomputed;
pub mod rbf;
pub mod traits;

pub use self::construct::construct_kernel;
pub use self::gmers::GmerSet;
pub use self::linear::LinearKernel;
pub use self::matrix::{tri_index, triangular_len, ShardedTriMatrix, TriMatrix};
pub use self::patterns::{choose, enumerate_patterns, GapPattern};
pub use self::precomputed::PrecomputedKernel;
pub use self::rbf::RbfKernel;
pub use self::traits::Kernel;
