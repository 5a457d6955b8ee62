//! Low-level numeric kernels used by the columnar engine.

pub mod simd_helpers;
