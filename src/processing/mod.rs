// SPDX-License-Identifier: GPL-3.0-only

//! Frame transforms: color filters, numeric adjustments, overlay

pub mod adjust;
pub mod colorspace;
pub mod filter;
pub mod overlay;

pub use adjust::apply_adjustments;
pub use filter::apply_filters;
