// SPDX-License-Identifier: GPL-3.0-only

//! Guarded capture access and background loop supervision

pub mod guard;
pub mod task;

pub use guard::FrameGuard;
pub use task::{LoopAction, TaskController};
