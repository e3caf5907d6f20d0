// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Defines binding types */

pub mod category;
pub mod dirty_tracking;
pub mod handle;
pub mod snapshot;
pub mod state;

pub use category::{BindingCategory, RESTORE_ORDER, Stage};
pub use handle::ResourceHandle;
