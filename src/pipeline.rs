// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! Stateful contexts and the transactions that mutate them. */

mod context;
mod transaction;

pub use context::StatefulContext;
pub use transaction::PipelineStateTransaction;
