// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! gaze_trail renders a translucent, decaying trail that follows a stream of gaze (or
pointer) samples.

The crate has three layers:

| Layer                 | Module                      | What it does                                                        |
|-----------------------|-----------------------------|---------------------------------------------------------------------|
| Pipeline transactions | [`pipeline`], [`bindings`]  | Mutate a stateful binding-style context and put everything back     |
| Gaze smoothing        | [`images::gaze`]            | Turn raw samples into a short queue of interpolated points          |
| Feedback compositing  | [`images`]                  | Decay and stamp an accumulation surface, then tint it onto the frame |

# Pipeline transactions

Binding-style graphics APIs keep one global pipeline state per context.  Drawing an
overlay into somebody else's context means changing a lot of that state, and leaving
any of it changed breaks the host's next draw.  A
[`PipelineStateTransaction`](pipeline::PipelineStateTransaction) captures each binding
category the first time it is touched and restores all of them, in pipeline order,
when it goes out of scope.

# Feedback compositing

Each frame the [`FeedbackCompositor`](images::FeedbackCompositor) draws the previous
accumulation, decayed, into the other half of a ping-pong pair, stamping the current
gaze point in as it goes.  The fresh accumulation is then mapped through a shape strip
and composited onto the swap chain's back buffer.

# Backend

The crate ships a CPU backend ([`Device`], [`Context`], [`SwapChain`]) that behaves
like an immediate-mode device API.  It runs anywhere, which makes the whole pipeline
testable and lets the demo write frames to disk.
*/

pub mod bindings;
pub mod images;
mod imp;
pub mod pipeline;
pub mod pixel_formats;

pub use imp::{Context, Device, Error, Frame, MappedWrite, PresentMode, PresentStatus, SwapChain};

/// Objects created by a [`Device`].
pub mod resources {
    pub use crate::imp::resources::*;
}
