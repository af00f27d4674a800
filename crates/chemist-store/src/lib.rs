// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! State store for the chemist control-plane ledger: bounded history
//! buffers and the four target/flask indices collapsed into one owner
//! struct.

mod inner;
mod ring_buffer;
mod state_change;

pub use inner::RepositoryInner;
pub use ring_buffer::RingBuffer;
pub use state_change::StateChange;
