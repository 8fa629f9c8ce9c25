// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Job adapters: lift closures and plain values into the [`Job`](crate::traits::Job)
//! contract, rename existing instances, and wrap instances with tracing.

mod wrapping;

pub use wrapping::{FnJob, NamedJob, ParameterSpec, TracedJob, ValueJob};
