// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod builder;
mod dependency_graph;

pub use builder::{JobGraph, JobNode};
pub use dependency_graph::DependencyGraph;
