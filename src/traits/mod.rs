// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod job;

pub use job::{DataMap, Job, JobInputs, TASK_INPUT_KEY};
