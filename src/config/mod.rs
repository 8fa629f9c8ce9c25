// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod factory;
mod loader;
mod validation;


pub use factory::{build_graphs, JobFactory, JobTypeRegistry};
pub use loader::{
    load_and_validate_config, load_config, load_config_from_str, GraphDefinition, JobConfig,
    NodeDefinition, ParameterSets, PipelineConfig,
};
pub use validation::validate_config;
