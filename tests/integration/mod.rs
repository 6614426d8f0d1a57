//! Integration tests for scoped context propagation


mod config_loading;
mod dynamic_options;
