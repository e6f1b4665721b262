// Test modules for all components
pub mod fixtures;
pub mod test_config;
pub mod test_env;
pub mod test_trainer;
