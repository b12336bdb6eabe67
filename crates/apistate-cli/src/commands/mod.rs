pub mod check_config;
pub mod denormalize;
pub mod normalize;
