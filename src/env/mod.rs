pub mod binder;
pub mod interpolator;
pub mod resolver;
pub mod store;
