pub mod forecast;
pub mod regressor;
