pub mod app;
pub mod calendar;
pub mod config;
pub mod epoch;
pub mod error;
pub mod forecaster;
pub mod models;
pub mod perturbation;
pub mod routes;
