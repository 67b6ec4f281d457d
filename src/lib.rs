// Library for tests to access modules

pub mod alerts;
pub mod autoheal;
pub mod config;
pub mod docker_repo;
pub mod error;
pub mod heal_worker;
pub mod metrics_repo;
pub mod models;
pub mod routes;
pub mod version;
pub mod worker;
