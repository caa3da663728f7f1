pub mod cql;
pub mod model;
pub mod query;
