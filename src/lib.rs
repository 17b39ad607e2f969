pub mod cleaners;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod profiles;
pub mod records;
pub mod report;
pub mod resolve;
pub mod store;
pub mod tabular;
