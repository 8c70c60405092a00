pub mod abi;
pub mod chain;
pub mod config;
pub mod enrich;
pub mod group;
pub mod onchain;
pub mod output;
pub mod ownership;
pub mod pipeline;
pub mod report;
pub mod snapshot;
pub mod sources;
pub mod tables;
pub mod vault;
