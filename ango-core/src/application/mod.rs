pub mod assistant;
pub mod dm_channel;
pub mod feed_service;
pub mod profile_resolver;
pub mod wizard;
