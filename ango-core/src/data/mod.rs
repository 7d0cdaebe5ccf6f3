pub mod message_repository;
pub mod post_repository;
pub mod profile_repository;
pub mod prompt_model;
