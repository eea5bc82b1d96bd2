pub mod admin_dto;
pub mod application_dto;
pub mod auth_dto;
pub mod jaf_dto;
pub mod verification_dto;
