// Services - business operations behind the HTTP layer

pub mod field_service;

pub use field_service::FieldService;
