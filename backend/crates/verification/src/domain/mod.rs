//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (VerificationChallenge, Identity)
//! - Domain value objects (Email, CodeLength, VerificationCode)
//! - Domain services (code generation, mail composition, mailer port)
//! - Repository traits (interfaces)

pub mod entities;
pub mod repository;
pub mod services;
pub mod value_objects;
