//! Presentation Layer
//!
//! HTTP handlers, DTOs and the router for the verification API.

pub mod dto;
pub mod handlers;
pub mod router;
