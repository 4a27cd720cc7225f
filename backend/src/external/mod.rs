//! Clients for external services

pub mod document_processor;
