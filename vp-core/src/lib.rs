#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

/// Core domain models for the vendor pricing service.
///
/// This module contains the fundamental data structures that represent the domain entities.
///
/// The models in this module are primarily data structures with minimal business logic,
/// following the principles of the hexagonal architecture to separate domain entities
/// from their persistence and processing implementations. The exceptions are the pure
/// algorithms the domain is built around: UPC normalization and vendor feed detection.
pub mod models;

/// Interface traits for the vendor pricing service.
///
/// This module contains the "ports" in the hexagonal architecture pattern.
///
/// These traits define the contract between the domain logic and external adapters
/// (such as databases, APIs, or other services) without specifying implementation details.
/// This separation allows for easier testing and the ability to swap out infrastructure
/// components without affecting the core business logic.
pub mod ports;
