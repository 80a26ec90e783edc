//! Patient users and medical profiles.
//!
//! This crate holds the two resources served over HTTP: their record types,
//! the validation applied to create and update requests, and the storage
//! interfaces the server implements.

pub mod error;
pub mod patient;
pub mod profile;
pub mod store;

pub use error::ValidationError;
pub use patient::{AgeGroup, Gender, NewPatient, Patient, PatientChanges, PatientInput};
pub use profile::{NewProfile, Profile, ProfileChanges, ProfileInput};
pub use store::{InMemoryPatientStore, InMemoryProfileStore, PatientStore, ProfileStore};
