//! Request extractors.

pub mod submission;

pub use submission::{FormSubmission, IMAGE_FIELD};
