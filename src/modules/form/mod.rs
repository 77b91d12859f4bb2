//! Contact form validation and submission.
//!
//! Validation runs per field on blur and for every required field on
//! submit. A valid form is handed to a [`FormSubmitter`] in the background;
//! the submit control stays disabled until the outcome arrives.

pub mod contact;
pub mod submitter;
pub mod validation;

pub use contact::{ContactForm, SubmissionState};
pub use submitter::{
    ClockDelay, FormSubmission, FormSubmitter, HttpSubmitter, SimulatedSubmitter, SubmitError,
};
pub use validation::{ErrorDisplay, FieldError, FieldKind, validate_field, validate_value};
