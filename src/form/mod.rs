//! Form input and its normalization into sections.
//!
//! The relay never knows the form schema at compile time. A submission is the
//! form's ordered item list plus the answers, and everything downstream works
//! on the generic [`Section`]/[`Row`] shape built here.

pub mod email;
pub mod model;
pub mod sections;

pub use email::{build_recipients, extract_email};
pub use model::{Answer, FormItem, FormStructure, ItemKind, ItemResponse, ResponseSet, SubmissionEvent};
pub use sections::{DEFAULT_SECTION_TITLE, Row, Section, UNTITLED_QUESTION, build_sections};
