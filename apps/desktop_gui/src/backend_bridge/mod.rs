//! Bridge between the UI thread and the async runtime that runs submissions.

pub mod runtime;
