//! Subject model (spec §3.1 / C1): the tagged union of identifier kinds
//! carried as a SET's `sub_id` claim.

mod error;
mod subject;

pub use error::SubjectError;
pub use subject::{ComplexSubject, Subject};
