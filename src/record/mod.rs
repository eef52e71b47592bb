//! Record types flowing from the row parser into the store
//!
//! # Components
//!
//! - `CandidateRecord`: one parsed row, not yet persisted, without identity
//! - `WantedPerson`: a stored entity with a generated id and creation time

mod candidate;
mod wanted_person;

pub use candidate::CandidateRecord;
pub use wanted_person::WantedPerson;
