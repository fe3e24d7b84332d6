//! Concrete step choosers.
//!
//! | Tag               | Chooser            | Inputs                                   |
//! |-------------------|--------------------|------------------------------------------|
//! | `"Cfl"`           | [`Cfl`]            | local spacing, stability factor, speed   |
//! | `"GlobalCfl"`     | [`GlobalCfl`]      | reduced spacing, stability factor, speed |
//! | `"Maximum"`       | [`Maximum`]        | none                                     |
//! | `"LimitIncrease"` | [`LimitIncrease`]  | none                                     |
//!
//! Every chooser here is configured by a handful of scalars, carries no
//! other state, and implements [`Migratable`](tempo_chooser::Migratable).

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod cfl;
pub mod limit_increase;
pub mod maximum;

pub use cfl::{Cfl, GlobalCfl};
pub use limit_increase::LimitIncrease;
pub use maximum::Maximum;
