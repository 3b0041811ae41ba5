//! Record lifecycle: load, save and delete typed records.
//!
//! ```ignore
//! use stored_rust::{mapping, records, Record};
//!
//! let people = records::<Person>();
//! people.ensure_table()?;
//!
//! let mut bob = Record::new(Person { name: "Bob".into(), age: 42 });
//! people.save(&mut bob)?;              // id assigned, timestamps set
//!
//! bob.age = 43;
//! people.save(&mut bob)?;              // history grows if Person is versioned
//!
//! let again = people.find_one(bob.id())?;
//! ```

mod gettable;
mod repository;

pub use gettable::Gettable;
pub use repository::{records, RecordRepository, RecordsExt};
