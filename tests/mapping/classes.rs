//! Diamond-shaped family of record types.
//!
//! ```text
//!            Base
//!        /    |    \
//!     MidA  MidB  MidC
//!        \    |    /
//!   Derived1, Derived2, Derived3 (parents in different orders)
//! ```

use serde::{Deserialize, Serialize};
use stored_rust::Storable;

#[derive(Clone, Debug, Default, Serialize, Deserialize, Storable)]
#[storable(table = "BaseClass")]
pub struct Base {
    pub name: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Storable)]
#[storable(parents(Base))]
pub struct MidA {
    pub name: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Storable)]
#[storable(parents(Base))]
pub struct MidB {
    pub name: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Storable)]
#[storable(parents(Base))]
pub struct MidC {
    pub name: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Storable)]
#[storable(parents(MidA, MidB, MidC))]
pub struct Derived1 {
    pub name: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Storable)]
#[storable(parents(MidC, MidB, MidA))]
pub struct Derived2 {
    pub name: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Storable)]
#[storable(parents(MidB, MidC, MidA))]
pub struct Derived3 {
    pub name: String,
}

/// Declares `MidA` before `Derived1` even though `Derived1` inherits from
/// `MidA`, which no linearization can honor.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Storable)]
#[storable(parents(MidA, Derived1))]
pub struct Broken {
    pub name: String,
}
