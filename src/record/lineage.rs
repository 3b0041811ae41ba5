use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::StoreError;

/// Identity of a record type, used as the mapping key.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: 'static>() -> Self {
        TypeKey {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A record type together with its declared parents, recursively.
///
/// Parents are listed in declaration order. [`Lineage::linearize`] turns the
/// graph into the lookup order used for mapping resolution: the C3
/// linearization, which is also how Python orders base classes. For
///
/// ```text
/// Base <- MidA, MidB, MidC <- Derived(MidA, MidB, MidC)
/// ```
///
/// the order is `Derived, MidA, MidB, MidC, Base`: every type comes before
/// its parents, and parents keep their declared order.
///
/// Declared parents must form a DAG.
#[derive(Clone, Debug)]
pub struct Lineage {
    key: TypeKey,
    parents: Vec<Lineage>,
}

impl Lineage {
    pub fn new(key: TypeKey, parents: Vec<Lineage>) -> Self {
        Lineage { key, parents }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn parents(&self) -> &[Lineage] {
        &self.parents
    }

    /// The type itself followed by its ancestors, most specific first.
    pub fn linearize(&self) -> Result<Vec<TypeKey>, StoreError> {
        let mut sequences = Vec::with_capacity(self.parents.len() + 1);
        for parent in &self.parents {
            sequences.push(parent.linearize()?);
        }
        sequences.push(self.parents.iter().map(|p| p.key).collect::<Vec<_>>());

        let mut order = vec![self.key];
        loop {
            sequences.retain(|seq| !seq.is_empty());
            if sequences.is_empty() {
                return Ok(order);
            }

            let head = sequences
                .iter()
                .map(|seq| seq[0])
                .find(|candidate| !sequences.iter().any(|seq| seq[1..].contains(candidate)))
                .ok_or_else(|| StoreError::InconsistentHierarchy {
                    type_name: self.key.name.to_string(),
                })?;

            order.push(head);
            for seq in sequences.iter_mut() {
                if seq[0] == head {
                    seq.remove(0);
                }
            }
        }
    }
}
