use crate::ids::TypeId;
use smallvec::SmallVec;
use std::sync::Arc;

/// Type variables visible while converting a signature.
///
/// Innermost declarations are pushed last and win: method variables shadow
/// the declaring type's, which shadow the enclosing types'.
#[derive(Clone, Debug, Default)]
pub struct TypeVarScope {
    vars: SmallVec<[(Arc<str>, TypeId); 4]>,
}

impl TypeVarScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: Arc<str>, var: TypeId) {
        self.vars.push((name, var));
    }

    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.vars
            .iter()
            .rev()
            .find(|(n, _)| &**n == name)
            .map(|(_, id)| *id)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
