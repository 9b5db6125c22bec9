use crate::error::Result;
use crate::ids::{TypeId, TypeKey, WildcardBound};
use crate::table::SymbolTable;
use smallvec::SmallVec;

impl SymbolTable {
    /// Type parameters and the matching arguments of a parameterized type,
    /// enclosing types' first.
    pub(crate) fn substitution_of(
        &self,
        id: TypeId,
    ) -> Result<(SmallVec<[TypeId; 4]>, SmallVec<[TypeId; 4]>)> {
        let mut params: SmallVec<[TypeId; 4]> = SmallVec::new();
        let mut args: SmallVec<[TypeId; 4]> = SmallVec::new();
        let Some(TypeKey::Parameterized {
            generic, enclosing, ..
        }) = self.type_key(id)
        else {
            return Ok((params, args));
        };
        if let Some(enclosing) = enclosing {
            let (outer_params, _) = self.substitution_of(enclosing)?;
            params.extend(outer_params);
        }
        params.extend(self.descriptor(generic)?.type_parameters.iter().copied());
        if let Some(desc) = self.peek_descriptor(id) {
            args.extend(desc.type_arguments.iter().copied());
        }
        Ok((params, args))
    }

    /// Replace each of `params` occurring in `ty` by the argument at the
    /// same position. Unmatched parameters are left alone.
    pub fn substitute(&self, ty: TypeId, params: &[TypeId], args: &[TypeId]) -> TypeId {
        if params.is_empty() {
            return ty;
        }
        match self.type_key(ty) {
            Some(TypeKey::TypeVariable { .. }) => params
                .iter()
                .position(|&p| p == ty)
                .and_then(|i| args.get(i).copied())
                .unwrap_or(ty),
            Some(TypeKey::Array { leaf, dimensions }) => {
                let leaf = self.substitute(leaf, params, args);
                self.array_of(leaf, dimensions)
            }
            Some(TypeKey::Parameterized {
                generic,
                arguments,
                enclosing,
            }) => {
                let arguments: SmallVec<[TypeId; 2]> = arguments
                    .iter()
                    .map(|&a| self.substitute(a, params, args))
                    .collect();
                let enclosing = enclosing.map(|e| self.substitute(e, params, args));
                self.parameterized(generic, &arguments, enclosing)
            }
            Some(TypeKey::Wildcard {
                generic,
                rank,
                bound,
            }) => {
                let bound = match bound {
                    WildcardBound::Unbounded => WildcardBound::Unbounded,
                    WildcardBound::Extends(b) => {
                        WildcardBound::Extends(self.substitute(b, params, args))
                    }
                    WildcardBound::Super(b) => WildcardBound::Super(self.substitute(b, params, args)),
                };
                self.wildcard(generic, rank, bound)
            }
            _ => ty,
        }
    }
}
