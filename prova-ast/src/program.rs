use std::ops::Index;

use crate::DeclId;
use crate::decl::{Declaration, Implementation};

/// Arena of top-level declarations; a declaration's [`DeclId`] is its position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    decls: Vec<Declaration>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, decl: Declaration) -> DeclId {
        let id = DeclId::new(self.decls.len());
        self.decls.push(decl);
        id
    }

    pub fn get(&self, id: DeclId) -> Option<&Declaration> {
        self.decls.get(id.index())
    }

    /// Swaps the declaration at `id`, returning the previous one.
    pub fn replace(&mut self, id: DeclId, decl: Declaration) -> Option<Declaration> {
        let slot = self.decls.get_mut(id.index())?;
        Some(std::mem::replace(slot, decl))
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = DeclId> + use<> {
        (0..self.decls.len()).map(DeclId::new)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DeclId, &Declaration)> {
        self.decls
            .iter()
            .enumerate()
            .map(|(i, d)| (DeclId::new(i), d))
    }

    pub fn find(&self, name: &str) -> Option<DeclId> {
        self.iter().find(|(_, d)| d.name == name).map(|(id, _)| id)
    }

    pub fn axioms(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.iter()
            .filter(|(_, d)| d.as_axiom().is_some())
            .map(|(id, _)| id)
    }

    pub fn functions(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.iter()
            .filter(|(_, d)| d.as_function().is_some())
            .map(|(id, _)| id)
    }

    pub fn implementations(&self) -> impl Iterator<Item = (DeclId, &Implementation)> {
        self.iter()
            .filter_map(|(id, d)| d.as_implementation().map(|i| (id, i)))
    }
}

impl Index<DeclId> for Program {
    type Output = Declaration;

    fn index(&self, id: DeclId) -> &Declaration {
        &self.decls[id.index()]
    }
}

impl FromIterator<Declaration> for Program {
    fn from_iter<I: IntoIterator<Item = Declaration>>(iter: I) -> Self {
        Program {
            decls: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Expr;

    #[test]
    fn test_ids_are_positions() {
        let mut p = Program::new();
        let c = p.push(Declaration::constant("c"));
        let ax = p.push(Declaration::axiom("ax0", Expr::constant(c)));
        assert_eq!(c.index(), 0);
        assert_eq!(ax.index(), 1);
        assert_eq!(p[ax].name, "ax0");
        assert_eq!(p.find("c"), Some(c));
        assert_eq!(p.axioms().collect::<Vec<_>>(), vec![ax]);
    }

    #[test]
    fn test_replace_keeps_identity() {
        let mut p = Program::new();
        let f = p.push(Declaration::function("f", &[], None));
        let old = p.replace(f, Declaration::function("f", &["x"], None));
        assert!(old.is_some());
        assert_eq!(p[f].as_function().map(|f| f.params.len()), Some(1));
        assert!(p.replace(DeclId::new(9), Declaration::constant("z")).is_none());
    }
}
