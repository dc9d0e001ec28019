use std::collections::HashMap;

use crate::codegen::Segment;

/// Storage kind of a declared name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Static,
    Field,
    Arg,
    Var,
}

impl Kind {
    pub fn segment(self) -> Segment {
        match self {
            Kind::Static => Segment::Static,
            Kind::Field => Segment::This,
            Kind::Arg => Segment::Argument,
            Kind::Var => Segment::Local,
        }
    }

    fn is_class_scoped(self) -> bool {
        matches!(self, Kind::Static | Kind::Field)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub ty: String,
    pub kind: Kind,
    pub index: usize,
}

#[derive(Clone, Debug, Default)]
struct Counts {
    statics: usize,
    fields: usize,
    args: usize,
    vars: usize,
}

impl Counts {
    fn get_mut(&mut self, kind: Kind) -> &mut usize {
        match kind {
            Kind::Static => &mut self.statics,
            Kind::Field => &mut self.fields,
            Kind::Arg => &mut self.args,
            Kind::Var => &mut self.vars,
        }
    }

    fn get(&self, kind: Kind) -> usize {
        match kind {
            Kind::Static => self.statics,
            Kind::Field => self.fields,
            Kind::Arg => self.args,
            Kind::Var => self.vars,
        }
    }
}

/// Class scope plus subroutine scope. Subroutine names shadow class names.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    class_scope: HashMap<String, Symbol>,
    subroutine_scope: HashMap<String, Symbol>,
    counts: Counts,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_subroutine(&mut self) {
        self.subroutine_scope.clear();
        self.counts.args = 0;
        self.counts.vars = 0;
    }

    /// Registers `name` with the next free index of `kind`. Redefining a name
    /// replaces the old entry but does not give its index back.
    pub fn define(&mut self, name: &str, ty: &str, kind: Kind) -> usize {
        let count = self.counts.get_mut(kind);
        let index = *count;
        *count += 1;

        let symbol = Symbol {
            ty: ty.to_string(),
            kind,
            index,
        };
        let scope = if kind.is_class_scoped() {
            &mut self.class_scope
        } else {
            &mut self.subroutine_scope
        };
        scope.insert(name.to_string(), symbol);
        index
    }

    pub fn count_of(&self, kind: Kind) -> usize {
        self.counts.get(kind)
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.subroutine_scope
            .get(name)
            .or_else(|| self.class_scope.get(name))
    }

    pub fn kind_of(&self, name: &str) -> Option<Kind> {
        self.lookup(name).map(|s| s.kind)
    }

    pub fn type_of(&self, name: &str) -> Option<&str> {
        self.lookup(name).map(|s| s.ty.as_str())
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.lookup(name).map(|s| s.index)
    }
}
