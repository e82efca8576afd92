use crate::error::ErrorKind;
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Label,
    Constant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub value: i32,
    pub kind: SymbolKind,
    pub line: usize,
}

/// Symbols in definition order. Every name is defined exactly once.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct SymbolTable(IndexMap<String, Symbol>);

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable(IndexMap::new())
    }

    pub fn define(
        &mut self,
        name: &str,
        value: i32,
        kind: SymbolKind,
        line: usize,
    ) -> Result<(), ErrorKind> {
        if self.0.contains_key(name) {
            return Err(ErrorKind::DuplicateSymbol(name.to_string()));
        }
        self.0.insert(name.to_string(), Symbol { value, kind, line });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<i32> {
        self.0.get(name).map(|sym| sym.value)
    }

    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Symbol)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
