//! Interner for opaque expression fragments.
//! Maps each unparsable fragment to one stable symbol per solve.
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

#[derive(Debug, Default)]
struct Symbols {
    map: HashMap<String, SymbolId>,
    rev: Vec<String>,
}

/// Call-scoped, mutex-guarded so the three cases may be solved in parallel
#[derive(Debug, Default)]
pub struct SymbolCache {
    inner: Mutex<Symbols>,
}

impl SymbolCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern<S: AsRef<str>>(&self, text: S) -> SymbolId {
        let text = text.as_ref().trim();
        let mut symbols = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(id) = symbols.map.get(text) {
            return *id;
        }
        let id = SymbolId(symbols.rev.len() as u32);
        symbols.rev.push(text.to_string());
        symbols.map.insert(text.to_string(), id);
        id
    }

    pub fn resolve(&self, id: SymbolId) -> Option<String> {
        let symbols = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        symbols.rev.get(id.0 as usize).cloned()
    }

    pub fn len(&self) -> usize {
        match self.inner.lock() {
            Ok(guard) => guard.rev.len(),
            Err(poisoned) => poisoned.into_inner().rev.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_deduplicates() {
        let cache = SymbolCache::new();
        let a = cache.intern("foo(n)");
        let b = cache.intern(" foo(n) ");
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.resolve(a).as_deref(), Some("foo(n)"));
        assert_ne!(cache.intern("bar"), a);
    }
}
