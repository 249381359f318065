//! Import statements required by the patterns that were actually emitted.

use std::collections::HashSet;

use super::writer::CodeWriter;

/// Import lines in first-seen order, without duplicates.
#[derive(Debug, Default)]
pub struct ImportSet {
    ordered: Vec<String>,
    seen: HashSet<String>,
}

impl ImportSet {
    pub fn add(&mut self, import: &str) {
        let import = import.trim();
        if import.is_empty() {
            return;
        }
        if self.seen.insert(import.to_string()) {
            self.ordered.push(import.to_string());
        }
    }

    pub fn extend<'a>(&mut self, imports: impl IntoIterator<Item = &'a String>) {
        for import in imports {
            self.add(import);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }
}

/// Emit the import statements to the writer.
pub fn emit_imports(imports: &ImportSet, w: &mut CodeWriter) {
    for import in &imports.ordered {
        w.line(import);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupes_in_first_seen_order() {
        let mut imports = ImportSet::default();
        imports.add("import math");
        imports.add("from os import path");
        imports.add(" import math ");
        imports.add("");

        let mut w = CodeWriter::new();
        emit_imports(&imports, &mut w);
        assert_eq!(imports.len(), 2);
        assert_eq!(w.finish(), "import math\nfrom os import path\n");
    }
}
