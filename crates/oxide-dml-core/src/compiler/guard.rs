//! Statement-kind flags and the guard that clears them for nested compiles.

use std::ops::{Deref, DerefMut};

use super::Compiler;

/// The DML statement currently being compiled.
///
/// At most one kind is active at a time. Nested elements (default
/// expressions, sequences, subqueries) are compiled with no kind so they
/// render as standalone SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DmlKind {
    /// Not inside an INSERT, UPDATE or DELETE.
    #[default]
    None,
    /// Compiling an INSERT.
    Insert,
    /// Compiling an UPDATE.
    Update,
    /// Compiling a DELETE.
    Delete,
}

impl DmlKind {
    /// Whether this is an INSERT.
    #[must_use]
    pub const fn is_insert(self) -> bool {
        matches!(self, Self::Insert)
    }

    /// Whether this is an UPDATE.
    #[must_use]
    pub const fn is_update(self) -> bool {
        matches!(self, Self::Update)
    }

    /// Whether this is an INSERT, UPDATE or DELETE.
    #[must_use]
    pub const fn is_dml(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Clears the DML kind of a compiler and restores it when dropped.
///
/// Restoration happens on every exit path, including early returns through
/// `?`.
pub struct NestedCompile<'c, 'd> {
    compiler: &'c mut Compiler<'d>,
    saved: DmlKind,
}

impl<'c, 'd> NestedCompile<'c, 'd> {
    pub(crate) fn new(compiler: &'c mut Compiler<'d>) -> Self {
        let saved = std::mem::take(&mut compiler.kind);
        Self { compiler, saved }
    }
}

impl<'d> Deref for NestedCompile<'_, 'd> {
    type Target = Compiler<'d>;

    fn deref(&self) -> &Compiler<'d> {
        self.compiler
    }
}

impl<'d> DerefMut for NestedCompile<'_, 'd> {
    fn deref_mut(&mut self) -> &mut Compiler<'d> {
        self.compiler
    }
}

impl Drop for NestedCompile<'_, '_> {
    fn drop(&mut self) {
        self.compiler.kind = self.saved;
    }
}
