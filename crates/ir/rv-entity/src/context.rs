//! Declaration contexts

use la_arena::Idx;
use rv_intern::Symbol;
use rv_span::FileId;

use crate::decl::DeclId;

/// Index of a context in the [`EntityGraph`](crate::EntityGraph)
pub type ContextId = Idx<Context>;

/// How a source file was produced
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum SourceFileKind {
    /// Ordinary library source
    Library,
    /// Entry point file whose top-level code runs in order
    Main,
    /// Interactive input; lookups from it never use the scope tree
    Repl,
    /// Loaded from a compiled module
    Serialized,
}

/// An import declared by a file
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct Import {
    /// Imported module
    pub module: DeclId,
    /// `@_exported`: visible to importers of this file's module
    pub exported: bool,
    /// `@testable`: internal declarations of the module become visible
    pub testable: bool,
}

/// Source file context payload
#[derive(Clone, Debug)]
pub struct FileUnit {
    /// Source file identity
    pub file: FileId,
    /// How the file was produced
    pub kind: SourceFileKind,
    /// Names `private`/`fileprivate` declarations of this file for disambiguation
    pub discriminator: Symbol,
    /// Imports in declaration order
    pub imports: Vec<Import>,
    /// Top-level declarations in source order
    pub top_level: Vec<DeclId>,
}

/// Payload of an initializer context
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum InitializerContext {
    /// Initial value expression of a pattern binding
    PatternBinding {
        /// Variable being initialized
        binding: Option<DeclId>,
        /// `self` available to lazy property initializers
        implicit_self: Option<DeclId>,
    },
    /// Default argument expression of parameter `index`
    DefaultArgument {
        /// Position of the parameter in its function's list
        index: u32,
    },
}

/// What a context is
#[derive(Clone, Debug)]
pub enum ContextKind {
    /// A module, owning its files
    Module(DeclId),
    /// A source file
    File(FileUnit),
    /// Body of a nominal type
    Nominal(DeclId),
    /// Body of an extension
    Extension(DeclId),
    /// Function, initializer or accessor body
    Function(DeclId),
    /// Closure expression
    Closure,
    /// Pattern binding initializer or default argument
    Initializer(InitializerContext),
    /// Top-level statements of a main or interactive file
    TopLevelCode,
}

/// A node of the context forest
#[derive(Clone, Debug)]
pub struct Context {
    /// `None` only for module contexts
    pub parent: Option<ContextId>,
    /// What the context is
    pub kind: ContextKind,
}

impl Context {
    /// Modules and source files
    pub fn is_module_scope(&self) -> bool {
        matches!(self.kind, ContextKind::Module(_) | ContextKind::File(_))
    }

    /// Nominal type bodies and extensions
    pub fn is_type_context(&self) -> bool {
        matches!(self.kind, ContextKind::Nominal(_) | ContextKind::Extension(_))
    }

    /// Closures, function bodies, initializers and top-level code
    pub fn is_local(&self) -> bool {
        !self.is_module_scope() && !self.is_type_context()
    }

    /// File payload, for file contexts
    pub fn as_file(&self) -> Option<&FileUnit> {
        match &self.kind {
            ContextKind::File(file) => Some(file),
            _ => None,
        }
    }

    /// Declaration that opened this context, if any
    pub fn decl(&self) -> Option<DeclId> {
        match self.kind {
            ContextKind::Module(decl)
            | ContextKind::Nominal(decl)
            | ContextKind::Extension(decl)
            | ContextKind::Function(decl) => Some(decl),
            _ => None,
        }
    }
}
