//! Declarations

use bitflags::bitflags;
use la_arena::Idx;
use rv_intern::Symbol;

use crate::access::{AccessLevel, Availability};
use crate::context::ContextId;
use crate::name::DeclName;

/// Index of a declaration in the [`EntityGraph`](crate::EntityGraph)
pub type DeclId = Idx<Decl>;

bitflags! {
    /// Boolean properties of a declaration
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct DeclFlags: u16 {
        /// Type-level member (`static` / `class`)
        const STATIC = 1 << 0;
        /// Imported from a foreign-language module
        const FOREIGN = 1 << 1;
        /// Dynamically dispatched and visible to dynamic lookup
        const DYNAMIC = 1 << 2;
        /// Placeholder implementation synthesized for a missing one
        const STUB_IMPLEMENTATION = 1 << 3;
        /// Initializer every subclass must provide
        const REQUIRED = 1 << 4;
        /// Compiler-synthesized
        const IMPLICIT = 1 << 5;
        /// Variable with backing storage
        const HAS_STORAGE = 1 << 6;
        /// Already recorded in its context's member lookup table
        const IN_LOOKUP_TABLE = 1 << 7;
        /// Already linked into its context's member list
        const MEMBER_LISTED = 1 << 8;
        /// Declaration failed validation
        const INVALID = 1 << 9;
        /// Signature is being computed; a lookup reaching it is cyclic
        const BEING_VALIDATED = 1 << 10;
    }
}

/// Foreign method selector, e.g. `initWithFrame:`
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Selector(pub Symbol);

/// Intrusive member list of an iterable context
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MemberList {
    /// Earliest member
    pub first: Option<DeclId>,
    /// Most recently linked member
    pub last: Option<DeclId>,
    /// Number of linked members
    pub len: u32,
}

/// Extension chain of a nominal type, linked through [`ExtensionDecl::next`]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtensionChain {
    /// Extension registered first
    pub first: Option<DeclId>,
    /// Extension registered last
    pub last: Option<DeclId>,
}

/// Flavor of a nominal type
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum NominalKind {
    /// `struct`
    Struct,
    /// `enum`
    Enum,
    /// `class`
    Class,
    /// `protocol`
    Protocol,
}

/// Kind of an initializer, ranked from most to least preferred
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum CtorKind {
    /// Fully initializes the instance itself
    Designated,
    /// Delegates to another initializer of the same type
    Convenience,
    /// Convenience initializer imported from a foreign factory method
    ConvenienceFactory,
    /// Foreign factory method imported as an initializer
    Factory,
}

/// Role of an accessor
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum AccessorKind {
    /// Getter
    Get,
    /// Setter
    Set,
}

/// Payload of a module declaration
#[derive(Clone, Debug, Default)]
pub struct ModuleDecl {
    /// File contexts in declaration order
    pub files: Vec<ContextId>,
    /// Modules re-exported to every importer
    pub reexports: Vec<DeclId>,
}

/// Payload of a struct, enum, class or protocol
#[derive(Clone, Debug)]
pub struct NominalDecl {
    /// Flavor of the type
    pub kind: NominalKind,
    /// Superclass, for classes
    pub superclass: Option<DeclId>,
    /// Protocols named in the inheritance clause
    pub protocols: Vec<DeclId>,
    /// Generic parameters in declaration order
    pub generic_params: Vec<DeclId>,
    /// Members declared in the type body
    pub members: MemberList,
    /// Extensions registered on the type
    pub extensions: ExtensionChain,
}

impl NominalDecl {
    /// A nominal type with no members, supertypes or extensions
    pub fn new(kind: NominalKind) -> Self {
        Self {
            kind,
            superclass: None,
            protocols: Vec::new(),
            generic_params: Vec::new(),
            members: MemberList::default(),
            extensions: ExtensionChain::default(),
        }
    }
}

/// Payload of an extension
#[derive(Clone, Debug, Default)]
pub struct ExtensionDecl {
    /// Nominal type being extended, once bound
    pub extended: Option<DeclId>,
    /// Protocols the extension adds conformance to
    pub protocols: Vec<DeclId>,
    /// Generic parameters visible inside the extension
    pub generic_params: Vec<DeclId>,
    /// Members declared in the extension body
    pub members: MemberList,
    /// Next extension of the same type
    pub next: Option<DeclId>,
}

/// Payload of a function or method
#[derive(Clone, Debug, Default)]
pub struct FuncDecl {
    /// `self` parameter, for instance and static methods
    pub implicit_self: Option<DeclId>,
    /// Parameters in declaration order
    pub params: Vec<DeclId>,
    /// Generic parameters in declaration order
    pub generic_params: Vec<DeclId>,
    /// Foreign selector, for methods exposed to the foreign runtime
    pub selector: Option<Selector>,
}

/// Payload of an initializer
#[derive(Clone, Debug)]
pub struct ConstructorDecl {
    /// Designated, convenience or factory
    pub ctor_kind: CtorKind,
    /// `self` parameter
    pub implicit_self: Option<DeclId>,
    /// Parameters in declaration order
    pub params: Vec<DeclId>,
    /// Foreign selector, for initializers exposed to the foreign runtime
    pub selector: Option<Selector>,
}

impl ConstructorDecl {
    /// An initializer of `ctor_kind` with no parameters yet
    pub fn new(ctor_kind: CtorKind) -> Self {
        Self {
            ctor_kind,
            implicit_self: None,
            params: Vec::new(),
            selector: None,
        }
    }
}

/// Payload of a variable or property
#[derive(Clone, Debug, Default)]
pub struct VarDecl {
    /// Getter and setter declarations
    pub accessors: Vec<DeclId>,
    /// Whether the variable can be written at all
    pub settable: bool,
}

/// Payload of a getter or setter
#[derive(Clone, Debug)]
pub struct AccessorDecl {
    /// Variable the accessor belongs to
    pub storage: DeclId,
    /// Getter or setter
    pub kind: AccessorKind,
}

/// Kind-specific payload of a declaration
#[derive(Clone, Debug)]
pub enum DeclKind {
    /// Module
    Module(ModuleDecl),
    /// Struct, enum, class or protocol
    Nominal(NominalDecl),
    /// Extension of a nominal type
    Extension(ExtensionDecl),
    /// Function or method
    Func(FuncDecl),
    /// Initializer
    Constructor(ConstructorDecl),
    /// Variable or property
    Var(VarDecl),
    /// Getter or setter of a variable
    Accessor(AccessorDecl),
    /// Function parameter, including implicit `self`
    Param,
    /// Generic type parameter
    GenericParam,
    /// `typealias`
    TypeAlias,
    /// Enum case
    EnumElement,
}

impl DeclKind {
    /// Declarations that introduce a type name
    pub fn is_type_decl(&self) -> bool {
        matches!(self, Self::Nominal(_) | Self::GenericParam | Self::TypeAlias)
    }

    /// Declarations that open their own context
    pub fn opens_context(&self) -> bool {
        matches!(
            self,
            Self::Module(_)
                | Self::Nominal(_)
                | Self::Extension(_)
                | Self::Func(_)
                | Self::Constructor(_)
                | Self::Accessor(_)
        )
    }

    /// Functions, initializers and accessors
    pub fn is_function_like(&self) -> bool {
        matches!(self, Self::Func(_) | Self::Constructor(_) | Self::Accessor(_))
    }

    /// Keyword-style label used in diagnostics and dumps
    pub fn name(&self) -> &'static str {
        match self {
            Self::Module(_) => "module",
            Self::Nominal(nominal) => match nominal.kind {
                NominalKind::Struct => "struct",
                NominalKind::Enum => "enum",
                NominalKind::Class => "class",
                NominalKind::Protocol => "protocol",
            },
            Self::Extension(_) => "extension",
            Self::Func(_) => "func",
            Self::Constructor(_) => "init",
            Self::Var(_) => "var",
            Self::Accessor(_) => "accessor",
            Self::Param => "param",
            Self::GenericParam => "generic_param",
            Self::TypeAlias => "typealias",
            Self::EnumElement => "case",
        }
    }
}

/// A declaration node
#[derive(Clone, Debug)]
pub struct Decl {
    /// Declared name; `None` for extensions and other anonymous declarations
    pub name: Option<DeclName>,
    /// Kind-specific payload
    pub kind: DeclKind,
    /// Context the declaration lives in; a module owns itself
    pub owner: ContextId,
    /// Context opened by the declaration, if it opens one
    pub as_context: Option<ContextId>,
    pub(crate) access: Option<AccessLevel>,
    pub(crate) setter_access: Option<AccessLevel>,
    pub(crate) signature: Option<Symbol>,
    /// Declaration this one overrides
    pub overridden: Option<DeclId>,
    /// Availability attributes
    pub availability: Availability,
    /// Boolean properties
    pub flags: DeclFlags,
    pub(crate) next_member: Option<DeclId>,
}

impl Decl {
    pub(crate) fn new(owner: ContextId, name: Option<DeclName>, kind: DeclKind) -> Self {
        Self {
            name,
            kind,
            owner,
            as_context: None,
            access: None,
            setter_access: None,
            signature: None,
            overridden: None,
            availability: Availability::AVAILABLE,
            flags: DeclFlags::empty(),
            next_member: None,
        }
    }

    /// Base name, if the declaration is named
    pub fn base_name(&self) -> Option<Symbol> {
        self.name.as_ref().map(DeclName::base)
    }

    /// Access level, `internal` when never written
    pub fn access(&self) -> AccessLevel {
        self.access.unwrap_or(AccessLevel::Internal)
    }

    /// Whether an access level was written
    pub fn has_access(&self) -> bool {
        self.access.is_some()
    }

    /// Setter access; falls back to the getter's level
    pub fn setter_access(&self) -> AccessLevel {
        self.setter_access.unwrap_or_else(|| self.access())
    }

    /// Canonical interface type signature, once computed
    pub fn signature(&self) -> Option<Symbol> {
        self.signature
    }

    /// Whether the interface type has been computed
    pub fn has_signature(&self) -> bool {
        self.signature.is_some()
    }

    /// Type-level member
    pub fn is_static(&self) -> bool {
        self.flags.contains(DeclFlags::STATIC)
    }

    /// Imported from a foreign-language module
    pub fn is_foreign(&self) -> bool {
        self.flags.contains(DeclFlags::FOREIGN)
    }

    /// Dynamically dispatched
    pub fn is_dynamic(&self) -> bool {
        self.flags.contains(DeclFlags::DYNAMIC)
    }

    /// Failed validation
    pub fn is_invalid(&self) -> bool {
        self.flags.contains(DeclFlags::INVALID)
    }

    /// Signature computation in progress
    pub fn is_being_validated(&self) -> bool {
        self.flags.contains(DeclFlags::BEING_VALIDATED)
    }

    /// Introduces a type name
    pub fn is_type_decl(&self) -> bool {
        self.kind.is_type_decl()
    }

    /// Is an initializer
    pub fn is_constructor(&self) -> bool {
        matches!(self.kind, DeclKind::Constructor(_))
    }

    /// Initializer kind, for initializers
    pub fn ctor_kind(&self) -> Option<CtorKind> {
        match &self.kind {
            DeclKind::Constructor(ctor) => Some(ctor.ctor_kind),
            _ => None,
        }
    }

    /// Is a designated initializer
    pub fn is_designated_init(&self) -> bool {
        self.ctor_kind() == Some(CtorKind::Designated)
    }

    /// Foreign selector of a method or initializer
    pub fn selector(&self) -> Option<Selector> {
        match &self.kind {
            DeclKind::Func(func) => func.selector,
            DeclKind::Constructor(ctor) => ctor.selector,
            _ => None,
        }
    }

    /// Implicit `self` parameter of a method or initializer
    pub fn implicit_self(&self) -> Option<DeclId> {
        match &self.kind {
            DeclKind::Func(func) => func.implicit_self,
            DeclKind::Constructor(ctor) => ctor.implicit_self,
            _ => None,
        }
    }

    /// Parameters of a function or initializer
    pub fn params(&self) -> &[DeclId] {
        match &self.kind {
            DeclKind::Func(func) => &func.params,
            DeclKind::Constructor(ctor) => &ctor.params,
            _ => &[],
        }
    }

    /// Generic parameters of a type, extension or function
    pub fn generic_params(&self) -> &[DeclId] {
        match &self.kind {
            DeclKind::Nominal(nominal) => &nominal.generic_params,
            DeclKind::Extension(ext) => &ext.generic_params,
            DeclKind::Func(func) => &func.generic_params,
            _ => &[],
        }
    }

    /// Member list, for nominal types and extensions
    pub fn member_list(&self) -> Option<&MemberList> {
        match &self.kind {
            DeclKind::Nominal(nominal) => Some(&nominal.members),
            DeclKind::Extension(ext) => Some(&ext.members),
            _ => None,
        }
    }

    pub(crate) fn member_list_mut(&mut self) -> Option<&mut MemberList> {
        match &mut self.kind {
            DeclKind::Nominal(nominal) => Some(&mut nominal.members),
            DeclKind::Extension(ext) => Some(&mut ext.members),
            _ => None,
        }
    }

    /// Nominal payload
    pub fn as_nominal(&self) -> Option<&NominalDecl> {
        match &self.kind {
            DeclKind::Nominal(nominal) => Some(nominal),
            _ => None,
        }
    }

    /// Extension payload
    pub fn as_extension(&self) -> Option<&ExtensionDecl> {
        match &self.kind {
            DeclKind::Extension(ext) => Some(ext),
            _ => None,
        }
    }

    /// Module payload
    pub fn as_module(&self) -> Option<&ModuleDecl> {
        match &self.kind {
            DeclKind::Module(module) => Some(module),
            _ => None,
        }
    }

    /// Is a protocol
    pub fn is_protocol(&self) -> bool {
        self.as_nominal()
            .is_some_and(|nominal| nominal.kind == NominalKind::Protocol)
    }

    /// Is a class
    pub fn is_class(&self) -> bool {
        self.as_nominal()
            .is_some_and(|nominal| nominal.kind == NominalKind::Class)
    }

    /// Whether the variable has backing storage or is otherwise settable
    pub fn is_settable(&self) -> bool {
        match &self.kind {
            DeclKind::Var(var) => var.settable,
            _ => false,
        }
    }
}
