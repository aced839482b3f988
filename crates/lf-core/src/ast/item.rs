use super::{Block, Expr, Ident, TypeRef, VarDeclarator};
use crate::span::Span;

common_struct! {
    pub struct Annotation {
        /// Name as written, without the `@`.
        pub name: String,
        pub args: Vec<Expr>,
    }
}

impl Annotation {
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

common_struct! {
    #[derive(Default)]
    pub struct Modifiers {
        pub annotations: Vec<Annotation>,
        pub keywords: Vec<String>,
    }
}

impl Modifiers {
    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.keywords.iter().any(|k| k == keyword)
    }

    pub fn is_final(&self) -> bool {
        self.has_keyword("final")
    }

    pub fn is_static(&self) -> bool {
        self.has_keyword("static")
    }

    pub fn has_annotation(&self, simple_name: &str) -> bool {
        self.annotations
            .iter()
            .any(|annotation| annotation.simple_name() == simple_name)
    }

    pub fn annotation_names(&self) -> Vec<String> {
        self.annotations
            .iter()
            .map(|annotation| annotation.simple_name().to_string())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty() && self.keywords.is_empty()
    }
}

common_struct! {
    pub struct Import {
        pub path: String,
        pub is_static: bool,
        pub span: Span,
    }
}

impl Import {
    /// Whether this import already makes `path` visible.
    pub fn covers(&self, path: &str) -> bool {
        if self.is_static {
            return false;
        }
        if self.path == path {
            return true;
        }
        match (self.path.strip_suffix(".*"), path.rsplit_once('.')) {
            (Some(package), Some((target_package, _))) => package == target_package,
            _ => false,
        }
    }
}

common_struct! {
    #[derive(Default)]
    pub struct CompilationUnit {
        pub package: Option<String>,
        /// End offset of the package declaration.
        pub package_span: Option<Span>,
        pub imports: Vec<Import>,
        pub types: Vec<TypeDecl>,
    }
}

common_enum! {
    #[derive(Copy)]
    pub enum TypeDeclKind {
        Class,
        Interface,
        Enum,
        Record,
        Annotation,
    }
}

impl TypeDeclKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            TypeDeclKind::Class => "class",
            TypeDeclKind::Interface => "interface",
            TypeDeclKind::Enum => "enum",
            TypeDeclKind::Record => "record",
            TypeDeclKind::Annotation => "@interface",
        }
    }
}

common_struct! {
    pub struct EnumConstant {
        pub name: Ident,
        pub args: Option<Vec<Expr>>,
        pub body: Option<Vec<Member>>,
    }
}

common_struct! {
    pub struct TypeDecl {
        pub kind: TypeDeclKind,
        pub modifiers: Modifiers,
        pub name: Ident,
        /// Raw type parameter list, e.g. `<T extends Comparable<T>>`.
        pub type_params: Option<String>,
        pub extends: Vec<TypeRef>,
        pub implements: Vec<TypeRef>,
        pub record_components: Vec<Param>,
        pub enum_constants: Vec<EnumConstant>,
        pub members: Vec<Member>,
        pub span: Span,
    }
}

impl TypeDecl {
    pub fn fields(&self) -> impl Iterator<Item = &FieldDecl> {
        self.members.iter().filter_map(|member| match member {
            Member::Field(field) => Some(field),
            _ => None,
        })
    }
}

common_enum! {
    pub enum Member {
        Field(FieldDecl),
        Method(MethodDecl),
        Constructor(MethodDecl),
        Initializer(Initializer),
        Type(TypeDecl),
    }
}

common_struct! {
    pub struct FieldDecl {
        pub modifiers: Modifiers,
        pub ty: TypeRef,
        pub declarators: Vec<VarDeclarator>,
        pub span: Span,
    }
}

common_struct! {
    pub struct Param {
        pub modifiers: Modifiers,
        pub ty: TypeRef,
        pub name: Ident,
        pub varargs: bool,
    }
}

impl Param {
    /// Varargs parameters are arrays inside the body.
    pub fn effective_type(&self) -> TypeRef {
        if self.varargs {
            TypeRef::array_of(self.ty.clone())
        } else {
            self.ty.clone()
        }
    }
}

common_struct! {
    pub struct MethodDecl {
        pub modifiers: Modifiers,
        pub type_params: Option<String>,
        /// `None` for constructors.
        pub ret: Option<TypeRef>,
        pub name: Ident,
        pub params: Vec<Param>,
        pub throws: Vec<TypeRef>,
        pub body: Option<Block>,
        pub span: Span,
    }
}

common_struct! {
    pub struct Initializer {
        pub is_static: bool,
        pub body: Block,
    }
}
