use std::fmt::{Display, Formatter};

common_enum! {
    #[derive(Copy, PartialOrd, Ord)]
    pub enum PrimitiveKind {
        Boolean,
        Byte,
        Short,
        Char,
        Int,
        Long,
        Float,
        Double,
    }
}

impl PrimitiveKind {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "boolean" => PrimitiveKind::Boolean,
            "byte" => PrimitiveKind::Byte,
            "short" => PrimitiveKind::Short,
            "char" => PrimitiveKind::Char,
            "int" => PrimitiveKind::Int,
            "long" => PrimitiveKind::Long,
            "float" => PrimitiveKind::Float,
            "double" => PrimitiveKind::Double,
            _ => return None,
        })
    }

    pub fn from_wrapper(name: &str) -> Option<Self> {
        Some(match name {
            "Boolean" | "java.lang.Boolean" => PrimitiveKind::Boolean,
            "Byte" | "java.lang.Byte" => PrimitiveKind::Byte,
            "Short" | "java.lang.Short" => PrimitiveKind::Short,
            "Character" | "java.lang.Character" => PrimitiveKind::Char,
            "Integer" | "java.lang.Integer" => PrimitiveKind::Int,
            "Long" | "java.lang.Long" => PrimitiveKind::Long,
            "Float" | "java.lang.Float" => PrimitiveKind::Float,
            "Double" | "java.lang.Double" => PrimitiveKind::Double,
            _ => return None,
        })
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    pub fn wrapper(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Byte => "Byte",
            PrimitiveKind::Short => "Short",
            PrimitiveKind::Char => "Character",
            PrimitiveKind::Int => "Integer",
            PrimitiveKind::Long => "Long",
            PrimitiveKind::Float => "Float",
            PrimitiveKind::Double => "Double",
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, PrimitiveKind::Boolean)
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, PrimitiveKind::Float | PrimitiveKind::Double)
    }

    /// Binary numeric promotion: both operands widen to at least `int`.
    pub fn promote(self, other: PrimitiveKind) -> PrimitiveKind {
        let widest = self.max(other);
        if widest < PrimitiveKind::Int {
            PrimitiveKind::Int
        } else {
            widest
        }
    }
}

common_enum! {
    #[derive(Copy)]
    pub enum BoundKind {
        Extends,
        Super,
    }
}

common_struct! {
    /// A wildcard bound, `? extends T` or `? super T`.
    pub struct TypeBound {
        pub kind: BoundKind,
        pub ty: Box<TypeRef>,
    }
}

common_struct! {
    /// A written type. `args` is `None` for a raw type and `Some(vec![])`
    /// for the diamond `<>`.
    pub struct TypeRef {
        pub name: String,
        pub args: Option<Vec<TypeRef>>,
        pub dims: usize,
        pub bound: Option<TypeBound>,
    }
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: None,
            dims: 0,
            bound: None,
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self {
            args: Some(args),
            ..Self::named(name)
        }
    }

    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::named(kind.keyword())
    }

    pub fn string() -> Self {
        Self::named("String")
    }

    pub fn array_of(element: TypeRef) -> Self {
        Self {
            dims: element.dims + 1,
            ..element
        }
    }

    /// `var` in a local declaration.
    pub fn is_inferred(&self) -> bool {
        self.name == "var" && self.dims == 0
    }

    pub fn is_array(&self) -> bool {
        self.dims > 0
    }

    pub fn is_wildcard(&self) -> bool {
        self.name == "?"
    }

    /// Last segment of a qualified name, `java.util.List` gives `List`.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn type_args(&self) -> &[TypeRef] {
        self.args.as_deref().unwrap_or(&[])
    }

    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        if self.dims > 0 {
            return None;
        }
        PrimitiveKind::from_keyword(&self.name)
    }

    /// Primitive kind of a primitive or its wrapper class.
    pub fn numeric_kind(&self) -> Option<PrimitiveKind> {
        if self.dims > 0 {
            return None;
        }
        self.as_primitive()
            .or_else(|| PrimitiveKind::from_wrapper(&self.name))
    }

    pub fn is_primitive(&self) -> bool {
        self.as_primitive().is_some()
    }

    pub fn is_string(&self) -> bool {
        self.dims == 0 && matches!(self.name.as_str(), "String" | "java.lang.String")
    }

    pub fn is_boolean(&self) -> bool {
        self.numeric_kind() == Some(PrimitiveKind::Boolean)
    }

    /// The element type produced by iterating a value of this type, when
    /// it is visible from the written type.
    pub fn element_type(&self) -> Option<TypeRef> {
        if self.dims > 0 {
            return Some(TypeRef {
                dims: self.dims - 1,
                ..self.clone()
            });
        }
        match self.type_args() {
            [single] => Some(single.upper_bound()),
            _ => None,
        }
    }

    /// `? extends T` reads as `T`; everything else as itself.
    pub fn upper_bound(&self) -> TypeRef {
        match &self.bound {
            Some(TypeBound {
                kind: BoundKind::Extends,
                ty,
            }) => ty.as_ref().clone(),
            Some(_) => TypeRef::named("Object"),
            None if self.is_wildcard() => TypeRef::named("Object"),
            None => self.clone(),
        }
    }

    /// Boxed form usable as a generic argument.
    pub fn boxed(&self) -> TypeRef {
        match self.as_primitive() {
            Some(kind) => TypeRef::named(kind.wrapper()),
            None => self.clone(),
        }
    }

    pub fn same_erasure(&self, other: &TypeRef) -> bool {
        self.simple_name() == other.simple_name() && self.dims == other.dims
    }
}

impl Display for TypeRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)?;
        if let Some(bound) = &self.bound {
            let keyword = match bound.kind {
                BoundKind::Extends => "extends",
                BoundKind::Super => "super",
            };
            write!(f, " {} {}", keyword, bound.ty)?;
        }
        if let Some(args) = &self.args {
            f.write_str("<")?;
            for (idx, arg) in args.iter().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", arg)?;
            }
            f.write_str(">")?;
        }
        for _ in 0..self.dims {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trips_shapes() {
        let map = TypeRef::generic(
            "Map",
            vec![
                TypeRef::string(),
                TypeRef::generic("List", vec![TypeRef::named("Integer")]),
            ],
        );
        assert_eq!(map.to_string(), "Map<String, List<Integer>>");
        assert_eq!(TypeRef::generic("ArrayList", vec![]).to_string(), "ArrayList<>");
        assert_eq!(
            TypeRef::array_of(TypeRef::primitive(PrimitiveKind::Int)).to_string(),
            "int[]"
        );
    }

    #[test]
    fn element_types() {
        let list = TypeRef::generic(
            "List",
            vec![TypeRef {
                name: "?".into(),
                args: None,
                dims: 0,
                bound: Some(TypeBound {
                    kind: BoundKind::Extends,
                    ty: Box::new(TypeRef::named("Number")),
                }),
            }],
        );
        assert_eq!(list.element_type(), Some(TypeRef::named("Number")));
        let ints = TypeRef::array_of(TypeRef::primitive(PrimitiveKind::Int));
        assert_eq!(ints.element_type(), Some(TypeRef::primitive(PrimitiveKind::Int)));
    }

    #[test]
    fn promotion_widens_to_int() {
        assert_eq!(PrimitiveKind::Byte.promote(PrimitiveKind::Short), PrimitiveKind::Int);
        assert_eq!(PrimitiveKind::Int.promote(PrimitiveKind::Long), PrimitiveKind::Long);
        assert_eq!(PrimitiveKind::Float.promote(PrimitiveKind::Long), PrimitiveKind::Float);
    }
}
