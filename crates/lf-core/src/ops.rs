use std::fmt::{Display, Formatter};

common_enum! {
    #[derive(Copy)]
    pub enum BinOpKind {
        Mul,
        Div,
        Rem,
        Add,
        Sub,
        Shl,
        Shr,
        UShr,
        Lt,
        Gt,
        Le,
        Ge,
        Eq,
        Ne,
        BitAnd,
        BitXor,
        BitOr,
        And,
        Or,
    }
}

impl BinOpKind {
    /// Binding power, higher binds tighter. Assignment is 1, ternary 2.
    pub fn precedence(&self) -> u8 {
        match self {
            BinOpKind::Or => 3,
            BinOpKind::And => 4,
            BinOpKind::BitOr => 5,
            BinOpKind::BitXor => 6,
            BinOpKind::BitAnd => 7,
            BinOpKind::Eq | BinOpKind::Ne => 8,
            BinOpKind::Lt | BinOpKind::Gt | BinOpKind::Le | BinOpKind::Ge => 9,
            BinOpKind::Shl | BinOpKind::Shr | BinOpKind::UShr => 10,
            BinOpKind::Add | BinOpKind::Sub => 11,
            BinOpKind::Mul | BinOpKind::Div | BinOpKind::Rem => 12,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinOpKind::Mul => "*",
            BinOpKind::Div => "/",
            BinOpKind::Rem => "%",
            BinOpKind::Add => "+",
            BinOpKind::Sub => "-",
            BinOpKind::Shl => "<<",
            BinOpKind::Shr => ">>",
            BinOpKind::UShr => ">>>",
            BinOpKind::Lt => "<",
            BinOpKind::Gt => ">",
            BinOpKind::Le => "<=",
            BinOpKind::Ge => ">=",
            BinOpKind::Eq => "==",
            BinOpKind::Ne => "!=",
            BinOpKind::BitAnd => "&",
            BinOpKind::BitXor => "^",
            BinOpKind::BitOr => "|",
            BinOpKind::And => "&&",
            BinOpKind::Or => "||",
        }
    }

    pub fn is_ret_bool(&self) -> bool {
        matches!(
            self,
            BinOpKind::Lt
                | BinOpKind::Gt
                | BinOpKind::Le
                | BinOpKind::Ge
                | BinOpKind::Eq
                | BinOpKind::Ne
                | BinOpKind::And
                | BinOpKind::Or
        )
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinOpKind::Mul | BinOpKind::Div | BinOpKind::Rem | BinOpKind::Add | BinOpKind::Sub
        )
    }

    pub fn is_shift(&self) -> bool {
        matches!(self, BinOpKind::Shl | BinOpKind::Shr | BinOpKind::UShr)
    }
}

impl Display for BinOpKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

common_enum! {
    #[derive(Copy)]
    pub enum UnOpKind {
        Neg,
        Plus,
        Not,
        BitNot,
        PreInc,
        PreDec,
        PostInc,
        PostDec,
    }
}

impl UnOpKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnOpKind::Neg => "-",
            UnOpKind::Plus => "+",
            UnOpKind::Not => "!",
            UnOpKind::BitNot => "~",
            UnOpKind::PreInc | UnOpKind::PostInc => "++",
            UnOpKind::PreDec | UnOpKind::PostDec => "--",
        }
    }

    pub fn is_postfix(&self) -> bool {
        matches!(self, UnOpKind::PostInc | UnOpKind::PostDec)
    }

    /// `++`/`--` in either position.
    pub fn is_update(&self) -> bool {
        matches!(
            self,
            UnOpKind::PreInc | UnOpKind::PreDec | UnOpKind::PostInc | UnOpKind::PostDec
        )
    }

    pub fn is_increment(&self) -> bool {
        matches!(self, UnOpKind::PreInc | UnOpKind::PostInc)
    }
}

impl Display for UnOpKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

common_enum! {
    #[derive(Copy)]
    pub enum AssignOp {
        Assign,
        Add,
        Sub,
        Mul,
        Div,
        Rem,
        Shl,
        Shr,
        UShr,
        BitAnd,
        BitOr,
        BitXor,
    }
}

impl AssignOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
            AssignOp::Rem => "%=",
            AssignOp::Shl => "<<=",
            AssignOp::Shr => ">>=",
            AssignOp::UShr => ">>>=",
            AssignOp::BitAnd => "&=",
            AssignOp::BitOr => "|=",
            AssignOp::BitXor => "^=",
        }
    }

    /// The binary operator a compound assignment applies.
    pub fn bin_op(&self) -> Option<BinOpKind> {
        Some(match self {
            AssignOp::Assign => return None,
            AssignOp::Add => BinOpKind::Add,
            AssignOp::Sub => BinOpKind::Sub,
            AssignOp::Mul => BinOpKind::Mul,
            AssignOp::Div => BinOpKind::Div,
            AssignOp::Rem => BinOpKind::Rem,
            AssignOp::Shl => BinOpKind::Shl,
            AssignOp::Shr => BinOpKind::Shr,
            AssignOp::UShr => BinOpKind::UShr,
            AssignOp::BitAnd => BinOpKind::BitAnd,
            AssignOp::BitOr => BinOpKind::BitOr,
            AssignOp::BitXor => BinOpKind::BitXor,
        })
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "=" => AssignOp::Assign,
            "+=" => AssignOp::Add,
            "-=" => AssignOp::Sub,
            "*=" => AssignOp::Mul,
            "/=" => AssignOp::Div,
            "%=" => AssignOp::Rem,
            "<<=" => AssignOp::Shl,
            ">>=" => AssignOp::Shr,
            ">>>=" => AssignOp::UShr,
            "&=" => AssignOp::BitAnd,
            "|=" => AssignOp::BitOr,
            "^=" => AssignOp::BitXor,
            _ => return None,
        })
    }
}

impl Display for AssignOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}
