//! Accumulator updates and the `reduce` combiner chosen for them.

use lf_core::ast::{Expr, ExprKind, Ident, LitKind, PrimitiveKind, Stmt, StmtKind, TypeRef};
use lf_core::ops::{AssignOp, BinOpKind};
use lf_core::scope::Declaration;
use serde::{Deserialize, Serialize};

use crate::pipeline::Combiner;
use crate::queries::references_in_expr;

/// Annotations that prove a reference is non-null on entry.
pub const NON_NULL_ANNOTATIONS: &[&str] = &["NonNull", "Nonnull", "NotNull"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccumulatorOp {
    /// `acc += e`, `acc = acc + e`; concatenation for strings.
    Add,
    Sub,
    Mul,
    Max,
    Min,
    Increment,
    Decrement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccumulatorUpdate {
    pub accumulator: Ident,
    pub op: AccumulatorOp,
    /// Value folded into the accumulator; `None` for increment/decrement.
    pub operand: Option<Expr>,
}

fn is_literal_one(expr: &Expr) -> bool {
    match expr.strip_parens().as_literal() {
        Some(lit) => {
            matches!(lit.kind, LitKind::Int | LitKind::Long)
                && matches!(lit.text.as_str(), "1" | "1L" | "1l")
        }
        None => false,
    }
}

/// Recognize `stmt` as an update of a single accumulator variable.
pub fn detect_update(stmt: &Stmt) -> Option<AccumulatorUpdate> {
    let StmtKind::Expr(expr) = &stmt.kind else {
        return None;
    };
    let update = match expr.kind() {
        ExprKind::Unary(unary) if unary.op.is_update() => {
            let accumulator = unary.expr.strip_parens().as_name()?.clone();
            let op = if unary.op.is_increment() {
                AccumulatorOp::Increment
            } else {
                AccumulatorOp::Decrement
            };
            AccumulatorUpdate {
                accumulator,
                op,
                operand: None,
            }
        }
        ExprKind::Assign(assign) => {
            let accumulator = assign.target.strip_parens().as_name()?.clone();
            let value = &assign.value;
            match assign.op {
                AssignOp::Add if is_literal_one(value) => AccumulatorUpdate {
                    accumulator,
                    op: AccumulatorOp::Increment,
                    operand: None,
                },
                AssignOp::Sub if is_literal_one(value) => AccumulatorUpdate {
                    accumulator,
                    op: AccumulatorOp::Decrement,
                    operand: None,
                },
                AssignOp::Add | AssignOp::Sub | AssignOp::Mul => AccumulatorUpdate {
                    op: match assign.op {
                        AssignOp::Add => AccumulatorOp::Add,
                        AssignOp::Sub => AccumulatorOp::Sub,
                        _ => AccumulatorOp::Mul,
                    },
                    operand: Some(value.clone()),
                    accumulator,
                },
                AssignOp::Assign => detect_plain_assign(accumulator, value)?,
                _ => return None,
            }
        }
        _ => return None,
    };
    match &update.operand {
        Some(operand) if references_in_expr(operand, update.accumulator.as_str()) => None,
        _ => Some(update),
    }
}

/// `acc = acc + e`, `acc = Math.max(acc, e)`, `acc = Math.min(e, acc)`.
fn detect_plain_assign(accumulator: Ident, value: &Expr) -> Option<AccumulatorUpdate> {
    let value = value.strip_parens();
    match value.kind() {
        ExprKind::Binary(bin)
            if bin.op == BinOpKind::Add && bin.lhs.strip_parens().is_name(accumulator.as_str()) =>
        {
            Some(AccumulatorUpdate {
                accumulator,
                op: AccumulatorOp::Add,
                operand: Some(bin.rhs.clone()),
            })
        }
        ExprKind::MethodCall(call) => {
            let class = call.target.as_ref()?.as_name()?;
            if class != "Math" || call.args.len() != 2 {
                return None;
            }
            let op = match call.name.as_str() {
                "max" => AccumulatorOp::Max,
                "min" => AccumulatorOp::Min,
                _ => return None,
            };
            let operand = match (&call.args[0], &call.args[1]) {
                (lhs, rhs) if lhs.strip_parens().is_name(accumulator.as_str()) => rhs.clone(),
                (lhs, rhs) if rhs.strip_parens().is_name(accumulator.as_str()) => lhs.clone(),
                _ => return None,
            };
            Some(AccumulatorUpdate {
                accumulator,
                op,
                operand: Some(operand),
            })
        }
        _ => None,
    }
}

/// How an accumulator update becomes `map(..).reduce(acc, combiner)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReducePlan {
    /// Value each element is mapped to; `None` when the element itself is
    /// folded as is.
    pub mapped: Option<Expr>,
    pub mapped_type: TypeRef,
    pub combiner: Combiner,
    pub accumulator_type: TypeRef,
}

/// Inputs the planner needs beyond the update itself.
pub struct ReduceContext<'a> {
    pub accumulator: &'a Declaration,
    /// Current element binding.
    pub binding: &'a Ident,
    /// Static type of the operand, when known.
    pub operand_type: Option<TypeRef>,
    /// Name for a lambda parameter the combiner ignores.
    pub unused_param: Ident,
    /// Names the combiner's lambda parameters must avoid.
    pub taken: &'a dyn Fn(&str) -> bool,
}

fn typed_one(kind: PrimitiveKind) -> Expr {
    match kind {
        PrimitiveKind::Long => Expr::literal(LitKind::Long, "1L"),
        PrimitiveKind::Float => Expr::literal(LitKind::Float, "1.0f"),
        PrimitiveKind::Double => Expr::literal(LitKind::Double, "1.0"),
        _ => Expr::int(1),
    }
}

fn method_ref(class: &str, method: &str) -> Combiner {
    Combiner::MethodRef {
        class: class.to_string(),
        method: method.to_string(),
    }
}

fn binary_lambda(ctx: &ReduceContext<'_>, op: BinOpKind) -> Combiner {
    let lhs = crate::queries::fresh_name("a", ctx.taken);
    let rhs = crate::queries::fresh_name("b", |name| name == lhs.as_str() || (ctx.taken)(name));
    Combiner::Lambda {
        body: Expr::binary(op, Expr::name(lhs.clone()), Expr::name(rhs.clone())),
        params: [lhs, rhs],
    }
}

/// Plan the reduction, or `None` when the accumulator cannot be folded.
pub fn plan_reduce(update: &AccumulatorUpdate, ctx: &ReduceContext<'_>) -> Option<ReducePlan> {
    let accumulator_type = ctx.accumulator.ty.clone()?;
    if accumulator_type.is_string() {
        return plan_concat(update, ctx, accumulator_type);
    }
    let kind = accumulator_type.numeric_kind()?;
    let narrow = matches!(
        kind,
        PrimitiveKind::Byte | PrimitiveKind::Short | PrimitiveKind::Char
    );
    if !kind.is_numeric() || narrow {
        return None;
    }
    let operand_kind = match &update.operand {
        Some(_) => ctx.operand_type.as_ref().and_then(TypeRef::numeric_kind),
        None => None,
    };
    if let Some(operand_kind) = operand_kind {
        // `acc += e` narrows the running total, not each element, and a boxed
        // operand cannot be cast to a narrower primitive.
        if !operand_kind.is_numeric() || operand_kind.promote(kind) != kind {
            lf_core::trace!("`{}` operand would narrow into {}", update.accumulator, kind.keyword());
            return None;
        }
    }
    let wrapper = kind.wrapper();
    let mapped_type = TypeRef::primitive(kind);

    let combiner = match update.op {
        AccumulatorOp::Increment => match kind {
            PrimitiveKind::Int | PrimitiveKind::Long => method_ref(wrapper, "sum"),
            _ => increment_lambda(ctx, BinOpKind::Add),
        },
        AccumulatorOp::Decrement => increment_lambda(ctx, BinOpKind::Sub),
        AccumulatorOp::Add => method_ref(wrapper, "sum"),
        AccumulatorOp::Max => method_ref(wrapper, "max"),
        AccumulatorOp::Min => method_ref(wrapper, "min"),
        AccumulatorOp::Sub => binary_lambda(ctx, BinOpKind::Sub),
        AccumulatorOp::Mul => binary_lambda(ctx, BinOpKind::Mul),
    };

    let mapped = match &update.operand {
        None => Some(typed_one(kind)),
        Some(operand) => {
            let needs_cast = operand_kind.map_or(false, |operand_kind| operand_kind != kind);
            if needs_cast {
                Some(Expr::cast(mapped_type.clone(), operand.clone()))
            } else if operand.strip_parens().is_name(ctx.binding.as_str()) {
                None
            } else {
                Some(operand.clone())
            }
        }
    };
    Some(ReducePlan {
        mapped,
        mapped_type,
        combiner,
        accumulator_type,
    })
}

/// `(accumulator, _item) -> accumulator + 1`
fn increment_lambda(ctx: &ReduceContext<'_>, op: BinOpKind) -> Combiner {
    let accumulator = crate::queries::fresh_name("accumulator", ctx.taken);
    Combiner::Lambda {
        body: Expr::binary(op, Expr::name(accumulator.clone()), Expr::int(1)),
        params: [accumulator, ctx.unused_param.clone()],
    }
}

fn plan_concat(
    update: &AccumulatorUpdate,
    ctx: &ReduceContext<'_>,
    accumulator_type: TypeRef,
) -> Option<ReducePlan> {
    if update.op != AccumulatorOp::Add {
        return None;
    }
    let operand = update.operand.as_ref()?;
    let non_null = NON_NULL_ANNOTATIONS
        .iter()
        .any(|name| ctx.accumulator.has_annotation(name));
    let combiner = if non_null {
        method_ref("String", "concat")
    } else {
        binary_lambda(ctx, BinOpKind::Add)
    };
    let operand_is_string = ctx.operand_type.as_ref().map_or(false, TypeRef::is_string);
    let mapped = if !operand_is_string {
        Some(Expr::static_call("String", "valueOf", vec![operand.clone()]))
    } else if operand.strip_parens().is_name(ctx.binding.as_str()) {
        None
    } else {
        Some(operand.clone())
    };
    Some(ReducePlan {
        mapped,
        mapped_type: TypeRef::string(),
        combiner,
        accumulator_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lf_lang::parse_statement;

    fn update(src: &str) -> Option<AccumulatorUpdate> {
        detect_update(&parse_statement(src).unwrap_or_else(|e| panic!("{src}: {e}")))
    }

    fn plan(decl: Declaration, src: &str, operand_type: Option<TypeRef>) -> Option<ReducePlan> {
        let update = update(src)?;
        let binding = Ident::new("x");
        let taken = |name: &str| name == "x" || name == "sum";
        plan_reduce(
            &update,
            &ReduceContext {
                accumulator: &decl,
                binding: &binding,
                operand_type,
                unused_param: Ident::new("_item"),
                taken: &taken,
            },
        )
    }

    #[test]
    fn detects_update_shapes() {
        assert_eq!(update("sum += x;").map(|u| u.op), Some(AccumulatorOp::Add));
        assert_eq!(update("sum = sum + x;").map(|u| u.op), Some(AccumulatorOp::Add));
        assert_eq!(update("count++;").map(|u| u.op), Some(AccumulatorOp::Increment));
        assert_eq!(update("count += 1;").map(|u| u.op), Some(AccumulatorOp::Increment));
        assert_eq!(update("count -= 1;").map(|u| u.op), Some(AccumulatorOp::Decrement));
        assert_eq!(update("best = Math.max(x, best);").map(|u| u.op), Some(AccumulatorOp::Max));
        assert_eq!(update("sum += sum;"), None);
        assert_eq!(update("sum /= x;"), None);
        assert_eq!(update("sum = x + sum;"), None);
    }

    #[test]
    fn int_sum_uses_method_ref() {
        let decl = Declaration::local("sum", TypeRef::primitive(PrimitiveKind::Int));
        let plan = plan(decl, "sum += x;", Some(TypeRef::named("Integer"))).unwrap();
        assert_eq!(plan.combiner, method_ref("Integer", "sum"));
        assert_eq!(plan.mapped, None);
    }

    #[test]
    fn float_increment_uses_lambda() {
        let decl = Declaration::local("len", TypeRef::primitive(PrimitiveKind::Float));
        let plan = plan(decl, "len++;", None).unwrap();
        let Combiner::Lambda { params, .. } = &plan.combiner else {
            panic!("expected lambda combiner");
        };
        assert_eq!(params[0].as_str(), "accumulator");
        assert_eq!(params[1].as_str(), "_item");
        assert_eq!(plan.mapped, Some(Expr::literal(LitKind::Float, "1.0f")));
    }

    #[test]
    fn widening_casts_operand() {
        let decl = Declaration::local("total", TypeRef::primitive(PrimitiveKind::Long));
        let plan = plan(decl, "total += x;", Some(TypeRef::primitive(PrimitiveKind::Int))).unwrap();
        assert_eq!(
            plan.mapped,
            Some(Expr::cast(TypeRef::primitive(PrimitiveKind::Long), Expr::name("x")))
        );
    }

    #[test]
    fn narrowing_operands_are_not_folded() {
        let int_total = Declaration::local("acc", TypeRef::primitive(PrimitiveKind::Int));
        assert_eq!(
            plan(int_total, "acc += x;", Some(TypeRef::primitive(PrimitiveKind::Double))),
            None
        );
        let float_total = Declaration::local("acc", TypeRef::primitive(PrimitiveKind::Float));
        assert_eq!(plan(float_total, "acc += x;", Some(TypeRef::named("Double"))), None);
        let long_best = Declaration::local("best", TypeRef::primitive(PrimitiveKind::Int));
        assert_eq!(
            plan(long_best, "best = Math.max(best, x);", Some(TypeRef::primitive(PrimitiveKind::Long))),
            None
        );
    }

    #[test]
    fn boxed_widening_keeps_the_cast() {
        let decl = Declaration::local("total", TypeRef::primitive(PrimitiveKind::Double));
        let plan = plan(decl, "total += x;", Some(TypeRef::named("Integer"))).unwrap();
        assert_eq!(
            plan.mapped,
            Some(Expr::cast(TypeRef::primitive(PrimitiveKind::Double), Expr::name("x")))
        );
        assert_eq!(plan.combiner, method_ref("Double", "sum"));
    }

    #[test]
    fn narrow_accumulators_are_not_folded() {
        let decl = Declaration::local("b", TypeRef::primitive(PrimitiveKind::Byte));
        assert_eq!(plan(decl, "b += x;", None), None);
    }

    #[test]
    fn string_concat_depends_on_nullness() {
        let plain = Declaration::local("sum", TypeRef::string());
        let plan_plain = plan(plain, "sum += x;", Some(TypeRef::string())).unwrap();
        assert!(matches!(plan_plain.combiner, Combiner::Lambda { .. }));

        let annotated =
            Declaration::local("sum", TypeRef::string()).with_annotations(vec!["NonNull".into()]);
        let plan_annotated = plan(annotated, "sum += x;", Some(TypeRef::string())).unwrap();
        assert_eq!(plan_annotated.combiner, method_ref("String", "concat"));
    }
}
