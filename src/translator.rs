//! Translator that converts a predicate tree into a dynamic query filter string.
//!
//! ```text
//! Name = "Some name" AND Age = 6 OR (Id.Equals(Guid("00000000-0000-0000-0000-000000000000")))
//! ```
//!
//! Nested logical groups are flattened into one left-to-right chain; no
//! parentheses are inserted unless [`TranslatorConfig::parenthesize_groups`]
//! is set. A consumer with its own AND/OR precedence may therefore read a
//! mixed tree differently than it was built.

use tracing::{debug, trace};

use crate::config::TranslatorConfig;
use crate::error::{Result, TranslateError};
use crate::predicate::{
    CompareOp, FieldRef, LogicalOp, Operator, PredicateNode, Value, ValueExpr, ValueKind,
};

/// Translate with the default configuration.
pub fn translate(root: &PredicateNode) -> Result<String> {
    Translator::new().translate(root)
}

/// Converts predicate trees to filter strings. Holds no per-call state.
#[derive(Debug, Clone, Default)]
pub struct Translator {
    config: TranslatorConfig,
}

impl Translator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: TranslatorConfig) -> Self {
        Self { config }
    }

    /// Translate a whole tree. The output buffer lives only for this call.
    pub fn translate(&self, root: &PredicateNode) -> Result<String> {
        let mut out = String::new();
        self.translate_node(root, &mut out)?;
        debug!(filter = %out, "translated predicate");
        Ok(out)
    }

    fn translate_node(&self, node: &PredicateNode, out: &mut String) -> Result<()> {
        trace!(node = %node.describe(), "visiting");
        match node {
            PredicateNode::Comparison { operator, left, right } => {
                out.push_str(&format_comparison(*operator, left, right)?);
                Ok(())
            }
            PredicateNode::Logical { operator, left, right } => {
                let token = token(Operator::Logical(*operator))?;
                self.translate_child(*operator, left, out)?;
                out.push(' ');
                out.push_str(token);
                out.push(' ');
                self.translate_child(*operator, right, out)
            }
            other => Err(TranslateError::UnsupportedNode(other.describe())),
        }
    }

    fn translate_child(&self, parent: LogicalOp, child: &PredicateNode, out: &mut String) -> Result<()> {
        match child {
            PredicateNode::Logical { operator, .. }
                if self.config.parenthesize_groups && *operator != parent =>
            {
                out.push('(');
                self.translate_node(child, out)?;
                out.push(')');
                Ok(())
            }
            PredicateNode::Comparison { .. } | PredicateNode::Logical { .. } => {
                self.translate_node(child, out)
            }
            other => Err(TranslateError::UnsupportedNode(other.describe())),
        }
    }
}

/// Format a single `field <op> value` comparison.
pub fn format_comparison(op: CompareOp, field: &FieldRef, value: &ValueExpr) -> Result<String> {
    let (kind, value) = resolve_value(value)?;
    let token = token(Operator::Compare(op))?;

    match kind {
        ValueKind::Text => Ok(format!("{} {} \"{}\"", field.field, token, value)),
        ValueKind::Integer => Ok(format!("{} {} {}", field.field, token, value)),
        // Always rendered as an equality call, whatever the operator was.
        ValueKind::UniqueId => Ok(format!("({}.Equals(Guid(\"{}\")))", field.field, value)),
        ValueKind::Other => Err(TranslateError::UnsupportedValueType(value.type_name().to_string())),
    }
}

/// Resolve the right-hand operand to its kind and concrete value.
///
/// The value's `Display` is its textual form: bare digits for integers,
/// lowercase hyphenated text for unique identifiers.
pub fn resolve_value(expr: &ValueExpr) -> Result<(ValueKind, Value)> {
    let value = read_operand(expr)?;
    Ok((value.kind(), value))
}

fn read_operand(expr: &ValueExpr) -> Result<Value> {
    match expr {
        ValueExpr::Literal(value) => Ok(value.clone()),
        ValueExpr::Converted(inner) => read_operand(inner),
        ValueExpr::FieldOfConstant { holder, member } => holder.member(member).ok_or_else(|| {
            let path = format!("{}.{}", holder.type_name(), member);
            debug!(%path, "member not found");
            TranslateError::ValueResolutionError(path)
        }),
        ValueExpr::FieldOfFieldOfConstant {
            outer,
            outer_member,
            inner_member,
        } => {
            let path = format!("{}.{}.{}", outer.type_name(), outer_member, inner_member);
            let intermediate = outer.member(outer_member).ok_or_else(|| {
                debug!(%path, "outer member not found");
                TranslateError::ValueResolutionError(path.clone())
            })?;
            let object = match intermediate {
                Value::Object(object) => object,
                other => {
                    debug!(%path, found = other.type_name(), "intermediate is not an object");
                    return Err(TranslateError::ValueResolutionError(path));
                }
            };
            object.member(inner_member).ok_or_else(|| {
                debug!(%path, "inner member not found");
                TranslateError::ValueResolutionError(path)
            })
        }
    }
}

/// Map an operator to its query token.
pub fn token(op: Operator) -> Result<&'static str> {
    match op {
        Operator::Compare(CompareOp::Equal) => Ok("="),
        Operator::Compare(CompareOp::GreaterThan) => Ok(">"),
        Operator::Compare(CompareOp::GreaterOrEqual) => Ok(">="),
        Operator::Compare(CompareOp::LessThan) => Ok("<"),
        Operator::Compare(CompareOp::LessOrEqual) => Ok("<="),
        Operator::Compare(CompareOp::Not | CompareOp::NotEqual) => Ok("NOT"),
        Operator::Logical(LogicalOp::And) => Ok("AND"),
        Operator::Logical(LogicalOp::Or) => Ok("OR"),
        Operator::Compare(CompareOp::Modulo) | Operator::Logical(LogicalOp::ExclusiveOr) => {
            Err(TranslateError::UnsupportedOperator(op.to_string()))
        }
    }
}
