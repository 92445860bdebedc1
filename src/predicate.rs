//! 谓词表达式树, 翻译器的输入
//!
//! The tree is built once by the caller (usually through [`crate::parser::lower`])
//! and is read-only while it is being translated.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

/// 谓词树的节点
#[derive(Debug, Clone, PartialEq)]
pub enum PredicateNode {
    /// 叶子节点: `p.Field <op> value`
    Comparison {
        operator: CompareOp,
        left: FieldRef,
        right: ValueExpr,
    },
    /// 逻辑组合: `left AND right` / `left OR right`
    Logical {
        operator: LogicalOp,
        left: Box<PredicateNode>,
        right: Box<PredicateNode>,
    },
    /// `!(...)`
    Negation(Box<PredicateNode>),
    /// `|p| true`
    Constant(bool),
    /// `|p| p.IsActive`
    FieldTest(FieldRef),
}

impl PredicateNode {
    pub fn comparison(operator: CompareOp, left: FieldRef, right: ValueExpr) -> Self {
        PredicateNode::Comparison { operator, left, right }
    }

    pub fn logical(operator: LogicalOp, left: PredicateNode, right: PredicateNode) -> Self {
        PredicateNode::Logical {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn and(left: PredicateNode, right: PredicateNode) -> Self {
        Self::logical(LogicalOp::And, left, right)
    }

    pub fn or(left: PredicateNode, right: PredicateNode) -> Self {
        Self::logical(LogicalOp::Or, left, right)
    }

    /// Short description used in `UnsupportedNode` errors.
    pub fn describe(&self) -> String {
        match self {
            PredicateNode::Comparison { operator, left, .. } => {
                format!("Comparison({:?} on {})", operator, left)
            }
            PredicateNode::Logical { operator, .. } => format!("Logical({:?})", operator),
            PredicateNode::Negation(_) => "Negation".to_string(),
            PredicateNode::Constant(value) => format!("Constant({})", value),
            PredicateNode::FieldTest(field) => format!("FieldTest({})", field),
        }
    }
}

/// 比较运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    Not,
    Modulo, // 没有对应的查询符号
}

/// 逻辑运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    ExclusiveOr, // 没有对应的查询符号
}

/// Any operator that can appear in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Compare(CompareOp),
    Logical(LogicalOp),
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Compare(op) => write!(f, "{:?}", op),
            Operator::Logical(op) => write!(f, "{:?}", op),
        }
    }
}

/// 记录字段引用, 例如 `p.Name`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    /// 闭包参数名 (`p`)
    pub parameter: String,
    /// 字段名 (`Name`)
    pub field: String,
}

impl FieldRef {
    pub fn new(parameter: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
            field: field.into(),
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.parameter, self.field)
    }
}

/// 比较运算的右操作数
#[derive(Debug, Clone, PartialEq)]
pub enum ValueExpr {
    /// 直接写在树里的值
    Literal(Value),
    /// `holder.member`
    FieldOfConstant { holder: ConstantRef, member: String },
    /// `outer.outer_member.inner_member`
    FieldOfFieldOfConstant {
        outer: ConstantRef,
        outer_member: String,
        inner_member: String,
    },
    /// 类型转换, 翻译时直接拆开
    Converted(Box<ValueExpr>),
}

impl ValueExpr {
    pub fn literal(value: impl Into<Value>) -> Self {
        ValueExpr::Literal(value.into())
    }

    pub fn field_of(holder: ConstantRef, member: impl Into<String>) -> Self {
        ValueExpr::FieldOfConstant {
            holder,
            member: member.into(),
        }
    }

    pub fn field_of_field(
        outer: ConstantRef,
        outer_member: impl Into<String>,
        inner_member: impl Into<String>,
    ) -> Self {
        ValueExpr::FieldOfFieldOfConstant {
            outer,
            outer_member: outer_member.into(),
            inner_member: inner_member.into(),
        }
    }

    pub fn converted(inner: ValueExpr) -> Self {
        ValueExpr::Converted(Box::new(inner))
    }
}

/// Read access to a value captured when the tree was built.
///
/// Fields and properties are not distinguished: both are looked up by name.
pub trait Captured: fmt::Debug + Send + Sync {
    fn type_name(&self) -> &str;

    fn member(&self, name: &str) -> Option<Value>;
}

/// 捕获常量的共享只读句柄
#[derive(Clone)]
pub struct ConstantRef(Arc<dyn Captured>);

impl ConstantRef {
    pub fn new<C: Captured + 'static>(captured: C) -> Self {
        ConstantRef(Arc::new(captured))
    }

    pub fn type_name(&self) -> &str {
        self.0.type_name()
    }

    pub fn member(&self, name: &str) -> Option<Value> {
        self.0.member(name)
    }
}

impl fmt::Debug for ConstantRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

/// Two handles are equal when they point at the same captured object.
impl PartialEq for ConstantRef {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

/// 通用的具名成员集合, 用于闭包环境和 JSON 配置里的捕获值
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    type_name: String,
    members: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            members: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.members.insert(name.into(), value.into());
    }

    /// 合并 `other` 的成员, 同名成员以 `other` 为准
    pub fn merge(&mut self, other: &Record) {
        for (name, value) in &other.members {
            self.members.insert(name.clone(), value.clone());
        }
    }
}

impl Captured for Record {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn member(&self, name: &str) -> Option<Value> {
        self.members.get(name).cloned()
    }
}

/// 运行时的值
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    UniqueId(Uuid),
    Object(ConstantRef),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Text(_) => ValueKind::Text,
            Value::UniqueId(_) => ValueKind::UniqueId,
            Value::Int(_) => ValueKind::Integer,
            Value::Null | Value::Bool(_) | Value::Float(_) | Value::Object(_) => ValueKind::Other,
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "i64",
            Value::Float(_) => "f64",
            Value::Text(_) => "String",
            Value::UniqueId(_) => "Uuid",
            Value::Object(object) => object.type_name(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
            Value::UniqueId(id) => write!(f, "{}", id.hyphenated()),
            Value::Object(object) => write!(f, "{}", object.type_name()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Uuid> for Value {
    fn from(id: Uuid) -> Self {
        Value::UniqueId(id)
    }
}

impl From<ConstantRef> for Value {
    fn from(object: ConstantRef) -> Self {
        Value::Object(object)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(ConstantRef::new(record))
    }
}

/// 值的语义类型, 决定输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    UniqueId,
    Integer,
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kinds() {
        assert_eq!(Value::from("x").kind(), ValueKind::Text);
        assert_eq!(Value::from(Uuid::nil()).kind(), ValueKind::UniqueId);
        assert_eq!(Value::from(6).kind(), ValueKind::Integer);
        assert_eq!(Value::from(1.5).kind(), ValueKind::Other);
        assert_eq!(Value::from(true).kind(), ValueKind::Other);
        assert_eq!(Value::Null.kind(), ValueKind::Other);
        assert_eq!(Value::from(Record::new("User")).kind(), ValueKind::Other);
    }

    #[test]
    fn test_record_member_lookup() {
        let record = Record::new("User").with("Name", "Namee").with("Age", 33);
        assert_eq!(record.type_name(), "User");
        assert_eq!(record.member("Name"), Some(Value::Text("Namee".to_string())));
        assert_eq!(record.member("Age"), Some(Value::Int(33)));
        assert_eq!(record.member("Missing"), None);
    }

    #[test]
    fn test_merge_overrides_existing_members() {
        let mut record = Record::new("closure").with("name", "built-in").with("age", 1);
        record.merge(&Record::new("config").with("name", "configured"));
        assert_eq!(record.member("name"), Some(Value::Text("configured".to_string())));
        assert_eq!(record.member("age"), Some(Value::Int(1)));
        assert_eq!(record.type_name(), "closure");
    }

    #[test]
    fn test_constant_ref_identity() {
        let a = ConstantRef::new(Record::new("User"));
        let b = a.clone();
        let c = ConstantRef::new(Record::new("User"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_uuid_display_is_lowercase_hyphenated() {
        let id = Uuid::parse_str("F47AC10B-58CC-4372-A567-0E02B2C3D479").unwrap();
        assert_eq!(Value::from(id).to_string(), "f47ac10b-58cc-4372-a567-0e02b2c3d479");
    }

    #[test]
    fn test_describe() {
        let node = PredicateNode::FieldTest(FieldRef::new("p", "IsActive"));
        assert_eq!(node.describe(), "FieldTest(p.IsActive)");
        assert_eq!(PredicateNode::Constant(true).describe(), "Constant(true)");
    }
}
