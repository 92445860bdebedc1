//! Translate predicate trees over a record's fields into dynamic query filter strings.
//!
//! ```text
//! |p| p.Name == "Some name" && (p.Age == 6 || p.Id == Uuid::nil())
//!   => Name = "Some name" AND Age = 6 OR (Id.Equals(Guid("00000000-0000-0000-0000-000000000000")))
//! ```

pub mod config;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod predicate;
pub mod repository;
pub mod token;
pub mod translator;

pub use error::TranslateError;
pub use parser::lower;
pub use predicate::{
    Captured, CompareOp, ConstantRef, FieldRef, LogicalOp, Operator, PredicateNode, Record, Value,
    ValueExpr, ValueKind,
};
pub use translator::{translate, Translator};
