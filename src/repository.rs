//! Sample user repository that turns predicates into filter strings.

use uuid::Uuid;

use crate::error::TranslateError;
use crate::predicate::{Captured, ConstantRef, PredicateNode, Record, Value};
use crate::translator::Translator;

/// Number of generated sample users.
pub const SAMPLE_USERS: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub age: i64,
}

impl User {
    /// Sample user number `i`.
    pub fn sample(i: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            name: format!("{} user", i),
            description: format!("{}_user description", i),
            age: i as i64 * 2,
        }
    }
}

impl Captured for User {
    fn type_name(&self) -> &str {
        "User"
    }

    fn member(&self, name: &str) -> Option<Value> {
        let value = match name {
            "Id" => Value::UniqueId(self.id),
            "OwnerId" => Value::UniqueId(self.owner_id),
            "Name" => Value::Text(self.name.clone()),
            "Description" => Value::Text(self.description.clone()),
            "Age" => Value::Int(self.age),
            _ => return None,
        };
        Some(value)
    }
}

pub struct UserRepository {
    users: Vec<User>,
    translator: Translator,
}

impl UserRepository {
    pub fn new(translator: Translator) -> Self {
        Self {
            users: (0..SAMPLE_USERS).map(User::sample).collect(),
            translator,
        }
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Filter string for the given predicate.
    pub fn get_user(&self, filter: &PredicateNode) -> Result<String, TranslateError> {
        self.translator.translate(filter)
    }

    /// Closure environment for the sample data: `user`, `first_user` and `name`,
    /// plus every member of `extra`. 同名时 `extra` 优先.
    pub fn closure_env(&self, extra: &Record) -> ConstantRef {
        let mut env = Record::new(extra.type_name());
        if let Some(first) = self.users.first() {
            env.insert("first_user", ConstantRef::new(first.clone()));
            env.insert("name", first.name.clone());
        }
        if let Some(last) = self.users.last() {
            env.insert("user", ConstantRef::new(last.clone()));
        }
        env.merge(extra);
        ConstantRef::new(env)
    }
}
