//! Runtime value model (§3, §4.5).
//!
//! A tagged union over the primitive and compound shapes the VM manipulates.
//! Strings, objects, and lists own their storage; borrows and refs are
//! non-owning pointers into storage owned elsewhere (a stack slot, a global
//! slot, or a parent object/list). Nothing here is grounded on the
//! teacher's generated-assembly `Value` (it never had a runtime value type —
//! it compiled straight to machine words); the tagged `enum Value` shape
//! itself is grounded on `navicore-cem3`'s `runtime/src/value.rs` (same
//! "pure data" tagged union with a composite/variant case holding an owned
//! field array). The `Rc<RefCell<_>>`-backed `Borrow`/`Ref` cases are this
//! port's own addition, needed because this language (unlike cem3's stack
//! language) has view/mod ownership modifiers with no cem3 counterpart to
//! crib from.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Which side of an ownership modifier a [`Value::Borrow`] was taken under
/// (§3 `AstTypeRef` modifiers `view`/`mod`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowKind {
    View,
    Mod,
}

/// A fixed-size, named-field record (an instance of a `type` declaration).
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectValue {
    pub type_name: String,
    pub fields: Vec<(String, Value)>,
}

impl ObjectValue {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn set(&mut self, name: &str, value: Value) -> bool {
        for (n, v) in self.fields.iter_mut() {
            if n == name {
                *v = value;
                return true;
            }
        }
        false
    }
}

/// Tagged-union runtime value (§3).
///
/// `Borrow` and `Ref` hold an `Rc<RefCell<Value>>` to the slot they point
/// into rather than a raw pointer: the arena/slot that owns the pointee is
/// kept alive exactly as long as something still borrows it, which gives us
/// the "no borrow escapes the function that produced its target" invariant
/// for free in safe Rust rather than needing unsafe lifetime bookkeeping.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Char(char),
    Str(String),
    None,
    Object(ObjectValue),
    List(Vec<Value>),
    Array(Vec<Value>),
    Id(i64),
    Key(String),
    Borrow { target: Rc<RefCell<Value>>, kind: BorrowKind },
    Ref(Rc<RefCell<Value>>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Char(_) => "char",
            Value::Str(_) => "string",
            Value::None => "none",
            Value::Object(_) => "object",
            Value::List(_) => "list",
            Value::Array(_) => "array",
            Value::Id(_) => "id",
            Value::Key(_) => "key",
            Value::Borrow { .. } => "borrow",
            Value::Ref(_) => "ref",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::None => false,
            Value::Int(i) => *i != 0,
            _ => true,
        }
    }

    /// Deep-clones owned storage (strings, objects, lists, arrays); copies
    /// scalars by value; clones the `Rc` (not the pointee) for borrows and
    /// refs, since those never own their target (§3).
    pub fn deep_clone(&self) -> Value {
        match self {
            Value::Object(o) => Value::Object(ObjectValue {
                type_name: o.type_name.clone(),
                fields: o.fields.iter().map(|(n, v)| (n.clone(), v.deep_clone())).collect(),
            }),
            Value::List(items) => Value::List(items.iter().map(Value::deep_clone).collect()),
            Value::Array(items) => Value::Array(items.iter().map(Value::deep_clone).collect()),
            other => other.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Char(c) => write!(f, "{c}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::None => write!(f, "none"),
            Value::Id(i) => write!(f, "{i}"),
            Value::Key(k) => write!(f, "{k}"),
            Value::Object(o) => {
                write!(f, "{}(", o.type_name)?;
                for (i, (name, v)) in o.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}: {v}")?;
                }
                write!(f, ")")
            }
            Value::List(items) | Value::Array(items) => {
                write!(f, "[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            Value::Borrow { target, .. } => write!(f, "{}", target.borrow()),
            Value::Ref(target) => write!(f, "{}", target.borrow()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => *a as f64 == *b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::None, Value::None) => true,
            (Value::Id(a), Value::Id(b)) => a == b,
            (Value::Key(a), Value::Key(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Borrow { target: a, .. }, Value::Borrow { target: b, .. }) => {
                *a.borrow() == *b.borrow()
            }
            (Value::Ref(a), Value::Ref(b)) => *a.borrow() == *b.borrow(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_clone_duplicates_list_contents_not_aliases() {
        let original = Value::List(vec![Value::Str("a".into())]);
        let mut cloned = original.deep_clone();
        if let Value::List(items) = &mut cloned {
            items[0] = Value::Str("b".into());
        }
        assert_eq!(original, Value::List(vec![Value::Str("a".into())]));
    }

    #[test]
    fn int_float_equality_promotes_int_to_float() {
        assert_eq!(Value::Int(2), Value::Float(2.0));
    }

    #[test]
    fn none_is_falsy_and_nonzero_int_is_truthy() {
        assert!(!Value::None.is_truthy());
        assert!(Value::Int(7).is_truthy());
        assert!(!Value::Int(0).is_truthy());
    }

    #[test]
    fn object_field_lookup_by_name() {
        let obj = ObjectValue {
            type_name: "Point".into(),
            fields: vec![("x".into(), Value::Int(1)), ("y".into(), Value::Int(2))],
        };
        assert_eq!(obj.get("y"), Some(&Value::Int(2)));
        assert_eq!(obj.get("z"), None);
    }
}
