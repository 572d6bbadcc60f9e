use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

/// A single lexical scope frame. Resolved lookups never search the chain,
/// they walk exactly the resolved number of parents and then read that one
/// frame directly.
#[derive(Debug)]
pub(crate) struct Environment {
    enclosing: Option<Rc<RefCell<Environment>>>,
    values: HashMap<String, Value>,
}

#[derive(Debug, PartialEq)]
pub(crate) struct UndefinedVariable;

impl Environment {
    pub(crate) fn new() -> Self {
        Environment {
            enclosing: None,
            values: HashMap::new(),
        }
    }

    pub(crate) fn with(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            enclosing: Some(enclosing),
            values: HashMap::new(),
        }
    }

    pub(crate) fn define(&mut self, key: &str, value: Value) {
        self.values.insert(String::from(key), value);
    }

    pub(crate) fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    pub(crate) fn get_at(&self, dist: usize, key: &str) -> Option<Value> {
        if dist == 0 {
            self.get(key)
        } else {
            self.enclosing
                .as_ref()
                .and_then(|parent| parent.borrow().get_at(dist - 1, key))
        }
    }

    pub(crate) fn assign(&mut self, key: &str, value: Value) -> Result<(), UndefinedVariable> {
        if let Some(val) = self.values.get_mut(key) {
            *val = value;
            Ok(())
        } else {
            Err(UndefinedVariable)
        }
    }

    pub(crate) fn assign_at(
        &mut self,
        dist: usize,
        key: &str,
        value: Value,
    ) -> Result<(), UndefinedVariable> {
        if dist == 0 {
            self.assign(key, value)
        } else if let Some(parent) = &self.enclosing {
            parent.as_ref().borrow_mut().assign_at(dist - 1, key, value)
        } else {
            Err(UndefinedVariable)
        }
    }
}
