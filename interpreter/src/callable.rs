use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

use lox_core::Token;

use crate::ast::Stmt;
use crate::env::Environment;
use crate::error::Error;
use crate::interpreter::Interpreter;
use crate::value::Value;

#[derive(Debug, PartialEq)]
pub enum CallableType {
    Native,
    Function,
    Class,
}

pub trait Callable {
    fn ty(&self) -> CallableType {
        CallableType::Function
    }

    fn name(&self) -> &str;
    fn arity(&self) -> usize;
    fn execute(
        self: Rc<Self>,
        interpreter: &mut Interpreter,
        args: &[Value],
    ) -> Result<Value, Error>;

    // This is a bit hacky, but the superclass check and `super` lookup need
    // to recover the concrete class from a callable value.
    fn as_class(self: Rc<Self>) -> Option<Rc<Class>>;
}

impl Display for dyn Callable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.ty() {
            CallableType::Native => write!(f, "<native fn>"),
            CallableType::Function => write!(f, "<fn {}>", self.name()),
            CallableType::Class => write!(f, "{}", self.name()),
        }
    }
}

impl Debug for dyn Callable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{:?} {}>", self.ty(), self.name())
    }
}

pub(crate) type BoxedFunction = Box<dyn Fn(&[Value]) -> Result<Value, Error>>;

// `Native` bridges host functions and the interpreter environment. All of
// these trait objects live in the global namespace.
pub(crate) struct Native {
    func: BoxedFunction,
    name: String,
    arity: usize,
}

impl Native {
    pub(crate) fn new(func: BoxedFunction, name: String, arity: usize) -> Self {
        Self { func, name, arity }
    }
}

impl Callable for Native {
    fn ty(&self) -> CallableType {
        CallableType::Native
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn execute(self: Rc<Self>, _: &mut Interpreter, args: &[Value]) -> Result<Value, Error> {
        (self.func)(args)
    }

    fn as_class(self: Rc<Self>) -> Option<Rc<Class>> {
        None
    }
}

#[derive(Debug)]
pub struct Function {
    closure: Rc<RefCell<Environment>>,
    name: Token,
    params: Vec<Token>,
    body: Vec<Stmt>,
    is_init: bool,
}

impl Function {
    // This can be wasteful because I am storing the statements in the body. Maybe it would be
    // better if an Rc instead of a reference is used? That way the functions can just refer to the
    // statements as pointers. But locality is lost since now the statements (and expressions)
    // are just pointers to another place in heap.
    pub(crate) fn new(
        closure: Rc<RefCell<Environment>>,
        name: &Token,
        params: &[Token],
        body: &[Stmt],
        is_init: bool,
    ) -> Self {
        Function {
            closure,
            name: name.clone(),
            params: Vec::from(params),
            body: Vec::from(body),
            is_init,
        }
    }
}

// Helper method that will be called from both functions and methods
fn execute_function(
    function: Rc<Function>,
    closure: Rc<RefCell<Environment>>,
    interpreter: &mut Interpreter,
    args: &[Value],
) -> Result<Value, Error> {
    let mut env = Environment::with(closure);
    for (param, arg) in function.params.iter().zip(args) {
        env.define(&param.lexeme, arg.clone());
    }

    match interpreter.execute_block_with_env(&function.body, Rc::new(RefCell::new(env))) {
        Ok(()) => Ok(Value::Nil),
        Err(Error::Return(value)) => Ok(value.value),
        Err(err) => Err(err),
    }
}

impl Callable for Function {
    fn name(&self) -> &str {
        &self.name.lexeme
    }

    fn arity(&self) -> usize {
        self.params.len()
    }

    fn execute(
        self: Rc<Self>,
        interpreter: &mut Interpreter,
        args: &[Value],
    ) -> Result<Value, Error> {
        let closure = Rc::clone(&self.closure);
        execute_function(self, closure, interpreter, args)
    }

    fn as_class(self: Rc<Self>) -> Option<Rc<Class>> {
        None
    }
}

// A method bound to its receiver. The bound function is referenced through
// an Rc instead of being re-created per lookup, so the body statements are
// not cloned every time a property access binds a method. The receiver is
// both kept here and defined as `this` in a fresh scope frame sitting
// between the method body and the function's original closure.
#[derive(Debug)]
pub struct Method {
    closure: Rc<RefCell<Environment>>,
    function: Rc<Function>,
    receiver: Rc<RefCell<Instance>>,
}

impl Method {
    pub(crate) fn bind(function: Rc<Function>, receiver: Rc<RefCell<Instance>>) -> Self {
        let closure = Rc::new(RefCell::new(Environment::with(Rc::clone(
            &function.closure,
        ))));
        closure
            .borrow_mut()
            .define("this", Value::Instance(Rc::clone(&receiver)));

        Method {
            closure,
            function,
            receiver,
        }
    }
}

impl Callable for Method {
    fn name(&self) -> &str {
        self.function.name()
    }

    fn arity(&self) -> usize {
        self.function.arity()
    }

    fn execute(
        self: Rc<Self>,
        interpreter: &mut Interpreter,
        args: &[Value],
    ) -> Result<Value, Error> {
        let res = execute_function(
            Rc::clone(&self.function),
            Rc::clone(&self.closure),
            interpreter,
            args,
        );

        // An initializer always evaluates to its receiver, even when the
        // body bailed out early with a bare `return`.
        match res {
            Ok(_) if self.function.is_init => Ok(Value::Instance(Rc::clone(&self.receiver))),
            _ => res,
        }
    }

    fn as_class(self: Rc<Self>) -> Option<Rc<Class>> {
        None
    }
}

#[derive(Debug)]
pub struct Class {
    name: String,
    methods: HashMap<String, Rc<Function>>,
    superclass: Option<Rc<Class>>,
}

impl Class {
    pub(crate) fn new(
        name: &str,
        superclass: Option<Rc<Class>>,
        methods: HashMap<String, Rc<Function>>,
    ) -> Rc<Self> {
        Rc::new(Class {
            name: name.to_string(),
            methods,
            superclass,
        })
    }

    /// Walks the inheritance chain and stops at the first hit, which is
    /// what makes overriding work.
    pub(crate) fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        if let Some(fun) = self.methods.get(name) {
            Some(Rc::clone(fun))
        } else if let Some(superclass) = &self.superclass {
            superclass.find_method(name)
        } else {
            None
        }
    }
}

impl Callable for Class {
    fn ty(&self) -> CallableType {
        CallableType::Class
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn arity(&self) -> usize {
        match self.find_method("init") {
            Some(init) => init.arity(),
            _ => 0,
        }
    }

    fn execute(
        self: Rc<Self>,
        interpreter: &mut Interpreter,
        args: &[Value],
    ) -> Result<Value, Error> {
        let instance = Instance::new(Rc::clone(&self));
        if let Some(init) = self.find_method("init") {
            Rc::new(Method::bind(init, Rc::clone(&instance))).execute(interpreter, args)?;
        }

        Ok(Value::Instance(instance))
    }

    fn as_class(self: Rc<Self>) -> Option<Rc<Class>> {
        Some(self)
    }
}

#[derive(Debug)]
pub struct Instance {
    class: Rc<Class>,
    fields: HashMap<String, Value>,
}

impl Instance {
    pub(crate) fn new(class: Rc<Class>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Instance {
            class,
            fields: HashMap::new(),
        }))
    }

    /// Fields shadow methods; a method found on the class chain is returned
    /// freshly bound to this instance.
    pub(crate) fn get(instance: &Rc<RefCell<Self>>, name: &str) -> Option<Value> {
        if let Some(field) = instance.borrow().fields.get(name) {
            Some(field.clone())
        } else {
            instance
                .borrow()
                .class
                .find_method(name)
                .map(|function| Value::Callable(Rc::new(Method::bind(function, Rc::clone(instance)))))
        }
    }

    /// Writes always go to the field map, never to a method slot.
    pub(crate) fn set(&mut self, name: &str, value: Value) -> Value {
        self.fields.insert(String::from(name), value.clone());
        value
    }
}

impl Display for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{} instance>", self.class.name)
    }
}
