use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::list::List;
use crate::object::{Binding, Closure, Lambda, Object, Primitive};
use crate::{Arity, Error};

/// Environment for variable bindings
///
/// A shared handle to a sequence of [`Object::Binding`]s. Lookup scans front-to-back
/// and returns the first match, so shadowing follows insertion order. Cloning the
/// handle shares the sequence: closures capture their defining environment this way.
#[derive(Clone, Default)]
pub struct Environment(Rc<RefCell<List>>);

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    /// Value bound to `symbol`, or an error object `"<symbol> Not Found"`
    pub fn lookup(&self, symbol: &Object) -> Object {
        let found = match symbol {
            Object::Symbol(name) => self.get(name),
            _ => None,
        };
        found.unwrap_or_else(|| Error::LookupError(symbol.to_string()).into())
    }

    /// Value of the first binding named `name`
    pub fn get(&self, name: &str) -> Option<Object> {
        self.find_binding(name)
            .map(|binding| binding.borrow().value.clone())
    }

    fn find_binding(&self, name: &str) -> Option<Rc<RefCell<Binding>>> {
        self.0.borrow().iter().find_map(|entry| match entry {
            Object::Binding(binding) if binding.borrow().symbol == name => {
                Some(Rc::clone(binding))
            }
            _ => None,
        })
    }

    /// Append a new binding without checking for an existing one; an earlier
    /// binding of the same name keeps shadowing it
    pub fn define(&self, name: impl Into<String>, value: Object) {
        self.0.borrow_mut().append(Object::binding(name, value));
    }

    /// Mutate the first binding named `name` in place, or define it when absent.
    /// Returns whether an existing binding was updated.
    pub fn set(&self, name: &str, value: Object) -> bool {
        match self.find_binding(name) {
            Some(binding) => {
                binding.borrow_mut().value = value;
                true
            }
            None => {
                log::debug!("set on unbound symbol {name}, defining it");
                self.define(name, value);
                false
            }
        }
    }

    /// Number of bindings, shadowed ones included
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Snapshot of `(name, value)` pairs in lookup order
    pub fn bindings(&self) -> Vec<(String, Object)> {
        self.0
            .borrow()
            .iter()
            .filter_map(|entry| match entry {
                Object::Binding(binding) => {
                    let binding = binding.borrow();
                    Some((binding.symbol.clone(), binding.value.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Whether both handles share the same binding sequence
    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Register a native procedure under `name`.
    ///
    /// # Example
    /// ```
    /// use mgclisp::{Arity, Object};
    /// use mgclisp::evaluator::create_global_env;
    ///
    /// let env = create_global_env();
    /// env.register_primitive("answer", Arity::Exact(0), |_args| Ok(Object::Int(42)));
    /// assert_eq!(mgclisp::eval(&mgclisp::parser::parse("(answer)").unwrap(), &env), Object::Int(42));
    /// ```
    pub fn register_primitive(
        &self,
        name: &str,
        arity: Arity,
        func: impl Fn(&List) -> Result<Object, Error> + 'static,
    ) {
        let primitive = Primitive::new(name, arity, func);
        self.define(name, Object::closure(Closure::Primitive(primitive)));
    }

    /// Build the environment for one application of `lambda`.
    ///
    /// Parameters are bound positionally to `args`, then the bindings of the captured
    /// environment and finally those of the caller's environment are merged in with
    /// `add_missing`. Lookup therefore sees parameters first, then lexically captured
    /// names, then whatever is visible at the call site.
    pub(crate) fn for_call(
        lambda: &Lambda,
        mut args: List,
        caller: &Environment,
    ) -> Result<Environment, Error> {
        let fixed = lambda.params.len();
        let arity = match lambda.rest {
            Some(_) => Arity::AtLeast(fixed),
            None => Arity::Exact(fixed),
        };
        arity.validate(args.len())?;

        let mut frame = List::new();
        for param in &lambda.params {
            frame.append(Object::binding(param.as_str(), args.pop_front()?));
        }
        if let Some(rest) = &lambda.rest {
            frame.append(Object::binding(rest.as_str(), Object::List(args)));
        }

        frame.add_missing(&lambda.env.0.borrow());
        frame.add_missing(&caller.0.borrow());
        Ok(Environment(Rc::new(RefCell::new(frame))))
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Bindings may hold closures capturing this environment, so only the size is shown
        write!(f, "Environment({} bindings)", self.len())
    }
}

/// Rendered as the list of bound symbols
impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.borrow())
    }
}
