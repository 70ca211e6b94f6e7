//! Declarative field tables.
//!
//! A [`Schema`] lists every attribute of a resource state once, with how it
//! may change and where it lives in the API request body. The generic
//! reconciler in [`crate::reconcile`] walks this table instead of each
//! resource hand-writing its own compare/patch chain.

use std::marker::PhantomData;

use ocmtf_core::Attr;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::reconcile::Violation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    /// Fixed once the resource exists.
    Immutable,
    /// Sent in the patch body when it changes.
    Mutable,
    /// Set by the API, never by the plan.
    Computed,
}

pub type Encoder<S> = Box<dyn Fn(&S) -> Result<Option<Value>, serde_json::Error> + Send + Sync>;
pub type Comparer<S> = Box<dyn Fn(&S, &S) -> bool + Send + Sync>;
pub type Policy<S> = Box<dyn Fn(&S) -> Result<(), Violation> + Send + Sync>;

/// Type-erased view of one `Attr<V>` inside a state record.
trait Access<S>: Send + Sync {
    fn is_unknown(&self, record: &S) -> bool;
    fn is_null(&self, record: &S) -> bool;
    fn same(&self, a: &S, b: &S) -> bool;
    fn render(&self, record: &S) -> String;
    fn to_json(&self, record: &S) -> Result<Option<Value>, serde_json::Error>;
}

struct Getter<F, V> {
    get: F,
    _value: PhantomData<fn() -> V>,
}

impl<S, V, F> Access<S> for Getter<F, V>
where
    F: Fn(&S) -> &Attr<V> + Send + Sync,
    V: PartialEq + Serialize,
{
    fn is_unknown(&self, record: &S) -> bool {
        (self.get)(record).is_unknown()
    }

    fn is_null(&self, record: &S) -> bool {
        (self.get)(record).is_null()
    }

    fn same(&self, a: &S, b: &S) -> bool {
        (self.get)(a) == (self.get)(b)
    }

    fn render(&self, record: &S) -> String {
        (self.get)(record).render()
    }

    fn to_json(&self, record: &S) -> Result<Option<Value>, serde_json::Error> {
        (self.get)(record)
            .known()
            .map(serde_json::to_value)
            .transpose()
    }
}

/// One row of the field table.
pub struct Field<S> {
    name: &'static str,
    mutability: Mutability,
    api_path: &'static str,
    from_state: bool,
    cleared: Option<Value>,
    encoder: Option<Encoder<S>>,
    comparer: Option<Comparer<S>>,
    access: Box<dyn Access<S>>,
}

impl<S> Field<S> {
    /// Attribute name; dotted for nested blocks (`aws_node_pool.instance_type`).
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn mutability(&self) -> Mutability {
        self.mutability
    }

    /// Dotted location in the API body.
    pub fn api_path(&self) -> &'static str {
        self.api_path
    }

    /// Null or unknown plan values take the stored value.
    pub fn from_state(&self) -> bool {
        self.from_state || self.mutability == Mutability::Computed
    }

    /// Body value sent when the plan drops a field that state still holds.
    pub fn cleared_value(&self) -> Option<&Value> {
        self.cleared.as_ref()
    }

    pub fn is_unknown(&self, record: &S) -> bool {
        self.access.is_unknown(record)
    }

    pub fn is_null(&self, record: &S) -> bool {
        self.access.is_null(record)
    }

    pub fn same(&self, a: &S, b: &S) -> bool {
        match &self.comparer {
            Some(compare) => compare(a, b),
            None => self.access.same(a, b),
        }
    }

    pub fn render(&self, record: &S) -> String {
        self.access.render(record)
    }

    /// API body value for this field. `None` leaves the field out of the body.
    pub fn encode(&self, record: &S) -> Result<Option<Value>, serde_json::Error> {
        match &self.encoder {
            Some(encode) => encode(record),
            None => self.access.to_json(record),
        }
    }
}

/// Field table plus resource-level policies for one resource kind.
pub struct Schema<S> {
    type_name: &'static str,
    fields: Vec<Field<S>>,
    policies: Vec<Policy<S>>,
}

impl<S: 'static> Schema<S> {
    pub fn builder(type_name: &'static str) -> SchemaBuilder<S> {
        SchemaBuilder {
            type_name,
            fields: Vec::new(),
            policies: Vec::new(),
        }
    }
}

impl<S> Schema<S> {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &[Field<S>] {
        &self.fields
    }

    pub fn names(&self, mutability: Mutability) -> impl Iterator<Item = &'static str> + '_ {
        self.fields
            .iter()
            .filter(move |f| f.mutability == mutability)
            .map(|f| f.name)
    }

    /// Run every policy against `record`, collecting all failures.
    pub fn check_policies(&self, record: &S) -> Vec<Violation> {
        self.policies
            .iter()
            .filter_map(|policy| policy(record).err())
            .collect()
    }
}

pub struct SchemaBuilder<S> {
    type_name: &'static str,
    fields: Vec<Field<S>>,
    policies: Vec<Policy<S>>,
}

impl<S: 'static> SchemaBuilder<S> {
    pub fn computed<V, F>(self, name: &'static str, get: F) -> Self
    where
        F: Fn(&S) -> &Attr<V> + Send + Sync + 'static,
        V: PartialEq + Serialize + 'static,
    {
        self.field(name, Mutability::Computed, get)
    }

    pub fn immutable<V, F>(self, name: &'static str, get: F) -> Self
    where
        F: Fn(&S) -> &Attr<V> + Send + Sync + 'static,
        V: PartialEq + Serialize + 'static,
    {
        self.field(name, Mutability::Immutable, get)
    }

    pub fn mutable<V, F>(self, name: &'static str, get: F) -> Self
    where
        F: Fn(&S) -> &Attr<V> + Send + Sync + 'static,
        V: PartialEq + Serialize + 'static,
    {
        self.field(name, Mutability::Mutable, get)
    }

    fn field<V, F>(mut self, name: &'static str, mutability: Mutability, get: F) -> Self
    where
        F: Fn(&S) -> &Attr<V> + Send + Sync + 'static,
        V: PartialEq + Serialize + 'static,
    {
        self.fields.push(Field {
            name,
            mutability,
            api_path: name,
            from_state: false,
            cleared: None,
            encoder: None,
            comparer: None,
            access: Box::new(Getter {
                get,
                _value: PhantomData,
            }),
        });
        self
    }

    /// Place the last field at `api_path` in the request body.
    pub fn at(mut self, api_path: &'static str) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.api_path = api_path;
        }
        self
    }

    /// Keep the stored value of the last field when the plan leaves it
    /// null or unknown. For optional attributes the API fills in.
    pub fn from_state(mut self) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.from_state = true;
        }
        self
    }

    /// Send `value` when the plan drops the last field.
    pub fn clears_to(mut self, value: Value) -> Self {
        if let Some(field) = self.fields.last_mut() {
            field.cleared = Some(value);
        }
        self
    }

    pub fn encode_with<E>(mut self, encode: E) -> Self
    where
        E: Fn(&S) -> Result<Option<Value>, serde_json::Error> + Send + Sync + 'static,
    {
        if let Some(field) = self.fields.last_mut() {
            field.encoder = Some(Box::new(encode));
        }
        self
    }

    /// Decide equality of the last field with `compare` instead of `==`.
    pub fn compare_with<C>(mut self, compare: C) -> Self
    where
        C: Fn(&S, &S) -> bool + Send + Sync + 'static,
    {
        if let Some(field) = self.fields.last_mut() {
            field.comparer = Some(Box::new(compare));
        }
        self
    }

    pub fn policy<P>(mut self, policy: P) -> Self
    where
        P: Fn(&S) -> Result<(), Violation> + Send + Sync + 'static,
    {
        self.policies.push(Box::new(policy));
        self
    }

    pub fn build(self) -> Schema<S> {
        Schema {
            type_name: self.type_name,
            fields: self.fields,
            policies: self.policies,
        }
    }
}

/// The minimal request body for an update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    /// Changed field names in table order.
    pub changed: Vec<&'static str>,
    pub body: Map<String, Value>,
}

impl Patch {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.changed.iter().any(|f| *f == field)
    }

    /// Write `value` at the dotted `path`, creating intermediate objects.
    pub fn insert(&mut self, path: &str, value: Value) {
        insert_path(&mut self.body, path, value);
    }
}

pub(crate) fn insert_path(body: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            body.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let entry = body
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(inner) = entry {
                insert_path(inner, rest, value);
            }
        }
    }
}
