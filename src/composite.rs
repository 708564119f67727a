//! Composite values: containers that can hold functions
//!
//! Two shapes are searched:
//!
//! - **Keyed containers**: plain Lua tables, enumerated and written with raw
//!   access so user metamethods never run during discovery or installation.
//! - **Protocol composites**: any table or userdata whose metatable supplies
//!   the whole capability set `__pairs` + `__index` + `__newindex`. These are
//!   enumerated through their own `__pairs` iterator and read/written through
//!   their accessors, exactly as Lua code would see them.
//!
//! The walker and installer only ever talk to [`Composite`], never to the
//! metatables directly.

use mlua::{Function, Table, Value};

/// Metatable keys that implement the protocol; never treated as user data
pub const PROTOCOL_KEYS: [&str; 3] = ["__pairs", "__index", "__newindex"];

/// A container that discovery can descend into and installation can write to
#[derive(Debug, Clone)]
pub enum Composite {
    Keyed(Table),
    Protocol(ProtocolComposite),
}

/// Value exposing iteration and indexed read/write through its metatable
#[derive(Debug, Clone)]
pub struct ProtocolComposite {
    target: Value,
    pairs: Function,
    index: Value,
    newindex: Value,
}

impl Composite {
    /// Classify a value, returning `None` for anything that is not a composite
    ///
    /// A table carrying the protocol capability set is a protocol composite;
    /// any other table is a keyed container. Userdata qualifies only through
    /// the protocol.
    pub fn classify(value: &Value) -> mlua::Result<Option<Self>> {
        match value {
            Value::Table(table) => {
                if let Some(metatable) = table.metatable() {
                    let protocol = ProtocolComposite::from_accessors(
                        value.clone(),
                        metatable.raw_get("__pairs")?,
                        metatable.raw_get("__index")?,
                        metatable.raw_get("__newindex")?,
                    );
                    if let Some(protocol) = protocol {
                        return Ok(Some(Self::Protocol(protocol)));
                    }
                }
                Ok(Some(Self::Keyed(table.clone())))
            }
            Value::UserData(userdata) => {
                // Userdata without an accessible metatable is opaque
                let Ok(metatable) = userdata.metatable() else {
                    return Ok(None);
                };
                Ok(ProtocolComposite::from_accessors(
                    value.clone(),
                    metatable.get("__pairs")?,
                    metatable.get("__index")?,
                    metatable.get("__newindex")?,
                )
                .map(Self::Protocol))
            }
            _ => Ok(None),
        }
    }

    /// The composite as a plain Lua value (for identity checks)
    pub fn as_value(&self) -> Value {
        match self {
            Self::Keyed(table) => Value::Table(table.clone()),
            Self::Protocol(protocol) => protocol.target.clone(),
        }
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }

    /// Lazily enumerate `(key, value)` pairs
    ///
    /// Keyed containers use raw enumeration order; protocol composites use the
    /// order of their own iterator with the protocol keys filtered out.
    pub fn iter(&self) -> mlua::Result<Box<dyn Iterator<Item = mlua::Result<(Value, Value)>> + '_>> {
        match self {
            Self::Keyed(table) => Ok(Box::new(table.pairs::<Value, Value>())),
            Self::Protocol(protocol) => Ok(Box::new(protocol.iter()?)),
        }
    }

    /// Read the binding stored under `key`
    pub fn get(&self, key: &Value) -> mlua::Result<Value> {
        match self {
            Self::Keyed(table) => table.raw_get(key.clone()),
            Self::Protocol(protocol) => protocol.get(key),
        }
    }

    /// Replace the binding stored under `key`
    pub fn set(&self, key: &Value, value: Value) -> mlua::Result<()> {
        match self {
            Self::Keyed(table) => table.raw_set(key.clone(), value),
            Self::Protocol(protocol) => protocol.set(key, value),
        }
    }
}

impl ProtocolComposite {
    fn from_accessors(target: Value, pairs: Value, index: Value, newindex: Value) -> Option<Self> {
        let Value::Function(pairs) = pairs else {
            return None;
        };
        if index.is_nil() || newindex.is_nil() {
            return None;
        }
        Some(Self {
            target,
            pairs,
            index,
            newindex,
        })
    }

    pub fn target(&self) -> &Value {
        &self.target
    }

    /// Start the `__pairs` iteration protocol
    pub fn iter(&self) -> mlua::Result<ProtocolPairs> {
        let (next, state, control): (Function, Value, Value) = self.pairs.call(self.target.clone())?;
        Ok(ProtocolPairs {
            next,
            state,
            control: Some(control),
        })
    }

    pub fn get(&self, key: &Value) -> mlua::Result<Value> {
        match &self.index {
            Value::Table(table) => table.get(key.clone()),
            Value::Function(index) => index.call((self.target.clone(), key.clone())),
            _ => Ok(Value::Nil),
        }
    }

    pub fn set(&self, key: &Value, value: Value) -> mlua::Result<()> {
        match &self.newindex {
            Value::Table(table) => table.set(key.clone(), value),
            Value::Function(newindex) => newindex.call((self.target.clone(), key.clone(), value)),
            other => Err(mlua::Error::runtime(format!(
                "__newindex accessor is a {}",
                other.type_name()
            ))),
        }
    }
}

/// Iterator driving a generic-for triple `(next, state, control)`
pub struct ProtocolPairs {
    next: Function,
    state: Value,
    control: Option<Value>,
}

impl Iterator for ProtocolPairs {
    type Item = mlua::Result<(Value, Value)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let control = self.control.take()?;
            let (key, value): (Value, Value) = match self.next.call((self.state.clone(), control)) {
                Ok(pair) => pair,
                Err(err) => return Some(Err(err)),
            };
            if key.is_nil() {
                return None;
            }
            self.control = Some(key.clone());
            if is_protocol_key(&key) {
                continue;
            }
            return Some(Ok((key, value)));
        }
    }
}

fn is_protocol_key(key: &Value) -> bool {
    match key {
        Value::String(name) => {
            let name = name.to_string_lossy();
            PROTOCOL_KEYS.iter().any(|k| *k == &*name)
        }
        _ => false,
    }
}

/// True when both values are the same Lua object
///
/// Only reference types (tables, functions, userdata, threads) can be
/// identical; two equal numbers or two nils never are.
pub fn same_reference(a: &Value, b: &Value) -> bool {
    let pointer = a.to_pointer();
    !pointer.is_null() && pointer == b.to_pointer()
}

/// Render a key as a path segment
///
/// Strings map verbatim, numbers to their decimal form. Other key kinds have
/// no stable name and are skipped by discovery.
pub fn key_segment(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.to_string_lossy().to_string()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlua::{Lua, MetaMethod, UserData, UserDataMethods};
    use std::collections::BTreeMap;

    /// Host object exposing its functions through `__pairs`/`__index`/`__newindex`
    struct Namespace(BTreeMap<String, Function>);

    impl UserData for Namespace {
        fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
            methods.add_meta_method(MetaMethod::Index, |_, this, key: String| {
                Ok(this.0.get(&key).cloned())
            });
            methods.add_meta_method_mut(
                MetaMethod::NewIndex,
                |_, this, (key, value): (String, Function)| {
                    this.0.insert(key, value);
                    Ok(())
                },
            );
            methods.add_meta_method(MetaMethod::Pairs, |lua, this, ()| {
                let entries: Vec<(String, Function)> =
                    this.0.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                let next = lua.create_function(move |_, (_, control): (Value, Option<String>)| {
                    let position = match control {
                        None => 0,
                        Some(key) => entries
                            .iter()
                            .position(|(k, _)| *k == key)
                            .map_or(entries.len(), |i| i + 1),
                    };
                    Ok(match entries.get(position) {
                        Some((k, v)) => (Some(k.clone()), Some(v.clone())),
                        None => (None, None),
                    })
                })?;
                Ok((next, Value::Nil, Value::Nil))
            });
        }
    }

    /// Opaque host object with no iteration protocol
    struct Handle;

    impl UserData for Handle {}

    const PROXY: &str = r#"
        local backing = { greet = function() return "hi" end, answer = 42 }
        return setmetatable({}, {
            __pairs = function(self) return next, backing, nil end,
            __index = backing,
            __newindex = backing,
        })
    "#;

    #[test]
    fn test_plain_table_is_keyed() {
        let lua = Lua::new();
        let value = Value::Table(lua.create_table().unwrap());
        let composite = Composite::classify(&value).unwrap().unwrap();
        assert!(!composite.is_protocol());
    }

    #[test]
    fn test_table_with_partial_protocol_is_keyed() {
        let lua = Lua::new();
        let value: Value = lua
            .load("return setmetatable({}, { __index = {} })")
            .eval()
            .unwrap();
        let composite = Composite::classify(&value).unwrap().unwrap();
        assert!(!composite.is_protocol());
    }

    #[test]
    fn test_proxy_table_is_protocol() {
        let lua = Lua::new();
        let value: Value = lua.load(PROXY).eval().unwrap();
        let composite = Composite::classify(&value).unwrap().unwrap();
        assert!(composite.is_protocol());
    }

    #[test]
    fn test_userdata_protocol_composite() {
        let lua = Lua::new();
        let bar: Function = lua.load("return function() return 'BAR' end").eval().unwrap();
        let foo = lua
            .create_userdata(Namespace(BTreeMap::from([("bar".to_string(), bar.clone())])))
            .unwrap();
        let value = Value::UserData(foo);

        let composite = Composite::classify(&value).unwrap().unwrap();
        assert!(composite.is_protocol());
        assert!(same_reference(&composite.as_value(), &value));

        let pairs: Vec<(Value, Value)> = composite.iter().unwrap().map(|p| p.unwrap()).collect();
        assert_eq!(pairs.len(), 1);
        assert_eq!(key_segment(&pairs[0].0).as_deref(), Some("bar"));
        assert!(same_reference(&pairs[0].1, &Value::Function(bar.clone())));

        // Written through the function __newindex, read back through __index
        let key = pairs[0].0.clone();
        let replacement: Function = lua.load("return function() return 'NEW' end").eval().unwrap();
        composite
            .set(&key, Value::Function(replacement.clone()))
            .unwrap();
        assert!(same_reference(
            &composite.get(&key).unwrap(),
            &Value::Function(replacement)
        ));
        composite.set(&key, Value::Function(bar.clone())).unwrap();
        let restored: String = lua
            .load("local foo = ...; return foo.bar()")
            .call(value)
            .unwrap();
        assert_eq!(restored, "BAR");
    }

    #[test]
    fn test_userdata_without_protocol_is_opaque() {
        let lua = Lua::new();
        let value = Value::UserData(lua.create_userdata(Handle).unwrap());
        assert!(Composite::classify(&value).unwrap().is_none());
    }

    #[test]
    fn test_scalars_are_not_composites() {
        assert!(Composite::classify(&Value::Integer(3)).unwrap().is_none());
        assert!(Composite::classify(&Value::Nil).unwrap().is_none());
        assert!(Composite::classify(&Value::Boolean(true)).unwrap().is_none());
    }

    #[test]
    fn test_protocol_iteration_and_accessors() {
        let lua = Lua::new();
        let value: Value = lua.load(PROXY).eval().unwrap();
        let composite = Composite::classify(&value).unwrap().unwrap();

        let mut keys: Vec<String> = composite
            .iter()
            .unwrap()
            .map(|pair| key_segment(&pair.unwrap().0).unwrap())
            .collect();
        keys.sort();
        assert_eq!(keys, ["answer", "greet"]);

        let key = Value::String(lua.create_string("answer").unwrap());
        assert_eq!(composite.get(&key).unwrap(), Value::Integer(42));
        composite.set(&key, Value::Integer(7)).unwrap();
        assert_eq!(composite.get(&key).unwrap(), Value::Integer(7));
    }

    #[test]
    fn test_protocol_keys_are_filtered() {
        let lua = Lua::new();
        // The metatable doubles as the storage, so its own accessors show up
        // in the iteration and must be skipped.
        let value: Value = lua
            .load(
                r#"
                local mt = {}
                mt.__index = mt
                mt.__newindex = mt
                mt.__pairs = function(self) return next, mt, nil end
                mt.foo = function() return "FOO" end
                return setmetatable({}, mt)
                "#,
            )
            .eval()
            .unwrap();
        let composite = Composite::classify(&value).unwrap().unwrap();
        let keys: Vec<String> = composite
            .iter()
            .unwrap()
            .map(|pair| key_segment(&pair.unwrap().0).unwrap())
            .collect();
        assert_eq!(keys, ["foo"]);
    }

    #[test]
    fn test_same_reference() {
        let lua = Lua::new();
        let table = lua.create_table().unwrap();
        let a = Value::Table(table.clone());
        let b = Value::Table(table);
        let c = Value::Table(lua.create_table().unwrap());
        assert!(same_reference(&a, &b));
        assert!(!same_reference(&a, &c));
        assert!(!same_reference(&Value::Nil, &Value::Nil));
        assert!(!same_reference(&Value::Integer(1), &Value::Integer(1)));
    }

    #[test]
    fn test_key_segment() {
        let lua = Lua::new();
        let name = Value::String(lua.create_string("print").unwrap());
        assert_eq!(key_segment(&name).as_deref(), Some("print"));
        assert_eq!(key_segment(&Value::Integer(3)).as_deref(), Some("3"));
        assert_eq!(key_segment(&Value::Boolean(true)), None);
    }
}
