//! Hooks run around every instrumented call, and the wrappers that run them

use crate::path::Path;
use mlua::{Function, Lua, MultiValue, Value};
use std::rc::Rc;

/// A before/after hook pair plus whatever state the hooks share
///
/// The implementor is the shared context. `after` runs for every `before`,
/// including when the wrapped function raises.
pub trait Instruments {
    fn before(&self, lua: &Lua, path: &Path);
    fn after(&self, lua: &Lua, path: &Path);
}

/// Plain hook function taking an explicit context
pub type Hook<C> = fn(&Lua, &C, &Path);

/// Adapter turning two hook functions and a context value into [`Instruments`]
///
/// # Example
/// ```
/// use moonwatch::instrument::{HookPair, Instruments};
/// use moonwatch::Path;
/// use std::cell::Cell;
///
/// let hooks = HookPair::new(
///     |_, entered: &Cell<u32>, _| entered.set(entered.get() + 1),
///     |_, _, _| {},
///     Cell::new(0),
/// );
/// let lua = mlua::Lua::new();
/// hooks.before(&lua, &Path::from(["foo"]));
/// assert_eq!(hooks.context().get(), 1);
/// ```
pub struct HookPair<C> {
    before: Hook<C>,
    after: Hook<C>,
    context: C,
}

impl<C> HookPair<C> {
    pub fn new(before: Hook<C>, after: Hook<C>, context: C) -> Self {
        Self {
            before,
            after,
            context,
        }
    }

    pub fn context(&self) -> &C {
        &self.context
    }
}

impl<C> Instruments for HookPair<C> {
    fn before(&self, lua: &Lua, path: &Path) {
        (self.before)(lua, &self.context, path)
    }

    fn after(&self, lua: &Lua, path: &Path) {
        (self.after)(lua, &self.context, path)
    }
}

/// Registry key of the compiled trampoline factory
const TRAMPOLINE_KEY: &str = "moonwatch.trampoline";

/// Builds one wrapper from `(original, enter, leave)`
///
/// The wrapper is a Lua function, so arguments, results and error values
/// pass between caller and original untouched. `leave` runs as the `__close`
/// of a to-be-closed variable: on normal return, when the original raises,
/// and when a Rust panic unwinds through the frame.
const TRAMPOLINE: &str = r#"
local setmetatable = setmetatable
return function(original, enter, leave)
    local closer = setmetatable({}, { __close = leave })
    return function(...)
        enter()
        local _ <close> = closer
        return original(...)
    end
end
"#;

/// Everything one wrapper closes over
pub(crate) struct Wrapper {
    path: Path,
    original: Function,
    instruments: Rc<dyn Instruments>,
}

impl Wrapper {
    pub(crate) fn new(path: Path, original: Function, instruments: Rc<dyn Instruments>) -> Self {
        Self {
            path,
            original,
            instruments,
        }
    }

    /// Turn the record into a Lua function that can replace the original
    pub(crate) fn into_function(self, lua: &Lua) -> mlua::Result<Function> {
        let Wrapper {
            path,
            original,
            instruments,
        } = self;

        let enter = {
            let path = path.clone();
            let instruments = Rc::clone(&instruments);
            lua.create_function(move |lua, _: MultiValue| {
                instruments.before(lua, &path);
                Ok(())
            })?
        };
        let leave = lua.create_function(move |lua, _: MultiValue| {
            instruments.after(lua, &path);
            Ok(())
        })?;

        trampoline(lua)?.call((original, enter, leave))
    }
}

/// The trampoline factory, compiled once per interpreter
///
/// Compiled on first use, before any binding is swapped, so the captured
/// `setmetatable` is never an instrumented wrapper.
fn trampoline(lua: &Lua) -> mlua::Result<Function> {
    if let Value::Function(factory) = lua.named_registry_value::<Value>(TRAMPOLINE_KEY)? {
        return Ok(factory);
    }
    let factory: Function = lua
        .load(TRAMPOLINE)
        .set_name("=moonwatch.trampoline")
        .eval()?;
    lua.set_named_registry_value(TRAMPOLINE_KEY, factory.clone())?;
    Ok(factory)
}
