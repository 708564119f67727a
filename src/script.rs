//! Loading Lua scripts and calling into them from the command line

use anyhow::{bail, Context, Result};
use mlua::{Lua, Value, Variadic};
use std::fs;
use std::path::Path;

/// Read `path` and run it as a chunk named after the file
pub fn load_script(lua: &Lua, path: &Path) -> Result<()> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;

    lua.load(source.as_str())
        .set_name(format!("@{}", path.display()))
        .exec()
        .with_context(|| format!("Failed to run script {}", path.display()))
}

/// Call the global function `name` with string arguments
pub fn call_global(lua: &Lua, name: &str, args: &[String]) -> Result<()> {
    let function = match lua.globals().get::<Value>(name)? {
        Value::Function(function) => function,
        Value::Nil => bail!("function '{}' is not defined", name),
        other => bail!("'{}' is a {}, not a function", name, other.type_name()),
    };

    let args: Variadic<String> = args.iter().cloned().collect();
    function
        .call::<()>(args)
        .with_context(|| format!("Call to '{}' failed", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn script(source: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(source.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_and_call() {
        let lua = Lua::new();
        let file = script("function greet(a, b) result = a .. ' ' .. b end");
        load_script(&lua, file.path()).unwrap();
        call_global(&lua, "greet", &["hello".to_string(), "world".to_string()]).unwrap();
        let result: String = lua.globals().get("result").unwrap();
        assert_eq!(result, "hello world");
    }

    #[test]
    fn test_missing_file() {
        let lua = Lua::new();
        let err = load_script(&lua, Path::new("/nonexistent/script.lua")).unwrap_err();
        assert!(err.to_string().contains("Failed to read script"));
    }

    #[test]
    fn test_syntax_error_names_chunk() {
        let lua = Lua::new();
        let file = script("function broken(");
        let err = load_script(&lua, file.path()).unwrap_err();
        let chain = format!("{:#}", err);
        assert!(chain.contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_unknown_and_non_function_globals() {
        let lua = Lua::new();
        lua.load("answer = 42").exec().unwrap();
        let err = call_global(&lua, "nope", &[]).unwrap_err();
        assert!(err.to_string().contains("not defined"));
        let err = call_global(&lua, "answer", &[]).unwrap_err();
        assert!(err.to_string().contains("number"));
    }

    #[test]
    fn test_runtime_error_propagates() {
        let lua = Lua::new();
        lua.load("function fail() error('kaboom') end").exec().unwrap();
        let err = call_global(&lua, "fail", &[]).unwrap_err();
        assert!(format!("{:#}", err).contains("kaboom"));
    }
}
