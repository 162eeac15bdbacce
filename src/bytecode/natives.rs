//! Built-in native function groups (§4.6).
//!
//! `log`/`logS` are VM opcodes, not natives (§4.4) — everything here is
//! reached only through `extern` declarations lowered to `NATIVE_CALL`.
//! Graphics, cryptography, and expression-evaluator bindings the original
//! system names are out of scope (§4.6 non-goal); what remains — time,
//! RNG, string ops, and a flat buffer allocator — is registered at VM
//! startup the way the teacher's own `Compiler::new` wires up fixed,
//! always-present state before a run begins.

use std::time::Instant;

use crate::bytecode::registry::Registry;
use crate::compiler::error::RaeError;
use crate::value::Value;

fn expect_int(args: &[Value], idx: usize) -> Result<i64, RaeError> {
    match args.get(idx) {
        Some(Value::Int(i)) => Ok(*i),
        Some(other) => Err(RaeError::runtime(format!(
            "expected int argument at position {idx}, found {}",
            other.type_name()
        ))),
        None => Err(RaeError::runtime(format!("missing argument at position {idx}"))),
    }
}

fn expect_str<'a>(args: &'a [Value], idx: usize) -> Result<&'a str, RaeError> {
    match args.get(idx) {
        Some(Value::Str(s)) => Ok(s.as_str()),
        Some(other) => Err(RaeError::runtime(format!(
            "expected string argument at position {idx}, found {}",
            other.type_name()
        ))),
        None => Err(RaeError::runtime(format!("missing argument at position {idx}"))),
    }
}

/// Monotonic process-start instant, used by `timeNowNanos`/`sleep`. One per
/// process, established the first time any native touching time is called.
static PROCESS_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

fn process_start() -> Instant {
    *PROCESS_START.get_or_init(Instant::now)
}

fn native_time_now_nanos(_args: &[Value]) -> Result<Value, RaeError> {
    Ok(Value::Int(process_start().elapsed().as_nanos() as i64))
}

#[cfg(feature = "secure-compilation")]
fn native_time_now_millis(_args: &[Value]) -> Result<Value, RaeError> {
    Ok(Value::Int(chrono::Utc::now().timestamp_millis()))
}

#[cfg(not(feature = "secure-compilation"))]
fn native_time_now_millis(_args: &[Value]) -> Result<Value, RaeError> {
    Ok(Value::Int(
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64,
    ))
}

fn native_sleep_millis(args: &[Value]) -> Result<Value, RaeError> {
    let millis = expect_int(args, 0)?;
    if millis > 0 {
        std::thread::sleep(std::time::Duration::from_millis(millis as u64));
    }
    Ok(Value::None)
}

fn native_rand_int(args: &[Value]) -> Result<Value, RaeError> {
    use rand::Rng;
    let lo = expect_int(args, 0)?;
    let hi = expect_int(args, 1)?;
    if hi < lo {
        return Err(RaeError::runtime("randInt: upper bound below lower bound"));
    }
    Ok(Value::Int(rand::rng().random_range(lo..=hi)))
}

fn native_str_len(args: &[Value]) -> Result<Value, RaeError> {
    Ok(Value::Int(expect_str(args, 0)?.chars().count() as i64))
}

fn native_str_concat(args: &[Value]) -> Result<Value, RaeError> {
    let mut out = String::new();
    out.push_str(expect_str(args, 0)?);
    out.push_str(expect_str(args, 1)?);
    Ok(Value::Str(out))
}

fn native_str_upper(args: &[Value]) -> Result<Value, RaeError> {
    Ok(Value::Str(expect_str(args, 0)?.to_uppercase()))
}

fn native_buffer_alloc(args: &[Value]) -> Result<Value, RaeError> {
    let len = expect_int(args, 0)?;
    if len < 0 {
        return Err(RaeError::runtime("bufferAlloc: negative length"));
    }
    Ok(Value::Array(vec![Value::Int(0); len as usize]))
}

fn native_buffer_resize(args: &[Value]) -> Result<Value, RaeError> {
    let new_len = expect_int(args, 1)? as usize;
    match args.first() {
        Some(Value::Array(items)) => {
            let mut resized = items.clone();
            resized.resize(new_len, Value::Int(0));
            Ok(Value::Array(resized))
        }
        Some(other) => Err(RaeError::runtime(format!(
            "bufferResize: expected array, found {}",
            other.type_name()
        ))),
        None => Err(RaeError::runtime("bufferResize: missing buffer argument")),
    }
}

fn native_buffer_copy(args: &[Value]) -> Result<Value, RaeError> {
    match args.first() {
        Some(Value::Array(items)) => Ok(Value::Array(items.iter().map(Value::deep_clone).collect())),
        Some(other) => Err(RaeError::runtime(format!(
            "bufferCopy: expected array, found {}",
            other.type_name()
        ))),
        None => Err(RaeError::runtime("bufferCopy: missing buffer argument")),
    }
}

/// Registers every built-in native group at VM startup (§4.6).
pub fn register_builtins(registry: &mut Registry) {
    registry.register("timeNowNanos", native_time_now_nanos);
    registry.register("timeNowMillis", native_time_now_millis);
    registry.register("sleepMillis", native_sleep_millis);
    registry.register("randInt", native_rand_int);
    registry.register("strLen", native_str_len);
    registry.register("strConcat", native_str_concat);
    registry.register("strUpper", native_str_upper);
    registry.register("bufferAlloc", native_buffer_alloc);
    registry.register("bufferResize", native_buffer_resize);
    registry.register("bufferCopy", native_buffer_copy);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn str_concat_joins_both_arguments() {
        let args = [Value::Str("foo".into()), Value::Str("bar".into())];
        assert_eq!(native_str_concat(&args).unwrap(), Value::Str("foobar".into()));
    }

    #[test]
    fn rand_int_stays_within_bounds() {
        let args = [Value::Int(3), Value::Int(3)];
        assert_eq!(native_rand_int(&args).unwrap(), Value::Int(3));
    }

    #[test]
    fn buffer_alloc_rejects_negative_length() {
        let args = [Value::Int(-1)];
        assert!(native_buffer_alloc(&args).is_err());
    }

    #[test]
    fn register_builtins_wires_every_group() {
        let mut registry = Registry::new();
        register_builtins(&mut registry);
        assert!(registry.call("strLen", &[Value::Str("hi".into())]).is_ok());
        assert!(registry.call("timeNowNanos", &[]).is_ok());
    }
}
