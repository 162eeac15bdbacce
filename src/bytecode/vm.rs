//! Stack-based VM main loop (§4.5, §4.8).
//!
//! Fetch/decode/dispatch structure is grounded on `emdash-udashboard`'s
//! `vm.rs` (`step`/`dispatch` driven by a `pc`, a `ControlFlow` result
//! distinguishing "advance" from "branch", and a call stack of small
//! `StackFrame` records) — the closest thing in the retrieval pack to a
//! real bytecode interpreter; the instruction set and operand encoding
//! themselves come directly from §4.4/§4.8.

use std::time::{Duration, Instant};

use crate::bytecode::chunk::{Chunk, OpCode};
use crate::bytecode::registry::Registry;
use crate::compiler::error::RaeError;
use crate::value::Value;

const STACK_CAPACITY: usize = 1024;

/// What `ControlFlow` tells the dispatcher to do with `ip` after an
/// instruction executes, mirroring the Advance/Branch split in the
/// grounding source above.
enum ControlFlow {
    Advance,
    Branch(usize),
    Halt,
}

#[derive(Debug, Clone, Copy)]
struct CallFrame {
    return_ip: usize,
    slot_base: usize,
    slot_count: usize,
}

/// The outcome of running a chunk to completion, a runtime error, or a
/// caller-supplied timeout (§4.8).
pub enum VmOutcome {
    Ok(Value),
    Timeout,
}

pub struct Vm<'a> {
    chunk: &'a Chunk,
    registry: &'a mut Registry,
    stack: Vec<Value>,
    frames: Vec<CallFrame>,
    ip: usize,
}

impl<'a> Vm<'a> {
    pub fn new(chunk: &'a Chunk, registry: &'a mut Registry) -> Self {
        Self {
            chunk,
            registry,
            stack: Vec::with_capacity(STACK_CAPACITY),
            frames: Vec::new(),
            ip: 0,
        }
    }

    /// Runs from byte offset 0 until a `RETURN` executes at call depth
    /// zero. `timeout` bounds wall-clock time; native calls are not
    /// interrupted mid-call (§4.8).
    pub fn run(&mut self, timeout: Option<Duration>) -> Result<VmOutcome, RaeError> {
        let start = Instant::now();
        self.ip = 0;
        self.frames.clear();
        self.stack.clear();
        self.frames.push(CallFrame { return_ip: self.chunk.code.len(), slot_base: 0, slot_count: 0 });

        loop {
            if let Some(limit) = timeout {
                if start.elapsed() >= limit {
                    return Ok(VmOutcome::Timeout);
                }
            }
            match self.step()? {
                ControlFlow::Advance => {}
                ControlFlow::Branch(target) => self.ip = target,
                ControlFlow::Halt => {
                    let result = self.stack.pop().unwrap_or(Value::None);
                    return Ok(VmOutcome::Ok(result));
                }
            }
        }
    }

    fn fetch_u8(&mut self) -> u8 {
        let byte = self.chunk.code[self.ip];
        self.ip += 1;
        byte
    }

    fn fetch_u16(&mut self) -> u16 {
        let hi = self.fetch_u8();
        let lo = self.fetch_u8();
        u16::from_be_bytes([hi, lo])
    }

    fn push(&mut self, value: Value) -> Result<(), RaeError> {
        if self.stack.len() >= STACK_CAPACITY {
            return Err(RaeError::runtime("value stack overflow"));
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<Value, RaeError> {
        self.stack.pop().ok_or_else(|| RaeError::runtime("value stack underflow"))
    }

    fn frame(&self) -> CallFrame {
        *self.frames.last().expect("VM always has an active frame while running")
    }

    fn step(&mut self) -> Result<ControlFlow, RaeError> {
        let byte = self.fetch_u8();
        let op = OpCode::from_byte(byte)
            .ok_or_else(|| RaeError::runtime(format!("invalid opcode byte {byte}")))?;

        match op {
            OpCode::Constant => {
                let idx = self.fetch_u16() as usize;
                let value = self.chunk.constants[idx].deep_clone();
                self.push(value)?;
                Ok(ControlFlow::Advance)
            }
            OpCode::Log | OpCode::LogS => {
                use std::io::Write;
                let value = self.pop()?;
                if op == OpCode::Log {
                    println!("{value}");
                } else {
                    print!("{value}");
                }
                // Stdout is line-buffered only when attached to a terminal;
                // a piped/redirected target (the common case under --watch)
                // is fully buffered, so flush explicitly after every call.
                std::io::stdout().flush().ok();
                self.push(Value::None)?;
                Ok(ControlFlow::Advance)
            }
            OpCode::Call => {
                let target = self.fetch_u16() as usize;
                let argc = self.fetch_u8() as usize;
                if self.frames.len() >= STACK_CAPACITY {
                    return Err(RaeError::runtime("call stack overflow"));
                }
                let slot_base = self.stack.len() - argc;
                self.frames.push(CallFrame { return_ip: self.ip, slot_base, slot_count: argc });
                Ok(ControlFlow::Branch(target))
            }
            OpCode::NativeCall => {
                let name_idx = self.fetch_u16() as usize;
                let argc = self.fetch_u8() as usize;
                let name = match &self.chunk.constants[name_idx] {
                    Value::Str(s) => s.clone(),
                    _ => return Err(RaeError::runtime("native call target is not a string constant")),
                };
                let args: Vec<Value> = self.stack.split_off(self.stack.len() - argc);
                let result = self.registry.call(&name, &args)?;
                self.push(result)?;
                Ok(ControlFlow::Advance)
            }
            OpCode::Return => {
                let has_value = self.fetch_u8() != 0;
                let result = if has_value { self.pop()? } else { Value::None };
                let frame = self.frames.pop().expect("RETURN always runs inside a frame");
                self.stack.truncate(frame.slot_base);
                if self.frames.is_empty() {
                    self.stack.push(result);
                    return Ok(ControlFlow::Halt);
                }
                self.push(result)?;
                Ok(ControlFlow::Branch(frame.return_ip))
            }
            OpCode::GetLocal => {
                let slot = self.fetch_u16() as usize;
                let base = self.frame().slot_base;
                let value = self.stack[base + slot].deep_clone();
                self.push(value)?;
                Ok(ControlFlow::Advance)
            }
            OpCode::SetLocal => {
                let slot = self.fetch_u16() as usize;
                let base = self.frame().slot_base;
                let value = self.pop()?;
                let idx = base + slot;
                while self.stack.len() <= idx {
                    self.stack.push(Value::None);
                }
                self.stack[idx] = value;
                let count = self.frames.last().unwrap().slot_count.max(slot + 1);
                self.frames.last_mut().unwrap().slot_count = count;
                Ok(ControlFlow::Advance)
            }
            OpCode::AllocLocal => {
                let count = self.fetch_u16() as usize;
                for _ in 0..count {
                    self.push(Value::None)?;
                }
                self.frames.last_mut().unwrap().slot_count += count;
                Ok(ControlFlow::Advance)
            }
            OpCode::Pop => {
                self.pop()?;
                Ok(ControlFlow::Advance)
            }
            OpCode::Jump => {
                let target = self.fetch_u16() as usize;
                Ok(ControlFlow::Branch(target))
            }
            OpCode::JumpIfFalse => {
                let target = self.fetch_u16() as usize;
                let cond = self.pop()?;
                if cond.is_truthy() {
                    Ok(ControlFlow::Advance)
                } else {
                    Ok(ControlFlow::Branch(target))
                }
            }
            OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div | OpCode::Mod => {
                self.binary_arith(op)?;
                Ok(ControlFlow::Advance)
            }
            OpCode::Neg => {
                let v = self.pop()?;
                let result = match v {
                    Value::Int(i) => Value::Int(-i),
                    Value::Float(x) => Value::Float(-x),
                    other => {
                        return Err(RaeError::runtime(format!(
                            "cannot negate a {}",
                            other.type_name()
                        )))
                    }
                };
                self.push(result)?;
                Ok(ControlFlow::Advance)
            }
            OpCode::Not => {
                let v = self.pop()?;
                self.push(Value::Bool(!v.is_truthy()))?;
                Ok(ControlFlow::Advance)
            }
            OpCode::Lt | OpCode::Le | OpCode::Gt | OpCode::Ge => {
                self.compare(op)?;
                Ok(ControlFlow::Advance)
            }
            OpCode::Eq => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.push(Value::Bool(a == b))?;
                Ok(ControlFlow::Advance)
            }
            OpCode::Ne => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.push(Value::Bool(a != b))?;
                Ok(ControlFlow::Advance)
            }
            OpCode::GetField => {
                let idx = self.fetch_u16() as usize;
                let obj = self.pop()?;
                match obj {
                    Value::Object(o) => {
                        let value = o.fields.get(idx).map(|(_, v)| v.deep_clone()).ok_or_else(|| {
                            RaeError::runtime("field index out of range")
                        })?;
                        self.push(value)?;
                    }
                    other => {
                        return Err(RaeError::runtime(format!(
                            "GET_FIELD on non-object value {}",
                            other.type_name()
                        )))
                    }
                }
                Ok(ControlFlow::Advance)
            }
            OpCode::SetField => {
                let idx = self.fetch_u16() as usize;
                let value = self.pop()?;
                let mut obj = self.pop()?;
                match &mut obj {
                    Value::Object(o) => {
                        if idx >= o.fields.len() {
                            return Err(RaeError::runtime("field index out of range"));
                        }
                        o.fields[idx].1 = value;
                    }
                    other => {
                        return Err(RaeError::runtime(format!(
                            "SET_FIELD on non-object value {}",
                            other.type_name()
                        )))
                    }
                }
                self.push(obj)?;
                Ok(ControlFlow::Advance)
            }
            OpCode::Construct => {
                let count = self.fetch_u16() as usize;
                let values = self.stack.split_off(self.stack.len() - count);
                let fields = values
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (format!("field{i}"), v))
                    .collect();
                self.push(Value::Object(crate::value::ObjectValue {
                    type_name: String::new(),
                    fields,
                }))?;
                Ok(ControlFlow::Advance)
            }
            OpCode::GetGlobal => {
                let slot = self.fetch_u16() as usize;
                let value = self.registry.get_global(slot).deep_clone();
                self.push(value)?;
                Ok(ControlFlow::Advance)
            }
            OpCode::SetGlobal => {
                let slot = self.fetch_u16() as usize;
                let value = self.pop()?;
                self.registry.set_global(slot, value);
                Ok(ControlFlow::Advance)
            }
        }
    }

    fn binary_arith(&mut self, op: OpCode) -> Result<(), RaeError> {
        let b = self.pop()?;
        let a = self.pop()?;
        let result = match (&a, &b) {
            (Value::Int(x), Value::Int(y)) => match op {
                OpCode::Add => Value::Int(x + y),
                OpCode::Sub => Value::Int(x - y),
                OpCode::Mul => Value::Int(x * y),
                OpCode::Div => {
                    if *y == 0 {
                        return Err(RaeError::runtime("integer division by zero"));
                    }
                    Value::Int(x / y)
                }
                OpCode::Mod => {
                    if *y == 0 {
                        return Err(RaeError::runtime("integer modulo by zero"));
                    }
                    Value::Int(x % y)
                }
                _ => unreachable!(),
            },
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                let x = as_f64(&a);
                let y = as_f64(&b);
                match op {
                    OpCode::Add => Value::Float(x + y),
                    OpCode::Sub => Value::Float(x - y),
                    OpCode::Mul => Value::Float(x * y),
                    OpCode::Div => {
                        if y == 0.0 {
                            return Err(RaeError::runtime("float division by zero"));
                        }
                        Value::Float(x / y)
                    }
                    OpCode::Mod => Value::Float(x % y),
                    _ => unreachable!(),
                }
            }
            (Value::Str(x), Value::Str(y)) if op == OpCode::Add => {
                Value::Str(format!("{x}{y}"))
            }
            _ => {
                return Err(RaeError::runtime(format!(
                    "cannot apply arithmetic to {} and {}",
                    a.type_name(),
                    b.type_name()
                )))
            }
        };
        self.push(result)
    }

    fn compare(&mut self, op: OpCode) -> Result<(), RaeError> {
        let b = self.pop()?;
        let a = self.pop()?;
        let ordering = match (&a, &b) {
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
                as_f64(&a).partial_cmp(&as_f64(&b))
            }
            (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
            _ => {
                return Err(RaeError::runtime(format!(
                    "cannot compare {} and {}",
                    a.type_name(),
                    b.type_name()
                )))
            }
        }
        .ok_or_else(|| RaeError::runtime("incomparable values (NaN)"))?;

        let result = match op {
            OpCode::Lt => ordering.is_lt(),
            OpCode::Le => ordering.is_le(),
            OpCode::Gt => ordering.is_gt(),
            OpCode::Ge => ordering.is_ge(),
            _ => unreachable!(),
        };
        self.push(Value::Bool(result))
    }
}

fn as_f64(v: &Value) -> f64 {
    match v {
        Value::Int(i) => *i as f64,
        Value::Float(x) => *x,
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::nodes::Program;
    use crate::bytecode::compiler::BytecodeCompiler;
    use crate::compiler::lexer::tokenize;
    use crate::compiler::parser::parse;

    fn run_src(src: &str) -> VmOutcome {
        let (tokens, _) = tokenize("t.rae", src).unwrap();
        let module = parse("t.rae", tokens).unwrap();
        let program = Program { declarations: module.declarations };
        let chunk = BytecodeCompiler::compile(&program, "t.rae").unwrap();
        let mut registry = Registry::new();
        crate::bytecode::natives::register_builtins(&mut registry);
        let mut vm = Vm::new(&chunk, &mut registry);
        vm.run(None).unwrap()
    }

    #[test]
    fn runs_simple_arithmetic_and_returns_result() {
        match run_src("func main(): ret int { ret 2 + 3 * 4 }") {
            VmOutcome::Ok(Value::Int(14)) => {}
            _ => panic!("expected Int(14)"),
        }
    }

    #[test]
    fn integer_division_by_zero_is_a_runtime_error() {
        let (tokens, _) = tokenize("t.rae", "func main(): ret int { ret 1 / 0 }").unwrap();
        let module = parse("t.rae", tokens).unwrap();
        let program = Program { declarations: module.declarations };
        let chunk = BytecodeCompiler::compile(&program, "t.rae").unwrap();
        let mut registry = Registry::new();
        let mut vm = Vm::new(&chunk, &mut registry);
        assert!(vm.run(None).is_err());
    }

    #[test]
    fn if_else_selects_the_taken_branch() {
        let src = "func main(): ret int { if 1 is 2 { ret 1 } else { ret 9 } }";
        match run_src(src) {
            VmOutcome::Ok(Value::Int(9)) => {}
            other => panic!("unexpected outcome in if/else test: {:?}", matches!(other, VmOutcome::Ok(_))),
        }
    }
}
