//! Hot-patch protocol: append a freshly compiled chunk onto a live one and
//! install trampolines (§4.7).
//!
//! There is no teacher precedent for this at all — `fkkarakurt-nebc`
//! compiles straight to a finished binary and has no notion of a running
//! process being patched in place. This module follows §4.7's six-step
//! protocol literally; the only design freedom taken is representing a
//! trampoline as a `JUMP` instruction reusing the existing opcode rather
//! than inventing a new one, since `JUMP <addr>` is already exactly
//! "unconditionally redirect control flow to `addr`".

use crate::bytecode::chunk::{Chunk, OpCode};
use crate::compiler::error::RaeError;

/// Minimum instruction size (opcode + u16 operand) a function's first
/// instruction must occupy for a trampoline to be installed over it
/// (§4.7 failure modes).
const TRAMPOLINE_SIZE: usize = 1 + OpCode::Jump.operand_len();

/// Appends `new_chunk` onto `live`, relocating its code and constants and
/// wiring trampolines for every function the two chunks share by name.
///
/// Returns the names of functions for which trampoline installation failed
/// (prologue shorter than `TRAMPOLINE_SIZE`) — per §4.7 this is a
/// documented limitation, not a hard failure of the whole patch.
pub fn hot_patch(live: &mut Chunk, new_chunk: Chunk) -> Result<Vec<String>, RaeError> {
    let code_base = live.code.len();
    let const_base = live.constants.len();

    live.constants.extend(new_chunk.constants);

    let mut appended = new_chunk.code;
    relocate_appended_code(&mut appended, const_base, code_base);
    live.code.extend(appended);
    live.lines.extend(new_chunk.lines);

    let mut failures = Vec::new();

    for mut new_entry in new_chunk.functions {
        let new_offset = new_entry.offset.map(|o| o + code_base);
        new_entry.offset = new_offset;
        new_entry.patch_sites = new_entry
            .patch_sites
            .into_iter()
            .map(|site| site + code_base)
            .collect();

        match live.functions.iter().position(|f| f.name == new_entry.name) {
            Some(existing_idx) => {
                let old_offset = live.functions[existing_idx].offset;
                if let (Some(old_offset), Some(new_offset)) = (old_offset, new_offset) {
                    if install_trampoline(live, old_offset, new_offset).is_err() {
                        failures.push(new_entry.name.clone());
                    }
                }
                live.functions[existing_idx].offset = new_offset;
                live.functions[existing_idx]
                    .patch_sites
                    .extend(new_entry.patch_sites);
            }
            None => {
                live.functions.push(new_entry);
            }
        }
    }

    Ok(failures)
}

/// Walks the freshly appended region instruction-by-instruction, adding
/// `const_base` to constant-indexed operands and `code_base` to
/// code-address operands (§4.7 step 4).
fn relocate_appended_code(code: &mut [u8], const_base: usize, code_base: usize) {
    let mut i = 0;
    while i < code.len() {
        let byte = code[i];
        let Some(op) = OpCode::from_byte(byte) else {
            i += 1;
            continue;
        };
        let operand_len = op.operand_len();
        match op {
            OpCode::Constant | OpCode::NativeCall => {
                relocate_u16(code, i + 1, const_base as u16);
            }
            OpCode::Call | OpCode::Jump | OpCode::JumpIfFalse => {
                relocate_u16(code, i + 1, code_base as u16);
            }
            _ => {}
        }
        i += 1 + operand_len;
    }
}

fn relocate_u16(code: &mut [u8], at: usize, delta: u16) {
    let current = u16::from_be_bytes([code[at], code[at + 1]]);
    let shifted = current.wrapping_add(delta);
    let bytes = shifted.to_be_bytes();
    code[at] = bytes[0];
    code[at + 1] = bytes[1];
}

/// Overwrites the first bytes at `old_offset` with `JUMP <new_offset>`
/// (§4.7 step 6). Any existing CALL still pointing at `old_offset` lands
/// on the trampoline and is redirected.
fn install_trampoline(chunk: &mut Chunk, old_offset: usize, new_offset: usize) -> Result<(), ()> {
    if old_offset + TRAMPOLINE_SIZE > chunk.code.len() {
        return Err(());
    }
    chunk.code[old_offset] = OpCode::Jump as u8;
    let bytes = (new_offset as u16).to_be_bytes();
    chunk.code[old_offset + 1] = bytes[0];
    chunk.code[old_offset + 2] = bytes[1];
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::nodes::Program;
    use crate::bytecode::compiler::BytecodeCompiler;
    use crate::compiler::lexer::tokenize;
    use crate::compiler::parser::parse;

    fn compile(src: &str) -> Chunk {
        let (tokens, _) = tokenize("t.rae", src).unwrap();
        let module = parse("t.rae", tokens).unwrap();
        let program = Program { declarations: module.declarations };
        BytecodeCompiler::compile(&program, "t.rae").unwrap()
    }

    #[test]
    fn patching_preserves_existing_code_length_as_new_code_base() {
        let mut live = compile("func main(): ret int { ret 1 }");
        let before_len = live.code.len();
        let patched = compile("func main(): ret int { ret 2 }");
        hot_patch(&mut live, patched).unwrap();
        assert!(live.code.len() > before_len);
    }

    #[test]
    fn shared_function_gets_a_trampoline_at_its_old_offset() {
        let mut live = compile("func main(): ret int { ret 1 }");
        let old_offset = live.functions.iter().find(|f| f.name == "main").unwrap().offset.unwrap();
        let patched = compile("func main(): ret int { ret 2 }");
        let failures = hot_patch(&mut live, patched).unwrap();
        assert!(failures.is_empty());
        assert_eq!(live.code[old_offset], OpCode::Jump as u8);
    }
}
