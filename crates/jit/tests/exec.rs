//! Streams that actually call into generated code. Fixtures are raw machine
//! code for the host architecture, so every test is gated on it.

#![cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]

use jit::{CommandWriter, ExitStatus, RelocationKind, Runtime};

#[cfg(target_arch = "x86_64")]
mod fixtures {
    /// mov eax, 42 ; ret
    pub const RETURN_42: &[u8] = &[0xB8, 0x2A, 0x00, 0x00, 0x00, 0xC3];

    /// mov eax, 7 ; ret ; int3 padding to 16 bytes
    pub const RETURN_7: [u8; 16] = [
        0xB8, 0x07, 0x00, 0x00, 0x00, 0xC3, 0xCC, 0xCC, //
        0xCC, 0xCC, 0xCC, 0xCC, 0xCC, 0xCC, 0xCC, 0xCC,
    ];

    /// mov eax, imm32 ; ret  (imm32 at offset 1, left zero for patching)
    pub const RETURN_IMM: &[u8] = &[0xB8, 0x00, 0x00, 0x00, 0x00, 0xC3];
    pub const RETURN_IMM_SLOT: u32 = 1;
    pub const fn return_imm_value(value: i32) -> i32 {
        value
    }
}

#[cfg(target_arch = "aarch64")]
mod fixtures {
    /// mov w0, #42 ; ret
    pub const RETURN_42: &[u8] = &[0x40, 0x05, 0x80, 0x52, 0xC0, 0x03, 0x5F, 0xD6];

    /// mov w0, #7 ; ret ; nop ; nop
    pub const RETURN_7: [u8; 16] = [
        0xE0, 0x00, 0x80, 0x52, 0xC0, 0x03, 0x5F, 0xD6, //
        0x1F, 0x20, 0x03, 0xD5, 0x1F, 0x20, 0x03, 0xD5,
    ];

    /// placeholder word ; ret  (the first instruction is patched whole)
    pub const RETURN_IMM: &[u8] = &[0x1F, 0x20, 0x03, 0xD5, 0xC0, 0x03, 0x5F, 0xD6];
    pub const RETURN_IMM_SLOT: u32 = 0;
    /// movz w0, #value
    pub const fn return_imm_value(value: i32) -> i32 {
        (0x5280_0000u32 | (((value as u32) & 0xffff) << 5)) as i32
    }
}

use fixtures::*;

#[test]
fn test_run_returns_42() {
    let mut w = CommandWriter::new();
    w.allocate_code(RETURN_42.len() as u32)
        .copy_code(0, RETURN_42)
        .entry_point(0)
        .run_prog()
        .end_com();

    let outcome = Runtime::new().execute(w.bytes());
    assert_eq!(outcome.status, ExitStatus::NormalCompletion, "{:?}", outcome.error);
    assert_eq!(outcome.returns, vec![42]);
}

#[test]
fn test_end_to_end_return_7() {
    let mut w = CommandWriter::new();
    w.allocate_code(16)
        .copy_code(0, &RETURN_7)
        .entry_point(0)
        .run_prog()
        .end_com();

    let outcome = Runtime::new().execute(w.bytes());
    assert_eq!(outcome.status, ExitStatus::NormalCompletion);
    assert_eq!(outcome.returns, vec![7]);
    assert_eq!(jit::execute(w.bytes()), ExitStatus::NormalCompletion);
}

#[test]
fn test_entry_point_at_nonzero_offset() {
    let mut code = vec![0u8; 8];
    code.extend_from_slice(RETURN_42);
    let mut w = CommandWriter::new();
    w.allocate_code(code.len() as u32)
        .copy_code(0, &code)
        .entry_point(8)
        .run_prog()
        .run_prog()
        .end_com();

    let outcome = Runtime::new().execute(w.bytes());
    assert!(outcome.is_success(), "{:?}", outcome.error);
    assert_eq!(outcome.returns, vec![42, 42]);
}

#[test]
fn test_patched_fragment_runs() {
    let mut w = CommandWriter::new();
    w.allocate_code(RETURN_IMM.len() as u32)
        .copy_code(0, RETURN_IMM)
        .patch_func(RETURN_IMM_SLOT, RelocationKind::Relative32, return_imm_value(1234))
        .entry_point(0)
        .run_prog()
        .end_com();

    let outcome = Runtime::new().execute(w.bytes());
    assert!(outcome.is_success(), "{:?}", outcome.error);
    assert_eq!(outcome.returns, vec![1234]);
}

#[test]
fn test_program_can_be_run_from_a_later_stream() {
    let mut runtime = Runtime::new();

    let mut compile = CommandWriter::new();
    compile
        .free_memory()
        .allocate_code(16)
        .copy_code(0, &RETURN_7)
        .entry_point(0)
        .end_com();
    let outcome = runtime.execute(compile.bytes());
    assert!(outcome.is_success());
    assert!(outcome.returns.is_empty());

    let mut run = CommandWriter::new();
    run.run_prog().end_com();
    for _ in 0..3 {
        assert_eq!(runtime.execute(run.bytes()).returns, vec![7]);
    }
}

/// Stencil-style fragments that address the data region RIP-relative. The
/// producer emits `target + addend - patch_position` and the loader adds the
/// code/data displacement.
#[cfg(target_arch = "x86_64")]
mod rip_relative {
    use super::*;

    fn object_value(data_offset: i32, addend: i32, patch_position: i32) -> i32 {
        data_offset + addend - patch_position
    }

    #[test]
    fn test_load_from_data_region() {
        // mov eax, [rip + disp32] ; ret
        let code = [0x8B, 0x05, 0x00, 0x00, 0x00, 0x00, 0xC3];
        let mut w = CommandWriter::new();
        w.allocate_data(8)
            .copy_data(4, &1_000_000i32.to_ne_bytes())
            .allocate_code(code.len() as u32)
            .copy_code(0, &code)
            .patch_object(2, RelocationKind::Relative32, object_value(4, -4, 2))
            .entry_point(0)
            .run_prog()
            .end_com();

        let outcome = Runtime::new().execute(w.bytes());
        assert!(outcome.is_success(), "{:?}", outcome.error);
        assert_eq!(outcome.returns, vec![1_000_000]);
    }

    #[test]
    fn test_store_into_data_region_then_read_back() {
        // mov dword [rip + disp32], 99 ; xor eax, eax ; ret
        let code = [
            0xC7, 0x05, 0x00, 0x00, 0x00, 0x00, 0x63, 0x00, 0x00, 0x00, //
            0x31, 0xC0, 0xC3,
        ];
        let mut w = CommandWriter::new();
        w.allocate_code(code.len() as u32)
            .allocate_data(16)
            .copy_code(0, &code)
            // disp32 is relative to the end of the 10-byte instruction
            .patch_object(2, RelocationKind::Relative32, object_value(12, -8, 2))
            .entry_point(0)
            .read_data(12, 4)
            .run_prog()
            .read_data(12, 4)
            .end_com();

        let mut runtime = Runtime::new();
        let outcome = runtime.execute(w.bytes());
        assert!(outcome.is_success(), "{:?}", outcome.error);
        assert_eq!(outcome.returns, vec![0]);
        assert_eq!(outcome.reads[0].bytes, vec![0, 0, 0, 0]);
        assert_eq!(outcome.reads[1].bytes, 99i32.to_ne_bytes().to_vec());
        assert_eq!(runtime.read_data(12, 4).unwrap(), 99i32.to_ne_bytes().to_vec());
    }
}
