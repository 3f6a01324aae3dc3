use super::{test_display, test_display_under, test_invalid, test_invalid_under};
use crate::long_mode::{ConditionCode, Decoder, Opcode};

#[test]
fn condition_codes() {
    // the jcc/cmovcc/setcc families all index the same condition table
    assert_eq!(Opcode::JO.condition(), Some(ConditionCode::O));
    assert_eq!(Opcode::JZ.condition(), Some(ConditionCode::Z));
    assert_eq!(Opcode::JG.condition(), Some(ConditionCode::G));
    assert_eq!(Opcode::CMOVO.condition(), Some(ConditionCode::O));
    assert_eq!(Opcode::CMOVA.condition(), Some(ConditionCode::A));
    assert_eq!(Opcode::SETO.condition(), Some(ConditionCode::O));
    assert_eq!(Opcode::SETLE.condition(), Some(ConditionCode::LE));
    assert_eq!(Opcode::JMP.condition(), None);
    assert_eq!(Opcode::ADD.condition(), None);

    assert!(Opcode::JZ.is_jcc());
    assert!(!Opcode::JZ.is_cmovcc());
    assert!(Opcode::CMOVA.is_cmovcc());
    assert!(Opcode::SETLE.is_setcc());
    assert!(!Opcode::JMP.is_jcc());

    // and decoded conditionals carry the right condition through
    let decoder = Decoder::default();
    let inst = decoder.decode_slice(&[0x74, 0x10]).unwrap();
    assert_eq!(inst.opcode(), Opcode::JZ);
    assert_eq!(inst.opcode().condition(), Some(ConditionCode::Z));
    let inst = decoder.decode_slice(&[0x0f, 0x9e, 0xc0]).unwrap();
    assert_eq!(inst.opcode(), Opcode::SETLE);
    assert_eq!(inst.opcode().condition(), Some(ConditionCode::LE));
    let inst = decoder.decode_slice(&[0x0f, 0x47, 0xc1]).unwrap();
    assert_eq!(inst.opcode(), Opcode::CMOVA);
    assert_eq!(inst.opcode().condition(), Some(ConditionCode::A));
}

#[test]
fn modrm_decode() {
    // just modrm
    test_display(&[0x33, 0x08], "xor ecx, dword [rax]");
    test_display(&[0x33, 0xc8], "xor ecx, eax");
    test_display(&[0x48, 0x33, 0x08], "xor rcx, qword [rax]");
    test_display(&[0x66, 0x33, 0x08], "xor cx, word [rax]");

    // modrm + disp8, zero displacements collapse
    test_display(&[0x8b, 0x40, 0x00], "mov eax, dword [rax]");
    test_display(&[0x8b, 0x45, 0xf0], "mov eax, dword [rbp - 0x10]");
    test_display(&[0x8b, 0x45, 0x10], "mov eax, dword [rbp + 0x10]");

    // modrm + disp32
    test_display(
        &[0x8b, 0x80, 0x78, 0x56, 0x34, 0x12],
        "mov eax, dword [rax + 0x12345678]",
    );
    test_display(
        &[0x8b, 0x80, 0x88, 0xa9, 0xcb, 0xed],
        "mov eax, dword [rax - 0x12345678]",
    );

    // rip-relative keeps its displacement even at zero
    test_display(
        &[0x8b, 0x05, 0x00, 0x00, 0x00, 0x00],
        "mov eax, dword [rip + 0x0]",
    );
    test_display(
        &[0x8b, 0x05, 0xf8, 0xff, 0xff, 0xff],
        "mov eax, dword [rip - 0x8]",
    );

    // rex extends both modrm fields
    test_display(&[0x44, 0x33, 0xc8], "xor r9d, eax");
    test_display(&[0x41, 0x33, 0xc8], "xor ecx, r8d");
    test_display(&[0x4d, 0x33, 0xc8], "xor r9, r8");
}

#[test]
fn sib_decode() {
    test_display(&[0x8b, 0x04, 0x88], "mov eax, dword [rax + rcx * 4]");
    test_display(
        &[0x8b, 0x44, 0x88, 0x10],
        "mov eax, dword [rax + rcx * 4 + 0x10]",
    );
    test_display(
        &[0x8b, 0x84, 0x88, 0x00, 0x01, 0x00, 0x00],
        "mov eax, dword [rax + rcx * 4 + 0x100]",
    );

    // base == 0b101 with mod == 00 drops the base
    test_display(
        &[0x8b, 0x04, 0x25, 0x78, 0x56, 0x34, 0x12],
        "mov eax, dword [0x12345678]",
    );
    test_display(
        &[0x8b, 0x04, 0x8d, 0x00, 0x00, 0x00, 0x00],
        "mov eax, dword [rcx * 4]",
    );
    test_display(
        &[0x8b, 0x04, 0x8d, 0x10, 0x00, 0x00, 0x00],
        "mov eax, dword [rcx * 4 + 0x10]",
    );

    // index == 0b100 without rex.x means no index at all
    test_display(&[0x8b, 0x04, 0x24], "mov eax, dword [rsp]");
    test_display(&[0x8b, 0x44, 0x24, 0x08], "mov eax, dword [rsp + 0x8]");

    // with rex.x, the same encoding names r12
    test_display(&[0x42, 0x8b, 0x04, 0x24], "mov eax, dword [rsp + r12 * 1]");
    test_display(&[0x4f, 0x8b, 0x04, 0x01], "mov r8, qword [r9 + r8 * 1]");
}

#[test]
fn prefixes() {
    test_display(&[0x66, 0x8b, 0xc1], "mov ax, cx");
    test_display(&[0x67, 0x8b, 0x00], "mov eax, dword [eax]");
    test_display(&[0x65, 0x8b, 0x00], "mov eax, dword gs:[rax]");
    test_display(
        &[0x64, 0x48, 0x8b, 0x04, 0x25, 0x00, 0x00, 0x00, 0x00],
        "mov rax, qword fs:[0x0]",
    );
    // cs/ds/es/ss overrides mean nothing in long mode
    test_display(&[0x3e, 0x8b, 0x00], "mov eax, dword [rax]");
    test_display(&[0xf0, 0x01, 0x08], "lock add dword [rax], ecx");

    // a rex prefix is cancelled by any prefix after it
    test_display(&[0x48, 0x66, 0x8b, 0xc1], "mov ax, cx");

    // rep/repnz only render on the string ops
    test_display(&[0xf3, 0xc3], "ret");

    // 15 bytes of prefixes is one too many
    test_invalid(&[0x66; 16]);
}

#[test]
fn arithmetic() {
    test_display(&[0x01, 0xc8], "add eax, ecx");
    test_display(&[0x00, 0xc8], "add al, cl");
    test_display(&[0x02, 0x08], "add cl, byte [rax]");
    test_display(&[0x29, 0xc8], "sub eax, ecx");
    test_display(&[0x39, 0xc8], "cmp eax, ecx");
    test_display(&[0x04, 0x05], "add al, 0x5");
    test_display(&[0x05, 0x78, 0x56, 0x34, 0x12], "add eax, 0x12345678");
    test_display(&[0x66, 0x05, 0x34, 0x12], "add ax, 0x1234");
    test_display(&[0x2d, 0x01, 0x00, 0x00, 0x00], "sub eax, 0x1");

    // group 1 immediates
    test_display(&[0x83, 0xc0, 0xff], "add eax, -0x1");
    test_display(&[0x48, 0x83, 0xec, 0x08], "sub rsp, 0x8");
    test_display(
        &[0x81, 0xec, 0x10, 0x02, 0x00, 0x00],
        "sub esp, 0x210",
    );
    test_display(&[0x80, 0x20, 0x7f], "and byte [rax], 0x7f");

    test_display(&[0x0f, 0xaf, 0xc1], "imul eax, ecx");
    test_display(&[0x6b, 0xc1, 0x10], "imul eax, ecx, 0x10");
    test_display(
        &[0x69, 0xc1, 0x00, 0x01, 0x00, 0x00],
        "imul eax, ecx, 0x100",
    );

    // forms 6 and 7 of the old one-byte rows are gone in long mode
    test_invalid(&[0x06]);
    test_invalid(&[0x27]);
    test_invalid(&[0x3f]);
}

#[test]
fn mov() {
    test_display(&[0x89, 0x08], "mov dword [rax], ecx");
    test_display(&[0x88, 0x08], "mov byte [rax], cl");
    test_display(&[0x8a, 0x08], "mov cl, byte [rax]");
    test_display(&[0x8b, 0x08], "mov ecx, dword [rax]");

    test_display(&[0xb0, 0xff], "mov al, 0xff");
    test_display(&[0x41, 0xb0, 0xff], "mov r8b, 0xff");
    test_display(&[0xb8, 0x78, 0x56, 0x34, 0x12], "mov eax, 0x12345678");
    test_display(
        &[0x48, 0xb8, 0xef, 0xcd, 0xab, 0x89, 0x67, 0x45, 0x23, 0x01],
        "mov rax, 0x123456789abcdef",
    );
    test_display(&[0x66, 0xb8, 0x34, 0x12], "mov ax, 0x1234");

    test_display(&[0xc6, 0x00, 0x01], "mov byte [rax], 0x1");
    test_display(&[0xc7, 0x00, 0xff, 0xff, 0xff, 0xff], "mov dword [rax], -0x1");
    test_invalid(&[0xc7, 0x08, 0x00, 0x00, 0x00, 0x00]);

    // moffs forms address through a full 64-bit displacement
    test_display(
        &[0xa1, 0xef, 0xcd, 0xab, 0x89, 0x67, 0x45, 0x23, 0x01],
        "mov eax, dword [0x123456789abcdef]",
    );
    test_display(
        &[0x48, 0xa3, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        "mov qword [0x0], rax",
    );

    test_display(&[0x48, 0x63, 0xc1], "movsxd rax, ecx");
    test_display(&[0x48, 0x63, 0x00], "movsxd rax, dword [rax]");

    test_display(&[0x0f, 0xb6, 0xc1], "movzx eax, cl");
    test_display(&[0x0f, 0xb7, 0x00], "movzx eax, word [rax]");
    test_display(&[0x48, 0x0f, 0xbe, 0x00], "movsx rax, byte [rax]");
    test_display(&[0x0f, 0xbf, 0xc1], "movsx eax, cx");
}

#[test]
fn push_pop() {
    test_display(&[0x50], "push rax");
    test_display(&[0x41, 0x57], "push r15");
    test_display(&[0x58], "pop rax");
    test_display(&[0x66, 0x50], "push ax");
    test_display(&[0x68, 0x78, 0x56, 0x34, 0x12], "push 0x12345678");
    test_display(&[0x6a, 0xff], "push -0x1");
    test_display(&[0x8f, 0x00], "pop qword [rax]");
    test_invalid(&[0x8f, 0x08]);
    test_display(&[0xff, 0x30], "push qword [rax]");
    test_display(&[0x9c], "pushf");
    test_display(&[0x9d], "popf");
}

#[test]
fn control_flow() {
    test_display(&[0x74, 0x10], "jz $+0x10");
    test_display(&[0x75, 0xfe], "jnz $-0x2");
    test_display(&[0x70, 0x00], "jo $+0x0");
    test_display(&[0x7e, 0x10], "jle $+0x10");
    test_display(&[0x0f, 0x84, 0x00, 0x01, 0x00, 0x00], "jz $+0x100");
    test_display(&[0x0f, 0x8f, 0xfc, 0xff, 0xff, 0xff], "jg $-0x4");

    test_display(&[0xeb, 0xfe], "jmp $-0x2");
    test_display(&[0xe9, 0x00, 0x10, 0x00, 0x00], "jmp $+0x1000");
    test_display(&[0xe8, 0x00, 0x00, 0x00, 0x00], "call $+0x0");

    // indirect forms render like any other operand
    test_display(&[0xff, 0xd0], "call rax");
    test_display(&[0xff, 0x10], "call qword [rax]");
    test_display(&[0xff, 0xe0], "jmp rax");
    test_display(&[0xff, 0x20], "jmp qword [rax]");

    test_display(&[0xc3], "ret");
    test_display(&[0xc2, 0x08, 0x00], "ret 0x8");
    test_display(&[0xc8, 0x10, 0x00, 0x01], "enter 0x10, 0x1");
    test_display(&[0xc9], "leave");
    test_display(&[0xcc], "int3");
    test_display(&[0xcd, 0x80], "int 0x80");
}

#[test]
fn conditional_ops() {
    test_display(&[0x0f, 0x44, 0xc1], "cmovz eax, ecx");
    test_display(&[0x0f, 0x4d, 0x00], "cmovge eax, dword [rax]");
    test_display(&[0x48, 0x0f, 0x45, 0xc1], "cmovnz rax, rcx");

    test_display(&[0x0f, 0x94, 0xc0], "setz al");
    test_display(&[0x0f, 0x93, 0xc0], "setae al");
    test_display(&[0x41, 0x0f, 0x94, 0xc0], "setz r8b");
    test_display(&[0x0f, 0x9f, 0x00], "setg byte [rax]");
}

#[test]
fn shifts() {
    test_display(&[0xc1, 0xe0, 0x04], "shl eax, 0x4");
    test_display(&[0x48, 0xc1, 0xfe, 0x3f], "sar rsi, 0x3f");
    test_display(&[0xd1, 0xe8], "shr eax, 0x1");
    test_display(&[0xd3, 0xe0], "shl eax, cl");
    test_display(&[0xd0, 0x00], "rol byte [rax], 0x1");

    test_display(&[0x0f, 0xa4, 0xc8, 0x04], "shld eax, ecx, 0x4");
    test_display(&[0x0f, 0xa5, 0xc8], "shld eax, ecx, cl");
    test_display(&[0x48, 0x0f, 0xad, 0xc8], "shrd rax, rcx, cl");
}

#[test]
fn group_f6_f7() {
    test_display(&[0xf6, 0xc0, 0xff], "test al, -0x1");
    test_display(
        &[0x48, 0xf7, 0x00, 0x01, 0x00, 0x00, 0x00],
        "test qword [rax], 0x1",
    );
    test_display(&[0xf7, 0xd0], "not eax");
    test_display(&[0xf7, 0xd8], "neg eax");
    test_display(&[0x48, 0xf7, 0xe1], "mul rcx");
    test_display(&[0x48, 0xf7, 0xf9], "idiv rcx");
    test_display(&[0xf7, 0x18], "neg dword [rax]");
}

#[test]
fn inc_dec() {
    test_display(&[0xfe, 0xc0], "inc al");
    test_display(&[0xff, 0xc0], "inc eax");
    test_display(&[0x48, 0xff, 0xc8], "dec rax");
    test_display(&[0xff, 0x08], "dec dword [rax]");
    test_invalid(&[0xfe, 0xd0]);
    test_invalid(&[0xff, 0xf8]);
}

#[test]
fn string_ops() {
    test_display(&[0xa4], "movs byte es:[rdi], byte ds:[rsi]");
    test_display(&[0xa5], "movs dword es:[rdi], dword ds:[rsi]");
    test_display(&[0xf3, 0xa4], "rep movs byte es:[rdi], byte ds:[rsi]");
    test_display(&[0xf3, 0x48, 0xa5], "rep movs qword es:[rdi], qword ds:[rsi]");
    test_display(&[0xa6], "cmps byte ds:[rsi], byte es:[rdi]");
    test_display(&[0xab], "stos dword es:[rdi], eax");
    test_display(&[0xad], "lods eax, dword ds:[rsi]");
    test_display(&[0xf2, 0xae], "repnz scas byte es:[rdi], al");
}

#[test]
fn xchg_nop() {
    test_display(&[0x90], "nop");
    test_display(&[0xf3, 0x90], "pause");
    test_display(&[0x48, 0x90], "nop");
    test_display(&[0x41, 0x90], "xchg eax, r8d");
    test_display(&[0x91], "xchg eax, ecx");
    test_display(&[0x48, 0x91], "xchg rax, rcx");
    test_display(&[0x86, 0x08], "xchg byte [rax], cl");
    test_display(&[0x87, 0x08], "xchg dword [rax], ecx");

    // multibyte nop takes a full modrm
    test_display(&[0x0f, 0x1f, 0x40, 0x00], "nop dword [rax]");
}

#[test]
fn misc() {
    test_display(&[0x98], "cwde");
    test_display(&[0x66, 0x98], "cbw");
    test_display(&[0x48, 0x98], "cdqe");
    test_display(&[0x99], "cdq");
    test_display(&[0x66, 0x99], "cwd");
    test_display(&[0x48, 0x99], "cqo");
    test_display(&[0xf4], "hlt");
    test_display(&[0xf5], "cmc");
    test_display(&[0xf8], "clc");
    test_display(&[0xf9], "stc");
    test_display(&[0xfa], "cli");
    test_display(&[0xfb], "sti");
    test_display(&[0xfc], "cld");
    test_display(&[0xfd], "std");
    test_display(&[0x0f, 0x05], "syscall");
    test_display(&[0x0f, 0x0b], "ud2");
    test_display(&[0x0f, 0x31], "rdtsc");
    test_display(&[0x0f, 0xa2], "cpuid");

    test_display(&[0x48, 0x8d, 0x04, 0x08], "lea rax, qword [rax + rcx * 1]");
    test_display(&[0x8d, 0x40, 0x08], "lea eax, dword [rax + 0x8]");
    test_invalid(&[0x8d, 0xc0]);

    test_display(&[0x84, 0xc9], "test cl, cl");
    test_display(&[0x85, 0xc0], "test eax, eax");
    test_display(&[0xa8, 0x01], "test al, 0x1");
    test_display(&[0xa9, 0x00, 0x01, 0x00, 0x00], "test eax, 0x100");
}

#[test]
fn bit_ops() {
    test_display(&[0x0f, 0xa3, 0xc8], "bt eax, ecx");
    test_display(&[0x0f, 0xab, 0x08], "bts dword [rax], ecx");
    test_display(&[0x0f, 0xb3, 0xc8], "btr eax, ecx");
    test_display(&[0x0f, 0xbb, 0xc8], "btc eax, ecx");
    test_display(&[0x48, 0x0f, 0xba, 0xe0, 0x07], "bt rax, 0x7");
    test_display(&[0x0f, 0xba, 0xf8, 0x07], "btc eax, 0x7");
    test_invalid(&[0x0f, 0xba, 0xc0, 0x07]);

    test_display(&[0x0f, 0xbc, 0xc1], "bsf eax, ecx");
    test_display(&[0x0f, 0xbd, 0xc1], "bsr eax, ecx");
    test_display(&[0x0f, 0xc8], "bswap eax");
    test_display(&[0x48, 0x0f, 0xc8], "bswap rax");
    test_display(&[0x41, 0x0f, 0xc8], "bswap r8d");
}

#[test]
fn tzcnt_lzcnt_downgrade() {
    // without bmi1/lzcnt, the rep prefix on bsf/bsr is quietly ignored
    test_display(&[0xf3, 0x0f, 0xbc, 0xc1], "tzcnt eax, ecx");
    test_display_under(&Decoder::minimal(), &[0xf3, 0x0f, 0xbc, 0xc1], "bsf eax, ecx");
    test_display_under(
        &Decoder::minimal().with_bmi1(),
        &[0xf3, 0x0f, 0xbc, 0xc1],
        "tzcnt eax, ecx",
    );

    test_display(&[0xf3, 0x0f, 0xbd, 0xc1], "lzcnt eax, ecx");
    test_display_under(&Decoder::minimal(), &[0xf3, 0x0f, 0xbd, 0xc1], "bsr eax, ecx");
    test_display_under(
        &Decoder::minimal().with_lzcnt(),
        &[0xf3, 0x0f, 0xbd, 0xc1],
        "lzcnt eax, ecx",
    );
}

#[test]
fn cmpxchg() {
    test_display(&[0x0f, 0xb1, 0x0a], "cmpxchg dword [rdx], ecx");
    test_display(&[0xf0, 0x0f, 0xb1, 0x0a], "lock cmpxchg dword [rdx], ecx");
    test_display(&[0x0f, 0xb0, 0xc1], "cmpxchg al, cl");
}

#[test]
fn sse() {
    test_display(&[0x0f, 0x10, 0x01], "movups xmm0, xmmword [rcx]");
    test_display(&[0x0f, 0x11, 0x01], "movups xmmword [rcx], xmm0");
    test_display(&[0xf3, 0x0f, 0x10, 0xc1], "movss xmm0, xmm1");
    test_display(&[0xf3, 0x0f, 0x10, 0x01], "movss xmm0, dword [rcx]");
    test_display(&[0xf2, 0x0f, 0x10, 0x01], "movsd xmm0, qword [rcx]");
    test_display(&[0x66, 0x0f, 0x10, 0x01], "movupd xmm0, xmmword [rcx]");
    test_display(&[0x0f, 0x28, 0xc1], "movaps xmm0, xmm1");
    test_display(&[0x66, 0x0f, 0x28, 0xc1], "movapd xmm0, xmm1");
    test_display(&[0x0f, 0x29, 0x01], "movaps xmmword [rcx], xmm0");

    test_display(&[0x0f, 0x2e, 0xc1], "ucomiss xmm0, xmm1");
    test_display(&[0x66, 0x0f, 0x2f, 0x01], "comisd xmm0, qword [rcx]");

    test_display(&[0x0f, 0x51, 0xc1], "sqrtps xmm0, xmm1");
    test_display(&[0xf3, 0x0f, 0x51, 0x01], "sqrtss xmm0, dword [rcx]");
    test_display(&[0x0f, 0x54, 0xc1], "andps xmm0, xmm1");
    test_display(&[0x66, 0x0f, 0x57, 0xc1], "xorpd xmm0, xmm1");
    test_display(&[0x0f, 0x58, 0xc1], "addps xmm0, xmm1");
    test_display(&[0xf2, 0x0f, 0x5e, 0xc1], "divsd xmm0, xmm1");
    test_display(&[0xf3, 0x0f, 0x5f, 0x01], "maxss xmm0, dword [rcx]");
    test_display(&[0x0f, 0xc2, 0xc1, 0x00], "cmpps xmm0, xmm1, 0x0");

    // rep/repnz against forms that have no rep meaning are invalid
    test_invalid(&[0xf3, 0x0f, 0x28, 0xc1]);
    test_invalid(&[0xf2, 0x0f, 0x54, 0xc1]);
}

#[test]
fn sse2() {
    test_display(&[0x66, 0x0f, 0x6e, 0xc0], "movd xmm0, eax");
    test_display(&[0x66, 0x48, 0x0f, 0x6e, 0xc0], "movq xmm0, rax");
    test_display(&[0x66, 0x0f, 0x7e, 0xc0], "movd eax, xmm0");
    test_display(&[0xf3, 0x0f, 0x7e, 0xc1], "movq xmm0, xmm1");
    test_display(&[0x66, 0x0f, 0xd6, 0xc1], "movq xmm1, xmm0");

    test_display(&[0x66, 0x0f, 0x6f, 0xc1], "movdqa xmm0, xmm1");
    test_display(&[0xf3, 0x0f, 0x6f, 0x01], "movdqu xmm0, xmmword [rcx]");
    test_display(&[0xf3, 0x0f, 0x7f, 0x01], "movdqu xmmword [rcx], xmm0");

    test_display(&[0x66, 0x0f, 0x70, 0xc1, 0x1b], "pshufd xmm0, xmm1, 0x1b");
    test_display(&[0xf3, 0x0f, 0x70, 0xc1, 0x1b], "pshufhw xmm0, xmm1, 0x1b");
    test_display(&[0xf2, 0x0f, 0x70, 0xc1, 0x1b], "pshuflw xmm0, xmm1, 0x1b");

    test_display(&[0x66, 0x0f, 0x74, 0xc1], "pcmpeqb xmm0, xmm1");
    test_display(&[0x66, 0x0f, 0x76, 0xc1], "pcmpeqd xmm0, xmm1");
    test_display(&[0x66, 0x0f, 0xd4, 0xc1], "paddq xmm0, xmm1");
    test_display(&[0x66, 0x0f, 0xdb, 0xc1], "pand xmm0, xmm1");
    test_display(&[0x66, 0x0f, 0xef, 0xc1], "pxor xmm0, xmm1");
    test_display(&[0x66, 0x0f, 0xfa, 0x01], "psubd xmm0, xmmword [rcx]");
    test_display(&[0x66, 0x0f, 0xfe, 0xc1], "paddd xmm0, xmm1");
    test_display(&[0x66, 0x44, 0x0f, 0xef, 0xc1], "pxor xmm8, xmm1");

    // the no-66 versions of these rows are mmx, which stays undecoded
    test_invalid(&[0x0f, 0xef, 0xc1]);
    test_invalid(&[0x0f, 0xfe, 0xc1]);
    test_invalid(&[0x0f, 0x6f, 0xc1]);
}

#[test]
fn ssse3_sse41() {
    test_display(&[0x66, 0x0f, 0x38, 0x00, 0xc1], "pshufb xmm0, xmm1");
    test_display(&[0x66, 0x0f, 0x38, 0x1c, 0xc1], "pabsb xmm0, xmm1");
    test_display(&[0x66, 0x0f, 0x38, 0x17, 0xc1], "ptest xmm0, xmm1");
    test_display(&[0x66, 0x0f, 0x38, 0x40, 0xc1], "pmulld xmm0, xmm1");
    test_display(&[0x66, 0x0f, 0x3a, 0x08, 0xc1, 0x03], "roundps xmm0, xmm1, 0x3");
    test_display(&[0x66, 0x0f, 0x3a, 0x0b, 0x01, 0x03], "roundsd xmm0, qword [rcx], 0x3");
    test_display(&[0x66, 0x0f, 0x3a, 0x0f, 0xc1, 0x04], "palignr xmm0, xmm1, 0x4");

    // the escape maps require the 66 prefix here
    test_invalid(&[0x0f, 0x38, 0x00, 0xc1]);
    test_invalid(&[0x0f, 0x3a, 0x0f, 0xc1, 0x04]);

    let minimal = Decoder::minimal();
    test_invalid_under(&minimal, &[0x66, 0x0f, 0x38, 0x00, 0xc1]);
    test_invalid_under(&minimal, &[0x66, 0x0f, 0x38, 0x17, 0xc1]);
    test_display_under(
        &Decoder::minimal().with_ssse3(),
        &[0x66, 0x0f, 0x38, 0x00, 0xc1],
        "pshufb xmm0, xmm1",
    );
    test_display_under(
        &Decoder::minimal().with_sse4_1(),
        &[0x66, 0x0f, 0x3a, 0x0a, 0xc1, 0x03],
        "roundss xmm0, xmm1, 0x3",
    );
}

#[test]
fn truncated_input() {
    test_invalid(&[0x8b]);
    test_invalid(&[0x8b, 0x04]);
    test_invalid(&[0x0f]);
    test_invalid(&[0x81, 0xec, 0x10, 0x02]);
    test_invalid(&[0x48, 0xb8, 0x01, 0x02, 0x03]);
    test_invalid(&[]);
}
