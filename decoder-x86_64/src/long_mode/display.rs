//! Intel-syntax rendering of decoded instructions, as plain text and as
//! colored token streams.

use std::fmt;

use decoder::{encode_hex, ToTokens, TokenStream};
use tokenizing::{ColorScheme, Colors};

use super::*;
use crate::MEM_SIZE_STRINGS;

// indexed by `num + (bank << 3)`; the gaps between banks are padding.
#[rustfmt::skip]
const REG_NAMES: &[&str; 201] = &[
    "rax", "rcx", "rdx", "rbx", "rsp", "rbp", "rsi", "rdi",
    "r8", "r9", "r10", "r11", "r12", "r13", "r14", "r15",
    "eax", "ecx", "edx", "ebx", "esp", "ebp", "esi", "edi",
    "r8d", "r9d", "r10d", "r11d", "r12d", "r13d", "r14d", "r15d",
    "ax", "cx", "dx", "bx", "sp", "bp", "si", "di",
    "r8w", "r9w", "r10w", "r11w", "r12w", "r13w", "r14w", "r15w",
    "al", "cl", "dl", "bl", "ah", "ch", "dh", "bh",
    "BUG", "BUG", "BUG", "BUG", "BUG", "BUG", "BUG", "BUG",
    "al", "cl", "dl", "bl", "spl", "bpl", "sil", "dil",
    "r8b", "r9b", "r10b", "r11b", "r12b", "r13b", "r14b", "r15b",
    "es", "cs", "ss", "ds", "fs", "gs", "BUG", "BUG",
    "xmm0", "xmm1", "xmm2", "xmm3", "xmm4", "xmm5", "xmm6", "xmm7",
    "xmm8", "xmm9", "xmm10", "xmm11", "xmm12", "xmm13", "xmm14", "xmm15",
    "xmm16", "xmm17", "xmm18", "xmm19", "xmm20", "xmm21", "xmm22", "xmm23",
    "xmm24", "xmm25", "xmm26", "xmm27", "xmm28", "xmm29", "xmm30", "xmm31",
    "ymm0", "ymm1", "ymm2", "ymm3", "ymm4", "ymm5", "ymm6", "ymm7",
    "ymm8", "ymm9", "ymm10", "ymm11", "ymm12", "ymm13", "ymm14", "ymm15",
    "ymm16", "ymm17", "ymm18", "ymm19", "ymm20", "ymm21", "ymm22", "ymm23",
    "ymm24", "ymm25", "ymm26", "ymm27", "ymm28", "ymm29", "ymm30", "ymm31",
    "zmm0", "zmm1", "zmm2", "zmm3", "zmm4", "zmm5", "zmm6", "zmm7",
    "zmm8", "zmm9", "zmm10", "zmm11", "zmm12", "zmm13", "zmm14", "zmm15",
    "zmm16", "zmm17", "zmm18", "zmm19", "zmm20", "zmm21", "zmm22", "zmm23",
    "zmm24", "zmm25", "zmm26", "zmm27", "zmm28", "zmm29", "zmm30", "zmm31",
    "k0", "k1", "k2", "k3", "k4", "k5", "k6", "k7",
    "rip", "BUG", "BUG", "BUG", "BUG", "BUG", "BUG", "BUG",
    "rflags",
];

pub(super) fn regspec_label(spec: &RegSpec) -> &'static str {
    REG_NAMES[spec.num as usize + ((spec.bank as usize) << 3)]
}

fn segment_label(segment: Segment) -> &'static str {
    match segment {
        Segment::CS => "cs",
        Segment::DS => "ds",
        Segment::ES => "es",
        Segment::FS => "fs",
        Segment::GS => "gs",
        Segment::SS => "ss",
    }
}

// scale in a sib byte is always one of these
fn scale_label(scale: u8) -> &'static str {
    match scale {
        1 => "1",
        2 => "2",
        4 => "4",
        _ => "8",
    }
}

impl fmt::Display for RegSpec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(regspec_label(self))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(segment_label(*self))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut stream = TokenStream::new();
        self.tokenize(&mut stream);
        f.write_str(&stream.to_string())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut stream = TokenStream::new();
        self.tokenize(&mut stream);
        f.write_str(&stream.to_string())
    }
}

impl Opcode {
    /// the lowercase mnemonic for this opcode.
    pub fn name(&self) -> &'static str {
        match self {
            Opcode::Invalid => "invalid",
            Opcode::ADD => "add",
            Opcode::OR => "or",
            Opcode::ADC => "adc",
            Opcode::SBB => "sbb",
            Opcode::AND => "and",
            Opcode::SUB => "sub",
            Opcode::XOR => "xor",
            Opcode::CMP => "cmp",
            Opcode::PUSH => "push",
            Opcode::POP => "pop",
            Opcode::MOVSXD => "movsxd",
            Opcode::IMUL => "imul",
            Opcode::TEST => "test",
            Opcode::XCHG => "xchg",
            Opcode::MOV => "mov",
            Opcode::LEA => "lea",
            Opcode::NOP => "nop",
            Opcode::PAUSE => "pause",
            Opcode::CBW => "cbw",
            Opcode::CWDE => "cwde",
            Opcode::CDQE => "cdqe",
            Opcode::CWD => "cwd",
            Opcode::CDQ => "cdq",
            Opcode::CQO => "cqo",
            Opcode::PUSHF => "pushf",
            Opcode::POPF => "popf",
            Opcode::MOVS => "movs",
            Opcode::CMPS => "cmps",
            Opcode::STOS => "stos",
            Opcode::LODS => "lods",
            Opcode::SCAS => "scas",
            Opcode::RETURN => "ret",
            Opcode::ENTER => "enter",
            Opcode::LEAVE => "leave",
            Opcode::INT => "int",
            Opcode::INT3 => "int3",
            Opcode::CALL => "call",
            Opcode::JMP => "jmp",
            Opcode::HLT => "hlt",
            Opcode::CMC => "cmc",
            Opcode::CLC => "clc",
            Opcode::STC => "stc",
            Opcode::CLI => "cli",
            Opcode::STI => "sti",
            Opcode::CLD => "cld",
            Opcode::STD => "std",
            Opcode::INC => "inc",
            Opcode::DEC => "dec",
            Opcode::NOT => "not",
            Opcode::NEG => "neg",
            Opcode::MUL => "mul",
            Opcode::DIV => "div",
            Opcode::IDIV => "idiv",
            Opcode::ROL => "rol",
            Opcode::ROR => "ror",
            Opcode::RCL => "rcl",
            Opcode::RCR => "rcr",
            Opcode::SHL => "shl",
            Opcode::SHR => "shr",
            Opcode::SAL => "sal",
            Opcode::SAR => "sar",
            Opcode::JO => "jo",
            Opcode::JNO => "jno",
            Opcode::JB => "jb",
            Opcode::JNB => "jnb",
            Opcode::JZ => "jz",
            Opcode::JNZ => "jnz",
            Opcode::JNA => "jna",
            Opcode::JA => "ja",
            Opcode::JS => "js",
            Opcode::JNS => "jns",
            Opcode::JP => "jp",
            Opcode::JNP => "jnp",
            Opcode::JL => "jl",
            Opcode::JGE => "jge",
            Opcode::JLE => "jle",
            Opcode::JG => "jg",
            Opcode::CMOVO => "cmovo",
            Opcode::CMOVNO => "cmovno",
            Opcode::CMOVB => "cmovb",
            Opcode::CMOVNB => "cmovnb",
            Opcode::CMOVZ => "cmovz",
            Opcode::CMOVNZ => "cmovnz",
            Opcode::CMOVNA => "cmovna",
            Opcode::CMOVA => "cmova",
            Opcode::CMOVS => "cmovs",
            Opcode::CMOVNS => "cmovns",
            Opcode::CMOVP => "cmovp",
            Opcode::CMOVNP => "cmovnp",
            Opcode::CMOVL => "cmovl",
            Opcode::CMOVGE => "cmovge",
            Opcode::CMOVLE => "cmovle",
            Opcode::CMOVG => "cmovg",
            Opcode::SETO => "seto",
            Opcode::SETNO => "setno",
            Opcode::SETB => "setb",
            Opcode::SETAE => "setae",
            Opcode::SETZ => "setz",
            Opcode::SETNZ => "setnz",
            Opcode::SETBE => "setbe",
            Opcode::SETA => "seta",
            Opcode::SETS => "sets",
            Opcode::SETNS => "setns",
            Opcode::SETP => "setp",
            Opcode::SETNP => "setnp",
            Opcode::SETL => "setl",
            Opcode::SETGE => "setge",
            Opcode::SETLE => "setle",
            Opcode::SETG => "setg",
            Opcode::SYSCALL => "syscall",
            Opcode::UD2 => "ud2",
            Opcode::RDTSC => "rdtsc",
            Opcode::CPUID => "cpuid",
            Opcode::BT => "bt",
            Opcode::BTS => "bts",
            Opcode::BTR => "btr",
            Opcode::BTC => "btc",
            Opcode::SHLD => "shld",
            Opcode::SHRD => "shrd",
            Opcode::CMPXCHG => "cmpxchg",
            Opcode::MOVZX => "movzx",
            Opcode::MOVSX => "movsx",
            Opcode::BSF => "bsf",
            Opcode::BSR => "bsr",
            Opcode::TZCNT => "tzcnt",
            Opcode::LZCNT => "lzcnt",
            Opcode::BSWAP => "bswap",
            Opcode::MOVUPS => "movups",
            Opcode::MOVUPD => "movupd",
            Opcode::MOVSS => "movss",
            Opcode::MOVSD => "movsd",
            Opcode::MOVAPS => "movaps",
            Opcode::MOVAPD => "movapd",
            Opcode::UCOMISS => "ucomiss",
            Opcode::UCOMISD => "ucomisd",
            Opcode::COMISS => "comiss",
            Opcode::COMISD => "comisd",
            Opcode::SQRTPS => "sqrtps",
            Opcode::SQRTPD => "sqrtpd",
            Opcode::SQRTSS => "sqrtss",
            Opcode::SQRTSD => "sqrtsd",
            Opcode::ANDPS => "andps",
            Opcode::ANDPD => "andpd",
            Opcode::ANDNPS => "andnps",
            Opcode::ANDNPD => "andnpd",
            Opcode::ORPS => "orps",
            Opcode::ORPD => "orpd",
            Opcode::XORPS => "xorps",
            Opcode::XORPD => "xorpd",
            Opcode::ADDPS => "addps",
            Opcode::ADDPD => "addpd",
            Opcode::ADDSS => "addss",
            Opcode::ADDSD => "addsd",
            Opcode::MULPS => "mulps",
            Opcode::MULPD => "mulpd",
            Opcode::MULSS => "mulss",
            Opcode::MULSD => "mulsd",
            Opcode::SUBPS => "subps",
            Opcode::SUBPD => "subpd",
            Opcode::SUBSS => "subss",
            Opcode::SUBSD => "subsd",
            Opcode::MINPS => "minps",
            Opcode::MINPD => "minpd",
            Opcode::MINSS => "minss",
            Opcode::MINSD => "minsd",
            Opcode::DIVPS => "divps",
            Opcode::DIVPD => "divpd",
            Opcode::DIVSS => "divss",
            Opcode::DIVSD => "divsd",
            Opcode::MAXPS => "maxps",
            Opcode::MAXPD => "maxpd",
            Opcode::MAXSS => "maxss",
            Opcode::MAXSD => "maxsd",
            Opcode::CMPPS => "cmpps",
            Opcode::CMPPD => "cmppd",
            Opcode::CMPSS => "cmpss",
            Opcode::CMPSD => "cmpsd",
            Opcode::MOVD => "movd",
            Opcode::MOVQ => "movq",
            Opcode::MOVDQA => "movdqa",
            Opcode::MOVDQU => "movdqu",
            Opcode::PSHUFD => "pshufd",
            Opcode::PSHUFHW => "pshufhw",
            Opcode::PSHUFLW => "pshuflw",
            Opcode::PCMPEQB => "pcmpeqb",
            Opcode::PCMPEQW => "pcmpeqw",
            Opcode::PCMPEQD => "pcmpeqd",
            Opcode::PADDB => "paddb",
            Opcode::PADDW => "paddw",
            Opcode::PADDD => "paddd",
            Opcode::PADDQ => "paddq",
            Opcode::PSUBB => "psubb",
            Opcode::PSUBW => "psubw",
            Opcode::PSUBD => "psubd",
            Opcode::PSUBQ => "psubq",
            Opcode::PAND => "pand",
            Opcode::PANDN => "pandn",
            Opcode::POR => "por",
            Opcode::PXOR => "pxor",
            Opcode::PSHUFB => "pshufb",
            Opcode::PTEST => "ptest",
            Opcode::PABSB => "pabsb",
            Opcode::PABSW => "pabsw",
            Opcode::PABSD => "pabsd",
            Opcode::PMULLD => "pmulld",
            Opcode::ROUNDPS => "roundps",
            Opcode::ROUNDPD => "roundpd",
            Opcode::ROUNDSS => "roundss",
            Opcode::ROUNDSD => "roundsd",
            Opcode::PALIGNR => "palignr",
            Opcode::VMOVUPS => "vmovups",
            Opcode::VMOVUPD => "vmovupd",
            Opcode::VMOVSS => "vmovss",
            Opcode::VMOVSD => "vmovsd",
            Opcode::VMOVAPS => "vmovaps",
            Opcode::VMOVAPD => "vmovapd",
            Opcode::VMOVDQA => "vmovdqa",
            Opcode::VMOVDQU => "vmovdqu",
            Opcode::VUCOMISS => "vucomiss",
            Opcode::VUCOMISD => "vucomisd",
            Opcode::VCOMISS => "vcomiss",
            Opcode::VCOMISD => "vcomisd",
            Opcode::VSQRTPS => "vsqrtps",
            Opcode::VSQRTPD => "vsqrtpd",
            Opcode::VSQRTSS => "vsqrtss",
            Opcode::VSQRTSD => "vsqrtsd",
            Opcode::VANDPS => "vandps",
            Opcode::VANDPD => "vandpd",
            Opcode::VANDNPS => "vandnps",
            Opcode::VANDNPD => "vandnpd",
            Opcode::VORPS => "vorps",
            Opcode::VORPD => "vorpd",
            Opcode::VXORPS => "vxorps",
            Opcode::VXORPD => "vxorpd",
            Opcode::VADDPS => "vaddps",
            Opcode::VADDPD => "vaddpd",
            Opcode::VADDSS => "vaddss",
            Opcode::VADDSD => "vaddsd",
            Opcode::VMULPS => "vmulps",
            Opcode::VMULPD => "vmulpd",
            Opcode::VMULSS => "vmulss",
            Opcode::VMULSD => "vmulsd",
            Opcode::VSUBPS => "vsubps",
            Opcode::VSUBPD => "vsubpd",
            Opcode::VSUBSS => "vsubss",
            Opcode::VSUBSD => "vsubsd",
            Opcode::VMINPS => "vminps",
            Opcode::VMINPD => "vminpd",
            Opcode::VMINSS => "vminss",
            Opcode::VMINSD => "vminsd",
            Opcode::VDIVPS => "vdivps",
            Opcode::VDIVPD => "vdivpd",
            Opcode::VDIVSS => "vdivss",
            Opcode::VDIVSD => "vdivsd",
            Opcode::VMAXPS => "vmaxps",
            Opcode::VMAXPD => "vmaxpd",
            Opcode::VMAXSS => "vmaxss",
            Opcode::VMAXSD => "vmaxsd",
            Opcode::VCMPPS => "vcmpps",
            Opcode::VCMPPD => "vcmppd",
            Opcode::VCMPSS => "vcmpss",
            Opcode::VCMPSD => "vcmpsd",
            Opcode::VMOVD => "vmovd",
            Opcode::VMOVQ => "vmovq",
            Opcode::VPSHUFD => "vpshufd",
            Opcode::VPCMPEQB => "vpcmpeqb",
            Opcode::VPCMPEQW => "vpcmpeqw",
            Opcode::VPCMPEQD => "vpcmpeqd",
            Opcode::VPADDB => "vpaddb",
            Opcode::VPADDW => "vpaddw",
            Opcode::VPADDD => "vpaddd",
            Opcode::VPADDQ => "vpaddq",
            Opcode::VPSUBB => "vpsubb",
            Opcode::VPSUBW => "vpsubw",
            Opcode::VPSUBD => "vpsubd",
            Opcode::VPSUBQ => "vpsubq",
            Opcode::VPAND => "vpand",
            Opcode::VPANDN => "vpandn",
            Opcode::VPOR => "vpor",
            Opcode::VPXOR => "vpxor",
            Opcode::VPSHUFB => "vpshufb",
            Opcode::VPTEST => "vptest",
            Opcode::VPMULLD => "vpmulld",
            Opcode::VBROADCASTSS => "vbroadcastss",
            Opcode::VBROADCASTSD => "vbroadcastsd",
            Opcode::VPBROADCASTD => "vpbroadcastd",
            Opcode::VPBROADCASTQ => "vpbroadcastq",
            Opcode::VINSERTF128 => "vinsertf128",
            Opcode::VEXTRACTF128 => "vextractf128",
            Opcode::VZEROUPPER => "vzeroupper",
            Opcode::VZEROALL => "vzeroall",
            Opcode::VROUNDPS => "vroundps",
            Opcode::VROUNDPD => "vroundpd",
            Opcode::VROUNDSS => "vroundss",
            Opcode::VROUNDSD => "vroundsd",
            Opcode::VPALIGNR => "vpalignr",
            Opcode::ANDN => "andn",
            Opcode::BEXTR => "bextr",
            Opcode::BLSI => "blsi",
            Opcode::BLSMSK => "blsmsk",
            Opcode::BLSR => "blsr",
            Opcode::BZHI => "bzhi",
            Opcode::PEXT => "pext",
            Opcode::PDEP => "pdep",
            Opcode::MULX => "mulx",
            Opcode::RORX => "rorx",
            Opcode::SARX => "sarx",
            Opcode::SHLX => "shlx",
            Opcode::SHRX => "shrx",
            Opcode::VMOVDQA32 => "vmovdqa32",
            Opcode::VMOVDQA64 => "vmovdqa64",
            Opcode::VMOVDQU8 => "vmovdqu8",
            Opcode::VMOVDQU16 => "vmovdqu16",
            Opcode::VMOVDQU32 => "vmovdqu32",
            Opcode::VMOVDQU64 => "vmovdqu64",
            Opcode::VPANDD => "vpandd",
            Opcode::VPANDQ => "vpandq",
            Opcode::VPORD => "vpord",
            Opcode::VPORQ => "vporq",
            Opcode::VPXORD => "vpxord",
            Opcode::VPXORQ => "vpxorq",
            Opcode::VPMULLQ => "vpmullq",
            Opcode::VALIGND => "valignd",
            Opcode::VALIGNQ => "valignq",
            Opcode::VCOMPRESSPS => "vcompressps",
            Opcode::VCOMPRESSPD => "vcompresspd",
            Opcode::VEXPANDPS => "vexpandps",
            Opcode::VEXPANDPD => "vexpandpd",
        }
    }
}

fn tokenize_mask(stream: &mut TokenStream, mask: &RegSpec, merge: MergeMode) {
    if mask.num != 0 {
        stream.push("{", Colors::brackets());
        stream.push(regspec_label(mask), Colors::register());
        stream.push("}", Colors::brackets());
    }
    if let MergeMode::Zero = merge {
        stream.push("{z}", Colors::annotation());
    }
}

impl ToTokens for Operand {
    fn tokenize(&self, stream: &mut TokenStream) {
        match self {
            Operand::ImmediateI8(imm) => {
                stream.push_owned(encode_hex(*imm as i64), Colors::immediate());
            }
            Operand::ImmediateI16(imm) => {
                stream.push_owned(encode_hex(*imm as i64), Colors::immediate());
            }
            Operand::ImmediateI32(imm) => {
                stream.push_owned(encode_hex(*imm as i64), Colors::immediate());
            }
            Operand::ImmediateI64(imm) => {
                stream.push_owned(encode_hex(*imm), Colors::immediate());
            }
            Operand::ImmediateU8(imm) => {
                stream.push_owned(format!("0x{imm:x}"), Colors::immediate());
            }
            Operand::ImmediateU16(imm) => {
                stream.push_owned(format!("0x{imm:x}"), Colors::immediate());
            }
            Operand::ImmediateU32(imm) => {
                stream.push_owned(format!("0x{imm:x}"), Colors::immediate());
            }
            Operand::ImmediateU64(imm) => {
                stream.push_owned(format!("0x{imm:x}"), Colors::immediate());
            }
            Operand::Register(spec) => {
                stream.push(regspec_label(spec), Colors::register());
            }
            Operand::RegisterMaskMerge(spec, mask, merge) => {
                stream.push(regspec_label(spec), Colors::register());
                tokenize_mask(stream, mask, *merge);
            }
            Operand::RegisterMaskMergeSae(spec, mask, merge, sae) => {
                stream.push(regspec_label(spec), Colors::register());
                tokenize_mask(stream, mask, *merge);
                stream.push(sae.label(), Colors::annotation());
            }
            Operand::RegisterMaskMergeSaeNoround(spec, mask, merge) => {
                stream.push(regspec_label(spec), Colors::register());
                tokenize_mask(stream, mask, *merge);
                stream.push("{sae}", Colors::annotation());
            }
            Operand::DisplacementU32(disp) => {
                stream.push("[", Colors::brackets());
                stream.push_owned(format!("0x{disp:x}"), Colors::immediate());
                stream.push("]", Colors::brackets());
            }
            Operand::DisplacementU64(disp) => {
                stream.push("[", Colors::brackets());
                stream.push_owned(format!("0x{disp:x}"), Colors::immediate());
                stream.push("]", Colors::brackets());
            }
            Operand::RegDeref(spec) => {
                stream.push("[", Colors::brackets());
                stream.push(regspec_label(spec), Colors::register());
                stream.push("]", Colors::brackets());
            }
            Operand::RegDisp(spec, disp) => {
                stream.push("[", Colors::brackets());
                stream.push(regspec_label(spec), Colors::register());
                crate::Number(*disp).tokenize(stream);
                stream.push("]", Colors::brackets());
            }
            Operand::RegScale(index, scale) => {
                stream.push("[", Colors::brackets());
                stream.push(regspec_label(index), Colors::register());
                stream.push(" * ", Colors::expr());
                stream.push(scale_label(*scale), Colors::immediate());
                stream.push("]", Colors::brackets());
            }
            Operand::RegScaleDisp(index, scale, disp) => {
                stream.push("[", Colors::brackets());
                stream.push(regspec_label(index), Colors::register());
                stream.push(" * ", Colors::expr());
                stream.push(scale_label(*scale), Colors::immediate());
                crate::Number(*disp).tokenize(stream);
                stream.push("]", Colors::brackets());
            }
            Operand::RegIndexBaseScale(base, index, scale) => {
                stream.push("[", Colors::brackets());
                stream.push(regspec_label(base), Colors::register());
                stream.push(" + ", Colors::expr());
                stream.push(regspec_label(index), Colors::register());
                stream.push(" * ", Colors::expr());
                stream.push(scale_label(*scale), Colors::immediate());
                stream.push("]", Colors::brackets());
            }
            Operand::RegIndexBaseScaleDisp(base, index, scale, disp) => {
                stream.push("[", Colors::brackets());
                stream.push(regspec_label(base), Colors::register());
                stream.push(" + ", Colors::expr());
                stream.push(regspec_label(index), Colors::register());
                stream.push(" * ", Colors::expr());
                stream.push(scale_label(*scale), Colors::immediate());
                crate::Number(*disp).tokenize(stream);
                stream.push("]", Colors::brackets());
            }
            Operand::RegDerefMasked(spec, mask) => {
                Operand::RegDeref(*spec).tokenize(stream);
                stream.push("{", Colors::brackets());
                stream.push(regspec_label(mask), Colors::register());
                stream.push("}", Colors::brackets());
            }
            Operand::RegDispMasked(spec, disp, mask) => {
                Operand::RegDisp(*spec, *disp).tokenize(stream);
                stream.push("{", Colors::brackets());
                stream.push(regspec_label(mask), Colors::register());
                stream.push("}", Colors::brackets());
            }
            Operand::RegScaleMasked(index, scale, mask) => {
                Operand::RegScale(*index, *scale).tokenize(stream);
                stream.push("{", Colors::brackets());
                stream.push(regspec_label(mask), Colors::register());
                stream.push("}", Colors::brackets());
            }
            Operand::RegScaleDispMasked(index, scale, disp, mask) => {
                Operand::RegScaleDisp(*index, *scale, *disp).tokenize(stream);
                stream.push("{", Colors::brackets());
                stream.push(regspec_label(mask), Colors::register());
                stream.push("}", Colors::brackets());
            }
            Operand::RegIndexBaseScaleMasked(base, index, scale, mask) => {
                Operand::RegIndexBaseScale(*base, *index, *scale).tokenize(stream);
                stream.push("{", Colors::brackets());
                stream.push(regspec_label(mask), Colors::register());
                stream.push("}", Colors::brackets());
            }
            Operand::RegIndexBaseScaleDispMasked(base, index, scale, disp, mask) => {
                Operand::RegIndexBaseScaleDisp(*base, *index, *scale, *disp).tokenize(stream);
                stream.push("{", Colors::brackets());
                stream.push(regspec_label(mask), Colors::register());
                stream.push("}", Colors::brackets());
            }
            Operand::Nothing => {}
        }
    }
}

/// does this opcode render its immediate operand as `$+rel`?
fn is_relative_branch(opcode: Opcode) -> bool {
    opcode == Opcode::JMP || opcode == Opcode::CALL || opcode.is_jcc()
}

fn tokenize_rel(stream: &mut TokenStream, rel: i64) {
    if rel >= 0 {
        stream.push("$+", Colors::expr());
    } else {
        stream.push("$", Colors::expr());
    }
    stream.push_owned(encode_hex(rel), Colors::immediate());
}

impl ToTokens for Instruction {
    fn tokenize(&self, stream: &mut TokenStream) {
        if self.prefixes.lock() {
            stream.push("lock ", Colors::opcode());
        }

        // only the string ops keep a meaning for rep/repnz here
        if matches!(
            self.opcode,
            Opcode::MOVS | Opcode::CMPS | Opcode::STOS | Opcode::LODS | Opcode::SCAS
        ) {
            if self.prefixes.rep() {
                stream.push("rep ", Colors::opcode());
            } else if self.prefixes.repnz() {
                stream.push("repnz ", Colors::opcode());
            }
        }

        stream.push(self.opcode.name(), Colors::opcode());

        if self.operand_count == 0 {
            return;
        }

        stream.push(" ", Colors::spacing());

        if is_relative_branch(self.opcode) {
            match self.operand(0) {
                Operand::ImmediateI8(rel) => return tokenize_rel(stream, rel as i64),
                Operand::ImmediateI32(rel) => return tokenize_rel(stream, rel as i64),
                _ => {}
            }
        }

        for i in 0..self.operand_count as usize {
            if self.operands[i] == OperandSpec::Nothing {
                return;
            }
            if i > 0 {
                stream.push(", ", Colors::expr());
            }

            let operand = self.operand(i);
            if operand.is_memory() {
                stream.push(MEM_SIZE_STRINGS[self.mem_size as usize - 1], Colors::known());
                stream.push(" ", Colors::spacing());
            }
            if let Some(segment) = self.segment_override_for_op(i) {
                stream.push(segment_label(segment), Colors::segment());
                stream.push(":", Colors::expr());
            }
            operand.tokenize(stream);

            if i == 0 {
                continue;
            }
            // a broadcast load paints the element across the whole vector
            if let Some(evex) = self.prefixes.evex() {
                if evex.broadcast() && operand.is_memory() {
                    let lanes = self
                        .operand(i - 1)
                        .width()
                        .map(|w| w / self.mem_size)
                        .unwrap_or(0);
                    stream.push_owned(format!("{{1to{lanes}}}"), Colors::annotation());
                }
            }
        }
    }
}
