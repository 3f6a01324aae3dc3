//! Decoder for the 64-bit (long) mode of x86.
//!
//! Decoding runs in the same phases the hardware does: legacy prefixes, then
//! at most one of `rex`/`vex`/`evex`, the opcode (possibly behind the
//! `0f`/`0f 38`/`0f 3a` escape maps), then ModRM/SIB, displacement and
//! immediate bytes. Operands are kept as unmaterialized [`OperandSpec`]s
//! inside [`Instruction`] and only resolved to [`Operand`]s on request.

mod display;
mod evex;
mod tests;
mod vex;

pub use crate::MemoryAccessSize;

use decoder::{Decodable, Decoded, Error, ErrorKind, Reader};

/// A register in some bank, e.g. `rbp`, `r13b` or `k3`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct RegSpec {
    num: u8,
    bank: RegisterBank,
}

macro_rules! register {
    ($bank:ident; $($name:ident => $num:expr),+ $(,)?) => {
        $(
            #[inline]
            pub const fn $name() -> RegSpec {
                RegSpec { num: $num, bank: RegisterBank::$bank }
            }
        )+
    };
}

#[rustfmt::skip]
impl RegSpec {
    register!(Q;
        rax => 0, rcx => 1, rdx => 2, rbx => 3, rsp => 4, rbp => 5, rsi => 6, rdi => 7,
        r8 => 8, r9 => 9, r10 => 10, r11 => 11, r12 => 12, r13 => 13, r14 => 14, r15 => 15,
    );
    register!(D;
        eax => 0, ecx => 1, edx => 2, ebx => 3, esp => 4, ebp => 5, esi => 6, edi => 7,
    );
    register!(W; ax => 0, cx => 1, dx => 2, bx => 3);
    register!(B; al => 0, cl => 1, dl => 2, bl => 3, ah => 4, ch => 5, dh => 6, bh => 7);

    /// the instruction pointer.
    pub const fn rip() -> RegSpec {
        RegSpec { num: 0, bank: RegisterBank::RIP }
    }

    /// the flags register.
    pub const fn rflags() -> RegSpec {
        RegSpec { num: 0, bank: RegisterBank::RFlags }
    }

    /// construct a `RegSpec` for mask reg `num`.
    ///
    /// panics if `num` is out of range for a mask register.
    pub fn mask(num: u8) -> RegSpec {
        if num >= 8 {
            panic!("mask reg {} is out of range", num);
        }
        RegSpec { num, bank: RegisterBank::K }
    }

    /// construct a `RegSpec` for xmm reg `num`.
    ///
    /// panics if `num` is out of range for an xmm register.
    pub fn xmm(num: u8) -> RegSpec {
        if num >= 32 {
            panic!("xmm reg {} is out of range", num);
        }
        RegSpec { num, bank: RegisterBank::X }
    }

    /// construct a `RegSpec` for ymm reg `num`.
    ///
    /// panics if `num` is out of range for a ymm register.
    pub fn ymm(num: u8) -> RegSpec {
        if num >= 32 {
            panic!("ymm reg {} is out of range", num);
        }
        RegSpec { num, bank: RegisterBank::Y }
    }

    /// construct a `RegSpec` for zmm reg `num`.
    ///
    /// panics if `num` is out of range for a zmm register.
    pub fn zmm(num: u8) -> RegSpec {
        if num >= 32 {
            panic!("zmm reg {} is out of range", num);
        }
        RegSpec { num, bank: RegisterBank::Z }
    }

    /// construct a `RegSpec` for qword reg `num`.
    ///
    /// panics if `num` is out of range for a qword register.
    pub fn q(num: u8) -> RegSpec {
        if num >= 16 {
            panic!("qword reg {} is out of range", num);
        }
        RegSpec { num, bank: RegisterBank::Q }
    }

    /// construct a `RegSpec` for dword reg `num`.
    ///
    /// panics if `num` is out of range for a dword register.
    pub fn d(num: u8) -> RegSpec {
        if num >= 16 {
            panic!("dword reg {} is out of range", num);
        }
        RegSpec { num, bank: RegisterBank::D }
    }

    /// the number of this register in its class.
    pub fn num(&self) -> u8 {
        self.num
    }

    /// the class of register this register is in.
    pub fn class(&self) -> RegisterClass {
        RegisterClass { kind: self.bank }
    }

    /// the name of this register.
    pub fn name(&self) -> &'static str {
        display::regspec_label(self)
    }

    /// the width of this register, in bytes.
    pub fn width(&self) -> u8 {
        self.class().width()
    }

    #[inline]
    fn from_parts(num: u8, extended: bool, bank: RegisterBank) -> RegSpec {
        RegSpec { num: num + if extended { 0b1000 } else { 0 }, bank }
    }
}

/// Banks are spaced so that `num + (bank << 3)` indexes a flat name table;
/// banks with more than eight registers claim several slots of spacing.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
enum RegisterBank {
    /// `rax` and friends.
    Q = 0,
    /// 32-bit registers.
    D = 2,
    /// 16-bit registers.
    W = 4,
    /// 8-bit registers as encoded without `rex`, `ah`..`bh` included.
    B = 6,
    /// 8-bit registers as encoded under `rex`, `spl`..`dil` and `r8b` up.
    rB = 8,
    /// segment registers.
    S = 10,
    X = 11,
    Y = 15,
    Z = 19,
    /// `avx512` mask registers.
    K = 23,
    RIP = 24,
    RFlags = 25,
}

/// The class of a register: what kind of register it is, and how wide.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct RegisterClass {
    kind: RegisterBank,
}

const REGISTER_CLASS_NAMES: &[&str] = &[
    "qword", "BUG", "dword", "BUG", "word", "BUG", "byte", "BUG", "rex byte", "BUG", "segment",
    "xmm", "BUG", "BUG", "BUG", "ymm", "BUG", "BUG", "BUG", "zmm", "BUG", "BUG", "BUG", "kmask",
    "rip", "rflags",
];

impl RegisterClass {
    /// the name of this register class.
    pub fn name(&self) -> &'static str {
        REGISTER_CLASS_NAMES[self.kind as usize]
    }

    /// the width of registers of this class, in bytes.
    pub fn width(&self) -> u8 {
        match self.kind {
            RegisterBank::Q | RegisterBank::RIP | RegisterBank::RFlags => 8,
            RegisterBank::D => 4,
            RegisterBank::W | RegisterBank::S => 2,
            RegisterBank::B | RegisterBank::rB => 1,
            RegisterBank::X => 16,
            RegisterBank::Y => 32,
            RegisterBank::Z => 64,
            RegisterBank::K => 8,
        }
    }
}

/// Named constants for the well-known register classes.
pub mod register_class {
    use super::{RegisterBank, RegisterClass};

    pub const QWORD: RegisterClass = RegisterClass { kind: RegisterBank::Q };
    pub const DWORD: RegisterClass = RegisterClass { kind: RegisterBank::D };
    pub const WORD: RegisterClass = RegisterClass { kind: RegisterBank::W };
    pub const BYTE: RegisterClass = RegisterClass { kind: RegisterBank::B };
    pub const REX_BYTE: RegisterClass = RegisterClass { kind: RegisterBank::rB };
    pub const SEGMENT: RegisterClass = RegisterClass { kind: RegisterBank::S };
    pub const XMM: RegisterClass = RegisterClass { kind: RegisterBank::X };
    pub const YMM: RegisterClass = RegisterClass { kind: RegisterBank::Y };
    pub const ZMM: RegisterClass = RegisterClass { kind: RegisterBank::Z };
    pub const MASK: RegisterClass = RegisterClass { kind: RegisterBank::K };
    pub const RIP: RegisterClass = RegisterClass { kind: RegisterBank::RIP };
    pub const RFLAGS: RegisterClass = RegisterClass { kind: RegisterBank::RFlags };
}

/// A segment register. In long mode only `fs` and `gs` overrides change an
/// address computation; the rest are recorded for rendering only.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Segment {
    DS = 0,
    CS,
    ES,
    FS,
    GS,
    SS,
}

/// How an `avx512` masked write handles lanes the mask disables: leave them
/// as they were, or zero them.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MergeMode {
    Merge,
    Zero,
}

impl From<bool> for MergeMode {
    fn from(zero: bool) -> Self {
        if zero {
            MergeMode::Zero
        } else {
            MergeMode::Merge
        }
    }
}

/// An `avx512` embedded rounding mode.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SaeMode {
    RoundNearest,
    RoundDown,
    RoundUp,
    RoundZero,
}

const SAE_MODES: [SaeMode; 4] = [
    SaeMode::RoundNearest,
    SaeMode::RoundDown,
    SaeMode::RoundUp,
    SaeMode::RoundZero,
];

impl SaeMode {
    /// a human-friendly label for this `SaeMode`:
    ///
    /// `{rne-sae}`, `{rd-sae}`, `{ru-sae}` or `{rz-sae}`
    pub fn label(&self) -> &'static str {
        match self {
            SaeMode::RoundNearest => "{rne-sae}",
            SaeMode::RoundDown => "{rd-sae}",
            SaeMode::RoundUp => "{ru-sae}",
            SaeMode::RoundZero => "{rz-sae}",
        }
    }

    fn from(lp: u8) -> Self {
        SAE_MODES[(lp & 3) as usize]
    }
}

/// An operand of an [`Instruction`], materialized out of its [`OperandSpec`]
/// and register/displacement/immediate fields.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Operand {
    ImmediateI8(i8),
    ImmediateU8(u8),
    ImmediateI16(i16),
    ImmediateU16(u16),
    ImmediateI32(i32),
    ImmediateU32(u32),
    ImmediateI64(i64),
    ImmediateU64(u64),
    Register(RegSpec),
    /// an `avx512` register operand with a mask and merge mode, as in
    /// `vaddps zmm1{k3}{z}, ...`.
    RegisterMaskMerge(RegSpec, RegSpec, MergeMode),
    /// an `avx512` register operand that additionally carries an embedded
    /// rounding mode, as in `vaddps zmm1{k3}, zmm2, zmm3{rne-sae}`.
    RegisterMaskMergeSae(RegSpec, RegSpec, MergeMode, SaeMode),
    /// an `avx512` register operand under exception suppression without a
    /// rounding override, as in `vmaxps zmm1{k3}, zmm2, zmm3{sae}`.
    RegisterMaskMergeSaeNoround(RegSpec, RegSpec, MergeMode),
    /// an absolute `[0x...]` address, 32 bits wide.
    DisplacementU32(u32),
    /// an absolute `[0x...]` address, 64 bits wide.
    DisplacementU64(u64),
    RegDeref(RegSpec),
    RegDisp(RegSpec, i32),
    RegScale(RegSpec, u8),
    RegScaleDisp(RegSpec, u8, i32),
    RegIndexBaseScale(RegSpec, RegSpec, u8),
    RegIndexBaseScaleDisp(RegSpec, RegSpec, u8, i32),
    RegDerefMasked(RegSpec, RegSpec),
    RegDispMasked(RegSpec, i32, RegSpec),
    RegScaleMasked(RegSpec, u8, RegSpec),
    RegScaleDispMasked(RegSpec, u8, i32, RegSpec),
    RegIndexBaseScaleMasked(RegSpec, RegSpec, u8, RegSpec),
    RegIndexBaseScaleDispMasked(RegSpec, RegSpec, u8, i32, RegSpec),
    Nothing,
}

impl Operand {
    fn from_spec(inst: &Instruction, spec: OperandSpec) -> Operand {
        let mask = || RegSpec::mask(inst.prefixes.evex_data.mask_reg());
        let merge = || MergeMode::from(inst.prefixes.evex_data.zeroing());
        match spec {
            OperandSpec::Nothing => Operand::Nothing,
            OperandSpec::RegRRR => Operand::Register(inst.regs[0]),
            OperandSpec::RegRRR_maskmerge => {
                Operand::RegisterMaskMerge(inst.regs[0], mask(), merge())
            }
            OperandSpec::RegRRR_maskmerge_sae => Operand::RegisterMaskMergeSae(
                inst.regs[0],
                mask(),
                merge(),
                SaeMode::from(inst.prefixes.evex_data.lp()),
            ),
            OperandSpec::RegRRR_maskmerge_sae_noround => {
                Operand::RegisterMaskMergeSaeNoround(inst.regs[0], mask(), merge())
            }
            OperandSpec::RegMMM => Operand::Register(inst.regs[1]),
            OperandSpec::RegMMM_maskmerge => {
                Operand::RegisterMaskMerge(inst.regs[1], mask(), merge())
            }
            OperandSpec::RegVex => Operand::Register(inst.regs[3]),
            OperandSpec::RegVex_maskmerge => {
                Operand::RegisterMaskMerge(inst.regs[3], mask(), merge())
            }
            OperandSpec::RegCl => Operand::Register(RegSpec::cl()),
            OperandSpec::ImmI8 => Operand::ImmediateI8(inst.imm as i8),
            OperandSpec::ImmI16 => Operand::ImmediateI16(inst.imm as i16),
            OperandSpec::ImmI32 => Operand::ImmediateI32(inst.imm as i32),
            OperandSpec::ImmI64 => Operand::ImmediateI64(inst.imm as i64),
            OperandSpec::ImmU8 => Operand::ImmediateU8(inst.imm as u8),
            OperandSpec::ImmU16 => Operand::ImmediateU16(inst.imm as u16),
            OperandSpec::ImmU32 => Operand::ImmediateU32(inst.imm as u32),
            OperandSpec::ImmU64 => Operand::ImmediateU64(inst.imm),
            OperandSpec::ImmInDispField => Operand::ImmediateU16(inst.disp as u16),
            OperandSpec::DispU32 => Operand::DisplacementU32(inst.disp as u32),
            OperandSpec::DispU64 => Operand::DisplacementU64(inst.disp),
            OperandSpec::Deref => Operand::RegDeref(inst.regs[1]),
            OperandSpec::Deref_rsi => Operand::RegDeref(RegSpec::rsi()),
            OperandSpec::Deref_rdi => Operand::RegDeref(RegSpec::rdi()),
            OperandSpec::RegDisp => Operand::RegDisp(inst.regs[1], inst.disp as i32),
            OperandSpec::RegScale => Operand::RegScale(inst.regs[2], inst.scale),
            OperandSpec::RegScaleDisp => {
                Operand::RegScaleDisp(inst.regs[2], inst.scale, inst.disp as i32)
            }
            OperandSpec::RegIndexBaseScale => {
                Operand::RegIndexBaseScale(inst.regs[1], inst.regs[2], inst.scale)
            }
            OperandSpec::RegIndexBaseScaleDisp => Operand::RegIndexBaseScaleDisp(
                inst.regs[1],
                inst.regs[2],
                inst.scale,
                inst.disp as i32,
            ),
            OperandSpec::Deref_mask => Operand::RegDerefMasked(inst.regs[1], mask()),
            OperandSpec::RegDisp_mask => {
                Operand::RegDispMasked(inst.regs[1], inst.disp as i32, mask())
            }
            OperandSpec::RegScale_mask => Operand::RegScaleMasked(inst.regs[2], inst.scale, mask()),
            OperandSpec::RegScaleDisp_mask => {
                Operand::RegScaleDispMasked(inst.regs[2], inst.scale, inst.disp as i32, mask())
            }
            OperandSpec::RegIndexBaseScale_mask => {
                Operand::RegIndexBaseScaleMasked(inst.regs[1], inst.regs[2], inst.scale, mask())
            }
            OperandSpec::RegIndexBaseScaleDisp_mask => Operand::RegIndexBaseScaleDispMasked(
                inst.regs[1],
                inst.regs[2],
                inst.scale,
                inst.disp as i32,
                mask(),
            ),
        }
    }

    /// is this operand a memory access?
    pub fn is_memory(&self) -> bool {
        matches!(
            self,
            Operand::DisplacementU32(_)
                | Operand::DisplacementU64(_)
                | Operand::RegDeref(_)
                | Operand::RegDisp(_, _)
                | Operand::RegScale(_, _)
                | Operand::RegScaleDisp(_, _, _)
                | Operand::RegIndexBaseScale(_, _, _)
                | Operand::RegIndexBaseScaleDisp(_, _, _, _)
                | Operand::RegDerefMasked(_, _)
                | Operand::RegDispMasked(_, _, _)
                | Operand::RegScaleMasked(_, _, _)
                | Operand::RegScaleDispMasked(_, _, _, _)
                | Operand::RegIndexBaseScaleMasked(_, _, _, _)
                | Operand::RegIndexBaseScaleDispMasked(_, _, _, _, _)
        )
    }

    /// the width of this operand, in bytes, or `None` for a memory operand
    /// whose width is the instruction's to define.
    pub fn width(&self) -> Option<u8> {
        match self {
            Operand::Register(reg) => Some(reg.width()),
            Operand::RegisterMaskMerge(reg, _, _)
            | Operand::RegisterMaskMergeSae(reg, _, _, _)
            | Operand::RegisterMaskMergeSaeNoround(reg, _, _) => Some(reg.width()),
            Operand::ImmediateI8(_) | Operand::ImmediateU8(_) => Some(1),
            Operand::ImmediateI16(_) | Operand::ImmediateU16(_) => Some(2),
            Operand::ImmediateI32(_) | Operand::ImmediateU32(_) => Some(4),
            Operand::ImmediateI64(_) | Operand::ImmediateU64(_) => Some(8),
            Operand::Nothing => None,
            _ => None,
        }
    }
}

#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum OperandSpec {
    Nothing,
    /// the register in modrm.rrr.
    RegRRR,
    /// modrm.rrr, masked by the evex `aaa` register.
    RegRRR_maskmerge,
    /// modrm.rrr, masked, with an embedded rounding mode.
    RegRRR_maskmerge_sae,
    /// modrm.rrr, masked, exceptions suppressed, no rounding override.
    RegRRR_maskmerge_sae_noround,
    /// the register in modrm.mmm, only when modrm.mod == 0b11.
    RegMMM,
    RegMMM_maskmerge,
    /// the register named by vex/evex.vvvv.
    RegVex,
    RegVex_maskmerge,
    /// the `cl` register, implied by shifts like `shld eax, ebx, cl`.
    RegCl,
    ImmI8,
    ImmI16,
    ImmI32,
    ImmI64,
    ImmU8,
    ImmU16,
    ImmU32,
    ImmU64,
    /// a `u16` immediate carried in the displacement field because `enter`
    /// already uses the immediate field for its second operand.
    ImmInDispField,
    DispU32,
    DispU64,
    Deref,
    Deref_rsi,
    Deref_rdi,
    RegDisp,
    RegScale,
    RegScaleDisp,
    RegIndexBaseScale,
    RegIndexBaseScaleDisp,
    Deref_mask,
    RegDisp_mask,
    RegScale_mask,
    RegScaleDisp_mask,
    RegIndexBaseScale_mask,
    RegIndexBaseScaleDisp_mask,
}

impl OperandSpec {
    fn is_memory(&self) -> bool {
        matches!(
            self,
            OperandSpec::DispU32
                | OperandSpec::DispU64
                | OperandSpec::Deref
                | OperandSpec::Deref_rsi
                | OperandSpec::Deref_rdi
                | OperandSpec::RegDisp
                | OperandSpec::RegScale
                | OperandSpec::RegScaleDisp
                | OperandSpec::RegIndexBaseScale
                | OperandSpec::RegIndexBaseScaleDisp
                | OperandSpec::Deref_mask
                | OperandSpec::RegDisp_mask
                | OperandSpec::RegScale_mask
                | OperandSpec::RegScaleDisp_mask
                | OperandSpec::RegIndexBaseScale_mask
                | OperandSpec::RegIndexBaseScaleDisp_mask
        )
    }

    /// the same operand, under the evex `aaa` mask.
    fn masked(&self) -> Self {
        match self {
            OperandSpec::RegRRR => OperandSpec::RegRRR_maskmerge,
            OperandSpec::RegMMM => OperandSpec::RegMMM_maskmerge,
            OperandSpec::RegVex => OperandSpec::RegVex_maskmerge,
            OperandSpec::Deref => OperandSpec::Deref_mask,
            OperandSpec::RegDisp => OperandSpec::RegDisp_mask,
            OperandSpec::RegScale => OperandSpec::RegScale_mask,
            OperandSpec::RegScaleDisp => OperandSpec::RegScaleDisp_mask,
            OperandSpec::RegIndexBaseScale => OperandSpec::RegIndexBaseScale_mask,
            OperandSpec::RegIndexBaseScaleDisp => OperandSpec::RegIndexBaseScaleDisp_mask,
            other => *other,
        }
    }
}

/// A condition tested by a `jcc`, `cmovcc` or `setcc`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConditionCode {
    O,
    NO,
    B,
    AE,
    Z,
    NZ,
    BE,
    A,
    S,
    NS,
    P,
    NP,
    L,
    GE,
    LE,
    G,
}

const CONDITIONS: [ConditionCode; 16] = [
    ConditionCode::O,
    ConditionCode::NO,
    ConditionCode::B,
    ConditionCode::AE,
    ConditionCode::Z,
    ConditionCode::NZ,
    ConditionCode::BE,
    ConditionCode::A,
    ConditionCode::S,
    ConditionCode::NS,
    ConditionCode::P,
    ConditionCode::NP,
    ConditionCode::L,
    ConditionCode::GE,
    ConditionCode::LE,
    ConditionCode::G,
];

/// An instruction's mnemonic. The conditional families are laid out in
/// condition-code order so [`Opcode::condition`] can index into them.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(u16)]
pub enum Opcode {
    Invalid,
    ADD,
    OR,
    ADC,
    SBB,
    AND,
    SUB,
    XOR,
    CMP,
    PUSH,
    POP,
    MOVSXD,
    IMUL,
    TEST,
    XCHG,
    MOV,
    LEA,
    NOP,
    PAUSE,
    CBW,
    CWDE,
    CDQE,
    CWD,
    CDQ,
    CQO,
    PUSHF,
    POPF,
    MOVS,
    CMPS,
    STOS,
    LODS,
    SCAS,
    RETURN,
    ENTER,
    LEAVE,
    INT,
    INT3,
    CALL,
    JMP,
    HLT,
    CMC,
    CLC,
    STC,
    CLI,
    STI,
    CLD,
    STD,
    INC,
    DEC,
    NOT,
    NEG,
    MUL,
    DIV,
    IDIV,
    ROL,
    ROR,
    RCL,
    RCR,
    SHL,
    SHR,
    SAL,
    SAR,
    JO,
    JNO,
    JB,
    JNB,
    JZ,
    JNZ,
    JNA,
    JA,
    JS,
    JNS,
    JP,
    JNP,
    JL,
    JGE,
    JLE,
    JG,
    CMOVO,
    CMOVNO,
    CMOVB,
    CMOVNB,
    CMOVZ,
    CMOVNZ,
    CMOVNA,
    CMOVA,
    CMOVS,
    CMOVNS,
    CMOVP,
    CMOVNP,
    CMOVL,
    CMOVGE,
    CMOVLE,
    CMOVG,
    SETO,
    SETNO,
    SETB,
    SETAE,
    SETZ,
    SETNZ,
    SETBE,
    SETA,
    SETS,
    SETNS,
    SETP,
    SETNP,
    SETL,
    SETGE,
    SETLE,
    SETG,
    SYSCALL,
    UD2,
    RDTSC,
    CPUID,
    BT,
    BTS,
    BTR,
    BTC,
    SHLD,
    SHRD,
    CMPXCHG,
    MOVZX,
    MOVSX,
    BSF,
    BSR,
    TZCNT,
    LZCNT,
    BSWAP,
    MOVUPS,
    MOVUPD,
    MOVSS,
    MOVSD,
    MOVAPS,
    MOVAPD,
    UCOMISS,
    UCOMISD,
    COMISS,
    COMISD,
    SQRTPS,
    SQRTPD,
    SQRTSS,
    SQRTSD,
    ANDPS,
    ANDPD,
    ANDNPS,
    ANDNPD,
    ORPS,
    ORPD,
    XORPS,
    XORPD,
    ADDPS,
    ADDPD,
    ADDSS,
    ADDSD,
    MULPS,
    MULPD,
    MULSS,
    MULSD,
    SUBPS,
    SUBPD,
    SUBSS,
    SUBSD,
    MINPS,
    MINPD,
    MINSS,
    MINSD,
    DIVPS,
    DIVPD,
    DIVSS,
    DIVSD,
    MAXPS,
    MAXPD,
    MAXSS,
    MAXSD,
    CMPPS,
    CMPPD,
    CMPSS,
    CMPSD,
    MOVD,
    MOVQ,
    MOVDQA,
    MOVDQU,
    PSHUFD,
    PSHUFHW,
    PSHUFLW,
    PCMPEQB,
    PCMPEQW,
    PCMPEQD,
    PADDB,
    PADDW,
    PADDD,
    PADDQ,
    PSUBB,
    PSUBW,
    PSUBD,
    PSUBQ,
    PAND,
    PANDN,
    POR,
    PXOR,
    PSHUFB,
    PTEST,
    PABSB,
    PABSW,
    PABSD,
    PMULLD,
    ROUNDPS,
    ROUNDPD,
    ROUNDSS,
    ROUNDSD,
    PALIGNR,
    VMOVUPS,
    VMOVUPD,
    VMOVSS,
    VMOVSD,
    VMOVAPS,
    VMOVAPD,
    VMOVDQA,
    VMOVDQU,
    VUCOMISS,
    VUCOMISD,
    VCOMISS,
    VCOMISD,
    VSQRTPS,
    VSQRTPD,
    VSQRTSS,
    VSQRTSD,
    VANDPS,
    VANDPD,
    VANDNPS,
    VANDNPD,
    VORPS,
    VORPD,
    VXORPS,
    VXORPD,
    VADDPS,
    VADDPD,
    VADDSS,
    VADDSD,
    VMULPS,
    VMULPD,
    VMULSS,
    VMULSD,
    VSUBPS,
    VSUBPD,
    VSUBSS,
    VSUBSD,
    VMINPS,
    VMINPD,
    VMINSS,
    VMINSD,
    VDIVPS,
    VDIVPD,
    VDIVSS,
    VDIVSD,
    VMAXPS,
    VMAXPD,
    VMAXSS,
    VMAXSD,
    VCMPPS,
    VCMPPD,
    VCMPSS,
    VCMPSD,
    VMOVD,
    VMOVQ,
    VPSHUFD,
    VPCMPEQB,
    VPCMPEQW,
    VPCMPEQD,
    VPADDB,
    VPADDW,
    VPADDD,
    VPADDQ,
    VPSUBB,
    VPSUBW,
    VPSUBD,
    VPSUBQ,
    VPAND,
    VPANDN,
    VPOR,
    VPXOR,
    VPSHUFB,
    VPTEST,
    VPMULLD,
    VBROADCASTSS,
    VBROADCASTSD,
    VPBROADCASTD,
    VPBROADCASTQ,
    VINSERTF128,
    VEXTRACTF128,
    VZEROUPPER,
    VZEROALL,
    VROUNDPS,
    VROUNDPD,
    VROUNDSS,
    VROUNDSD,
    VPALIGNR,
    ANDN,
    BEXTR,
    BLSI,
    BLSMSK,
    BLSR,
    BZHI,
    PEXT,
    PDEP,
    MULX,
    RORX,
    SARX,
    SHLX,
    SHRX,
    VMOVDQA32,
    VMOVDQA64,
    VMOVDQU8,
    VMOVDQU16,
    VMOVDQU32,
    VMOVDQU64,
    VPANDD,
    VPANDQ,
    VPORD,
    VPORQ,
    VPXORD,
    VPXORQ,
    VPMULLQ,
    VALIGND,
    VALIGNQ,
    VCOMPRESSPS,
    VCOMPRESSPD,
    VEXPANDPS,
    VEXPANDPD,
}

impl Opcode {
    /// is this one of the 16 conditional jumps?
    pub fn is_jcc(&self) -> bool {
        let n = *self as u16;
        n >= Opcode::JO as u16 && n <= Opcode::JG as u16
    }

    /// is this one of the 16 conditional moves?
    pub fn is_cmovcc(&self) -> bool {
        let n = *self as u16;
        n >= Opcode::CMOVO as u16 && n <= Opcode::CMOVG as u16
    }

    /// is this one of the 16 conditional set-byte ops?
    pub fn is_setcc(&self) -> bool {
        let n = *self as u16;
        n >= Opcode::SETO as u16 && n <= Opcode::SETG as u16
    }

    /// the condition this mnemonic tests, if it is conditional.
    pub fn condition(&self) -> Option<ConditionCode> {
        let n = *self as u16;
        if self.is_jcc() {
            Some(CONDITIONS[(n - Opcode::JO as u16) as usize])
        } else if self.is_cmovcc() {
            Some(CONDITIONS[(n - Opcode::CMOVO as u16) as usize])
        } else if self.is_setcc() {
            Some(CONDITIONS[(n - Opcode::SETO as u16) as usize])
        } else {
            None
        }
    }
}

/// A decoded x86-64 instruction.
///
/// Operands stay in their encoded [`OperandSpec`] form; [`Instruction::operand`]
/// materializes them against the register/displacement/immediate fields.
#[derive(Debug, Clone, Copy)]
pub struct Instruction {
    pub prefixes: Prefixes,
    /// rrr, mmm, sib index and vvvv registers, in that order.
    regs: [RegSpec; 4],
    scale: u8,
    length: u8,
    operand_count: u8,
    operands: [OperandSpec; 4],
    imm: u64,
    disp: u64,
    opcode: Opcode,
    mem_size: u8,
}

impl PartialEq for Instruction {
    fn eq(&self, other: &Self) -> bool {
        if self.prefixes != other.prefixes
            || self.opcode != other.opcode
            || self.length != other.length
            || self.operand_count != other.operand_count
            || self.mem_size != other.mem_size
        {
            return false;
        }

        for i in 0..self.operand_count as usize {
            if self.operand(i) != other.operand(i) {
                return false;
            }
        }

        true
    }
}

impl Instruction {
    fn invalid() -> Instruction {
        Instruction {
            prefixes: Prefixes::new(),
            regs: [RegSpec::rax(); 4],
            scale: 0,
            length: 0,
            operand_count: 0,
            operands: [OperandSpec::Nothing; 4],
            imm: 0,
            disp: 0,
            opcode: Opcode::Invalid,
            mem_size: 0,
        }
    }

    /// the mnemonic of this instruction.
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// the operand at index `i`.
    ///
    /// panics if `i >= 4`.
    pub fn operand(&self, i: usize) -> Operand {
        Operand::from_spec(self, self.operands[i])
    }

    /// how many operands this instruction has.
    pub fn operand_count(&self) -> usize {
        self.operand_count as usize
    }

    /// does operand `i` exist and name anything?
    pub fn operand_present(&self, i: usize) -> bool {
        i < self.operand_count as usize && self.operands[i] != OperandSpec::Nothing
    }

    /// the width of memory this instruction accesses, if it accesses any.
    pub fn mem_size(&self) -> Option<MemoryAccessSize> {
        if self.mem_size != 0 {
            Some(MemoryAccessSize { size: self.mem_size })
        } else {
            None
        }
    }

    /// the segment operand `i` is relative to, where one would be shown.
    ///
    /// string ops address their implicit operands through `es`/`ds`; for
    /// explicit memory operands only an `fs`/`gs` override means anything in
    /// long mode.
    pub fn segment_override_for_op(&self, i: usize) -> Option<Segment> {
        match self.operands[i] {
            OperandSpec::Deref_rdi => Some(Segment::ES),
            OperandSpec::Deref_rsi => Some(Segment::DS),
            other => {
                if !other.is_memory() {
                    return None;
                }
                match self.prefixes.segment {
                    Segment::FS => Some(Segment::FS),
                    Segment::GS => Some(Segment::GS),
                    _ => None,
                }
            }
        }
    }
}

impl Decoded for Instruction {
    fn width(&self) -> usize {
        self.length as usize
    }

    fn is_call(&self) -> bool {
        self.opcode == Opcode::CALL
    }

    fn is_ret(&self) -> bool {
        self.opcode == Opcode::RETURN
    }

    fn is_jump(&self) -> bool {
        self.opcode == Opcode::JMP || self.opcode.is_jcc()
    }
}

/// The legacy/`rex` prefixes decoded off the front of an instruction. The
/// `rex` store doubles as a synthetic `rex` when a `vex` or `evex` prefix
/// supplied the `w/r/x/b` bits instead.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Prefixes {
    bits: u8,
    rex: PrefixRex,
    segment: Segment,
    evex_data: EvexData,
}

impl Prefixes {
    fn new() -> Prefixes {
        Prefixes {
            bits: 0,
            rex: PrefixRex { bits: 0 },
            segment: Segment::DS,
            evex_data: EvexData { bits: 0 },
        }
    }

    #[inline]
    pub fn rep(&self) -> bool {
        self.bits & 0x30 == 0x10
    }

    #[inline]
    fn set_rep(&mut self) {
        self.bits = (self.bits & 0xcf) | 0x10;
    }

    #[inline]
    pub fn repnz(&self) -> bool {
        self.bits & 0x30 == 0x30
    }

    #[inline]
    fn set_repnz(&mut self) {
        self.bits |= 0x30;
    }

    #[inline]
    pub fn lock(&self) -> bool {
        self.bits & 0x4 == 0x4
    }

    #[inline]
    fn set_lock(&mut self) {
        self.bits |= 0x4;
    }

    #[inline]
    pub fn operand_size(&self) -> bool {
        self.bits & 0x1 == 0x1
    }

    #[inline]
    fn set_operand_size(&mut self) {
        self.bits |= 0x1;
    }

    #[inline]
    pub fn address_size(&self) -> bool {
        self.bits & 0x2 == 0x2
    }

    #[inline]
    fn set_address_size(&mut self) {
        self.bits |= 0x2;
    }

    #[inline]
    pub fn segment(&self) -> Segment {
        self.segment
    }

    #[inline]
    fn set_segment(&mut self, segment: Segment) {
        self.segment = segment;
    }

    #[inline]
    pub fn rex(&self) -> &PrefixRex {
        &self.rex
    }

    /// record a raw `rex` byte, or forget one by recording 0.
    #[inline]
    fn rex_from(&mut self, byte: u8) {
        self.rex.bits = byte;
    }

    /// the `vex` view of the synthetic prefix store. meaningful only when
    /// [`PrefixVex::present`] reports a `vex` or `evex` prefix was decoded.
    #[inline]
    pub fn vex(&self) -> PrefixVex {
        PrefixVex { bits: self.rex.bits }
    }

    /// the `evex` prefix, if one was decoded.
    #[inline]
    pub fn evex(&self) -> Option<PrefixEvex> {
        if self.evex_data.present() {
            Some(PrefixEvex { vex: self.vex(), evex_data: self.evex_data })
        } else {
            None
        }
    }

    /// fold a two-byte (`c5`) vex payload into the prefix store.
    #[inline]
    fn vex_from_c5(&mut self, p: u8) {
        let mut bits = 0x80;
        if p & 0x80 == 0 {
            bits |= 0x04;
        }
        if p & 0x04 != 0 {
            bits |= 0x10;
        }
        self.rex.bits = bits;
    }

    /// fold a three-byte (`c4`) vex payload into the prefix store.
    #[inline]
    fn vex_from_c4(&mut self, p1: u8, p2: u8) {
        let mut bits = 0x80;
        if p1 & 0x80 == 0 {
            bits |= 0x04;
        }
        if p1 & 0x40 == 0 {
            bits |= 0x02;
        }
        if p1 & 0x20 == 0 {
            bits |= 0x01;
        }
        if p2 & 0x80 != 0 {
            bits |= 0x08;
        }
        if p2 & 0x04 != 0 {
            bits |= 0x10;
        }
        self.rex.bits = bits;
    }

    /// fold an `evex` payload into the prefix store. `r'`/`v'` never reach
    /// here; the evex reader resolves registers 16..31 itself.
    #[inline]
    fn evex_from(&mut self, p0: u8, p1: u8, p2: u8) {
        let mut bits = 0x80;
        if p0 & 0x80 == 0 {
            bits |= 0x04;
        }
        if p0 & 0x40 == 0 {
            bits |= 0x02;
        }
        if p0 & 0x20 == 0 {
            bits |= 0x01;
        }
        if p1 & 0x80 != 0 {
            bits |= 0x08;
        }
        self.rex.bits = bits;
        self.evex_data.from(p2);
    }

    /// was the last displacement a compressed (`disp8*N`) one?
    #[inline]
    fn compressed_disp(&self) -> bool {
        self.rex.bits & 0x20 == 0x20
    }

    #[inline]
    fn apply_compressed_disp(&mut self, state: bool) {
        if state {
            self.rex.bits |= 0x20;
        } else {
            self.rex.bits &= !0x20;
        }
    }
}

/// A `rex` prefix: operand width and register extension bits.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PrefixRex {
    bits: u8,
}

impl PrefixRex {
    #[inline]
    pub fn present(&self) -> bool {
        (self.bits & 0xc0) == 0x40
    }

    #[inline]
    pub fn b(&self) -> bool {
        self.bits & 0x01 == 0x01
    }

    #[inline]
    pub fn x(&self) -> bool {
        self.bits & 0x02 == 0x02
    }

    #[inline]
    pub fn r(&self) -> bool {
        self.bits & 0x04 == 0x04
    }

    #[inline]
    pub fn w(&self) -> bool {
        self.bits & 0x08 == 0x08
    }
}

/// The `w/r/x/b/l` bits a `vex` or `evex` prefix supplied.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PrefixVex {
    bits: u8,
}

impl PrefixVex {
    #[inline]
    pub fn present(&self) -> bool {
        self.bits & 0x80 == 0x80
    }

    #[inline]
    pub fn b(&self) -> bool {
        self.bits & 0x01 == 0x01
    }

    #[inline]
    pub fn x(&self) -> bool {
        self.bits & 0x02 == 0x02
    }

    #[inline]
    pub fn r(&self) -> bool {
        self.bits & 0x04 == 0x04
    }

    #[inline]
    pub fn w(&self) -> bool {
        self.bits & 0x08 == 0x08
    }

    #[inline]
    pub fn l(&self) -> bool {
        self.bits & 0x10 == 0x10
    }
}

/// The `evex`-only decode state: mask selector, broadcast/rounding bit,
/// zeroing bit and the `l'l` pair.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct EvexData {
    // aaa in 0..3, b at 3, z at 4, l at 5, l' at 6, present at 7.
    bits: u8,
}

impl EvexData {
    #[inline]
    fn from(&mut self, p2: u8) {
        let mut bits = 0x80;
        bits |= p2 & 0b111;
        bits |= (p2 & 0x10) >> 1;
        bits |= (p2 & 0x80) >> 3;
        bits |= p2 & 0x60;
        self.bits = bits;
    }

    #[inline]
    pub fn present(&self) -> bool {
        self.bits & 0x80 == 0x80
    }

    #[inline]
    pub fn mask_reg(&self) -> u8 {
        self.bits & 0b111
    }

    #[inline]
    pub fn broadcast(&self) -> bool {
        self.bits & 0b1000 != 0
    }

    #[inline]
    pub fn zeroing(&self) -> bool {
        self.bits & 0b1_0000 != 0
    }

    /// the `l'l` pair; vector length, or the rounding mode under `er`.
    #[inline]
    pub fn lp(&self) -> u8 {
        (self.bits >> 5) & 0b11
    }
}

/// An `evex` prefix in full: the synthetic `vex` bits plus the `evex`-only
/// state.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct PrefixEvex {
    vex: PrefixVex,
    evex_data: EvexData,
}

impl PrefixEvex {
    pub fn vex(&self) -> &PrefixVex {
        &self.vex
    }

    pub fn mask_reg(&self) -> u8 {
        self.evex_data.mask_reg()
    }

    pub fn broadcast(&self) -> bool {
        self.evex_data.broadcast()
    }

    /// the zeroing bit; disabled lanes are zeroed rather than merged.
    pub fn merge(&self) -> bool {
        self.evex_data.zeroing()
    }

    pub fn lp(&self) -> u8 {
        self.evex_data.lp()
    }
}

/// An x86-64 decoder: which extensions it accepts, and how to decode bytes
/// under them.
///
/// [`Decoder::default`] takes every extension this crate knows; a decoder
/// built up from [`Decoder::minimal`] rejects (or downgrades, for `tzcnt`/
/// `lzcnt`) what it wasn't granted.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Decoder {
    flags: u64,
}

const FLAG_SSSE3: u64 = 1 << 0;
const FLAG_SSE4_1: u64 = 1 << 1;
const FLAG_AVX: u64 = 1 << 2;
const FLAG_AVX2: u64 = 1 << 3;
const FLAG_BMI1: u64 = 1 << 4;
const FLAG_BMI2: u64 = 1 << 5;
const FLAG_LZCNT: u64 = 1 << 6;
const FLAG_AVX512_F: u64 = 1 << 7;
const FLAG_AVX512_DQ: u64 = 1 << 8;
const FLAG_AVX512_BW: u64 = 1 << 9;
const FLAG_AVX512_VL: u64 = 1 << 10;

impl Default for Decoder {
    fn default() -> Self {
        Decoder { flags: u64::MAX }
    }
}

impl Decoder {
    /// a decoder that rejects every extension-gated instruction.
    pub fn minimal() -> Self {
        Decoder { flags: 0 }
    }

    pub fn with_ssse3(mut self) -> Self {
        self.flags |= FLAG_SSSE3;
        self
    }

    pub fn with_sse4_1(mut self) -> Self {
        self.flags |= FLAG_SSE4_1;
        self
    }

    pub fn with_avx(mut self) -> Self {
        self.flags |= FLAG_AVX;
        self
    }

    pub fn with_avx2(mut self) -> Self {
        self.flags |= FLAG_AVX2;
        self
    }

    pub fn with_bmi1(mut self) -> Self {
        self.flags |= FLAG_BMI1;
        self
    }

    pub fn with_bmi2(mut self) -> Self {
        self.flags |= FLAG_BMI2;
        self
    }

    pub fn with_lzcnt(mut self) -> Self {
        self.flags |= FLAG_LZCNT;
        self
    }

    pub fn with_avx512_f(mut self) -> Self {
        self.flags |= FLAG_AVX512_F;
        self
    }

    pub fn with_avx512_dq(mut self) -> Self {
        self.flags |= FLAG_AVX512_DQ;
        self
    }

    pub fn with_avx512_bw(mut self) -> Self {
        self.flags |= FLAG_AVX512_BW;
        self
    }

    pub fn with_avx512_vl(mut self) -> Self {
        self.flags |= FLAG_AVX512_VL;
        self
    }

    fn ssse3(&self) -> bool {
        self.flags & FLAG_SSSE3 != 0
    }

    fn sse4_1(&self) -> bool {
        self.flags & FLAG_SSE4_1 != 0
    }

    fn avx(&self) -> bool {
        self.flags & FLAG_AVX != 0
    }

    fn avx2(&self) -> bool {
        self.flags & FLAG_AVX2 != 0
    }

    fn bmi1(&self) -> bool {
        self.flags & FLAG_BMI1 != 0
    }

    fn bmi2(&self) -> bool {
        self.flags & FLAG_BMI2 != 0
    }

    fn lzcnt(&self) -> bool {
        self.flags & FLAG_LZCNT != 0
    }

    fn avx512_f(&self) -> bool {
        self.flags & FLAG_AVX512_F != 0
    }

    fn avx512_dq(&self) -> bool {
        self.flags & FLAG_AVX512_DQ != 0
    }

    fn avx512_bw(&self) -> bool {
        self.flags & FLAG_AVX512_BW != 0
    }

    fn avx512_vl(&self) -> bool {
        self.flags & FLAG_AVX512_VL != 0
    }

    /// decode one instruction off the front of `data`.
    pub fn decode_slice(&self, data: &[u8]) -> Result<Instruction, Error> {
        let mut reader = Reader::new(data);
        self.decode(&mut reader)
    }

    /// reject (or downgrade) an already-decoded instruction the granted
    /// extensions don't cover.
    fn revise_instruction(&self, instr: &mut Instruction) -> Result<(), ErrorKind> {
        if instr.prefixes.evex().is_some() {
            if !self.avx512_f() {
                return Err(ErrorKind::InvalidOpcode);
            }
            match instr.opcode {
                Opcode::VMOVDQU8 | Opcode::VMOVDQU16 => {
                    if !self.avx512_bw() {
                        return Err(ErrorKind::InvalidOpcode);
                    }
                }
                Opcode::VANDPS
                | Opcode::VANDPD
                | Opcode::VANDNPS
                | Opcode::VANDNPD
                | Opcode::VORPS
                | Opcode::VORPD
                | Opcode::VXORPS
                | Opcode::VXORPD
                | Opcode::VPMULLQ => {
                    if !self.avx512_dq() {
                        return Err(ErrorKind::InvalidOpcode);
                    }
                }
                _ => {}
            }

            let scalar = matches!(
                instr.opcode,
                Opcode::VMOVSS
                    | Opcode::VMOVSD
                    | Opcode::VSQRTSS
                    | Opcode::VSQRTSD
                    | Opcode::VADDSS
                    | Opcode::VADDSD
                    | Opcode::VMULSS
                    | Opcode::VMULSD
                    | Opcode::VSUBSS
                    | Opcode::VSUBSD
                    | Opcode::VMINSS
                    | Opcode::VMINSD
                    | Opcode::VDIVSS
                    | Opcode::VDIVSD
                    | Opcode::VMAXSS
                    | Opcode::VMAXSD
                    | Opcode::VCMPSS
                    | Opcode::VCMPSD
                    | Opcode::VMOVD
                    | Opcode::VMOVQ
            );
            if !scalar && !self.avx512_vl() {
                let mut shorter_than_512 = false;
                let mut any_512 = false;
                for i in 0..instr.operand_count as usize {
                    let reg = match instr.operands[i] {
                        OperandSpec::RegRRR
                        | OperandSpec::RegRRR_maskmerge
                        | OperandSpec::RegRRR_maskmerge_sae
                        | OperandSpec::RegRRR_maskmerge_sae_noround => instr.regs[0],
                        OperandSpec::RegMMM | OperandSpec::RegMMM_maskmerge => instr.regs[1],
                        OperandSpec::RegVex | OperandSpec::RegVex_maskmerge => instr.regs[3],
                        _ => continue,
                    };
                    match reg.bank {
                        RegisterBank::X | RegisterBank::Y => shorter_than_512 = true,
                        RegisterBank::Z => any_512 = true,
                        _ => {}
                    }
                }
                if shorter_than_512 && !any_512 {
                    return Err(ErrorKind::InvalidOpcode);
                }
            }
            return Ok(());
        }

        if instr.prefixes.vex().present() {
            match instr.opcode {
                Opcode::ANDN
                | Opcode::BEXTR
                | Opcode::BLSI
                | Opcode::BLSMSK
                | Opcode::BLSR => {
                    if !self.bmi1() {
                        return Err(ErrorKind::InvalidOpcode);
                    }
                }
                Opcode::BZHI
                | Opcode::PEXT
                | Opcode::PDEP
                | Opcode::MULX
                | Opcode::RORX
                | Opcode::SARX
                | Opcode::SHLX
                | Opcode::SHRX => {
                    if !self.bmi2() {
                        return Err(ErrorKind::InvalidOpcode);
                    }
                }
                Opcode::VPBROADCASTD | Opcode::VPBROADCASTQ => {
                    if !self.avx2() {
                        return Err(ErrorKind::InvalidOpcode);
                    }
                }
                _ => {
                    if !self.avx() {
                        return Err(ErrorKind::InvalidOpcode);
                    }
                }
            }
            return Ok(());
        }

        match instr.opcode {
            Opcode::PSHUFB | Opcode::PABSB | Opcode::PABSW | Opcode::PABSD | Opcode::PALIGNR => {
                if !self.ssse3() {
                    return Err(ErrorKind::InvalidOpcode);
                }
            }
            Opcode::PTEST
            | Opcode::PMULLD
            | Opcode::ROUNDPS
            | Opcode::ROUNDPD
            | Opcode::ROUNDSS
            | Opcode::ROUNDSD => {
                if !self.sse4_1() {
                    return Err(ErrorKind::InvalidOpcode);
                }
            }
            Opcode::TZCNT => {
                if !self.bmi1() {
                    // without bmi1 the `f3` prefix is quietly ignored
                    instr.opcode = Opcode::BSF;
                }
            }
            Opcode::LZCNT => {
                if !self.lzcnt() {
                    instr.opcode = Opcode::BSR;
                }
            }
            _ => {}
        }
        Ok(())
    }
}

impl Decodable for Decoder {
    type Instruction = Instruction;

    fn decode(&self, reader: &mut Reader) -> Result<Instruction, Error> {
        let mut instr = Instruction::invalid();
        read_instr(reader, &mut instr).map_err(|kind| Error::new(kind, reader.offset()))?;
        instr.length = reader.offset() as u8;
        if reader.offset() > 15 {
            return Err(Error::new(ErrorKind::TooLong, reader.offset()));
        }
        if self.flags != u64::MAX {
            self.revise_instruction(&mut instr)
                .map_err(|kind| Error::new(kind, reader.offset()))?;
        }
        Ok(instr)
    }

    fn max_width(&self) -> usize {
        15
    }
}

#[inline]
fn read_modrm(reader: &mut Reader) -> Result<u8, ErrorKind> {
    reader.next().ok_or(ErrorKind::ExhaustedInput)
}

fn read_num(reader: &mut Reader, width: u8) -> Result<u64, ErrorKind> {
    let mut buf = [0u8; 8];
    reader
        .next_n(&mut buf[..width as usize])
        .ok_or(ErrorKind::ExhaustedInput)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_imm_signed(reader: &mut Reader, width: u8) -> Result<i64, ErrorKind> {
    let num = read_num(reader, width)?;
    Ok(match width {
        1 => num as u8 as i8 as i64,
        2 => num as u16 as i16 as i64,
        4 => num as u32 as i32 as i64,
        _ => num as i64,
    })
}

/// the operand width of a `v`-suffixed form under the current prefixes.
#[inline]
fn opwidth_v(prefixes: &Prefixes) -> u8 {
    if prefixes.rex().w() {
        8
    } else if prefixes.operand_size() {
        2
    } else {
        4
    }
}

#[inline]
fn width_to_gp_reg_bank(width: u8, rex: bool) -> RegisterBank {
    match width {
        1 => {
            if rex {
                RegisterBank::rB
            } else {
                RegisterBank::B
            }
        }
        2 => RegisterBank::W,
        4 => RegisterBank::D,
        _ => RegisterBank::Q,
    }
}

#[allow(non_snake_case)]
fn read_G(instr: &mut Instruction, modrm: u8, width: u8) {
    let bank = width_to_gp_reg_bank(width, instr.prefixes.rex().present());
    instr.regs[0] = RegSpec::from_parts((modrm >> 3) & 7, instr.prefixes.rex().r(), bank);
}

#[allow(non_snake_case)]
fn read_G_vec(instr: &mut Instruction, modrm: u8, bank: RegisterBank) {
    instr.regs[0] = RegSpec::from_parts((modrm >> 3) & 7, instr.prefixes.rex().r(), bank);
}

#[allow(non_snake_case)]
fn read_E(
    reader: &mut Reader,
    instr: &mut Instruction,
    modrm: u8,
    width: u8,
) -> Result<OperandSpec, ErrorKind> {
    if modrm >= 0b11000000 {
        let bank = width_to_gp_reg_bank(width, instr.prefixes.rex().present());
        instr.regs[1] = RegSpec::from_parts(modrm & 7, instr.prefixes.rex().b(), bank);
        Ok(OperandSpec::RegMMM)
    } else {
        read_M(reader, instr, modrm)
    }
}

#[allow(non_snake_case)]
fn read_E_vec(
    reader: &mut Reader,
    instr: &mut Instruction,
    modrm: u8,
    bank: RegisterBank,
) -> Result<OperandSpec, ErrorKind> {
    if modrm >= 0b11000000 {
        let mut num = (modrm & 7) + if instr.prefixes.rex().b() { 8 } else { 0 };
        // evex reuses `x` to reach registers 16..31 in the mmm field
        if instr.prefixes.evex_data.present() && instr.prefixes.rex().x() {
            num += 16;
        }
        instr.regs[1] = RegSpec { num, bank };
        Ok(OperandSpec::RegMMM)
    } else {
        read_M(reader, instr, modrm)
    }
}

#[allow(non_snake_case)]
fn read_M(
    reader: &mut Reader,
    instr: &mut Instruction,
    modrm: u8,
) -> Result<OperandSpec, ErrorKind> {
    debug_assert!(modrm < 0b11000000);
    let modbits = modrm >> 6;
    let mmm = modrm & 7;
    let addr_bank = if instr.prefixes.address_size() {
        RegisterBank::D
    } else {
        RegisterBank::Q
    };

    if mmm == 0b100 {
        return read_sib(reader, instr, modrm);
    }

    if mmm == 0b101 && modbits == 0b00 {
        // rip-relative addressing always carries its disp32
        instr.regs[1] = RegSpec::rip();
        instr.disp = read_imm_signed(reader, 4)? as u64;
        return Ok(OperandSpec::RegDisp);
    }

    instr.regs[1] = RegSpec::from_parts(mmm, instr.prefixes.rex().b(), addr_bank);
    let disp = match modbits {
        0b00 => 0,
        0b01 => {
            if instr.prefixes.evex_data.present() {
                instr.prefixes.apply_compressed_disp(true);
            }
            read_imm_signed(reader, 1)?
        }
        _ => read_imm_signed(reader, 4)?,
    };

    if disp == 0 {
        Ok(OperandSpec::Deref)
    } else {
        instr.disp = disp as u64;
        Ok(OperandSpec::RegDisp)
    }
}

fn read_sib(
    reader: &mut Reader,
    instr: &mut Instruction,
    modrm: u8,
) -> Result<OperandSpec, ErrorKind> {
    let modbits = modrm >> 6;
    let addr_bank = if instr.prefixes.address_size() {
        RegisterBank::D
    } else {
        RegisterBank::Q
    };

    let sibbyte = reader.next().ok_or(ErrorKind::ExhaustedInput)?;
    instr.scale = 1 << (sibbyte >> 6);
    let base = sibbyte & 7;
    let index = (sibbyte >> 3) & 7;

    let no_base = base == 0b101 && modbits == 0b00;
    let no_index = index == 0b100 && !instr.prefixes.rex().x();

    let disp = match modbits {
        0b00 => {
            if no_base {
                read_imm_signed(reader, 4)?
            } else {
                0
            }
        }
        0b01 => {
            if instr.prefixes.evex_data.present() {
                instr.prefixes.apply_compressed_disp(true);
            }
            read_imm_signed(reader, 1)?
        }
        _ => read_imm_signed(reader, 4)?,
    };
    instr.disp = disp as u64;

    if !no_base {
        instr.regs[1] = RegSpec::from_parts(base, instr.prefixes.rex().b(), addr_bank);
    }
    if !no_index {
        instr.regs[2] = RegSpec::from_parts(index, instr.prefixes.rex().x(), addr_bank);
    }

    Ok(match (no_base, no_index) {
        (true, true) => OperandSpec::DispU32,
        (true, false) => {
            if disp == 0 {
                OperandSpec::RegScale
            } else {
                OperandSpec::RegScaleDisp
            }
        }
        (false, true) => {
            if disp == 0 {
                OperandSpec::Deref
            } else {
                OperandSpec::RegDisp
            }
        }
        (false, false) => {
            if disp == 0 {
                OperandSpec::RegIndexBaseScale
            } else {
                OperandSpec::RegIndexBaseScaleDisp
            }
        }
    })
}

fn read_instr(reader: &mut Reader, instr: &mut Instruction) -> Result<(), ErrorKind> {
    reader.mark();
    let opc = loop {
        let byte = reader.next().ok_or(ErrorKind::ExhaustedInput)?;
        if reader.offset() > 15 {
            return Err(ErrorKind::TooLong);
        }
        match byte {
            // es/cs/ss/ds overrides exist but do nothing in long mode
            0x26 | 0x2e | 0x36 | 0x3e => instr.prefixes.rex_from(0),
            0x64 => {
                instr.prefixes.set_segment(Segment::FS);
                instr.prefixes.rex_from(0);
            }
            0x65 => {
                instr.prefixes.set_segment(Segment::GS);
                instr.prefixes.rex_from(0);
            }
            0x66 => {
                instr.prefixes.set_operand_size();
                instr.prefixes.rex_from(0);
            }
            0x67 => {
                instr.prefixes.set_address_size();
                instr.prefixes.rex_from(0);
            }
            0xf0 => {
                instr.prefixes.set_lock();
                instr.prefixes.rex_from(0);
            }
            0xf2 => {
                instr.prefixes.set_repnz();
                instr.prefixes.rex_from(0);
            }
            0xf3 => {
                instr.prefixes.set_rep();
                instr.prefixes.rex_from(0);
            }
            // a rex prefix is only a rex prefix right before the opcode
            0x40..=0x4f => instr.prefixes.rex_from(byte),
            0x62 | 0xc4 | 0xc5 => {
                if instr.prefixes.rex().present()
                    || instr.prefixes.lock()
                    || instr.prefixes.operand_size()
                    || instr.prefixes.rep()
                    || instr.prefixes.repnz()
                {
                    return Err(ErrorKind::InvalidPrefixes);
                }
                return match byte {
                    0x62 => evex::read_evex(reader, instr),
                    0xc4 => vex::three_byte_vex(reader, instr),
                    _ => vex::two_byte_vex(reader, instr),
                };
            }
            _ => break byte,
        }
    };

    if opc == 0x0f {
        let escape = reader.next().ok_or(ErrorKind::ExhaustedInput)?;
        match escape {
            0x38 => read_0f38_opcode(reader, instr),
            0x3a => read_0f3a_opcode(reader, instr),
            _ => read_0f_opcode(reader, instr, escape),
        }
    } else {
        read_opcode(reader, instr, opc)
    }
}

#[rustfmt::skip]
const BASE_OPCODE_MAP: [Opcode; 8] = [
    Opcode::ADD, Opcode::OR, Opcode::ADC, Opcode::SBB,
    Opcode::AND, Opcode::SUB, Opcode::XOR, Opcode::CMP,
];

#[rustfmt::skip]
const GROUP2_OPCODE_MAP: [Opcode; 8] = [
    Opcode::ROL, Opcode::ROR, Opcode::RCL, Opcode::RCR,
    Opcode::SHL, Opcode::SHR, Opcode::SAL, Opcode::SAR,
];

#[rustfmt::skip]
const JCC_OPCODE_MAP: [Opcode; 16] = [
    Opcode::JO, Opcode::JNO, Opcode::JB, Opcode::JNB,
    Opcode::JZ, Opcode::JNZ, Opcode::JNA, Opcode::JA,
    Opcode::JS, Opcode::JNS, Opcode::JP, Opcode::JNP,
    Opcode::JL, Opcode::JGE, Opcode::JLE, Opcode::JG,
];

#[rustfmt::skip]
const CMOVCC_OPCODE_MAP: [Opcode; 16] = [
    Opcode::CMOVO, Opcode::CMOVNO, Opcode::CMOVB, Opcode::CMOVNB,
    Opcode::CMOVZ, Opcode::CMOVNZ, Opcode::CMOVNA, Opcode::CMOVA,
    Opcode::CMOVS, Opcode::CMOVNS, Opcode::CMOVP, Opcode::CMOVNP,
    Opcode::CMOVL, Opcode::CMOVGE, Opcode::CMOVLE, Opcode::CMOVG,
];

#[rustfmt::skip]
const SETCC_OPCODE_MAP: [Opcode; 16] = [
    Opcode::SETO, Opcode::SETNO, Opcode::SETB, Opcode::SETAE,
    Opcode::SETZ, Opcode::SETNZ, Opcode::SETBE, Opcode::SETA,
    Opcode::SETS, Opcode::SETNS, Opcode::SETP, Opcode::SETNP,
    Opcode::SETL, Opcode::SETGE, Opcode::SETLE, Opcode::SETG,
];

fn read_opcode(reader: &mut Reader, instr: &mut Instruction, opc: u8) -> Result<(), ErrorKind> {
    instr.operand_count = 2;
    match opc {
        0x00..=0x3f => {
            let form = opc & 7;
            if form >= 6 {
                return Err(ErrorKind::InvalidOpcode);
            }
            instr.opcode = BASE_OPCODE_MAP[(opc >> 3) as usize];
            match form {
                4 => {
                    instr.regs[0] = RegSpec::al();
                    instr.imm = read_imm_signed(reader, 1)? as u64;
                    instr.operands[0] = OperandSpec::RegRRR;
                    instr.operands[1] = OperandSpec::ImmI8;
                }
                5 => {
                    let width = opwidth_v(&instr.prefixes);
                    instr.regs[0] = RegSpec { num: 0, bank: width_to_gp_reg_bank(width, false) };
                    let spec = if width == 2 {
                        instr.imm = read_imm_signed(reader, 2)? as u64;
                        OperandSpec::ImmI16
                    } else {
                        instr.imm = read_imm_signed(reader, 4)? as u64;
                        OperandSpec::ImmI32
                    };
                    instr.operands[0] = OperandSpec::RegRRR;
                    instr.operands[1] = spec;
                }
                _ => {
                    let width = if form & 1 == 0 { 1 } else { opwidth_v(&instr.prefixes) };
                    let modrm = read_modrm(reader)?;
                    read_G(instr, modrm, width);
                    let e = read_E(reader, instr, modrm, width)?;
                    if e.is_memory() {
                        instr.mem_size = width;
                    }
                    if form < 2 {
                        instr.operands[0] = e;
                        instr.operands[1] = OperandSpec::RegRRR;
                    } else {
                        instr.operands[0] = OperandSpec::RegRRR;
                        instr.operands[1] = e;
                    }
                }
            }
        }
        0x50..=0x5f => {
            instr.opcode = if opc < 0x58 { Opcode::PUSH } else { Opcode::POP };
            let width = if instr.prefixes.operand_size() { 2 } else { 8 };
            let bank = width_to_gp_reg_bank(width, false);
            instr.regs[0] = RegSpec::from_parts(opc & 7, instr.prefixes.rex().b(), bank);
            instr.operands[0] = OperandSpec::RegRRR;
            instr.operand_count = 1;
        }
        0x63 => {
            instr.opcode = Opcode::MOVSXD;
            let width = opwidth_v(&instr.prefixes);
            let modrm = read_modrm(reader)?;
            read_G(instr, modrm, width);
            let e = read_E(reader, instr, modrm, 4)?;
            if e.is_memory() {
                instr.mem_size = 4;
            }
            instr.operands[0] = OperandSpec::RegRRR;
            instr.operands[1] = e;
        }
        0x68 | 0x6a => {
            instr.opcode = Opcode::PUSH;
            let spec = if opc == 0x6a {
                instr.imm = read_imm_signed(reader, 1)? as u64;
                OperandSpec::ImmI8
            } else if instr.prefixes.operand_size() {
                instr.imm = read_imm_signed(reader, 2)? as u64;
                OperandSpec::ImmI16
            } else {
                instr.imm = read_imm_signed(reader, 4)? as u64;
                OperandSpec::ImmI32
            };
            instr.operands[0] = spec;
            instr.operand_count = 1;
        }
        0x69 | 0x6b => {
            instr.opcode = Opcode::IMUL;
            let width = opwidth_v(&instr.prefixes);
            let modrm = read_modrm(reader)?;
            read_G(instr, modrm, width);
            let e = read_E(reader, instr, modrm, width)?;
            if e.is_memory() {
                instr.mem_size = width;
            }
            let spec = if opc == 0x6b {
                instr.imm = read_imm_signed(reader, 1)? as u64;
                OperandSpec::ImmI8
            } else if width == 2 {
                instr.imm = read_imm_signed(reader, 2)? as u64;
                OperandSpec::ImmI16
            } else {
                instr.imm = read_imm_signed(reader, 4)? as u64;
                OperandSpec::ImmI32
            };
            instr.operands[0] = OperandSpec::RegRRR;
            instr.operands[1] = e;
            instr.operands[2] = spec;
            instr.operand_count = 3;
        }
        0x70..=0x7f => {
            instr.opcode = JCC_OPCODE_MAP[(opc & 0xf) as usize];
            instr.imm = read_imm_signed(reader, 1)? as u64;
            instr.operands[0] = OperandSpec::ImmI8;
            instr.operand_count = 1;
        }
        0x80 | 0x81 | 0x83 => {
            let width = if opc == 0x80 { 1 } else { opwidth_v(&instr.prefixes) };
            let modrm = read_modrm(reader)?;
            instr.opcode = BASE_OPCODE_MAP[((modrm >> 3) & 7) as usize];
            let e = read_E(reader, instr, modrm, width)?;
            if e.is_memory() {
                instr.mem_size = width;
            }
            let spec = if opc == 0x81 && width != 2 {
                instr.imm = read_imm_signed(reader, 4)? as u64;
                OperandSpec::ImmI32
            } else if opc == 0x81 {
                instr.imm = read_imm_signed(reader, 2)? as u64;
                OperandSpec::ImmI16
            } else {
                instr.imm = read_imm_signed(reader, 1)? as u64;
                OperandSpec::ImmI8
            };
            instr.operands[0] = e;
            instr.operands[1] = spec;
        }
        0x84 | 0x85 | 0x86 | 0x87 | 0x88 | 0x89 => {
            instr.opcode = match opc {
                0x84 | 0x85 => Opcode::TEST,
                0x86 | 0x87 => Opcode::XCHG,
                _ => Opcode::MOV,
            };
            let width = if opc & 1 == 0 { 1 } else { opwidth_v(&instr.prefixes) };
            let modrm = read_modrm(reader)?;
            read_G(instr, modrm, width);
            let e = read_E(reader, instr, modrm, width)?;
            if e.is_memory() {
                instr.mem_size = width;
            }
            instr.operands[0] = e;
            instr.operands[1] = OperandSpec::RegRRR;
        }
        0x8a | 0x8b => {
            instr.opcode = Opcode::MOV;
            let width = if opc == 0x8a { 1 } else { opwidth_v(&instr.prefixes) };
            let modrm = read_modrm(reader)?;
            read_G(instr, modrm, width);
            let e = read_E(reader, instr, modrm, width)?;
            if e.is_memory() {
                instr.mem_size = width;
            }
            instr.operands[0] = OperandSpec::RegRRR;
            instr.operands[1] = e;
        }
        0x8d => {
            instr.opcode = Opcode::LEA;
            let width = opwidth_v(&instr.prefixes);
            let modrm = read_modrm(reader)?;
            if modrm >= 0b11000000 {
                return Err(ErrorKind::InvalidOperand);
            }
            read_G(instr, modrm, width);
            let e = read_M(reader, instr, modrm)?;
            instr.mem_size = width;
            instr.operands[0] = OperandSpec::RegRRR;
            instr.operands[1] = e;
        }
        0x8f => {
            let modrm = read_modrm(reader)?;
            if (modrm >> 3) & 7 != 0 {
                return Err(ErrorKind::InvalidOpcode);
            }
            instr.opcode = Opcode::POP;
            let width = if instr.prefixes.operand_size() { 2 } else { 8 };
            let e = read_E(reader, instr, modrm, width)?;
            if e.is_memory() {
                instr.mem_size = width;
            }
            instr.operands[0] = e;
            instr.operand_count = 1;
        }
        0x90..=0x97 => {
            if opc == 0x90 && !instr.prefixes.rex().b() {
                instr.opcode = if instr.prefixes.rep() { Opcode::PAUSE } else { Opcode::NOP };
                instr.operand_count = 0;
            } else {
                instr.opcode = Opcode::XCHG;
                let width = opwidth_v(&instr.prefixes);
                let bank = width_to_gp_reg_bank(width, false);
                instr.regs[0] = RegSpec { num: 0, bank };
                instr.regs[1] = RegSpec::from_parts(opc & 7, instr.prefixes.rex().b(), bank);
                instr.operands[0] = OperandSpec::RegRRR;
                instr.operands[1] = OperandSpec::RegMMM;
            }
        }
        0x98 => {
            instr.opcode = if instr.prefixes.rex().w() {
                Opcode::CDQE
            } else if instr.prefixes.operand_size() {
                Opcode::CBW
            } else {
                Opcode::CWDE
            };
            instr.operand_count = 0;
        }
        0x99 => {
            instr.opcode = if instr.prefixes.rex().w() {
                Opcode::CQO
            } else if instr.prefixes.operand_size() {
                Opcode::CWD
            } else {
                Opcode::CDQ
            };
            instr.operand_count = 0;
        }
        0x9c => {
            instr.opcode = Opcode::PUSHF;
            instr.operand_count = 0;
        }
        0x9d => {
            instr.opcode = Opcode::POPF;
            instr.operand_count = 0;
        }
        0xa0..=0xa3 => {
            instr.opcode = Opcode::MOV;
            let width = if opc & 1 == 0 { 1 } else { opwidth_v(&instr.prefixes) };
            let addr_width = if instr.prefixes.address_size() { 4 } else { 8 };
            instr.disp = read_num(reader, addr_width)?;
            instr.regs[0] =
                RegSpec { num: 0, bank: width_to_gp_reg_bank(width, instr.prefixes.rex().present()) };
            instr.mem_size = width;
            if opc < 0xa2 {
                instr.operands[0] = OperandSpec::RegRRR;
                instr.operands[1] = OperandSpec::DispU64;
            } else {
                instr.operands[0] = OperandSpec::DispU64;
                instr.operands[1] = OperandSpec::RegRRR;
            }
        }
        0xa4 | 0xa5 => {
            instr.opcode = Opcode::MOVS;
            instr.mem_size = if opc == 0xa4 { 1 } else { opwidth_v(&instr.prefixes) };
            instr.operands[0] = OperandSpec::Deref_rdi;
            instr.operands[1] = OperandSpec::Deref_rsi;
        }
        0xa6 | 0xa7 => {
            instr.opcode = Opcode::CMPS;
            instr.mem_size = if opc == 0xa6 { 1 } else { opwidth_v(&instr.prefixes) };
            instr.operands[0] = OperandSpec::Deref_rsi;
            instr.operands[1] = OperandSpec::Deref_rdi;
        }
        0xa8 | 0xa9 => {
            instr.opcode = Opcode::TEST;
            let spec = if opc == 0xa8 {
                instr.regs[0] = RegSpec::al();
                instr.imm = read_imm_signed(reader, 1)? as u64;
                OperandSpec::ImmI8
            } else {
                let width = opwidth_v(&instr.prefixes);
                instr.regs[0] = RegSpec { num: 0, bank: width_to_gp_reg_bank(width, false) };
                if width == 2 {
                    instr.imm = read_imm_signed(reader, 2)? as u64;
                    OperandSpec::ImmI16
                } else {
                    instr.imm = read_imm_signed(reader, 4)? as u64;
                    OperandSpec::ImmI32
                }
            };
            instr.operands[0] = OperandSpec::RegRRR;
            instr.operands[1] = spec;
        }
        0xaa..=0xaf => {
            let width = if opc & 1 == 0 { 1 } else { opwidth_v(&instr.prefixes) };
            instr.regs[0] = RegSpec { num: 0, bank: width_to_gp_reg_bank(width, false) };
            instr.mem_size = width;
            match opc {
                0xaa | 0xab => {
                    instr.opcode = Opcode::STOS;
                    instr.operands[0] = OperandSpec::Deref_rdi;
                    instr.operands[1] = OperandSpec::RegRRR;
                }
                0xac | 0xad => {
                    instr.opcode = Opcode::LODS;
                    instr.operands[0] = OperandSpec::RegRRR;
                    instr.operands[1] = OperandSpec::Deref_rsi;
                }
                _ => {
                    instr.opcode = Opcode::SCAS;
                    instr.operands[0] = OperandSpec::Deref_rdi;
                    instr.operands[1] = OperandSpec::RegRRR;
                }
            }
        }
        0xb0..=0xb7 => {
            instr.opcode = Opcode::MOV;
            let bank = width_to_gp_reg_bank(1, instr.prefixes.rex().present());
            instr.regs[0] = RegSpec::from_parts(opc & 7, instr.prefixes.rex().b(), bank);
            instr.imm = read_num(reader, 1)?;
            instr.operands[0] = OperandSpec::RegRRR;
            instr.operands[1] = OperandSpec::ImmU8;
        }
        0xb8..=0xbf => {
            instr.opcode = Opcode::MOV;
            let width = opwidth_v(&instr.prefixes);
            let bank = width_to_gp_reg_bank(width, false);
            instr.regs[0] = RegSpec::from_parts(opc & 7, instr.prefixes.rex().b(), bank);
            instr.imm = read_num(reader, width)?;
            instr.operands[0] = OperandSpec::RegRRR;
            instr.operands[1] = match width {
                2 => OperandSpec::ImmU16,
                4 => OperandSpec::ImmU32,
                _ => OperandSpec::ImmU64,
            };
        }
        0xc0 | 0xc1 | 0xd0..=0xd3 => {
            let width = if opc & 1 == 0 { 1 } else { opwidth_v(&instr.prefixes) };
            let modrm = read_modrm(reader)?;
            instr.opcode = GROUP2_OPCODE_MAP[((modrm >> 3) & 7) as usize];
            let e = read_E(reader, instr, modrm, width)?;
            if e.is_memory() {
                instr.mem_size = width;
            }
            instr.operands[0] = e;
            instr.operands[1] = match opc {
                0xc0 | 0xc1 => {
                    instr.imm = read_imm_signed(reader, 1)? as u64;
                    OperandSpec::ImmI8
                }
                0xd0 | 0xd1 => {
                    instr.imm = 1;
                    OperandSpec::ImmI8
                }
                _ => OperandSpec::RegCl,
            };
        }
        0xc2 => {
            instr.opcode = Opcode::RETURN;
            instr.imm = read_num(reader, 2)?;
            instr.operands[0] = OperandSpec::ImmU16;
            instr.operand_count = 1;
        }
        0xc3 => {
            instr.opcode = Opcode::RETURN;
            instr.operand_count = 0;
        }
        0xc6 | 0xc7 => {
            let modrm = read_modrm(reader)?;
            if (modrm >> 3) & 7 != 0 {
                return Err(ErrorKind::InvalidOpcode);
            }
            instr.opcode = Opcode::MOV;
            let width = if opc == 0xc6 { 1 } else { opwidth_v(&instr.prefixes) };
            let e = read_E(reader, instr, modrm, width)?;
            if e.is_memory() {
                instr.mem_size = width;
            }
            instr.operands[0] = e;
            instr.operands[1] = match width {
                1 => {
                    instr.imm = read_imm_signed(reader, 1)? as u64;
                    OperandSpec::ImmI8
                }
                2 => {
                    instr.imm = read_imm_signed(reader, 2)? as u64;
                    OperandSpec::ImmI16
                }
                _ => {
                    instr.imm = read_imm_signed(reader, 4)? as u64;
                    OperandSpec::ImmI32
                }
            };
        }
        0xc8 => {
            instr.opcode = Opcode::ENTER;
            instr.disp = read_num(reader, 2)?;
            instr.imm = read_num(reader, 1)?;
            instr.operands[0] = OperandSpec::ImmInDispField;
            instr.operands[1] = OperandSpec::ImmU8;
        }
        0xc9 => {
            instr.opcode = Opcode::LEAVE;
            instr.operand_count = 0;
        }
        0xcc => {
            instr.opcode = Opcode::INT3;
            instr.operand_count = 0;
        }
        0xcd => {
            instr.opcode = Opcode::INT;
            instr.imm = read_num(reader, 1)?;
            instr.operands[0] = OperandSpec::ImmU8;
            instr.operand_count = 1;
        }
        0xe8 | 0xe9 => {
            instr.opcode = if opc == 0xe8 { Opcode::CALL } else { Opcode::JMP };
            instr.imm = read_imm_signed(reader, 4)? as u64;
            instr.operands[0] = OperandSpec::ImmI32;
            instr.operand_count = 1;
        }
        0xeb => {
            instr.opcode = Opcode::JMP;
            instr.imm = read_imm_signed(reader, 1)? as u64;
            instr.operands[0] = OperandSpec::ImmI8;
            instr.operand_count = 1;
        }
        0xf4 => {
            instr.opcode = Opcode::HLT;
            instr.operand_count = 0;
        }
        0xf5 => {
            instr.opcode = Opcode::CMC;
            instr.operand_count = 0;
        }
        0xf6 | 0xf7 => {
            let width = if opc == 0xf6 { 1 } else { opwidth_v(&instr.prefixes) };
            let modrm = read_modrm(reader)?;
            let e = read_E(reader, instr, modrm, width)?;
            if e.is_memory() {
                instr.mem_size = width;
            }
            instr.operands[0] = e;
            match (modrm >> 3) & 7 {
                0 | 1 => {
                    instr.opcode = Opcode::TEST;
                    instr.operands[1] = match width {
                        1 => {
                            instr.imm = read_imm_signed(reader, 1)? as u64;
                            OperandSpec::ImmI8
                        }
                        2 => {
                            instr.imm = read_imm_signed(reader, 2)? as u64;
                            OperandSpec::ImmI16
                        }
                        _ => {
                            instr.imm = read_imm_signed(reader, 4)? as u64;
                            OperandSpec::ImmI32
                        }
                    };
                }
                reg => {
                    instr.opcode = match reg {
                        2 => Opcode::NOT,
                        3 => Opcode::NEG,
                        4 => Opcode::MUL,
                        5 => Opcode::IMUL,
                        6 => Opcode::DIV,
                        _ => Opcode::IDIV,
                    };
                    instr.operand_count = 1;
                }
            }
        }
        0xf8..=0xfd => {
            instr.opcode = match opc {
                0xf8 => Opcode::CLC,
                0xf9 => Opcode::STC,
                0xfa => Opcode::CLI,
                0xfb => Opcode::STI,
                0xfc => Opcode::CLD,
                _ => Opcode::STD,
            };
            instr.operand_count = 0;
        }
        0xfe => {
            let modrm = read_modrm(reader)?;
            instr.opcode = match (modrm >> 3) & 7 {
                0 => Opcode::INC,
                1 => Opcode::DEC,
                _ => return Err(ErrorKind::InvalidOpcode),
            };
            let e = read_E(reader, instr, modrm, 1)?;
            if e.is_memory() {
                instr.mem_size = 1;
            }
            instr.operands[0] = e;
            instr.operand_count = 1;
        }
        0xff => {
            let modrm = read_modrm(reader)?;
            let width = match (modrm >> 3) & 7 {
                0 | 1 => opwidth_v(&instr.prefixes),
                2 | 4 => 8,
                6 => {
                    if instr.prefixes.operand_size() {
                        2
                    } else {
                        8
                    }
                }
                _ => return Err(ErrorKind::InvalidOpcode),
            };
            instr.opcode = match (modrm >> 3) & 7 {
                0 => Opcode::INC,
                1 => Opcode::DEC,
                2 => Opcode::CALL,
                4 => Opcode::JMP,
                _ => Opcode::PUSH,
            };
            let e = read_E(reader, instr, modrm, width)?;
            if e.is_memory() {
                instr.mem_size = width;
            }
            instr.operands[0] = e;
            instr.operand_count = 1;
        }
        _ => return Err(ErrorKind::InvalidOpcode),
    }
    Ok(())
}

/// append a trailing `imm8` operand.
fn read_imm_u8(reader: &mut Reader, instr: &mut Instruction) -> Result<(), ErrorKind> {
    instr.imm = read_num(reader, 1)?;
    instr.operands[instr.operand_count as usize] = OperandSpec::ImmU8;
    instr.operand_count += 1;
    Ok(())
}

/// `op xmm, xmm/mem`.
fn read_sse_ge(
    reader: &mut Reader,
    instr: &mut Instruction,
    op: Opcode,
    mem_size: u8,
) -> Result<(), ErrorKind> {
    instr.opcode = op;
    let modrm = read_modrm(reader)?;
    read_G_vec(instr, modrm, RegisterBank::X);
    let e = read_E_vec(reader, instr, modrm, RegisterBank::X)?;
    if e.is_memory() {
        instr.mem_size = mem_size;
    }
    instr.operands[0] = OperandSpec::RegRRR;
    instr.operands[1] = e;
    instr.operand_count = 2;
    Ok(())
}

/// `op xmm/mem, xmm`.
fn read_sse_eg(
    reader: &mut Reader,
    instr: &mut Instruction,
    op: Opcode,
    mem_size: u8,
) -> Result<(), ErrorKind> {
    instr.opcode = op;
    let modrm = read_modrm(reader)?;
    read_G_vec(instr, modrm, RegisterBank::X);
    let e = read_E_vec(reader, instr, modrm, RegisterBank::X)?;
    if e.is_memory() {
        instr.mem_size = mem_size;
    }
    instr.operands[0] = e;
    instr.operands[1] = OperandSpec::RegRRR;
    instr.operand_count = 2;
    Ok(())
}

fn read_0f_opcode(reader: &mut Reader, instr: &mut Instruction, opc: u8) -> Result<(), ErrorKind> {
    let rep = instr.prefixes.rep();
    let repnz = instr.prefixes.repnz();
    let osize = instr.prefixes.operand_size();

    match opc {
        0x05 => {
            instr.opcode = Opcode::SYSCALL;
            instr.operand_count = 0;
        }
        0x0b => {
            instr.opcode = Opcode::UD2;
            instr.operand_count = 0;
        }
        0x1f => {
            instr.opcode = Opcode::NOP;
            let width = opwidth_v(&instr.prefixes);
            let modrm = read_modrm(reader)?;
            let e = read_E(reader, instr, modrm, width)?;
            if e.is_memory() {
                instr.mem_size = width;
            }
            instr.operands[0] = e;
            instr.operand_count = 1;
        }
        0x10 | 0x11 => {
            let (op, mem_size) = if rep {
                (Opcode::MOVSS, 4)
            } else if repnz {
                (Opcode::MOVSD, 8)
            } else if osize {
                (Opcode::MOVUPD, 16)
            } else {
                (Opcode::MOVUPS, 16)
            };
            if opc == 0x10 {
                read_sse_ge(reader, instr, op, mem_size)?;
            } else {
                read_sse_eg(reader, instr, op, mem_size)?;
            }
        }
        0x28 | 0x29 => {
            let op = if osize { Opcode::MOVAPD } else { Opcode::MOVAPS };
            if rep || repnz {
                return Err(ErrorKind::InvalidOpcode);
            }
            if opc == 0x28 {
                read_sse_ge(reader, instr, op, 16)?;
            } else {
                read_sse_eg(reader, instr, op, 16)?;
            }
        }
        0x2e | 0x2f => {
            if rep || repnz {
                return Err(ErrorKind::InvalidOpcode);
            }
            let op = match (opc, osize) {
                (0x2e, false) => Opcode::UCOMISS,
                (0x2e, true) => Opcode::UCOMISD,
                (_, false) => Opcode::COMISS,
                (_, true) => Opcode::COMISD,
            };
            read_sse_ge(reader, instr, op, if osize { 8 } else { 4 })?;
        }
        0x31 => {
            instr.opcode = Opcode::RDTSC;
            instr.operand_count = 0;
        }
        0x40..=0x4f => {
            instr.opcode = CMOVCC_OPCODE_MAP[(opc & 0xf) as usize];
            let width = opwidth_v(&instr.prefixes);
            let modrm = read_modrm(reader)?;
            read_G(instr, modrm, width);
            let e = read_E(reader, instr, modrm, width)?;
            if e.is_memory() {
                instr.mem_size = width;
            }
            instr.operands[0] = OperandSpec::RegRRR;
            instr.operands[1] = e;
            instr.operand_count = 2;
        }
        0x51 => {
            let (op, mem_size) = if rep {
                (Opcode::SQRTSS, 4)
            } else if repnz {
                (Opcode::SQRTSD, 8)
            } else if osize {
                (Opcode::SQRTPD, 16)
            } else {
                (Opcode::SQRTPS, 16)
            };
            read_sse_ge(reader, instr, op, mem_size)?;
        }
        0x54..=0x57 => {
            if rep || repnz {
                return Err(ErrorKind::InvalidOpcode);
            }
            let op = match (opc, osize) {
                (0x54, false) => Opcode::ANDPS,
                (0x54, true) => Opcode::ANDPD,
                (0x55, false) => Opcode::ANDNPS,
                (0x55, true) => Opcode::ANDNPD,
                (0x56, false) => Opcode::ORPS,
                (0x56, true) => Opcode::ORPD,
                (_, false) => Opcode::XORPS,
                (_, true) => Opcode::XORPD,
            };
            read_sse_ge(reader, instr, op, 16)?;
        }
        0x58 | 0x59 | 0x5c..=0x5f => {
            let ops = match opc {
                0x58 => [Opcode::ADDPS, Opcode::ADDPD, Opcode::ADDSS, Opcode::ADDSD],
                0x59 => [Opcode::MULPS, Opcode::MULPD, Opcode::MULSS, Opcode::MULSD],
                0x5c => [Opcode::SUBPS, Opcode::SUBPD, Opcode::SUBSS, Opcode::SUBSD],
                0x5d => [Opcode::MINPS, Opcode::MINPD, Opcode::MINSS, Opcode::MINSD],
                0x5e => [Opcode::DIVPS, Opcode::DIVPD, Opcode::DIVSS, Opcode::DIVSD],
                _ => [Opcode::MAXPS, Opcode::MAXPD, Opcode::MAXSS, Opcode::MAXSD],
            };
            let (op, mem_size) = if rep {
                (ops[2], 4)
            } else if repnz {
                (ops[3], 8)
            } else if osize {
                (ops[1], 16)
            } else {
                (ops[0], 16)
            };
            read_sse_ge(reader, instr, op, mem_size)?;
        }
        0x6e => {
            if !osize || rep || repnz {
                return Err(ErrorKind::InvalidOpcode);
            }
            let width = if instr.prefixes.rex().w() { 8 } else { 4 };
            instr.opcode = if width == 8 { Opcode::MOVQ } else { Opcode::MOVD };
            let modrm = read_modrm(reader)?;
            read_G_vec(instr, modrm, RegisterBank::X);
            let e = read_E(reader, instr, modrm, width)?;
            if e.is_memory() {
                instr.mem_size = width;
            }
            instr.operands[0] = OperandSpec::RegRRR;
            instr.operands[1] = e;
            instr.operand_count = 2;
        }
        0x6f => {
            let op = if rep {
                Opcode::MOVDQU
            } else if osize {
                Opcode::MOVDQA
            } else {
                return Err(ErrorKind::InvalidOpcode);
            };
            read_sse_ge(reader, instr, op, 16)?;
        }
        0x70 => {
            let op = if rep {
                Opcode::PSHUFHW
            } else if repnz {
                Opcode::PSHUFLW
            } else if osize {
                Opcode::PSHUFD
            } else {
                return Err(ErrorKind::InvalidOpcode);
            };
            read_sse_ge(reader, instr, op, 16)?;
            instr.imm = read_num(reader, 1)?;
            instr.operands[2] = OperandSpec::ImmU8;
            instr.operand_count = 3;
        }
        0x74 | 0x75 | 0x76 => {
            if !osize || rep || repnz {
                return Err(ErrorKind::InvalidOpcode);
            }
            let op = match opc {
                0x74 => Opcode::PCMPEQB,
                0x75 => Opcode::PCMPEQW,
                _ => Opcode::PCMPEQD,
            };
            read_sse_ge(reader, instr, op, 16)?;
        }
        0x7e => {
            if rep {
                read_sse_ge(reader, instr, Opcode::MOVQ, 8)?;
            } else if osize && !repnz {
                let width = if instr.prefixes.rex().w() { 8 } else { 4 };
                instr.opcode = if width == 8 { Opcode::MOVQ } else { Opcode::MOVD };
                let modrm = read_modrm(reader)?;
                read_G_vec(instr, modrm, RegisterBank::X);
                let e = read_E(reader, instr, modrm, width)?;
                if e.is_memory() {
                    instr.mem_size = width;
                }
                instr.operands[0] = e;
                instr.operands[1] = OperandSpec::RegRRR;
                instr.operand_count = 2;
            } else {
                return Err(ErrorKind::InvalidOpcode);
            }
        }
        0x7f => {
            let op = if rep {
                Opcode::MOVDQU
            } else if osize {
                Opcode::MOVDQA
            } else {
                return Err(ErrorKind::InvalidOpcode);
            };
            read_sse_eg(reader, instr, op, 16)?;
        }
        0x80..=0x8f => {
            instr.opcode = JCC_OPCODE_MAP[(opc & 0xf) as usize];
            instr.imm = read_imm_signed(reader, 4)? as u64;
            instr.operands[0] = OperandSpec::ImmI32;
            instr.operand_count = 1;
        }
        0x90..=0x9f => {
            instr.opcode = SETCC_OPCODE_MAP[(opc & 0xf) as usize];
            let modrm = read_modrm(reader)?;
            let e = read_E(reader, instr, modrm, 1)?;
            if e.is_memory() {
                instr.mem_size = 1;
            }
            instr.operands[0] = e;
            instr.operand_count = 1;
        }
        0xa2 => {
            instr.opcode = Opcode::CPUID;
            instr.operand_count = 0;
        }
        0xa3 | 0xab | 0xb3 | 0xbb => {
            instr.opcode = match opc {
                0xa3 => Opcode::BT,
                0xab => Opcode::BTS,
                0xb3 => Opcode::BTR,
                _ => Opcode::BTC,
            };
            let width = opwidth_v(&instr.prefixes);
            let modrm = read_modrm(reader)?;
            read_G(instr, modrm, width);
            let e = read_E(reader, instr, modrm, width)?;
            if e.is_memory() {
                instr.mem_size = width;
            }
            instr.operands[0] = e;
            instr.operands[1] = OperandSpec::RegRRR;
            instr.operand_count = 2;
        }
        0xa4 | 0xa5 | 0xac | 0xad => {
            instr.opcode = if opc < 0xac { Opcode::SHLD } else { Opcode::SHRD };
            let width = opwidth_v(&instr.prefixes);
            let modrm = read_modrm(reader)?;
            read_G(instr, modrm, width);
            let e = read_E(reader, instr, modrm, width)?;
            if e.is_memory() {
                instr.mem_size = width;
            }
            instr.operands[0] = e;
            instr.operands[1] = OperandSpec::RegRRR;
            instr.operands[2] = if opc & 1 == 0 {
                instr.imm = read_num(reader, 1)?;
                OperandSpec::ImmU8
            } else {
                OperandSpec::RegCl
            };
            instr.operand_count = 3;
        }
        0xaf => {
            instr.opcode = Opcode::IMUL;
            let width = opwidth_v(&instr.prefixes);
            let modrm = read_modrm(reader)?;
            read_G(instr, modrm, width);
            let e = read_E(reader, instr, modrm, width)?;
            if e.is_memory() {
                instr.mem_size = width;
            }
            instr.operands[0] = OperandSpec::RegRRR;
            instr.operands[1] = e;
            instr.operand_count = 2;
        }
        0xb0 | 0xb1 => {
            instr.opcode = Opcode::CMPXCHG;
            let width = if opc == 0xb0 { 1 } else { opwidth_v(&instr.prefixes) };
            let modrm = read_modrm(reader)?;
            read_G(instr, modrm, width);
            let e = read_E(reader, instr, modrm, width)?;
            if e.is_memory() {
                instr.mem_size = width;
            }
            instr.operands[0] = e;
            instr.operands[1] = OperandSpec::RegRRR;
            instr.operand_count = 2;
        }
        0xb6 | 0xb7 | 0xbe | 0xbf => {
            instr.opcode = if opc < 0xbe { Opcode::MOVZX } else { Opcode::MOVSX };
            let src_width = if opc & 1 == 0 { 1 } else { 2 };
            let width = opwidth_v(&instr.prefixes);
            let modrm = read_modrm(reader)?;
            read_G(instr, modrm, width);
            let e = read_E(reader, instr, modrm, src_width)?;
            if e.is_memory() {
                instr.mem_size = src_width;
            }
            instr.operands[0] = OperandSpec::RegRRR;
            instr.operands[1] = e;
            instr.operand_count = 2;
        }
        0xba => {
            let modrm = read_modrm(reader)?;
            instr.opcode = match (modrm >> 3) & 7 {
                4 => Opcode::BT,
                5 => Opcode::BTS,
                6 => Opcode::BTR,
                7 => Opcode::BTC,
                _ => return Err(ErrorKind::InvalidOpcode),
            };
            let width = opwidth_v(&instr.prefixes);
            let e = read_E(reader, instr, modrm, width)?;
            if e.is_memory() {
                instr.mem_size = width;
            }
            instr.imm = read_num(reader, 1)?;
            instr.operands[0] = e;
            instr.operands[1] = OperandSpec::ImmU8;
            instr.operand_count = 2;
        }
        0xbc | 0xbd => {
            instr.opcode = match (opc, rep) {
                (0xbc, false) => Opcode::BSF,
                (0xbc, true) => Opcode::TZCNT,
                (_, false) => Opcode::BSR,
                (_, true) => Opcode::LZCNT,
            };
            let width = opwidth_v(&instr.prefixes);
            let modrm = read_modrm(reader)?;
            read_G(instr, modrm, width);
            let e = read_E(reader, instr, modrm, width)?;
            if e.is_memory() {
                instr.mem_size = width;
            }
            instr.operands[0] = OperandSpec::RegRRR;
            instr.operands[1] = e;
            instr.operand_count = 2;
        }
        0xc2 => {
            let (op, mem_size) = if rep {
                (Opcode::CMPSS, 4)
            } else if repnz {
                (Opcode::CMPSD, 8)
            } else if osize {
                (Opcode::CMPPD, 16)
            } else {
                (Opcode::CMPPS, 16)
            };
            read_sse_ge(reader, instr, op, mem_size)?;
            instr.imm = read_num(reader, 1)?;
            instr.operands[2] = OperandSpec::ImmU8;
            instr.operand_count = 3;
        }
        0xc8..=0xcf => {
            instr.opcode = Opcode::BSWAP;
            let width = if instr.prefixes.rex().w() { 8 } else { 4 };
            let bank = width_to_gp_reg_bank(width, false);
            instr.regs[0] = RegSpec::from_parts(opc & 7, instr.prefixes.rex().b(), bank);
            instr.operands[0] = OperandSpec::RegRRR;
            instr.operand_count = 1;
        }
        0xd4 | 0xd6 | 0xdb | 0xdf | 0xeb | 0xef | 0xf8..=0xfe => {
            // the no-66 versions of these rows are mmx, which stays undecoded
            if !osize || rep || repnz {
                return Err(ErrorKind::InvalidOpcode);
            }
            match opc {
                0xd6 => read_sse_eg(reader, instr, Opcode::MOVQ, 8)?,
                _ => {
                    let op = match opc {
                        0xd4 => Opcode::PADDQ,
                        0xdb => Opcode::PAND,
                        0xdf => Opcode::PANDN,
                        0xeb => Opcode::POR,
                        0xef => Opcode::PXOR,
                        0xf8 => Opcode::PSUBB,
                        0xf9 => Opcode::PSUBW,
                        0xfa => Opcode::PSUBD,
                        0xfb => Opcode::PSUBQ,
                        0xfc => Opcode::PADDB,
                        0xfd => Opcode::PADDW,
                        _ => Opcode::PADDD,
                    };
                    read_sse_ge(reader, instr, op, 16)?;
                }
            }
        }
        _ => return Err(ErrorKind::InvalidOpcode),
    }
    Ok(())
}

fn read_0f38_opcode(reader: &mut Reader, instr: &mut Instruction) -> Result<(), ErrorKind> {
    let opc = reader.next().ok_or(ErrorKind::ExhaustedInput)?;
    if !instr.prefixes.operand_size() || instr.prefixes.rep() || instr.prefixes.repnz() {
        return Err(ErrorKind::InvalidOpcode);
    }
    let op = match opc {
        0x00 => Opcode::PSHUFB,
        0x17 => Opcode::PTEST,
        0x1c => Opcode::PABSB,
        0x1d => Opcode::PABSW,
        0x1e => Opcode::PABSD,
        0x40 => Opcode::PMULLD,
        _ => return Err(ErrorKind::InvalidOpcode),
    };
    read_sse_ge(reader, instr, op, 16)
}

fn read_0f3a_opcode(reader: &mut Reader, instr: &mut Instruction) -> Result<(), ErrorKind> {
    let opc = reader.next().ok_or(ErrorKind::ExhaustedInput)?;
    if !instr.prefixes.operand_size() || instr.prefixes.rep() || instr.prefixes.repnz() {
        return Err(ErrorKind::InvalidOpcode);
    }
    let (op, mem_size) = match opc {
        0x08 => (Opcode::ROUNDPS, 16),
        0x09 => (Opcode::ROUNDPD, 16),
        0x0a => (Opcode::ROUNDSS, 4),
        0x0b => (Opcode::ROUNDSD, 8),
        0x0f => (Opcode::PALIGNR, 16),
        _ => return Err(ErrorKind::InvalidOpcode),
    };
    read_sse_ge(reader, instr, op, mem_size)?;
    instr.imm = read_num(reader, 1)?;
    instr.operands[2] = OperandSpec::ImmU8;
    instr.operand_count = 3;
    Ok(())
}

