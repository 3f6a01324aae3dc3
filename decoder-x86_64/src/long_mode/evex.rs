//! `evex`-prefixed decoding: the `62` payload, opmask/zeroing, broadcast
//! memory operands, embedded rounding and `disp8*N` compression.

use super::*;

pub(super) fn read_evex(reader: &mut Reader, instr: &mut Instruction) -> Result<(), ErrorKind> {
    let p0 = reader.next().ok_or(ErrorKind::ExhaustedInput)?;
    let p1 = reader.next().ok_or(ErrorKind::ExhaustedInput)?;
    let p2 = reader.next().ok_or(ErrorKind::ExhaustedInput)?;

    // p0[3:2] must be clear and p1[2] set, or the whole thing is undefined
    if p0 & 0b0000_1100 != 0 || p1 & 0b0000_0100 == 0 {
        return Err(ErrorKind::InvalidOpcode);
    }
    let map = p0 & 0b11;
    if map == 0 {
        return Err(ErrorKind::InvalidOpcode);
    }
    instr.prefixes.evex_from(p0, p1, p2);

    let pp = p1 & 0b11;
    // vvvv and v' arrive inverted; fold them into one five-bit number
    let vvvvv = ((((p2 >> 3) & 1) << 4) | ((p1 >> 3) & 0xf)) ^ 0b11111;
    // r and r' extend modrm.rrr to 0..31, also inverted
    let r_ext = (if p0 & 0x80 == 0 { 8 } else { 0 }) + (if p0 & 0x10 == 0 { 16 } else { 0 });

    let opc = reader.next().ok_or(ErrorKind::ExhaustedInput)?;
    read_evex_instruction(reader, instr, map, pp, opc, vvvvv, r_ext)
}

/// How an op treats `evex.b` on a register-register form.
#[derive(Copy, Clone, PartialEq)]
enum Rounding {
    /// `b` on registers is an invalid encoding.
    Deny,
    /// `b` selects an embedded rounding mode out of `l'l`.
    Embedded,
    /// `b` only suppresses exceptions; there is no rounding to pick.
    SaeOnly,
}

fn evex_bank(lp: u8) -> Result<RegisterBank, ErrorKind> {
    match lp {
        0b00 => Ok(RegisterBank::X),
        0b01 => Ok(RegisterBank::Y),
        0b10 => Ok(RegisterBank::Z),
        _ => Err(ErrorKind::InvalidOperand),
    }
}

fn vector_bytes(bank: RegisterBank) -> u8 {
    match bank {
        RegisterBank::X => 16,
        RegisterBank::Y => 32,
        _ => 64,
    }
}

fn deny_vvvvv(vvvvv: u8) -> Result<(), ErrorKind> {
    if vvvvv != 0 {
        Err(ErrorKind::InvalidOperand)
    } else {
        Ok(())
    }
}

fn deny_mask(instr: &Instruction) -> Result<(), ErrorKind> {
    if instr.prefixes.evex_data.mask_reg() != 0 || instr.prefixes.evex_data.zeroing() {
        Err(ErrorKind::InvalidOperand)
    } else {
        Ok(())
    }
}

fn deny_broadcast(instr: &Instruction) -> Result<(), ErrorKind> {
    if instr.prefixes.evex_data.broadcast() {
        Err(ErrorKind::InvalidOperand)
    } else {
        Ok(())
    }
}

/// the mask selector, after checking that zeroing has a mask to zero by.
fn checked_mask(instr: &Instruction) -> Result<u8, ErrorKind> {
    let aaa = instr.prefixes.evex_data.mask_reg();
    if aaa == 0 && instr.prefixes.evex_data.zeroing() {
        return Err(ErrorKind::InvalidOperand);
    }
    Ok(aaa)
}

/// mask a destination, rejecting zeroing into memory.
fn masked_dest(instr: &Instruction, spec: OperandSpec) -> Result<OperandSpec, ErrorKind> {
    let aaa = checked_mask(instr)?;
    if aaa == 0 {
        return Ok(spec);
    }
    if spec.is_memory() && instr.prefixes.evex_data.zeroing() {
        return Err(ErrorKind::InvalidOperand);
    }
    Ok(spec.masked())
}

/// scale a compressed `disp8` by the element/access size it is counted in.
fn apply_disp_scale(instr: &mut Instruction, scale: u8) {
    if instr.prefixes.compressed_disp() {
        instr.disp = ((instr.disp as i64).wrapping_mul(scale as i64)) as u64;
        instr.prefixes.apply_compressed_disp(false);
    }
}

/// `op G, V, E`: the three-operand shape shared by most of the avx512 set.
///
/// `bcast` is the element size a broadcast load reads, if the op can
/// broadcast at all; `scalar` pins the banks to xmm and the memory width to
/// the element.
#[allow(clippy::too_many_arguments)]
fn read_gve(
    reader: &mut Reader,
    instr: &mut Instruction,
    vvvvv: u8,
    r_ext: u8,
    op: Opcode,
    bcast: Option<u8>,
    scalar: Option<u8>,
    rounding: Rounding,
) -> Result<(), ErrorKind> {
    instr.opcode = op;
    let aaa = checked_mask(instr)?;
    let b = instr.prefixes.evex_data.broadcast();
    let modrm = read_modrm(reader)?;
    let mod3 = modrm >= 0b11000000;

    let mut bank = match scalar {
        Some(_) => RegisterBank::X,
        None => evex_bank(instr.prefixes.evex_data.lp())?,
    };
    let dest = if b && mod3 {
        match rounding {
            Rounding::Deny => return Err(ErrorKind::InvalidOperand),
            Rounding::Embedded => {
                if scalar.is_none() {
                    bank = RegisterBank::Z;
                }
                OperandSpec::RegRRR_maskmerge_sae
            }
            Rounding::SaeOnly => {
                if scalar.is_none() {
                    bank = RegisterBank::Z;
                }
                OperandSpec::RegRRR_maskmerge_sae_noround
            }
        }
    } else if aaa != 0 {
        OperandSpec::RegRRR_maskmerge
    } else {
        OperandSpec::RegRRR
    };

    instr.regs[0] = RegSpec { num: ((modrm >> 3) & 7) + r_ext, bank };
    instr.regs[3] = RegSpec { num: vvvvv, bank };
    let e = read_E_vec(reader, instr, modrm, bank)?;
    if e.is_memory() {
        let size = if b {
            bcast.ok_or(ErrorKind::InvalidOperand)?
        } else {
            scalar.unwrap_or_else(|| vector_bytes(bank))
        };
        instr.mem_size = size;
        apply_disp_scale(instr, size);
    }
    instr.operands[0] = dest;
    instr.operands[1] = OperandSpec::RegVex;
    instr.operands[2] = e;
    instr.operand_count = 3;
    Ok(())
}

/// `op G, E`: two-operand loads, no vvvv operand.
fn read_ge(
    reader: &mut Reader,
    instr: &mut Instruction,
    vvvvv: u8,
    r_ext: u8,
    op: Opcode,
    scalar: Option<u8>,
    rounding: Rounding,
) -> Result<(), ErrorKind> {
    deny_vvvvv(vvvvv)?;
    instr.opcode = op;
    let aaa = checked_mask(instr)?;
    let b = instr.prefixes.evex_data.broadcast();
    let modrm = read_modrm(reader)?;
    let mod3 = modrm >= 0b11000000;

    let mut bank = match scalar {
        Some(_) => RegisterBank::X,
        None => evex_bank(instr.prefixes.evex_data.lp())?,
    };
    let dest = if b {
        if !mod3 {
            return Err(ErrorKind::InvalidOperand);
        }
        match rounding {
            Rounding::Deny => return Err(ErrorKind::InvalidOperand),
            Rounding::Embedded => {
                if scalar.is_none() {
                    bank = RegisterBank::Z;
                }
                OperandSpec::RegRRR_maskmerge_sae
            }
            Rounding::SaeOnly => {
                if scalar.is_none() {
                    bank = RegisterBank::Z;
                }
                OperandSpec::RegRRR_maskmerge_sae_noround
            }
        }
    } else if aaa != 0 {
        OperandSpec::RegRRR_maskmerge
    } else {
        OperandSpec::RegRRR
    };

    instr.regs[0] = RegSpec { num: ((modrm >> 3) & 7) + r_ext, bank };
    let e = read_E_vec(reader, instr, modrm, bank)?;
    if e.is_memory() {
        let size = scalar.unwrap_or_else(|| vector_bytes(bank));
        instr.mem_size = size;
        apply_disp_scale(instr, size);
    }
    instr.operands[0] = dest;
    instr.operands[1] = e;
    instr.operand_count = 2;
    Ok(())
}

/// `op E, G`: the store direction of [`read_ge`]; the mask rides on the
/// destination, memory included.
fn read_eg(
    reader: &mut Reader,
    instr: &mut Instruction,
    vvvvv: u8,
    r_ext: u8,
    op: Opcode,
    scalar: Option<u8>,
) -> Result<(), ErrorKind> {
    deny_vvvvv(vvvvv)?;
    deny_broadcast(instr)?;
    instr.opcode = op;
    let modrm = read_modrm(reader)?;
    let bank = match scalar {
        Some(_) => RegisterBank::X,
        None => evex_bank(instr.prefixes.evex_data.lp())?,
    };
    instr.regs[0] = RegSpec { num: ((modrm >> 3) & 7) + r_ext, bank };
    let e = read_E_vec(reader, instr, modrm, bank)?;
    if e.is_memory() {
        let size = scalar.unwrap_or_else(|| vector_bytes(bank));
        instr.mem_size = size;
        apply_disp_scale(instr, size);
    }
    instr.operands[0] = masked_dest(instr, e)?;
    instr.operands[1] = OperandSpec::RegRRR;
    instr.operand_count = 2;
    Ok(())
}

/// `vmovss`/`vmovsd`: three-operand merge between registers, masked
/// load/store against memory.
fn read_vmovs(
    reader: &mut Reader,
    instr: &mut Instruction,
    vvvvv: u8,
    r_ext: u8,
    op: Opcode,
    elem: u8,
    store: bool,
) -> Result<(), ErrorKind> {
    deny_broadcast(instr)?;
    instr.opcode = op;
    let modrm = read_modrm(reader)?;
    instr.regs[0] = RegSpec { num: ((modrm >> 3) & 7) + r_ext, bank: RegisterBank::X };
    instr.regs[3] = RegSpec { num: vvvvv, bank: RegisterBank::X };
    let e = read_E_vec(reader, instr, modrm, RegisterBank::X)?;
    if e.is_memory() {
        deny_vvvvv(vvvvv)?;
        instr.mem_size = elem;
        apply_disp_scale(instr, elem);
        if store {
            instr.operands[0] = masked_dest(instr, e)?;
            instr.operands[1] = OperandSpec::RegRRR;
        } else {
            instr.operands[0] = masked_dest(instr, OperandSpec::RegRRR)?;
            instr.operands[1] = e;
        }
        instr.operand_count = 2;
    } else {
        if store {
            instr.operands[0] = masked_dest(instr, e)?;
            instr.operands[1] = OperandSpec::RegVex;
            instr.operands[2] = OperandSpec::RegRRR;
        } else {
            instr.operands[0] = masked_dest(instr, OperandSpec::RegRRR)?;
            instr.operands[1] = OperandSpec::RegVex;
            instr.operands[2] = e;
        }
        instr.operand_count = 3;
    }
    Ok(())
}

/// `vmovd`/`vmovq` between an xmm register and a gpr or memory.
fn read_gp_mov(
    reader: &mut Reader,
    instr: &mut Instruction,
    vvvvv: u8,
    r_ext: u8,
    store: bool,
) -> Result<(), ErrorKind> {
    deny_vvvvv(vvvvv)?;
    deny_mask(instr)?;
    deny_broadcast(instr)?;
    let width = if instr.prefixes.vex().w() { 8 } else { 4 };
    instr.opcode = if width == 8 { Opcode::VMOVQ } else { Opcode::VMOVD };
    let modrm = read_modrm(reader)?;
    instr.regs[0] = RegSpec { num: ((modrm >> 3) & 7) + r_ext, bank: RegisterBank::X };
    let e = read_E(reader, instr, modrm, width)?;
    if e.is_memory() {
        instr.mem_size = width;
        apply_disp_scale(instr, width);
    }
    if store {
        instr.operands[0] = e;
        instr.operands[1] = OperandSpec::RegRRR;
    } else {
        instr.operands[0] = OperandSpec::RegRRR;
        instr.operands[1] = e;
    }
    instr.operand_count = 2;
    Ok(())
}

/// `vbroadcastss`-shaped: full-width destination, element source.
fn read_broadcast(
    reader: &mut Reader,
    instr: &mut Instruction,
    vvvvv: u8,
    r_ext: u8,
    op: Opcode,
    elem: u8,
) -> Result<(), ErrorKind> {
    deny_vvvvv(vvvvv)?;
    deny_broadcast(instr)?;
    instr.opcode = op;
    let aaa = checked_mask(instr)?;
    let bank = evex_bank(instr.prefixes.evex_data.lp())?;
    let modrm = read_modrm(reader)?;
    instr.regs[0] = RegSpec { num: ((modrm >> 3) & 7) + r_ext, bank };
    let e = read_E_vec(reader, instr, modrm, RegisterBank::X)?;
    if e.is_memory() {
        instr.mem_size = elem;
        apply_disp_scale(instr, elem);
    }
    instr.operands[0] = if aaa != 0 {
        OperandSpec::RegRRR_maskmerge
    } else {
        OperandSpec::RegRRR
    };
    instr.operands[1] = e;
    instr.operand_count = 2;
    Ok(())
}

/// `vexpand`/`vcompress`: element-counted compressed displacement in either
/// direction.
fn read_expand(
    reader: &mut Reader,
    instr: &mut Instruction,
    vvvvv: u8,
    r_ext: u8,
    op: Opcode,
    elem: u8,
    store: bool,
) -> Result<(), ErrorKind> {
    deny_vvvvv(vvvvv)?;
    deny_broadcast(instr)?;
    instr.opcode = op;
    let bank = evex_bank(instr.prefixes.evex_data.lp())?;
    let modrm = read_modrm(reader)?;
    instr.regs[0] = RegSpec { num: ((modrm >> 3) & 7) + r_ext, bank };
    let e = read_E_vec(reader, instr, modrm, bank)?;
    if e.is_memory() {
        instr.mem_size = elem;
        apply_disp_scale(instr, elem);
    }
    if store {
        instr.operands[0] = masked_dest(instr, e)?;
        instr.operands[1] = OperandSpec::RegRRR;
    } else {
        instr.operands[0] = masked_dest(instr, OperandSpec::RegRRR)?;
        instr.operands[1] = e;
    }
    instr.operand_count = 2;
    Ok(())
}

/// `vcmp*`: compare into a mask register, with an imm8 predicate.
fn read_vcmp(
    reader: &mut Reader,
    instr: &mut Instruction,
    vvvvv: u8,
    op: Opcode,
    bcast: Option<u8>,
    scalar: Option<u8>,
) -> Result<(), ErrorKind> {
    instr.opcode = op;
    let aaa = checked_mask(instr)?;
    let b = instr.prefixes.evex_data.broadcast();
    let modrm = read_modrm(reader)?;
    let mod3 = modrm >= 0b11000000;

    let mut bank = match scalar {
        Some(_) => RegisterBank::X,
        None => evex_bank(instr.prefixes.evex_data.lp())?,
    };
    let dest = if b && mod3 {
        if scalar.is_none() {
            bank = RegisterBank::Z;
        }
        OperandSpec::RegRRR_maskmerge_sae_noround
    } else if aaa != 0 {
        OperandSpec::RegRRR_maskmerge
    } else {
        OperandSpec::RegRRR
    };

    instr.regs[0] = RegSpec { num: (modrm >> 3) & 7, bank: RegisterBank::K };
    instr.regs[3] = RegSpec { num: vvvvv, bank };
    let e = read_E_vec(reader, instr, modrm, bank)?;
    if e.is_memory() {
        let size = if b {
            bcast.ok_or(ErrorKind::InvalidOperand)?
        } else {
            scalar.unwrap_or_else(|| vector_bytes(bank))
        };
        instr.mem_size = size;
        apply_disp_scale(instr, size);
    }
    instr.operands[0] = dest;
    instr.operands[1] = OperandSpec::RegVex;
    instr.operands[2] = e;
    instr.operand_count = 3;
    read_imm_u8(reader, instr)
}

#[allow(clippy::too_many_arguments)]
fn read_evex_instruction(
    reader: &mut Reader,
    instr: &mut Instruction,
    map: u8,
    pp: u8,
    opc: u8,
    vvvvv: u8,
    r_ext: u8,
) -> Result<(), ErrorKind> {
    let w = instr.prefixes.vex().w();
    match map {
        1 => match (opc, pp) {
            (0x10, 0b00) => {
                read_ge(reader, instr, vvvvv, r_ext, Opcode::VMOVUPS, None, Rounding::Deny)
            }
            (0x10, 0b01) => {
                read_ge(reader, instr, vvvvv, r_ext, Opcode::VMOVUPD, None, Rounding::Deny)
            }
            (0x10, 0b10) => read_vmovs(reader, instr, vvvvv, r_ext, Opcode::VMOVSS, 4, false),
            (0x10, 0b11) => read_vmovs(reader, instr, vvvvv, r_ext, Opcode::VMOVSD, 8, false),
            (0x11, 0b00) => read_eg(reader, instr, vvvvv, r_ext, Opcode::VMOVUPS, None),
            (0x11, 0b01) => read_eg(reader, instr, vvvvv, r_ext, Opcode::VMOVUPD, None),
            (0x11, 0b10) => read_vmovs(reader, instr, vvvvv, r_ext, Opcode::VMOVSS, 4, true),
            (0x11, 0b11) => read_vmovs(reader, instr, vvvvv, r_ext, Opcode::VMOVSD, 8, true),
            (0x28, 0b00) => {
                read_ge(reader, instr, vvvvv, r_ext, Opcode::VMOVAPS, None, Rounding::Deny)
            }
            (0x28, 0b01) => {
                read_ge(reader, instr, vvvvv, r_ext, Opcode::VMOVAPD, None, Rounding::Deny)
            }
            (0x29, 0b00) => read_eg(reader, instr, vvvvv, r_ext, Opcode::VMOVAPS, None),
            (0x29, 0b01) => read_eg(reader, instr, vvvvv, r_ext, Opcode::VMOVAPD, None),
            (0x51, 0b00) => read_ge(
                reader,
                instr,
                vvvvv,
                r_ext,
                Opcode::VSQRTPS,
                None,
                Rounding::Embedded,
            ),
            (0x51, 0b01) => read_ge(
                reader,
                instr,
                vvvvv,
                r_ext,
                Opcode::VSQRTPD,
                None,
                Rounding::Embedded,
            ),
            (0x51, 0b10) => read_gve(
                reader,
                instr,
                vvvvv,
                r_ext,
                Opcode::VSQRTSS,
                None,
                Some(4),
                Rounding::Embedded,
            ),
            (0x51, 0b11) => read_gve(
                reader,
                instr,
                vvvvv,
                r_ext,
                Opcode::VSQRTSD,
                None,
                Some(8),
                Rounding::Embedded,
            ),
            (0x54..=0x57, 0b00 | 0b01) => {
                let op = match (opc, pp) {
                    (0x54, 0b00) => Opcode::VANDPS,
                    (0x54, _) => Opcode::VANDPD,
                    (0x55, 0b00) => Opcode::VANDNPS,
                    (0x55, _) => Opcode::VANDNPD,
                    (0x56, 0b00) => Opcode::VORPS,
                    (0x56, _) => Opcode::VORPD,
                    (_, 0b00) => Opcode::VXORPS,
                    _ => Opcode::VXORPD,
                };
                let elem = if pp == 0b00 { 4 } else { 8 };
                read_gve(reader, instr, vvvvv, r_ext, op, Some(elem), None, Rounding::Deny)
            }
            (0x58 | 0x59 | 0x5c..=0x5f, _) => {
                let ops = match opc {
                    0x58 => [Opcode::VADDPS, Opcode::VADDPD, Opcode::VADDSS, Opcode::VADDSD],
                    0x59 => [Opcode::VMULPS, Opcode::VMULPD, Opcode::VMULSS, Opcode::VMULSD],
                    0x5c => [Opcode::VSUBPS, Opcode::VSUBPD, Opcode::VSUBSS, Opcode::VSUBSD],
                    0x5d => [Opcode::VMINPS, Opcode::VMINPD, Opcode::VMINSS, Opcode::VMINSD],
                    0x5e => [Opcode::VDIVPS, Opcode::VDIVPD, Opcode::VDIVSS, Opcode::VDIVSD],
                    _ => [Opcode::VMAXPS, Opcode::VMAXPD, Opcode::VMAXSS, Opcode::VMAXSD],
                };
                // min/max only ever suppress exceptions; the rest round
                let rounding = if opc == 0x5d || opc == 0x5f {
                    Rounding::SaeOnly
                } else {
                    Rounding::Embedded
                };
                match pp {
                    0b00 => {
                        read_gve(reader, instr, vvvvv, r_ext, ops[0], Some(4), None, rounding)
                    }
                    0b01 => {
                        read_gve(reader, instr, vvvvv, r_ext, ops[1], Some(8), None, rounding)
                    }
                    0b10 => {
                        read_gve(reader, instr, vvvvv, r_ext, ops[2], None, Some(4), rounding)
                    }
                    _ => read_gve(reader, instr, vvvvv, r_ext, ops[3], None, Some(8), rounding),
                }
            }
            (0x6e, 0b01) => read_gp_mov(reader, instr, vvvvv, r_ext, false),
            (0x6f | 0x7f, 0b01 | 0b10 | 0b11) => {
                let op = match (pp, w) {
                    (0b01, false) => Opcode::VMOVDQA32,
                    (0b01, true) => Opcode::VMOVDQA64,
                    (0b10, false) => Opcode::VMOVDQU32,
                    (0b10, true) => Opcode::VMOVDQU64,
                    (_, false) => Opcode::VMOVDQU8,
                    (_, true) => Opcode::VMOVDQU16,
                };
                if opc == 0x6f {
                    read_ge(reader, instr, vvvvv, r_ext, op, None, Rounding::Deny)
                } else {
                    read_eg(reader, instr, vvvvv, r_ext, op, None)
                }
            }
            (0x7e, 0b10) => {
                deny_mask(instr)?;
                read_ge(reader, instr, vvvvv, r_ext, Opcode::VMOVQ, Some(8), Rounding::Deny)
            }
            (0x7e, 0b01) => read_gp_mov(reader, instr, vvvvv, r_ext, true),
            (0xc2, 0b00) => read_vcmp(reader, instr, vvvvv, Opcode::VCMPPS, Some(4), None),
            (0xc2, 0b01) => read_vcmp(reader, instr, vvvvv, Opcode::VCMPPD, Some(8), None),
            (0xc2, 0b10) => read_vcmp(reader, instr, vvvvv, Opcode::VCMPSS, None, Some(4)),
            (0xc2, 0b11) => read_vcmp(reader, instr, vvvvv, Opcode::VCMPSD, None, Some(8)),
            (0xd4, 0b01) => read_gve(
                reader,
                instr,
                vvvvv,
                r_ext,
                Opcode::VPADDQ,
                Some(8),
                None,
                Rounding::Deny,
            ),
            (0xd6, 0b01) => {
                deny_mask(instr)?;
                read_eg(reader, instr, vvvvv, r_ext, Opcode::VMOVQ, Some(8))
            }
            (0xdb | 0xeb | 0xef, 0b01) => {
                let op = match (opc, w) {
                    (0xdb, false) => Opcode::VPANDD,
                    (0xdb, true) => Opcode::VPANDQ,
                    (0xeb, false) => Opcode::VPORD,
                    (0xeb, true) => Opcode::VPORQ,
                    (_, false) => Opcode::VPXORD,
                    _ => Opcode::VPXORQ,
                };
                let elem = if w { 8 } else { 4 };
                read_gve(reader, instr, vvvvv, r_ext, op, Some(elem), None, Rounding::Deny)
            }
            (0xfa, 0b01) => read_gve(
                reader,
                instr,
                vvvvv,
                r_ext,
                Opcode::VPSUBD,
                Some(4),
                None,
                Rounding::Deny,
            ),
            (0xfb, 0b01) => read_gve(
                reader,
                instr,
                vvvvv,
                r_ext,
                Opcode::VPSUBQ,
                Some(8),
                None,
                Rounding::Deny,
            ),
            (0xfe, 0b01) => read_gve(
                reader,
                instr,
                vvvvv,
                r_ext,
                Opcode::VPADDD,
                Some(4),
                None,
                Rounding::Deny,
            ),
            _ => Err(ErrorKind::InvalidOpcode),
        },
        2 => match (opc, pp) {
            (0x18, 0b01) => read_broadcast(reader, instr, vvvvv, r_ext, Opcode::VBROADCASTSS, 4),
            (0x19, 0b01) => read_broadcast(reader, instr, vvvvv, r_ext, Opcode::VBROADCASTSD, 8),
            (0x40, 0b01) => {
                let (op, elem) = if w { (Opcode::VPMULLQ, 8) } else { (Opcode::VPMULLD, 4) };
                read_gve(reader, instr, vvvvv, r_ext, op, Some(elem), None, Rounding::Deny)
            }
            (0x58, 0b01) => read_broadcast(reader, instr, vvvvv, r_ext, Opcode::VPBROADCASTD, 4),
            (0x59, 0b01) => read_broadcast(reader, instr, vvvvv, r_ext, Opcode::VPBROADCASTQ, 8),
            (0x88, 0b01) => {
                let (op, elem) =
                    if w { (Opcode::VEXPANDPD, 8) } else { (Opcode::VEXPANDPS, 4) };
                read_expand(reader, instr, vvvvv, r_ext, op, elem, false)
            }
            (0x8a, 0b01) => {
                let (op, elem) =
                    if w { (Opcode::VCOMPRESSPD, 8) } else { (Opcode::VCOMPRESSPS, 4) };
                read_expand(reader, instr, vvvvv, r_ext, op, elem, true)
            }
            _ => Err(ErrorKind::InvalidOpcode),
        },
        _ => match (opc, pp) {
            (0x03, 0b01) => {
                let (op, elem) = if w { (Opcode::VALIGNQ, 8) } else { (Opcode::VALIGND, 4) };
                read_gve(reader, instr, vvvvv, r_ext, op, Some(elem), None, Rounding::Deny)?;
                read_imm_u8(reader, instr)
            }
            _ => Err(ErrorKind::InvalidOpcode),
        },
    }
}
