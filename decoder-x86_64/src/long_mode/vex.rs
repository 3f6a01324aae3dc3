//! `vex`-prefixed decoding: the `c5`/`c4` payloads, the avx forms of the sse
//! set, and the bmi1/bmi2 gpr extensions.

use super::*;

pub(super) fn two_byte_vex(reader: &mut Reader, instr: &mut Instruction) -> Result<(), ErrorKind> {
    let p = reader.next().ok_or(ErrorKind::ExhaustedInput)?;
    instr.prefixes.vex_from_c5(p);
    let vvvv = ((p >> 3) & 0xf) ^ 0xf;
    read_vex_instruction(reader, instr, 1, vvvv, p & 3)
}

pub(super) fn three_byte_vex(
    reader: &mut Reader,
    instr: &mut Instruction,
) -> Result<(), ErrorKind> {
    let p1 = reader.next().ok_or(ErrorKind::ExhaustedInput)?;
    let p2 = reader.next().ok_or(ErrorKind::ExhaustedInput)?;
    instr.prefixes.vex_from_c4(p1, p2);
    let vvvv = ((p2 >> 3) & 0xf) ^ 0xf;
    read_vex_instruction(reader, instr, p1 & 0x1f, vvvv, p2 & 3)
}

fn deny_vvvv(vvvv: u8) -> Result<(), ErrorKind> {
    if vvvv != 0 {
        Err(ErrorKind::InvalidOperand)
    } else {
        Ok(())
    }
}

/// `op G, V, E` over the vector bank `l` selects.
fn read_gve(
    reader: &mut Reader,
    instr: &mut Instruction,
    vvvv: u8,
    op: Opcode,
    bank: RegisterBank,
    mem_size: u8,
) -> Result<(), ErrorKind> {
    instr.opcode = op;
    let modrm = read_modrm(reader)?;
    read_G_vec(instr, modrm, bank);
    instr.regs[3] = RegSpec { num: vvvv, bank };
    let e = read_E_vec(reader, instr, modrm, bank)?;
    if e.is_memory() {
        instr.mem_size = mem_size;
    }
    instr.operands[0] = OperandSpec::RegRRR;
    instr.operands[1] = OperandSpec::RegVex;
    instr.operands[2] = e;
    instr.operand_count = 3;
    Ok(())
}

/// `op G, E`; no vvvv operand, so a set vvvv is an invalid encoding.
fn read_ge(
    reader: &mut Reader,
    instr: &mut Instruction,
    vvvv: u8,
    op: Opcode,
    bank: RegisterBank,
    mem_size: u8,
) -> Result<(), ErrorKind> {
    deny_vvvv(vvvv)?;
    instr.opcode = op;
    let modrm = read_modrm(reader)?;
    read_G_vec(instr, modrm, bank);
    let e = read_E_vec(reader, instr, modrm, bank)?;
    if e.is_memory() {
        instr.mem_size = mem_size;
    }
    instr.operands[0] = OperandSpec::RegRRR;
    instr.operands[1] = e;
    instr.operand_count = 2;
    Ok(())
}

/// `op E, G`, the store direction of [`read_ge`].
fn read_eg(
    reader: &mut Reader,
    instr: &mut Instruction,
    vvvv: u8,
    op: Opcode,
    bank: RegisterBank,
    mem_size: u8,
) -> Result<(), ErrorKind> {
    deny_vvvv(vvvv)?;
    instr.opcode = op;
    let modrm = read_modrm(reader)?;
    read_G_vec(instr, modrm, bank);
    let e = read_E_vec(reader, instr, modrm, bank)?;
    if e.is_memory() {
        instr.mem_size = mem_size;
    }
    instr.operands[0] = e;
    instr.operands[1] = OperandSpec::RegRRR;
    instr.operand_count = 2;
    Ok(())
}

/// `vbroadcast`-shaped: destination takes the full vector bank, the source
/// stays an xmm reg or an element-sized load.
fn read_broadcast(
    reader: &mut Reader,
    instr: &mut Instruction,
    vvvv: u8,
    op: Opcode,
    bank: RegisterBank,
    mem_size: u8,
) -> Result<(), ErrorKind> {
    deny_vvvv(vvvv)?;
    instr.opcode = op;
    let modrm = read_modrm(reader)?;
    read_G_vec(instr, modrm, bank);
    let e = read_E_vec(reader, instr, modrm, RegisterBank::X)?;
    if e.is_memory() {
        instr.mem_size = mem_size;
    }
    instr.operands[0] = OperandSpec::RegRRR;
    instr.operands[1] = e;
    instr.operand_count = 2;
    Ok(())
}

/// `vmovss`/`vmovsd`: a three-operand merge between registers, a plain
/// load/store against memory.
fn read_vmovs(
    reader: &mut Reader,
    instr: &mut Instruction,
    vvvv: u8,
    op: Opcode,
    mem_size: u8,
    store: bool,
) -> Result<(), ErrorKind> {
    instr.opcode = op;
    let modrm = read_modrm(reader)?;
    read_G_vec(instr, modrm, RegisterBank::X);
    instr.regs[3] = RegSpec { num: vvvv, bank: RegisterBank::X };
    let e = read_E_vec(reader, instr, modrm, RegisterBank::X)?;
    if e.is_memory() {
        deny_vvvv(vvvv)?;
        instr.mem_size = mem_size;
        if store {
            instr.operands[0] = e;
            instr.operands[1] = OperandSpec::RegRRR;
        } else {
            instr.operands[0] = OperandSpec::RegRRR;
            instr.operands[1] = e;
        }
        instr.operand_count = 2;
    } else {
        if store {
            instr.operands[0] = e;
            instr.operands[1] = OperandSpec::RegVex;
            instr.operands[2] = OperandSpec::RegRRR;
        } else {
            instr.operands[0] = OperandSpec::RegRRR;
            instr.operands[1] = OperandSpec::RegVex;
            instr.operands[2] = e;
        }
        instr.operand_count = 3;
    }
    Ok(())
}

/// a bmi op over 32- or 64-bit gprs, in one of its three operand shapes.
enum BmiShape {
    /// `op G, V, E`
    Gve,
    /// `op G, E, V`
    Gev,
    /// `op V, E`
    Ve,
}

fn read_bmi(
    reader: &mut Reader,
    instr: &mut Instruction,
    vvvv: u8,
    op: Opcode,
    shape: BmiShape,
) -> Result<(), ErrorKind> {
    instr.opcode = op;
    let width = if instr.prefixes.vex().w() { 8 } else { 4 };
    let bank = width_to_gp_reg_bank(width, false);
    let modrm = read_modrm(reader)?;
    read_G(instr, modrm, width);
    instr.regs[3] = RegSpec { num: vvvv, bank };
    let e = read_E(reader, instr, modrm, width)?;
    if e.is_memory() {
        instr.mem_size = width;
    }
    match shape {
        BmiShape::Gve => {
            instr.operands[0] = OperandSpec::RegRRR;
            instr.operands[1] = OperandSpec::RegVex;
            instr.operands[2] = e;
            instr.operand_count = 3;
        }
        BmiShape::Gev => {
            instr.operands[0] = OperandSpec::RegRRR;
            instr.operands[1] = e;
            instr.operands[2] = OperandSpec::RegVex;
            instr.operand_count = 3;
        }
        BmiShape::Ve => {
            instr.operands[0] = OperandSpec::RegVex;
            instr.operands[1] = e;
            instr.operand_count = 2;
        }
    }
    Ok(())
}

fn read_vex_instruction(
    reader: &mut Reader,
    instr: &mut Instruction,
    map: u8,
    vvvv: u8,
    pp: u8,
) -> Result<(), ErrorKind> {
    let opc = reader.next().ok_or(ErrorKind::ExhaustedInput)?;
    let l = instr.prefixes.vex().l();
    let bank = if l { RegisterBank::Y } else { RegisterBank::X };
    let psize = if l { 32 } else { 16 };

    match map {
        1 => match (opc, pp) {
            (0x10, 0b00) => read_ge(reader, instr, vvvv, Opcode::VMOVUPS, bank, psize),
            (0x10, 0b01) => read_ge(reader, instr, vvvv, Opcode::VMOVUPD, bank, psize),
            (0x10, 0b10) => read_vmovs(reader, instr, vvvv, Opcode::VMOVSS, 4, false),
            (0x10, 0b11) => read_vmovs(reader, instr, vvvv, Opcode::VMOVSD, 8, false),
            (0x11, 0b00) => read_eg(reader, instr, vvvv, Opcode::VMOVUPS, bank, psize),
            (0x11, 0b01) => read_eg(reader, instr, vvvv, Opcode::VMOVUPD, bank, psize),
            (0x11, 0b10) => read_vmovs(reader, instr, vvvv, Opcode::VMOVSS, 4, true),
            (0x11, 0b11) => read_vmovs(reader, instr, vvvv, Opcode::VMOVSD, 8, true),
            (0x28, 0b00) => read_ge(reader, instr, vvvv, Opcode::VMOVAPS, bank, psize),
            (0x28, 0b01) => read_ge(reader, instr, vvvv, Opcode::VMOVAPD, bank, psize),
            (0x29, 0b00) => read_eg(reader, instr, vvvv, Opcode::VMOVAPS, bank, psize),
            (0x29, 0b01) => read_eg(reader, instr, vvvv, Opcode::VMOVAPD, bank, psize),
            (0x2e, 0b00) => read_ge(reader, instr, vvvv, Opcode::VUCOMISS, RegisterBank::X, 4),
            (0x2e, 0b01) => read_ge(reader, instr, vvvv, Opcode::VUCOMISD, RegisterBank::X, 8),
            (0x2f, 0b00) => read_ge(reader, instr, vvvv, Opcode::VCOMISS, RegisterBank::X, 4),
            (0x2f, 0b01) => read_ge(reader, instr, vvvv, Opcode::VCOMISD, RegisterBank::X, 8),
            (0x51, 0b00) => read_ge(reader, instr, vvvv, Opcode::VSQRTPS, bank, psize),
            (0x51, 0b01) => read_ge(reader, instr, vvvv, Opcode::VSQRTPD, bank, psize),
            (0x51, 0b10) => read_gve(reader, instr, vvvv, Opcode::VSQRTSS, RegisterBank::X, 4),
            (0x51, 0b11) => read_gve(reader, instr, vvvv, Opcode::VSQRTSD, RegisterBank::X, 8),
            (0x54, 0b00) => read_gve(reader, instr, vvvv, Opcode::VANDPS, bank, psize),
            (0x54, 0b01) => read_gve(reader, instr, vvvv, Opcode::VANDPD, bank, psize),
            (0x55, 0b00) => read_gve(reader, instr, vvvv, Opcode::VANDNPS, bank, psize),
            (0x55, 0b01) => read_gve(reader, instr, vvvv, Opcode::VANDNPD, bank, psize),
            (0x56, 0b00) => read_gve(reader, instr, vvvv, Opcode::VORPS, bank, psize),
            (0x56, 0b01) => read_gve(reader, instr, vvvv, Opcode::VORPD, bank, psize),
            (0x57, 0b00) => read_gve(reader, instr, vvvv, Opcode::VXORPS, bank, psize),
            (0x57, 0b01) => read_gve(reader, instr, vvvv, Opcode::VXORPD, bank, psize),
            (0x58, 0b00) => read_gve(reader, instr, vvvv, Opcode::VADDPS, bank, psize),
            (0x58, 0b01) => read_gve(reader, instr, vvvv, Opcode::VADDPD, bank, psize),
            (0x58, 0b10) => read_gve(reader, instr, vvvv, Opcode::VADDSS, RegisterBank::X, 4),
            (0x58, 0b11) => read_gve(reader, instr, vvvv, Opcode::VADDSD, RegisterBank::X, 8),
            (0x59, 0b00) => read_gve(reader, instr, vvvv, Opcode::VMULPS, bank, psize),
            (0x59, 0b01) => read_gve(reader, instr, vvvv, Opcode::VMULPD, bank, psize),
            (0x59, 0b10) => read_gve(reader, instr, vvvv, Opcode::VMULSS, RegisterBank::X, 4),
            (0x59, 0b11) => read_gve(reader, instr, vvvv, Opcode::VMULSD, RegisterBank::X, 8),
            (0x5c, 0b00) => read_gve(reader, instr, vvvv, Opcode::VSUBPS, bank, psize),
            (0x5c, 0b01) => read_gve(reader, instr, vvvv, Opcode::VSUBPD, bank, psize),
            (0x5c, 0b10) => read_gve(reader, instr, vvvv, Opcode::VSUBSS, RegisterBank::X, 4),
            (0x5c, 0b11) => read_gve(reader, instr, vvvv, Opcode::VSUBSD, RegisterBank::X, 8),
            (0x5d, 0b00) => read_gve(reader, instr, vvvv, Opcode::VMINPS, bank, psize),
            (0x5d, 0b01) => read_gve(reader, instr, vvvv, Opcode::VMINPD, bank, psize),
            (0x5d, 0b10) => read_gve(reader, instr, vvvv, Opcode::VMINSS, RegisterBank::X, 4),
            (0x5d, 0b11) => read_gve(reader, instr, vvvv, Opcode::VMINSD, RegisterBank::X, 8),
            (0x5e, 0b00) => read_gve(reader, instr, vvvv, Opcode::VDIVPS, bank, psize),
            (0x5e, 0b01) => read_gve(reader, instr, vvvv, Opcode::VDIVPD, bank, psize),
            (0x5e, 0b10) => read_gve(reader, instr, vvvv, Opcode::VDIVSS, RegisterBank::X, 4),
            (0x5e, 0b11) => read_gve(reader, instr, vvvv, Opcode::VDIVSD, RegisterBank::X, 8),
            (0x5f, 0b00) => read_gve(reader, instr, vvvv, Opcode::VMAXPS, bank, psize),
            (0x5f, 0b01) => read_gve(reader, instr, vvvv, Opcode::VMAXPD, bank, psize),
            (0x5f, 0b10) => read_gve(reader, instr, vvvv, Opcode::VMAXSS, RegisterBank::X, 4),
            (0x5f, 0b11) => read_gve(reader, instr, vvvv, Opcode::VMAXSD, RegisterBank::X, 8),
            (0x6e, 0b01) => {
                deny_vvvv(vvvv)?;
                let width = if instr.prefixes.vex().w() { 8 } else { 4 };
                instr.opcode = if width == 8 { Opcode::VMOVQ } else { Opcode::VMOVD };
                let modrm = read_modrm(reader)?;
                read_G_vec(instr, modrm, RegisterBank::X);
                let e = read_E(reader, instr, modrm, width)?;
                if e.is_memory() {
                    instr.mem_size = width;
                }
                instr.operands[0] = OperandSpec::RegRRR;
                instr.operands[1] = e;
                instr.operand_count = 2;
                Ok(())
            }
            (0x6f, 0b01) => read_ge(reader, instr, vvvv, Opcode::VMOVDQA, bank, psize),
            (0x6f, 0b10) => read_ge(reader, instr, vvvv, Opcode::VMOVDQU, bank, psize),
            (0x70, 0b01) => {
                read_ge(reader, instr, vvvv, Opcode::VPSHUFD, bank, psize)?;
                read_imm_u8(reader, instr)
            }
            (0x74, 0b01) => read_gve(reader, instr, vvvv, Opcode::VPCMPEQB, bank, psize),
            (0x75, 0b01) => read_gve(reader, instr, vvvv, Opcode::VPCMPEQW, bank, psize),
            (0x76, 0b01) => read_gve(reader, instr, vvvv, Opcode::VPCMPEQD, bank, psize),
            (0x77, 0b00) => {
                deny_vvvv(vvvv)?;
                instr.opcode = if l { Opcode::VZEROALL } else { Opcode::VZEROUPPER };
                instr.operand_count = 0;
                Ok(())
            }
            (0x7e, 0b01) => {
                deny_vvvv(vvvv)?;
                let width = if instr.prefixes.vex().w() { 8 } else { 4 };
                instr.opcode = if width == 8 { Opcode::VMOVQ } else { Opcode::VMOVD };
                let modrm = read_modrm(reader)?;
                read_G_vec(instr, modrm, RegisterBank::X);
                let e = read_E(reader, instr, modrm, width)?;
                if e.is_memory() {
                    instr.mem_size = width;
                }
                instr.operands[0] = e;
                instr.operands[1] = OperandSpec::RegRRR;
                instr.operand_count = 2;
                Ok(())
            }
            (0x7e, 0b10) => read_ge(reader, instr, vvvv, Opcode::VMOVQ, RegisterBank::X, 8),
            (0x7f, 0b01) => read_eg(reader, instr, vvvv, Opcode::VMOVDQA, bank, psize),
            (0x7f, 0b10) => read_eg(reader, instr, vvvv, Opcode::VMOVDQU, bank, psize),
            (0xc2, _) => {
                let (op, mem_size) = match pp {
                    0b00 => (Opcode::VCMPPS, psize),
                    0b01 => (Opcode::VCMPPD, psize),
                    0b10 => (Opcode::VCMPSS, 4),
                    _ => (Opcode::VCMPSD, 8),
                };
                let b = if pp < 0b10 { bank } else { RegisterBank::X };
                read_gve(reader, instr, vvvv, op, b, mem_size)?;
                read_imm_u8(reader, instr)
            }
            (0xd4, 0b01) => read_gve(reader, instr, vvvv, Opcode::VPADDQ, bank, psize),
            (0xd6, 0b01) => read_eg(reader, instr, vvvv, Opcode::VMOVQ, RegisterBank::X, 8),
            (0xdb, 0b01) => read_gve(reader, instr, vvvv, Opcode::VPAND, bank, psize),
            (0xdf, 0b01) => read_gve(reader, instr, vvvv, Opcode::VPANDN, bank, psize),
            (0xeb, 0b01) => read_gve(reader, instr, vvvv, Opcode::VPOR, bank, psize),
            (0xef, 0b01) => read_gve(reader, instr, vvvv, Opcode::VPXOR, bank, psize),
            (0xf8, 0b01) => read_gve(reader, instr, vvvv, Opcode::VPSUBB, bank, psize),
            (0xf9, 0b01) => read_gve(reader, instr, vvvv, Opcode::VPSUBW, bank, psize),
            (0xfa, 0b01) => read_gve(reader, instr, vvvv, Opcode::VPSUBD, bank, psize),
            (0xfb, 0b01) => read_gve(reader, instr, vvvv, Opcode::VPSUBQ, bank, psize),
            (0xfc, 0b01) => read_gve(reader, instr, vvvv, Opcode::VPADDB, bank, psize),
            (0xfd, 0b01) => read_gve(reader, instr, vvvv, Opcode::VPADDW, bank, psize),
            (0xfe, 0b01) => read_gve(reader, instr, vvvv, Opcode::VPADDD, bank, psize),
            _ => Err(ErrorKind::InvalidOpcode),
        },
        2 => match (opc, pp) {
            (0x00, 0b01) => read_gve(reader, instr, vvvv, Opcode::VPSHUFB, bank, psize),
            (0x17, 0b01) => read_ge(reader, instr, vvvv, Opcode::VPTEST, bank, psize),
            (0x18, 0b01) => read_broadcast(reader, instr, vvvv, Opcode::VBROADCASTSS, bank, 4),
            (0x19, 0b01) => {
                if !l {
                    return Err(ErrorKind::InvalidOperand);
                }
                read_broadcast(reader, instr, vvvv, Opcode::VBROADCASTSD, RegisterBank::Y, 8)
            }
            (0x40, 0b01) => read_gve(reader, instr, vvvv, Opcode::VPMULLD, bank, psize),
            (0x58, 0b01) => read_broadcast(reader, instr, vvvv, Opcode::VPBROADCASTD, bank, 4),
            (0x59, 0b01) => read_broadcast(reader, instr, vvvv, Opcode::VPBROADCASTQ, bank, 8),
            (0xf2, 0b00) => read_bmi(reader, instr, vvvv, Opcode::ANDN, BmiShape::Gve),
            (0xf3, 0b00) => {
                let modrm = reader.next().ok_or(ErrorKind::ExhaustedInput)?;
                let op = match (modrm >> 3) & 7 {
                    1 => Opcode::BLSR,
                    2 => Opcode::BLSMSK,
                    3 => Opcode::BLSI,
                    _ => return Err(ErrorKind::InvalidOpcode),
                };
                // the modrm byte is already consumed; re-dispatch by hand
                instr.opcode = op;
                let width = if instr.prefixes.vex().w() { 8 } else { 4 };
                let bank = width_to_gp_reg_bank(width, false);
                instr.regs[3] = RegSpec { num: vvvv, bank };
                let e = read_E(reader, instr, modrm, width)?;
                if e.is_memory() {
                    instr.mem_size = width;
                }
                instr.operands[0] = OperandSpec::RegVex;
                instr.operands[1] = e;
                instr.operand_count = 2;
                Ok(())
            }
            (0xf5, 0b00) => read_bmi(reader, instr, vvvv, Opcode::BZHI, BmiShape::Gev),
            (0xf5, 0b10) => read_bmi(reader, instr, vvvv, Opcode::PEXT, BmiShape::Gve),
            (0xf5, 0b11) => read_bmi(reader, instr, vvvv, Opcode::PDEP, BmiShape::Gve),
            (0xf6, 0b11) => read_bmi(reader, instr, vvvv, Opcode::MULX, BmiShape::Gve),
            (0xf7, 0b00) => read_bmi(reader, instr, vvvv, Opcode::BEXTR, BmiShape::Gev),
            (0xf7, 0b01) => read_bmi(reader, instr, vvvv, Opcode::SHLX, BmiShape::Gev),
            (0xf7, 0b10) => read_bmi(reader, instr, vvvv, Opcode::SARX, BmiShape::Gev),
            (0xf7, 0b11) => read_bmi(reader, instr, vvvv, Opcode::SHRX, BmiShape::Gev),
            _ => Err(ErrorKind::InvalidOpcode),
        },
        3 => match (opc, pp) {
            (0x08, 0b01) => {
                read_ge(reader, instr, vvvv, Opcode::VROUNDPS, bank, psize)?;
                read_imm_u8(reader, instr)
            }
            (0x09, 0b01) => {
                read_ge(reader, instr, vvvv, Opcode::VROUNDPD, bank, psize)?;
                read_imm_u8(reader, instr)
            }
            (0x0a, 0b01) => {
                read_gve(reader, instr, vvvv, Opcode::VROUNDSS, RegisterBank::X, 4)?;
                read_imm_u8(reader, instr)
            }
            (0x0b, 0b01) => {
                read_gve(reader, instr, vvvv, Opcode::VROUNDSD, RegisterBank::X, 8)?;
                read_imm_u8(reader, instr)
            }
            (0x0f, 0b01) => {
                read_gve(reader, instr, vvvv, Opcode::VPALIGNR, bank, psize)?;
                read_imm_u8(reader, instr)
            }
            (0x18, 0b01) => {
                if !l {
                    return Err(ErrorKind::InvalidOperand);
                }
                instr.opcode = Opcode::VINSERTF128;
                let modrm = read_modrm(reader)?;
                read_G_vec(instr, modrm, RegisterBank::Y);
                instr.regs[3] = RegSpec { num: vvvv, bank: RegisterBank::Y };
                let e = read_E_vec(reader, instr, modrm, RegisterBank::X)?;
                if e.is_memory() {
                    instr.mem_size = 16;
                }
                instr.operands[0] = OperandSpec::RegRRR;
                instr.operands[1] = OperandSpec::RegVex;
                instr.operands[2] = e;
                instr.operand_count = 3;
                read_imm_u8(reader, instr)
            }
            (0x19, 0b01) => {
                if !l {
                    return Err(ErrorKind::InvalidOperand);
                }
                deny_vvvv(vvvv)?;
                instr.opcode = Opcode::VEXTRACTF128;
                let modrm = read_modrm(reader)?;
                read_G_vec(instr, modrm, RegisterBank::Y);
                let e = read_E_vec(reader, instr, modrm, RegisterBank::X)?;
                if e.is_memory() {
                    instr.mem_size = 16;
                }
                instr.operands[0] = e;
                instr.operands[1] = OperandSpec::RegRRR;
                instr.operand_count = 2;
                read_imm_u8(reader, instr)
            }
            (0xf0, 0b11) => {
                deny_vvvv(vvvv)?;
                instr.opcode = Opcode::RORX;
                let width = if instr.prefixes.vex().w() { 8 } else { 4 };
                let modrm = read_modrm(reader)?;
                read_G(instr, modrm, width);
                let e = read_E(reader, instr, modrm, width)?;
                if e.is_memory() {
                    instr.mem_size = width;
                }
                instr.operands[0] = OperandSpec::RegRRR;
                instr.operands[1] = e;
                instr.operand_count = 2;
                read_imm_u8(reader, instr)
            }
            _ => Err(ErrorKind::InvalidOpcode),
        },
        _ => Err(ErrorKind::InvalidOpcode),
    }
}
