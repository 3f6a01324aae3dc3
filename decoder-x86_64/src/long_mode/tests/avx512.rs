use super::{test_display, test_display_under, test_invalid, test_invalid_under};
use crate::long_mode::Decoder;

#[test]
fn mov_forms() {
    test_display(&[0x62, 0xf1, 0x7c, 0x48, 0x10, 0xc1], "vmovups zmm0, zmm1");
    test_display(&[0x62, 0xf1, 0x7c, 0x28, 0x10, 0xc1], "vmovups ymm0, ymm1");
    test_display(&[0x62, 0xf1, 0x7c, 0x08, 0x10, 0xc1], "vmovups xmm0, xmm1");
    test_display(
        &[0x62, 0xf1, 0x7c, 0x48, 0x10, 0x01],
        "vmovups zmm0, zmmword [rcx]",
    );
    test_display(
        &[0x62, 0xf1, 0x7c, 0x48, 0x11, 0x01],
        "vmovups zmmword [rcx], zmm0",
    );
    test_display(&[0x62, 0xf1, 0x7d, 0x48, 0x28, 0xc1], "vmovapd zmm0, zmm1");

    test_display(&[0x62, 0xf1, 0x7d, 0x48, 0x6f, 0xc1], "vmovdqa32 zmm0, zmm1");
    test_display(&[0x62, 0xf1, 0xfd, 0x48, 0x6f, 0xc1], "vmovdqa64 zmm0, zmm1");
    test_display(&[0x62, 0xf1, 0x7e, 0x48, 0x6f, 0xc1], "vmovdqu32 zmm0, zmm1");
    test_display(&[0x62, 0xf1, 0xfe, 0x48, 0x6f, 0xc1], "vmovdqu64 zmm0, zmm1");
    test_display(&[0x62, 0xf1, 0x7f, 0x48, 0x6f, 0xc1], "vmovdqu8 zmm0, zmm1");
    test_display(&[0x62, 0xf1, 0xff, 0x48, 0x6f, 0xc1], "vmovdqu16 zmm0, zmm1");
    test_display(
        &[0x62, 0xf1, 0x7f, 0x48, 0x7f, 0x01],
        "vmovdqu8 zmmword [rcx], zmm0",
    );

    test_display(
        &[0x62, 0xf1, 0x76, 0x08, 0x10, 0xc2],
        "vmovss xmm0, xmm1, xmm2",
    );
    test_display(
        &[0x62, 0xf1, 0x76, 0x09, 0x10, 0xc2],
        "vmovss xmm0{k1}, xmm1, xmm2",
    );
    test_display(&[0x62, 0xf1, 0x7e, 0x08, 0x10, 0x01], "vmovss xmm0, dword [rcx]");
    test_display(
        &[0x62, 0xf1, 0x7e, 0x09, 0x11, 0x01],
        "vmovss dword [rcx]{k1}, xmm0",
    );

    test_display(&[0x62, 0xf1, 0x7d, 0x08, 0x6e, 0xc0], "vmovd xmm0, eax");
    test_display(&[0x62, 0xf1, 0xfd, 0x08, 0x6e, 0xc0], "vmovq xmm0, rax");
    test_display(&[0x62, 0xf1, 0x7d, 0x08, 0x7e, 0xc0], "vmovd eax, xmm0");
    test_display(&[0x62, 0xf1, 0x7e, 0x08, 0x7e, 0xc1], "vmovq xmm0, xmm1");
    test_display(&[0x62, 0xf1, 0x7d, 0x08, 0xd6, 0xc1], "vmovq xmm1, xmm0");
    // gpr moves take no mask at all
    test_invalid(&[0x62, 0xf1, 0x7d, 0x09, 0x6e, 0xc0]);
}

#[test]
fn masking() {
    test_display(&[0x62, 0xf1, 0x7c, 0x49, 0x10, 0xc1], "vmovups zmm0{k1}, zmm1");
    test_display(
        &[0x62, 0xf1, 0x7c, 0xc9, 0x10, 0xc1],
        "vmovups zmm0{k1}{z}, zmm1",
    );
    test_display(
        &[0x62, 0xf1, 0x7c, 0x49, 0x11, 0x01],
        "vmovups zmmword [rcx]{k1}, zmm0",
    );
    test_display(
        &[0x62, 0xf1, 0x74, 0x4f, 0x58, 0xc2],
        "vaddps zmm0{k7}, zmm1, zmm2",
    );

    // zeroing without a mask register has nothing to zero by
    test_invalid(&[0x62, 0xf1, 0x7c, 0xc8, 0x10, 0xc1]);
    // zeroing into memory is likewise undefined
    test_invalid(&[0x62, 0xf1, 0x7c, 0xc9, 0x11, 0x01]);
}

#[test]
fn extended_registers() {
    // r' reaches the upper sixteen registers in modrm.rrr
    test_display(&[0x62, 0xe1, 0x7c, 0x48, 0x10, 0xc1], "vmovups zmm16, zmm1");
    test_display(&[0x62, 0x71, 0x7c, 0x48, 0x10, 0xc1], "vmovups zmm8, zmm1");
    test_display(&[0x62, 0x61, 0x7c, 0x48, 0x10, 0xc1], "vmovups zmm24, zmm1");
    // x reaches them in modrm.mmm
    test_display(&[0x62, 0xb1, 0x7c, 0x48, 0x10, 0xc1], "vmovups zmm0, zmm17");
    // v' reaches them in vvvv
    test_display(
        &[0x62, 0xf1, 0x74, 0x40, 0x58, 0xc2],
        "vaddps zmm0, zmm17, zmm2",
    );
}

#[test]
fn broadcast() {
    test_display(
        &[0x62, 0xf1, 0x74, 0x58, 0x58, 0x01],
        "vaddps zmm0, zmm1, dword [rcx]{1to16}",
    );
    test_display(
        &[0x62, 0xf1, 0x74, 0x38, 0x58, 0x01],
        "vaddps ymm0, ymm1, dword [rcx]{1to8}",
    );
    test_display(
        &[0x62, 0xf1, 0xf5, 0x58, 0x58, 0x01],
        "vaddpd zmm0, zmm1, qword [rcx]{1to8}",
    );
    test_display(
        &[0x62, 0xf1, 0x75, 0x58, 0xfe, 0x01],
        "vpaddd zmm0, zmm1, dword [rcx]{1to16}",
    );

    // stores cannot broadcast
    test_invalid(&[0x62, 0xf1, 0x7c, 0x58, 0x11, 0x01]);
}

#[test]
fn rounding() {
    // evex.b on a register-register form selects rounding out of l'l
    test_display(
        &[0x62, 0xf1, 0x74, 0x18, 0x58, 0xc2],
        "vaddps zmm0{rne-sae}, zmm1, zmm2",
    );
    test_display(
        &[0x62, 0xf1, 0x74, 0x38, 0x58, 0xc2],
        "vaddps zmm0{rd-sae}, zmm1, zmm2",
    );
    test_display(
        &[0x62, 0xf1, 0x74, 0x58, 0x58, 0xc2],
        "vaddps zmm0{ru-sae}, zmm1, zmm2",
    );
    test_display(
        &[0x62, 0xf1, 0x74, 0x78, 0x58, 0xc2],
        "vaddps zmm0{rz-sae}, zmm1, zmm2",
    );
    test_display(
        &[0x62, 0xf1, 0x76, 0x18, 0x51, 0xc2],
        "vsqrtss xmm0{rne-sae}, xmm1, xmm2",
    );
    test_display(&[0x62, 0xf1, 0x7c, 0x18, 0x51, 0xc1], "vsqrtps zmm0{rne-sae}, zmm1");

    // min/max only ever suppress exceptions
    test_display(
        &[0x62, 0xf1, 0x74, 0x18, 0x5f, 0xc2],
        "vmaxps zmm0{sae}, zmm1, zmm2",
    );
    test_display(
        &[0x62, 0xf1, 0x76, 0x18, 0x5d, 0xc2],
        "vminss xmm0{sae}, xmm1, xmm2",
    );

    // integer ops have no rounding to select
    test_invalid(&[0x62, 0xf1, 0x75, 0x18, 0xfe, 0xc2]);
}

#[test]
fn compressed_displacement() {
    // disp8 counts in units of the access size
    test_display(
        &[0x62, 0xf1, 0x7c, 0x48, 0x10, 0x41, 0x01],
        "vmovups zmm0, zmmword [rcx + 0x40]",
    );
    test_display(
        &[0x62, 0xf1, 0x7c, 0x28, 0x10, 0x41, 0x01],
        "vmovups ymm0, ymmword [rcx + 0x20]",
    );
    test_display(
        &[0x62, 0xf1, 0x7c, 0x48, 0x10, 0x41, 0xff],
        "vmovups zmm0, zmmword [rcx - 0x40]",
    );
    // under broadcast it counts elements instead
    test_display(
        &[0x62, 0xf1, 0x74, 0x58, 0x58, 0x41, 0x01],
        "vaddps zmm0, zmm1, dword [rcx + 0x4]{1to16}",
    );
    test_display(
        &[0x62, 0xf1, 0x7e, 0x08, 0x10, 0x41, 0x01],
        "vmovss xmm0, dword [rcx + 0x4]",
    );
}

#[test]
fn arithmetic() {
    test_display(&[0x62, 0xf1, 0x74, 0x48, 0x58, 0xc2], "vaddps zmm0, zmm1, zmm2");
    test_display(&[0x62, 0xf1, 0xf5, 0x48, 0x59, 0xc2], "vmulpd zmm0, zmm1, zmm2");
    test_display(&[0x62, 0xf1, 0x76, 0x08, 0x5c, 0xc2], "vsubss xmm0, xmm1, xmm2");
    test_display(&[0x62, 0xf1, 0x77, 0x08, 0x5e, 0xc2], "vdivsd xmm0, xmm1, xmm2");
    test_display(&[0x62, 0xf1, 0x75, 0x48, 0xfe, 0xc2], "vpaddd zmm0, zmm1, zmm2");
    test_display(&[0x62, 0xf1, 0xf5, 0x48, 0xd4, 0xc2], "vpaddq zmm0, zmm1, zmm2");
    test_display(&[0x62, 0xf1, 0x75, 0x48, 0xfa, 0xc2], "vpsubd zmm0, zmm1, zmm2");
    test_display(&[0x62, 0xf1, 0x75, 0x48, 0xdb, 0xc2], "vpandd zmm0, zmm1, zmm2");
    test_display(&[0x62, 0xf1, 0xf5, 0x48, 0xdb, 0xc2], "vpandq zmm0, zmm1, zmm2");
    test_display(&[0x62, 0xf1, 0x75, 0x48, 0xeb, 0xc2], "vpord zmm0, zmm1, zmm2");
    test_display(&[0x62, 0xf1, 0x75, 0x48, 0xef, 0xc2], "vpxord zmm0, zmm1, zmm2");
    test_display(&[0x62, 0xf1, 0xf5, 0x48, 0xef, 0xc2], "vpxorq zmm0, zmm1, zmm2");
    test_display(&[0x62, 0xf1, 0x74, 0x48, 0x54, 0xc2], "vandps zmm0, zmm1, zmm2");
    test_display(&[0x62, 0xf2, 0x75, 0x48, 0x40, 0xc2], "vpmulld zmm0, zmm1, zmm2");
    test_display(&[0x62, 0xf2, 0xf5, 0x48, 0x40, 0xc2], "vpmullq zmm0, zmm1, zmm2");
}

#[test]
fn compare() {
    test_display(
        &[0x62, 0xf1, 0x74, 0x48, 0xc2, 0xca, 0x02],
        "vcmpps k1, zmm1, zmm2, 0x2",
    );
    test_display(
        &[0x62, 0xf1, 0x74, 0x4a, 0xc2, 0xca, 0x02],
        "vcmpps k1{k2}, zmm1, zmm2, 0x2",
    );
    test_display(
        &[0x62, 0xf1, 0x74, 0x18, 0xc2, 0xca, 0x02],
        "vcmpps k1{sae}, zmm1, zmm2, 0x2",
    );
    test_display(
        &[0x62, 0xf1, 0x74, 0x58, 0xc2, 0x09, 0x02],
        "vcmpps k1, zmm1, dword [rcx]{1to16}, 0x2",
    );
    test_display(
        &[0x62, 0xf1, 0x77, 0x08, 0xc2, 0xca, 0x02],
        "vcmpsd k1, xmm1, xmm2, 0x2",
    );
}

#[test]
fn broadcast_expand_compress() {
    test_display(&[0x62, 0xf2, 0x7d, 0x48, 0x18, 0xc1], "vbroadcastss zmm0, xmm1");
    test_display(
        &[0x62, 0xf2, 0x7d, 0x48, 0x18, 0x01],
        "vbroadcastss zmm0, dword [rcx]",
    );
    test_display(
        &[0x62, 0xf2, 0x7d, 0x4f, 0x18, 0x01],
        "vbroadcastss zmm0{k7}, dword [rcx]",
    );
    test_display(
        &[0x62, 0xf2, 0x7d, 0x48, 0x18, 0x41, 0x01],
        "vbroadcastss zmm0, dword [rcx + 0x4]",
    );
    test_display(
        &[0x62, 0xf2, 0xfd, 0x48, 0x19, 0x01],
        "vbroadcastsd zmm0, qword [rcx]",
    );
    test_display(&[0x62, 0xf2, 0x7d, 0x48, 0x58, 0xc1], "vpbroadcastd zmm0, xmm1");
    test_display(&[0x62, 0xf2, 0x7d, 0x48, 0x59, 0xc1], "vpbroadcastq zmm0, xmm1");

    test_display(
        &[0x62, 0xf2, 0x7d, 0x48, 0x88, 0x01],
        "vexpandps zmm0, dword [rcx]",
    );
    test_display(
        &[0x62, 0xf2, 0xfd, 0x48, 0x88, 0x01],
        "vexpandpd zmm0, qword [rcx]",
    );
    test_display(
        &[0x62, 0xf2, 0x7d, 0x49, 0x88, 0x01],
        "vexpandps zmm0{k1}, dword [rcx]",
    );
    // expand/compress compress their disp8 by the element, not the vector
    test_display(
        &[0x62, 0xf2, 0xfd, 0x48, 0x88, 0x41, 0x01],
        "vexpandpd zmm0, qword [rcx + 0x8]",
    );
    test_display(
        &[0x62, 0xf2, 0x7d, 0x48, 0x8a, 0x01],
        "vcompressps dword [rcx], zmm0",
    );
    test_display(
        &[0x62, 0xf2, 0x7d, 0x49, 0x8a, 0x01],
        "vcompressps dword [rcx]{k1}, zmm0",
    );
    test_invalid(&[0x62, 0xf2, 0x7d, 0xc9, 0x8a, 0x01]);
}

#[test]
fn align() {
    test_display(
        &[0x62, 0xf3, 0x75, 0x48, 0x03, 0xc2, 0x01],
        "valignd zmm0, zmm1, zmm2, 0x1",
    );
    test_display(
        &[0x62, 0xf3, 0xf5, 0x48, 0x03, 0xc2, 0x01],
        "valignq zmm0, zmm1, zmm2, 0x1",
    );
    test_display(
        &[0x62, 0xf3, 0x75, 0x58, 0x03, 0x01, 0x02],
        "valignd zmm0, zmm1, dword [rcx]{1to16}, 0x2",
    );
}

#[test]
fn malformed_payloads() {
    // reserved bits in the evex payload
    test_invalid(&[0x62, 0xf5, 0x7c, 0x48, 0x10, 0xc1]);
    test_invalid(&[0x62, 0xf1, 0x78, 0x48, 0x10, 0xc1]);
    // map 0 does not exist
    test_invalid(&[0x62, 0xf0, 0x7c, 0x48, 0x10, 0xc1]);
    // l'l == 11 names no vector length
    test_invalid(&[0x62, 0xf1, 0x7c, 0x68, 0x10, 0xc1]);

    // evex after any legacy or rex prefix is invalid
    test_invalid(&[0x66, 0x62, 0xf1, 0x7c, 0x48, 0x10, 0xc1]);
    test_invalid(&[0xf3, 0x62, 0xf1, 0x7c, 0x48, 0x10, 0xc1]);
    test_invalid(&[0x48, 0x62, 0xf1, 0x7c, 0x48, 0x10, 0xc1]);
}

#[test]
fn feature_gates() {
    test_invalid_under(&Decoder::minimal(), &[0x62, 0xf1, 0x7c, 0x48, 0x10, 0xc1]);

    let f = Decoder::minimal().with_avx512_f();
    test_display_under(&f, &[0x62, 0xf1, 0x7c, 0x48, 0x10, 0xc1], "vmovups zmm0, zmm1");
    // 128- and 256-bit forms additionally want avx512vl
    test_invalid_under(&f, &[0x62, 0xf1, 0x7c, 0x28, 0x10, 0xc1]);
    test_invalid_under(&f, &[0x62, 0xf1, 0x7c, 0x08, 0x10, 0xc1]);
    test_display_under(
        &Decoder::minimal().with_avx512_f().with_avx512_vl(),
        &[0x62, 0xf1, 0x7c, 0x28, 0x10, 0xc1],
        "vmovups ymm0, ymm1",
    );
    // scalars never need vl
    test_display_under(
        &f,
        &[0x62, 0xf1, 0x76, 0x08, 0x10, 0xc2],
        "vmovss xmm0, xmm1, xmm2",
    );

    // byte/word and dq subsets gate separately
    test_invalid_under(&f, &[0x62, 0xf1, 0x7f, 0x48, 0x6f, 0xc1]);
    test_display_under(
        &Decoder::minimal().with_avx512_f().with_avx512_bw(),
        &[0x62, 0xf1, 0x7f, 0x48, 0x6f, 0xc1],
        "vmovdqu8 zmm0, zmm1",
    );
    test_invalid_under(&f, &[0x62, 0xf1, 0x74, 0x48, 0x54, 0xc2]);
    test_invalid_under(&f, &[0x62, 0xf2, 0xf5, 0x48, 0x40, 0xc2]);
    test_display_under(
        &Decoder::minimal().with_avx512_f().with_avx512_dq(),
        &[0x62, 0xf2, 0xf5, 0x48, 0x40, 0xc2],
        "vpmullq zmm0, zmm1, zmm2",
    );
}
