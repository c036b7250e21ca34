use crate::common::constants::{
    JumpKind, BRANCH_LEN, NEAR_JUMP_LEN, NEAR_JUMP_OPCODE, WIDE_BRANCH_LEN, WIDE_JUMP_LEN,
};
use std::io::{Error, ErrorKind};

/// Instruction sets a jump can be encoded for.
#[repr(C)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Arch {
    /// 32-bit x86.
    X86,
    /// x86-64.
    X86_64,
    /// 64-bit ARM.
    AArch64,
}

impl Arch {
    /// The architecture this process runs on, if jumps can be encoded for it.
    #[must_use]
    pub fn host() -> Option<Self> {
        cfg_if::cfg_if! {
            if #[cfg(target_arch = "x86_64")] {
                Some(Arch::X86_64)
            } else if #[cfg(target_arch = "x86")] {
                Some(Arch::X86)
            } else if #[cfg(target_arch = "aarch64")] {
                Some(Arch::AArch64)
            } else {
                None
            }
        }
    }
}

/// The bytes that replace the entry of a function.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct JumpPatch {
    kind: JumpKind,
    bytes: Vec<u8>,
}

impl JumpPatch {
    /// Encode an unconditional transfer from `source` to `destination`.
    ///
    /// The near form is used whenever the displacement fits, the wide form otherwise.
    pub fn encode(arch: Arch, source: usize, destination: usize) -> std::io::Result<Self> {
        match arch {
            Arch::X86 => Ok(Self::near_x86(source, destination)),
            Arch::X86_64 => Ok(Self::encode_x86_64(source, destination)),
            Arch::AArch64 => Self::encode_aarch64(source, destination),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn near_x86(source: usize, destination: usize) -> Self {
        // 32-bit addresses, the displacement wraps modulo 2^32
        let displacement = destination
            .wrapping_sub(source)
            .wrapping_sub(NEAR_JUMP_LEN) as u32;
        Self::near(displacement.to_le_bytes())
    }

    #[allow(clippy::cast_possible_wrap)]
    fn encode_x86_64(source: usize, destination: usize) -> Self {
        let displacement = destination as i128 - source as i128 - NEAR_JUMP_LEN as i128;
        if let Ok(displacement) = i32::try_from(displacement) {
            return Self::near(displacement.to_le_bytes());
        }
        let mut bytes = Vec::with_capacity(WIDE_JUMP_LEN);
        // mov rax, imm64
        bytes.extend_from_slice(&[0x48, 0xB8]);
        bytes.extend_from_slice(&(destination as u64).to_le_bytes());
        // jmp rax
        bytes.extend_from_slice(&[0xFF, 0xE0]);
        Self {
            kind: JumpKind::Wide,
            bytes,
        }
    }

    fn near(displacement: [u8; 4]) -> Self {
        let mut bytes = Vec::with_capacity(NEAR_JUMP_LEN);
        bytes.push(NEAR_JUMP_OPCODE);
        bytes.extend_from_slice(&displacement);
        Self {
            kind: JumpKind::Near,
            bytes,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn encode_aarch64(source: usize, destination: usize) -> std::io::Result<Self> {
        if source % 4 != 0 || destination % 4 != 0 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("unaligned aarch64 entry {source:#x} -> {destination:#x}"),
            ));
        }
        let offset = destination as i128 - source as i128;
        if (-(1_i128 << 27)..(1_i128 << 27)).contains(&offset) {
            // b imm26
            let instruction = 0x1400_0000_u32 | (((offset >> 2) as u32) & 0x03FF_FFFF);
            let mut bytes = Vec::with_capacity(BRANCH_LEN);
            bytes.extend_from_slice(&instruction.to_le_bytes());
            return Ok(Self {
                kind: JumpKind::Near,
                bytes,
            });
        }
        let mut bytes = Vec::with_capacity(WIDE_BRANCH_LEN);
        // ldr x16, #8
        bytes.extend_from_slice(&0x5800_0050_u32.to_le_bytes());
        // br x16
        bytes.extend_from_slice(&0xD61F_0200_u32.to_le_bytes());
        bytes.extend_from_slice(&(destination as u64).to_le_bytes());
        Ok(Self {
            kind: JumpKind::Wide,
            bytes,
        })
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn kind(&self) -> JumpKind {
        self.kind
    }

    /// The encoded instructions, to be written at the source entry.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of entry bytes the patch overwrites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[allow(missing_docs)]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
