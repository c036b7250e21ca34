use crate::impl_display_by_debug;

/// Length of a near relative jump, `E9 rel32`.
pub const NEAR_JUMP_LEN: usize = 5;

/// Length of `mov rax, imm64; jmp rax`.
pub const WIDE_JUMP_LEN: usize = 12;

/// Length of an aarch64 `b imm26`.
pub const BRANCH_LEN: usize = 4;

/// Length of `ldr x16, #8; br x16; .quad target` on aarch64.
pub const WIDE_BRANCH_LEN: usize = 16;

/// Opcode of the x86 near relative jump.
pub const NEAR_JUMP_OPCODE: u8 = 0xE9;

/// Type name the discovery layer uses for callable handles.
pub const CALLABLE_TYPE: &str = "Callable";

/// Type name the discovery layer uses for errors.
pub const ERROR_TYPE: &str = "Error";

/// Type name of "returns nothing".
pub const VOID_TYPE: &str = "void";

/// Label of a group reported because the next one began before it was flushed.
pub const UNFLUSHED_GROUP: &str = "unflushed group";

/// Module name reported when a declaring type carries none.
pub const UNKNOWN_MODULE: &str = "<unknown module>";

/// Enums used to describe how a callable receives its `self` argument.
#[repr(C)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ReceiverClassification {
    /// A non-static member, the receiver is implicit.
    Instance,
    /// A static function called as if it were a member of its first parameter's type.
    Extension,
    /// A plain static function.
    Static,
    /// Marked receiver-first but declares no parameter to receive with.
    Invalid,
}

impl_display_by_debug!(ReceiverClassification);

/// Enums used to describe how a parameter is passed.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ParamModifier {
    /// Passed by value.
    #[default]
    Value,
    /// Read-only reference.
    In,
    /// Write-only reference.
    Out,
    /// Read-write reference.
    Ref,
}

impl ParamModifier {
    /// The keyword written before a parameter type, `None` for by-value parameters.
    #[must_use]
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            ParamModifier::Value => None,
            ParamModifier::In => Some("in"),
            ParamModifier::Out => Some("out"),
            ParamModifier::Ref => Some("ref"),
        }
    }
}

impl_display_by_debug!(ParamModifier);

/// Enums used to describe the visibility of a field to derived types.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Visibility {
    /// Visible everywhere.
    #[default]
    Public,
    /// Visible to derived types.
    Protected,
    /// Visible to the declaring type only.
    Private,
}

impl Visibility {
    /// Returns `true` if derived types cannot see the field.
    #[must_use]
    pub fn is_private(self) -> bool {
        Visibility::Private == self
    }
}

impl_display_by_debug!(Visibility);

/// Enums used to describe the shape of an emitted jump.
#[repr(C)]
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum JumpKind {
    /// Relative jump encoding the displacement in the instruction.
    Near,
    /// Absolute jump through a scratch register.
    Wide,
}

impl_display_by_debug!(JumpKind);
