//! Dalvik opcodes and their encoding formats
//!
//! Every opcode belongs to exactly one [`Format`], which fixes how many code units the
//! instruction occupies and which operands it carries. The naming of formats follows the Dalvik
//! convention: the first digit is the size in code units, the second the number of registers,
//! and the trailing letter(s) the kind of extra operand (`t` for a branch target, `c` for a pool
//! reference, `n`/`s`/`b`/`i`/`l`/`h` for literals of various widths, `x` for none).
//!
//! The three payload pseudo-opcodes are not real instructions: they mark out-of-line data that
//! the switch and `fill-array-data` instructions point at.

use bitflags::bitflags;
use std::fmt;

/// Encoding format of an instruction
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    Format10t,
    Format10x,
    Format11n,
    Format11x,
    Format12x,
    Format20bc,
    Format20t,
    Format21c,
    Format21ih,
    Format21lh,
    Format21s,
    Format21t,
    Format22b,
    Format22c,
    Format22cs,
    Format22s,
    Format22t,
    Format22x,
    Format23x,
    Format30t,
    Format31c,
    Format31i,
    Format31t,
    Format32x,
    Format35c,
    Format35mi,
    Format35ms,
    Format3rc,
    Format3rmi,
    Format3rms,
    Format45cc,
    Format4rcc,
    Format51l,
    PackedSwitchPayload,
    SparseSwitchPayload,
    ArrayPayload,
}

impl Format {
    /// Size in code units, if the format has a fixed size (payloads don't)
    pub fn code_units(self) -> Option<usize> {
        use Format::*;
        match self {
            Format10t | Format10x | Format11n | Format11x | Format12x => Some(1),
            Format20bc | Format20t | Format21c | Format21ih | Format21lh | Format21s | Format21t
            | Format22b | Format22c | Format22cs | Format22s | Format22t | Format22x
            | Format23x => Some(2),
            Format30t | Format31c | Format31i | Format31t | Format32x | Format35c | Format35mi
            | Format35ms | Format3rc | Format3rmi | Format3rms => Some(3),
            Format45cc | Format4rcc => Some(4),
            Format51l => Some(5),
            PackedSwitchPayload | SparseSwitchPayload | ArrayPayload => None,
        }
    }

    pub fn is_payload(self) -> bool {
        matches!(
            self,
            Format::PackedSwitchPayload | Format::SparseSwitchPayload | Format::ArrayPayload
        )
    }
}

bitflags! {
    /// Static properties of an opcode
    pub struct OpcodeFlags: u8 {
        /// Instruction may throw an exception
        const CAN_THROW = 0x01;
        /// Execution may continue with the next instruction
        const CAN_CONTINUE = 0x02;
        /// Instruction sets the hidden result register (read by `move-result*`)
        const SETS_RESULT = 0x04;
        /// Instruction writes its first register operand
        const SETS_REGISTER = 0x08;
        /// Instruction writes a register pair
        const SETS_WIDE_REGISTER = 0x10;
    }
}

const NONE: OpcodeFlags = OpcodeFlags::empty();
const CONT: OpcodeFlags = OpcodeFlags::CAN_CONTINUE;
const THROW: OpcodeFlags = OpcodeFlags::CAN_THROW;
const RESULT: OpcodeFlags = OpcodeFlags::SETS_RESULT;
const REG: OpcodeFlags = OpcodeFlags::SETS_REGISTER;
const WIDE: OpcodeFlags = OpcodeFlags::SETS_WIDE_REGISTER;

macro_rules! opcodes {
    ($( $variant:ident = $value:literal, $name:literal, $format:ident, $flags:expr; )*) => {
        /// Dalvik opcode (including the payload pseudo-opcodes)
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        pub enum Opcode {
            $( $variant, )*
        }

        impl Opcode {
            /// Every known opcode, in encoding order
            pub const ALL: &'static [Opcode] = &[ $( Opcode::$variant, )* ];

            /// Value of the opcode in the code array
            ///
            /// For regular instructions this fits in the low byte of the first code unit. Payload
            /// pseudo-opcodes use the whole code unit (low byte zero, like `nop`).
            pub fn value(self) -> u16 {
                match self {
                    $( Opcode::$variant => $value, )*
                }
            }

            /// Mnemonic, as used in smali
            pub fn name(self) -> &'static str {
                match self {
                    $( Opcode::$variant => $name, )*
                }
            }

            pub fn format(self) -> Format {
                match self {
                    $( Opcode::$variant => Format::$format, )*
                }
            }

            pub fn flags(self) -> OpcodeFlags {
                match self {
                    $( Opcode::$variant => $flags, )*
                }
            }

            pub fn from_value(value: u16) -> Option<Opcode> {
                match value {
                    $( $value => Some(Opcode::$variant), )*
                    _ => None,
                }
            }

            pub fn from_name(name: &str) -> Option<Opcode> {
                match name {
                    $( $name => Some(Opcode::$variant), )*
                    _ => None,
                }
            }
        }
    };
}

opcodes! {
    Nop = 0x00, "nop", Format10x, CONT;
    Move = 0x01, "move", Format12x, CONT | REG;
    MoveFrom16 = 0x02, "move/from16", Format22x, CONT | REG;
    Move16 = 0x03, "move/16", Format32x, CONT | REG;
    MoveWide = 0x04, "move-wide", Format12x, CONT | REG | WIDE;
    MoveWideFrom16 = 0x05, "move-wide/from16", Format22x, CONT | REG | WIDE;
    MoveWide16 = 0x06, "move-wide/16", Format32x, CONT | REG | WIDE;
    MoveObject = 0x07, "move-object", Format12x, CONT | REG;
    MoveObjectFrom16 = 0x08, "move-object/from16", Format22x, CONT | REG;
    MoveObject16 = 0x09, "move-object/16", Format32x, CONT | REG;
    MoveResult = 0x0a, "move-result", Format11x, CONT | REG;
    MoveResultWide = 0x0b, "move-result-wide", Format11x, CONT | REG | WIDE;
    MoveResultObject = 0x0c, "move-result-object", Format11x, CONT | REG;
    MoveException = 0x0d, "move-exception", Format11x, CONT | REG;
    ReturnVoid = 0x0e, "return-void", Format10x, NONE;
    Return = 0x0f, "return", Format11x, NONE;
    ReturnWide = 0x10, "return-wide", Format11x, NONE;
    ReturnObject = 0x11, "return-object", Format11x, NONE;
    Const4 = 0x12, "const/4", Format11n, CONT | REG;
    Const16 = 0x13, "const/16", Format21s, CONT | REG;
    Const = 0x14, "const", Format31i, CONT | REG;
    ConstHigh16 = 0x15, "const/high16", Format21ih, CONT | REG;
    ConstWide16 = 0x16, "const-wide/16", Format21s, CONT | REG | WIDE;
    ConstWide32 = 0x17, "const-wide/32", Format31i, CONT | REG | WIDE;
    ConstWide = 0x18, "const-wide", Format51l, CONT | REG | WIDE;
    ConstWideHigh16 = 0x19, "const-wide/high16", Format21lh, CONT | REG | WIDE;
    ConstString = 0x1a, "const-string", Format21c, THROW | CONT | REG;
    ConstStringJumbo = 0x1b, "const-string/jumbo", Format31c, THROW | CONT | REG;
    ConstClass = 0x1c, "const-class", Format21c, THROW | CONT | REG;
    MonitorEnter = 0x1d, "monitor-enter", Format11x, THROW | CONT;
    MonitorExit = 0x1e, "monitor-exit", Format11x, THROW | CONT;
    CheckCast = 0x1f, "check-cast", Format21c, THROW | CONT | REG;
    InstanceOf = 0x20, "instance-of", Format22c, THROW | CONT | REG;
    ArrayLength = 0x21, "array-length", Format12x, THROW | CONT | REG;
    NewInstance = 0x22, "new-instance", Format21c, THROW | CONT | REG;
    NewArray = 0x23, "new-array", Format22c, THROW | CONT | REG;
    FilledNewArray = 0x24, "filled-new-array", Format35c, THROW | CONT | RESULT;
    FilledNewArrayRange = 0x25, "filled-new-array/range", Format3rc, THROW | CONT | RESULT;
    FillArrayData = 0x26, "fill-array-data", Format31t, THROW | CONT;
    Throw = 0x27, "throw", Format11x, THROW;
    Goto = 0x28, "goto", Format10t, NONE;
    Goto16 = 0x29, "goto/16", Format20t, NONE;
    Goto32 = 0x2a, "goto/32", Format30t, NONE;
    PackedSwitch = 0x2b, "packed-switch", Format31t, CONT;
    SparseSwitch = 0x2c, "sparse-switch", Format31t, CONT;
    CmplFloat = 0x2d, "cmpl-float", Format23x, CONT | REG;
    CmpgFloat = 0x2e, "cmpg-float", Format23x, CONT | REG;
    CmplDouble = 0x2f, "cmpl-double", Format23x, CONT | REG;
    CmpgDouble = 0x30, "cmpg-double", Format23x, CONT | REG;
    CmpLong = 0x31, "cmp-long", Format23x, CONT | REG;
    IfEq = 0x32, "if-eq", Format22t, CONT;
    IfNe = 0x33, "if-ne", Format22t, CONT;
    IfLt = 0x34, "if-lt", Format22t, CONT;
    IfGe = 0x35, "if-ge", Format22t, CONT;
    IfGt = 0x36, "if-gt", Format22t, CONT;
    IfLe = 0x37, "if-le", Format22t, CONT;
    IfEqz = 0x38, "if-eqz", Format21t, CONT;
    IfNez = 0x39, "if-nez", Format21t, CONT;
    IfLtz = 0x3a, "if-ltz", Format21t, CONT;
    IfGez = 0x3b, "if-gez", Format21t, CONT;
    IfGtz = 0x3c, "if-gtz", Format21t, CONT;
    IfLez = 0x3d, "if-lez", Format21t, CONT;
    Aget = 0x44, "aget", Format23x, THROW | CONT | REG;
    AgetWide = 0x45, "aget-wide", Format23x, THROW | CONT | REG | WIDE;
    AgetObject = 0x46, "aget-object", Format23x, THROW | CONT | REG;
    AgetBoolean = 0x47, "aget-boolean", Format23x, THROW | CONT | REG;
    AgetByte = 0x48, "aget-byte", Format23x, THROW | CONT | REG;
    AgetChar = 0x49, "aget-char", Format23x, THROW | CONT | REG;
    AgetShort = 0x4a, "aget-short", Format23x, THROW | CONT | REG;
    Aput = 0x4b, "aput", Format23x, THROW | CONT;
    AputWide = 0x4c, "aput-wide", Format23x, THROW | CONT;
    AputObject = 0x4d, "aput-object", Format23x, THROW | CONT;
    AputBoolean = 0x4e, "aput-boolean", Format23x, THROW | CONT;
    AputByte = 0x4f, "aput-byte", Format23x, THROW | CONT;
    AputChar = 0x50, "aput-char", Format23x, THROW | CONT;
    AputShort = 0x51, "aput-short", Format23x, THROW | CONT;
    Iget = 0x52, "iget", Format22c, THROW | CONT | REG;
    IgetWide = 0x53, "iget-wide", Format22c, THROW | CONT | REG | WIDE;
    IgetObject = 0x54, "iget-object", Format22c, THROW | CONT | REG;
    IgetBoolean = 0x55, "iget-boolean", Format22c, THROW | CONT | REG;
    IgetByte = 0x56, "iget-byte", Format22c, THROW | CONT | REG;
    IgetChar = 0x57, "iget-char", Format22c, THROW | CONT | REG;
    IgetShort = 0x58, "iget-short", Format22c, THROW | CONT | REG;
    Iput = 0x59, "iput", Format22c, THROW | CONT;
    IputWide = 0x5a, "iput-wide", Format22c, THROW | CONT;
    IputObject = 0x5b, "iput-object", Format22c, THROW | CONT;
    IputBoolean = 0x5c, "iput-boolean", Format22c, THROW | CONT;
    IputByte = 0x5d, "iput-byte", Format22c, THROW | CONT;
    IputChar = 0x5e, "iput-char", Format22c, THROW | CONT;
    IputShort = 0x5f, "iput-short", Format22c, THROW | CONT;
    Sget = 0x60, "sget", Format21c, THROW | CONT | REG;
    SgetWide = 0x61, "sget-wide", Format21c, THROW | CONT | REG | WIDE;
    SgetObject = 0x62, "sget-object", Format21c, THROW | CONT | REG;
    SgetBoolean = 0x63, "sget-boolean", Format21c, THROW | CONT | REG;
    SgetByte = 0x64, "sget-byte", Format21c, THROW | CONT | REG;
    SgetChar = 0x65, "sget-char", Format21c, THROW | CONT | REG;
    SgetShort = 0x66, "sget-short", Format21c, THROW | CONT | REG;
    Sput = 0x67, "sput", Format21c, THROW | CONT;
    SputWide = 0x68, "sput-wide", Format21c, THROW | CONT;
    SputObject = 0x69, "sput-object", Format21c, THROW | CONT;
    SputBoolean = 0x6a, "sput-boolean", Format21c, THROW | CONT;
    SputByte = 0x6b, "sput-byte", Format21c, THROW | CONT;
    SputChar = 0x6c, "sput-char", Format21c, THROW | CONT;
    SputShort = 0x6d, "sput-short", Format21c, THROW | CONT;
    InvokeVirtual = 0x6e, "invoke-virtual", Format35c, THROW | CONT | RESULT;
    InvokeSuper = 0x6f, "invoke-super", Format35c, THROW | CONT | RESULT;
    InvokeDirect = 0x70, "invoke-direct", Format35c, THROW | CONT | RESULT;
    InvokeStatic = 0x71, "invoke-static", Format35c, THROW | CONT | RESULT;
    InvokeInterface = 0x72, "invoke-interface", Format35c, THROW | CONT | RESULT;
    InvokeVirtualRange = 0x74, "invoke-virtual/range", Format3rc, THROW | CONT | RESULT;
    InvokeSuperRange = 0x75, "invoke-super/range", Format3rc, THROW | CONT | RESULT;
    InvokeDirectRange = 0x76, "invoke-direct/range", Format3rc, THROW | CONT | RESULT;
    InvokeStaticRange = 0x77, "invoke-static/range", Format3rc, THROW | CONT | RESULT;
    InvokeInterfaceRange = 0x78, "invoke-interface/range", Format3rc, THROW | CONT | RESULT;
    NegInt = 0x7b, "neg-int", Format12x, CONT | REG;
    NotInt = 0x7c, "not-int", Format12x, CONT | REG;
    NegLong = 0x7d, "neg-long", Format12x, CONT | REG | WIDE;
    NotLong = 0x7e, "not-long", Format12x, CONT | REG | WIDE;
    NegFloat = 0x7f, "neg-float", Format12x, CONT | REG;
    NegDouble = 0x80, "neg-double", Format12x, CONT | REG | WIDE;
    IntToLong = 0x81, "int-to-long", Format12x, CONT | REG | WIDE;
    IntToFloat = 0x82, "int-to-float", Format12x, CONT | REG;
    IntToDouble = 0x83, "int-to-double", Format12x, CONT | REG | WIDE;
    LongToInt = 0x84, "long-to-int", Format12x, CONT | REG;
    LongToFloat = 0x85, "long-to-float", Format12x, CONT | REG;
    LongToDouble = 0x86, "long-to-double", Format12x, CONT | REG | WIDE;
    FloatToInt = 0x87, "float-to-int", Format12x, CONT | REG;
    FloatToLong = 0x88, "float-to-long", Format12x, CONT | REG | WIDE;
    FloatToDouble = 0x89, "float-to-double", Format12x, CONT | REG | WIDE;
    DoubleToInt = 0x8a, "double-to-int", Format12x, CONT | REG;
    DoubleToLong = 0x8b, "double-to-long", Format12x, CONT | REG | WIDE;
    DoubleToFloat = 0x8c, "double-to-float", Format12x, CONT | REG;
    IntToByte = 0x8d, "int-to-byte", Format12x, CONT | REG;
    IntToChar = 0x8e, "int-to-char", Format12x, CONT | REG;
    IntToShort = 0x8f, "int-to-short", Format12x, CONT | REG;
    AddInt = 0x90, "add-int", Format23x, CONT | REG;
    SubInt = 0x91, "sub-int", Format23x, CONT | REG;
    MulInt = 0x92, "mul-int", Format23x, CONT | REG;
    DivInt = 0x93, "div-int", Format23x, THROW | CONT | REG;
    RemInt = 0x94, "rem-int", Format23x, THROW | CONT | REG;
    AndInt = 0x95, "and-int", Format23x, CONT | REG;
    OrInt = 0x96, "or-int", Format23x, CONT | REG;
    XorInt = 0x97, "xor-int", Format23x, CONT | REG;
    ShlInt = 0x98, "shl-int", Format23x, CONT | REG;
    ShrInt = 0x99, "shr-int", Format23x, CONT | REG;
    UshrInt = 0x9a, "ushr-int", Format23x, CONT | REG;
    AddLong = 0x9b, "add-long", Format23x, CONT | REG | WIDE;
    SubLong = 0x9c, "sub-long", Format23x, CONT | REG | WIDE;
    MulLong = 0x9d, "mul-long", Format23x, CONT | REG | WIDE;
    DivLong = 0x9e, "div-long", Format23x, THROW | CONT | REG | WIDE;
    RemLong = 0x9f, "rem-long", Format23x, THROW | CONT | REG | WIDE;
    AndLong = 0xa0, "and-long", Format23x, CONT | REG | WIDE;
    OrLong = 0xa1, "or-long", Format23x, CONT | REG | WIDE;
    XorLong = 0xa2, "xor-long", Format23x, CONT | REG | WIDE;
    ShlLong = 0xa3, "shl-long", Format23x, CONT | REG | WIDE;
    ShrLong = 0xa4, "shr-long", Format23x, CONT | REG | WIDE;
    UshrLong = 0xa5, "ushr-long", Format23x, CONT | REG | WIDE;
    AddFloat = 0xa6, "add-float", Format23x, CONT | REG;
    SubFloat = 0xa7, "sub-float", Format23x, CONT | REG;
    MulFloat = 0xa8, "mul-float", Format23x, CONT | REG;
    DivFloat = 0xa9, "div-float", Format23x, CONT | REG;
    RemFloat = 0xaa, "rem-float", Format23x, CONT | REG;
    AddDouble = 0xab, "add-double", Format23x, CONT | REG | WIDE;
    SubDouble = 0xac, "sub-double", Format23x, CONT | REG | WIDE;
    MulDouble = 0xad, "mul-double", Format23x, CONT | REG | WIDE;
    DivDouble = 0xae, "div-double", Format23x, CONT | REG | WIDE;
    RemDouble = 0xaf, "rem-double", Format23x, CONT | REG | WIDE;
    AddInt2Addr = 0xb0, "add-int/2addr", Format12x, CONT | REG;
    SubInt2Addr = 0xb1, "sub-int/2addr", Format12x, CONT | REG;
    MulInt2Addr = 0xb2, "mul-int/2addr", Format12x, CONT | REG;
    DivInt2Addr = 0xb3, "div-int/2addr", Format12x, THROW | CONT | REG;
    RemInt2Addr = 0xb4, "rem-int/2addr", Format12x, THROW | CONT | REG;
    AndInt2Addr = 0xb5, "and-int/2addr", Format12x, CONT | REG;
    OrInt2Addr = 0xb6, "or-int/2addr", Format12x, CONT | REG;
    XorInt2Addr = 0xb7, "xor-int/2addr", Format12x, CONT | REG;
    ShlInt2Addr = 0xb8, "shl-int/2addr", Format12x, CONT | REG;
    ShrInt2Addr = 0xb9, "shr-int/2addr", Format12x, CONT | REG;
    UshrInt2Addr = 0xba, "ushr-int/2addr", Format12x, CONT | REG;
    AddLong2Addr = 0xbb, "add-long/2addr", Format12x, CONT | REG | WIDE;
    SubLong2Addr = 0xbc, "sub-long/2addr", Format12x, CONT | REG | WIDE;
    MulLong2Addr = 0xbd, "mul-long/2addr", Format12x, CONT | REG | WIDE;
    DivLong2Addr = 0xbe, "div-long/2addr", Format12x, THROW | CONT | REG | WIDE;
    RemLong2Addr = 0xbf, "rem-long/2addr", Format12x, THROW | CONT | REG | WIDE;
    AndLong2Addr = 0xc0, "and-long/2addr", Format12x, CONT | REG | WIDE;
    OrLong2Addr = 0xc1, "or-long/2addr", Format12x, CONT | REG | WIDE;
    XorLong2Addr = 0xc2, "xor-long/2addr", Format12x, CONT | REG | WIDE;
    ShlLong2Addr = 0xc3, "shl-long/2addr", Format12x, CONT | REG | WIDE;
    ShrLong2Addr = 0xc4, "shr-long/2addr", Format12x, CONT | REG | WIDE;
    UshrLong2Addr = 0xc5, "ushr-long/2addr", Format12x, CONT | REG | WIDE;
    AddFloat2Addr = 0xc6, "add-float/2addr", Format12x, CONT | REG;
    SubFloat2Addr = 0xc7, "sub-float/2addr", Format12x, CONT | REG;
    MulFloat2Addr = 0xc8, "mul-float/2addr", Format12x, CONT | REG;
    DivFloat2Addr = 0xc9, "div-float/2addr", Format12x, CONT | REG;
    RemFloat2Addr = 0xca, "rem-float/2addr", Format12x, CONT | REG;
    AddDouble2Addr = 0xcb, "add-double/2addr", Format12x, CONT | REG | WIDE;
    SubDouble2Addr = 0xcc, "sub-double/2addr", Format12x, CONT | REG | WIDE;
    MulDouble2Addr = 0xcd, "mul-double/2addr", Format12x, CONT | REG | WIDE;
    DivDouble2Addr = 0xce, "div-double/2addr", Format12x, CONT | REG | WIDE;
    RemDouble2Addr = 0xcf, "rem-double/2addr", Format12x, CONT | REG | WIDE;
    AddIntLit16 = 0xd0, "add-int/lit16", Format22s, CONT | REG;
    RsubInt = 0xd1, "rsub-int", Format22s, CONT | REG;
    MulIntLit16 = 0xd2, "mul-int/lit16", Format22s, CONT | REG;
    DivIntLit16 = 0xd3, "div-int/lit16", Format22s, THROW | CONT | REG;
    RemIntLit16 = 0xd4, "rem-int/lit16", Format22s, THROW | CONT | REG;
    AndIntLit16 = 0xd5, "and-int/lit16", Format22s, CONT | REG;
    OrIntLit16 = 0xd6, "or-int/lit16", Format22s, CONT | REG;
    XorIntLit16 = 0xd7, "xor-int/lit16", Format22s, CONT | REG;
    AddIntLit8 = 0xd8, "add-int/lit8", Format22b, CONT | REG;
    RsubIntLit8 = 0xd9, "rsub-int/lit8", Format22b, CONT | REG;
    MulIntLit8 = 0xda, "mul-int/lit8", Format22b, CONT | REG;
    DivIntLit8 = 0xdb, "div-int/lit8", Format22b, THROW | CONT | REG;
    RemIntLit8 = 0xdc, "rem-int/lit8", Format22b, THROW | CONT | REG;
    AndIntLit8 = 0xdd, "and-int/lit8", Format22b, CONT | REG;
    OrIntLit8 = 0xde, "or-int/lit8", Format22b, CONT | REG;
    XorIntLit8 = 0xdf, "xor-int/lit8", Format22b, CONT | REG;
    ShlIntLit8 = 0xe0, "shl-int/lit8", Format22b, CONT | REG;
    ShrIntLit8 = 0xe1, "shr-int/lit8", Format22b, CONT | REG;
    UshrIntLit8 = 0xe2, "ushr-int/lit8", Format22b, CONT | REG;

    // Optimized (odex) opcodes, at their Dalvik values
    IgetVolatile = 0xe3, "iget-volatile", Format22c, THROW | CONT | REG;
    IputVolatile = 0xe4, "iput-volatile", Format22c, THROW | CONT;
    SgetVolatile = 0xe5, "sget-volatile", Format21c, THROW | CONT | REG;
    SputVolatile = 0xe6, "sput-volatile", Format21c, THROW | CONT;
    IgetObjectVolatile = 0xe7, "iget-object-volatile", Format22c, THROW | CONT | REG;
    IgetWideVolatile = 0xe8, "iget-wide-volatile", Format22c, THROW | CONT | REG | WIDE;
    IputWideVolatile = 0xe9, "iput-wide-volatile", Format22c, THROW | CONT;
    SgetWideVolatile = 0xea, "sget-wide-volatile", Format21c, THROW | CONT | REG | WIDE;
    SputWideVolatile = 0xeb, "sput-wide-volatile", Format21c, THROW | CONT;
    ThrowVerificationError = 0xed, "throw-verification-error", Format20bc, THROW;
    ExecuteInline = 0xee, "execute-inline", Format35mi, THROW | CONT | RESULT;
    ExecuteInlineRange = 0xef, "execute-inline/range", Format3rmi, THROW | CONT | RESULT;
    InvokeObjectInitRange = 0xf0, "invoke-object-init/range", Format3rc, THROW | CONT | RESULT;
    ReturnVoidBarrier = 0xf1, "return-void-barrier", Format10x, NONE;
    IgetQuick = 0xf2, "iget-quick", Format22cs, THROW | CONT | REG;
    IgetWideQuick = 0xf3, "iget-wide-quick", Format22cs, THROW | CONT | REG | WIDE;
    IgetObjectQuick = 0xf4, "iget-object-quick", Format22cs, THROW | CONT | REG;
    IputQuick = 0xf5, "iput-quick", Format22cs, THROW | CONT;
    IputWideQuick = 0xf6, "iput-wide-quick", Format22cs, THROW | CONT;
    IputObjectQuick = 0xf7, "iput-object-quick", Format22cs, THROW | CONT;
    InvokeVirtualQuick = 0xf8, "invoke-virtual-quick", Format35ms, THROW | CONT | RESULT;
    InvokeVirtualQuickRange = 0xf9, "invoke-virtual-quick/range", Format3rms, THROW | CONT | RESULT;

    InvokePolymorphic = 0xfa, "invoke-polymorphic", Format45cc, THROW | CONT | RESULT;
    InvokePolymorphicRange = 0xfb, "invoke-polymorphic/range", Format4rcc, THROW | CONT | RESULT;
    InvokeCustom = 0xfc, "invoke-custom", Format35c, THROW | CONT | RESULT;
    InvokeCustomRange = 0xfd, "invoke-custom/range", Format3rc, THROW | CONT | RESULT;
    ConstMethodHandle = 0xfe, "const-method-handle", Format21c, THROW | CONT | REG;
    ConstMethodType = 0xff, "const-method-type", Format21c, THROW | CONT | REG;
    PackedSwitchPayload = 0x0100, "packed-switch-payload", PackedSwitchPayload, NONE;
    SparseSwitchPayload = 0x0200, "sparse-switch-payload", SparseSwitchPayload, NONE;
    ArrayPayload = 0x0300, "array-payload", ArrayPayload, NONE;
}

impl Opcode {
    pub fn can_throw(self) -> bool {
        self.flags().contains(OpcodeFlags::CAN_THROW)
    }

    pub fn can_continue(self) -> bool {
        self.flags().contains(OpcodeFlags::CAN_CONTINUE)
    }

    /// Is this one of the `goto` family (the only branches that get widened automatically)?
    pub fn is_goto(self) -> bool {
        matches!(self, Opcode::Goto | Opcode::Goto16 | Opcode::Goto32)
    }

    pub fn is_switch(self) -> bool {
        matches!(self, Opcode::PackedSwitch | Opcode::SparseSwitch)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn values_and_names_round_trip() {
        for opcode in Opcode::ALL {
            assert_eq!(Opcode::from_value(opcode.value()), Some(*opcode));
            assert_eq!(Opcode::from_name(opcode.name()), Some(*opcode));
        }
    }

    #[test]
    fn unused_values_are_unknown() {
        for unused in [0x3e, 0x43, 0x73, 0x79, 0x7a, 0xec, 0x0400] {
            assert_eq!(Opcode::from_value(unused), None, "{:#x}", unused);
        }
    }

    #[test]
    fn goto_family_sizes() {
        assert_eq!(Opcode::Goto.format().code_units(), Some(1));
        assert_eq!(Opcode::Goto16.format().code_units(), Some(2));
        assert_eq!(Opcode::Goto32.format().code_units(), Some(3));
        assert!(Opcode::Goto32.is_goto());
        assert!(!Opcode::IfEq.is_goto());
    }

    #[test]
    fn flags() {
        assert!(Opcode::Throw.can_throw());
        assert!(!Opcode::Throw.can_continue());
        assert!(!Opcode::ReturnVoid.can_continue());
        assert!(Opcode::Nop.can_continue());
        assert!(Opcode::InvokeStatic
            .flags()
            .contains(OpcodeFlags::SETS_RESULT | OpcodeFlags::CAN_THROW));
        assert!(Opcode::ConstWide
            .flags()
            .contains(OpcodeFlags::SETS_WIDE_REGISTER));
        assert!(!Opcode::ReturnVoidBarrier.can_continue());
        assert_eq!(Opcode::ExecuteInlineRange.format().code_units(), Some(3));
        assert!(Opcode::PackedSwitchPayload.format().is_payload());
        assert_eq!(Opcode::PackedSwitchPayload.format().code_units(), None);
    }
}
