use bitflags::bitflags;
use enum_map::{enum_map, Enum, EnumMap};
use once_cell::sync::Lazy;
use static_assertions::const_assert;
use std::fmt::{self, Display};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

pub const OPCODE_WIDTH: usize = 5;
pub const SELECTOR_WIDTH: usize = 3;
pub const PARAM_WIDTH: usize = 8;

pub const OPCODE_MASK: u8 = (1 << OPCODE_WIDTH) - 1;
pub const SELECTOR_MASK: u8 = (1 << SELECTOR_WIDTH) - 1;

/// An emitted instruction line is 5 + 3 + 8 + 8 bits of payload.
pub const LINE_WIDTH: usize = OPCODE_WIDTH + SELECTOR_WIDTH + 2 * PARAM_WIDTH;
const_assert!(LINE_WIDTH == 24);

/// An 8-bit instruction parameter: a register encoding index, a truncated
/// numeric literal, or a label address.
pub type Param = u8;

/// Literals are carried through parsing as `f64` and truncated toward zero
/// down to the low 8 bits when they reach an instruction field.
pub fn param_from_f64(v: f64) -> Param {
    (v as i64) as Param
}

pub fn param_from_addr(addr: usize) -> Param {
    addr as Param
}

bitflags! {
    pub struct RegCaps: u8 {
        const READ_SECONDARY = 1 << 0;
        const WRITABLE       = 1 << 1;
        const READ_MAIN      = 1 << 2;
        const GPR            = 1 << 3;
    }
}

const_assert!(RegCaps::all().bits() == 0b1111);

/// The Graphite register file. Encoding indices are 1-based: index 0 is
/// reserved and never names a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum, EnumIter)]
pub enum GReg {
    Ax,
    Bx,
    Cx,
    Dx,
    Ex,
    Fx,
    Gx,
}

static CAPS: Lazy<EnumMap<GReg, RegCaps>> = Lazy::new(|| {
    enum_map! {
        GReg::Ax => RegCaps::all(),
        GReg::Bx => RegCaps::all(),
        GReg::Cx => RegCaps::all(),
        GReg::Dx => RegCaps::all(),
        GReg::Ex => RegCaps::all(),
        GReg::Fx => RegCaps::all(),
        GReg::Gx => RegCaps::all(),
    }
});

impl GReg {
    pub fn name(self) -> &'static str {
        match self {
            GReg::Ax => "ax",
            GReg::Bx => "bx",
            GReg::Cx => "cx",
            GReg::Dx => "dx",
            GReg::Ex => "ex",
            GReg::Fx => "fx",
            GReg::Gx => "gx",
        }
    }

    pub fn index(self) -> Param {
        self as Param + 1
    }

    pub fn caps(self) -> RegCaps {
        CAPS[self]
    }

    pub fn lookup(name: &str) -> Option<GReg> {
        GReg::iter().find(|reg| reg.name() == name)
    }

    /// A register satisfies a requirement if it carries *any* of the
    /// requested capability bits, not the exact set.
    pub fn verify(name: &str, required: RegCaps) -> Option<GReg> {
        GReg::lookup(name).filter(|reg| reg.caps().intersects(required))
    }
}

impl Display for GReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
