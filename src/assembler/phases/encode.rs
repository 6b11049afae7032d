use crate::assembler::model::{EncodedInst, Operand, SymbolTable};
use crate::spec::hw::{param_from_addr, param_from_f64, GReg, Param, RegCaps};
use crate::spec::lang::{Encoder, Mnemonic, RESET_TARGETS};
use std::fmt::{self, Display};

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    MissingOperands {
        mnemonic: &'static str,
        expected: usize,
        found: usize,
    },
    /// The first operand of an arithmetic mnemonic named no register.
    UnknownRegister(String),
    /// The name resolved to a register without the required bus capability
    /// (or to no register at all, where only a register is acceptable).
    RegisterNotCapable {
        name: String,
        required: RegCaps,
    },
    /// The operand combination fits none of the mnemonic's encodings.
    BadShape {
        mnemonic: &'static str,
        detail: &'static str,
    },
    ConditionNotImmediate(Operand),
    UnresolvedLabel(String),
    UnknownResetTarget(String),
}

fn required_phrase(required: RegCaps) -> &'static str {
    if required == RegCaps::READ_MAIN {
        "readable through the main bus"
    } else if required == RegCaps::READ_SECONDARY {
        "readable through the secondary bus"
    } else if required == RegCaps::WRITABLE {
        "that is writable"
    } else if required == RegCaps::GPR {
        "that is general purpose"
    } else {
        "with the required capabilities"
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::MissingOperands {
                mnemonic,
                expected,
                found,
            } => write!(
                f,
                "expected at least {} operand(s) for '{}', found {}",
                expected, mnemonic, found
            ),
            Error::UnknownRegister(name) => {
                write!(f, "expected a register name, received '{}'", name)
            }
            Error::RegisterNotCapable { name, required } => write!(
                f,
                "expected a register {}, received '{}'",
                required_phrase(*required),
                name
            ),
            Error::BadShape { mnemonic, detail } => write!(f, "'{}': {}", mnemonic, detail),
            Error::ConditionNotImmediate(op) => write!(
                f,
                "expected the jump condition to be an immediate, received '{}'",
                op
            ),
            Error::UnresolvedLabel(name) => write!(
                f,
                "identifier '{}' names neither a register nor a declared label",
                name
            ),
            Error::UnknownResetTarget(name) => {
                write!(f, "no reset target named '{}'", name)
            }
        }
    }
}

/// Legalizes the operand list against the register/bus model and emits the
/// instruction record for one line.
pub fn encode(
    mn: &Mnemonic,
    operands: &[Operand],
    labels: &SymbolTable,
) -> Result<EncodedInst, Error> {
    match mn.encoder() {
        Encoder::Nullary => Ok(emit(mn, 0, 0, 0)),
        Encoder::Arithmetic => arithmetic(mn, operands),
        Encoder::RightShift => right_shift(mn, operands),
        Encoder::Negate => negate(mn, operands),
        Encoder::Mov => mov(mn, operands),
        Encoder::LoadImm => load_imm(mn, operands),
        Encoder::Push => push(mn, operands),
        Encoder::Pop => pop(mn, operands),
        Encoder::Reset => reset(mn, operands),
        Encoder::Jump { conditional } => jump(mn, conditional, operands, labels),
    }
}

fn emit(mn: &Mnemonic, selector: u8, param1: Param, param2: Param) -> EncodedInst {
    EncodedInst::new(mn.opcode(), selector, param1, param2)
}

fn require(mn: &Mnemonic, operands: &[Operand], expected: usize) -> Result<(), Error> {
    if operands.len() < expected {
        Err(Error::MissingOperands {
            mnemonic: mn.name(),
            expected,
            found: operands.len(),
        })
    } else {
        Ok(())
    }
}

fn capable(reg: GReg, name: &str, required: RegCaps) -> Result<GReg, Error> {
    if reg.caps().intersects(required) {
        Ok(reg)
    } else {
        Err(Error::RegisterNotCapable {
            name: name.to_owned(),
            required,
        })
    }
}

fn verify(name: &str, required: RegCaps) -> Result<GReg, Error> {
    GReg::verify(name, required).ok_or_else(|| Error::RegisterNotCapable {
        name: name.to_owned(),
        required,
    })
}

/// Both input buses feed the ALU: the first operand rides the main bus,
/// the second the secondary bus. A general-purpose first register may pair
/// with an immediate memory or port address instead.
fn arithmetic(mn: &Mnemonic, operands: &[Operand]) -> Result<EncodedInst, Error> {
    require(mn, operands, 2)?;

    match (&operands[0], &operands[1]) {
        (Operand::Immediate(a), Operand::Immediate(b)) => {
            Ok(emit(mn, 0b101, param_from_f64(*a), param_from_f64(*b)))
        }
        (Operand::Name(first), second) => {
            let reg = GReg::lookup(first).ok_or_else(|| Error::UnknownRegister(first.clone()))?;

            if reg.caps().contains(RegCaps::GPR) {
                match second {
                    Operand::ImmediatePort(addr) => {
                        return Ok(emit(mn, 0b011, reg.index(), param_from_f64(*addr)));
                    }
                    Operand::ImmediateMem(addr) => {
                        return Ok(emit(mn, 0b100, reg.index(), param_from_f64(*addr)));
                    }
                    _ => (),
                }
            }

            match second {
                Operand::Immediate(b) => Ok(emit(mn, 0b010, reg.index(), param_from_f64(*b))),
                Operand::Name(sec) => {
                    let reg2 = verify(sec, RegCaps::READ_SECONDARY)?;
                    Ok(emit(mn, 0b001, reg.index(), reg2.index()))
                }
                _ => Err(Error::BadShape {
                    mnemonic: mn.name(),
                    detail: "no encoding matches the second operand",
                }),
            }
        }
        _ => Err(Error::BadShape {
            mnemonic: mn.name(),
            detail: "expected a register or an immediate as the first operand",
        }),
    }
}

/// Right shift only reads the main input bus.
fn right_shift(mn: &Mnemonic, operands: &[Operand]) -> Result<EncodedInst, Error> {
    require(mn, operands, 1)?;

    match &operands[0] {
        Operand::Name(name) => {
            let reg = verify(name, RegCaps::READ_MAIN)?;
            Ok(emit(mn, 0b001, reg.index(), 0))
        }
        Operand::Immediate(v) => Ok(emit(mn, 0b101, param_from_f64(*v), 0)),
        Operand::ImmediateMem(v) => Ok(emit(mn, 0b100, 0, param_from_f64(*v))),
        Operand::ImmediatePort(v) => Ok(emit(mn, 0b011, 0, param_from_f64(*v))),
        _ => Err(Error::BadShape {
            mnemonic: mn.name(),
            detail: "expected a register, an immediate, or an immediate memory or port address",
        }),
    }
}

/// Negation only reads the secondary input bus.
fn negate(mn: &Mnemonic, operands: &[Operand]) -> Result<EncodedInst, Error> {
    require(mn, operands, 1)?;

    match &operands[0] {
        Operand::Name(name) => {
            let reg = verify(name, RegCaps::READ_SECONDARY)?;
            Ok(emit(mn, 0b001, 0, reg.index()))
        }
        Operand::Immediate(v) => Ok(emit(mn, 0b101, 0, param_from_f64(*v))),
        _ => Err(Error::BadShape {
            mnemonic: mn.name(),
            detail: "expected a register or an immediate",
        }),
    }
}

fn mov(mn: &Mnemonic, operands: &[Operand]) -> Result<EncodedInst, Error> {
    require(mn, operands, 2)?;

    match (&operands[0], &operands[1]) {
        // Source register travels over the main bus to a register, to
        // memory (register-dereferenced or immediate), or to a port.
        (Operand::Name(src), dst) => {
            let src_reg = verify(src, RegCaps::READ_MAIN)?;
            match dst {
                Operand::Name(name) => {
                    let dst_reg = verify(name, RegCaps::WRITABLE)?;
                    Ok(emit(mn, 0b001, src_reg.index(), dst_reg.index()))
                }
                Operand::DerefName(name) => {
                    let dst_reg = verify(name, RegCaps::READ_SECONDARY)?;
                    Ok(emit(mn, 0b010, src_reg.index(), dst_reg.index()))
                }
                Operand::ImmediateMem(addr) => {
                    Ok(emit(mn, 0b011, src_reg.index(), param_from_f64(*addr)))
                }
                Operand::ImmediatePort(addr) => {
                    Ok(emit(mn, 0b100, src_reg.index(), param_from_f64(*addr)))
                }
                _ => Err(Error::BadShape {
                    mnemonic: mn.name(),
                    detail: "no encoding matches the destination operand",
                }),
            }
        }
        // Loads into a writable register from memory or a port.
        (src, Operand::Name(dst)) => {
            let dst_reg = verify(dst, RegCaps::WRITABLE)?;
            match src {
                Operand::DerefName(name) => {
                    let src_reg = verify(name, RegCaps::READ_SECONDARY)?;
                    Ok(emit(mn, 0b101, src_reg.index(), dst_reg.index()))
                }
                Operand::ImmediateMem(addr) => {
                    Ok(emit(mn, 0b110, param_from_f64(*addr), dst_reg.index()))
                }
                Operand::ImmediatePort(addr) => {
                    Ok(emit(mn, 0b111, param_from_f64(*addr), dst_reg.index()))
                }
                _ => Err(Error::BadShape {
                    mnemonic: mn.name(),
                    detail:
                        "expected a dereferenced register or an immediate memory or port address \
                         as the source",
                }),
            }
        }
        _ => Err(Error::BadShape {
            mnemonic: mn.name(),
            detail: "no encoding matches the operand combination",
        }),
    }
}

fn load_imm(mn: &Mnemonic, operands: &[Operand]) -> Result<EncodedInst, Error> {
    require(mn, operands, 2)?;

    let value = match &operands[0] {
        Operand::Immediate(v) => param_from_f64(*v),
        _ => {
            return Err(Error::BadShape {
                mnemonic: mn.name(),
                detail: "expected the first operand to be an immediate",
            });
        }
    };

    match &operands[1] {
        Operand::Name(name) => {
            let reg = verify(name, RegCaps::WRITABLE)?;
            Ok(emit(mn, 0b001, value, reg.index()))
        }
        Operand::DerefName(name) => {
            let reg = verify(name, RegCaps::READ_SECONDARY)?;
            Ok(emit(mn, 0b010, value, reg.index()))
        }
        Operand::DerefPort(name) => {
            let reg = verify(name, RegCaps::READ_SECONDARY)?;
            Ok(emit(mn, 0b101, value, reg.index()))
        }
        Operand::ImmediateMem(addr) => Ok(emit(mn, 0b011, value, param_from_f64(*addr))),
        Operand::ImmediatePort(addr) => Ok(emit(mn, 0b100, value, param_from_f64(*addr))),
        _ => Err(Error::BadShape {
            mnemonic: mn.name(),
            detail: "expected the second operand to be a register or a dereferenced address",
        }),
    }
}

fn push(mn: &Mnemonic, operands: &[Operand]) -> Result<EncodedInst, Error> {
    require(mn, operands, 1)?;

    match &operands[0] {
        Operand::Name(name) => {
            let reg = verify(name, RegCaps::READ_MAIN)?;
            Ok(emit(mn, 0b001, reg.index(), 0))
        }
        Operand::Immediate(v) => Ok(emit(mn, 0b010, param_from_f64(*v), 0)),
        _ => Err(Error::BadShape {
            mnemonic: mn.name(),
            detail: "expected a register or an immediate",
        }),
    }
}

fn pop(mn: &Mnemonic, operands: &[Operand]) -> Result<EncodedInst, Error> {
    require(mn, operands, 1)?;

    match &operands[0] {
        Operand::Name(name) => {
            let reg = verify(name, RegCaps::GPR)?;
            Ok(emit(mn, 0b001, reg.index(), 0))
        }
        _ => Err(Error::BadShape {
            mnemonic: mn.name(),
            detail: "expected a register operand",
        }),
    }
}

fn reset(mn: &Mnemonic, operands: &[Operand]) -> Result<EncodedInst, Error> {
    require(mn, operands, 1)?;

    match &operands[0] {
        Operand::Name(name) => match RESET_TARGETS.iter().position(|t| *t == name.as_str()) {
            Some(pos) => Ok(emit(mn, (pos + 1) as u8, 0, 0)),
            None => Err(Error::UnknownResetTarget(name.clone())),
        },
        _ => Err(Error::BadShape {
            mnemonic: mn.name(),
            detail: "expected an identifier operand",
        }),
    }
}

fn jump(
    mn: &Mnemonic,
    conditional: bool,
    operands: &[Operand],
    labels: &SymbolTable,
) -> Result<EncodedInst, Error> {
    require(mn, operands, if conditional { 2 } else { 1 })?;

    let cond = if conditional {
        match &operands[1] {
            Operand::Immediate(v) => param_from_f64(*v),
            op => return Err(Error::ConditionNotImmediate(op.clone())),
        }
    } else {
        0
    };

    match &operands[0] {
        Operand::Name(name) => match GReg::lookup(name) {
            Some(reg) => {
                capable(reg, name, RegCaps::READ_MAIN)?;
                Ok(emit(mn, 0b010, reg.index(), cond))
            }
            None => label_target(mn, name, cond, labels),
        },
        Operand::DerefName(name) => match GReg::lookup(name) {
            Some(reg) => {
                capable(reg, name, RegCaps::READ_SECONDARY)?;
                Ok(emit(mn, 0b100, reg.index(), cond))
            }
            None => label_target(mn, name, cond, labels),
        },
        Operand::DerefPort(name) => match GReg::lookup(name) {
            Some(reg) => {
                capable(reg, name, RegCaps::READ_SECONDARY)?;
                Ok(emit(mn, 0b110, reg.index(), cond))
            }
            None => label_target(mn, name, cond, labels),
        },
        Operand::ImmediateMem(v) => Ok(emit(mn, 0b011, param_from_f64(*v), cond)),
        Operand::ImmediatePort(v) => Ok(emit(mn, 0b101, param_from_f64(*v), cond)),
        Operand::Immediate(v) => Ok(emit(mn, 0b001, param_from_f64(*v), cond)),
    }
}

/// An identifier target that names no register resolves through the symbol
/// table. Translation is single-pass, so only labels declared earlier in
/// source order can resolve.
fn label_target(
    mn: &Mnemonic,
    name: &str,
    cond: Param,
    labels: &SymbolTable,
) -> Result<EncodedInst, Error> {
    match labels.lookup(name) {
        Some(addr) => Ok(emit(mn, 0b001, param_from_addr(addr), cond)),
        None => Err(Error::UnresolvedLabel(name.to_owned())),
    }
}
