/// PM/0 opcodes.
///
/// The discriminants are the numbers written to the first word of every
/// instruction, both in the bytecode file and in machine memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Op {
    /// Push the modifier as a literal.
    Lit = 1,
    /// Arithmetic, comparison or return, selected by an [`Opr`] sub-code.
    Opr,
    /// Push a variable found `level` static links away.
    Lod,
    /// Pop into a variable found `level` static links away.
    Sto,
    /// Call the procedure at a word address, building a new activation record.
    Cal,
    /// Reserve stack slots.
    Inc,
    /// Unconditional jump to a word address.
    Jmp,
    /// Pop; jump to a word address when the popped value is zero.
    Jpc,
    /// System call selected by a [`Syscall`] number.
    Sys,
}

impl Op {
    pub const fn code(self) -> i32 {
        self as i32
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            Op::Lit => "LIT",
            Op::Opr => "OPR",
            Op::Lod => "LOD",
            Op::Sto => "STO",
            Op::Cal => "CAL",
            Op::Inc => "INC",
            Op::Jmp => "JMP",
            Op::Jpc => "JPC",
            Op::Sys => "SYS",
        }
    }
}

impl TryFrom<i32> for Op {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, i32> {
        Ok(match code {
            1 => Op::Lit,
            2 => Op::Opr,
            3 => Op::Lod,
            4 => Op::Sto,
            5 => Op::Cal,
            6 => Op::Inc,
            7 => Op::Jmp,
            8 => Op::Jpc,
            9 => Op::Sys,
            _ => return Err(code),
        })
    }
}

/// Sub-operations of [`Op::Opr`], carried in the modifier word.
///
/// Binary operations pop the right operand, then replace the left operand
/// with the result. Comparisons produce `1` or `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opr {
    /// Return from the current activation record.
    Rtn = 0,
    Add,
    Sub,
    Mul,
    Div,
    Eql,
    Neq,
    Lss,
    Leq,
    Gtr,
    Geq,
    /// Replace the top of stack with `1` if it is even, else `0`.
    Even,
}

impl Opr {
    pub const fn code(self) -> i32 {
        self as i32
    }

    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opr::Rtn => "RTN",
            Opr::Add => "ADD",
            Opr::Sub => "SUB",
            Opr::Mul => "MUL",
            Opr::Div => "DIV",
            Opr::Eql => "EQL",
            Opr::Neq => "NEQ",
            Opr::Lss => "LSS",
            Opr::Leq => "LEQ",
            Opr::Gtr => "GTR",
            Opr::Geq => "GEQ",
            Opr::Even => "EVEN",
        }
    }
}

impl TryFrom<i32> for Opr {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, i32> {
        Ok(match code {
            0 => Opr::Rtn,
            1 => Opr::Add,
            2 => Opr::Sub,
            3 => Opr::Mul,
            4 => Opr::Div,
            5 => Opr::Eql,
            6 => Opr::Neq,
            7 => Opr::Lss,
            8 => Opr::Leq,
            9 => Opr::Gtr,
            10 => Opr::Geq,
            11 => Opr::Even,
            _ => return Err(code),
        })
    }
}

/// Selectors of [`Op::Sys`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Syscall {
    /// Pop the top of stack and write it to the console.
    Write = 1,
    /// Read one integer from the console and push it.
    Read,
    /// Stop the machine.
    Halt,
}

impl Syscall {
    pub const fn code(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for Syscall {
    type Error = i32;

    fn try_from(code: i32) -> Result<Self, i32> {
        Ok(match code {
            1 => Syscall::Write,
            2 => Syscall::Read,
            3 => Syscall::Halt,
            _ => return Err(code),
        })
    }
}
