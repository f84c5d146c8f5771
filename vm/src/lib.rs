//! # PM/0 virtual machine
//!
//! A stack machine with a single linear memory shared by code and stack,
//! block-structured activation records, and a console seam for `SYS`
//! read and write.
//!
//! ```rust
//! use pm0_bytecode::{CodeBuilder, Syscall};
//! use pm0_vm::{BufferedConsole, Machine, MachineSettings};
//!
//! let mut code = CodeBuilder::new();
//! code.lit(42).unwrap();
//! code.sys(Syscall::Write).unwrap();
//! code.sys(Syscall::Halt).unwrap();
//!
//! let mut vm = Machine::with_program(&MachineSettings::default(), &code.into_program()).unwrap();
//! let mut console = BufferedConsole::default();
//! vm.run(&mut console, |_| {}).unwrap();
//! assert_eq!(console.output(), &[42]);
//! ```

pub mod console;
pub mod error;
pub mod machine;
pub mod trace;

pub use console::{BufferedConsole, Console, OUTPUT_PREFIX, READ_PROMPT, TextConsole};
pub use error::VmError;
pub use machine::{DEFAULT_MEMORY_SIZE, Machine, MachineSettings};
pub use trace::{Registers, TRACE_HEADER, TraceRecord};
