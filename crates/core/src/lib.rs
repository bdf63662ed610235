//! GenAIL script language core.
//!
//! Pure building blocks of the script engine: the statement grammar, typed
//! variable values, placeholder rendering, the bounded output buffer and the
//! result envelope. Nothing here performs I/O.

pub mod error;
pub mod limits;
pub mod output;
pub mod result;
pub mod statement;
pub mod template;
pub mod value;
