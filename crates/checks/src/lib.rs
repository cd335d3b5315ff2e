//! Check-writing domain module (event-sourced).
//!
//! A check carries its amount and the printed legend derived from it; the
//! legend is recomputed whenever the amount changes and is never edited
//! directly.

pub mod check;

pub use check::{
    AmendCheck, BankAccount, Check, CheckAmended, CheckCleared, CheckCommand, CheckDetails,
    CheckEvent, CheckId, CheckNumber, CheckPrinted, CheckStatus, CheckVoided, CheckWritten,
    MarkCheckCleared, MarkCheckPrinted, VoidCheck, WriteCheck,
};
