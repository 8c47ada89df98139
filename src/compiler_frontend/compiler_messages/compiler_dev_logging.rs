//! Developer logging for each translation phase.
//!
//! Every macro prints through `saying` when its cargo feature is on and expands to nothing otherwise,
//! so release builds carry no logging code at all.
//!
//! | macro          | feature           | phase                      |
//! |----------------|-------------------|----------------------------|
//! | `token_log!`   | `show_tokens`     | tokenizer                  |
//! | `ast_log!`     | `show_ast`        | recursive descent parser   |
//! | `hir_log!`     | `show_hir`        | lowering and validation    |
//! | `codegen_log!` | `show_codegen`    | bytecode emission          |
//! | `timer_log!`   | `detailed_timers` | per phase timings          |

#[macro_export]
#[cfg(feature = "show_tokens")]
macro_rules! token_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_tokens"))]
macro_rules! token_log {
    ($($arg:tt)*) => {};
}

#[macro_export]
#[cfg(feature = "show_ast")]
macro_rules! ast_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_ast"))]
macro_rules! ast_log {
    ($($arg:tt)*) => {};
}

#[macro_export]
#[cfg(feature = "show_hir")]
macro_rules! hir_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_hir"))]
macro_rules! hir_log {
    ($($arg:tt)*) => {};
}

/// Emitted instructions with their offsets, and the address each function lands at.
#[macro_export]
#[cfg(feature = "show_codegen")]
macro_rules! codegen_log {
    ($($arg:tt)*) => {
        saying::say!($($arg)*);
    };
}

#[macro_export]
#[cfg(not(feature = "show_codegen"))]
macro_rules! codegen_log {
    ($($arg:tt)*) => {};
}

/// `timer_log!(start, "Tokenized in: ")` prints the message and the time elapsed since `start`.
#[macro_export]
#[cfg(feature = "detailed_timers")]
macro_rules! timer_log {
    ($time:expr, $msg:expr) => {
        saying::say!($msg, Green #$time.elapsed());
    };
}

#[macro_export]
#[cfg(not(feature = "detailed_timers"))]
macro_rules! timer_log {
    ($time:expr, $msg:expr) => {
        let _ = &$time;
    };
}
