use log::error;
use std::ffi::{CStr, CString, c_char};
use std::ptr;
use thiserror::Error;

pub mod analysis;
pub mod lexer;
pub mod parser;
pub mod source;
pub mod walk;

pub use analysis::diagnostic::{Diagnostic, DiagnosticSeverity};
pub use analysis::diagnostic_printer::DiagnosticPrinter;
pub use analysis::external_api::CheckerConfig;
pub use analysis::{CheckAborted, SyntaxChecker};
pub use source::Source;

#[derive(Debug, Error)]
pub enum EsCheckError {
    #[error("{rendered}")]
    Parse {
        rendered: String,
        source: parser::ParseError,
    },
    #[error(transparent)]
    Walk(#[from] CheckAborted),
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("UTF-8 conversion error: {0}")]
    Utf8Error(String),
    #[error("Null pointer passed for {0}")]
    NullPointer(&'static str),
}

thread_local! {
    static LAST_ERROR: std::cell::RefCell<Option<String>> = const { std::cell::RefCell::new(None) };
}

/// Records `err` as the error of the last call on this thread
pub fn es_check_error(err: &str) {
    LAST_ERROR.with(|last| *last.borrow_mut() = Some(err.to_string()));
    error!("{}", err);
}

fn clear_error() {
    LAST_ERROR.with(|last| *last.borrow_mut() = None);
}

/// Reads a borrowed C string as UTF-8
///
/// # Safety
///
/// `ptr` must be null or point to a nul terminated string that stays alive for
/// `'a`.
unsafe fn str_arg<'a>(ptr: *const c_char, name: &'static str) -> Result<&'a str, EsCheckError> {
    if ptr.is_null() {
        return Err(EsCheckError::NullPointer(name));
    }
    unsafe { CStr::from_ptr(ptr) }
        .to_str()
        .map_err(|err| EsCheckError::Utf8Error(err.to_string()))
}

/// # Safety
///
/// Same contract as [`es_check_source`].
unsafe fn check_raw(code: *const c_char, path: *const c_char) -> Result<CString, EsCheckError> {
    let code = unsafe { str_arg(code, "code") }?;
    let path = unsafe { str_arg(path, "path") }?;
    let diagnostics = SyntaxChecker::es5().check_source(Source::new(path, code))?;
    let rendered = DiagnosticPrinter::new(false).sprint_errors(&diagnostics);
    CString::new(rendered).map_err(|err| EsCheckError::Utf8Error(err.to_string()))
}

/// Checks `code` against the es5 rules and returns the rendered diagnostics,
/// one per line. A clean source gives an empty string.
///
/// On failure (null or non UTF-8 arguments, a syntax error) a null pointer is
/// returned and the error can be read with `es_check_get_errors`.
///
/// you have to free the returned string using `es_check_free_string`
///
/// # Safety
///
/// `code` and `path` must be null or valid nul terminated strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn es_check_source(code: *const c_char, path: *const c_char) -> *mut c_char {
    clear_error();
    match unsafe { check_raw(code, path) } {
        Ok(rendered) => rendered.into_raw(),
        Err(err) => {
            es_check_error(&err.to_string());
            ptr::null_mut()
        }
    }
}

/// classic get errors function, returns the error of the last `es_check_source` call on this thread, if that call succeeded returns a null pointer
///
/// you have to free the returned string using `es_check_free_string`
#[unsafe(no_mangle)]
pub extern "C" fn es_check_get_errors() -> *mut c_char {
    LAST_ERROR.with(|last| match last.borrow().as_deref() {
        Some(last_error) => match CString::new(last_error) {
            Ok(cstring) => cstring.into_raw(),
            Err(_) => ptr::null_mut(),
        },
        None => ptr::null_mut(),
    })
}

/// Use to free any strings allocated by this library
///
/// # Safety
///
/// `ptr` must be null or a pointer previously returned by this library that has
/// not been freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn es_check_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(unsafe { CString::from_raw(ptr) });
    }
}
