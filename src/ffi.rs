//! FFI bindings for Somni Drift
//!
//! This module provides C-compatible functions for calling the engine from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `somni_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::adapters::parse_export;
use crate::analyzer::{analyze, analyze_json};
use crate::config::MIN_RECORDS;
use crate::error::AnalysisError;
use crate::types::SleepRecord;
use crate::validation::{check_records, validate_records};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Record an analysis error as `CODE: message`
fn set_analysis_error(err: &AnalysisError) {
    set_last_error(&format!("{}: {}", err.code(), err));
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Convert a result into an owned C string, recording any error
fn finish(result: Result<String, AnalysisError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_analysis_error(&e);
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Analysis API
// ============================================================================

/// Analyze a JSON array of sleep records and return the result JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `somni_free_string`.
/// - Returns NULL on error; call `somni_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn somni_analyze_json(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    finish(analyze_json(&json_str))
}

/// Parse a wearable export (JSON, Fitbit CSV, Oura CSV or Apple Health XML),
/// validate it and return the result JSON.
///
/// # Safety
/// - `content` and `filename` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `somni_free_string`.
/// - Returns NULL on error; call `somni_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn somni_analyze_export(
    content: *const c_char,
    filename: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let content_str = match cstr_to_string(content) {
        Some(s) => s,
        None => {
            set_last_error("Invalid content string pointer");
            return ptr::null_mut();
        }
    };

    let filename_str = match cstr_to_string(filename) {
        Some(s) => s,
        None => {
            set_last_error("Invalid filename string pointer");
            return ptr::null_mut();
        }
    };

    finish(analyze_export(&content_str, &filename_str))
}

fn analyze_export(content: &str, filename: &str) -> Result<String, AnalysisError> {
    let records = parse_export(content, filename)?;
    check_records(&records, MIN_RECORDS)?;
    Ok(analyze(&records)?.to_json()?)
}

/// Validate a JSON array of sleep records and return a validation report JSON.
///
/// Range and count problems are reported in the JSON (`"valid": false`);
/// NULL is returned only when the input cannot be parsed at all.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `somni_free_string`.
#[no_mangle]
pub unsafe extern "C" fn somni_validate_json(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    finish(validate_json(&json_str))
}

fn validate_json(json: &str) -> Result<String, AnalysisError> {
    let records: Vec<SleepRecord> = serde_json::from_str(json)?;
    Ok(serde_json::to_string(&validate_records(&records, MIN_RECORDS))?)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Somni functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Somni function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn somni_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Somni function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn somni_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn somni_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
