//! FFI bindings for Synheart Vitals
//!
//! This module provides C-compatible functions for calling Vitals from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `vitals_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::pipeline::{compute_metric, VitalsProcessor};
use crate::retriever::DirectoryRetriever;
use crate::types::{DataScope, Vendor};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

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

fn parse_scopes(csv: &str) -> Result<Vec<DataScope>, String> {
    if csv.trim().is_empty() {
        return Ok(DataScope::ALL.to_vec());
    }
    csv.split(',')
        .map(|s| s.parse::<DataScope>().map_err(|e| e.to_string()))
        .collect()
}

// ============================================================================
// Stateless API
// ============================================================================

/// Compute one metric and return its response body as JSON.
///
/// Computation failures are reported inside the returned JSON as
/// `{"error": "..."}`; NULL is only returned for invalid arguments.
///
/// # Safety
/// - `scope`, `date`, and `json` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `vitals_free_string`.
/// - Returns NULL on error; call `vitals_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitals_compute_metric(
    scope: *const c_char,
    date: *const c_char,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let scope = match cstr_to_string(scope).map(|s| s.parse::<DataScope>()) {
        Some(Ok(scope)) => scope,
        Some(Err(e)) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
        None => {
            set_last_error("Invalid scope string pointer");
            return ptr::null_mut();
        }
    };

    let date_str = match cstr_to_string(date) {
        Some(s) => s,
        None => {
            set_last_error("Invalid date string pointer");
            return ptr::null_mut();
        }
    };

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let response = compute_metric(scope, &date_str, &json_str);
    match response.body_json() {
        Ok(body) => string_to_cstr(&body),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a processor reading fixture payloads from a directory
pub struct VitalsProcessorHandle {
    processor: VitalsProcessor<DirectoryRetriever>,
}

/// Create a processor over `<data_dir>/<date>/<scope>.json` payloads.
///
/// # Safety
/// - `data_dir` must be a valid null-terminated C string.
/// - Must be freed with `vitals_processor_free`.
/// - Returns NULL on error.
#[no_mangle]
pub unsafe extern "C" fn vitals_processor_new(data_dir: *const c_char) -> *mut VitalsProcessorHandle {
    clear_last_error();

    let dir = match cstr_to_string(data_dir) {
        Some(s) => s,
        None => {
            set_last_error("Invalid data_dir string pointer");
            return ptr::null_mut();
        }
    };

    let retriever = DirectoryRetriever::new(Vendor::Fitbit, dir);
    let handle = Box::new(VitalsProcessorHandle {
        processor: VitalsProcessor::new(retriever),
    });
    Box::into_raw(handle)
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `vitals_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn vitals_processor_free(processor: *mut VitalsProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Build a report for `date` over comma-separated `scopes` (empty for all).
///
/// # Safety
/// - `processor` must be a valid pointer returned by `vitals_processor_new`.
/// - `date` and `scopes` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `vitals_free_string`.
/// - Returns NULL on error; call `vitals_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn vitals_processor_report(
    processor: *const VitalsProcessorHandle,
    date: *const c_char,
    scopes: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;

    let date_str = match cstr_to_string(date) {
        Some(s) => s,
        None => {
            set_last_error("Invalid date string pointer");
            return ptr::null_mut();
        }
    };

    let scope_list = match cstr_to_string(scopes).map(|s| parse_scopes(&s)) {
        Some(Ok(list)) => list,
        Some(Err(e)) => {
            set_last_error(&e);
            return ptr::null_mut();
        }
        None => {
            set_last_error("Invalid scopes string pointer");
            return ptr::null_mut();
        }
    };

    let report = handle.processor.report(&scope_list, &date_str, None);
    match serde_json::to_string(&report) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Vitals functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Vitals function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn vitals_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next Vitals function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn vitals_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the Vitals library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn vitals_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
