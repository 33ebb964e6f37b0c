//! FFI bindings for the habit tracker core
//!
//! This module provides C-compatible functions so the mobile host can call the
//! codec, calendar and statistics code. All functions take and return C strings
//! (null-terminated, UTF-8); structured values travel as JSON. Returned strings
//! are newly allocated and must be freed by the caller using `habit_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::{Locale, NaiveDate};

use crate::calendar::{CalendarHeaderAggregator, CalendarLayout};
use crate::codec::HabitTypeCodec;
use crate::config::{parse_locale, system_locale};
use crate::error::TrackerError;
use crate::stats::HabitStats;
use crate::types::{HabitType, PeriodData};

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

/// Read a required string argument, recording an error when it is missing
unsafe fn required_arg(ptr: *const c_char, name: &str) -> Option<String> {
    let value = cstr_to_string(ptr);
    if value.is_none() {
        set_last_error(&format!("Invalid {name} string pointer"));
    }
    value
}

/// Locale argument; NULL means the runtime default
unsafe fn locale_arg(ptr: *const c_char) -> Result<Locale, TrackerError> {
    match cstr_to_string(ptr) {
        Some(name) => parse_locale(&name),
        None => Ok(system_locale()),
    }
}

/// Turn a computation result into a returned string or a recorded error
fn finish(result: Result<String, TrackerError>) -> *mut c_char {
    match result {
        Ok(s) => string_to_cstr(&s),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Habit type codec
// ============================================================================

/// Encode a habit type given as JSON into its storage string.
///
/// # Safety
/// - `type_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `habit_free_string`.
/// - Returns NULL on error; call `habit_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn habit_encode_type(type_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(json) = required_arg(type_json, "type JSON") else {
        return ptr::null_mut();
    };

    finish((|| -> Result<String, TrackerError> {
        let habit_type: HabitType = serde_json::from_str(&json)?;
        habit_type.validate()?;
        Ok(HabitTypeCodec::encode(&habit_type))
    })())
}

/// Decode a storage string into habit type JSON.
///
/// # Safety
/// - `encoded` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `habit_free_string`.
/// - Returns NULL on error; call `habit_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn habit_decode_type(encoded: *const c_char) -> *mut c_char {
    clear_last_error();

    let Some(encoded) = required_arg(encoded, "encoded type") else {
        return ptr::null_mut();
    };

    finish((|| -> Result<String, TrackerError> {
        let habit_type = HabitTypeCodec::decode(&encoded)?;
        Ok(serde_json::to_string(&habit_type)?)
    })())
}

// ============================================================================
// Calendar and statistics
// ============================================================================

/// Compute year and month header runs for a JSON array of ascending,
/// de-duplicated dates (`["2024-01-30", "2024-01-31"]`).
///
/// # Safety
/// - `dates_json` must be a valid null-terminated C string.
/// - `locale` must be a valid null-terminated C string or NULL for the default.
/// - Returns a newly allocated string that must be freed with `habit_free_string`.
/// - Returns NULL on error; call `habit_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn habit_calendar_headers(
    dates_json: *const c_char,
    locale: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(json) = required_arg(dates_json, "dates JSON") else {
        return ptr::null_mut();
    };

    let locale = locale_arg(locale);

    finish((|| -> Result<String, TrackerError> {
        let dates: Vec<NaiveDate> = serde_json::from_str(&json)?;
        let aggregator = CalendarHeaderAggregator::new(locale?);
        Ok(serde_json::to_string(&aggregator.aggregate(&dates))?)
    })())
}

/// Lay out the contribution calendar for a JSON array of periods.
///
/// # Safety
/// - `periods_json` and `encoded_type` must be valid null-terminated C strings.
/// - `locale` must be a valid null-terminated C string or NULL for the default.
/// - Returns a newly allocated string that must be freed with `habit_free_string`.
/// - Returns NULL on error; call `habit_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn habit_calendar_layout(
    periods_json: *const c_char,
    encoded_type: *const c_char,
    renewal_hours: u32,
    locale: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(json) = required_arg(periods_json, "periods JSON") else {
        return ptr::null_mut();
    };
    let Some(encoded) = required_arg(encoded_type, "encoded type") else {
        return ptr::null_mut();
    };

    let locale = locale_arg(locale);

    finish((|| -> Result<String, TrackerError> {
        let periods: Vec<PeriodData> = serde_json::from_str(&json)?;
        let habit_type = HabitTypeCodec::decode(&encoded)?;
        let aggregator = CalendarHeaderAggregator::new(locale?);
        let layout = CalendarLayout::build(&periods, &habit_type, renewal_hours, &aggregator);
        Ok(serde_json::to_string(&layout)?)
    })())
}

/// Compute streak statistics for a JSON array of periods.
///
/// # Safety
/// - `periods_json` and `encoded_type` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `habit_free_string`.
/// - Returns NULL on error; call `habit_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn habit_stats(
    periods_json: *const c_char,
    encoded_type: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(json) = required_arg(periods_json, "periods JSON") else {
        return ptr::null_mut();
    };
    let Some(encoded) = required_arg(encoded_type, "encoded type") else {
        return ptr::null_mut();
    };

    finish((|| -> Result<String, TrackerError> {
        let periods: Vec<PeriodData> = serde_json::from_str(&json)?;
        let habit_type = HabitTypeCodec::decode(&encoded)?;
        Ok(serde_json::to_string(&HabitStats::from_periods(
            &periods,
            &habit_type,
        ))?)
    })())
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by habit functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a habit function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn habit_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next habit function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn habit_last_error() -> *const c_char {
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
pub unsafe extern "C" fn habit_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        habit_free_string(ptr);
        s
    }

    unsafe fn last_error() -> String {
        let error = habit_last_error();
        assert!(!error.is_null());
        CStr::from_ptr(error).to_str().unwrap().to_string()
    }

    #[test]
    fn test_ffi_encode_decode() {
        let json = CString::new(r#"{"kind":"numeric","unit":"km","target":5.0}"#).unwrap();

        unsafe {
            let encoded = take_string(habit_encode_type(json.as_ptr()));
            assert_eq!(encoded, "NUMERIC|km|5.0||");

            let encoded = CString::new(encoded).unwrap();
            let decoded = take_string(habit_decode_type(encoded.as_ptr()));
            let value: serde_json::Value = serde_json::from_str(&decoded).unwrap();
            assert_eq!(value["kind"], "numeric");
            assert_eq!(value["unit"], "km");
            assert_eq!(value["target"], 5.0);
            assert_eq!(value["prefix"], "");
        }
    }

    #[test]
    fn test_ffi_decode_error() {
        let bad = CString::new("NUMERIC|km|notanumber").unwrap();

        unsafe {
            let result = habit_decode_type(bad.as_ptr());
            assert!(result.is_null());
            assert!(last_error().contains("notanumber"));
        }
    }

    #[test]
    fn test_ffi_null_argument() {
        unsafe {
            let result = habit_decode_type(ptr::null());
            assert!(result.is_null());
            assert!(last_error().contains("encoded type"));
        }
    }

    #[test]
    fn test_ffi_calendar_headers() {
        let dates = CString::new(r#"["2023-12-31", "2024-01-01", "2024-01-02"]"#).unwrap();
        let locale = CString::new("en_US").unwrap();

        unsafe {
            let json = take_string(habit_calendar_headers(dates.as_ptr(), locale.as_ptr()));
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(value["years"][0]["label"], "2023");
            assert_eq!(value["years"][1]["day_count"], 2);
            assert_eq!(value["months"][0]["label"], "Dec");
            assert_eq!(value["months"][1]["label"], "Jan");
        }
    }

    #[test]
    fn test_ffi_calendar_layout_and_stats() {
        let periods = CString::new(
            r#"[
                {"start_time": "2024-01-01T00:00:00", "end_time": "2024-01-02T00:00:00", "is_completed": true},
                {"start_time": "2024-01-02T00:00:00", "end_time": "2024-01-03T00:00:00", "is_completed": false}
            ]"#,
        )
        .unwrap();
        let encoded = CString::new("BOOLEAN").unwrap();
        let locale = CString::new("en_US").unwrap();

        unsafe {
            let json = take_string(habit_calendar_layout(
                periods.as_ptr(),
                encoded.as_ptr(),
                24,
                locale.as_ptr(),
            ));
            let layout: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(layout["days"][0]["cells"][0], "complete");
            assert_eq!(layout["days"][1]["cells"][0], "empty");
            assert_eq!(layout["headers"]["months"][0]["day_count"], 2);

            let json = take_string(habit_stats(periods.as_ptr(), encoded.as_ptr()));
            let stats: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(stats["best_streak"], 1);
            assert_eq!(stats["current_streak"], 0);
            assert_eq!(stats["success_rate"], 50.0);
        }
    }

    #[test]
    fn test_ffi_null_locale_uses_default() {
        let dates = CString::new(r#"["2024-01-30", "2024-01-31", "2024-02-01"]"#).unwrap();

        unsafe {
            let result = habit_calendar_headers(dates.as_ptr(), ptr::null());
            assert!(habit_last_error().is_null());
            let json = take_string(result);
            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(value["years"][0]["day_count"], 3);
            assert_eq!(value["months"][0]["day_count"], 2);
            assert_eq!(value["months"][1]["day_count"], 1);
        }
    }

    #[test]
    fn test_ffi_unknown_locale() {
        let dates = CString::new(r#"["2024-01-01"]"#).unwrap();
        let locale = CString::new("zz_ZZ").unwrap();

        unsafe {
            let result = habit_calendar_headers(dates.as_ptr(), locale.as_ptr());
            assert!(result.is_null());
            assert!(last_error().contains("zz_ZZ"));
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = habit_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
