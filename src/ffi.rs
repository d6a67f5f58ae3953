//! FFI bindings for Dayflux
//!
//! This module provides C-compatible functions for calling Dayflux from other
//! languages. All functions take C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using
//! `dayflux_free_string`.
//!
//! Datasets use any layout accepted by [`RawDayAdapter`]. A NULL config
//! selects the default dashboard config.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use chrono::NaiveDate;

use crate::aggregate::TimeRange;
use crate::config::DashboardConfig;
use crate::encoder::SnapshotEncoder;
use crate::error::ComputeError;
use crate::normalizer::parse_date;
use crate::pipeline::DashboardProcessor;
use crate::schema::{DatasetFormat, RawDayAdapter, ValidationReport};

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

/// Hand a result across the boundary, recording the error on failure
fn into_c_result(result: Result<String, String>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(msg) => {
            set_last_error(&msg);
            ptr::null_mut()
        }
    }
}

unsafe fn required_arg(ptr: *const c_char, name: &str) -> Result<String, String> {
    cstr_to_string(ptr).ok_or_else(|| format!("Invalid {name} string pointer"))
}

/// NULL selects the default config
unsafe fn optional_config(ptr: *const c_char) -> Result<DashboardConfig, String> {
    if ptr.is_null() {
        return Ok(DashboardConfig::default());
    }
    let json = required_arg(ptr, "config")?;
    DashboardConfig::from_json(&json).map_err(|e| e.to_string())
}

fn load_processor(
    dataset: &str,
    config: DashboardConfig,
) -> Result<DashboardProcessor, ComputeError> {
    DashboardProcessor::from_json(dataset, DatasetFormat::Auto, config)
}

// ============================================================================
// Dashboard API
// ============================================================================

/// Compute a dashboard snapshot for one category.
///
/// `range_json` is a serialized `TimeRange` such as `{"kind":"last_days","value":7}`;
/// NULL selects every recorded day.
///
/// # Safety
/// - `dataset_json` and `category` must be valid null-terminated C strings.
/// - `config_json` and `range_json` may be NULL.
/// - Returns a newly allocated string that must be freed with `dayflux_free_string`.
/// - Returns NULL on error; call `dayflux_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn dayflux_snapshot_json(
    dataset_json: *const c_char,
    config_json: *const c_char,
    category: *const c_char,
    range_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let result = (|| -> Result<String, String> {
        let dataset = required_arg(dataset_json, "dataset")?;
        let config = optional_config(config_json)?;
        let category = required_arg(category, "category")?;
        let range = if range_json.is_null() {
            TimeRange::All
        } else {
            let json = required_arg(range_json, "range")?;
            serde_json::from_str::<TimeRange>(&json).map_err(|e| e.to_string())?
        };

        let mut processor = load_processor(&dataset, config).map_err(|e| e.to_string())?;
        let category = processor.category(&category).map_err(|e| e.to_string())?;
        SnapshotEncoder::new()
            .encode_to_json(&mut processor, category, range)
            .map_err(|e| e.to_string())
    })();

    into_c_result(result)
}

/// Compute the daily context of one date.
///
/// # Safety
/// - `dataset_json` and `date` must be valid null-terminated C strings.
/// - `config_json` may be NULL.
/// - Returns a newly allocated string that must be freed with `dayflux_free_string`.
/// - Returns NULL on error; call `dayflux_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn dayflux_day_context_json(
    dataset_json: *const c_char,
    config_json: *const c_char,
    date: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let result = (|| -> Result<String, String> {
        let dataset = required_arg(dataset_json, "dataset")?;
        let config = optional_config(config_json)?;
        let date: NaiveDate =
            parse_date(&required_arg(date, "date")?).map_err(|e| e.to_string())?;

        let processor = load_processor(&dataset, config).map_err(|e| e.to_string())?;
        let context = processor.context(date).map_err(|e| e.to_string())?;
        serde_json::to_string(&context).map_err(|e| e.to_string())
    })();

    into_c_result(result)
}

/// Validate a dataset and return the validation report.
///
/// A report is returned even when days are invalid; NULL only signals that
/// the dataset could not be parsed at all.
///
/// # Safety
/// - `dataset_json` must be a valid null-terminated C string.
/// - `config_json` may be NULL.
/// - Returns a newly allocated string that must be freed with `dayflux_free_string`.
/// - Returns NULL on error; call `dayflux_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn dayflux_validate_json(
    dataset_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let result = (|| -> Result<String, String> {
        let dataset = required_arg(dataset_json, "dataset")?;
        let config = optional_config(config_json)?;
        let days =
            RawDayAdapter::parse(&dataset, DatasetFormat::Auto).map_err(|e| e.to_string())?;
        let report = ValidationReport::build(&days, &config.categories);
        serde_json::to_string(&report).map_err(|e| e.to_string())
    })();

    into_c_result(result)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Dayflux.
///
/// # Safety
/// - `s` must be a pointer returned by a Dayflux function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn dayflux_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Dayflux function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn dayflux_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the Dayflux library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn dayflux_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::SAMPLE_DATASET_JSON;

    fn to_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string();
        unsafe { dayflux_free_string(ptr) };
        s
    }

    fn last_error() -> String {
        unsafe {
            let error = dayflux_last_error();
            assert!(!error.is_null());
            CStr::from_ptr(error).to_str().unwrap().to_string()
        }
    }

    #[test]
    fn test_ffi_snapshot() {
        let dataset = CString::new(SAMPLE_DATASET_JSON).unwrap();
        let category = CString::new("sleep").unwrap();
        let range = CString::new(r#"{"kind":"last_days","value":3}"#).unwrap();

        let result = unsafe {
            dayflux_snapshot_json(
                dataset.as_ptr(),
                ptr::null(),
                category.as_ptr(),
                range.as_ptr(),
            )
        };
        let value: serde_json::Value = serde_json::from_str(&to_string(result)).unwrap();

        assert_eq!(value["snapshot_version"], "dayflux.snapshot.v1");
        assert_eq!(value["selected_category"], "sleep");
        assert_eq!(value["period_average"]["day_count"], 4);
    }

    #[test]
    fn test_ffi_day_context() {
        let dataset = CString::new(SAMPLE_DATASET_JSON).unwrap();
        let date = CString::new("2025-04-27").unwrap();

        let result =
            unsafe { dayflux_day_context_json(dataset.as_ptr(), ptr::null(), date.as_ptr()) };
        let value: serde_json::Value = serde_json::from_str(&to_string(result)).unwrap();

        assert_eq!(value["previous_date"], "2025-04-26");
        assert_eq!(value["outdoor_intensity"], "high");
    }

    #[test]
    fn test_ffi_day_context_missing_date() {
        let dataset = CString::new(SAMPLE_DATASET_JSON).unwrap();
        let date = CString::new("2025-05-01").unwrap();

        let result =
            unsafe { dayflux_day_context_json(dataset.as_ptr(), ptr::null(), date.as_ptr()) };
        assert!(result.is_null());
        assert!(last_error().contains("2025-05-01"));
    }

    #[test]
    fn test_ffi_validate() {
        let dataset = CString::new(
            r#"[{"date": "2025-04-27", "intervals": [{"category": "gaming", "start": 1, "end": 2}]}]"#,
        )
        .unwrap();

        let result = unsafe { dayflux_validate_json(dataset.as_ptr(), ptr::null()) };
        let value: serde_json::Value = serde_json::from_str(&to_string(result)).unwrap();

        assert_eq!(value["total_days"], 1);
        assert_eq!(value["invalid_days"], 1);
    }

    #[test]
    fn test_ffi_error_handling() {
        let invalid = CString::new("not json").unwrap();
        let category = CString::new("sleep").unwrap();

        let result = unsafe {
            dayflux_snapshot_json(invalid.as_ptr(), ptr::null(), category.as_ptr(), ptr::null())
        };
        assert!(result.is_null());
        assert!(!last_error().is_empty());

        let result = unsafe {
            dayflux_snapshot_json(ptr::null(), ptr::null(), category.as_ptr(), ptr::null())
        };
        assert!(result.is_null());
        assert_eq!(last_error(), "Invalid dataset string pointer");
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = dayflux_version();
            assert!(!version.is_null());
            assert!(!CStr::from_ptr(version).to_str().unwrap().is_empty());
        }
    }
}
