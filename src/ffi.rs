//! FFI bindings for Mechanostat
//!
//! This module provides C-compatible functions for calling Mechanostat from
//! dashboards and export tooling written in other languages. Results are JSON
//! in newly allocated C strings that must be freed with
//! `mechanostat_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::export::{encode, OutputFormat};
use crate::params::{ModelParams, SamplingRanges};
use crate::pipeline::{predict, synthesize, MechanoProcessor};
use crate::types::{BoneRegion, LoadingCondition};

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

/// NULL selects the default region
unsafe fn region_from_ptr(region: *const c_char) -> BoneRegion {
    cstr_to_string(region)
        .map(|label| BoneRegion::parse(&label))
        .unwrap_or_default()
}

fn to_json_cstr<T: serde::Serialize>(value: &T) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Predict bone formation rate with the reference constants.
///
/// # Safety
/// - `region` must be a valid null-terminated C string or NULL (tibia).
/// - Returns a newly allocated JSON string that must be freed with `mechanostat_free_string`.
/// - Returns NULL on error; call `mechanostat_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn mechanostat_predict(
    region: *const c_char,
    frequency_hz: f64,
    strain_amplitude_microstrain: f64,
    duration_weeks: f64,
) -> *mut c_char {
    clear_last_error();

    let result = predict(
        region_from_ptr(region),
        frequency_hz,
        strain_amplitude_microstrain,
        duration_weeks,
    );
    to_json_cstr(&result)
}

/// Synthesize a dataset with the reference constants and return a JSON array.
///
/// # Safety
/// - When `has_seed` is zero the dataset is seeded from OS entropy and `seed` is ignored.
/// - Returns a newly allocated string that must be freed with `mechanostat_free_string`.
/// - Returns NULL on error; call `mechanostat_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn mechanostat_synthesize(
    count: u32,
    seed: u64,
    has_seed: i32,
) -> *mut c_char {
    clear_last_error();

    let seed = (has_seed != 0).then_some(seed);
    let dataset = synthesize(count as usize, seed);

    match encode(&dataset, OutputFormat::Json) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a MechanoProcessor
pub struct MechanoProcessorHandle {
    processor: MechanoProcessor,
}

/// Create a processor, optionally with custom constants.
///
/// # Safety
/// - `params_json` and `ranges_json` must be valid null-terminated C strings or NULL
///   (NULL selects the reference values).
/// - Returns a pointer that must be freed with `mechanostat_processor_free`.
/// - Returns NULL on error; call `mechanostat_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn mechanostat_processor_new(
    params_json: *const c_char,
    ranges_json: *const c_char,
) -> *mut MechanoProcessorHandle {
    clear_last_error();

    let params = match cstr_to_string(params_json) {
        Some(json) => match ModelParams::from_json(&json) {
            Ok(params) => params,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        },
        None => ModelParams::default(),
    };

    let ranges = match cstr_to_string(ranges_json) {
        Some(json) => match SamplingRanges::from_json(&json) {
            Ok(ranges) => ranges,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        },
        None => SamplingRanges::default(),
    };

    match MechanoProcessor::with_params(params, ranges) {
        Ok(processor) => Box::into_raw(Box::new(MechanoProcessorHandle { processor })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `mechanostat_processor_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn mechanostat_processor_free(processor: *mut MechanoProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Predict with a processor's constants.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `mechanostat_processor_new`.
/// - `region` must be a valid null-terminated C string or NULL.
/// - Returns a newly allocated string that must be freed with `mechanostat_free_string`.
#[no_mangle]
pub unsafe extern "C" fn mechanostat_processor_predict(
    processor: *mut MechanoProcessorHandle,
    region: *const c_char,
    frequency_hz: f64,
    strain_amplitude_microstrain: f64,
    duration_weeks: f64,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;
    let condition = LoadingCondition::new(
        region_from_ptr(region),
        frequency_hz,
        strain_amplitude_microstrain,
        duration_weeks,
    );

    to_json_cstr(&handle.processor.predict(&condition))
}

/// Session dataset as a JSON array; the most recent seeded dataset is cached by the processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `mechanostat_processor_new`.
/// - Returns a newly allocated string that must be freed with `mechanostat_free_string`.
#[no_mangle]
pub unsafe extern "C" fn mechanostat_processor_dataset(
    processor: *mut MechanoProcessorHandle,
    count: u32,
    seed: u64,
    has_seed: i32,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &mut *processor;
    let dataset = handle
        .processor
        .dataset(count as usize, (has_seed != 0).then_some(seed));

    match encode(&dataset, OutputFormat::Json) {
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

/// Free a string returned by Mechanostat functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Mechanostat function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn mechanostat_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next Mechanostat call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn mechanostat_last_error() -> *const c_char {
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
pub unsafe extern "C" fn mechanostat_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DatasetRecord, PredictionResult};

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        mechanostat_free_string(ptr);
        s
    }

    #[test]
    fn test_ffi_predict() {
        let region = CString::new("Femur").unwrap();
        unsafe {
            let json = take_string(mechanostat_predict(region.as_ptr(), 5.0, 1500.0, 2.0));
            let result: PredictionResult = serde_json::from_str(&json).unwrap();
            assert_eq!(result.bfr, 6.0);
            assert!(result.advisories.is_empty());
        }
    }

    #[test]
    fn test_ffi_predict_null_region() {
        unsafe {
            let json = take_string(mechanostat_predict(ptr::null(), 5.0, 500.0, 2.0));
            assert!(json.contains("below_activation_threshold"));
        }
    }

    #[test]
    fn test_ffi_synthesize_seeded() {
        unsafe {
            let a = take_string(mechanostat_synthesize(30, 42, 1));
            let b = take_string(mechanostat_synthesize(30, 42, 1));
            assert_eq!(a, b);
            let records: Vec<DatasetRecord> = serde_json::from_str(&a).unwrap();
            assert_eq!(records.len(), 30);

            let empty = take_string(mechanostat_synthesize(0, 0, 0));
            assert_eq!(empty, "[]");
        }
    }

    #[test]
    fn test_ffi_processor_lifecycle() {
        let params = CString::new(r#"{"max_increase": 2.0}"#).unwrap();
        unsafe {
            let processor = mechanostat_processor_new(params.as_ptr(), ptr::null());
            assert!(!processor.is_null());

            let json = take_string(mechanostat_processor_predict(
                processor,
                ptr::null(),
                5.0,
                1500.0,
                2.0,
            ));
            let result: PredictionResult = serde_json::from_str(&json).unwrap();
            assert_eq!(result.bfr, 3.0);

            let first = take_string(mechanostat_processor_dataset(processor, 20, 7, 1));
            let second = take_string(mechanostat_processor_dataset(processor, 20, 7, 1));
            assert_eq!(first, second);
            assert_eq!((*processor).processor.cached_datasets(), 1);

            mechanostat_processor_free(processor);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        let bad = CString::new(r#"{"optimum_amplitude": 100.0}"#).unwrap();
        unsafe {
            let processor = mechanostat_processor_new(bad.as_ptr(), ptr::null());
            assert!(processor.is_null());

            let error = mechanostat_last_error();
            assert!(!error.is_null());
            let error_str = CStr::from_ptr(error).to_str().unwrap();
            assert!(error_str.contains("Invalid model parameters"));

            let result = mechanostat_processor_predict(ptr::null_mut(), ptr::null(), 5.0, 1.0, 1.0);
            assert!(result.is_null());
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = mechanostat_version();
            assert!(!version.is_null());
            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert!(!version_str.is_empty());
        }
    }
}
