//! ISS Tracker Display
//!
//! C ABI bridge between the tracker firmware and the location text engine.
//! The host creates an engine with `init_location_text`, then asks for a
//! label after every geocoding refresh and renders the returned lines.

use anyhow::{Context, Result};
use iss_location_text::{GeodataRecord, LocationTextEngine, WrapResult};
use libc::{c_char, c_int, c_void};
use log::{error, warn};
use serde::Serialize;
use std::ffi::{CStr, CString};

pub use iss_location_text::{cleanup_location_text, init_location_text, set_location_text_options};

/// Status codes returned across the boundary.
const STATUS_OK: c_int = 0;
const STATUS_NULL_POINTER: c_int = -1;
const STATUS_BAD_INPUT: c_int = -2;
const STATUS_OUTPUT_FAILED: c_int = -3;

/// What the host renders in the location panel
#[derive(Debug, Serialize)]
pub struct LocationLabel {
    pub name: Option<String>,
    pub layout: Option<WrapResult>,
}

/// Accept either a full reverse-geocoding response or one feature's properties.
fn parse_geodata(json: &str) -> Result<Option<GeodataRecord>> {
    let value: serde_json::Value = serde_json::from_str(json).context("parsing geodata")?;
    if value.get("features").is_some() {
        GeodataRecord::from_response_json(json)
    } else {
        GeodataRecord::from_properties_json(json).map(Some)
    }
}

/// Build the label for one geocoding result.
pub fn describe_location(engine: &mut LocationTextEngine, geodata_json: &str) -> Result<LocationLabel> {
    let Some(record) = parse_geodata(geodata_json)? else {
        return Ok(LocationLabel { name: None, layout: None });
    };

    let name = engine.location_name(&record);
    let layout = name.as_deref().and_then(|name| engine.layout_location(name));
    if name.is_some() && layout.is_none() {
        warn!("Location name has no layout, label stays blank");
    }
    Ok(LocationLabel { name, layout })
}

unsafe fn read_str<'a>(ptr: *const c_char) -> Option<std::borrow::Cow<'a, str>> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy())
}

/// Lay out the location label for a geocoding result.
///
/// On success `*out_json` receives `{"name": ..., "layout": ...}`, to be
/// released with [`iss_free_string`].
///
/// # Safety
///
/// `context` must come from `init_location_text`; `geodata_json` must be a
/// NUL-terminated string; `out_json` must be valid for one pointer write.
#[no_mangle]
pub unsafe extern "C" fn iss_location_text_ffi(
    context: *mut c_void,
    geodata_json: *const c_char,
    out_json: *mut *mut c_char,
) -> c_int {
    if context.is_null() || out_json.is_null() {
        return STATUS_NULL_POINTER;
    }
    let Some(geodata_json) = (unsafe { read_str(geodata_json) }) else {
        return STATUS_NULL_POINTER;
    };

    let engine = unsafe { &mut *(context as *mut LocationTextEngine) };
    let label = match describe_location(engine, &geodata_json) {
        Ok(label) => label,
        Err(e) => {
            error!("Rejected geodata: {:#}", e);
            return STATUS_BAD_INPUT;
        }
    };

    let output = match serde_json::to_string(&label).map(CString::new) {
        Ok(Ok(output)) => output,
        _ => {
            error!("Could not encode location label");
            return STATUS_OUTPUT_FAILED;
        }
    };

    unsafe { *out_json = output.into_raw() };
    STATUS_OK
}

/// Index into the configured distance fonts for rendering `text`.
///
/// # Safety
///
/// `context` must come from `init_location_text`; `text` must be a
/// NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn iss_distance_font_ffi(context: *mut c_void, text: *const c_char) -> c_int {
    if context.is_null() {
        return STATUS_NULL_POINTER;
    }
    let Some(text) = (unsafe { read_str(text) }) else {
        return STATUS_NULL_POINTER;
    };

    let engine = unsafe { &mut *(context as *mut LocationTextEngine) };
    let Some(font) = engine.font_for_distance_text(&text) else {
        return STATUS_BAD_INPUT;
    };
    engine
        .config()
        .distance_fonts
        .iter()
        .position(|&id| id == font)
        .and_then(|index| c_int::try_from(index).ok())
        .unwrap_or(STATUS_BAD_INPUT)
}

/// Release a string returned by this library.
///
/// # Safety
///
/// `ptr` must be null or a string handed out by this library, freed once.
#[no_mangle]
pub unsafe extern "C" fn iss_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe {
            let _ = CString::from_raw(ptr);
        }
    }
}
