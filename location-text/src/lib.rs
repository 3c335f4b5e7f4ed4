//! ISS Location Text
//!
//! Turns reverse-geocoder output into a location label the e-paper display
//! can draw: picks printable name parts, transliterates what the bitmap
//! fonts lack, and wraps the result into the largest font tier that fits
//! beside the map.

pub mod bdf;
pub mod config;
pub mod country;
pub mod fonts;
pub mod geodata;
pub mod layout;
pub mod printable;
pub mod wrap;

// Re-export commonly used functions and types
pub use config::{FontSource, FontSpec, FontTier, LayoutConfig, ScreenLayout};
pub use country::CountryAbbreviations;
pub use fonts::{initialize_fonts, FixedWidthFont, FontId, FontSet, GlyphCoverage, GlyphMetrics};
pub use geodata::{build_location_name, GeoComponents, GeodataRecord};
pub use layout::{font_for_distance_text, layout_location, LocationTextEngine, WrapResult, ELLIPSIS};
pub use printable::{Printable, Transliterator, DEFAULT_FALLBACK};
pub use wrap::{split_fragments, wrap_to_pixels, WrapOptions};

use anyhow::Result;
use libc::{c_char, c_int};
use log::error;
use std::ffi::{c_void, CStr};
use std::path::{Path, PathBuf};

fn load_engine(config_path: Option<PathBuf>) -> Result<LocationTextEngine> {
    match config_path {
        Some(path) => {
            let config = LayoutConfig::from_json_file(&path)?;
            let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
            LocationTextEngine::from_config(config, base_dir)
        }
        None => LocationTextEngine::from_config(LayoutConfig::default(), Path::new(".")),
    }
}

/// Initialize the location text engine (load configuration and fonts).
///
/// A null `config_path` uses the built-in configuration, which expects the
/// device's BDF fonts under `assets/fonts/` in the working directory. Relative
/// font paths in a configuration file resolve against the file's directory.
/// Returns null on failure.
///
/// # Safety
///
/// `config_path` must be null or point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn init_location_text(config_path: *const c_char) -> *mut c_void {
    let config_path = if config_path.is_null() {
        None
    } else {
        let path = unsafe { CStr::from_ptr(config_path) }.to_string_lossy().into_owned();
        Some(PathBuf::from(path))
    };

    match load_engine(config_path) {
        Ok(engine) => Box::into_raw(Box::new(engine)) as *mut c_void,
        Err(e) => {
            error!("Location text initialization failed: {:#}", e);
            std::ptr::null_mut()
        }
    }
}

/// Change the pixel budget used for location and distance text.
///
/// # Safety
///
/// `context` must be null or a pointer returned by [`init_location_text`]
/// that has not been cleaned up.
#[no_mangle]
pub unsafe extern "C" fn set_location_text_options(context: *mut c_void, max_width: u32) -> c_int {
    if context.is_null() {
        return -1;
    }

    let engine = unsafe { &mut *(context as *mut LocationTextEngine) };
    engine.set_max_width(max_width);

    0 // Success
}

/// Release the engine created by [`init_location_text`].
///
/// # Safety
///
/// `context` must be null or a pointer returned by [`init_location_text`],
/// and must not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn cleanup_location_text(context: *mut c_void) {
    if !context.is_null() {
        unsafe {
            let _ = Box::from_raw(context as *mut LocationTextEngine);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn init_fails_cleanly_for_missing_config() {
        let path = CString::new("/nonexistent/layout.json").unwrap();
        let context = unsafe { init_location_text(path.as_ptr()) };
        assert!(context.is_null());
    }

    #[test]
    fn init_loads_fonts_next_to_config_file() {
        let path = CString::new(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fonts/layout.json")).unwrap();
        let context = unsafe { init_location_text(path.as_ptr()) };
        assert!(!context.is_null());

        let engine = unsafe { &mut *(context as *mut LocationTextEngine) };
        assert_eq!(engine.max_width(), 166);
        assert!(FontId::ALL.iter().all(|&id| engine.fonts().contains(id)));
        let result = engine.layout_location("Lima, Peru").unwrap();
        assert_eq!(result.font, FontId::LocationLarge);

        unsafe { cleanup_location_text(context) };
    }

    #[test]
    fn default_configuration_needs_device_fonts() {
        let fonts_present = LayoutConfig::default().fonts.iter().all(|spec| match &spec.source {
            FontSource::Bdf { path } => path.exists(),
            _ => true,
        });
        let context = unsafe { init_location_text(std::ptr::null()) };
        assert_eq!(context.is_null(), !fonts_present);
        unsafe { cleanup_location_text(context) };
    }

    #[test]
    fn options_reject_null_context() {
        assert_eq!(unsafe { set_location_text_options(std::ptr::null_mut(), 80) }, -1);
        unsafe { cleanup_location_text(std::ptr::null_mut()) };
    }

    #[test]
    fn context_round_trips_through_raw_pointer() {
        let engine = LocationTextEngine::new(LayoutConfig::default(), FontSet::new());
        let context = Box::into_raw(Box::new(engine)) as *mut c_void;

        assert_eq!(unsafe { set_location_text_options(context, 64) }, 0);
        let width = unsafe { &*(context as *const LocationTextEngine) }.max_width();
        assert_eq!(width, 64);

        unsafe { cleanup_location_text(context) };
    }
}
