//! Text recognition over a binarized plate crop, via the tesseract executable.

use image::{DynamicImage, GrayImage};
use log::debug;
use rusty_tesseract::{Args, Image};

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process::Command;

use crate::error::PlateError;

/// Characters tesseract is allowed to emit.
pub const CHAR_WHITELIST: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Environment variable overriding where the tesseract executable lives.
pub const TESSERACT_CMD_VAR: &str = "TESSERACT_CMD";

pub struct OcrEngine {
    args: Args,
}

impl OcrEngine {

    /// Single-word recognition mode, uppercase letters and digits only,
    /// no dictionary correction.
    pub fn new() -> Self {
        let mut config_variables = HashMap::new();
        config_variables.insert(
            "tessedit_char_whitelist".to_string(),
            CHAR_WHITELIST.to_string(),
        );
        let args = Args {
            lang: "eng".to_string(),
            config_variables,
            dpi: Some(150),
            psm: Some(8),
            oem: Some(3),
        };
        OcrEngine { args }
    }

    /// Recognize the text in a binarized plate crop. The raw result is
    /// post-filtered to alphanumerics; an empty string is a valid outcome.
    pub fn recognize(&self, plate: &GrayImage) -> Result<String, PlateError> {
        let img = Image::from_dynamic_image(&DynamicImage::ImageLuma8(plate.clone()))?;
        let raw = rusty_tesseract::image_to_string(&img, &self.args)?;
        Ok(filter_alphanumeric(&raw))
    }
}

impl Default for OcrEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip whitespace and punctuation noise from an OCR result.
pub fn filter_alphanumeric(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Make sure a tesseract executable is reachable before any frame is
/// processed.
///
/// `rusty-tesseract` invokes `tesseract` through `PATH`, so an override from
/// `TESSERACT_CMD` is applied by prepending its directory to `PATH`. Probes
/// the executable with `--version` and fails with a diagnostic when nothing
/// answers.
pub fn resolve_tesseract() -> Result<(), PlateError> {
    if let Ok(cmd) = env::var(TESSERACT_CMD_VAR) {
        let path = PathBuf::from(&cmd);
        if !path.is_file() {
            return Err(PlateError::config(format!(
                "{} points at {}, which is not a file",
                TESSERACT_CMD_VAR, cmd
            )));
        }
        if let Some(dir) = path.parent() {
            let current = env::var_os("PATH").unwrap_or_default();
            let mut paths = vec![dir.to_path_buf()];
            paths.extend(env::split_paths(&current));
            let joined = env::join_paths(paths)
                .map_err(|e| PlateError::config(format!("cannot extend PATH: {}", e)))?;
            env::set_var("PATH", joined);
        }
    }
    match Command::new("tesseract").arg("--version").output() {
        Ok(out) if out.status.success() => {
            let version = String::from_utf8_lossy(&out.stdout);
            debug!("using {}", version.lines().next().unwrap_or("tesseract"));
            Ok(())
        }
        Ok(out) => Err(PlateError::config(format!(
            "`tesseract --version` exited with {}",
            out.status
        ))),
        Err(e) => Err(PlateError::config(format!(
            "tesseract executable not found on PATH ({}); install tesseract or set {}",
            e, TESSERACT_CMD_VAR
        ))),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn filter_strips_ocr_noise() {
        assert_eq!(filter_alphanumeric("AB-12 34!"), "AB1234");
        assert_eq!(filter_alphanumeric(" KA 01\nAB 1234\x0c"), "KA01AB1234");
        assert_eq!(filter_alphanumeric("...\n"), "");
    }

    #[test]
    fn filter_is_idempotent() {
        let once = filter_alphanumeric("AB-12 34!");
        assert_eq!(filter_alphanumeric(&once), once);
        assert_eq!(filter_alphanumeric("AB1234"), "AB1234");
    }

    #[test]
    fn whitelist_is_uppercase_alphanumeric() {
        assert!(CHAR_WHITELIST
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
