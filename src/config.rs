use anyhow::Result;
use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub upload_path: String,
    pub ocr_language: String,
    pub ocr_timeout_seconds: u64,
    pub rasterize_timeout_seconds: u64,
    pub pdfimages_bin: String,
    pub convert_bin: String,
    pub tesseract_bin: String,
    pub rasterize_density: u32,
    pub ocr_enabled: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Config {
            upload_path: env::var("UPLOAD_PATH")
                .unwrap_or_else(|_| "./uploads".to_string()),
            ocr_language: env::var("OCR_LANGUAGE")
                .unwrap_or_else(|_| "eng".to_string()),
            ocr_timeout_seconds: env::var("OCR_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(120),
            rasterize_timeout_seconds: env::var("RASTERIZE_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
            pdfimages_bin: env::var("PDFIMAGES_BIN")
                .unwrap_or_else(|_| "pdfimages".to_string()),
            convert_bin: env::var("CONVERT_BIN")
                .unwrap_or_else(|_| "convert".to_string()),
            tesseract_bin: env::var("TESSERACT_BIN")
                .unwrap_or_else(|_| "tesseract".to_string()),
            rasterize_density: env::var("RASTERIZE_DENSITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
            ocr_enabled: env::var("OCR_ENABLED")
                .ok()
                .and_then(|s| parse_flag(&s))
                .unwrap_or(true),
        })
    }

    pub fn extraction(&self) -> ExtractionConfig {
        ExtractionConfig::from(self)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Settings the extraction pipeline needs, detached from the rest of `Config`.
#[derive(Clone, Debug)]
pub struct ExtractionConfig {
    pub ocr_enabled: bool,
    pub ocr_language: String,
    pub ocr_timeout: Duration,
    pub rasterize_timeout: Duration,
    pub rasterize_density: u32,
    pub pdfimages_bin: String,
    pub convert_bin: String,
    pub tesseract_bin: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            ocr_enabled: true,
            ocr_language: "eng".to_string(),
            ocr_timeout: Duration::from_secs(120),
            rasterize_timeout: Duration::from_secs(300),
            rasterize_density: 300,
            pdfimages_bin: "pdfimages".to_string(),
            convert_bin: "convert".to_string(),
            tesseract_bin: "tesseract".to_string(),
        }
    }
}

impl From<&Config> for ExtractionConfig {
    fn from(config: &Config) -> Self {
        Self {
            ocr_enabled: config.ocr_enabled,
            ocr_language: config.ocr_language.clone(),
            ocr_timeout: Duration::from_secs(config.ocr_timeout_seconds),
            rasterize_timeout: Duration::from_secs(config.rasterize_timeout_seconds),
            rasterize_density: config.rasterize_density,
            pdfimages_bin: config.pdfimages_bin.clone(),
            convert_bin: config.convert_bin.clone(),
            tesseract_bin: config.tesseract_bin.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_extraction_config_from_config() {
        let config = Config {
            upload_path: "/tmp/uploads".to_string(),
            ocr_language: "kor+eng".to_string(),
            ocr_timeout_seconds: 30,
            rasterize_timeout_seconds: 60,
            pdfimages_bin: "/usr/bin/pdfimages".to_string(),
            convert_bin: "magick".to_string(),
            tesseract_bin: "tesseract".to_string(),
            rasterize_density: 200,
            ocr_enabled: false,
        };

        let extraction = config.extraction();
        assert!(!extraction.ocr_enabled);
        assert_eq!(extraction.ocr_language, "kor+eng");
        assert_eq!(extraction.ocr_timeout, Duration::from_secs(30));
        assert_eq!(extraction.rasterize_timeout, Duration::from_secs(60));
        assert_eq!(extraction.rasterize_density, 200);
        assert_eq!(extraction.convert_bin, "magick");
    }
}
