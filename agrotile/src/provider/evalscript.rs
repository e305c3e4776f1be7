//! Band selection scripts for the render endpoint.
//!
//! The render API expects a small JavaScript program (`//VERSION=3`) that
//! declares which input bands to load and how to map them to output
//! channels. The true-color alias expands to the red, green and blue
//! channels; every other logical band maps to one native band.

use crate::tile::BandSpec;

/// Native band used when a logical name is not recognized.
pub const FALLBACK_NATIVE_BAND: &str = "B04";

const TRUE_COLOR_BANDS: [&str; 3] = ["B04", "B03", "B02"];

/// Maps a logical band name to its Sentinel-2 native identifier.
///
/// Unknown names fall back to the red band.
pub fn native_band(logical: &str) -> &'static str {
    match logical {
        "RED" => "B04",
        "GREEN" => "B03",
        "BLUE" => "B02",
        "NIR" => "B08",
        "SWIR" => "B11",
        _ => FALLBACK_NATIVE_BAND,
    }
}

/// A rendered script plus the native bands it reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalScript {
    source: String,
    input_bands: Vec<&'static str>,
}

impl EvalScript {
    /// Script text sent to the provider.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Native bands in output channel order.
    pub fn input_bands(&self) -> &[&'static str] {
        &self.input_bands
    }

    /// Number of output channels.
    pub fn output_bands(&self) -> usize {
        self.input_bands.len()
    }
}

/// Builds evaluation scripts from band specs.
pub struct EvalScriptBuilder;

impl EvalScriptBuilder {
    /// Builds the script for `bands`.
    pub fn build(bands: &BandSpec) -> EvalScript {
        let input_bands: Vec<&'static str> = if bands.is_true_color() {
            TRUE_COLOR_BANDS.to_vec()
        } else {
            bands.bands().iter().map(|b| native_band(b)).collect()
        };

        let quoted = input_bands
            .iter()
            .map(|b| format!("\"{}\"", b))
            .collect::<Vec<_>>()
            .join(", ");
        let samples = input_bands
            .iter()
            .map(|b| format!("sample.{}", b))
            .collect::<Vec<_>>()
            .join(", ");

        let source = format!(
            "//VERSION=3\n\
             function setup() {{\n\
             \x20 return {{\n\
             \x20   input: [{quoted}],\n\
             \x20   output: {{ bands: {count} }}\n\
             \x20 }};\n\
             }}\n\
             \n\
             function evaluatePixel(sample) {{\n\
             \x20 return [{samples}];\n\
             }}\n",
            quoted = quoted,
            count = input_bands.len(),
            samples = samples,
        );

        EvalScript {
            source,
            input_bands,
        }
    }
}
