//! # Measurement Parser
//!
//! Parses raw tire measurement strings from supplier price lists into
//! structured dimensions, and normalizes brand/type tokens through
//! injectable dictionaries.
//!
//! ## Supported Patterns
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  metric      205/55R16 91V        width/profile + construction + rim   │
//! │  flotation   31X10.5R15           width x section(in) + rim            │
//! │  moto        90/90-21             width/profile - rim (diagonal)       │
//! │  agri        7.5R20               section(in) + construction + rim     │
//! │                                                                         │
//! │  The remainder after the size pattern carries the model name; load     │
//! │  and speed indexes, ply rating and TL/TT are scanned anywhere in the   │
//! │  cleaned string.                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dictionaries are configuration, not compiled-in constants: callers can
//! swap the brand/type tables without a redeploy. `Default` provides the
//! production tables.

use std::collections::HashMap;

use regex::Regex;

// =============================================================================
// Parsed Measurement
// =============================================================================

/// Dimensions extracted from one measurement string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementData {
    pub width: i64,
    pub profile: Option<i64>,
    pub rim: f64,
    /// `R`, `D` or empty.
    pub construction: String,
    /// `TL`, `TT` or empty.
    pub tube_type: String,
    /// Whole ply match (`10PR`), uppercased.
    pub ply_rating: String,
    pub load_index: String,
    pub speed_index: String,
    /// What's left after the size pattern; usually the model name.
    pub remainder: String,
}

// =============================================================================
// Dictionaries
// =============================================================================

/// Brand and type normalization tables for the importers.
///
/// Keys are uppercased tokens as they appear in supplier files; values are
/// the canonical names stored in the catalog.
#[derive(Debug, Clone)]
pub struct ImportDictionaries {
    pub brands: HashMap<String, String>,
    pub types: HashMap<String, String>,
}

impl ImportDictionaries {
    /// Builds dictionaries from caller-supplied tables.
    pub fn new(brands: HashMap<String, String>, types: HashMap<String, String>) -> Self {
        ImportDictionaries { brands, types }
    }

    /// Resolves a brand name from an alias token, falling back to a cleaned
    /// version of `fallback` and finally to the catch-all brand.
    pub fn normalize_brand(&self, alias: &str, fallback: &str) -> String {
        let mut key = alias.trim().to_uppercase();
        if key.is_empty() {
            key = fallback.trim().to_uppercase();
        }
        if let Some(name) = self.brands.get(&key) {
            return name.clone();
        }
        if key.is_empty() {
            return "Otras Marcas".to_string();
        }
        title_case(&key)
    }

    /// Resolves a normalized type name from the abbreviation or description
    /// columns, falling back to the catch-all type.
    pub fn normalize_type(&self, abbr: &str, description: &str) -> String {
        for candidate in [abbr, description] {
            let key = candidate.trim().to_uppercase();
            if key.is_empty() {
                continue;
            }
            if let Some(name) = self.types.get(&key) {
                return name.clone();
            }
        }
        "Otros".to_string()
    }
}

impl Default for ImportDictionaries {
    fn default() -> Self {
        let brands = [
            ("AB", "AB Tires"),
            ("AURORA", "Aurora Tires"),
            ("BS", "Bridgestone"),
            ("BRIDGESTONE", "Bridgestone"),
            ("DAYTON", "Dayton"),
            ("DOUBLE COIN", "Double Coin"),
            ("FS", "Firestone"),
            ("FIRESTONE", "Firestone"),
            ("FUZION", "Fuzion"),
            ("GDY", "Goodyear"),
            ("GOODYEAR", "Goodyear"),
            ("GOO", "Goodride"),
            ("HAN", "Hankook"),
            ("HANKOOK", "Hankook"),
            ("KUM", "Kumho"),
            ("KUMHO", "Kumho"),
            ("LAUFENN", "Laufenn"),
            ("OTR", "OTR Tires"),
            ("OTRAS", "Otras Marcas"),
            ("PIRELLI", "Pirelli"),
            ("SUM", "Sumitomo"),
            ("SUMITOMO", "Sumitomo"),
            ("TOR", "Tornel"),
            ("TORNEL", "Tornel"),
        ];

        let types = [
            ("PS", "Pasajero"),
            ("PASAJERO", "Pasajero"),
            ("PASAJERO RADIAL", "Pasajero Radial (PSR)"),
            ("PSR", "Pasajero Radial (PSR)"),
            ("LT", "Camioneta Convencional"),
            ("LTS", "Light Truck Convencional (LTS)"),
            ("LTR", "Light Truck Radial (LTR)"),
            ("ST", "Special Trailer (ST)"),
            ("TBR", "Truck & Bus Radial (TBR)"),
            ("LT R", "Light Truck Radial (LTR)"),
            ("LTA", "Light Truck Radial (LTR)"),
            ("IND", "Industrial Radial"),
            ("INDUSTRIAL", "Industrial Radial"),
            ("MOTO CONVENCIONAL", "Moto Convencional"),
            ("MOTO RADIAL", "Moto Radial"),
            ("AGR", "Agrícola Radial"),
            ("AGRICOLA", "Agrícola Radial"),
            ("CAMION RADIAL", "Camión Radial"),
            ("CAMION CONVENCIONAL", "Camión Convencional"),
            ("CAMIONETA RADIAL", "Camioneta Radial"),
            ("CAMIONETA CONVENCIONAL", "Camioneta Convencional"),
            ("LLANTA TEMPORAL", "Llanta Temporal"),
        ];

        ImportDictionaries {
            brands: brands
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            types: types
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

// =============================================================================
// Measurement Parser
// =============================================================================

/// Compiled measurement patterns. Build once, reuse per import.
#[derive(Debug, Clone)]
pub struct MeasurementParser {
    metric: Regex,
    flotation: Regex,
    moto: Regex,
    agri: Regex,
    load_speed: Regex,
    ply: Regex,
}

impl Default for MeasurementParser {
    fn default() -> Self {
        MeasurementParser {
            metric: Regex::new(r"(?i)^(\d{3})\s*/\s*(\d{2})\s*([R-])\s*(\d{2})(.*)$")
                .expect("metric pattern"),
            flotation: Regex::new(r"(?i)^(\d{2,3})\s*X\s*(\d{1,2}\.\d{1,2})\s*([R-])\s*(\d{2})(.*)$")
                .expect("flotation pattern"),
            moto: Regex::new(r"(?i)^(\d{2,3})\s*/\s*(\d{2,3})\s*-\s*(\d{2})(.*)$")
                .expect("moto pattern"),
            agri: Regex::new(r"(?i)^(\d{1,2}\.\d)\s*([R-])\s*(\d{2})(.*)$").expect("agri pattern"),
            load_speed: Regex::new(r"(?i)(\d{2,3})([A-Z]{1,2})").expect("load/speed pattern"),
            ply: Regex::new(r"(?i)(\d{1,2})\s*PR").expect("ply pattern"),
        }
    }
}

impl MeasurementParser {
    /// Parses one raw measurement string.
    ///
    /// Unmatched inputs come back with zero width/rim and the whole cleaned
    /// string as the remainder; callers decide whether that is an error.
    pub fn parse(&self, raw: &str) -> MeasurementData {
        let cleaned = raw.trim().to_uppercase();
        let mut data = MeasurementData {
            remainder: cleaned.clone(),
            ..MeasurementData::default()
        };

        if let Some(parts) = self.metric.captures(&cleaned) {
            data.width = parse_int(&parts[1]);
            data.profile = Some(parse_int(&parts[2]));
            data.construction = map_construction(&parts[3]);
            data.rim = parse_float(&parts[4]);
            data.remainder = parts[5].trim().to_string();
        } else if let Some(parts) = self.flotation.captures(&cleaned) {
            data.width = parse_int(&parts[1]);
            data.profile = Some((parse_float(&parts[2]) * 25.4).round() as i64);
            data.construction = map_construction(&parts[3]);
            data.rim = parse_float(&parts[4]);
            data.remainder = parts[5].trim().to_string();
        } else if let Some(parts) = self.moto.captures(&cleaned) {
            data.width = parse_int(&parts[1]);
            data.profile = Some(parse_int(&parts[2]));
            data.construction = "D".to_string();
            data.rim = parse_float(&parts[3]);
            data.remainder = parts[4].trim().to_string();
        } else if let Some(parts) = self.agri.captures(&cleaned) {
            data.width = (parse_float(&parts[1]) * 25.4).round() as i64;
            data.profile = None;
            data.construction = map_construction(&parts[2]);
            data.rim = parse_float(&parts[3]);
            data.remainder = parts[4].trim().to_string();
        }

        if let Some(ls) = self.load_speed.captures(&cleaned) {
            data.load_index = ls[1].to_string();
            data.speed_index = ls[2].to_string();
        }

        if let Some(ply) = self.ply.captures(&cleaned) {
            data.ply_rating = ply[0].trim().to_uppercase();
        }

        if cleaned.contains("TL") {
            data.tube_type = "TL".to_string();
        } else if cleaned.contains("TT") {
            data.tube_type = "TT".to_string();
        }

        data
    }
}

fn map_construction(token: &str) -> String {
    match token.to_uppercase().as_str() {
        "R" => "R".to_string(),
        "D" => "D".to_string(),
        _ => String::new(),
    }
}

// =============================================================================
// Scalar Helpers
// =============================================================================

/// Lenient integer parse; bad input yields 0, like the import layout expects.
pub fn parse_int(value: &str) -> i64 {
    value.trim().parse().unwrap_or(0)
}

/// Lenient float parse; commas are decimal separators in some lists.
pub fn parse_float(value: &str) -> f64 {
    value.replace(',', ".").trim().parse().unwrap_or(0.0)
}

/// Parses a price cell: strips currency symbols, thousands separators and
/// placeholder dashes.
pub fn parse_price(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() || cleaned == "-" {
        return 0.0;
    }
    cleaned.parse().unwrap_or(0.0)
}

/// Collapses runs of whitespace in a model name.
pub fn clean_model(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Falls back to scanning the measurement when the pattern gave no
/// construction: an `R` anywhere means radial, a dash means diagonal.
pub fn default_construction(construction: &str, measurement: &str) -> String {
    if !construction.is_empty() {
        return construction.to_string();
    }
    let upper = measurement.to_uppercase();
    if upper.contains('R') {
        "R".to_string()
    } else if upper.contains('-') {
        "D".to_string()
    } else {
        String::new()
    }
}

/// First run of ASCII digits in the input, as text.
pub fn extract_first_number(input: &str) -> String {
    input
        .split(|c: char| !c.is_ascii_digit())
        .find(|token| !token.is_empty())
        .unwrap_or("")
        .to_string()
}

/// Title-cases each whitespace-separated word.
pub fn title_case(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rebuilds the display size label from structured fields, mirroring what
/// the admin form shows (`205/55R16 LT-10PR 91V SPORT`).
#[allow(clippy::too_many_arguments)]
pub fn build_size_label(
    width: i64,
    profile: Option<i64>,
    rim: f64,
    construction: &str,
    ply_rating: &str,
    usage_abbr: &str,
    load_index: &str,
    speed_index: &str,
    model: &str,
) -> String {
    let constr = construction.trim().to_uppercase();
    let ply = ply_rating.trim();
    let usage = usage_abbr.trim().to_uppercase();
    let load = load_index.trim();
    let speed = speed_index.trim().to_uppercase();
    let model = model.trim();

    let is_diagonal = constr == "DIAGONAL" || constr == "D" || constr == "-";

    let mut size_base = String::new();
    if width > 0 {
        let rim_str = if rim > 0.0 {
            if rim == (rim as i64) as f64 {
                format!("{}", rim as i64)
            } else {
                format!("{rim}")
            }
        } else {
            String::new()
        };

        if let Some(profile) = profile.filter(|p| *p > 0) {
            let sep = if is_diagonal { "-" } else { "R" };
            let rim_part = if rim_str.is_empty() {
                String::new()
            } else {
                format!("{sep}{rim_str}")
            };
            size_base = format!("{width}/{profile}{rim_part}");
        } else if is_diagonal {
            let rim_part = if rim_str.is_empty() {
                String::new()
            } else {
                format!("-{rim_str}")
            };
            size_base = format!("{width}{rim_part}");
        } else {
            let rim_part = if rim_str.is_empty() {
                String::new()
            } else {
                format!("X{rim_str}")
            };
            size_base = format!("{width}{rim_part}");
        }
    }

    let usage_ply = match (usage.is_empty(), ply.is_empty()) {
        (false, false) => format!("{usage}-{ply}"),
        (false, true) => usage.clone(),
        (true, false) => ply.to_string(),
        (true, true) => String::new(),
    };

    let load_speed = format!("{load}{speed}");

    let mut parts = Vec::with_capacity(4);
    for part in [size_base.as_str(), usage_ply.as_str(), load_speed.as_str(), model] {
        if !part.is_empty() {
            parts.push(part);
        }
    }

    clean_model(&parts.join(" "))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_metric_measurement() {
        let parser = MeasurementParser::default();
        let data = parser.parse("205/55R16 91V TURANZA");

        assert_eq!(data.width, 205);
        assert_eq!(data.profile, Some(55));
        assert_eq!(data.construction, "R");
        assert_eq!(data.rim, 16.0);
        assert_eq!(data.remainder, "91V TURANZA");
    }

    #[test]
    fn test_parse_flotation_converts_section_to_mm() {
        let parser = MeasurementParser::default();
        let data = parser.parse("31X10.5R15 C109");

        assert_eq!(data.width, 31);
        // 10.5 in * 25.4 = 266.7 → 267 mm
        assert_eq!(data.profile, Some(267));
        assert_eq!(data.construction, "R");
        assert_eq!(data.rim, 15.0);
    }

    #[test]
    fn test_parse_moto_is_diagonal() {
        let parser = MeasurementParser::default();
        let data = parser.parse("90/90-21 54H TT");

        assert_eq!(data.width, 90);
        assert_eq!(data.profile, Some(90));
        assert_eq!(data.construction, "D");
        assert_eq!(data.rim, 21.0);
        // load/speed scan takes the leftmost digit+letter pair
        assert_eq!(data.load_index, "54");
        assert_eq!(data.speed_index, "H");
        assert_eq!(data.tube_type, "TT");
    }

    #[test]
    fn test_parse_agri_converts_width() {
        let parser = MeasurementParser::default();
        let data = parser.parse("7.5R20");

        // 7.5 in * 25.4 = 190.5 → 191 mm section, no aspect ratio
        assert_eq!(data.width, 191);
        assert_eq!(data.profile, None);
        assert_eq!(data.construction, "R");
        assert_eq!(data.rim, 20.0);
    }

    #[test]
    fn test_parse_ply_and_tubeless() {
        let parser = MeasurementParser::default();
        let data = parser.parse("750R16 10PR TL");

        assert_eq!(data.ply_rating, "10PR");
        assert_eq!(data.tube_type, "TL");
    }

    #[test]
    fn test_brand_normalization_uses_dictionary_then_title_case() {
        let dicts = ImportDictionaries::default();
        assert_eq!(dicts.normalize_brand("BS", ""), "Bridgestone");
        assert_eq!(dicts.normalize_brand("", "GOODYEAR"), "Goodyear");
        assert_eq!(dicts.normalize_brand("WESTLAKE", ""), "Westlake");
        assert_eq!(dicts.normalize_brand("", ""), "Otras Marcas");
    }

    #[test]
    fn test_brand_normalization_with_injected_table() {
        let mut brands = HashMap::new();
        brands.insert("WL".to_string(), "Westlake".to_string());
        let dicts = ImportDictionaries::new(brands, HashMap::new());

        assert_eq!(dicts.normalize_brand("WL", ""), "Westlake");
        // unknown types fall back to the catch-all without a table
        assert_eq!(dicts.normalize_type("PS", ""), "Otros");
    }

    #[test]
    fn test_type_normalization() {
        let dicts = ImportDictionaries::default();
        assert_eq!(dicts.normalize_type("TBR", ""), "Truck & Bus Radial (TBR)");
        assert_eq!(dicts.normalize_type("", "pasajero"), "Pasajero");
        assert_eq!(dicts.normalize_type("??", "??"), "Otros");
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("$1,234.50"), 1234.5);
        assert_eq!(parse_price(" 2 350 "), 2350.0);
        assert_eq!(parse_price("-"), 0.0);
        assert_eq!(parse_price(""), 0.0);
    }

    #[test]
    fn test_build_size_label_radial_with_profile() {
        let label = build_size_label(205, Some(55), 16.0, "R", "", "", "91", "V", "Turanza");
        assert_eq!(label, "205/55R16 91V Turanza");
    }

    #[test]
    fn test_build_size_label_diagonal_without_profile() {
        let label = build_size_label(750, None, 16.0, "D", "10PR", "LT", "", "", "");
        assert_eq!(label, "750-16 LT-10PR");
    }

    #[test]
    fn test_extract_first_number() {
        assert_eq!(extract_first_number("LT235/85R16"), "235");
        assert_eq!(extract_first_number("no digits"), "");
    }
}
