//! The remap engine: biome id normalization, the primary mapping table,
//! the optional `unmapped_terralith_to` fallback, and the built-in
//! default mapping text.

use std::collections::HashMap;
use std::path::Path;

use crate::error::SetupError;

/// Strips the `universal_` namespacing some datapacks wrap biome ids in
/// before they reach the level data, so lookups key off the plain
/// `namespace:name` form.
pub fn normalize_id(id: &str) -> String {
    if let Some(rest) = id.strip_prefix("universal_minecraft:") {
        return format!("minecraft:{rest}");
    }
    if let Some(rest) = id.strip_prefix("universal_terralith:") {
        return format!("terralith:{rest}");
    }
    id.to_owned()
}

/// `minecraft:mountains` stopped resolving in current versions; lists
/// written against older Terralith releases still name it as a target,
/// so any mapping value (and the unmapped-fallback id) gets fixed up
/// once here rather than at every lookup.
pub fn normalize_target_id(id: &str) -> String {
    if id == "minecraft:mountains" {
        return "minecraft:windswept_hills".to_owned();
    }
    id.to_owned()
}

/// A loaded, normalized `BiomeId -> BiomeId` table plus the optional
/// fallback used for unmapped `terralith:*` entries.
pub struct MappingTable {
    table: HashMap<String, String>,
    fallback: Option<String>,
}

impl MappingTable {
    /// Builds a table from already-normalized entries (used by tests and
    /// by the INI loaders below, which do the normalizing themselves).
    fn from_entries(entries: HashMap<String, String>, fallback: Option<String>) -> Self {
        MappingTable {
            table: entries,
            fallback,
        }
    }

    /// Parses `[mapping]`-section INI text (see [`parse_mapping_ini`])
    /// and attaches an optional fallback target, itself normalized.
    pub fn from_ini_text(text: &str, unmapped_terralith_to: Option<&str>) -> Self {
        let entries = parse_mapping_ini(text);
        let fallback = unmapped_terralith_to.map(|raw| normalize_target_id(&normalize_id(raw)));
        Self::from_entries(entries, fallback)
    }

    pub fn from_ini_file(path: &Path, unmapped_terralith_to: Option<&str>) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_ini_text(&text, unmapped_terralith_to))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn fallback(&self) -> Option<&str> {
        self.fallback.as_deref()
    }

    /// Looks up the replacement for an already-normalized biome id,
    /// falling back to the `unmapped_terralith_to` target for
    /// `terralith:*` ids the mapping doesn't cover.
    pub fn resolve(&self, normalized: &str) -> Option<&str> {
        if let Some(target) = self.table.get(normalized) {
            return Some(target.as_str());
        }
        if normalized.starts_with("terralith:") {
            return self.fallback.as_deref();
        }
        None
    }
}

/// Parses the `=`-only-delimited `[mapping]` INI format from spec.md §6:
/// biome ids contain `:`, which rules out the usual `configparser`-style
/// delimiter set. Comments (`#` or `;` as the first non-whitespace
/// character) and blank lines are skipped; keys/values are trimmed;
/// empty sides are skipped; a duplicate key overwrites the earlier one.
/// Only lines inside the `[mapping]` section are read — other sections,
/// if present, are ignored.
pub fn parse_mapping_ini(text: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    let mut in_mapping_section = false;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            in_mapping_section = line.trim_start_matches('[').trim_end_matches(']').trim()
                == "mapping";
            continue;
        }
        if !in_mapping_section {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = normalize_id(key.trim());
        let value = normalize_target_id(&normalize_id(value.trim()));
        if key.is_empty() || value.is_empty() {
            continue;
        }
        out.insert(key, value);
    }

    out
}

pub fn load_mapping(
    mapping_ini_path: Option<&Path>,
    unmapped_terralith_to: Option<&str>,
) -> Result<(MappingTable, String), SetupError> {
    match mapping_ini_path {
        Some(path) => {
            if !path.is_file() {
                return Err(SetupError::MappingFileMissing(path.to_path_buf()));
            }
            let table = MappingTable::from_ini_file(path, unmapped_terralith_to)
                .map_err(|_| SetupError::MappingFileMissing(path.to_path_buf()))?;
            Ok((table, format!("ini:{}", path.display())))
        }
        None => {
            let table = MappingTable::from_ini_text(DEFAULT_MAPPING_INI_TEXT, unmapped_terralith_to);
            Ok((table, "builtin".to_owned()))
        }
    }
}

/// Built-in Terralith -> vanilla translation, shipped so the tool works
/// with no external mapping file. Also the text written out by
/// `--export-default-mapping-ini`.
pub const DEFAULT_MAPPING_INI_TEXT: &str = "[mapping]
terralith:alpha_islands = minecraft:mushroom_fields
terralith:alpha_islands_winter = minecraft:snowy_taiga
terralith:alpine_grove = minecraft:snowy_taiga
terralith:alpine_highlands = minecraft:stony_peaks
terralith:amethyst_canyon = minecraft:stony_peaks
terralith:amethyst_rainforest = minecraft:dark_forest
terralith:ancient_sands = minecraft:desert
terralith:arid_highlands = minecraft:desert
terralith:ashen_savanna = minecraft:savanna
terralith:basalt_cliffs = minecraft:windswept_gravelly_hills
terralith:birch_taiga = minecraft:birch_forest
terralith:blooming_plateau = minecraft:plains
terralith:blooming_valley = minecraft:plains
terralith:brushland = minecraft:plains
terralith:bryce_canyon = minecraft:badlands
terralith:caldera = minecraft:stony_peaks
terralith:cloud_forest = minecraft:jungle
terralith:cold_shrubland = minecraft:snowy_taiga
terralith:desert_canyon = minecraft:desert
terralith:desert_oasis = minecraft:desert
terralith:desert_spires = minecraft:desert
terralith:emerald_peaks = minecraft:stony_peaks
terralith:forested_highlands = minecraft:forest
terralith:fractured_savanna = minecraft:savanna
terralith:frozen_cliffs = minecraft:snowy_taiga
terralith:glacial_chasm = minecraft:snowy_taiga
terralith:granite_cliffs = minecraft:windswept_gravelly_hills
terralith:gravel_beach = minecraft:beach
terralith:gravel_desert = minecraft:desert
terralith:haze_mountain = minecraft:stony_peaks
terralith:highlands = minecraft:windswept_hills
terralith:hot_shrubland = minecraft:savanna
terralith:ice_marsh = minecraft:swamp
terralith:jungle_mountains = minecraft:jungle
terralith:lavender_forest = minecraft:flower_forest
terralith:lavender_valley = minecraft:plains
terralith:lush_desert = minecraft:desert
terralith:lush_valley = minecraft:plains
terralith:mirage_isles = minecraft:plains
terralith:moonlight_grove = minecraft:plains
terralith:moonlight_valley = minecraft:plains
terralith:mountain_steppe = minecraft:windswept_hills
terralith:orchid_swamp = minecraft:swamp
terralith:painted_mountains = minecraft:stony_peaks
terralith:red_oasis = minecraft:desert
terralith:rocky_jungle = minecraft:jungle
terralith:rocky_mountains = minecraft:stony_peaks
terralith:rocky_shrubland = minecraft:plains
terralith:sakura_grove = minecraft:flower_forest
terralith:sakura_valley = minecraft:plains
terralith:sandstone_valley = minecraft:desert
terralith:savanna_badlands = minecraft:savanna
terralith:savanna_slopes = minecraft:savanna
terralith:scarlet_mountains = minecraft:stony_peaks
terralith:shield_clearing = minecraft:plains
terralith:shield = minecraft:plains
terralith:shrubland = minecraft:plains
terralith:siberian_grove = minecraft:snowy_taiga
terralith:siberian_taiga = minecraft:snowy_taiga
terralith:skylands = minecraft:stony_peaks
terralith:skylands_autumn = minecraft:stony_peaks
terralith:skylands_spring = minecraft:stony_peaks
terralith:skylands_summer = minecraft:stony_peaks
terralith:skylands_winter = minecraft:snowy_taiga
terralith:snowy_badlands = minecraft:badlands
terralith:snowy_cherry_grove = minecraft:snowy_taiga
terralith:snowy_maple_forest = minecraft:snowy_taiga
terralith:snowy_shield = minecraft:snowy_taiga
terralith:steppe = minecraft:plains
terralith:stony_spires = minecraft:stony_peaks
terralith:temperate_highlands = minecraft:forest
terralith:tropical_jungle = minecraft:jungle
terralith:valley_clearing = minecraft:plains
terralith:volcanic_crater = minecraft:stony_peaks
terralith:volcanic_peaks = minecraft:windswept_savanna
terralith:warm_river = minecraft:swamp
terralith:warped_mesa = minecraft:desert
terralith:white_cliffs = minecraft:snowy_slopes
terralith:white_mesa = minecraft:desert
terralith:windswept_spires = minecraft:windswept_gravelly_hills
terralith:wintry_forest = minecraft:snowy_taiga
terralith:wintry_lowlands = minecraft:snowy_taiga
terralith:yellowstone = minecraft:badlands
terralith:yosemite_cliffs = minecraft:stony_peaks
terralith:yosemite_lowlands = minecraft:forest
terralith:cave/andesite_caves = minecraft:dripstone_caves
terralith:cave/desert_caves = minecraft:dripstone_caves
terralith:cave/diorite_caves = minecraft:dripstone_caves
terralith:cave/fungal_caves = minecraft:lush_caves
terralith:cave/granite_caves = minecraft:dripstone_caves
terralith:cave/ice_caves = minecraft:dripstone_caves
terralith:cave/infested_caves = minecraft:dripstone_caves
terralith:cave/thermal_caves = minecraft:dripstone_caves
terralith:cave/underground_jungle = minecraft:lush_caves
terralith:cave/crystal_caves = minecraft:lush_caves
terralith:cave/deep_caves = minecraft:dripstone_caves
terralith:cave/frostfire_caves = minecraft:lush_caves
terralith:cave/mantle_caves = minecraft:dripstone_caves
terralith:cave/tuff_caves = minecraft:dripstone_caves
";

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn normalizes_universal_prefixes() {
        assert_eq!(normalize_id("universal_terralith:yellowstone"), "terralith:yellowstone");
        assert_eq!(normalize_id("universal_minecraft:plains"), "minecraft:plains");
        assert_eq!(normalize_id("minecraft:plains"), "minecraft:plains");
    }

    #[test]
    fn fixes_up_legacy_mountains_target() {
        assert_eq!(normalize_target_id("minecraft:mountains"), "minecraft:windswept_hills");
        assert_eq!(normalize_target_id("minecraft:plains"), "minecraft:plains");
    }

    #[test]
    fn parses_ini_ignoring_comments_and_other_sections() {
        let text = "; a comment\n[other]\nx = y\n[mapping]\n# comment\nterralith:foo = minecraft:plains\n\nterralith:bar=minecraft:ocean\n";
        let m = parse_mapping_ini(text);
        assert_eq!(m.get("terralith:foo"), Some(&"minecraft:plains".to_owned()));
        assert_eq!(m.get("terralith:bar"), Some(&"minecraft:ocean".to_owned()));
        assert_eq!(m.get("x"), None);
    }

    #[test]
    fn duplicate_keys_last_wins() {
        let text = "[mapping]\nterralith:foo = minecraft:plains\nterralith:foo = minecraft:ocean\n";
        let m = parse_mapping_ini(text);
        assert_eq!(m.get("terralith:foo"), Some(&"minecraft:ocean".to_owned()));
    }

    #[test]
    fn mapping_target_legacy_fixup_applies_to_ini_values_too() {
        let text = "[mapping]\nterralith:foo = minecraft:mountains\n";
        let m = parse_mapping_ini(text);
        assert_eq!(m.get("terralith:foo"), Some(&"minecraft:windswept_hills".to_owned()));
    }

    #[test]
    fn fallback_only_applies_to_unmapped_terralith_ids() {
        let table = MappingTable::from_entries(HashMap::new(), Some("minecraft:plains".to_owned()));
        assert_eq!(table.resolve("terralith:unknown_biome_xyz"), Some("minecraft:plains"));
        assert_eq!(table.resolve("minecraft:ocean"), None);
    }

    #[test]
    fn default_mapping_parses_and_has_expected_entry() {
        let table = MappingTable::from_ini_text(DEFAULT_MAPPING_INI_TEXT, None);
        assert_eq!(table.resolve("terralith:yellowstone"), Some("minecraft:badlands"));
        assert!(table.len() > 50);
    }
}
