//! NBT traversal and rewrite: locates a chunk's biome palettes across
//! the handful of schema shapes Java Edition has written since 1.18,
//! applies the Y filter, and mutates matching palette string entries in
//! place.

use biome_remap_nbt::Value;

use crate::mapping::{normalize_id, MappingTable};

/// Outcome of rewriting one chunk's palettes.
#[derive(Debug, Default, Clone, Copy)]
pub struct RewriteOutcome {
    pub changed: bool,
    pub entries_changed: usize,
}

/// Finds the section list at any of the schema-variant paths spec.md §3
/// names: root `sections`/`Sections`, or the same under a legacy `Level`
/// compound. Tries each in order and stops at the first match.
fn sections_mut(root: &mut Value) -> Option<&mut Vec<Value>> {
    let compound = root.as_compound_mut()?;
    if compound.contains_key("sections") {
        return compound.get_mut("sections").and_then(Value::as_list_mut);
    }
    if compound.contains_key("Sections") {
        return compound.get_mut("Sections").and_then(Value::as_list_mut);
    }
    if compound.contains_key("Level") {
        let level = compound.get_mut("Level")?.as_compound_mut()?;
        if level.contains_key("sections") {
            return level.get_mut("sections").and_then(Value::as_list_mut);
        }
        if level.contains_key("Sections") {
            return level.get_mut("Sections").and_then(Value::as_list_mut);
        }
    }
    None
}

/// Read-only counterpart to [`sections_mut`] for `--debug-structure`:
/// names which schema variant a chunk's section list was found under,
/// without touching the tree.
pub fn describe_chunk_structure(root: &Value) -> &'static str {
    let Some(compound) = root.as_compound() else {
        return "not a compound";
    };
    if compound.contains_key("sections") {
        return "sections";
    }
    if compound.contains_key("Sections") {
        return "Sections";
    }
    if let Some(level) = compound.get("Level").and_then(Value::as_compound) {
        if level.contains_key("sections") {
            return "Level.sections";
        }
        if level.contains_key("Sections") {
            return "Level.Sections";
        }
    }
    "unrecognised"
}

fn section_y(section: &Value) -> Option<i64> {
    section.as_compound()?.get("Y")?.as_i64()
}

/// Does section `sy` (worldspace `[sy*16, sy*16+15]`) overlap the
/// inclusive `[y_min, y_max]` filter range?
fn y_overlaps(sy: i64, y_min: i64, y_max: i64) -> bool {
    let (sec_min, sec_max) = (sy * 16, sy * 16 + 15);
    sec_max >= y_min && sec_min <= y_max
}

/// Invokes `f` once per biome palette list found directly under
/// `section`, covering both the current `biomes`/`palette` casing and
/// the older `Biomes`/`Palette` casing. A palette container that is
/// missing, or whose `palette` field isn't list-shaped, is silently
/// skipped — never an error.
fn for_each_palette_mut(section: &mut Value, mut f: impl FnMut(&mut Vec<Value>)) {
    let Some(compound) = section.as_compound_mut() else {
        return;
    };
    if let Some(biomes) = compound.get_mut("biomes").and_then(Value::as_compound_mut) {
        if let Some(pal) = biomes.get_mut("palette").and_then(Value::as_list_mut) {
            f(pal);
        }
    }
    if let Some(biomes) = compound.get_mut("Biomes").and_then(Value::as_compound_mut) {
        let pal_value = if biomes.contains_key("palette") {
            biomes.get_mut("palette")
        } else {
            biomes.get_mut("Palette")
        };
        if let Some(pal) = pal_value.and_then(Value::as_list_mut) {
            f(pal);
        }
    }
}

/// Rewrites every biome palette entry in `root`'s sections (subject to
/// the optional inclusive `y_range`) according to `mapping`, returning
/// whether anything changed and how many entries were touched.
///
/// Sections lacking a `Y` value are always processed, since a missing Y
/// means we cannot prove the section doesn't overlap the filter.
pub fn rewrite_chunk(root: &mut Value, mapping: &MappingTable, y_range: Option<(i64, i64)>) -> RewriteOutcome {
    let mut outcome = RewriteOutcome::default();
    let Some(sections) = sections_mut(root) else {
        return outcome;
    };

    for section in sections.iter_mut() {
        if let (Some((y_min, y_max)), Some(sy)) = (y_range, section_y(section)) {
            if !y_overlaps(sy, y_min, y_max) {
                continue;
            }
        }

        for_each_palette_mut(section, |palette| {
            for entry in palette.iter_mut() {
                let Some(raw) = entry.as_str() else {
                    continue;
                };
                let norm = normalize_id(raw);
                if let Some(replacement) = mapping.resolve(&norm) {
                    if replacement != norm {
                        *entry = Value::String(replacement.to_owned());
                        outcome.changed = true;
                        outcome.entries_changed += 1;
                    }
                }
            }
        });
    }

    outcome
}

/// Collects up to `limit` unique normalized palette entries from `root`,
/// honoring the same Y filter as [`rewrite_chunk`]. Used for
/// `--debug-sample` and has no side effects on the tree.
pub fn sample_palette_entries(root: &mut Value, y_range: Option<(i64, i64)>, limit: usize, into: &mut Vec<String>) {
    if limit == 0 || into.len() >= limit {
        return;
    }
    let Some(sections) = sections_mut(root) else {
        return;
    };
    for section in sections.iter_mut() {
        if let (Some((y_min, y_max)), Some(sy)) = (y_range, section_y(section)) {
            if !y_overlaps(sy, y_min, y_max) {
                continue;
            }
        }
        for_each_palette_mut(section, |palette| {
            for entry in palette.iter() {
                if into.len() >= limit {
                    break;
                }
                if let Some(s) = entry.as_str() {
                    into.push(normalize_id(s));
                }
            }
        });
    }
}

/// Returns the first palette hit (normalized, deduplicated, capped at 20
/// entries) whose id starts with `prefix`, alongside the section's `Y`,
/// for the probe engine.
pub fn find_prefix_hit(root: &mut Value, y_range: Option<(i64, i64)>, prefix: &str) -> Option<(Option<i64>, Vec<String>)> {
    let sections = sections_mut(root)?;
    for section in sections.iter_mut() {
        let sy = section_y(section);
        if let (Some((y_min, y_max)), Some(sy)) = (y_range, sy) {
            if !y_overlaps(sy, y_min, y_max) {
                continue;
            }
        }
        let mut hit = None;
        for_each_palette_mut(section, |palette| {
            if hit.is_some() {
                return;
            }
            let mut hits: Vec<String> = Vec::new();
            for entry in palette.iter() {
                let Some(s) = entry.as_str() else { continue };
                let norm = normalize_id(s);
                if norm.starts_with(prefix) && !hits.contains(&norm) {
                    hits.push(norm);
                    if hits.len() >= 20 {
                        break;
                    }
                }
            }
            if !hits.is_empty() {
                hit = Some(hits);
            }
        });
        if let Some(hits) = hit {
            return Some((sy, hits));
        }
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mapping::MappingTable;
    use biome_remap_nbt::Value;
    use indexmap::IndexMap;

    fn compound(entries: Vec<(&str, Value)>) -> Value {
        let mut map = IndexMap::new();
        for (k, v) in entries {
            map.insert(k.to_owned(), v);
        }
        Value::Compound(map)
    }

    fn section_with_palette(y: i64, ids: &[&str]) -> Value {
        let palette = Value::List(ids.iter().map(|s| Value::String((*s).to_owned())).collect());
        let biomes = compound(vec![("palette", palette)]);
        compound(vec![("Y", Value::Int(y as i32)), ("biomes", biomes)])
    }

    fn chunk_with_sections(sections: Vec<Value>) -> Value {
        compound(vec![("sections", Value::List(sections))])
    }

    fn palette_of(root: &Value, section_idx: usize) -> Vec<String> {
        let sections = root.as_compound().unwrap().get("sections").unwrap().as_list().unwrap();
        let biomes = sections[section_idx].as_compound().unwrap().get("biomes").unwrap();
        biomes
            .as_compound()
            .unwrap()
            .get("palette")
            .unwrap()
            .as_list()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_owned())
            .collect()
    }

    #[test]
    fn default_mapping_rewrites_terralith_entry() {
        let mut root = chunk_with_sections(vec![section_with_palette(
            4,
            &["terralith:yellowstone", "minecraft:plains"],
        )]);
        let mapping = MappingTable::from_ini_text(crate::mapping::DEFAULT_MAPPING_INI_TEXT, None);
        let outcome = rewrite_chunk(&mut root, &mapping, None);
        assert!(outcome.changed);
        assert_eq!(outcome.entries_changed, 1);
        assert_eq!(
            palette_of(&root, 0),
            vec!["minecraft:badlands".to_owned(), "minecraft:plains".to_owned()]
        );
    }

    #[test]
    fn unmapped_terralith_uses_fallback() {
        let mut root = chunk_with_sections(vec![section_with_palette(
            0,
            &["terralith:unknown_biome_xyz", "minecraft:ocean"],
        )]);
        let mapping = MappingTable::from_ini_text("[mapping]\n", Some("minecraft:plains"));
        let outcome = rewrite_chunk(&mut root, &mapping, None);
        assert!(outcome.changed);
        assert_eq!(
            palette_of(&root, 0),
            vec!["minecraft:plains".to_owned(), "minecraft:ocean".to_owned()]
        );
    }

    #[test]
    fn y_filter_excludes_non_overlapping_section() {
        let mut root = chunk_with_sections(vec![
            section_with_palette(4, &["terralith:yellowstone"]),
            section_with_palette(8, &["terralith:yellowstone"]),
        ]);
        let mapping = MappingTable::from_ini_text(crate::mapping::DEFAULT_MAPPING_INI_TEXT, None);
        let outcome = rewrite_chunk(&mut root, &mapping, Some((100, 200)));
        assert_eq!(outcome.entries_changed, 1);
        assert_eq!(palette_of(&root, 0), vec!["terralith:yellowstone".to_owned()]);
        assert_eq!(palette_of(&root, 1), vec!["minecraft:badlands".to_owned()]);
    }

    #[test]
    fn universal_prefix_is_normalized_before_lookup() {
        let mut root = chunk_with_sections(vec![section_with_palette(0, &["universal_terralith:yellowstone"])]);
        let mapping = MappingTable::from_ini_text(crate::mapping::DEFAULT_MAPPING_INI_TEXT, None);
        let outcome = rewrite_chunk(&mut root, &mapping, None);
        assert!(outcome.changed);
        assert_eq!(palette_of(&root, 0), vec!["minecraft:badlands".to_owned()]);
    }

    #[test]
    fn legacy_mountains_target_normalizes() {
        let mut root = chunk_with_sections(vec![section_with_palette(0, &["terralith:foo"])]);
        let mapping = MappingTable::from_ini_text("[mapping]\nterralith:foo = minecraft:mountains\n", None);
        rewrite_chunk(&mut root, &mapping, None);
        assert_eq!(palette_of(&root, 0), vec!["minecraft:windswept_hills".to_owned()]);
    }

    #[test]
    fn idempotent_second_pass_changes_nothing() {
        let mut root = chunk_with_sections(vec![section_with_palette(4, &["terralith:yellowstone"])]);
        let mapping = MappingTable::from_ini_text(crate::mapping::DEFAULT_MAPPING_INI_TEXT, None);
        rewrite_chunk(&mut root, &mapping, None);
        let second = rewrite_chunk(&mut root, &mapping, None);
        assert!(!second.changed);
        assert_eq!(second.entries_changed, 0);
    }

    #[test]
    fn legacy_wrapping_under_level_compound_is_found() {
        let level = compound(vec![(
            "Sections",
            Value::List(vec![section_with_palette(0, &["terralith:yellowstone"])]),
        )]);
        let mut root = compound(vec![("Level", level)]);
        let mapping = MappingTable::from_ini_text(crate::mapping::DEFAULT_MAPPING_INI_TEXT, None);
        let outcome = rewrite_chunk(&mut root, &mapping, None);
        assert!(outcome.changed);
    }

    #[test]
    fn find_prefix_hit_reports_section_y_and_values() {
        let mut root = chunk_with_sections(vec![section_with_palette(5, &["terralith:lush_desert"])]);
        let (sy, hits) = find_prefix_hit(&mut root, None, "terralith:").unwrap();
        assert_eq!(sy, Some(5));
        assert_eq!(hits, vec!["terralith:lush_desert".to_owned()]);
    }

    #[test]
    fn find_prefix_hit_misses_other_prefix() {
        let mut root = chunk_with_sections(vec![section_with_palette(5, &["terralith:lush_desert"])]);
        assert!(find_prefix_hit(&mut root, None, "bluenether:").is_none());
    }
}
