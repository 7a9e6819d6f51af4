// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Key derivation for sub-assets addressed inside a multi-part asset.
//!
//! A sprite sheet at `tex/sheet.png` exposes its sprites as
//! `tex/sheet.png[sheet]` (the whole sheet sprite), `tex/sheet.png[sheet_0]`,
//! `tex/sheet.png[sheet_1]`, ... or by an explicit name such as
//! `tex/sheet.png[idle]`.

use super::AssetKey;

/// Selects which sprite of a sprite sheet to address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SpriteSelector {
    /// The sprite named after the sheet itself: `base[stem]`.
    Whole,
    /// The `n`-th sliced sprite: `base[stem_n]`.
    Index(usize),
    /// A sprite with an explicit name: `base[name]`.
    Named(String),
}

impl SpriteSelector {
    /// Derives the sub-asset key this selector addresses inside `base`.
    pub fn key(&self, base: &str) -> AssetKey {
        match self {
            SpriteSelector::Whole => sprite_key(base, None),
            SpriteSelector::Index(index) => sprite_key(base, Some(*index)),
            SpriteSelector::Named(name) => named_sprite_key(base, name),
        }
    }
}

impl From<usize> for SpriteSelector {
    fn from(value: usize) -> Self {
        SpriteSelector::Index(value)
    }
}

impl From<&str> for SpriteSelector {
    fn from(value: &str) -> Self {
        SpriteSelector::Named(value.to_owned())
    }
}

impl From<String> for SpriteSelector {
    fn from(value: String) -> Self {
        SpriteSelector::Named(value)
    }
}

/// Returns the file stem of an addressable path.
///
/// The stem is the part of the last `/`-separated segment before its final
/// extension. A segment without an extension has an empty stem, matching how
/// the engine names sliced sprites.
pub fn file_stem(path: &str) -> &str {
    let segment = path.rsplit('/').next().unwrap_or(path);
    match segment.rfind('.') {
        Some(dot) => &segment[..dot],
        None => "",
    }
}

/// Derives the key of a sliced sprite: `base[stem]` or `base[stem_index]`.
pub fn sprite_key(base: &str, index: Option<usize>) -> AssetKey {
    let stem = file_stem(base);
    match index {
        Some(index) => AssetKey::from(format!("{base}[{stem}_{index}]")),
        None => AssetKey::from(format!("{base}[{stem}]")),
    }
}

/// Derives the key of an explicitly named sprite: `base[name]`.
pub fn named_sprite_key(base: &str, name: &str) -> AssetKey {
    AssetKey::from(format!("{base}[{name}]"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexed_sprite_key() {
        assert_eq!(
            sprite_key("tex/sheet.png", Some(2)).as_str(),
            "tex/sheet.png[sheet_2]"
        );
    }

    #[test]
    fn whole_sprite_key() {
        assert_eq!(
            sprite_key("tex/sheet.png", None).as_str(),
            "tex/sheet.png[sheet]"
        );
    }

    #[test]
    fn named_sprite_key_uses_name_verbatim() {
        assert_eq!(
            named_sprite_key("tex/sheet.png", "idle").as_str(),
            "tex/sheet.png[idle]"
        );
        assert_eq!(
            SpriteSelector::from("idle").key("tex/sheet.png"),
            named_sprite_key("tex/sheet.png", "idle")
        );
    }

    #[test]
    fn stem_stops_at_final_extension() {
        assert_eq!(file_stem("ui/icons.atlas.png"), "icons.atlas");
        assert_eq!(file_stem("sheet.png"), "sheet");
        assert_eq!(file_stem("ui/noext"), "");
        assert_eq!(file_stem("dir.v2/noext"), "");
    }

    #[test]
    fn identical_requests_derive_identical_keys() {
        assert_eq!(
            SpriteSelector::Index(3).key("a/b.png"),
            sprite_key("a/b.png", Some(3))
        );
    }
}
